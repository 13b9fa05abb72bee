//! # Value Custody
//!
//! The ledger never holds tokens itself. It records intents and asks a
//! [`Custody`] implementation to move value between user accounts and the
//! vault account. A custody call either fully succeeds or returns an error,
//! in which case the calling ledger operation aborts unchanged.
//!
//! [`MemoryCustody`] is a complete in-memory token ledger used by tests and
//! by the standalone node binary.

use std::collections::HashMap;

use proofchain_common::{Address, Amount};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CustodyError {
    #[error("insufficient balance for {account}: balance {balance}, requested {requested}")]
    InsufficientBalance {
        account: Address,
        balance: Amount,
        requested: Amount,
    },
    #[error("balance overflow for {0}")]
    Overflow(Address),
}

/// External fungible-token ledger.
pub trait Custody {
    /// Move `amount` from `from` into the vault.
    fn transfer_in(&mut self, from: &Address, amount: Amount) -> Result<(), CustodyError>;

    /// Move `amount` from the vault to `to`.
    fn transfer_out(&mut self, to: &Address, amount: Amount) -> Result<(), CustodyError>;

    fn balance_of(&self, account: &Address) -> Amount;

    /// Account holding everything transferred in.
    fn vault(&self) -> Address;
}

// ════════════════════════════════════════════════════════════════════════════════
// IN-MEMORY CUSTODY
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default)]
pub struct MemoryCustody {
    vault: Address,
    balances: HashMap<Address, Amount>,
}

impl MemoryCustody {
    pub fn new(vault: Address) -> Self {
        MemoryCustody { vault, balances: HashMap::new() }
    }

    /// Credit `amount` to `account` out of thin air.
    pub fn mint(&mut self, account: Address, amount: Amount) -> Result<(), CustodyError> {
        let bal = self.balances.entry(account).or_insert(0);
        *bal = bal.checked_add(amount).ok_or(CustodyError::Overflow(account))?;
        Ok(())
    }

    fn transfer(&mut self, from: Address, to: Address, amount: Amount) -> Result<(), CustodyError> {
        let from_bal = self.balance_of(&from);
        if from_bal < amount {
            return Err(CustodyError::InsufficientBalance {
                account: from,
                balance: from_bal,
                requested: amount,
            });
        }
        let to_bal = self.balance_of(&to);
        let new_to = if from == to {
            to_bal
        } else {
            to_bal.checked_add(amount).ok_or(CustodyError::Overflow(to))?
        };

        // both sides checked, apply
        if from != to {
            self.balances.insert(from, from_bal - amount);
            self.balances.insert(to, new_to);
        }
        Ok(())
    }
}

impl Custody for MemoryCustody {
    fn transfer_in(&mut self, from: &Address, amount: Amount) -> Result<(), CustodyError> {
        self.transfer(*from, self.vault, amount)
    }

    fn transfer_out(&mut self, to: &Address, amount: Amount) -> Result<(), CustodyError> {
        self.transfer(self.vault, *to, amount)
    }

    fn balance_of(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn vault(&self) -> Address {
        self.vault
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::from_bytes([b; 20])
    }

    #[test]
    fn transfer_in_and_out() {
        let mut c = MemoryCustody::new(addr(0xff));
        c.mint(addr(1), 100).unwrap();

        c.transfer_in(&addr(1), 60).unwrap();
        assert_eq!(c.balance_of(&addr(1)), 40);
        assert_eq!(c.balance_of(&addr(0xff)), 60);

        c.transfer_out(&addr(2), 25).unwrap();
        assert_eq!(c.balance_of(&addr(2)), 25);
        assert_eq!(c.balance_of(&c.vault()), 35);
    }

    #[test]
    fn insufficient_balance_leaves_state() {
        let mut c = MemoryCustody::new(addr(0xff));
        c.mint(addr(1), 10).unwrap();
        let err = c.transfer_in(&addr(1), 11).unwrap_err();
        assert!(matches!(err, CustodyError::InsufficientBalance { balance: 10, requested: 11, .. }));
        assert_eq!(c.balance_of(&addr(1)), 10);
        assert_eq!(c.balance_of(&addr(0xff)), 0);
    }

    #[test]
    fn mint_overflow_is_error() {
        let mut c = MemoryCustody::new(addr(0xff));
        c.mint(addr(1), Amount::MAX).unwrap();
        assert_eq!(c.mint(addr(1), 1), Err(CustodyError::Overflow(addr(1))));
    }
}
