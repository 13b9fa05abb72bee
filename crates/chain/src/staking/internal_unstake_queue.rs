//! Unstaking queue: slot management and withdrawal after cooldown.

use proofchain_common::{Address, Amount, Event, ValidatorId};
use tracing::info;

use super::{Position, StakingLedger, Unstaking};
use crate::custody::Custody;
use crate::error::StakingError;

impl Position {
    /// Append an entry and return its index. Callers enforce
    /// `MAX_UNSTAKINGS` on live entries beforehand.
    pub(crate) fn push_unstaking(&mut self, entry: Unstaking) -> usize {
        self.unstakings.push(entry);
        self.unstakings.len() - 1
    }

    /// Reduce the entry at `index` by `amount`. The entry stays in place.
    fn withdraw_unstaking(&mut self, index: usize, amount: Amount) {
        if let Some(entry) = self.unstakings.get_mut(index) {
            entry.amount = entry.amount.saturating_sub(amount);
        }
    }

    /// Take every live entry out of this position, oldest first.
    pub(crate) fn drain_unstakings(&mut self) -> Vec<Unstaking> {
        self.unstakings.drain(..).filter(|u| u.amount > 0).collect()
    }
}

impl<C: Custody> StakingLedger<C> {
    // ============================================================
    // TRANSFER UNSTAKED OUT
    // ============================================================

    /// Withdraw `amount` from unstaking slot `index` once its cooldown has
    /// ended. Partial withdrawals leave the remainder in place under the
    /// same index.
    ///
    /// ## Errors
    ///
    /// - `InvalidValidator`, `NoSuchUnstaking`
    /// - `CooldownNotElapsed` while `block < end_epoch`
    /// - `AmountZero`, `AmountTooHigh` against the entry's remaining amount
    ///   (a drained index always fails here)
    pub fn transfer_unstaked_out(
        &mut self,
        caller: &Address,
        id: ValidatorId,
        index: usize,
        amount: Amount,
        block: u64,
    ) -> Result<Event, StakingError> {
        let v = self.validator_ref(id)?;
        let entry = v
            .position(caller)
            .and_then(|p| p.unstaking(index))
            .ok_or(StakingError::NoSuchUnstaking { index })?;

        if block < entry.end_epoch {
            return Err(StakingError::CooldownNotElapsed { end_epoch: entry.end_epoch, current: block });
        }
        if amount == 0 {
            return Err(StakingError::AmountZero);
        }
        if amount > entry.amount {
            return Err(StakingError::AmountTooHigh { requested: amount, available: entry.amount });
        }

        self.custody.transfer_out(caller, amount)?;

        let v = self.validator_mut(id)?;
        if let Some(p) = v.positions.get_mut(caller) {
            p.withdraw_unstaking(index, amount);
        }

        info!(validator_id = id, account = %caller, index, amount, "unstake redeemed");
        Ok(Event::UnstakeRedeemed { validator_id: id, account: *caller, unstake_id: index, amount })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(amount: Amount, end_epoch: u64) -> Unstaking {
        Unstaking { amount, end_epoch }
    }

    #[test]
    fn indices_are_never_reused() {
        let mut p = Position::default();
        assert_eq!(p.push_unstaking(entry(10, 5)), 0);
        assert_eq!(p.push_unstaking(entry(20, 6)), 1);
        assert_eq!(p.push_unstaking(entry(30, 7)), 2);

        p.withdraw_unstaking(1, 20);
        assert_eq!(p.unstaking(1), Some(&entry(0, 6)));
        assert_eq!(p.live_unstakings(), 2);
        assert_eq!(p.unstaking(2), Some(&entry(30, 7)));

        assert_eq!(p.push_unstaking(entry(40, 8)), 3);
        assert_eq!(p.unstaking(1), Some(&entry(0, 6)));
    }

    #[test]
    fn partial_withdrawal_keeps_end_epoch() {
        let mut p = Position::default();
        p.push_unstaking(entry(100, 9));
        p.withdraw_unstaking(0, 40);
        assert_eq!(p.unstaking(0), Some(&entry(60, 9)));
        assert_eq!(p.pending_unstaked(), Some(60));
    }

    #[test]
    fn drained_tail_is_kept() {
        let mut p = Position::default();
        p.push_unstaking(entry(1, 1));
        p.push_unstaking(entry(2, 2));
        p.withdraw_unstaking(1, 2);
        p.withdraw_unstaking(0, 1);
        assert_eq!(p.live_unstakings(), 0);
        assert!(p.is_empty());
        assert_eq!(p.unstakings().count(), 0);
        assert_eq!(p.push_unstaking(entry(3, 3)), 2);
    }
}
