//! Governance setters for ledger parameters.

use proofchain_common::{Address, Amount, Event};
use tracing::info;

use super::StakingLedger;
use crate::custody::Custody;
use crate::error::StakingError;

impl<C: Custody> StakingLedger<C> {
    pub fn set_validator_max_stake(&mut self, caller: &Address, amount: Amount) -> Result<Event, StakingError> {
        self.ensure_governance(caller)?;
        self.params.validator_max_stake = amount;
        info!(amount, "validator max stake changed");
        Ok(Event::ValidatorMaxCapChanged { amount })
    }

    pub fn set_max_cap_multiplier(&mut self, caller: &Address, multiplier: u128) -> Result<Event, StakingError> {
        self.ensure_governance(caller)?;
        self.params.max_cap_multiplier = multiplier;
        info!(multiplier, "max cap multiplier changed");
        Ok(Event::MaxCapMultiplierChanged { multiplier })
    }

    /// Affects unstakings created afterwards; existing entries keep their
    /// `end_epoch`.
    pub fn set_validator_cooldown(&mut self, caller: &Address, blocks: u64) -> Result<Event, StakingError> {
        self.ensure_governance(caller)?;
        self.params.validator_cooldown = blocks;
        Ok(Event::ValidatorCooldownChanged { blocks })
    }

    pub fn set_delegator_cooldown(&mut self, caller: &Address, blocks: u64) -> Result<Event, StakingError> {
        self.ensure_governance(caller)?;
        self.params.delegator_cooldown = blocks;
        Ok(Event::DelegatorCooldownChanged { blocks })
    }

    pub fn set_staking_manager(&mut self, caller: &Address, address: Address) -> Result<Event, StakingError> {
        self.ensure_governance(caller)?;
        if address.is_zero() {
            return Err(StakingError::InvalidAddress);
        }
        self.staking_manager = address;
        info!(%address, "staking manager changed");
        Ok(Event::StakingManagerAddressChanged { address })
    }
}
