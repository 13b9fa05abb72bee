//! Staking operations routed through the store so their events land in
//! the journal. Only available over the concrete ledger.

use proofchain_chain::{Custody, StakingLedger};
use proofchain_common::{Address, Amount, Event, ValidatorId};

use super::ProofChain;
use crate::error::EngineError;

impl<C: Custody> ProofChain<StakingLedger<C>> {
    /// New validators start disabled; enabling their first operator brings
    /// them up.
    pub fn add_validator(
        &mut self,
        caller: &Address,
        owner: Address,
        commission_rate: u128,
        block: u64,
    ) -> Result<ValidatorId, EngineError> {
        let (id, ev) = self.staking.add_validator(caller, owner, commission_rate, block)?;
        self.emit_one(ev);
        Ok(id)
    }

    pub fn set_validator_commission_rate(
        &mut self,
        caller: &Address,
        id: ValidatorId,
        commission_rate: u128,
    ) -> Result<Event, EngineError> {
        let ev = self.staking.set_validator_commission_rate(caller, id, commission_rate)?;
        Ok(self.emit_one(ev))
    }

    pub fn stake(&mut self, caller: &Address, id: ValidatorId, amount: Amount) -> Result<Event, EngineError> {
        let ev = self.staking.stake(caller, id, amount)?;
        Ok(self.emit_one(ev))
    }

    pub fn unstake(
        &mut self,
        caller: &Address,
        id: ValidatorId,
        amount: Amount,
        block: u64,
    ) -> Result<Event, EngineError> {
        let ev = self.staking.unstake(caller, id, amount, block)?;
        Ok(self.emit_one(ev))
    }

    pub fn transfer_unstaked_out(
        &mut self,
        caller: &Address,
        id: ValidatorId,
        index: usize,
        amount: Amount,
        block: u64,
    ) -> Result<Event, EngineError> {
        let ev = self.staking.transfer_unstaked_out(caller, id, index, amount, block)?;
        Ok(self.emit_one(ev))
    }

    pub fn redeem_rewards(
        &mut self,
        caller: &Address,
        id: ValidatorId,
        beneficiary: &Address,
        amount: Amount,
    ) -> Result<Vec<Event>, EngineError> {
        let events = self.staking.redeem_rewards(caller, id, beneficiary, amount)?;
        Ok(self.emit(events))
    }

    pub fn set_validator_identity(
        &mut self,
        caller: &Address,
        id: ValidatorId,
        new_owner: Address,
        merge: bool,
    ) -> Result<Event, EngineError> {
        let ev = self.staking.set_validator_identity(caller, id, new_owner, merge)?;
        Ok(self.emit_one(ev))
    }

    pub fn deposit_reward_tokens(&mut self, caller: &Address, amount: Amount) -> Result<Event, EngineError> {
        let ev = self.staking.deposit_reward_tokens(caller, amount)?;
        Ok(self.emit_one(ev))
    }

    pub fn take_out_reward_tokens(&mut self, caller: &Address, amount: Amount) -> Result<Event, EngineError> {
        let ev = self.staking.take_out_reward_tokens(caller, amount)?;
        Ok(self.emit_one(ev))
    }
}
