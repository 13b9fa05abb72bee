//! Governance setters and registry pass-throughs.
//!
//! Chain setters create the chain record on first use, so a chain can be
//! brought up one field at a time. A record with `nth_block == 0` rejects
//! every submission.

use proofchain_chain::StakingInterface;
use proofchain_common::math::DIVIDER;
use proofchain_common::{Address, Amount, ChainId, Event, LiveSyncPolicy, OperatorRole, RoundKind, ValidatorId};
use tracing::info;

use super::ProofChain;
use crate::error::EngineError;
use crate::sync::ChainSync;

impl<S: StakingInterface> ProofChain<S> {
    // ════════════════════════════════════════════════════════════════════════════
    // ENGINE PARAMETERS
    // ════════════════════════════════════════════════════════════════════════════

    pub fn set_session_duration(&mut self, caller: &Address, blocks: u64) -> Result<Event, EngineError> {
        self.ensure_governance(caller)?;
        self.params.session_duration = blocks;
        info!(blocks, "session duration changed");
        Ok(self.emit_one(Event::SessionDurationChanged { blocks }))
    }

    /// `threshold` is a 10^18-scaled fraction and may not exceed 1.
    pub fn set_quorum_threshold(&mut self, caller: &Address, threshold: u128) -> Result<Event, EngineError> {
        self.ensure_governance(caller)?;
        if threshold > DIVIDER {
            return Err(EngineError::InvalidParameter("quorum threshold above 100%"));
        }
        self.params.quorum_threshold = threshold;
        info!(threshold, "quorum threshold changed");
        Ok(self.emit_one(Event::QuorumThresholdChanged { threshold }))
    }

    pub fn set_min_submissions_required(&mut self, caller: &Address, count: u64) -> Result<Event, EngineError> {
        self.ensure_governance(caller)?;
        self.params.min_submissions_required = count;
        info!(count, "minimum required submissions changed");
        Ok(self.emit_one(Event::MinimumRequiredSubmissionsChanged { count }))
    }

    pub fn set_reward_allocation(
        &mut self,
        caller: &Address,
        kind: RoundKind,
        amount: Amount,
    ) -> Result<Event, EngineError> {
        self.ensure_governance(caller)?;
        match kind {
            RoundKind::Specimen => self.params.block_specimen_reward = amount,
            RoundKind::Result => self.params.block_result_reward = amount,
        }
        info!(?kind, amount, "reward allocation changed");
        Ok(self.emit_one(Event::RewardAllocationChanged { kind, amount }))
    }

    /// Host chain block time.
    pub fn set_seconds_per_block(&mut self, caller: &Address, seconds: u64) -> Result<Event, EngineError> {
        self.ensure_governance(caller)?;
        if seconds == 0 {
            return Err(EngineError::InvalidParameter("seconds per block must be non-zero"));
        }
        self.params.seconds_per_block = seconds;
        info!(seconds, "host seconds per block changed");
        Ok(self.emit_one(Event::SecondsPerBlockChanged { seconds }))
    }

    // ════════════════════════════════════════════════════════════════════════════
    // CHAIN SYNC
    // ════════════════════════════════════════════════════════════════════════════

    fn chain_entry(&mut self, chain_id: ChainId) -> &mut ChainSync {
        self.chains.entry(chain_id).or_insert_with(|| ChainSync::empty(chain_id))
    }

    pub fn set_nth_block(&mut self, caller: &Address, chain_id: ChainId, nth_block: u64) -> Result<Event, EngineError> {
        self.ensure_governance(caller)?;
        self.chain_entry(chain_id).nth_block = nth_block;
        info!(chain_id, nth_block, "nth block changed");
        Ok(self.emit_one(Event::NthBlockChanged { chain_id, nth_block }))
    }

    pub fn set_max_submissions_per_block_height(
        &mut self,
        caller: &Address,
        chain_id: ChainId,
        max: u64,
    ) -> Result<Event, EngineError> {
        self.ensure_governance(caller)?;
        self.chain_entry(chain_id).max_submissions_per_block_height = max;
        info!(chain_id, max, "max submissions per block height changed");
        Ok(self.emit_one(Event::MaxSubmissionsPerBlockHeightChanged { chain_id, max }))
    }

    /// Re-anchor the live-sync window: `block_on_target_chain` was current
    /// on the target chain at host block `block_on_current_chain`.
    pub fn set_chain_sync_data(
        &mut self,
        caller: &Address,
        chain_id: ChainId,
        block_on_target_chain: u64,
        block_on_current_chain: u64,
        seconds_per_block: u64,
    ) -> Result<Event, EngineError> {
        self.ensure_governance(caller)?;
        if seconds_per_block == 0 {
            return Err(EngineError::InvalidParameter("target seconds per block must be non-zero"));
        }
        let record = self.chain_entry(chain_id);
        record.block_on_target_chain = block_on_target_chain;
        record.block_on_current_chain = block_on_current_chain;
        record.seconds_per_block = seconds_per_block;

        info!(chain_id, block_on_target_chain, block_on_current_chain, seconds_per_block, "chain sync data changed");
        Ok(self.emit_one(Event::ChainSyncDataChanged {
            chain_id,
            block_on_target_chain,
            block_on_current_chain,
            seconds_per_block,
        }))
    }

    pub fn set_block_height_submissions_threshold(
        &mut self,
        caller: &Address,
        chain_id: ChainId,
        threshold: u64,
    ) -> Result<Event, EngineError> {
        self.ensure_governance(caller)?;
        self.chain_entry(chain_id).allowed_threshold = threshold;
        info!(chain_id, threshold, "block height submission threshold changed");
        Ok(self.emit_one(Event::BlockHeightSubmissionThresholdChanged { chain_id, threshold }))
    }

    pub fn set_live_sync_policy(
        &mut self,
        caller: &Address,
        chain_id: ChainId,
        policy: LiveSyncPolicy,
    ) -> Result<Event, EngineError> {
        self.ensure_governance(caller)?;
        self.chain_entry(chain_id).live_sync = policy;
        info!(chain_id, ?policy, "live sync policy changed");
        Ok(self.emit_one(Event::LiveSyncPolicyChanged { chain_id, policy }))
    }

    // ════════════════════════════════════════════════════════════════════════════
    // OPERATORS & AUDITORS
    // ════════════════════════════════════════════════════════════════════════════

    pub fn add_operator(
        &mut self,
        caller: &Address,
        role: OperatorRole,
        account: Address,
        validator_id: ValidatorId,
    ) -> Result<Event, EngineError> {
        let ev = self.operators.add_operator(caller, role, account, validator_id, &self.staking)?;
        Ok(self.emit_one(ev))
    }

    pub fn remove_operator(
        &mut self,
        caller: &Address,
        role: OperatorRole,
        account: &Address,
        block: u64,
    ) -> Result<Vec<Event>, EngineError> {
        let events = self.operators.remove_operator(caller, role, account, &mut self.staking, block)?;
        Ok(self.emit(events))
    }

    pub fn enable_operator(
        &mut self,
        caller: &Address,
        role: OperatorRole,
        account: &Address,
    ) -> Result<Vec<Event>, EngineError> {
        let events = self.operators.enable_operator(caller, role, account, &mut self.staking)?;
        Ok(self.emit(events))
    }

    pub fn disable_operator(
        &mut self,
        caller: &Address,
        role: OperatorRole,
        account: &Address,
        block: u64,
    ) -> Result<Vec<Event>, EngineError> {
        let events = self.operators.disable_operator(caller, role, account, &mut self.staking, block)?;
        Ok(self.emit(events))
    }

    /// Governance removal of a validator from service. Its operators are
    /// disabled with it, so it can neither submit nor count toward quorum
    /// until its owner enables an operator again.
    pub fn disable_validator(
        &mut self,
        caller: &Address,
        validator_id: ValidatorId,
        block: u64,
    ) -> Result<Vec<Event>, EngineError> {
        self.ensure_governance(caller)?;
        let events = self.operators.disable_validator(caller, validator_id, &mut self.staking, block)?;
        Ok(self.emit(events))
    }

    pub fn add_auditor(&mut self, caller: &Address, auditor: Address) -> Result<Event, EngineError> {
        let ev = self.operators.add_auditor(caller, auditor)?;
        Ok(self.emit_one(ev))
    }

    pub fn remove_auditor(&mut self, caller: &Address, auditor: &Address) -> Result<Event, EngineError> {
        let ev = self.operators.remove_auditor(caller, auditor)?;
        Ok(self.emit_one(ev))
    }

    pub fn set_required_stake(
        &mut self,
        caller: &Address,
        role: OperatorRole,
        amount: Amount,
    ) -> Result<Event, EngineError> {
        let ev = self.operators.set_required_stake(caller, role, amount)?;
        Ok(self.emit_one(ev))
    }
}
