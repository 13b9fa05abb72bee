//! Session resolution: automatic quorum and auditor arbitration.
//!
//! ## Quorum Rule
//!
//! ```text
//! eligible   = submitters whose operator is still enabled for the role
//!              and whose validator is still enabled
//! weight(p)  = Σ recorded stake of eligible submitters of pair p
//! total      = Σ current validator stake over all enabled operators of the role
//!              with an enabled validator
//! leader     = the pair with the strictly largest weight (ties: none)
//!
//! finalized  ⇔ leader exists
//!              ∧ |eligible| ≥ min_submissions_required
//!              ∧ total > 0
//!              ∧ weight(leader) * 10^18 / total ≥ quorum_threshold
//! ```
//!
//! Anything else moves the session to `RequiresAudit`. Both outcomes are
//! terminal for `finalize_and_reward_session`.

use std::collections::BTreeMap;

use proofchain_chain::StakingInterface;
use proofchain_common::math::ratio;
use proofchain_common::{Address, Amount, BlockHeight, ChainId, Event, Hash32, OperatorRole, RoundKind, ValidatorId};
use tracing::{info, warn};

use super::ProofChain;
use crate::error::EngineError;
use crate::rewards::pay_round_reward;
use crate::session::{HashPair, Resolution, SessionKey, SessionState};

/// Eligible weight and winners for one pair.
#[derive(Default)]
struct EligibleTally {
    weight: Amount,
    validators: Vec<ValidatorId>,
}

impl<S: StakingInterface> ProofChain<S> {
    /// Resolve a closed session by quorum and pay its winners.
    ///
    /// ## Errors
    ///
    /// - `SessionNotStarted`: nothing was ever submitted for the key
    /// - `SessionNotPastDeadline`: `block < deadline`
    /// - `SessionCannotBeFinalized`: already `Finalized` or `RequiresAudit`
    /// - ledger errors from the reward batch (the session stays unresolved)
    ///
    /// Low-pool and zero-stake reward failures are soft: they appear in
    /// the returned events and the session still finalizes.
    pub fn finalize_and_reward_session(
        &mut self,
        kind: RoundKind,
        chain_id: ChainId,
        height: BlockHeight,
        block: u64,
    ) -> Result<Vec<Event>, EngineError> {
        let key = SessionKey::new(chain_id, kind, height);
        let session = self.sessions.get(&key).ok_or(EngineError::SessionNotStarted)?;
        match session.state(block) {
            SessionState::Open => {
                return Err(EngineError::SessionNotPastDeadline { deadline: session.deadline, current: block })
            }
            SessionState::Finalized | SessionState::RequiresAudit => {
                return Err(EngineError::SessionCannotBeFinalized)
            }
            SessionState::Closed => {}
        }

        let role = kind.role();
        let mut tallies: BTreeMap<HashPair, EligibleTally> = BTreeMap::new();
        let mut eligible: u64 = 0;
        for sub in session.submissions() {
            if !self.is_eligible(&sub.operator, sub.validator_id, role) {
                continue;
            }
            let t = tallies.entry(sub.pair).or_default();
            t.weight = t.weight.checked_add(sub.stake).ok_or(EngineError::Overflow)?;
            t.validators.push(sub.validator_id);
            eligible += 1;
        }

        let total = self.eligible_weight(role)?;
        let leader = strict_leader(&tallies);

        let winner = leader.filter(|(_, weight)| {
            eligible >= self.params.min_submissions_required
                && total > 0
                && ratio(*weight, total).is_some_and(|r| r >= self.params.quorum_threshold)
        });

        let Some((pair, weight)) = winner else {
            warn!(chain_id, height, ?kind, eligible, total, "quorum not reached, session requires audit");
            if let Some(s) = self.sessions.get_mut(&key) {
                s.resolve(Resolution::RequiresAudit, None);
            }
            return Ok(self.emit(vec![Event::QuorumNotReached { kind, chain_id, block_height: height }]));
        };

        let winners: Vec<ValidatorId> = tallies.remove(&pair).map(|t| t.validators).unwrap_or_default();
        let mut events = self.pay_winners(kind, &winners)?;
        if let Some(s) = self.sessions.get_mut(&key) {
            s.resolve(Resolution::Finalized, Some(pair));
        }

        info!(chain_id, height, ?kind, weight, total, winners = winners.len(), "session finalized");
        events.push(Event::RewardAwarded {
            kind,
            chain_id,
            block_height: height,
            primary_hash: pair.0,
            secondary_hash: pair.1,
        });
        Ok(self.emit(events))
    }

    /// Resolve a session stuck in `RequiresAudit` with the auditor's pair.
    /// Every submitter whose primary hash matches is paid, whatever its
    /// operator's current state.
    ///
    /// ## Errors
    ///
    /// - `NotAuditor`
    /// - `SessionNotFinalizable`: the session does not exist or is not in
    ///   `RequiresAudit` (an open, closed-but-unresolved, or finalized
    ///   session cannot be arbitrated)
    #[allow(clippy::too_many_arguments)]
    pub fn arbitrate(
        &mut self,
        caller: &Address,
        kind: RoundKind,
        chain_id: ChainId,
        height: BlockHeight,
        primary_hash: Hash32,
        secondary_hash: Hash32,
        block: u64,
    ) -> Result<Vec<Event>, EngineError> {
        if !self.operators.is_auditor(caller) {
            return Err(EngineError::NotAuditor);
        }
        let key = SessionKey::new(chain_id, kind, height);
        let session = self.sessions.get(&key).ok_or(EngineError::SessionNotFinalizable)?;
        if session.state(block) != SessionState::RequiresAudit {
            return Err(EngineError::SessionNotFinalizable);
        }

        let winners: Vec<ValidatorId> = session
            .submissions()
            .filter(|s| s.pair.0 == primary_hash)
            .map(|s| s.validator_id)
            .collect();

        let mut events = self.pay_winners(kind, &winners)?;
        let pair = (primary_hash, secondary_hash);
        if let Some(s) = self.sessions.get_mut(&key) {
            s.resolve(Resolution::Finalized, Some(pair));
        }

        info!(auditor = %caller, chain_id, height, ?kind, winners = winners.len(), "session arbitrated");
        events.push(Event::RewardAwarded {
            kind,
            chain_id,
            block_height: height,
            primary_hash,
            secondary_hash,
        });
        Ok(self.emit(events))
    }

    /// An operator still enabled for `role` whose validator is still
    /// enabled in the ledger.
    fn is_eligible(&self, operator: &Address, validator_id: ValidatorId, role: OperatorRole) -> bool {
        self.operators.is_enabled_for(operator, role) && self.staking.is_validator_enabled(validator_id) == Some(true)
    }

    /// Σ current validator stake over every enabled operator of `role`
    /// backed by an enabled validator.
    fn eligible_weight(&self, role: OperatorRole) -> Result<Amount, EngineError> {
        self.operators
            .active_operators(role)
            .iter()
            .filter(|r| self.staking.is_validator_enabled(r.validator_id) == Some(true))
            .map(|r| self.staking.validator_stake(r.validator_id).unwrap_or(0))
            .try_fold(0u128, |acc, s| acc.checked_add(s))
            .ok_or(EngineError::Overflow)
    }

    /// Pay the round reward across `validators`, weighted by their stake
    /// now.
    fn pay_winners(&mut self, kind: RoundKind, validators: &[ValidatorId]) -> Result<Vec<Event>, EngineError> {
        let weighted: Vec<(ValidatorId, Amount)> = validators
            .iter()
            .map(|id| (*id, self.staking.validator_stake(*id).unwrap_or(0)))
            .collect();
        let reward = self.params.reward_for(kind);
        pay_round_reward(&mut self.staking, &self.identity, &weighted, reward)
    }
}

/// The pair with the strictly largest weight; `None` on an empty map or a
/// tie at the top.
fn strict_leader(tallies: &BTreeMap<HashPair, EligibleTally>) -> Option<(HashPair, Amount)> {
    let mut best: Option<(HashPair, Amount)> = None;
    let mut tied = false;
    for (pair, t) in tallies {
        match best {
            Some((_, w)) if t.weight < w => {}
            Some((_, w)) if t.weight == w => tied = true,
            _ => {
                best = Some((*pair, t.weight));
                tied = false;
            }
        }
    }
    if tied {
        None
    } else {
        best
    }
}
