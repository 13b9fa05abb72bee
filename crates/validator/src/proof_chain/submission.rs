use proofchain_chain::StakingInterface;
use proofchain_common::{Address, BlockHeight, ChainId, Event, Hash32, RoundKind};
use tracing::{debug, info};

use super::ProofChain;
use crate::error::EngineError;
use crate::session::{Session, SessionKey, SessionState, Submission};

impl<S: StakingInterface> ProofChain<S> {
    /// Record `caller`'s `(primary, secondary)` hash pair for
    /// `(chain_id, kind, height)` at host block `block`.
    ///
    /// The first submission for a key opens its session; the session
    /// deadline is `block + session_duration`.
    ///
    /// ## Check Order (Strict)
    ///
    /// 1. Caller is an enabled operator of `kind.role()` and its validator
    ///    is enabled in the ledger (`Unauthorized`)
    /// 2. Chain is known (`InvalidChainId`)
    /// 3. Height is a positive multiple of `nth_block` and, when the
    ///    chain's live-sync policy applies, inside the window
    ///    (`InvalidBlockHeight`)
    /// 4. An existing session is still open (`SessionClosed`)
    /// 5. Neither the caller nor another operator of its validator has
    ///    submitted to this session (`DuplicateSubmission`)
    /// 6. A new hash pair fits under the chain's per-height cap
    ///    (`MaxSubmissionsExceeded`)
    /// 7. Owning validator's stake ≥ the role's required stake
    ///    (`InsufficientStake`)
    ///
    /// ## Atomicity
    ///
    /// A new session is built aside and inserted only after the
    /// submission is recorded.
    #[allow(clippy::too_many_arguments)]
    pub fn submit_proof(
        &mut self,
        caller: &Address,
        kind: RoundKind,
        chain_id: ChainId,
        height: BlockHeight,
        primary_hash: Hash32,
        secondary_hash: Hash32,
        storage_locator: &str,
        block: u64,
    ) -> Result<Event, EngineError> {
        let role = kind.role();
        let validator_id = match self.operators.operator(caller) {
            Some(r) if r.enabled && r.role == role => r.validator_id,
            _ => return Err(EngineError::Unauthorized { caller: *caller, role }),
        };
        if self.staking.is_validator_enabled(validator_id) != Some(true) {
            return Err(EngineError::Unauthorized { caller: *caller, role });
        }

        let chain = self.chains.get(&chain_id).ok_or(EngineError::InvalidChainId(chain_id))?;
        let key = SessionKey::new(chain_id, kind, height);
        let existing = self.sessions.get(&key);
        chain.check_height(height, block, self.params.seconds_per_block, existing.is_none())?;

        let pair = (primary_hash, secondary_hash);
        if let Some(session) = existing {
            if session.state(block) != SessionState::Open {
                return Err(EngineError::SessionClosed);
            }
            if session.has_submitted(caller) || session.has_validator(validator_id) {
                return Err(EngineError::DuplicateSubmission);
            }
        }
        let distinct = existing.map(Session::distinct_pairs).unwrap_or(0);
        let is_new_pair = !existing.is_some_and(|s| s.has_pair(&pair));
        if is_new_pair && distinct as u64 >= chain.max_submissions_per_block_height {
            return Err(EngineError::MaxSubmissionsExceeded { max: chain.max_submissions_per_block_height });
        }

        let required = self.operators.required_stake(role);
        let stake = self.staking.validator_stake(validator_id).unwrap_or(0);
        if stake < required {
            return Err(EngineError::InsufficientStake { required, actual: stake });
        }

        let submission = Submission {
            operator: *caller,
            validator_id,
            stake,
            pair,
            storage_locator: storage_locator.to_string(),
        };
        match self.sessions.get_mut(&key) {
            Some(session) => session.record(submission).ok_or(EngineError::Overflow)?,
            None => {
                let mut session = Session::new(key, block, self.params.session_duration);
                session.record(submission).ok_or(EngineError::Overflow)?;
                debug!(chain_id, height, ?kind, deadline = session.deadline, "session opened");
                self.sessions.insert(key, session);
            }
        }

        info!(operator = %caller, validator_id, chain_id, height, ?kind, stake, "proof submitted");
        Ok(self.emit_one(Event::ProofSubmitted {
            kind,
            chain_id,
            block_height: height,
            primary_hash,
            secondary_hash,
            storage_locator: storage_locator.to_string(),
            operator: *caller,
            validator_id,
            stake,
        }))
    }
}
