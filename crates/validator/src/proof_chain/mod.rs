//! # Proof Chain
//!
//! Top-level store owning the staking ledger, the operator registry, the
//! per-chain sync records and every submission session. All state is
//! reached through this value; there is no ambient global state.
//!
//! ## Module Overview
//!
//! | Module | Operations |
//! |--------|------------|
//! | `governance` | engine parameter setters, chain sync setters, operator and auditor management |
//! | `submission` | `submit_proof` |
//! | `finalize` | `finalize_and_reward_session`, `arbitrate` |
//! | `ledger_ops` | staking pass-throughs when the backing ledger is a [`StakingLedger`] |
//!
//! ## Identities
//!
//! ```text
//!   governance ──► parameter setters, add/remove operator, auditors
//!   identity   ──► the engine's own account; the ledger must name it
//!                  staking manager so rewards and enable/disable cascades
//!                  are accepted
//! ```
//!
//! ## Journal
//!
//! Every successful operation appends its events to an in-memory journal
//! in emission order and also returns them. Failed operations append
//! nothing.

mod finalize;
mod governance;
mod ledger_ops;
mod submission;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;

use proofchain_chain::{OperatorRegistry, StakingInterface, StakingLedger};
use proofchain_common::{Address, ChainId, Config, Event, OperatorRole};
use tracing::{debug, info};

use crate::error::EngineError;
use crate::params::EngineParams;
use crate::session::{Session, SessionKey};
use crate::sync::ChainSync;

pub struct ProofChain<S: StakingInterface> {
    staking: S,
    operators: OperatorRegistry,
    sessions: BTreeMap<SessionKey, Session>,
    chains: BTreeMap<ChainId, ChainSync>,
    params: EngineParams,
    governance: Address,
    identity: Address,
    journal: Vec<Event>,
}

impl<S: StakingInterface> ProofChain<S> {
    pub fn new(staking: S, governance: Address, identity: Address, params: EngineParams) -> Self {
        ProofChain {
            staking,
            operators: OperatorRegistry::new(governance, identity),
            sessions: BTreeMap::new(),
            chains: BTreeMap::new(),
            params,
            governance,
            identity,
            journal: Vec::new(),
        }
    }

    /// Build from the `[engine]` and `[[chains]]` config sections.
    /// Required stakes are installed through the registry setter, so they
    /// show up in the journal.
    pub fn from_config(
        staking: S,
        governance: Address,
        identity: Address,
        cfg: &Config,
    ) -> Result<Self, EngineError> {
        let mut chain = ProofChain::new(staking, governance, identity, EngineParams::from(&cfg.engine));

        for (role, amount) in [
            (OperatorRole::BlockSpecimenProducer, cfg.engine.bsp_required_stake),
            (OperatorRole::BlockResultProducer, cfg.engine.brp_required_stake),
        ] {
            let ev = chain.operators.set_required_stake(&governance, role, amount)?;
            chain.emit_one(ev);
        }
        for c in &cfg.chains {
            chain.chains.insert(c.chain_id, ChainSync::from(c));
        }

        info!(
            chains = chain.chains.len(),
            session_duration = chain.params.session_duration,
            quorum_threshold = chain.params.quorum_threshold,
            "proof chain configured"
        );
        Ok(chain)
    }

    // ════════════════════════════════════════════════════════════════════════════
    // ACCESSORS
    // ════════════════════════════════════════════════════════════════════════════

    pub fn staking(&self) -> &S {
        &self.staking
    }

    /// Direct ledger access for hosts whose ledger also changes outside
    /// the store. The ledger still enforces its own caller checks, but
    /// nothing done here reaches the journal; use the store's own entry
    /// points when the journal must hold the full history.
    pub fn staking_mut(&mut self) -> &mut S {
        &mut self.staking
    }

    pub fn operators(&self) -> &OperatorRegistry {
        &self.operators
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    pub fn governance(&self) -> Address {
        self.governance
    }

    pub fn identity(&self) -> Address {
        self.identity
    }

    pub fn session(&self, key: &SessionKey) -> Option<&Session> {
        self.sessions.get(key)
    }

    pub fn sessions(&self) -> impl Iterator<Item = (&SessionKey, &Session)> {
        self.sessions.iter()
    }

    pub fn chain_sync(&self, chain_id: ChainId) -> Option<&ChainSync> {
        self.chains.get(&chain_id)
    }

    pub fn chains(&self) -> impl Iterator<Item = &ChainSync> {
        self.chains.values()
    }

    pub fn journal(&self) -> &[Event] {
        &self.journal
    }

    /// Take every journaled event, leaving the journal empty.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.journal)
    }

    // ════════════════════════════════════════════════════════════════════════════
    // INTERNAL
    // ════════════════════════════════════════════════════════════════════════════

    fn ensure_governance(&self, caller: &Address) -> Result<(), EngineError> {
        if *caller != self.governance {
            return Err(EngineError::NotGovernance);
        }
        Ok(())
    }

    /// Journal `events` and hand them back to the caller.
    fn emit(&mut self, events: Vec<Event>) -> Vec<Event> {
        for ev in &events {
            debug!(event = ev.name(), "event");
        }
        self.journal.extend(events.iter().cloned());
        events
    }

    fn emit_one(&mut self, event: Event) -> Event {
        debug!(event = event.name(), "event");
        self.journal.push(event.clone());
        event
    }
}

/// The store over the in-process ledger.
pub type LedgerProofChain<C> = ProofChain<StakingLedger<C>>;
