//! # Submission Sessions
//!
//! A session collects submissions for one `(chain, round kind, height)`.
//!
//! ## Lifecycle
//!
//! ```text
//!            first submission
//!                  │
//!                  ▼
//!               ┌──────┐  current ≥ deadline  ┌────────┐
//!               │ Open │ ───────────────────► │ Closed │
//!               └──────┘                      └────────┘
//!                                              │      │
//!                          quorum met ◄────────┘      └────────► quorum missed
//!                              │           finalize               │
//!                              ▼                                  ▼
//!                        ┌───────────┐      arbitrate     ┌───────────────┐
//!                        │ Finalized │ ◄───────────────── │ RequiresAudit │
//!                        └───────────┘                    └───────────────┘
//! ```
//!
//! `Open` and `Closed` are not stored; they are derived from the deadline
//! and the current block. The stored [`Resolution`] moves from `Pending`
//! exactly once, and out of `RequiresAudit` only through arbitration.

use std::collections::BTreeMap;

use proofchain_common::{Address, Amount, BlockHeight, ChainId, Hash32, RoundKind, ValidatorId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionKey {
    pub chain_id: ChainId,
    pub kind: RoundKind,
    pub height: BlockHeight,
}

impl SessionKey {
    pub fn new(chain_id: ChainId, kind: RoundKind, height: BlockHeight) -> Self {
        SessionKey { chain_id, kind, height }
    }
}

/// `(primary hash, secondary hash)` as submitted.
pub type HashPair = (Hash32, Hash32);

/// Observable session state at a given block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Open,
    Closed,
    Finalized,
    RequiresAudit,
}

/// Stored outcome.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    #[default]
    Pending,
    Finalized,
    RequiresAudit,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub operator: Address,
    pub validator_id: ValidatorId,
    /// Validator stake recorded when the submission was made.
    pub stake: Amount,
    pub pair: HashPair,
    pub storage_locator: String,
}

/// Aggregate weight of one hash pair.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairTally {
    pub weight: Amount,
    pub submitters: Vec<Address>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub key: SessionKey,
    pub start_block: u64,
    pub deadline: u64,
    tallies: BTreeMap<HashPair, PairTally>,
    submissions: BTreeMap<Address, Submission>,
    leader: Option<HashPair>,
    resolution: Resolution,
    winner: Option<HashPair>,
}

impl Session {
    pub fn new(key: SessionKey, start_block: u64, duration: u64) -> Self {
        Session {
            key,
            start_block,
            deadline: start_block.saturating_add(duration),
            tallies: BTreeMap::new(),
            submissions: BTreeMap::new(),
            leader: None,
            resolution: Resolution::Pending,
            winner: None,
        }
    }

    pub fn state(&self, current_block: u64) -> SessionState {
        match self.resolution {
            Resolution::Finalized => SessionState::Finalized,
            Resolution::RequiresAudit => SessionState::RequiresAudit,
            Resolution::Pending if current_block >= self.deadline => SessionState::Closed,
            Resolution::Pending => SessionState::Open,
        }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn winner(&self) -> Option<HashPair> {
        self.winner
    }

    pub fn has_submitted(&self, operator: &Address) -> bool {
        self.submissions.contains_key(operator)
    }

    /// True if any operator of `validator_id` has submitted.
    pub fn has_validator(&self, validator_id: ValidatorId) -> bool {
        self.submissions.values().any(|s| s.validator_id == validator_id)
    }

    pub fn has_pair(&self, pair: &HashPair) -> bool {
        self.tallies.contains_key(pair)
    }

    pub fn distinct_pairs(&self) -> usize {
        self.tallies.len()
    }

    pub fn submission_count(&self) -> usize {
        self.submissions.len()
    }

    pub fn submissions(&self) -> impl Iterator<Item = &Submission> {
        self.submissions.values()
    }

    pub fn tally(&self, pair: &HashPair) -> Option<&PairTally> {
        self.tallies.get(pair)
    }

    pub fn tallies(&self) -> impl Iterator<Item = (&HashPair, &PairTally)> {
        self.tallies.iter()
    }

    /// Pair with the largest aggregate weight as tracked during submission.
    pub fn leader(&self) -> Option<HashPair> {
        self.leader
    }

    /// Record a submission. Callers have already rejected duplicates and
    /// enforced the per-height pair cap.
    pub(crate) fn record(&mut self, submission: Submission) -> Option<()> {
        let pair = submission.pair;
        let weight = self
            .tallies
            .get(&pair)
            .map(|t| t.weight)
            .unwrap_or(0)
            .checked_add(submission.stake)?;
        let tally = self.tallies.entry(pair).or_default();
        tally.weight = weight;
        tally.submitters.push(submission.operator);

        let leads = match self.leader.and_then(|p| self.tallies.get(&p)) {
            Some(current) => weight > current.weight,
            None => true,
        };
        if leads {
            self.leader = Some(pair);
        }
        self.submissions.insert(submission.operator, submission);
        Some(())
    }

    pub(crate) fn resolve(&mut self, resolution: Resolution, winner: Option<HashPair>) {
        self.resolution = resolution;
        self.winner = winner;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::from_bytes([b; 20])
    }

    fn pair(label: &str) -> HashPair {
        (Hash32::digest(label), Hash32::digest(label))
    }

    fn submission(op: u8, stake: Amount, p: HashPair) -> Submission {
        Submission {
            operator: addr(op),
            validator_id: op as ValidatorId,
            stake,
            pair: p,
            storage_locator: "example.com".to_string(),
        }
    }

    #[test]
    fn state_follows_deadline_and_resolution() {
        let mut s = Session::new(SessionKey::new(1, RoundKind::Specimen, 123), 100, 10);
        assert_eq!(s.state(100), SessionState::Open);
        assert_eq!(s.state(109), SessionState::Open);
        assert_eq!(s.state(110), SessionState::Closed);
        s.resolve(Resolution::RequiresAudit, None);
        assert_eq!(s.state(110), SessionState::RequiresAudit);
        s.resolve(Resolution::Finalized, Some(pair("a")));
        assert_eq!(s.state(500), SessionState::Finalized);
    }

    #[test]
    fn leader_tracks_strictly_larger_weight() {
        let mut s = Session::new(SessionKey::new(1, RoundKind::Result, 5), 0, 10);
        s.record(submission(1, 10, pair("a"))).unwrap();
        assert_eq!(s.leader(), Some(pair("a")));
        // equal weight does not take the lead
        s.record(submission(2, 10, pair("b"))).unwrap();
        assert_eq!(s.leader(), Some(pair("a")));
        s.record(submission(3, 5, pair("b"))).unwrap();
        assert_eq!(s.leader(), Some(pair("b")));

        assert_eq!(s.tally(&pair("b")).unwrap().weight, 15);
        assert_eq!(s.tally(&pair("b")).unwrap().submitters, vec![addr(2), addr(3)]);
        assert_eq!(s.distinct_pairs(), 2);
        assert!(s.has_submitted(&addr(3)));
        assert!(s.has_validator(3));
        assert!(!s.has_validator(4));
    }
}
