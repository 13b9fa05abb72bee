//! Unit tests for the proof chain store over the in-process ledger.

use proofchain_chain::{Custody, LedgerParams, MemoryCustody, StakingLedger};
use proofchain_common::{Address, Amount, Event, Hash32, LiveSyncPolicy, OperatorRole, RoundKind, DIVIDER, ONE_TOKEN};

use super::*;
use crate::error::EngineError;
use crate::session::{SessionKey, SessionState};

// ════════════════════════════════════════════════════════════════════════════════
// DETERMINISTIC TEST HELPERS
// ════════════════════════════════════════════════════════════════════════════════

type Chain = ProofChain<StakingLedger<MemoryCustody>>;

const CHAIN: ChainId = 1;
const HEIGHT: u64 = 123;
const BSP: OperatorRole = OperatorRole::BlockSpecimenProducer;

fn addr(b: u8) -> Address {
    Address::from_bytes([b; 20])
}

fn vault() -> Address { addr(0xee) }
fn gov() -> Address { addr(0xa0) }
fn engine() -> Address { addr(0xa1) }
fn auditor() -> Address { addr(0xa2) }
fn owner(i: u8) -> Address { addr(0x01 + i) }
fn op(i: u8) -> Address { addr(0x40 + i) }

fn tokens(n: u128) -> Amount {
    n * ONE_TOKEN
}

fn h(label: &str) -> Hash32 {
    Hash32::digest(label)
}

fn params() -> EngineParams {
    EngineParams {
        session_duration: 10,
        quorum_threshold: DIVIDER / 2,
        min_submissions_required: 2,
        seconds_per_block: 12,
        block_specimen_reward: tokens(6),
        block_result_reward: tokens(6),
    }
}

/// `n` enabled validators (ids `0..n`, 10% commission, 1000 tokens each),
/// each with one enabled specimen operator `op(i)`. Journal drained.
fn setup(n: u8) -> Chain {
    let mut custody = MemoryCustody::new(vault());
    custody.mint(gov(), tokens(1_000_000)).unwrap();
    for i in 0..n {
        custody.mint(owner(i), tokens(1_000_000)).unwrap();
    }
    let ledger = StakingLedger::new(
        custody,
        gov(),
        engine(),
        LedgerParams {
            delegator_cooldown: 5,
            validator_cooldown: 10,
            max_cap_multiplier: 2,
            validator_max_stake: tokens(100_000),
        },
    );
    let mut c = ProofChain::new(ledger, gov(), engine(), params());

    c.set_nth_block(&gov(), CHAIN, 1).unwrap();
    c.set_chain_sync_data(&gov(), CHAIN, HEIGHT, 0, 12).unwrap();
    c.set_block_height_submissions_threshold(&gov(), CHAIN, 1_000).unwrap();
    c.set_max_submissions_per_block_height(&gov(), CHAIN, 3).unwrap();
    c.set_required_stake(&gov(), BSP, tokens(100)).unwrap();
    c.add_auditor(&gov(), auditor()).unwrap();
    c.deposit_reward_tokens(&gov(), tokens(1_000)).unwrap();

    for i in 0..n {
        let id = c.add_validator(&gov(), owner(i), DIVIDER / 10, 0).unwrap();
        assert_eq!(id, u64::from(i));
        c.stake(&owner(i), id, tokens(1_000)).unwrap();
        c.add_operator(&gov(), BSP, op(i), id).unwrap();
        c.enable_operator(&owner(i), BSP, &op(i)).unwrap();
    }
    c.drain_events();
    c
}

fn submit(c: &mut Chain, i: u8, primary: &str, secondary: &str, block: u64) -> Result<Event, EngineError> {
    c.submit_proof(&op(i), RoundKind::Specimen, CHAIN, HEIGHT, h(primary), h(secondary), "storage://x", block)
}

fn key() -> SessionKey {
    SessionKey::new(CHAIN, RoundKind::Specimen, HEIGHT)
}

fn rewarded_ids(events: &[Event]) -> Vec<u64> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Rewarded { validator_id, .. } => Some(*validator_id),
            _ => None,
        })
        .collect()
}

// ════════════════════════════════════════════════════════════════════════════════
// SETUP & JOURNAL
// ════════════════════════════════════════════════════════════════════════════════

#[test]
fn enabling_first_operator_enables_validator() {
    let c = setup(1);
    assert_eq!(c.staking().validator(0).map(|v| v.is_enabled()), Some(true));
    assert!(c.operators().is_enabled_for(&op(0), BSP));
}

#[test]
fn failed_operations_do_not_journal() {
    let mut c = setup(1);
    assert!(c.set_session_duration(&owner(0), 5).is_err());
    assert!(submit(&mut c, 0, "a", "a", 1_000_000).is_err());
    assert!(c.journal().is_empty());

    c.set_session_duration(&gov(), 5).unwrap();
    assert_eq!(c.journal(), &[Event::SessionDurationChanged { blocks: 5 }]);
    assert_eq!(c.drain_events().len(), 1);
    assert!(c.journal().is_empty());
}

#[test]
fn governance_setter_validation() {
    let mut c = setup(0);
    assert_eq!(c.set_quorum_threshold(&gov(), DIVIDER + 1), Err(EngineError::InvalidParameter("quorum threshold above 100%")));
    assert!(c.set_quorum_threshold(&gov(), DIVIDER).is_ok());
    assert!(matches!(c.set_seconds_per_block(&gov(), 0), Err(EngineError::InvalidParameter(_))));
    assert!(matches!(c.set_chain_sync_data(&gov(), 7, 1, 1, 0), Err(EngineError::InvalidParameter(_))));
    assert_eq!(c.set_min_submissions_required(&engine(), 1), Err(EngineError::NotGovernance));

    c.set_reward_allocation(&gov(), RoundKind::Result, tokens(2)).unwrap();
    assert_eq!(c.params().reward_for(RoundKind::Result), tokens(2));
    c.set_live_sync_policy(&gov(), 9, LiveSyncPolicy::EverySubmission).unwrap();
    assert_eq!(c.chain_sync(9).map(|s| s.live_sync), Some(LiveSyncPolicy::EverySubmission));
    assert_eq!(c.chain_sync(9).map(|s| s.nth_block), Some(0));
}

// ════════════════════════════════════════════════════════════════════════════════
// SUBMISSION
// ════════════════════════════════════════════════════════════════════════════════

#[test]
fn first_submission_opens_session() {
    let mut c = setup(2);
    let ev = submit(&mut c, 0, "H2", "Hs", 1).unwrap();
    assert!(matches!(ev, Event::ProofSubmitted { validator_id: 0, stake, .. } if stake == tokens(1_000)));

    let s = c.session(&key()).unwrap();
    assert_eq!((s.start_block, s.deadline), (1, 11));
    assert_eq!(s.state(10), SessionState::Open);
    assert_eq!(s.state(11), SessionState::Closed);
}

#[test]
fn submit_rejects_wrong_callers() {
    let mut c = setup(1);
    assert_eq!(
        c.submit_proof(&addr(0x77), RoundKind::Specimen, CHAIN, HEIGHT, h("a"), h("a"), "", 1),
        Err(EngineError::Unauthorized { caller: addr(0x77), role: BSP })
    );
    // a specimen operator cannot submit results
    assert_eq!(
        c.submit_proof(&op(0), RoundKind::Result, CHAIN, HEIGHT, h("a"), h("a"), "", 1),
        Err(EngineError::Unauthorized { caller: op(0), role: OperatorRole::BlockResultProducer })
    );
    c.disable_operator(&owner(0), BSP, &op(0), 1).unwrap();
    assert!(matches!(submit(&mut c, 0, "a", "a", 1), Err(EngineError::Unauthorized { .. })));
}

#[test]
fn submit_rejects_bad_chain_and_height() {
    let mut c = setup(1);
    assert_eq!(
        c.submit_proof(&op(0), RoundKind::Specimen, 2, HEIGHT, h("a"), h("a"), "", 1),
        Err(EngineError::InvalidChainId(2))
    );
    // expected = 123 + block, window ±1000
    assert!(matches!(
        c.submit_proof(&op(0), RoundKind::Specimen, CHAIN, 5_000, h("a"), h("a"), "", 1),
        Err(EngineError::InvalidBlockHeight { .. })
    ));
    c.set_nth_block(&gov(), CHAIN, 5).unwrap();
    assert!(matches!(submit(&mut c, 0, "a", "a", 1), Err(EngineError::InvalidBlockHeight { .. })));
    assert!(c.session(&key()).is_none());
}

#[test]
fn duplicate_and_late_submissions_rejected() {
    let mut c = setup(3);
    submit(&mut c, 0, "a", "a", 1).unwrap();
    assert_eq!(submit(&mut c, 0, "b", "b", 2), Err(EngineError::DuplicateSubmission));
    assert_eq!(submit(&mut c, 1, "a", "a", 11), Err(EngineError::SessionClosed));
    submit(&mut c, 1, "a", "a", 10).unwrap();
    assert_eq!(c.session(&key()).unwrap().submission_count(), 2);
}

#[test]
fn distinct_pair_cap_per_height() {
    let mut c = setup(5);
    submit(&mut c, 0, "a", "a", 1).unwrap();
    submit(&mut c, 1, "b", "b", 1).unwrap();
    submit(&mut c, 2, "c", "c", 1).unwrap();
    assert_eq!(submit(&mut c, 3, "d", "d", 1), Err(EngineError::MaxSubmissionsExceeded { max: 3 }));
    // joining an existing pair is still allowed
    submit(&mut c, 3, "a", "a", 1).unwrap();
    assert_eq!(c.session(&key()).unwrap().distinct_pairs(), 3);
}

#[test]
fn stake_gate_applies_at_submission() {
    let mut c = setup(1);
    c.set_required_stake(&gov(), BSP, tokens(5_000)).unwrap();
    assert_eq!(
        submit(&mut c, 0, "a", "a", 1),
        Err(EngineError::InsufficientStake { required: tokens(5_000), actual: tokens(1_000) })
    );
}

// ════════════════════════════════════════════════════════════════════════════════
// FINALIZE
// ════════════════════════════════════════════════════════════════════════════════

#[test]
fn six_to_four_split_finalizes_and_pays_majority() {
    let mut c = setup(10);
    for i in 0..6 {
        submit(&mut c, i, "H2", "Hs", 1).unwrap();
    }
    for i in 6..10 {
        submit(&mut c, i, "H2", "H2", 1).unwrap();
    }
    c.drain_events();

    let events = c.finalize_and_reward_session(RoundKind::Specimen, CHAIN, HEIGHT, 11).unwrap();
    assert_eq!(rewarded_ids(&events), vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(
        events.last(),
        Some(&Event::RewardAwarded {
            kind: RoundKind::Specimen,
            chain_id: CHAIN,
            block_height: HEIGHT,
            primary_hash: h("H2"),
            secondary_hash: h("Hs"),
        })
    );
    // 6 tokens over 6 equal stakes, 10% commission
    assert!(events.contains(&Event::Rewarded { validator_id: 0, amount: tokens(1) - tokens(1) / 10, commission: tokens(1) / 10 }));
    assert_eq!(c.staking().reward_pool(), tokens(994));
    assert_eq!(c.journal(), events.as_slice());

    let s = c.session(&key()).unwrap();
    assert_eq!(s.state(11), SessionState::Finalized);
    assert_eq!(s.winner(), Some((h("H2"), h("Hs"))));
}

#[test]
fn finalize_lifecycle_errors() {
    let mut c = setup(3);
    assert_eq!(
        c.finalize_and_reward_session(RoundKind::Specimen, CHAIN, HEIGHT, 50),
        Err(EngineError::SessionNotStarted)
    );
    submit(&mut c, 0, "a", "a", 1).unwrap();
    submit(&mut c, 1, "a", "a", 1).unwrap();
    assert_eq!(
        c.finalize_and_reward_session(RoundKind::Specimen, CHAIN, HEIGHT, 10),
        Err(EngineError::SessionNotPastDeadline { deadline: 11, current: 10 })
    );
    c.finalize_and_reward_session(RoundKind::Specimen, CHAIN, HEIGHT, 11).unwrap();
    assert_eq!(
        c.finalize_and_reward_session(RoundKind::Specimen, CHAIN, HEIGHT, 12),
        Err(EngineError::SessionCannotBeFinalized)
    );
    // a finalized session no longer accepts submissions
    assert_eq!(submit(&mut c, 2, "a", "a", 5), Err(EngineError::SessionClosed));
}

#[test]
fn tie_at_top_requires_audit() {
    let mut c = setup(10);
    for i in 0..5 {
        submit(&mut c, i, "a", "a", 1).unwrap();
    }
    for i in 5..10 {
        submit(&mut c, i, "b", "b", 1).unwrap();
    }
    c.set_quorum_threshold(&gov(), DIVIDER / 10).unwrap();

    let events = c.finalize_and_reward_session(RoundKind::Specimen, CHAIN, HEIGHT, 11).unwrap();
    assert_eq!(events, vec![Event::QuorumNotReached { kind: RoundKind::Specimen, chain_id: CHAIN, block_height: HEIGHT }]);
    assert_eq!(c.session(&key()).unwrap().state(11), SessionState::RequiresAudit);
    assert_eq!(
        c.finalize_and_reward_session(RoundKind::Specimen, CHAIN, HEIGHT, 12),
        Err(EngineError::SessionCannotBeFinalized)
    );
}

#[test]
fn too_few_submissions_requires_audit() {
    let mut c = setup(1);
    submit(&mut c, 0, "a", "a", 1).unwrap();
    let events = c.finalize_and_reward_session(RoundKind::Specimen, CHAIN, HEIGHT, 11).unwrap();
    assert!(matches!(events[0], Event::QuorumNotReached { .. }));
    assert_eq!(c.staking().reward_pool(), tokens(1_000));
}

#[test]
fn disabled_submitter_drops_out_of_quorum() {
    let mut c = setup(10);
    for i in 0..6 {
        submit(&mut c, i, "a", "a", 1).unwrap();
    }
    for i in 6..10 {
        submit(&mut c, i, "b", "b", 1).unwrap();
    }
    // three of the six majority operators go away before finalize
    for i in 0..3 {
        c.disable_operator(&owner(i), BSP, &op(i), 5).unwrap();
    }

    // eligible: a = 3, b = 4 of a 7-validator denominator
    let events = c.finalize_and_reward_session(RoundKind::Specimen, CHAIN, HEIGHT, 11).unwrap();
    assert_eq!(rewarded_ids(&events), vec![6, 7, 8, 9]);
    assert_eq!(c.session(&key()).unwrap().winner(), Some((h("b"), h("b"))));
}

#[test]
fn governance_disabled_validator_leaves_quorum() {
    let mut c = setup(4);
    c.set_quorum_threshold(&gov(), DIVIDER * 6 / 10).unwrap();
    submit(&mut c, 0, "a", "a", 1).unwrap();
    submit(&mut c, 1, "a", "a", 1).unwrap();
    submit(&mut c, 2, "b", "b", 1).unwrap();

    assert_eq!(c.disable_validator(&owner(0), 3, 2), Err(EngineError::NotGovernance));
    let events = c.disable_validator(&gov(), 3, 2).unwrap();
    assert_eq!(
        events,
        vec![
            Event::OperatorDisabled { operator: op(3), validator_id: 3, role: BSP },
            Event::ValidatorDisabled { validator_id: 3, block: 2 },
        ]
    );
    assert_eq!(c.journal().last(), Some(&Event::ValidatorDisabled { validator_id: 3, block: 2 }));
    assert!(!c.operators().is_enabled_for(&op(3), BSP));
    assert_eq!(
        submit(&mut c, 3, "b", "b", 3),
        Err(EngineError::Unauthorized { caller: op(3), role: BSP })
    );

    // a = 2000 of 3000 enabled stake; counting validator 3 would leave 2000 / 4000
    let events = c.finalize_and_reward_session(RoundKind::Specimen, CHAIN, HEIGHT, 11).unwrap();
    assert_eq!(rewarded_ids(&events), vec![0, 1]);
    assert_eq!(c.session(&key()).unwrap().state(11), SessionState::Finalized);
}

#[test]
fn ledger_disabled_validator_cannot_submit_or_count() {
    let mut c = setup(3);
    submit(&mut c, 0, "a", "a", 1).unwrap();
    submit(&mut c, 1, "a", "a", 1).unwrap();
    submit(&mut c, 2, "b", "b", 1).unwrap();
    // straight on the ledger, the registry still lists op(0) as enabled
    c.staking_mut().disable_validator(&gov(), 0, 2).unwrap();
    assert!(c.operators().is_enabled_for(&op(0), BSP));

    let next = c.submit_proof(&op(0), RoundKind::Specimen, CHAIN, HEIGHT + 1, h("a"), h("a"), "s", 3);
    assert_eq!(next, Err(EngineError::Unauthorized { caller: op(0), role: BSP }));

    // a: validator 1 only, 1000 of 2000 enabled stake, tied with b
    let events = c.finalize_and_reward_session(RoundKind::Specimen, CHAIN, HEIGHT, 11).unwrap();
    assert!(matches!(events[0], Event::QuorumNotReached { .. }));
}

#[test]
fn validator_votes_once_per_session() {
    let mut c = setup(2);
    c.add_operator(&gov(), BSP, op(10), 0).unwrap();
    submit(&mut c, 0, "a", "a", 1).unwrap();

    // owner swaps operators mid-session
    c.disable_operator(&owner(0), BSP, &op(0), 2).unwrap();
    c.enable_operator(&owner(0), BSP, &op(10)).unwrap();
    assert_eq!(submit(&mut c, 10, "a", "a", 3), Err(EngineError::DuplicateSubmission));
    assert_eq!(submit(&mut c, 10, "c", "c", 3), Err(EngineError::DuplicateSubmission));

    submit(&mut c, 1, "b", "b", 3).unwrap();
    let s = c.session(&key()).unwrap();
    assert_eq!(s.submission_count(), 2);
    assert_eq!(s.tally(&(h("a"), h("a"))).unwrap().weight, tokens(1_000));

    c.finalize_and_reward_session(RoundKind::Specimen, CHAIN, HEIGHT, 11).unwrap();
    let events = c.arbitrate(&auditor(), RoundKind::Specimen, CHAIN, HEIGHT, h("a"), h("a"), 12).unwrap();
    assert_eq!(rewarded_ids(&events), vec![0]);
}

// ════════════════════════════════════════════════════════════════════════════════
// ARBITRATION
// ════════════════════════════════════════════════════════════════════════════════

#[test]
fn four_way_split_arbitrated_once() {
    let mut c = setup(10);
    c.set_max_submissions_per_block_height(&gov(), CHAIN, 4).unwrap();
    let split = [("a", 3), ("b", 3), ("c", 3), ("d", 1)];
    let mut i = 0u8;
    for (label, count) in split {
        for _ in 0..count {
            submit(&mut c, i, label, label, 1).unwrap();
            i += 1;
        }
    }

    let arb = |c: &mut Chain, who: Address, block: u64| {
        c.arbitrate(&who, RoundKind::Specimen, CHAIN, HEIGHT, h("b"), h("b2"), block)
    };
    // not yet finalized: closed is not the same as requiring audit
    assert_eq!(arb(&mut c, auditor(), 11), Err(EngineError::SessionNotFinalizable));

    let events = c.finalize_and_reward_session(RoundKind::Specimen, CHAIN, HEIGHT, 11).unwrap();
    assert!(matches!(events[0], Event::QuorumNotReached { .. }));

    assert_eq!(arb(&mut c, owner(0), 12), Err(EngineError::NotAuditor));
    let events = arb(&mut c, auditor(), 12).unwrap();
    assert_eq!(rewarded_ids(&events), vec![3, 4, 5]);
    assert!(matches!(events.last(), Some(Event::RewardAwarded { .. })));

    let s = c.session(&key()).unwrap();
    assert_eq!(s.state(12), SessionState::Finalized);
    assert_eq!(s.winner(), Some((h("b"), h("b2"))));
    assert_eq!(arb(&mut c, auditor(), 13), Err(EngineError::SessionNotFinalizable));
}

#[test]
fn arbitration_pays_disabled_submitters() {
    let mut c = setup(4);
    for i in 0..2 {
        submit(&mut c, i, "a", "a", 1).unwrap();
    }
    for i in 2..4 {
        submit(&mut c, i, "b", "b", 1).unwrap();
    }
    c.finalize_and_reward_session(RoundKind::Specimen, CHAIN, HEIGHT, 11).unwrap();
    c.disable_operator(&owner(0), BSP, &op(0), 12).unwrap();

    let events = c.arbitrate(&auditor(), RoundKind::Specimen, CHAIN, HEIGHT, h("a"), h("a"), 12).unwrap();
    assert_eq!(rewarded_ids(&events), vec![0, 1]);
    assert_eq!(c.staking().custody().balance_of(&vault()), c.staking().total_locked().unwrap());
}
