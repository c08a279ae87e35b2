/*!
 * Uid Aggregate Tests
 * Member-derived facts and change batching
 */

use procstate_core::uid::ProcStateSeqCounter;
use procstate_core::{
    ChangeFlags, Importance, ProcState, ProcessState, ProcessStateBuilder, ServiceLocks,
    UidAggregate,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

const UID: u32 = 10_123;

fn setup(members: &[(&str, i32)]) -> (Arc<ServiceLocks>, UidAggregate, Vec<Arc<ProcessState>>) {
    let locks = ServiceLocks::new();
    let aggregate = UidAggregate::new(
        UID,
        &locks,
        ProcStateSeqCounter::shared(),
        Duration::from_millis(100),
    );
    let records: Vec<_> = {
        let both = locks.lock_both();
        members
            .iter()
            .map(|(name, importance)| {
                let record = Arc::new(
                    ProcessStateBuilder::new(name, UID)
                        .with_locks(Arc::clone(&locks))
                        .build(),
                );
                record.set_applied_importance(&both, Importance(*importance));
                aggregate.add_member(&both, Arc::clone(&record));
                record
            })
            .collect()
    };
    (locks, aggregate, records)
}

#[test]
fn test_min_importance_over_members() {
    let (locks, aggregate, _) = setup(&[("main", 50), ("sync", 10), ("cache", 900)]);
    let proc_only = locks.lock_proc();
    assert_eq!(aggregate.min_importance(&proc_only), Importance(10));
}

#[test]
fn test_min_importance_empty_is_unknown() {
    let (locks, aggregate, _) = setup(&[]);
    let service = locks.lock_service();
    assert_eq!(aggregate.min_importance(&service), Importance::UNKNOWN);
    assert!(aggregate.all_members_frozen(&service, None));
}

#[test]
fn test_importance_drop_tracked_after_member_update() {
    let (locks, aggregate, records) = setup(&[("a", 200), ("b", 50)]);
    let both = locks.lock_both();
    assert_eq!(aggregate.min_importance(&both), Importance(50));

    records[1].set_applied_importance(&both, Importance(900));
    assert_eq!(aggregate.min_importance(&both), Importance(200));

    aggregate.remove_member(&both, &records[0]);
    assert_eq!(aggregate.min_importance(&both), Importance(900));
}

#[test]
fn test_frozen_scenarios() {
    let (locks, aggregate, records) = setup(&[("a", 100), ("b", 100)]);
    let (a, b) = (&records[0], &records[1]);
    let both = locks.lock_both();

    // A is being frozen: only B matters
    b.set_frozen(&both, true);
    assert!(aggregate.all_members_frozen(&both, Some(a)));
    assert!(!aggregate.all_members_frozen(&both, None));

    a.set_frozen(&both, true);
    assert!(aggregate.all_members_frozen(&both, None));
    aggregate.set_frozen(true);
    assert!(aggregate.is_frozen());

    // B thaws
    b.set_frozen(&both, false);
    assert!(!aggregate.all_members_frozen(&both, Some(a)));
}

#[test]
fn test_all_members_frozen_three_members() {
    let (locks, aggregate, records) = setup(&[("p", 100), ("q", 100), ("r", 100)]);
    let (p, q, r) = (&records[0], &records[1], &records[2]);
    let both = locks.lock_both();

    // P itself stays unfrozen while being excluded
    q.set_frozen(&both, true);
    r.set_frozen(&both, true);
    assert!(!p.is_frozen(&both));
    assert!(aggregate.all_members_frozen(&both, Some(p)));

    q.set_frozen(&both, false);
    assert!(!aggregate.all_members_frozen(&both, Some(p)));
}

#[test]
fn test_change_bits_accumulate_and_drain() {
    let (_, aggregate, _) = setup(&[]);
    aggregate.mark_changed(ChangeFlags::STATE);
    aggregate.mark_changed(ChangeFlags::UNCACHED | ChangeFlags::ACTIVE);

    assert_eq!(
        aggregate.drain_and_reset(),
        ChangeFlags::STATE | ChangeFlags::UNCACHED | ChangeFlags::ACTIVE
    );
    assert!(aggregate.pending_changes().is_empty());
    assert_eq!(
        aggregate.last_reported_change().to_string(),
        "active|uncached|procstate"
    );
}

#[test]
fn test_summary_round_trips_through_json() {
    let (locks, aggregate, _) = setup(&[("a", 0)]);
    let both = locks.lock_both();
    aggregate.set_current_state(&both, ProcState::TOP);
    aggregate.set_idle(&both, false);

    let summary = aggregate.summary(&both);
    let json = serde_json::to_string(&summary).unwrap();
    let back: procstate_core::UidSummary = serde_json::from_str(&json).unwrap();
    assert_eq!(back, summary);
    assert_eq!(
        summary.to_string(),
        "UidRecord{10123 TOP procs:1 seq(0,0)} caps=0x0"
    );
}
