/*!
 * Network Convergence Tests
 * Sequence monotonicity and blocking acknowledgement waits
 */

use procstate_core::core::sync::WaitError;
use procstate_core::uid::{NetworkTransition, ProcStateSeqCounter};
use procstate_core::{ProcState, ServiceLocks, UidAggregate};
use proptest::prelude::*;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn aggregate(uid: u32, counter: &Arc<ProcStateSeqCounter>) -> Arc<UidAggregate> {
    Arc::new(UidAggregate::new(
        uid,
        &ServiceLocks::new(),
        Arc::clone(counter),
        Duration::from_millis(200),
    ))
}

#[test]
fn test_await_returns_immediately_when_caught_up() {
    let counter = ProcStateSeqCounter::shared();
    let uid = aggregate(1, &counter);
    let seq = uid.bump_requested_seq();
    uid.acknowledge(seq);

    let start = Instant::now();
    assert!(uid.await_acknowledged(Duration::from_secs(5)).is_ok());
    assert!(start.elapsed() < Duration::from_secs(1));
    assert_eq!(uid.network_waiters(), 0);
}

#[test]
fn test_await_times_out_with_both_values() {
    let counter = ProcStateSeqCounter::shared();
    let uid = aggregate(1, &counter);
    let seq = uid.bump_requested_seq();

    let start = Instant::now();
    let result = uid.await_acknowledged(Duration::from_millis(30));
    assert!(start.elapsed() >= Duration::from_millis(30));
    assert_eq!(
        result,
        Err(WaitError::Timeout {
            requested: seq,
            acknowledged: 0
        })
    );
}

#[test]
fn test_acknowledge_wakes_blocked_waiter() {
    let counter = ProcStateSeqCounter::shared();
    let uid = aggregate(7, &counter);
    let (transition, seq) = uid
        .note_state_transition(ProcState::CACHED_EMPTY, ProcState::TOP)
        .unwrap();
    assert!(transition.requires_wait());

    let waiter = {
        let uid = Arc::clone(&uid);
        thread::spawn(move || uid.await_acknowledged(Duration::from_secs(5)))
    };

    let start = Instant::now();
    while uid.network_waiters() == 0 && start.elapsed() < Duration::from_secs(1) {
        thread::sleep(Duration::from_millis(1));
    }
    uid.acknowledge(seq);

    assert!(waiter.join().unwrap().is_ok());
    assert_eq!(uid.network_waiters(), 0);
}

#[test]
fn test_stale_acknowledgement_never_lowers() {
    let counter = ProcStateSeqCounter::shared();
    let uid = aggregate(1, &counter);
    uid.bump_requested_seq();
    let latest = uid.bump_requested_seq();
    assert_eq!(uid.acknowledge(latest), latest);
    assert_eq!(uid.acknowledge(1), latest);
}

#[test]
fn test_transition_classification() {
    assert_eq!(
        NetworkTransition::classify(ProcState::FOREGROUND_SERVICE, ProcState::CACHED_RECENT),
        Some(NetworkTransition::Block)
    );
    assert_eq!(
        NetworkTransition::classify(ProcState::TOP, ProcState::FOREGROUND_SERVICE),
        None
    );
}

proptest! {
    #[test]
    fn prop_requested_seq_strictly_increases_across_uids(picks in prop::collection::vec(0usize..4, 1..64)) {
        let counter = ProcStateSeqCounter::shared();
        let uids: Vec<_> = (0..4).map(|uid| aggregate(uid, &counter)).collect();

        let mut last = 0;
        for pick in picks {
            let seq = uids[pick].bump_requested_seq();
            prop_assert!(seq > last);
            prop_assert_eq!(uids[pick].requested_seq(), seq);
            last = seq;
        }
        prop_assert_eq!(counter.current(), last);
    }
}
