/*!
 * Process Record Tests
 * Importance/state writes, cleanup, sequences and snapshots through the public API
 */

use procstate_core::core::limits::{SERVICE_B_IMPORTANCE, TIME_NEVER};
use procstate_core::process::ImportanceReason;
use procstate_core::{
    Capability, Importance, ProcState, ProcessState, ProcessStateBuilder, SchedulingGroup,
    ServiceLocks,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::sync::Arc;
use std::thread;

fn record(locks: &Arc<ServiceLocks>) -> ProcessState {
    ProcessStateBuilder::new("com.example.mail", 10_042)
        .with_pid(777)
        .with_locks(Arc::clone(locks))
        .build()
}

#[test]
fn test_dry_run_reports_without_writing() {
    let locks = ServiceLocks::new();
    let process = record(&locks);
    let both = locks.lock_both();

    process.set_raw_importance(&both, Importance::SERVICE, false);
    assert!(process.set_raw_importance(&both, Importance::VISIBLE, true));
    assert!(!process.set_raw_importance(&both, Importance::SERVICE, true));
    assert!(!process.set_raw_importance(&both, Importance::CACHED_MIN, true));
    assert_eq!(process.raw_importance(&both), Importance::SERVICE);
}

#[test]
fn test_reads_under_either_lock() {
    let locks = ServiceLocks::new();
    let process = record(&locks);
    {
        let both = locks.lock_both();
        process.set_current_importance(&both, Importance::PERCEPTIBLE);
        process.set_current_state(&both, ProcState::IMPORTANT_FOREGROUND);
    }

    {
        let proc_only = locks.lock_proc();
        assert_eq!(process.current_importance(&proc_only), Importance::PERCEPTIBLE);
    }
    let service = locks.lock_service();
    assert_eq!(process.current_state(&service), ProcState::IMPORTANT_FOREGROUND);

    // Nested acquisition from an outer service section
    let both = service.lock_proc();
    process.set_current_state(&both, ProcState::SERVICE);
    assert_eq!(process.current_state(&both), ProcState::SERVICE);
}

#[test]
fn test_cached_with_started_services_reports_service_b() {
    let locks = ServiceLocks::new();
    let process = record(&locks);
    let both = locks.lock_both();

    process.set_applied_importance(&both, Importance(950));
    assert_eq!(process.applied_importance_with_services(&both), Importance(950));

    process.set_has_started_services(&both, true);
    assert_eq!(
        process.applied_importance_with_services(&both),
        SERVICE_B_IMPORTANCE
    );

    process.set_applied_importance(&both, Importance::VISIBLE);
    assert_eq!(
        process.applied_importance_with_services(&both),
        Importance::VISIBLE
    );
}

#[test]
fn test_cleanup_resets_to_baseline() {
    let locks = ServiceLocks::new();
    let process = record(&locks);
    let both = locks.lock_both();

    process.set_current_importance(&both, Importance::FOREGROUND);
    process.set_current_state(&both, ProcState::TOP);
    process.set_current_capability(&both, Capability::all());
    process.set_current_scheduling_group(&both, SchedulingGroup::TopApp);
    process.inc_adj_seq();

    process.on_cleanup(&both);
    process.on_cleanup(&both);

    let snapshot = process.snapshot(&both);
    assert_eq!(snapshot.current_importance, Importance::INVALID);
    assert_eq!(snapshot.current_state, ProcState::NONEXISTENT);
    assert_eq!(snapshot.capability, Capability::empty());
    assert_eq!(snapshot.scheduling_group, SchedulingGroup::Background);
    assert_eq!(snapshot.adj_seq, 0);
    assert!(!process.is_cached(&both));
}

#[test]
fn test_concurrent_adj_seq_settles() {
    let locks = ServiceLocks::new();
    let process = Arc::new(record(&locks));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let process = Arc::clone(&process);
            thread::spawn(move || {
                for _ in 0..1_000 {
                    if i % 2 == 0 {
                        process.inc_adj_seq();
                    } else {
                        process.dec_adj_seq();
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(process.adj_seq(), 0);
}

#[test]
fn test_recompute_pending_until_completed_catches_up() {
    let locks = ServiceLocks::new();
    let process = record(&locks);

    assert_eq!(process.inc_adj_seq(), 1);
    assert_eq!(process.inc_adj_seq(), 2);
    let proc_only = locks.lock_proc();
    assert!(process.snapshot(&proc_only).is_recompute_pending());

    process.set_completed_adj_seq(2);
    assert!(!process.snapshot(&proc_only).is_recompute_pending());
}

#[test]
fn test_reason_travels_with_importance() {
    let locks = ServiceLocks::new();
    let process = record(&locks);
    let both = locks.lock_both();

    let reason = ImportanceReason::new("service")
        .with_source("com.example.client", ProcState::TOP)
        .with_target("MailSyncService");
    process.set_importance_with_reason(&both, Importance::PERCEPTIBLE, reason);

    let snapshot = process.detailed_snapshot(&both);
    assert_eq!(snapshot.current_importance, Importance::PERCEPTIBLE);
    assert_eq!(snapshot.adj_type.as_deref(), Some("service"));
    assert_eq!(
        snapshot.adj_reason.as_deref(),
        Some(" MailSyncService<=com.example.client")
    );
}

#[test]
fn test_snapshot_serializes_never_as_null() {
    let locks = ServiceLocks::new();
    let process = record(&locks);
    {
        let both = locks.lock_both();
        process.set_last_state_time(&both, TIME_NEVER);
    }
    let proc_only = locks.lock_proc();

    let json = serde_json::to_value(process.snapshot(&proc_only)).unwrap();
    assert_eq!(json["name"], "com.example.mail");
    assert_eq!(json["pid"], 777);
    assert!(json["last_state_time"].is_null());
}

#[test]
fn test_display_and_track_name() {
    let locks = ServiceLocks::new();
    let process = record(&locks);
    assert_eq!(process.to_string(), "777:com.example.mail/u10042");
    assert_eq!(process.track_name(), "oom:com.example.mail/u10042");
}

proptest! {
    #[test]
    fn prop_dry_run_never_mutates(start in -1000i32..1002, candidate in -1000i32..1002, state in -1i32..21) {
        let locks = ServiceLocks::new();
        let process = record(&locks);
        let both = locks.lock_both();
        process.set_raw_importance(&both, Importance(start), false);
        process.set_raw_state(&both, ProcState(state), false);
        let before = process.snapshot(&both);

        let improves = process.set_raw_importance(&both, Importance(candidate), true);
        prop_assert_eq!(improves, candidate < start);
        process.set_raw_state(&both, ProcState(20 - state), true);

        prop_assert_eq!(process.snapshot(&both), before);
    }
}
