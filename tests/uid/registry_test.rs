/*!
 * Uid Registry Tests
 * Shared locks, shared sequence counter and concurrent lookup
 */

use procstate_core::{CoreConfig, Importance, UidRegistry};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::thread;

#[test]
fn test_concurrent_get_or_create_yields_one_aggregate() {
    let registry = Arc::new(UidRegistry::new(CoreConfig::default()));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.get_or_create(10_500))
        })
        .collect();
    let aggregates: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(registry.len(), 1);
    assert!(aggregates.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
}

#[test]
fn test_admitted_records_share_registry_locks() {
    let registry = UidRegistry::new(CoreConfig::default());
    let main = Arc::new(registry.process_builder("com.example.music", 10_600).build());
    let playback = Arc::new(
        registry
            .process_builder("com.example.music:playback", 10_600)
            .with_pid(9001)
            .build(),
    );
    assert!(Arc::ptr_eq(main.locks(), registry.locks()));

    let both = registry.locks().lock_both();
    let aggregate = registry.admit(&both, Arc::clone(&main));
    registry.admit(&both, Arc::clone(&playback));
    main.set_applied_importance(&both, Importance::CACHED_MIN);
    playback.set_applied_importance(&both, Importance::PERCEPTIBLE);

    assert_eq!(aggregate.member_count(&both), 2);
    assert_eq!(aggregate.min_importance(&both), Importance::PERCEPTIBLE);
    assert!(!registry.remove_if_empty(&both, 10_600));
}

#[test]
fn test_config_timeout_reaches_aggregates() {
    let config = CoreConfig {
        network_wait_timeout_ms: 5,
        ..CoreConfig::default()
    };
    let registry = UidRegistry::new(config);
    let aggregate = registry.get_or_create(1);
    aggregate.bump_requested_seq();

    assert!(aggregate.await_acknowledged_default().is_err());
    assert_eq!(registry.aggregates().len(), 1);
}
