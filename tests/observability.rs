/*!
 * Observability Tests
 * Subscriber installation and trace helpers
 */

use procstate_core::monitoring::tracer::{
    end_importance_track, trace_importance_track, IMPORTANCE_TARGET,
};
use procstate_core::monitoring::{init_tracing, span_network_wait};
use procstate_core::{CoreConfig, ProcessStateBuilder};

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
}

#[test]
fn test_trace_helpers_do_not_panic() {
    init_tracing();
    assert_eq!(IMPORTANCE_TARGET, "procstate::importance");
    trace_importance_track("oom:app/u1", Some("service"));
    trace_importance_track("oom:app/u1", None);
    end_importance_track("oom:app/u1");

    let span = span_network_wait(1, 3);
    span.record_acknowledged(3);
    span.record_result(true);
}

#[test]
fn test_traced_record_emits_on_adj_type_change() {
    init_tracing();
    let config = CoreConfig {
        trace_importance: true,
        ..CoreConfig::default()
    };
    let record = ProcessStateBuilder::new("com.example.traced", 10_900)
        .with_config(&config)
        .build();
    let locks = std::sync::Arc::clone(record.locks());
    let both = locks.lock_both();

    record.set_adj_type(&both, Some("visible"));
    assert_eq!(record.adj_type(&both).as_deref(), Some("visible"));
    record.on_cleanup(&both);
    assert_eq!(record.adj_type(&both), None);
}
