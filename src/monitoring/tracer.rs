/*!
 * Structured Tracing
 * Subscriber setup, importance tracks and network-wait spans on the tracing crate
 *
 * Features:
 * - JSON or compact output selected from the environment
 * - Per-process importance track events (`oom:<name>/u<uid>`)
 * - Timed spans around blocking acknowledgement waits
 */

use std::time::Instant;
use tracing::{debug, info, span, trace, warn, Level};
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Target for importance-track events, filterable on its own
pub const IMPORTANCE_TARGET: &str = "procstate::importance";

/// Waits longer than this are reported as slow
const SLOW_WAIT_MS: u128 = 100;

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - PROCSTATE_TRACE_JSON: Enable JSON output (default: false)
///
/// A no-op when a global subscriber is already installed.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("PROCSTATE_TRACE_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
            .is_ok()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()
            .is_ok()
    };

    if installed {
        info!(json = use_json, "structured tracing initialized");
    }
}

/// Begin a new slice on a process's importance track
///
/// Each adj-type change closes the previous slice and opens one labelled with
/// the new type.
#[inline]
pub fn trace_importance_track(track: &str, adj_type: Option<&str>) {
    trace!(target: IMPORTANCE_TARGET, track, phase = "end", "importance slice");
    if let Some(adj_type) = adj_type {
        trace!(target: IMPORTANCE_TARGET, track, phase = "begin", adj_type, "importance slice");
    }
}

/// Close the open slice on a track for good (process gone)
#[inline]
pub fn end_importance_track(track: &str) {
    trace!(target: IMPORTANCE_TARGET, track, phase = "end", "importance slice");
}

/// Span around a blocking wait for network-policy acknowledgement
pub struct WaitSpan {
    span: tracing::Span,
    start: Instant,
    uid: u32,
}

impl WaitSpan {
    pub fn new(uid: u32, requested: u64) -> Self {
        let span = span!(
            Level::DEBUG,
            "network_wait",
            uid,
            requested,
            acknowledged = tracing::field::Empty,
            result = tracing::field::Empty,
            duration_us = tracing::field::Empty,
        );

        let _entered = span.enter();
        debug!(uid, requested, "waiting for network acknowledgement");
        drop(_entered);

        Self {
            span,
            start: Instant::now(),
            uid,
        }
    }

    pub fn record_acknowledged(&self, acknowledged: u64) {
        self.span.record("acknowledged", acknowledged);
    }

    pub fn record_result(&self, caught_up: bool) {
        self.span
            .record("result", if caught_up { "caught_up" } else { "timeout" });
    }
}

impl Drop for WaitSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        let _entered = self.span.enter();
        self.span.record("duration_us", duration.as_micros() as u64);

        if duration.as_millis() > SLOW_WAIT_MS {
            warn!(
                uid = self.uid,
                duration_ms = duration.as_millis() as u64,
                slow = true,
                "slow network acknowledgement wait"
            );
        } else {
            debug!(
                uid = self.uid,
                duration_us = duration.as_micros() as u64,
                "network acknowledgement wait finished"
            );
        }
    }
}

/// Helper to create a network-wait span
#[inline]
pub fn span_network_wait(uid: u32, requested: u64) -> WaitSpan {
    WaitSpan::new(uid, requested)
}
