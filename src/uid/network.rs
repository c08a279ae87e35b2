/*!
 * Network Convergence
 *
 * Every time a uid's state crosses the background boundary a new requested
 * sequence is issued from one service-wide counter. The network-policy
 * authority acknowledges sequences; callers that need the new policy in
 * effect block until the acknowledgement catches up.
 */

use crate::core::types::ProcState;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Service-wide source of requested sequence numbers
///
/// Sequences are strictly increasing across every aggregate sharing it.
#[derive(Debug, Default)]
pub struct ProcStateSeqCounter {
    last: AtomicU64,
}

impl ProcStateSeqCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counter ready to share between aggregates
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Issue the next sequence (first call returns 1)
    #[inline]
    pub fn next(&self) -> u64 {
        self.last.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Last issued sequence, 0 before the first
    #[inline]
    pub fn current(&self) -> u64 {
        self.last.load(Ordering::Acquire)
    }
}

/// Direction of a state change across the background boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkTransition {
    /// Foreground to background: network access may now be restricted
    Block,
    /// Background to foreground: restrictions must be lifted before use
    Unblock,
}

impl NetworkTransition {
    /// `None` when both states sit on the same side of the boundary
    pub fn classify(prev: ProcState, cur: ProcState) -> Option<Self> {
        match (prev.is_background(), cur.is_background()) {
            (false, true) => Some(Self::Block),
            (true, false) => Some(Self::Unblock),
            _ => None,
        }
    }

    /// Callers should wait for acknowledgement before using the network
    #[inline]
    pub fn requires_wait(self) -> bool {
        matches!(self, Self::Unblock)
    }
}
