/*!
 * Limits and Constants
 *
 * Thresholds of the importance/state orders and default timeouts.
 * Everything that classifies a score as "cached" or "empty" reads these,
 * never a per-call parameter.
 */

use super::types::{Importance, ProcState, Timestamp};
use std::time::Duration;

// =============================================================================
// IMPORTANCE / STATE THRESHOLDS
// =============================================================================

/// First importance score in the cached band
pub const CACHED_IMPORTANCE_MIN: Importance = Importance::CACHED_MIN;

/// Score reported for cached processes that still host started services
pub const SERVICE_B_IMPORTANCE: Importance = Importance::SERVICE_B;

/// States at or past this one count as empty
pub const EMPTY_STATE_MIN: ProcState = ProcState::CACHED_EMPTY;

/// Default scheduling-state value for an aggregate with no computation yet
pub const UID_BASELINE_STATE: ProcState = ProcState::CACHED_EMPTY;

// =============================================================================
// TIMESTAMPS
// =============================================================================

/// "Never happened" marker for timestamps that sort before any real time
pub const TIME_NEVER: Timestamp = Timestamp::MIN;

/// "Still ongoing" marker for timestamps that sort after any real time
pub const TIME_ONGOING: Timestamp = Timestamp::MAX;

// =============================================================================
// NETWORK CONVERGENCE
// =============================================================================

/// Default bound on a single wait for network-policy acknowledgement (1s)
pub const DEFAULT_NETWORK_WAIT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Initial capacity of a uid's member list
/// [PERF] Most principals run one or two processes
pub const UID_MEMBER_CAPACITY: usize = 4;
