/*!
 * Process Snapshot
 * Point-in-time copy of a record's hot fields, taken under one read
 */

use crate::core::serde::{is_false, is_none, never_as_none};
use crate::core::types::{Capability, Importance, Pid, ProcState, SchedulingGroup, Timestamp, Uid};
use serde::{Deserialize, Serialize};

/// Serializable view of a process record
///
/// Importance and state fields come from a single critical section, so a
/// snapshot never mixes values from two different writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProcessSnapshot {
    pub name: String,
    pub uid: Uid,
    pub pid: Pid,
    pub raw_importance: Importance,
    pub current_importance: Importance,
    pub applied_importance: Importance,
    pub verified_importance: Importance,
    pub max_importance: Importance,
    pub raw_state: ProcState,
    pub current_state: ProcState,
    pub reported_state: ProcState,
    pub applied_state: ProcState,
    pub capability: Capability,
    pub scheduling_group: SchedulingGroup,
    #[serde(with = "never_as_none")]
    pub last_state_time: Timestamp,
    #[serde(skip_serializing_if = "is_false", default)]
    pub has_started_services: bool,
    #[serde(skip_serializing_if = "is_false", default)]
    pub frozen: bool,
    pub adj_seq: i32,
    pub completed_adj_seq: i32,
    pub lru_seq: i32,
    /// Present only in snapshots taken under the service lock
    #[serde(skip_serializing_if = "is_none", default)]
    pub adj_type: Option<String>,
    #[serde(skip_serializing_if = "is_none", default)]
    pub adj_reason: Option<String>,
}

impl ProcessSnapshot {
    #[inline]
    pub fn is_cached(&self) -> bool {
        self.current_importance.is_cached()
    }

    /// A recompute was requested for this record and has not finished
    #[inline]
    pub fn is_recompute_pending(&self) -> bool {
        self.adj_seq != self.completed_adj_seq
    }
}
