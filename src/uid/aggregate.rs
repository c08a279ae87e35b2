/*!
 * Uid Aggregate
 *
 * Per-principal view over the process records owned by one uid: member set,
 * principal-wide derived facts, the network convergence handshake and the
 * pending-change bits for the dispatcher.
 *
 * Member set and aggregated scalars are composite-guarded like the hot
 * fields of a record. Scans take the member read lock first, then each
 * member's hot read lock; nothing takes them in the other order.
 */

use super::changes::{ChangeFlags, PendingChanges};
use super::network::{NetworkTransition, ProcStateSeqCounter};
use crate::core::limits::{UID_BASELINE_STATE, UID_MEMBER_CAPACITY};
use crate::core::sync::{
    composite_accessors, BothGuard, CompositeCell, HoldsAny, SeqWait, ServiceLocks, WaitError,
    WaitResult,
};
use crate::core::types::{Capability, Importance, ProcState, Timestamp, Uid};
use crate::monitoring::tracer::span_network_wait;
use crate::process::ProcessState;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
struct UidFields {
    current_state: ProcState,
    applied_state: ProcState,
    importance_changed: bool,
    current_capability: Capability,
    applied_capability: Capability,
    last_background_time: Timestamp,
    last_idle_time_if_still_idle: Timestamp,
    real_last_idle_time: Timestamp,
    ephemeral: bool,
    has_foreground_services: bool,
    current_allow_list: bool,
    applied_allow_list: bool,
    idle: bool,
    applied_idle: bool,
}

impl Default for UidFields {
    fn default() -> Self {
        Self {
            current_state: UID_BASELINE_STATE,
            applied_state: ProcState::NONEXISTENT,
            importance_changed: false,
            current_capability: Capability::empty(),
            applied_capability: Capability::empty(),
            last_background_time: 0,
            last_idle_time_if_still_idle: 0,
            real_last_idle_time: 0,
            ephemeral: false,
            has_foreground_services: false,
            current_allow_list: false,
            applied_allow_list: false,
            idle: true,
            applied_idle: false,
        }
    }
}

/// Aggregate state of one principal
pub struct UidAggregate {
    uid: Uid,
    locks: Arc<ServiceLocks>,
    members: CompositeCell<Vec<Arc<ProcessState>>>,
    fields: CompositeCell<UidFields>,
    frozen: AtomicBool,
    has_internet_permission: AtomicBool,
    seq_counter: Arc<ProcStateSeqCounter>,
    network: SeqWait,
    changes: PendingChanges,
    network_wait_timeout: Duration,
}

impl UidAggregate {
    /// Aggregate for `uid`, drawing sequences from `seq_counter`
    pub fn new(
        uid: Uid,
        locks: &Arc<ServiceLocks>,
        seq_counter: Arc<ProcStateSeqCounter>,
        network_wait_timeout: Duration,
    ) -> Self {
        Self {
            uid,
            locks: Arc::clone(locks),
            members: CompositeCell::new(locks, Vec::with_capacity(UID_MEMBER_CAPACITY)),
            fields: CompositeCell::new(locks, UidFields::default()),
            frozen: AtomicBool::new(false),
            has_internet_permission: AtomicBool::new(false),
            seq_counter,
            network: SeqWait::new(),
            changes: PendingChanges::new(),
            network_wait_timeout,
        }
    }

    #[inline(always)]
    #[must_use]
    pub fn uid(&self) -> Uid {
        self.uid
    }

    #[inline(always)]
    pub fn locks(&self) -> &Arc<ServiceLocks> {
        &self.locks
    }

    // =========================================================================
    // MEMBERSHIP
    // =========================================================================

    /// Add `process`; returns false when it was already a member
    pub fn add_member(&self, proof: &BothGuard<'_>, process: Arc<ProcessState>) -> bool {
        debug_assert_eq!(process.uid(), self.uid, "process belongs to another uid");
        debug_assert!(
            Arc::ptr_eq(process.locks(), &self.locks),
            "process record guarded by a different ServiceLocks"
        );
        let added = self.members.update(proof, |members| {
            if members.iter().any(|m| Arc::ptr_eq(m, &process)) {
                false
            } else {
                members.push(Arc::clone(&process));
                true
            }
        });
        if added {
            debug!(uid = self.uid, process = %process.name(), pid = process.pid(), "member added");
        }
        added
    }

    /// Remove `process`; returns false when it was not a member
    pub fn remove_member(&self, proof: &BothGuard<'_>, process: &ProcessState) -> bool {
        let removed = self.members.update(proof, |members| {
            match members.iter().position(|m| std::ptr::eq(Arc::as_ptr(m), process)) {
                Some(idx) => {
                    members.swap_remove(idx);
                    true
                }
                None => false,
            }
        });
        if removed {
            debug!(uid = self.uid, process = %process.name(), pid = process.pid(), "member removed");
        }
        removed
    }

    pub fn member_count<G: HoldsAny>(&self, proof: &G) -> usize {
        self.members.with(proof, Vec::len)
    }

    pub fn is_empty<G: HoldsAny>(&self, proof: &G) -> bool {
        self.member_count(proof) == 0
    }

    pub fn contains<G: HoldsAny>(&self, proof: &G, process: &ProcessState) -> bool {
        self.members.with(proof, |members| {
            members
                .iter()
                .any(|m| std::ptr::eq(Arc::as_ptr(m), process))
        })
    }

    /// Visit every member under the member read lock
    ///
    /// `f` must not add or remove members.
    pub fn for_each_member<G: HoldsAny>(&self, proof: &G, mut f: impl FnMut(&Arc<ProcessState>)) {
        self.members.with(proof, |members| members.iter().for_each(&mut f));
    }

    /// Copy of the member list
    pub fn members<G: HoldsAny>(&self, proof: &G) -> Vec<Arc<ProcessState>> {
        self.members.with(proof, Clone::clone)
    }

    // =========================================================================
    // DERIVED FACTS
    // =========================================================================

    /// Lowest applied importance among members, [`Importance::UNKNOWN`] when empty
    pub fn min_importance<G: HoldsAny>(&self, proof: &G) -> Importance {
        self.members.with(proof, |members| {
            members
                .iter()
                .map(|m| m.applied_importance(proof))
                .fold(Importance::UNKNOWN, Importance::min)
        })
    }

    /// Every member other than `excluding` is frozen (vacuously true)
    pub fn all_members_frozen<G: HoldsAny>(
        &self,
        proof: &G,
        excluding: Option<&ProcessState>,
    ) -> bool {
        self.members.with(proof, |members| {
            members
                .iter()
                .filter(|m| !excluding.is_some_and(|ex| std::ptr::eq(Arc::as_ptr(m), ex)))
                .all(|m| m.is_frozen(proof))
        })
    }

    /// Summary flag; callers establish [`all_members_frozen`](Self::all_members_frozen) first
    #[inline]
    pub fn set_frozen(&self, frozen: bool) {
        self.frozen.store(frozen, Ordering::Release);
    }

    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    #[inline]
    pub fn has_internet_permission(&self) -> bool {
        self.has_internet_permission.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set_has_internet_permission(&self, granted: bool) {
        self.has_internet_permission.store(granted, Ordering::Release);
    }

    // =========================================================================
    // AGGREGATED SCALARS
    // =========================================================================

    composite_accessors! { fields {
        current_state / set_current_state => current_state: ProcState;
        applied_state / set_applied_state => applied_state: ProcState;
        /// Some member's importance moved this cycle
        importance_changed / set_importance_changed => importance_changed: bool;
        current_capability / set_current_capability => current_capability: Capability;
        applied_capability / set_applied_capability => applied_capability: Capability;
        last_background_time / set_last_background_time => last_background_time: Timestamp;
        is_ephemeral / set_ephemeral => ephemeral: bool;
        has_foreground_services / set_has_foreground_services => has_foreground_services: bool;
        current_allow_list / set_current_allow_list => current_allow_list: bool;
        applied_allow_list / set_applied_allow_list => applied_allow_list: bool;
        is_idle / set_idle => idle: bool;
        applied_idle / set_applied_idle => applied_idle: bool;
    } }

    pub fn last_idle_time_if_still_idle<G: HoldsAny>(&self, proof: &G) -> Timestamp {
        self.fields.with(proof, |f| f.last_idle_time_if_still_idle)
    }

    pub fn real_last_idle_time<G: HoldsAny>(&self, proof: &G) -> Timestamp {
        self.fields.with(proof, |f| f.real_last_idle_time)
    }

    /// Record the idle time; only a positive value moves the real idle time
    pub fn set_last_idle_time(&self, proof: &BothGuard<'_>, time: Timestamp) {
        self.fields.update(proof, |f| {
            f.last_idle_time_if_still_idle = time;
            if time > 0 {
                f.real_last_idle_time = time;
            }
        });
    }

    /// Start-of-cycle reset of the computed scalars
    pub fn reset(&self, proof: &BothGuard<'_>) {
        self.fields.update(proof, |f| {
            f.current_state = UID_BASELINE_STATE;
            f.has_foreground_services = false;
            f.current_capability = Capability::empty();
        });
    }

    // =========================================================================
    // NETWORK CONVERGENCE
    // =========================================================================

    /// Issue a new requested sequence, greater than any issued before
    pub fn bump_requested_seq(&self) -> u64 {
        let seq = self.seq_counter.next();
        self.network.set_requested(seq);
        debug!(uid = self.uid, seq, "network sequence requested");
        seq
    }

    /// Bump the requested sequence if `prev -> cur` crosses the background boundary
    pub fn note_state_transition(
        &self,
        prev: ProcState,
        cur: ProcState,
    ) -> Option<(NetworkTransition, u64)> {
        NetworkTransition::classify(prev, cur).map(|transition| (transition, self.bump_requested_seq()))
    }

    /// Raise the acknowledged sequence to at least `seq` and wake waiters
    pub fn acknowledge(&self, seq: u64) -> u64 {
        let acknowledged = self.network.acknowledge(seq);
        debug!(uid = self.uid, seq, acknowledged, "network sequence acknowledged");
        acknowledged
    }

    #[inline]
    pub fn requested_seq(&self) -> u64 {
        self.network.requested()
    }

    #[inline]
    pub fn acknowledged_seq(&self) -> u64 {
        self.network.acknowledged()
    }

    /// Threads currently blocked in [`await_acknowledged`](Self::await_acknowledged)
    #[inline]
    pub fn network_waiters(&self) -> usize {
        self.network.waiter_count()
    }

    /// Block until the acknowledgement catches up or `timeout` elapses
    ///
    /// Must be called without holding either service lock. A timeout is an
    /// expected outcome; the caller decides whether to proceed.
    pub fn await_acknowledged(&self, timeout: Duration) -> WaitResult<()> {
        let span = span_network_wait(self.uid, self.network.requested());
        let result = self.network.wait_caught_up(timeout);
        span.record_acknowledged(self.network.acknowledged());
        span.record_result(result.is_ok());
        if let Err(WaitError::Timeout {
            requested,
            acknowledged,
        }) = &result
        {
            warn!(
                uid = self.uid,
                requested,
                acknowledged,
                timeout_ms = timeout.as_millis() as u64,
                "network acknowledgement timed out"
            );
        }
        result
    }

    /// [`await_acknowledged`](Self::await_acknowledged) with the configured timeout
    pub fn await_acknowledged_default(&self) -> WaitResult<()> {
        self.await_acknowledged(self.network_wait_timeout)
    }

    // =========================================================================
    // PENDING CHANGES
    // =========================================================================

    #[inline]
    pub fn mark_changed(&self, flags: ChangeFlags) {
        self.changes.mark(flags);
    }

    #[inline]
    pub fn pending_changes(&self) -> ChangeFlags {
        self.changes.pending()
    }

    /// Hand the accumulated bits to the dispatcher and clear them
    pub fn drain_and_reset(&self) -> ChangeFlags {
        self.changes.drain_and_reset()
    }

    #[inline]
    pub fn last_reported_change(&self) -> ChangeFlags {
        self.changes.last_reported()
    }

    #[inline]
    pub fn set_last_reported_change(&self, flags: ChangeFlags) {
        self.changes.set_last_reported(flags);
    }

    /// Point-in-time summary for logs and dumps
    pub fn summary<G: HoldsAny>(&self, proof: &G) -> UidSummary {
        let (requested_seq, acknowledged_seq) = self.network.pair();
        let members = self.member_count(proof);
        self.fields.with(proof, |f| UidSummary {
            uid: self.uid,
            state: f.current_state,
            capability: f.current_capability,
            ephemeral: f.ephemeral,
            foreground_services: f.has_foreground_services,
            allow_list: f.current_allow_list,
            idle: f.idle,
            frozen: self.is_frozen(),
            members,
            last_reported_change: self.changes.last_reported(),
            requested_seq,
            acknowledged_seq,
        })
    }
}

impl fmt::Debug for UidAggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UidAggregate")
            .field("uid", &self.uid)
            .field("frozen", &self.is_frozen())
            .field("network", &self.network.pair())
            .field("pending", &self.changes.pending())
            .finish_non_exhaustive()
    }
}

/// Serializable snapshot of an aggregate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct UidSummary {
    pub uid: Uid,
    pub state: ProcState,
    pub capability: Capability,
    pub ephemeral: bool,
    pub foreground_services: bool,
    pub allow_list: bool,
    pub idle: bool,
    pub frozen: bool,
    pub members: usize,
    pub last_reported_change: ChangeFlags,
    pub requested_seq: u64,
    pub acknowledged_seq: u64,
}

impl fmt::Display for UidSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UidRecord{{{} {}", self.uid, self.state)?;
        if self.ephemeral {
            f.write_str(" ephemeral")?;
        }
        if self.foreground_services {
            f.write_str(" fgServices")?;
        }
        if self.allow_list {
            f.write_str(" allowlist")?;
        }
        if self.idle {
            f.write_str(" idle")?;
        }
        if self.frozen {
            f.write_str(" frozen")?;
        }
        if !self.last_reported_change.is_empty() {
            write!(f, " change:{}", self.last_reported_change)?;
        }
        write!(
            f,
            " procs:{} seq({},{})}} caps={:#x}",
            self.members,
            self.requested_seq,
            self.acknowledged_seq,
            self.capability.bits()
        )
    }
}
