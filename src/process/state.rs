/*!
 * Process State Record
 *
 * Per-process container for importance scores, lifecycle states, capability
 * bits and scheduling group, plus the cached facts the driver consults while
 * scoring. The record stores values; it never decides them.
 *
 * # Field Groups
 *
 * - Hot fields ([`CompositeCell`]): importance, state, capability and
 *   scheduling group. Visibility code reads these under the process-group
 *   lock alone; writers hold both locks.
 * - Service fields ([`ServiceCell`]): cached facts, provenance, ui history
 *   and cache-ranker bookkeeping. Read and written under the service lock.
 * - Recompute sequences: plain atomics, callable from any thread.
 *
 * Observers run after the inner field lock is released, never before the
 * write is visible.
 */

use super::facts::{lookup, ActivityFactSource, ActivityFacts, ActivityStateFlags, FactCache};
use super::observer::{ChangeObserver, LifecycleObserver};
use super::provider::{CompatChange, InfoProvider};
use super::reason::ImportanceReason;
use super::snapshot::ProcessSnapshot;
use crate::core::config::FactMode;
use crate::core::limits::{
    CACHED_IMPORTANCE_MIN, EMPTY_STATE_MIN, SERVICE_B_IMPORTANCE, TIME_NEVER, TIME_ONGOING,
};
use crate::core::sync::{
    composite_accessors, service_accessors, BothGuard, CompositeCell, HoldsAny, HoldsService,
    ServiceCell, ServiceLocks,
};
use crate::core::types::{
    Capability, CpuTimeReasons, ImplicitCpuTimeReasons, Importance, Pid, ProcState,
    SchedulingGroup, Timestamp, Uid,
};
use crate::monitoring::tracer;
use smartstring::alias::String as SmartString;
use std::fmt;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::debug;

#[derive(Debug, Clone)]
struct HotFields {
    raw_importance: Importance,
    applied_raw_importance: Importance,
    current_importance: Importance,
    applied_importance: Importance,
    verified_importance: Importance,
    max_importance: Importance,
    raw_state: ProcState,
    current_state: ProcState,
    reported_state: ProcState,
    applied_state: ProcState,
    current_capability: Capability,
    applied_capability: Capability,
    current_group: SchedulingGroup,
    applied_group: SchedulingGroup,
    current_cpu_time: CpuTimeReasons,
    applied_cpu_time: CpuTimeReasons,
    current_implicit_cpu_time: ImplicitCpuTimeReasons,
    applied_implicit_cpu_time: ImplicitCpuTimeReasons,
    has_started_services: bool,
    has_foreground_activities: bool,
    reported_foreground_activities: bool,
    service_b: bool,
    service_high_ram: bool,
    last_state_time: Timestamp,
    saved_priority: i32,
    frozen: bool,
    bound_by_non_bg_restricted: bool,
    applied_bound_by_non_bg_restricted: bool,
}

impl Default for HotFields {
    fn default() -> Self {
        Self {
            raw_importance: Importance::INVALID,
            applied_raw_importance: Importance::INVALID,
            current_importance: Importance::INVALID,
            applied_importance: Importance::INVALID,
            verified_importance: Importance::INVALID,
            max_importance: Importance::UNKNOWN,
            raw_state: ProcState::NONEXISTENT,
            current_state: ProcState::NONEXISTENT,
            reported_state: ProcState::NONEXISTENT,
            applied_state: ProcState::NONEXISTENT,
            current_capability: Capability::empty(),
            applied_capability: Capability::empty(),
            current_group: SchedulingGroup::Background,
            applied_group: SchedulingGroup::Background,
            current_cpu_time: CpuTimeReasons::empty(),
            applied_cpu_time: CpuTimeReasons::empty(),
            current_implicit_cpu_time: ImplicitCpuTimeReasons::empty(),
            applied_implicit_cpu_time: ImplicitCpuTimeReasons::empty(),
            has_started_services: false,
            has_foreground_activities: false,
            reported_foreground_activities: false,
            service_b: false,
            service_high_ram: false,
            last_state_time: 0,
            saved_priority: 0,
            frozen: false,
            bound_by_non_bg_restricted: false,
            applied_bound_by_non_bg_restricted: false,
        }
    }
}

impl HotFields {
    fn reset_for_cleanup(&mut self) {
        self.has_foreground_activities = false;
        self.raw_importance = Importance::INVALID;
        self.applied_raw_importance = Importance::INVALID;
        self.current_importance = Importance::INVALID;
        self.applied_importance = Importance::INVALID;
        self.verified_importance = Importance::INVALID;
        self.current_capability = Capability::empty();
        self.applied_capability = Capability::empty();
        self.current_group = SchedulingGroup::Background;
        self.applied_group = SchedulingGroup::Background;
        self.raw_state = ProcState::NONEXISTENT;
        self.current_state = ProcState::NONEXISTENT;
        self.applied_state = ProcState::NONEXISTENT;
    }
}

#[derive(Debug)]
struct ServiceFields {
    facts: FactCache,
    activity: ActivityFactSource,
    // Aggregation caches, reset every cycle
    cached_importance: Importance,
    cached_foreground_activities: bool,
    cached_state: ProcState,
    cached_scheduling_group: SchedulingGroup,
    cached_adj_type: Option<SmartString>,
    reason: ImportanceReason,
    forcing_to_important: Option<SmartString>,
    has_shown_ui: bool,
    has_top_ui: bool,
    has_overlay_ui: bool,
    running_remote_animation: bool,
    background_restricted: bool,
    reachable: bool,
    system_no_ui: bool,
    pending_finish_attach: bool,
    schedule_like_top_app: bool,
    has_reported_interaction: bool,
    interaction_event_time: Timestamp,
    fg_interaction_time: Timestamp,
    when_unimportant: Timestamp,
    last_top_time: Timestamp,
    followup_update_uptime: Timestamp,
    last_invisible_time: Timestamp,
    applied_cached: bool,
    last_cached_time: Timestamp,
    cache_ranker_use_count: u32,
    cache_ranker_rss: u64,
    cache_ranker_rss_time: Timestamp,
}

impl ServiceFields {
    fn new(mode: FactMode) -> Self {
        Self {
            facts: FactCache::default(),
            activity: ActivityFactSource::new(mode),
            cached_importance: Importance::INVALID,
            cached_foreground_activities: false,
            cached_state: ProcState::CACHED_EMPTY,
            cached_scheduling_group: SchedulingGroup::Background,
            cached_adj_type: None,
            reason: ImportanceReason::default(),
            forcing_to_important: None,
            has_shown_ui: false,
            has_top_ui: false,
            has_overlay_ui: false,
            running_remote_animation: false,
            background_restricted: false,
            reachable: false,
            system_no_ui: false,
            pending_finish_attach: false,
            schedule_like_top_app: false,
            has_reported_interaction: false,
            interaction_event_time: 0,
            fg_interaction_time: 0,
            when_unimportant: 0,
            last_top_time: 0,
            followup_update_uptime: TIME_ONGOING,
            last_invisible_time: TIME_NEVER,
            applied_cached: false,
            last_cached_time: 0,
            cache_ranker_use_count: 0,
            cache_ranker_rss: 0,
            cache_ranker_rss_time: 0,
        }
    }

    fn reset_cached(&mut self) {
        self.facts.invalidate();
        self.activity.invalidate();
        self.cached_importance = Importance::INVALID;
        self.cached_foreground_activities = false;
        self.cached_state = ProcState::CACHED_EMPTY;
        self.cached_scheduling_group = SchedulingGroup::Background;
        self.cached_adj_type = None;
    }

    fn reset_for_cleanup(&mut self) {
        self.reset_cached();
        self.activity.clear();
        self.reason = ImportanceReason::default();
        self.has_shown_ui = false;
        self.forcing_to_important = None;
    }
}

/// Importance and lifecycle record of one live process
pub struct ProcessState {
    name: SmartString,
    uid: Uid,
    pid: Pid,
    track_name: OnceLock<String>,
    fact_mode: FactMode,
    trace_importance: bool,
    locks: Arc<ServiceLocks>,
    provider: Arc<dyn InfoProvider>,
    observer: Arc<dyn ChangeObserver>,
    lifecycle: Arc<dyn LifecycleObserver>,
    hot: CompositeCell<HotFields>,
    svc: ServiceCell<ServiceFields>,
    adj_seq: AtomicI32,
    completed_adj_seq: AtomicI32,
    lru_seq: AtomicI32,
}

impl ProcessState {
    #[allow(clippy::too_many_arguments)]
    pub(super) fn from_parts(
        name: SmartString,
        uid: Uid,
        pid: Pid,
        locks: Arc<ServiceLocks>,
        provider: Arc<dyn InfoProvider>,
        observer: Arc<dyn ChangeObserver>,
        lifecycle: Arc<dyn LifecycleObserver>,
        fact_mode: FactMode,
        trace_importance: bool,
    ) -> Self {
        let hot = CompositeCell::new(&locks, HotFields::default());
        let svc = ServiceCell::new(&locks, ServiceFields::new(fact_mode));
        Self {
            name,
            uid,
            pid,
            track_name: OnceLock::new(),
            fact_mode,
            trace_importance,
            locks,
            provider,
            observer,
            lifecycle,
            hot,
            svc,
            adj_seq: AtomicI32::new(0),
            completed_adj_seq: AtomicI32::new(0),
            lru_seq: AtomicI32::new(0),
        }
    }

    // =========================================================================
    // IDENTITY
    // =========================================================================

    #[inline(always)]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline(always)]
    #[must_use]
    pub fn uid(&self) -> Uid {
        self.uid
    }

    #[inline(always)]
    #[must_use]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Lock pair guarding this record
    #[inline(always)]
    pub fn locks(&self) -> &Arc<ServiceLocks> {
        &self.locks
    }

    /// Fixed at construction
    #[inline(always)]
    pub fn fact_mode(&self) -> FactMode {
        self.fact_mode
    }

    /// `oom:<name>/u<uid>`, the track importance traces are recorded on
    pub fn track_name(&self) -> &str {
        self.track_name
            .get_or_init(|| format!("oom:{}/u{}", self.name, self.uid))
    }

    // =========================================================================
    // IMPORTANCE
    // =========================================================================

    #[inline]
    pub fn raw_importance<G: HoldsAny>(&self, proof: &G) -> Importance {
        self.hot.with(proof, |hot| hot.raw_importance)
    }

    /// Propose this cycle's raw importance
    ///
    /// With `dry_run` nothing is written: the return value says whether the
    /// write would make the process strictly more important. A real write
    /// always returns `false` and notifies the observer.
    pub fn set_raw_importance(
        &self,
        proof: &BothGuard<'_>,
        importance: Importance,
        dry_run: bool,
    ) -> bool {
        if dry_run {
            return self
                .hot
                .with(proof, |hot| importance.is_more_important_than(hot.raw_importance));
        }
        self.hot.update(proof, |hot| hot.raw_importance = importance);
        self.observer.on_raw_importance_changed(importance);
        false
    }

    #[inline]
    pub fn current_importance<G: HoldsAny>(&self, proof: &G) -> Importance {
        self.hot.with(proof, |hot| hot.current_importance)
    }

    /// Unconditional write; the observer fires even when the value repeats
    pub fn set_current_importance(&self, proof: &BothGuard<'_>, importance: Importance) {
        self.hot.update(proof, |hot| hot.current_importance = importance);
        self.observer.on_current_importance_changed(importance);
    }

    /// Write the current importance together with its provenance
    ///
    /// Both halves change inside the caller's two-lock section, so no reader
    /// holding either lock sees one without the other.
    pub fn set_importance_with_reason(
        &self,
        proof: &BothGuard<'_>,
        importance: Importance,
        reason: ImportanceReason,
    ) {
        let adj_type = reason.adj_type.clone();
        self.hot.update(proof, |hot| hot.current_importance = importance);
        self.svc.update(proof, |svc| svc.reason = reason);
        self.trace_adj_type(adj_type.as_deref());
        self.observer.on_current_importance_changed(importance);
    }

    /// Applied importance, reported as service-B when cached with started services
    pub fn applied_importance_with_services<G: HoldsAny>(&self, proof: &G) -> Importance {
        self.hot.with(proof, |hot| {
            if hot.applied_importance >= CACHED_IMPORTANCE_MIN && hot.has_started_services {
                SERVICE_B_IMPORTANCE
            } else {
                hot.applied_importance
            }
        })
    }

    composite_accessors! { hot {
        /// Raw importance last pushed to the OS
        applied_raw_importance / set_applied_raw_importance => applied_raw_importance: Importance;
        /// Importance last pushed to the OS and acknowledged
        applied_importance / set_applied_importance => applied_importance: Importance;
        /// Importance last confirmed as truly in effect
        verified_importance / set_verified_importance => verified_importance: Importance;
        /// Ceiling hint; never enforced by the record
        max_importance / set_max_importance => max_importance: Importance;
    } }

    /// Current importance falls in the cached band
    #[inline]
    pub fn is_cached<G: HoldsAny>(&self, proof: &G) -> bool {
        self.current_importance(proof) >= CACHED_IMPORTANCE_MIN
    }

    // =========================================================================
    // LIFECYCLE STATE
    // =========================================================================

    #[inline]
    pub fn raw_state<G: HoldsAny>(&self, proof: &G) -> ProcState {
        self.hot.with(proof, |hot| hot.raw_state)
    }

    /// Propose this cycle's raw state; same dry-run contract as importance
    pub fn set_raw_state(&self, proof: &BothGuard<'_>, state: ProcState, dry_run: bool) -> bool {
        if dry_run {
            return self
                .hot
                .with(proof, |hot| state.is_more_important_than(hot.raw_state));
        }
        self.hot.update(proof, |hot| hot.raw_state = state);
        false
    }

    #[inline]
    pub fn current_state<G: HoldsAny>(&self, proof: &G) -> ProcState {
        self.hot.with(proof, |hot| hot.current_state)
    }

    pub fn set_current_state(&self, proof: &BothGuard<'_>, state: ProcState) {
        self.hot.update(proof, |hot| hot.current_state = state);
        self.observer.on_current_state_changed(state);
    }

    #[inline]
    pub fn reported_state<G: HoldsAny>(&self, proof: &G) -> ProcState {
        self.hot.with(proof, |hot| hot.reported_state)
    }

    pub fn set_reported_state(&self, proof: &BothGuard<'_>, state: ProcState) {
        self.hot.update(proof, |hot| hot.reported_state = state);
        self.observer.on_reported_state_changed(state);
    }

    #[inline]
    pub fn applied_state<G: HoldsAny>(&self, proof: &G) -> ProcState {
        self.hot.with(proof, |hot| hot.applied_state)
    }

    /// Record the state last pushed to the process tracker
    ///
    /// Leaving the cached family bumps the cache-ranker use count once.
    pub fn set_applied_state(&self, proof: &BothGuard<'_>, state: ProcState) {
        let left_cache = self.hot.update(proof, |hot| {
            let left = hot.applied_state.is_cached() && !state.is_cached();
            hot.applied_state = state;
            left
        });
        if left_cache {
            let use_count = self.svc.update(proof, |svc| {
                svc.cache_ranker_use_count += 1;
                svc.cache_ranker_use_count
            });
            debug!(
                process = %self.name,
                uid = self.uid,
                state = %state,
                use_count,
                "process left cached state"
            );
        }
    }

    /// Current state is at or past cached-empty
    #[inline]
    pub fn is_empty<G: HoldsAny>(&self, proof: &G) -> bool {
        self.current_state(proof) >= EMPTY_STATE_MIN
    }

    // =========================================================================
    // CAPABILITY / SCHEDULING
    // =========================================================================

    #[inline]
    pub fn current_capability<G: HoldsAny>(&self, proof: &G) -> Capability {
        self.hot.with(proof, |hot| hot.current_capability)
    }

    pub fn set_current_capability(&self, proof: &BothGuard<'_>, capability: Capability) {
        self.hot.update(proof, |hot| hot.current_capability = capability);
        self.observer.on_current_capability_changed(capability);
    }

    #[inline]
    pub fn current_scheduling_group<G: HoldsAny>(&self, proof: &G) -> SchedulingGroup {
        self.hot.with(proof, |hot| hot.current_group)
    }

    pub fn set_current_scheduling_group(&self, proof: &BothGuard<'_>, group: SchedulingGroup) {
        self.hot.update(proof, |hot| hot.current_group = group);
        self.observer.on_scheduling_group_changed(group);
    }

    #[inline]
    pub fn current_cpu_time_reasons<G: HoldsAny>(&self, proof: &G) -> CpuTimeReasons {
        self.hot.with(proof, |hot| hot.current_cpu_time)
    }

    pub fn add_cpu_time_reasons(&self, proof: &BothGuard<'_>, reasons: CpuTimeReasons) {
        self.hot.update(proof, |hot| hot.current_cpu_time |= reasons);
    }

    pub fn clear_cpu_time_reasons(&self, proof: &BothGuard<'_>) {
        self.hot
            .update(proof, |hot| hot.current_cpu_time = CpuTimeReasons::empty());
    }

    #[inline]
    pub fn current_implicit_cpu_time_reasons<G: HoldsAny>(
        &self,
        proof: &G,
    ) -> ImplicitCpuTimeReasons {
        self.hot.with(proof, |hot| hot.current_implicit_cpu_time)
    }

    pub fn add_implicit_cpu_time_reasons(
        &self,
        proof: &BothGuard<'_>,
        reasons: ImplicitCpuTimeReasons,
    ) {
        self.hot
            .update(proof, |hot| hot.current_implicit_cpu_time |= reasons);
    }

    pub fn clear_implicit_cpu_time_reasons(&self, proof: &BothGuard<'_>) {
        self.hot.update(proof, |hot| {
            hot.current_implicit_cpu_time = ImplicitCpuTimeReasons::empty()
        });
    }

    composite_accessors! { hot {
        applied_capability / set_applied_capability => applied_capability: Capability;
        applied_scheduling_group / set_applied_scheduling_group => applied_group: SchedulingGroup;
        applied_cpu_time_reasons / set_applied_cpu_time_reasons => applied_cpu_time: CpuTimeReasons;
        applied_implicit_cpu_time_reasons / set_applied_implicit_cpu_time_reasons
            => applied_implicit_cpu_time: ImplicitCpuTimeReasons;
        has_foreground_activities / set_has_foreground_activities => has_foreground_activities: bool;
        /// Foreground-activity flag as last reported to usage stats
        reported_foreground_activities / set_reported_foreground_activities
            => reported_foreground_activities: bool;
        /// On the secondary service list
        is_service_b / set_service_b => service_b: bool;
        /// Forced onto the secondary list by memory pressure
        is_service_high_ram / set_service_high_ram => service_high_ram: bool;
        last_state_time / set_last_state_time => last_state_time: Timestamp;
        saved_priority / set_saved_priority => saved_priority: i32;
        /// Set by the external freezer
        is_frozen / set_frozen => frozen: bool;
        is_bound_by_non_bg_restricted / set_bound_by_non_bg_restricted
            => bound_by_non_bg_restricted: bool;
        applied_bound_by_non_bg_restricted / set_applied_bound_by_non_bg_restricted
            => applied_bound_by_non_bg_restricted: bool;
    } }

    #[inline]
    pub fn has_started_services<G: HoldsAny>(&self, proof: &G) -> bool {
        self.hot.with(proof, |hot| hot.has_started_services)
    }

    pub fn set_has_started_services(&self, proof: &BothGuard<'_>, has_started_services: bool) {
        self.hot
            .update(proof, |hot| hot.has_started_services = has_started_services);
        self.lifecycle
            .on_has_started_services_changed(has_started_services);
    }

    // =========================================================================
    // CACHED FACTS
    // =========================================================================

    /// Process hosts any activities; `None` when the provider failed
    pub fn has_activities<G: HoldsService>(&self, proof: &G) -> Option<bool> {
        let provider = self.provider.as_ref();
        let found = self
            .svc
            .update(proof, |svc| svc.activity.has_activities(provider));
        if let (true, Some(value)) = (found.pulled, found.value) {
            self.lifecycle.on_has_activities_changed(value);
        }
        found.value
    }

    pub fn has_visible_activities<G: HoldsService>(&self, proof: &G) -> Option<bool> {
        let provider = self.provider.as_ref();
        let found = self
            .svc
            .update(proof, |svc| svc.activity.has_visible_activities(provider));
        if let (true, Some(value)) = (found.pulled, found.value) {
            self.lifecycle.on_has_visible_activities_changed(value);
        }
        found.value
    }

    /// Override the cached visible-activities answer for this epoch
    pub fn set_cached_has_visible_activities<G: HoldsService>(&self, proof: &G, visible: bool) {
        self.svc
            .update(proof, |svc| svc.activity.set_has_visible_activities(visible));
    }

    pub fn has_recent_tasks<G: HoldsService>(&self, proof: &G) -> Option<bool> {
        let provider = self.provider.as_ref();
        self.svc
            .update(proof, |svc| svc.activity.has_recent_tasks(provider))
            .value
    }

    pub fn is_heavy_weight<G: HoldsService>(&self, proof: &G) -> Option<bool> {
        let provider = self.provider.as_ref();
        self.svc.update(proof, |svc| {
            lookup(&mut svc.facts.is_heavy_weight, "is_heavy_weight", || {
                provider.is_heavy_weight()
            })
            .value
        })
    }

    pub fn is_home_process<G: HoldsService>(&self, proof: &G) -> Option<bool> {
        let provider = self.provider.as_ref();
        self.svc.update(proof, |svc| {
            lookup(&mut svc.facts.is_home, "is_home_process", || {
                provider.is_home_process()
            })
            .value
        })
    }

    pub fn is_previous_process<G: HoldsService>(&self, proof: &G) -> Option<bool> {
        let provider = self.provider.as_ref();
        self.svc.update(proof, |svc| {
            lookup(&mut svc.facts.is_previous, "is_previous_process", || {
                provider.is_previous_process()
            })
            .value
        })
    }

    /// Process is receiving a broadcast
    ///
    /// On a fresh positive pull the broadcast's scheduling group is stored as
    /// the cached scheduling group.
    pub fn is_receiving_broadcast<G: HoldsService>(&self, proof: &G) -> Option<bool> {
        let provider = self.provider.as_ref();
        let found = self.svc.update(proof, |svc| {
            let mut group = None;
            let found = lookup(
                &mut svc.facts.receiving_broadcast,
                "receiving_broadcast",
                || {
                    provider.receiving_broadcast().map(|hint| {
                        group = hint;
                        hint.is_some()
                    })
                },
            );
            if let Some(group) = group {
                svc.cached_scheduling_group = group;
            }
            found
        });
        if let (true, Some(value)) = (found.pulled, found.value) {
            self.lifecycle.on_receiving_broadcast_changed(value);
        }
        found.value
    }

    pub fn has_compat_change<G: HoldsService>(&self, proof: &G, change: CompatChange) -> Option<bool> {
        let provider = self.provider.as_ref();
        self.svc.update(proof, |svc| {
            lookup(&mut svc.facts.compat[change.index()], "compat_change", || {
                provider.has_compat_change(change)
            })
            .value
        })
    }

    /// Same as [`has_compat_change`](Self::has_compat_change) for a raw id
    ///
    /// # Panics
    ///
    /// On an id outside `0..CompatChange::COUNT`.
    #[track_caller]
    pub fn has_compat_change_id<G: HoldsService>(&self, proof: &G, id: u32) -> Option<bool> {
        self.has_compat_change(proof, CompatChange::from_raw(id))
    }

    /// Invalidate every cached fact and the aggregation caches
    ///
    /// Leaves the raw/current/applied values alone.
    pub fn reset_cached_facts<G: HoldsService>(&self, proof: &G) {
        self.svc.update(proof, ServiceFields::reset_cached);
    }

    // Pushed activity facts; ignored in pull mode

    pub fn push_has_activities<G: HoldsService>(&self, proof: &G, has_activities: bool) {
        self.svc
            .update(proof, |svc| svc.activity.push_has_activities(has_activities));
    }

    pub fn push_activity_state_flags<G: HoldsService>(&self, proof: &G, flags: ActivityStateFlags) {
        self.svc
            .update(proof, |svc| svc.activity.push_activity_state_flags(flags));
    }

    pub fn push_has_recent_task<G: HoldsService>(&self, proof: &G, has_recent_task: bool) {
        self.svc
            .update(proof, |svc| svc.activity.push_has_recent_task(has_recent_task));
    }

    pub fn push_perceptible_task_stopped_time<G: HoldsService>(&self, proof: &G, time: Timestamp) {
        self.svc.update(proof, |svc| {
            svc.activity.push_perceptible_task_stopped_time(time)
        });
    }

    pub fn activity_state_flags<G: HoldsService>(&self, proof: &G) -> ActivityStateFlags {
        self.svc.with(proof, |svc| svc.activity.activity_state_flags())
    }

    pub fn perceptible_task_stopped_time<G: HoldsService>(&self, proof: &G) -> Timestamp {
        self.svc
            .with(proof, |svc| svc.activity.perceptible_task_stopped_time())
    }

    service_accessors! { svc {
        cached_importance / set_cached_importance => cached_importance: Importance;
        cached_foreground_activities / set_cached_foreground_activities
            => cached_foreground_activities: bool;
        cached_state / set_cached_state => cached_state: ProcState;
        /// Also written by a positive receiving-broadcast pull
        cached_scheduling_group / set_cached_scheduling_group
            => cached_scheduling_group: SchedulingGroup;
    } }

    pub fn cached_adj_type<G: HoldsService>(&self, proof: &G) -> Option<String> {
        self.svc
            .with(proof, |svc| svc.cached_adj_type.as_ref().map(|t| t.to_string()))
    }

    pub fn set_cached_adj_type<G: HoldsService>(&self, proof: &G, adj_type: Option<&str>) {
        self.svc
            .update(proof, |svc| svc.cached_adj_type = adj_type.map(SmartString::from));
    }

    // =========================================================================
    // PROVENANCE
    // =========================================================================

    pub fn adj_type<G: HoldsService>(&self, proof: &G) -> Option<String> {
        self.svc
            .with(proof, |svc| svc.reason.adj_type.as_ref().map(|t| t.to_string()))
    }

    /// Set the primary reason label; traced on the record's track when enabled
    pub fn set_adj_type<G: HoldsService>(&self, proof: &G, adj_type: Option<&str>) {
        self.svc
            .update(proof, |svc| svc.reason.adj_type = adj_type.map(SmartString::from));
        self.trace_adj_type(adj_type);
    }

    pub fn reason<G: HoldsService>(&self, proof: &G) -> ImportanceReason {
        self.svc.with(proof, |svc| svc.reason.clone())
    }

    pub fn set_reason<G: HoldsService>(&self, proof: &G, reason: ImportanceReason) {
        let adj_type = reason.adj_type.clone();
        self.svc.update(proof, |svc| svc.reason = reason);
        self.trace_adj_type(adj_type.as_deref());
    }

    /// ` <target><=<source>` diagnostic, `None` without a link
    pub fn adj_reason<G: HoldsService>(&self, proof: &G) -> Option<String> {
        self.svc.with(proof, |svc| svc.reason.render())
    }

    fn trace_adj_type(&self, adj_type: Option<&str>) {
        if self.trace_importance {
            tracer::trace_importance_track(self.track_name(), adj_type);
        }
    }

    // =========================================================================
    // UI / INTERACTION
    // =========================================================================

    service_accessors! { svc {
        has_shown_ui / set_has_shown_ui => has_shown_ui: bool;
        is_running_remote_animation / set_running_remote_animation => running_remote_animation: bool;
        /// Candidate for freezing when cached
        is_background_restricted / set_background_restricted => background_restricted: bool;
        is_reachable / set_reachable => reachable: bool;
        is_system_no_ui / set_system_no_ui => system_no_ui: bool;
        is_pending_finish_attach / set_pending_finish_attach => pending_finish_attach: bool;
        should_schedule_like_top_app / set_schedule_like_top_app => schedule_like_top_app: bool;
        has_reported_interaction / set_has_reported_interaction => has_reported_interaction: bool;
        last_top_time / set_last_top_time => last_top_time: Timestamp;
        followup_update_uptime / set_followup_update_uptime => followup_update_uptime: Timestamp;
        is_applied_cached / set_applied_cached => applied_cached: bool;
        last_cached_time / set_last_cached_time => last_cached_time: Timestamp;
    } }

    pub fn has_top_ui<G: HoldsService>(&self, proof: &G) -> bool {
        self.svc.with(proof, |svc| svc.has_top_ui)
    }

    pub fn set_has_top_ui<G: HoldsService>(&self, proof: &G, has_top_ui: bool) {
        self.svc.update(proof, |svc| svc.has_top_ui = has_top_ui);
        self.observer.on_has_top_ui_changed(has_top_ui);
    }

    pub fn has_overlay_ui<G: HoldsService>(&self, proof: &G) -> bool {
        self.svc.with(proof, |svc| svc.has_overlay_ui)
    }

    pub fn set_has_overlay_ui<G: HoldsService>(&self, proof: &G, has_overlay_ui: bool) {
        self.svc.update(proof, |svc| svc.has_overlay_ui = has_overlay_ui);
        self.observer.on_has_overlay_ui_changed(has_overlay_ui);
    }

    pub fn interaction_event_time<G: HoldsService>(&self, proof: &G) -> Timestamp {
        self.svc.with(proof, |svc| svc.interaction_event_time)
    }

    pub fn set_interaction_event_time<G: HoldsService>(&self, proof: &G, time: Timestamp) {
        self.svc.update(proof, |svc| svc.interaction_event_time = time);
        self.observer.on_interaction_event_time_changed(time);
    }

    pub fn fg_interaction_time<G: HoldsService>(&self, proof: &G) -> Timestamp {
        self.svc.with(proof, |svc| svc.fg_interaction_time)
    }

    pub fn set_fg_interaction_time<G: HoldsService>(&self, proof: &G, time: Timestamp) {
        self.svc.update(proof, |svc| svc.fg_interaction_time = time);
        self.observer.on_fg_interaction_time_changed(time);
    }

    pub fn when_unimportant<G: HoldsService>(&self, proof: &G) -> Timestamp {
        self.svc.with(proof, |svc| svc.when_unimportant)
    }

    pub fn set_when_unimportant<G: HoldsService>(&self, proof: &G, time: Timestamp) {
        self.svc.update(proof, |svc| svc.when_unimportant = time);
        self.observer.on_when_unimportant_changed(time);
    }

    /// Token of whoever is forcing this process to stay important
    pub fn forcing_to_important<G: HoldsService>(&self, proof: &G) -> Option<String> {
        self.svc
            .with(proof, |svc| svc.forcing_to_important.as_ref().map(|t| t.to_string()))
    }

    pub fn set_forcing_to_important<G: HoldsService>(&self, proof: &G, token: Option<&str>) {
        self.svc
            .update(proof, |svc| svc.forcing_to_important = token.map(SmartString::from));
    }

    pub fn last_invisible_time<G: HoldsService>(&self, proof: &G) -> Timestamp {
        self.svc.with(proof, |svc| svc.last_invisible_time)
    }

    /// Track when the last visible activity went away
    ///
    /// While visible the marker is [`TIME_ONGOING`]; the first invisible
    /// observation after that stamps `now`.
    pub fn update_last_invisible_time<G: HoldsService>(
        &self,
        proof: &G,
        has_visible_activities: bool,
        now: Timestamp,
    ) {
        self.svc.update(proof, |svc| {
            if has_visible_activities {
                svc.last_invisible_time = TIME_ONGOING;
            } else if svc.last_invisible_time == TIME_ONGOING {
                svc.last_invisible_time = now;
            }
        });
    }

    // =========================================================================
    // CACHE RANKER
    // =========================================================================

    /// Times the process left the cached family
    pub fn cache_ranker_use_count<G: HoldsService>(&self, proof: &G) -> u32 {
        self.svc.with(proof, |svc| svc.cache_ranker_use_count)
    }

    /// Last RSS sample (bytes) and when it was taken
    pub fn cache_ranker_rss<G: HoldsService>(&self, proof: &G) -> (u64, Timestamp) {
        self.svc
            .with(proof, |svc| (svc.cache_ranker_rss, svc.cache_ranker_rss_time))
    }

    pub fn set_cache_ranker_rss<G: HoldsService>(&self, proof: &G, rss: u64, time: Timestamp) {
        self.svc.update(proof, |svc| {
            svc.cache_ranker_rss = rss;
            svc.cache_ranker_rss_time = time;
        });
    }

    // =========================================================================
    // RECOMPUTE SEQUENCES
    // =========================================================================

    #[inline]
    pub fn adj_seq(&self) -> i32 {
        self.adj_seq.load(Ordering::Acquire)
    }

    /// Returns the new value
    #[inline]
    pub fn inc_adj_seq(&self) -> i32 {
        self.adj_seq.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Retract one outstanding request; nested retractions compose
    #[inline]
    pub fn dec_adj_seq(&self) -> i32 {
        self.adj_seq.fetch_sub(1, Ordering::AcqRel) - 1
    }

    #[inline]
    pub fn set_adj_seq(&self, seq: i32) {
        self.adj_seq.store(seq, Ordering::Release);
    }

    #[inline]
    pub fn completed_adj_seq(&self) -> i32 {
        self.completed_adj_seq.load(Ordering::Acquire)
    }

    #[inline]
    pub fn inc_completed_adj_seq(&self) -> i32 {
        self.completed_adj_seq.fetch_add(1, Ordering::AcqRel) + 1
    }

    #[inline]
    pub fn dec_completed_adj_seq(&self) -> i32 {
        self.completed_adj_seq.fetch_sub(1, Ordering::AcqRel) - 1
    }

    #[inline]
    pub fn set_completed_adj_seq(&self, seq: i32) {
        self.completed_adj_seq.store(seq, Ordering::Release);
    }

    #[inline]
    pub fn lru_seq(&self) -> i32 {
        self.lru_seq.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set_lru_seq(&self, seq: i32) {
        self.lru_seq.store(seq, Ordering::Release);
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Reset to the baseline of a process that no longer exists
    ///
    /// Idempotent. Every cached fact needs a fresh pull afterwards.
    pub fn on_cleanup(&self, proof: &BothGuard<'_>) {
        if self.trace_importance {
            tracer::end_importance_track(self.track_name());
        }
        self.hot.update(proof, HotFields::reset_for_cleanup);
        self.svc.update(proof, ServiceFields::reset_for_cleanup);
        self.adj_seq.store(0, Ordering::Release);
        self.completed_adj_seq.store(0, Ordering::Release);
        self.lru_seq.store(0, Ordering::Release);
        debug!(process = %self.name, uid = self.uid, pid = self.pid, "process record cleaned up");
    }

    /// Hot fields and sequences from one read
    pub fn snapshot<G: HoldsAny>(&self, proof: &G) -> ProcessSnapshot {
        self.hot.with(proof, |hot| ProcessSnapshot {
            name: self.name.to_string(),
            uid: self.uid,
            pid: self.pid,
            raw_importance: hot.raw_importance,
            current_importance: hot.current_importance,
            applied_importance: hot.applied_importance,
            verified_importance: hot.verified_importance,
            max_importance: hot.max_importance,
            raw_state: hot.raw_state,
            current_state: hot.current_state,
            reported_state: hot.reported_state,
            applied_state: hot.applied_state,
            capability: hot.current_capability,
            scheduling_group: hot.current_group,
            last_state_time: hot.last_state_time,
            has_started_services: hot.has_started_services,
            frozen: hot.frozen,
            adj_seq: self.adj_seq(),
            completed_adj_seq: self.completed_adj_seq(),
            lru_seq: self.lru_seq(),
            adj_type: None,
            adj_reason: None,
        })
    }

    /// Snapshot including provenance, consistent with the importance it explains
    pub fn detailed_snapshot<G: HoldsService>(&self, proof: &G) -> ProcessSnapshot {
        let mut snapshot = self.snapshot(proof);
        self.svc.with(proof, |svc| {
            snapshot.adj_type = svc.reason.adj_type.as_ref().map(|t| t.to_string());
            snapshot.adj_reason = svc.reason.render();
        });
        snapshot
    }
}

impl fmt::Debug for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessState")
            .field("name", &self.name)
            .field("uid", &self.uid)
            .field("pid", &self.pid)
            .field("adj_seq", &self.adj_seq())
            .field("completed_adj_seq", &self.completed_adj_seq())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/u{}", self.pid, self.name, self.uid)
    }
}
