/*!
 * Cached Process Facts
 *
 * Slow-changing yes/no facts a record learns from its [`InfoProvider`].
 * Every fact is three-valued: unset (`None`), false or true. A slot is filled
 * at most once per invalidation epoch; invalidation clears it back to `None`.
 *
 * # Design: Two Activity-Fact Sources Behind One Interface
 *
 * Activity-related facts (has activities, has visible activities, has recent
 * tasks) either get pulled lazily from the provider or are pushed by the
 * driver and already resident. The record picks one implementation at
 * construction time and dispatches through [`ActivityFactSource`]; call sites
 * never branch on the mode.
 */

use super::provider::{CompatChange, InfoProvider};
use crate::core::config::FactMode;
use crate::core::errors::ProviderResult;
use crate::core::limits::TIME_NEVER;
use crate::core::types::Timestamp;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

bitflags! {
    /// Activity state pushed by the activity manager
    ///
    /// The low 16 bits carry the minimum task layer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ActivityStateFlags: u32 {
        const MASK_MIN_TASK_LAYER = 0x0000_ffff;
        const IS_VISIBLE = 1 << 16;
        const IS_PAUSING_OR_PAUSED = 1 << 17;
        const IS_STOPPING = 1 << 18;
        const IS_STOPPING_FINISHING = 1 << 19;
        const IS_WINDOW_VISIBLE = 1 << 20;
    }
}

impl Default for ActivityStateFlags {
    fn default() -> Self {
        Self::MASK_MIN_TASK_LAYER
    }
}

impl ActivityStateFlags {
    #[inline]
    pub fn min_task_layer(self) -> u32 {
        (self & Self::MASK_MIN_TASK_LAYER).bits()
    }
}

/// Result of a cached lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookup {
    /// `None` when the provider could not answer
    pub value: Option<bool>,
    /// True when this call filled the slot
    pub pulled: bool,
}

impl Lookup {
    #[inline]
    const fn resident(value: bool) -> Self {
        Self {
            value: Some(value),
            pulled: false,
        }
    }
}

/// Fill `slot` from `pull` if unset
///
/// A failed pull leaves the slot unset so the next call retries.
pub(crate) fn lookup(
    slot: &mut Option<bool>,
    fact: &'static str,
    pull: impl FnOnce() -> ProviderResult<bool>,
) -> Lookup {
    if let Some(value) = *slot {
        return Lookup::resident(value);
    }
    match pull() {
        Ok(value) => {
            *slot = Some(value);
            trace!(fact, value, "fact pulled");
            Lookup {
                value: Some(value),
                pulled: true,
            }
        }
        Err(e) => {
            warn!(fact, error = %e, "fact pull failed, leaving unset");
            Lookup {
                value: None,
                pulled: false,
            }
        }
    }
}

/// Facts that are always pulled and cached
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct FactCache {
    pub is_heavy_weight: Option<bool>,
    pub is_home: Option<bool>,
    pub is_previous: Option<bool>,
    pub receiving_broadcast: Option<bool>,
    pub compat: [Option<bool>; CompatChange::COUNT],
}

impl FactCache {
    /// Forget every pulled fact
    pub fn invalidate(&mut self) {
        self.is_heavy_weight = None;
        self.is_home = None;
        self.is_previous = None;
        self.receiving_broadcast = None;
        self.invalidate_compat();
    }

    pub fn invalidate_compat(&mut self) {
        self.compat = [None; CompatChange::COUNT];
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Read interface shared by both activity-fact sources
pub trait ActivityFacts: Send {
    fn mode(&self) -> FactMode;

    fn has_activities(&mut self, provider: &dyn InfoProvider) -> Lookup;

    fn has_visible_activities(&mut self, provider: &dyn InfoProvider) -> Lookup;

    fn has_recent_tasks(&mut self, provider: &dyn InfoProvider) -> Lookup;

    /// Drop per-epoch caches (no-op for resident values)
    fn invalidate(&mut self);

    /// Back to the baseline of a freshly admitted process
    fn clear(&mut self);

    /// Override the cached visible-activities answer
    fn set_has_visible_activities(&mut self, visible: bool);

    fn push_has_activities(&mut self, has_activities: bool);

    fn push_activity_state_flags(&mut self, flags: ActivityStateFlags);

    fn push_has_recent_task(&mut self, has_recent_task: bool);

    fn push_perceptible_task_stopped_time(&mut self, time: Timestamp);

    fn activity_state_flags(&self) -> ActivityStateFlags;

    fn perceptible_task_stopped_time(&self) -> Timestamp;
}

/// Pull mode: ask the provider once per epoch
#[derive(Debug, Clone, Default)]
pub struct PulledActivityFacts {
    has_activities: Option<bool>,
    has_visible_activities: Option<bool>,
    has_recent_tasks: Option<bool>,
}

impl ActivityFacts for PulledActivityFacts {
    fn mode(&self) -> FactMode {
        FactMode::Pull
    }

    fn has_activities(&mut self, provider: &dyn InfoProvider) -> Lookup {
        lookup(&mut self.has_activities, "has_activities", || {
            provider.has_activities()
        })
    }

    fn has_visible_activities(&mut self, provider: &dyn InfoProvider) -> Lookup {
        lookup(
            &mut self.has_visible_activities,
            "has_visible_activities",
            || provider.has_visible_activities(),
        )
    }

    fn has_recent_tasks(&mut self, provider: &dyn InfoProvider) -> Lookup {
        lookup(&mut self.has_recent_tasks, "has_recent_tasks", || {
            provider.has_recent_tasks()
        })
    }

    fn invalidate(&mut self) {
        *self = Self::default();
    }

    fn clear(&mut self) {
        *self = Self::default();
    }

    fn set_has_visible_activities(&mut self, visible: bool) {
        self.has_visible_activities = Some(visible);
    }

    // Pushed values have no home in pull mode.
    fn push_has_activities(&mut self, _has_activities: bool) {
        trace!("push ignored in pull mode");
    }

    fn push_activity_state_flags(&mut self, _flags: ActivityStateFlags) {
        trace!("push ignored in pull mode");
    }

    fn push_has_recent_task(&mut self, _has_recent_task: bool) {
        trace!("push ignored in pull mode");
    }

    fn push_perceptible_task_stopped_time(&mut self, _time: Timestamp) {
        trace!("push ignored in pull mode");
    }

    fn activity_state_flags(&self) -> ActivityStateFlags {
        ActivityStateFlags::default()
    }

    fn perceptible_task_stopped_time(&self) -> Timestamp {
        TIME_NEVER
    }
}

/// Push mode: values are resident, the provider is never consulted
#[derive(Debug, Clone)]
pub struct PushedActivityFacts {
    has_activities: bool,
    state_flags: ActivityStateFlags,
    // Per-epoch visible-activities override, cleared by invalidate
    visible_override: Option<bool>,
    has_recent_task: bool,
    perceptible_task_stopped_time: Timestamp,
}

impl Default for PushedActivityFacts {
    fn default() -> Self {
        Self {
            has_activities: false,
            state_flags: ActivityStateFlags::default(),
            visible_override: None,
            has_recent_task: false,
            perceptible_task_stopped_time: TIME_NEVER,
        }
    }
}

impl ActivityFacts for PushedActivityFacts {
    fn mode(&self) -> FactMode {
        FactMode::Push
    }

    fn has_activities(&mut self, _provider: &dyn InfoProvider) -> Lookup {
        Lookup::resident(self.has_activities)
    }

    fn has_visible_activities(&mut self, _provider: &dyn InfoProvider) -> Lookup {
        Lookup::resident(
            self.visible_override
                .unwrap_or_else(|| self.state_flags.contains(ActivityStateFlags::IS_VISIBLE)),
        )
    }

    fn has_recent_tasks(&mut self, _provider: &dyn InfoProvider) -> Lookup {
        Lookup::resident(self.has_recent_task)
    }

    fn invalidate(&mut self) {
        self.visible_override = None;
    }

    fn clear(&mut self) {
        *self = Self::default();
    }

    fn set_has_visible_activities(&mut self, visible: bool) {
        self.visible_override = Some(visible);
    }

    fn push_has_activities(&mut self, has_activities: bool) {
        self.has_activities = has_activities;
    }

    fn push_activity_state_flags(&mut self, flags: ActivityStateFlags) {
        self.state_flags = flags;
    }

    fn push_has_recent_task(&mut self, has_recent_task: bool) {
        self.has_recent_task = has_recent_task;
    }

    fn push_perceptible_task_stopped_time(&mut self, time: Timestamp) {
        self.perceptible_task_stopped_time = time;
    }

    fn activity_state_flags(&self) -> ActivityStateFlags {
        self.state_flags
    }

    fn perceptible_task_stopped_time(&self) -> Timestamp {
        self.perceptible_task_stopped_time
    }
}

/// Activity-fact implementation chosen at construction (enum dispatch)
#[derive(Debug, Clone)]
pub enum ActivityFactSource {
    Pulled(PulledActivityFacts),
    Pushed(PushedActivityFacts),
}

impl ActivityFactSource {
    pub fn new(mode: FactMode) -> Self {
        match mode {
            FactMode::Pull => Self::Pulled(PulledActivityFacts::default()),
            FactMode::Push => Self::Pushed(PushedActivityFacts::default()),
        }
    }

    #[inline(always)]
    fn inner(&self) -> &dyn ActivityFacts {
        match self {
            Self::Pulled(facts) => facts,
            Self::Pushed(facts) => facts,
        }
    }

    #[inline(always)]
    fn inner_mut(&mut self) -> &mut dyn ActivityFacts {
        match self {
            Self::Pulled(facts) => facts,
            Self::Pushed(facts) => facts,
        }
    }
}

impl ActivityFacts for ActivityFactSource {
    fn mode(&self) -> FactMode {
        self.inner().mode()
    }

    fn has_activities(&mut self, provider: &dyn InfoProvider) -> Lookup {
        self.inner_mut().has_activities(provider)
    }

    fn has_visible_activities(&mut self, provider: &dyn InfoProvider) -> Lookup {
        self.inner_mut().has_visible_activities(provider)
    }

    fn has_recent_tasks(&mut self, provider: &dyn InfoProvider) -> Lookup {
        self.inner_mut().has_recent_tasks(provider)
    }

    fn invalidate(&mut self) {
        self.inner_mut().invalidate();
    }

    fn clear(&mut self) {
        self.inner_mut().clear();
    }

    fn set_has_visible_activities(&mut self, visible: bool) {
        self.inner_mut().set_has_visible_activities(visible);
    }

    fn push_has_activities(&mut self, has_activities: bool) {
        self.inner_mut().push_has_activities(has_activities);
    }

    fn push_activity_state_flags(&mut self, flags: ActivityStateFlags) {
        self.inner_mut().push_activity_state_flags(flags);
    }

    fn push_has_recent_task(&mut self, has_recent_task: bool) {
        self.inner_mut().push_has_recent_task(has_recent_task);
    }

    fn push_perceptible_task_stopped_time(&mut self, time: Timestamp) {
        self.inner_mut().push_perceptible_task_stopped_time(time);
    }

    fn activity_state_flags(&self) -> ActivityStateFlags {
        self.inner().activity_state_flags()
    }

    fn perceptible_task_stopped_time(&self) -> Timestamp {
        self.inner().perceptible_task_stopped_time()
    }
}
