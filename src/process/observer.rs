/*!
 * Process Record Observers
 *
 * Narrow push interfaces notified synchronously when specific record fields
 * are written. Each callback receives only the new value and runs after the
 * write is visible, outside the record's inner field locks. The caller still
 * holds the service or process-group lock, so a callback must not take
 * either of them.
 */

use crate::core::types::{Capability, Importance, ProcState, SchedulingGroup, Timestamp};

/// Field-change observer (window manager, visibility code, ...)
pub trait ChangeObserver: Send + Sync {
    fn on_raw_importance_changed(&self, raw: Importance);

    fn on_current_importance_changed(&self, current: Importance);

    fn on_scheduling_group_changed(&self, group: SchedulingGroup);

    fn on_current_state_changed(&self, state: ProcState);

    fn on_current_capability_changed(&self, capability: Capability);

    fn on_reported_state_changed(&self, state: ProcState);

    fn on_has_top_ui_changed(&self, has_top_ui: bool);

    fn on_has_overlay_ui_changed(&self, has_overlay_ui: bool);

    fn on_interaction_event_time_changed(&self, time: Timestamp);

    fn on_fg_interaction_time_changed(&self, time: Timestamp);

    fn on_when_unimportant_changed(&self, time: Timestamp);
}

/// Component-lifecycle observer (services, receivers, activities)
pub trait LifecycleObserver: Send + Sync {
    fn on_has_started_services_changed(&self, has_started_services: bool);

    fn on_receiving_broadcast_changed(&self, receiving: bool);

    fn on_has_activities_changed(&self, has_activities: bool);

    fn on_has_visible_activities_changed(&self, has_visible_activities: bool);
}

/// Observer that ignores every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ChangeObserver for NoopObserver {
    fn on_raw_importance_changed(&self, _raw: Importance) {}
    fn on_current_importance_changed(&self, _current: Importance) {}
    fn on_scheduling_group_changed(&self, _group: SchedulingGroup) {}
    fn on_current_state_changed(&self, _state: ProcState) {}
    fn on_current_capability_changed(&self, _capability: Capability) {}
    fn on_reported_state_changed(&self, _state: ProcState) {}
    fn on_has_top_ui_changed(&self, _has_top_ui: bool) {}
    fn on_has_overlay_ui_changed(&self, _has_overlay_ui: bool) {}
    fn on_interaction_event_time_changed(&self, _time: Timestamp) {}
    fn on_fg_interaction_time_changed(&self, _time: Timestamp) {}
    fn on_when_unimportant_changed(&self, _time: Timestamp) {}
}

impl LifecycleObserver for NoopObserver {
    fn on_has_started_services_changed(&self, _has_started_services: bool) {}
    fn on_receiving_broadcast_changed(&self, _receiving: bool) {}
    fn on_has_activities_changed(&self, _has_activities: bool) {}
    fn on_has_visible_activities_changed(&self, _has_visible_activities: bool) {}
}
