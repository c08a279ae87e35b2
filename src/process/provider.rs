/*!
 * Info Provider
 *
 * Pull-based accessor for slow-changing facts about a process that live in
 * the wider process model (activities, tasks, broadcasts, compat changes).
 * It is the dependency-inversion boundary between the scoring core and the
 * rest of the system: records only ever ask, never reach in.
 *
 * Implementations must be side-effect-free and must not call back into the
 * core, since they are invoked with the record locks held.
 */

use crate::core::errors::{ProviderError, ProviderResult};
use crate::core::types::SchedulingGroup;
use serde::{Deserialize, Serialize};

/// Compatibility changes whose per-process answer is cached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompatChange {
    ProcessCapability = 0,
    CameraMicrophoneCapability = 1,
    UseShortFgsUsageInteractionTime = 2,
}

impl CompatChange {
    pub const COUNT: usize = 3;

    pub const ALL: [Self; Self::COUNT] = [
        Self::ProcessCapability,
        Self::CameraMicrophoneCapability,
        Self::UseShortFgsUsageInteractionTime,
    ];

    /// Slot in the per-record cache array
    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Convert a raw id handed over by a caller
    ///
    /// # Panics
    ///
    /// On an out-of-range id; a bad id is a caller bug.
    #[track_caller]
    pub fn from_raw(id: u32) -> Self {
        match Self::try_from(id) {
            Ok(change) => change,
            Err(_) => panic!(
                "compat change id {id} out of range (0..{})",
                Self::COUNT
            ),
        }
    }
}

impl TryFrom<u32> for CompatChange {
    type Error = ProviderError;

    fn try_from(id: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .get(id as usize)
            .copied()
            .ok_or(ProviderError::UnknownCompatChange(id))
    }
}

/// Source of slow-changing per-process facts
#[cfg_attr(test, mockall::automock)]
pub trait InfoProvider: Send + Sync {
    /// Process hosts any activities
    fn has_activities(&self) -> ProviderResult<bool>;

    /// Process is the heavy-weight process
    fn is_heavy_weight(&self) -> ProviderResult<bool>;

    /// Process hosts a visible activity
    fn has_visible_activities(&self) -> ProviderResult<bool>;

    /// Process is the current home process
    fn is_home_process(&self) -> ProviderResult<bool>;

    /// Process was the previous top process
    fn is_previous_process(&self) -> ProviderResult<bool>;

    /// Process is associated with recent tasks
    fn has_recent_tasks(&self) -> ProviderResult<bool>;

    /// Scheduling group of the broadcast being delivered, `None` when idle
    fn receiving_broadcast(&self) -> ProviderResult<Option<SchedulingGroup>>;

    /// Whether `change` is enabled for the process
    fn has_compat_change(&self, change: CompatChange) -> ProviderResult<bool>;
}

/// Provider that answers `false` to everything
///
/// For records whose facts are always pushed, and for tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProvider;

impl InfoProvider for NullProvider {
    fn has_activities(&self) -> ProviderResult<bool> {
        Ok(false)
    }

    fn is_heavy_weight(&self) -> ProviderResult<bool> {
        Ok(false)
    }

    fn has_visible_activities(&self) -> ProviderResult<bool> {
        Ok(false)
    }

    fn is_home_process(&self) -> ProviderResult<bool> {
        Ok(false)
    }

    fn is_previous_process(&self) -> ProviderResult<bool> {
        Ok(false)
    }

    fn has_recent_tasks(&self) -> ProviderResult<bool> {
        Ok(false)
    }

    fn receiving_broadcast(&self) -> ProviderResult<Option<SchedulingGroup>> {
        Ok(None)
    }

    fn has_compat_change(&self, _change: CompatChange) -> ProviderResult<bool> {
        Ok(false)
    }
}
