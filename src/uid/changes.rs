/*!
 * Pending Uid Changes
 *
 * Change bits accumulated between two dispatcher flushes. The aggregate only
 * ever ORs bits in; the dispatcher drains them.
 */

use bitflags::bitflags;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;

bitflags! {
    /// Kinds of uid change delivered to the dispatcher
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ChangeFlags: u32 {
        const GONE = 1 << 0;
        const IDLE = 1 << 1;
        const ACTIVE = 1 << 2;
        const CACHED = 1 << 3;
        const UNCACHED = 1 << 4;
        const CAPABILITY = 1 << 5;
        const IMPORTANCE = 1 << 6;
        const STATE = 1 << 31;
    }
}

impl ChangeFlags {
    const NAMES: [(Self, &'static str); 8] = [
        (Self::GONE, "gone"),
        (Self::IDLE, "idle"),
        (Self::ACTIVE, "active"),
        (Self::CACHED, "cached"),
        (Self::UNCACHED, "uncached"),
        (Self::CAPABILITY, "capability"),
        (Self::STATE, "procstate"),
        (Self::IMPORTANCE, "procadj"),
    ];
}

impl fmt::Display for ChangeFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let mut first = true;
        for (flag, name) in Self::NAMES {
            if self.contains(flag) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct ChangeState {
    pending: ChangeFlags,
    last_reported: ChangeFlags,
}

/// Accumulated change bits plus the last drained value
#[derive(Debug, Default)]
pub struct PendingChanges {
    state: Mutex<ChangeState>,
}

impl PendingChanges {
    pub fn new() -> Self {
        Self::default()
    }

    /// OR `flags` into the pending set
    #[inline]
    pub fn mark(&self, flags: ChangeFlags) {
        self.state.lock().pending |= flags;
    }

    #[inline]
    pub fn pending(&self) -> ChangeFlags {
        self.state.lock().pending
    }

    /// Take the pending set, clear it, and remember it as last reported
    pub fn drain_and_reset(&self) -> ChangeFlags {
        let mut state = self.state.lock();
        let drained = std::mem::take(&mut state.pending);
        state.last_reported = drained;
        drained
    }

    #[inline]
    pub fn last_reported(&self) -> ChangeFlags {
        self.state.lock().last_reported
    }

    /// Overwrite the last-reported value (dispatcher-side diffing)
    #[inline]
    pub fn set_last_reported(&self, flags: ChangeFlags) {
        self.state.lock().last_reported = flags;
    }
}
