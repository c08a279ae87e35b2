/*!
 * Core Types
 * Ordered scalars shared by process records and uid aggregates
 */

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Owning principal id
pub type Uid = u32;

/// Host process id
pub type Pid = u32;

/// Milliseconds on whichever clock the caller uses (uptime or elapsed realtime)
pub type Timestamp = i64;

/// Importance score of a process
///
/// Lower is more important. The record never validates the range; the
/// driver is the policy authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Importance(pub i32);

impl Importance {
    /// Placeholder written on cleanup and before the first computation
    pub const INVALID: Self = Self(-10000);
    pub const NATIVE: Self = Self(-1000);
    pub const SYSTEM: Self = Self(-900);
    pub const PERSISTENT_PROC: Self = Self(-800);
    pub const PERSISTENT_SERVICE: Self = Self(-700);
    pub const FOREGROUND: Self = Self(0);
    pub const PERCEPTIBLE_RECENT_FOREGROUND: Self = Self(50);
    pub const VISIBLE: Self = Self(100);
    pub const PERCEPTIBLE: Self = Self(200);
    pub const PERCEPTIBLE_LOW: Self = Self(250);
    pub const BACKUP: Self = Self(300);
    pub const HEAVY_WEIGHT: Self = Self(400);
    pub const SERVICE: Self = Self(500);
    pub const HOME: Self = Self(600);
    pub const PREVIOUS: Self = Self(700);
    pub const SERVICE_B: Self = Self(800);
    pub const CACHED_MIN: Self = Self(900);
    pub const CACHED_MAX: Self = Self(999);
    /// Reported by aggregates with no members
    pub const UNKNOWN: Self = Self(1001);

    #[inline(always)]
    #[must_use]
    pub const fn value(self) -> i32 {
        self.0
    }

    /// Whether this score falls in the cached band
    #[inline(always)]
    #[must_use]
    pub const fn is_cached(self) -> bool {
        self.0 >= Self::CACHED_MIN.0
    }

    /// Strictly more important than `other`
    #[inline(always)]
    #[must_use]
    pub const fn is_more_important_than(self, other: Self) -> bool {
        self.0 < other.0
    }
}

impl Default for Importance {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for Importance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a process
///
/// Same ordering discipline as [`Importance`]: persistent states sort first,
/// `NONEXISTENT` last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcState(pub i32);

impl ProcState {
    pub const UNKNOWN: Self = Self(-1);
    pub const PERSISTENT: Self = Self(0);
    pub const PERSISTENT_UI: Self = Self(1);
    pub const TOP: Self = Self(2);
    pub const BOUND_TOP: Self = Self(3);
    pub const FOREGROUND_SERVICE: Self = Self(4);
    pub const BOUND_FOREGROUND_SERVICE: Self = Self(5);
    pub const IMPORTANT_FOREGROUND: Self = Self(6);
    pub const IMPORTANT_BACKGROUND: Self = Self(7);
    pub const TRANSIENT_BACKGROUND: Self = Self(8);
    pub const BACKUP: Self = Self(9);
    pub const SERVICE: Self = Self(10);
    pub const RECEIVER: Self = Self(11);
    pub const TOP_SLEEPING: Self = Self(12);
    pub const HEAVY_WEIGHT: Self = Self(13);
    pub const HOME: Self = Self(14);
    pub const LAST_ACTIVITY: Self = Self(15);
    pub const CACHED_ACTIVITY: Self = Self(16);
    pub const CACHED_ACTIVITY_CLIENT: Self = Self(17);
    pub const CACHED_RECENT: Self = Self(18);
    pub const CACHED_EMPTY: Self = Self(19);
    pub const NONEXISTENT: Self = Self(20);

    #[inline(always)]
    #[must_use]
    pub const fn value(self) -> i32 {
        self.0
    }

    /// Member of the cached family (eligible for aggressive reclamation)
    #[inline(always)]
    #[must_use]
    pub const fn is_cached(self) -> bool {
        self.0 >= Self::CACHED_ACTIVITY.0 && self.0 <= Self::CACHED_EMPTY.0
    }

    /// On the background side of the network-policy boundary
    #[inline(always)]
    #[must_use]
    pub const fn is_background(self) -> bool {
        self.0 >= Self::TRANSIENT_BACKGROUND.0
    }

    /// Strictly more important than `other`
    #[inline(always)]
    #[must_use]
    pub const fn is_more_important_than(self, other: Self) -> bool {
        self.0 < other.0
    }

    /// Short label used in debug strings
    pub fn label(self) -> &'static str {
        match self.0 {
            -1 => "UNKNOWN",
            0 => "PER ",
            1 => "PERU",
            2 => "TOP ",
            3 => "BTOP",
            4 => "FGS ",
            5 => "BFGS",
            6 => "IMPF",
            7 => "IMPB",
            8 => "TRNB",
            9 => "BKUP",
            10 => "SVC ",
            11 => "RCVR",
            12 => "TPSL",
            13 => "HVY ",
            14 => "HOME",
            15 => "LAST",
            16 => "CAC ",
            17 => "CACC",
            18 => "CRE ",
            19 => "CEM ",
            20 => "NONE",
            _ => "??",
        }
    }
}

impl Default for ProcState {
    fn default() -> Self {
        Self::NONEXISTENT
    }
}

impl fmt::Display for ProcState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label().trim_end())
    }
}

/// Scheduling class of a process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingGroup {
    #[default]
    Background,
    Restricted,
    Default,
    TopApp,
    TopAppBound,
    ForegroundWindow,
}

impl SchedulingGroup {
    /// Whether this is one of the top-app classes
    #[inline(always)]
    #[must_use]
    pub const fn is_top_app(self) -> bool {
        matches!(self, Self::TopApp | Self::TopAppBound)
    }
}

bitflags! {
    /// Process capability bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Capability: u32 {
        const FOREGROUND_LOCATION = 1 << 0;
        const FOREGROUND_CAMERA = 1 << 1;
        const FOREGROUND_MICROPHONE = 1 << 2;
        const POWER_RESTRICTED_NETWORK = 1 << 3;
        const BFSL = 1 << 4;
        const USER_RESTRICTED_NETWORK = 1 << 5;
        const FOREGROUND_AUDIO_CONTROL = 1 << 6;
        const CPU_TIME = 1 << 7;
    }
}

bitflags! {
    /// Explicit reasons a process is granted CPU time
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct CpuTimeReasons: u32 {
        const OTHER = 1 << 0;
        const TRANSMITTED_CAPABILITY = 1 << 1;
    }
}

bitflags! {
    /// Reasons a process implicitly keeps CPU time
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ImplicitCpuTimeReasons: u32 {
        const OTHER = 1 << 0;
        const TRANSMITTED_CAPABILITY = 1 << 1;
    }
}
