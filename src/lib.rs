/*!
 * Process State Core
 * Per-process importance records and per-uid aggregation for a process
 * lifecycle service
 */

pub mod core;
pub mod monitoring;
pub mod process;
pub mod uid;

// Re-exports
pub use crate::core::{
    Capability, CoreConfig, CpuTimeReasons, FactMode, ImplicitCpuTimeReasons, Importance,
    ProcState, ProviderError, ProviderResult, SchedulingGroup,
};
pub use crate::core::sync::{BothGuard, HoldsAny, HoldsService, ServiceLocks};
pub use monitoring::init_tracing;
pub use process::{
    ChangeObserver, CompatChange, InfoProvider, LifecycleObserver, ProcessSnapshot, ProcessState,
    ProcessStateBuilder,
};
pub use uid::{ChangeFlags, UidAggregate, UidRegistry, UidSummary};
