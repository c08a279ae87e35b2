/*!
 * Synchronization Primitives
 *
 * - Composite two-tier locking for process records and uid aggregates
 * - Sequence acknowledgement wait for network-policy convergence
 * - Accessor generators for guarded field groups
 */

mod accessors;
mod composite;
mod seq_wait;

pub use composite::{
    BothGuard, CompositeCell, HoldsAny, HoldsService, ProcGuard, ServiceCell, ServiceGuard,
    ServiceLocks,
};
pub use seq_wait::{SeqWait, WaitError, WaitResult};

pub(crate) use accessors::{composite_accessors, service_accessors};
