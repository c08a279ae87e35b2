/*!
 * Uid Module
 * Per-principal aggregation, network convergence and change batching
 */

pub mod aggregate;
pub mod changes;
pub mod network;
pub mod registry;


// Re-export for convenience
pub use aggregate::{UidAggregate, UidSummary};
pub use changes::{ChangeFlags, PendingChanges};
pub use network::{NetworkTransition, ProcStateSeqCounter};
pub use registry::UidRegistry;
