/*!
 * Process Module
 * Per-process importance records, their fact provider and observers
 */

pub mod builder;
pub mod facts;
pub mod observer;
pub mod provider;
pub mod reason;
pub mod snapshot;
pub mod state;


// Re-export for convenience
pub use builder::ProcessStateBuilder;
pub use facts::{ActivityFactSource, ActivityFacts, ActivityStateFlags, Lookup};
pub use observer::{ChangeObserver, LifecycleObserver, NoopObserver};
pub use provider::{CompatChange, InfoProvider, NullProvider};
pub use reason::ImportanceReason;
pub use snapshot::ProcessSnapshot;
pub use state::ProcessState;

#[cfg(test)]
pub use provider::MockInfoProvider;
