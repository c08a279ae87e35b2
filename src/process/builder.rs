/*!
 * Process State Builder
 * Builder pattern for ProcessState construction
 */

use super::observer::{ChangeObserver, LifecycleObserver, NoopObserver};
use super::provider::{InfoProvider, NullProvider};
use super::state::ProcessState;
use crate::core::config::{CoreConfig, FactMode};
use crate::core::sync::ServiceLocks;
use crate::core::types::{Pid, Uid};
use smartstring::alias::String as SmartString;
use std::sync::Arc;
use tracing::debug;

/// Builder for ProcessState
pub struct ProcessStateBuilder {
    name: SmartString,
    uid: Uid,
    pid: Pid,
    locks: Option<Arc<ServiceLocks>>,
    provider: Option<Arc<dyn InfoProvider>>,
    observer: Option<Arc<dyn ChangeObserver>>,
    lifecycle: Option<Arc<dyn LifecycleObserver>>,
    config: CoreConfig,
}

impl ProcessStateBuilder {
    /// Start a record for process `name` owned by `uid`
    pub fn new(name: &str, uid: Uid) -> Self {
        Self {
            name: SmartString::from(name),
            uid,
            pid: 0,
            locks: None,
            provider: None,
            observer: None,
            lifecycle: None,
            config: CoreConfig::default(),
        }
    }

    pub fn with_pid(mut self, pid: Pid) -> Self {
        self.pid = pid;
        self
    }

    /// Share the service's lock pair (a fresh pair otherwise)
    pub fn with_locks(mut self, locks: Arc<ServiceLocks>) -> Self {
        self.locks = Some(locks);
        self
    }

    /// Source of pulled facts ([`NullProvider`] otherwise)
    pub fn with_provider(mut self, provider: Arc<dyn InfoProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ChangeObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn with_lifecycle_observer(mut self, lifecycle: Arc<dyn LifecycleObserver>) -> Self {
        self.lifecycle = Some(lifecycle);
        self
    }

    /// Take fact mode and tracing from `config`
    pub fn with_config(mut self, config: &CoreConfig) -> Self {
        self.config = config.clone();
        self
    }

    pub fn with_fact_mode(mut self, mode: FactMode) -> Self {
        self.config.fact_mode = mode;
        self
    }

    /// Build the record
    pub fn build(self) -> ProcessState {
        let locks = self.locks.unwrap_or_else(ServiceLocks::new);
        let provider = self
            .provider
            .unwrap_or_else(|| Arc::new(NullProvider) as Arc<dyn InfoProvider>);
        let observer = self
            .observer
            .unwrap_or_else(|| Arc::new(NoopObserver) as Arc<dyn ChangeObserver>);
        let lifecycle = self
            .lifecycle
            .unwrap_or_else(|| Arc::new(NoopObserver) as Arc<dyn LifecycleObserver>);

        debug!(
            process = %self.name,
            uid = self.uid,
            pid = self.pid,
            fact_mode = ?self.config.fact_mode,
            "process record created"
        );

        ProcessState::from_parts(
            self.name,
            self.uid,
            self.pid,
            locks,
            provider,
            observer,
            lifecycle,
            self.config.fact_mode,
            self.config.trace_importance,
        )
    }
}
