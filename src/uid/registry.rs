/*!
 * Uid Registry
 *
 * Concurrent map from uid to its aggregate. Owns the service lock pair and
 * the shared sequence counter so every aggregate it hands out agrees on
 * both.
 */

use super::aggregate::UidAggregate;
use super::network::ProcStateSeqCounter;
use crate::core::config::CoreConfig;
use crate::core::sync::{BothGuard, ServiceLocks};
use crate::core::types::Uid;
use crate::process::{ProcessState, ProcessStateBuilder};
use ahash::RandomState;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// All live uid aggregates of one service
pub struct UidRegistry {
    aggregates: DashMap<Uid, Arc<UidAggregate>, RandomState>,
    locks: Arc<ServiceLocks>,
    seq_counter: Arc<ProcStateSeqCounter>,
    config: CoreConfig,
}

impl UidRegistry {
    pub fn new(config: CoreConfig) -> Self {
        info!(
            fact_mode = ?config.fact_mode,
            network_wait_timeout_ms = config.network_wait_timeout_ms,
            "uid registry created"
        );
        Self {
            aggregates: DashMap::with_hasher(RandomState::new()),
            locks: ServiceLocks::new(),
            seq_counter: ProcStateSeqCounter::shared(),
            config,
        }
    }

    /// Lock pair shared by every record and aggregate of this registry
    #[inline(always)]
    pub fn locks(&self) -> &Arc<ServiceLocks> {
        &self.locks
    }

    #[inline(always)]
    pub fn seq_counter(&self) -> &Arc<ProcStateSeqCounter> {
        &self.seq_counter
    }

    #[inline(always)]
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Builder for a record that shares this registry's locks and config
    pub fn process_builder(&self, name: &str, uid: Uid) -> ProcessStateBuilder {
        ProcessStateBuilder::new(name, uid)
            .with_locks(Arc::clone(&self.locks))
            .with_config(&self.config)
    }

    /// Aggregate for `uid`, created on first use
    pub fn get_or_create(&self, uid: Uid) -> Arc<UidAggregate> {
        self.aggregates
            .entry(uid)
            .or_insert_with(|| {
                debug!(uid, "uid aggregate created");
                Arc::new(UidAggregate::new(
                    uid,
                    &self.locks,
                    Arc::clone(&self.seq_counter),
                    self.config.network_wait_timeout(),
                ))
            })
            .clone()
    }

    pub fn get(&self, uid: Uid) -> Option<Arc<UidAggregate>> {
        self.aggregates.get(&uid).map(|entry| Arc::clone(entry.value()))
    }

    /// Admit `process` into its uid's aggregate, creating the aggregate if needed
    pub fn admit(&self, proof: &BothGuard<'_>, process: Arc<ProcessState>) -> Arc<UidAggregate> {
        let aggregate = self.get_or_create(process.uid());
        aggregate.add_member(proof, process);
        aggregate
    }

    /// Drop `uid`'s aggregate if it has no members left
    ///
    /// Returns true when an entry was removed.
    pub fn remove_if_empty(&self, proof: &BothGuard<'_>, uid: Uid) -> bool {
        let removed = self
            .aggregates
            .remove_if(&uid, |_, aggregate| aggregate.is_empty(proof))
            .is_some();
        if removed {
            debug!(uid, "uid aggregate removed");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.aggregates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aggregates.is_empty()
    }

    /// Snapshot of every aggregate
    pub fn aggregates(&self) -> Vec<Arc<UidAggregate>> {
        self.aggregates
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }
}

impl Default for UidRegistry {
    fn default() -> Self {
        Self::new(CoreConfig::default())
    }
}
