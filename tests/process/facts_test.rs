/*!
 * Cached Fact Tests
 * Pull-once-per-epoch, provider failure and push mode against a mocked provider
 */

use mockall::mock;
use procstate_core::process::ActivityStateFlags;
use procstate_core::{
    CompatChange, CoreConfig, InfoProvider, ProcessState, ProcessStateBuilder, ProviderError,
    ProviderResult, SchedulingGroup, ServiceLocks,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

mock! {
    pub Provider {}

    impl InfoProvider for Provider {
        fn has_activities(&self) -> ProviderResult<bool>;
        fn is_heavy_weight(&self) -> ProviderResult<bool>;
        fn has_visible_activities(&self) -> ProviderResult<bool>;
        fn is_home_process(&self) -> ProviderResult<bool>;
        fn is_previous_process(&self) -> ProviderResult<bool>;
        fn has_recent_tasks(&self) -> ProviderResult<bool>;
        fn receiving_broadcast(&self) -> ProviderResult<Option<SchedulingGroup>>;
        fn has_compat_change(&self, change: CompatChange) -> ProviderResult<bool>;
    }
}

fn record(locks: &Arc<ServiceLocks>, provider: MockProvider, config: &CoreConfig) -> ProcessState {
    ProcessStateBuilder::new("com.example.maps", 10_077)
        .with_locks(Arc::clone(locks))
        .with_provider(Arc::new(provider))
        .with_config(config)
        .build()
}

#[test]
fn test_each_fact_pulled_once_per_epoch() {
    let mut provider = MockProvider::new();
    provider.expect_is_home_process().times(2).returning(|| Ok(true));
    provider
        .expect_is_previous_process()
        .times(1)
        .returning(|| Ok(false));

    let locks = ServiceLocks::new();
    let process = record(&locks, provider, &CoreConfig::default());
    let service = locks.lock_service();

    assert_eq!(process.is_home_process(&service), Some(true));
    assert_eq!(process.is_home_process(&service), Some(true));
    assert_eq!(process.is_previous_process(&service), Some(false));
    assert_eq!(process.is_previous_process(&service), Some(false));

    process.reset_cached_facts(&service);
    assert_eq!(process.is_home_process(&service), Some(true));
}

#[test]
fn test_failed_pull_is_retried() {
    let mut provider = MockProvider::new();
    let mut seq = mockall::Sequence::new();
    provider
        .expect_is_heavy_weight()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| Err(ProviderError::Unavailable("model busy".into())));
    provider
        .expect_is_heavy_weight()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| Ok(true));

    let locks = ServiceLocks::new();
    let process = record(&locks, provider, &CoreConfig::default());
    let service = locks.lock_service();

    assert_eq!(process.is_heavy_weight(&service), None);
    assert_eq!(process.is_heavy_weight(&service), Some(true));
    assert_eq!(process.is_heavy_weight(&service), Some(true));
}

#[test]
fn test_compat_changes_cached_independently() {
    let mut provider = MockProvider::new();
    provider
        .expect_has_compat_change()
        .times(CompatChange::COUNT)
        .returning(|change| Ok(change == CompatChange::CameraMicrophoneCapability));

    let locks = ServiceLocks::new();
    let process = record(&locks, provider, &CoreConfig::default());
    let service = locks.lock_service();

    for _ in 0..2 {
        for change in CompatChange::ALL {
            assert_eq!(
                process.has_compat_change(&service, change),
                Some(change == CompatChange::CameraMicrophoneCapability)
            );
        }
    }
    assert_eq!(process.has_compat_change_id(&service, 1), Some(true));
}

#[test]
fn test_broadcast_group_lands_in_cache() {
    let mut provider = MockProvider::new();
    provider
        .expect_receiving_broadcast()
        .times(1)
        .returning(|| Ok(Some(SchedulingGroup::Default)));

    let locks = ServiceLocks::new();
    let process = record(&locks, provider, &CoreConfig::default());
    let service = locks.lock_service();

    assert_eq!(process.is_receiving_broadcast(&service), Some(true));
    assert_eq!(
        process.cached_scheduling_group(&service),
        SchedulingGroup::Default
    );
}

#[test]
fn test_push_mode_skips_provider() {
    let mut provider = MockProvider::new();
    provider.expect_has_activities().never();
    provider.expect_has_visible_activities().never();
    provider.expect_has_recent_tasks().never();

    let locks = ServiceLocks::new();
    let process = record(&locks, provider, &CoreConfig::push());
    let service = locks.lock_service();

    process.push_has_activities(&service, true);
    process.push_activity_state_flags(&service, ActivityStateFlags::IS_VISIBLE);
    process.push_has_recent_task(&service, true);

    assert_eq!(process.has_activities(&service), Some(true));
    assert_eq!(process.has_visible_activities(&service), Some(true));
    assert_eq!(process.has_recent_tasks(&service), Some(true));
    assert_eq!(
        process.activity_state_flags(&service),
        ActivityStateFlags::IS_VISIBLE
    );
}

#[test]
fn test_push_mode_visible_override_cleared_by_reset() {
    let mut provider = MockProvider::new();
    provider.expect_has_visible_activities().never();

    let locks = ServiceLocks::new();
    let process = record(&locks, provider, &CoreConfig::push());
    let service = locks.lock_service();

    process.push_activity_state_flags(&service, ActivityStateFlags::default());
    process.set_cached_has_visible_activities(&service, true);
    assert_eq!(process.has_visible_activities(&service), Some(true));
    assert_eq!(
        process.activity_state_flags(&service),
        ActivityStateFlags::default()
    );

    process.reset_cached_facts(&service);
    assert_eq!(process.has_visible_activities(&service), Some(false));
}
