use crate::clock::{Clock, RealClock};
use crate::manager::UpdateManager;
use crate::scheduler::Scheduler;
use phish_api::DatasetApi;
use phish_dataset::DatasetStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Default hash-prefix update cadence: 20 minutes.
pub const DEFAULT_HASH_PREFIX_INTERVAL: Duration = Duration::from_secs(20 * 60);
/// Default filter-set update cadence: 12 hours.
pub const DEFAULT_FILTER_SET_INTERVAL: Duration = Duration::from_secs(12 * 60 * 60);

/// Composes the two background schedulers (one per dataset stream) and
/// exposes only `start()`/`stop()` to the host, both idempotent via a
/// `running` flag.
pub struct UpdaterActivity<C: Clock = RealClock> {
    manager: Arc<UpdateManager>,
    hash_prefix_scheduler: Scheduler<C>,
    filter_set_scheduler: Scheduler<C>,
    hash_prefix_interval: Duration,
    filter_set_interval: Duration,
    running: AtomicBool,
}

impl<C: Clock + 'static> UpdaterActivity<C> {
    pub fn new(
        api: Arc<dyn DatasetApi>,
        store: Arc<DatasetStore>,
        clock: Arc<C>,
        hash_prefix_interval: Duration,
        filter_set_interval: Duration,
    ) -> Self {
        UpdaterActivity {
            manager: Arc::new(UpdateManager::new(api, store)),
            hash_prefix_scheduler: Scheduler::new(clock.clone()),
            filter_set_scheduler: Scheduler::new(clock),
            hash_prefix_interval,
            filter_set_interval,
            running: AtomicBool::new(false),
        }
    }

    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let manager = self.manager.clone();
        self.hash_prefix_scheduler
            .start(self.hash_prefix_interval, move || {
                let manager = manager.clone();
                async move { manager.update_hash_prefixes().await }
            })
            .await;

        let manager = self.manager.clone();
        self.filter_set_scheduler
            .start(self.filter_set_interval, move || {
                let manager = manager.clone();
                async move { manager.update_filter_set().await }
            })
            .await;
    }

    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        self.hash_prefix_scheduler.stop().await;
        self.filter_set_scheduler.stop().await;
    }
}

impl UpdaterActivity<RealClock> {
    pub fn with_defaults(api: Arc<dyn DatasetApi>, store: Arc<DatasetStore>) -> Self {
        Self::new(
            api,
            store,
            Arc::new(RealClock),
            DEFAULT_HASH_PREFIX_INTERVAL,
            DEFAULT_FILTER_SET_INTERVAL,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use phish_api::MatchRecord;
    use phish_dataset::{Delta, Filter, HashPrefix};
    use tempfile::TempDir;

    struct NoopApi;

    #[async_trait]
    impl DatasetApi for NoopApi {
        async fn get_hash_prefixes(&self, revision: u64) -> Delta<HashPrefix> {
            Delta::empty_at(revision)
        }
        async fn get_filter_set(&self, revision: u64) -> Delta<Filter> {
            Delta::empty_at(revision)
        }
        async fn get_matches(&self, _hash_prefix: &str) -> Vec<MatchRecord> {
            Vec::new()
        }
    }

    #[tokio::test]
    async fn start_and_stop_are_idempotent() {
        let td = TempDir::new().unwrap();
        let store = Arc::new(DatasetStore::new(td.path()));
        store.load();
        let activity = UpdaterActivity::with_defaults(Arc::new(NoopApi), store);

        activity.start().await;
        activity.start().await; // second call is a no-op
        activity.stop().await;
        activity.stop().await; // second call is a no-op
    }
}
