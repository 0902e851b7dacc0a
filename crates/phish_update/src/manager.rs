use phish_api::DatasetApi;
use phish_dataset::{apply_delta, DatasetStore};
use std::sync::Arc;

/// Applies an API delta (insert/delete or full replace) to the store's
/// filter set or hash-prefix set, updates that stream's revision, and
/// asks the store to persist. The two operations share no locks: each
/// mutates a different logical set and writes a different revision
/// counter, so they may run concurrently without interfering.
pub struct UpdateManager {
    api: Arc<dyn DatasetApi>,
    store: Arc<DatasetStore>,
}

impl UpdateManager {
    pub fn new(api: Arc<dyn DatasetApi>, store: Arc<DatasetStore>) -> Self {
        UpdateManager { api, store }
    }

    pub async fn update_filter_set(&self) {
        let revision = self.store.filter_set_revision();
        let delta = self.api.get_filter_set(revision).await;
        let current = self.store.snapshot().filter_set.clone();
        let next = apply_delta(&current, &delta);
        self.store.save_filter_set(next);
        self.store.save_filter_set_revision(delta.revision);
    }

    pub async fn update_hash_prefixes(&self) {
        let revision = self.store.hash_prefix_revision();
        let delta = self.api.get_hash_prefixes(revision).await;
        let current = self.store.snapshot().hash_prefixes.clone();
        let next = apply_delta(&current, &delta);
        self.store.save_hash_prefixes(next);
        self.store.save_hash_prefix_revision(delta.revision);
    }
}
