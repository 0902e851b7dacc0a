use crate::classifier::Classifier;
use crate::telemetry::{NullTelemetrySink, TelemetrySink};
use phish_api::DatasetApi;
use phish_dataset::DatasetStore;
use phish_update::UpdaterActivity;
use std::sync::Arc;

/// Top-level composition: owns the store, the updater activity, and
/// the classifier, and exposes only the host-facing surface
/// (`is_malicious`, `start`, `stop`, `load_data_async`). Downward
/// ownership avoids cyclic `weak` back-references between the parts.
pub struct PhishingDetector {
    store: Arc<DatasetStore>,
    updater: UpdaterActivity,
    classifier: Classifier,
}

impl PhishingDetector {
    pub fn new(api: Arc<dyn DatasetApi>, store: Arc<DatasetStore>, telemetry: Arc<dyn TelemetrySink>) -> Self {
        let updater = UpdaterActivity::with_defaults(api.clone(), store.clone());
        let classifier = Classifier::new(store.clone(), api, telemetry);
        PhishingDetector { store, updater, classifier }
    }

    pub fn with_default_telemetry(api: Arc<dyn DatasetApi>, store: Arc<DatasetStore>) -> Self {
        Self::new(api, store, Arc::new(NullTelemetrySink))
    }

    /// Load the dataset from disk, falling back to the embedded
    /// baseline. Must run before the first classification to avoid
    /// operating on an empty, always-safe dataset.
    pub async fn load_data_async(&self) {
        self.store.load();
    }

    pub async fn is_malicious(&self, url: &str) -> bool {
        self.classifier.is_malicious(url).await
    }

    pub async fn start(&self) {
        self.updater.start().await;
    }

    pub async fn stop(&self) {
        self.updater.stop().await;
    }

    pub fn filter_set_revision(&self) -> u64 {
        self.store.filter_set_revision()
    }

    pub fn hash_prefix_revision(&self) -> u64 {
        self.store.hash_prefix_revision()
    }

    pub fn snapshot(&self) -> Arc<phish_dataset::DatasetSnapshot> {
        self.store.snapshot()
    }
}
