use crate::telemetry::{ErrorPageShown, TelemetrySink};
use dashmap::DashMap;
use phish_api::DatasetApi;
use phish_common::{canonicalize, hash_prefix, sha256_hex};
use phish_dataset::{DatasetStore, HashPrefix};
use regex::Regex;
use std::sync::Arc;

/// Length, in hex characters, of the prefix stored in the hash-prefix
/// set and tested as the fast local acceleration check.
pub const HASH_PREFIX_STORE_LEN: usize = 8;
/// Length, in hex characters, of the prefix sent to the remote
/// `/matches` endpoint. Deliberately shorter than the stored prefix to
/// preserve k-anonymity at query time.
pub const HASH_PREFIX_QUERY_LEN: usize = 4;

/// `isMalicious(url) -> bool`: canonicalize, hash, accelerate via the
/// prefix set, match locally, and only on a prefix hit with no local
/// match fall back to a k-anonymous remote query.
pub struct Classifier {
    store: Arc<DatasetStore>,
    api: Arc<dyn DatasetApi>,
    telemetry: Arc<dyn TelemetrySink>,
    regex_cache: DashMap<String, Option<Arc<Regex>>>,
}

impl Classifier {
    pub fn new(
        store: Arc<DatasetStore>,
        api: Arc<dyn DatasetApi>,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Self {
        Classifier { store, api, telemetry, regex_cache: DashMap::new() }
    }

    /// The decision function. Pure apart from the `getMatches` I/O and
    /// the telemetry emission; no dataset state is mutated.
    pub async fn is_malicious(&self, url: &str) -> bool {
        let Some(canonical) = canonicalize(url) else {
            tracing::debug!("url has no host or failed to parse; treating as safe");
            return false;
        };

        let host_hash = sha256_hex(canonical.host.as_bytes());
        let store_prefix = hash_prefix(&host_hash, HASH_PREFIX_STORE_LEN);

        let snapshot = self.store.snapshot();
        if !snapshot.hash_prefixes.contains(&HashPrefix(store_prefix.to_string())) {
            return false;
        }

        for filter in snapshot.filter_set.iter().filter(|f| f.hash == host_hash) {
            if let Some(re) = self.compiled_regex(&filter.regex) {
                if re.is_match(&canonical.url) {
                    self.telemetry.error_page_shown(ErrorPageShown {
                        host: canonical.host.clone(),
                        client_side_hit: true,
                    });
                    return true;
                }
            }
        }

        let query_prefix = hash_prefix(&host_hash, HASH_PREFIX_QUERY_LEN);
        let matches = self.api.get_matches(query_prefix).await;
        for record in matches.iter().filter(|m| m.hash == host_hash) {
            if let Some(re) = self.compiled_regex(&record.regex) {
                if re.is_match(&canonical.url) {
                    self.telemetry.error_page_shown(ErrorPageShown {
                        host: canonical.host.clone(),
                        client_side_hit: false,
                    });
                    return true;
                }
            }
        }

        false
    }

    /// Compile `pattern`, or return the cached result of a previous
    /// compile (success or failure alike, so a persistently broken
    /// rule isn't recompiled on every query).
    fn compiled_regex(&self, pattern: &str) -> Option<Arc<Regex>> {
        if let Some(cached) = self.regex_cache.get(pattern) {
            return cached.clone();
        }
        let compiled = match Regex::new(pattern) {
            Ok(re) => Some(Arc::new(re)),
            Err(err) => {
                tracing::debug!(pattern, error = %err, "regex failed to compile; skipping rule");
                None
            }
        };
        self.regex_cache.insert(pattern.to_string(), compiled.clone());
        compiled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use phish_api::MatchRecord;
    use phish_dataset::{Delta, Filter};
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn sha256_of(host: &str) -> String {
        sha256_hex(host.as_bytes())
    }

    struct StubApi {
        matches: Vec<MatchRecord>,
        calls: Mutex<Vec<String>>,
    }

    impl StubApi {
        fn empty() -> Self {
            StubApi { matches: vec![], calls: Mutex::new(vec![]) }
        }
    }

    #[async_trait]
    impl DatasetApi for StubApi {
        async fn get_hash_prefixes(&self, revision: u64) -> Delta<HashPrefix> {
            Delta::empty_at(revision)
        }
        async fn get_filter_set(&self, revision: u64) -> Delta<Filter> {
            Delta::empty_at(revision)
        }
        async fn get_matches(&self, hash_prefix: &str) -> Vec<MatchRecord> {
            self.calls.lock().unwrap().push(hash_prefix.to_string());
            self.matches.clone()
        }
    }

    #[derive(Default)]
    struct RecordingTelemetry {
        events: Mutex<Vec<ErrorPageShown>>,
    }

    impl TelemetrySink for RecordingTelemetry {
        fn error_page_shown(&self, event: ErrorPageShown) {
            self.events.lock().unwrap().push(event);
        }
    }

    fn store_with(filter_set: Vec<Filter>, hash_prefixes: Vec<&str>) -> (TempDir, Arc<DatasetStore>) {
        let td = TempDir::new().unwrap();
        let store = Arc::new(DatasetStore::new(td.path()));
        store.save_filter_set(filter_set.into_iter().collect());
        store.save_hash_prefixes(hash_prefixes.into_iter().map(|p| HashPrefix(p.to_string())).collect());
        (td, store)
    }

    #[tokio::test]
    async fn url_without_host_is_safe() {
        let (_td, store) = store_with(vec![], vec![]);
        let classifier = Classifier::new(store, Arc::new(StubApi::empty()), Arc::new(NullStub));
        assert!(!classifier.is_malicious("not a url").await);
    }

    struct NullStub;
    impl TelemetrySink for NullStub {
        fn error_page_shown(&self, _event: ErrorPageShown) {}
    }

    #[tokio::test]
    async fn prefix_miss_is_safe_without_calling_the_api() {
        let (_td, store) = store_with(vec![], vec!["aabbccdd"]);
        let api = Arc::new(StubApi::empty());
        let classifier = Classifier::new(store, api.clone(), Arc::new(NullStub));

        assert!(!classifier.is_malicious("https://benign.example/").await);
        assert!(api.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn local_filter_match_is_a_client_side_hit() {
        let hash = sha256_of("evil.test");
        let prefix8 = &hash[..8];
        let filter = Filter { hash: hash.clone(), regex: r"^https://evil\.test/.*".to_string() };
        let (_td, store) = store_with(vec![filter], vec![prefix8]);
        let api = Arc::new(StubApi::empty());
        let telemetry = Arc::new(RecordingTelemetry::default());
        let classifier = Classifier::new(store, api.clone(), telemetry.clone());

        assert!(classifier.is_malicious("https://evil.test/login").await);
        assert!(api.calls.lock().unwrap().is_empty());
        let events = telemetry.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert!(events[0].client_side_hit);
    }

    #[tokio::test]
    async fn remote_match_is_a_server_side_hit() {
        let hash = sha256_of("evil.test");
        let prefix8 = hash[..8].to_string();
        let prefix4 = hash[..4].to_string();
        // Local filter's regex doesn't match; the remote record's does.
        let local_filter = Filter { hash: hash.clone(), regex: r"^https://evil\.test/safe$".to_string() };
        let (_td, store) = store_with(vec![local_filter], vec![&prefix8]);

        let remote_record = MatchRecord {
            hostname: "evil.test".to_string(),
            url: "https://evil.test/login".to_string(),
            regex: r"^https://evil\.test/login$".to_string(),
            hash,
        };
        let api = Arc::new(StubApi { matches: vec![remote_record], calls: Mutex::new(vec![]) });
        let telemetry = Arc::new(RecordingTelemetry::default());
        let classifier = Classifier::new(store, api.clone(), telemetry.clone());

        assert!(classifier.is_malicious("https://evil.test/login").await);
        assert_eq!(api.calls.lock().unwrap().as_slice(), &[prefix4]);
        let events = telemetry.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert!(!events[0].client_side_hit);
    }

    #[tokio::test]
    async fn broken_regex_is_skipped_not_fatal() {
        let hash = sha256_of("evil.test");
        let prefix8 = hash[..8].to_string();
        let filter = Filter { hash, regex: "(unterminated".to_string() };
        let (_td, store) = store_with(vec![filter], vec![&prefix8]);
        let api = Arc::new(StubApi::empty());
        let classifier = Classifier::new(store, api, Arc::new(NullStub));

        assert!(!classifier.is_malicious("https://evil.test/login").await);
    }
}
