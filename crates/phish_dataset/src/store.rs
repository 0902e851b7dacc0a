//! Owns the in-memory filter set, hash-prefix set, and two per-stream
//! revisions; persists them atomically to files in an
//! application-support directory; loads from disk on startup, falling
//! back wholesale to the embedded baseline when the on-disk state is
//! missing, corrupt, or uninitialized.

use crate::embedded::{embedded_filter_set, embedded_hash_prefixes, EMBEDDED_REVISION};
use crate::error::DatasetError;
use crate::types::{Filter, HashPrefix};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// An immutable point-in-time view of `(filterSet, hashPrefixes)`.
/// Readers clone the `Arc` under a brief read lock and then work
/// against this snapshot with no further locking, so a background
/// update swapping in a new snapshot never tears a reader's view.
#[derive(Debug, Clone, Default)]
pub struct DatasetSnapshot {
    pub filter_set: HashSet<Filter>,
    pub hash_prefixes: HashSet<HashPrefix>,
}

pub struct DatasetStore {
    dir: PathBuf,
    snapshot: RwLock<Arc<DatasetSnapshot>>,
    filter_set_revision: AtomicU64,
    hash_prefix_revision: AtomicU64,
}

impl DatasetStore {
    /// Construct a store rooted at `dir`. The in-memory state starts
    /// empty at revision 0; call [`DatasetStore::load`] to populate it
    /// from disk (or the embedded baseline).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DatasetStore {
            dir: dir.into(),
            snapshot: RwLock::new(Arc::new(DatasetSnapshot::default())),
            filter_set_revision: AtomicU64::new(0),
            hash_prefix_revision: AtomicU64::new(0),
        }
    }

    fn filter_set_path(&self) -> PathBuf {
        self.dir.join("filterSet.json")
    }

    fn hash_prefixes_path(&self) -> PathBuf {
        self.dir.join("hashPrefixes.json")
    }

    fn filter_set_revision_path(&self) -> PathBuf {
        self.dir.join("filterSetRevision.txt")
    }

    fn hash_prefix_revision_path(&self) -> PathBuf {
        self.dir.join("hashPrefixRevision.txt")
    }

    /// Single shared counter used by installs that predate per-stream
    /// revisions; kept as a read-only migration fallback.
    fn legacy_revision_path(&self) -> PathBuf {
        self.dir.join("revision.txt")
    }

    /// Load the persisted dataset, falling back wholesale to the
    /// embedded baseline on any I/O or decode error, or if both sets
    /// are empty, or if neither stream has a positive revision.
    /// Never fails: a corrupt or absent on-disk store degrades to the
    /// baseline rather than blocking startup.
    pub fn load(&self) {
        let filter_set = read_json_set(&self.filter_set_path());
        let hash_prefixes = read_json_set(&self.hash_prefixes_path());
        let legacy_revision = read_revision(&self.legacy_revision_path());
        let filter_set_revision =
            read_revision(&self.filter_set_revision_path()).or(legacy_revision);
        let hash_prefix_revision =
            read_revision(&self.hash_prefix_revision_path()).or(legacy_revision);

        let loaded = match (filter_set, hash_prefixes, filter_set_revision, hash_prefix_revision) {
            (Some(filter_set), Some(hash_prefixes), Some(fs_rev), Some(hp_rev))
                if !(filter_set.is_empty() && hash_prefixes.is_empty())
                    && (fs_rev > 0 || hp_rev > 0) =>
            {
                Some((filter_set, hash_prefixes, fs_rev, hp_rev))
            }
            _ => None,
        };

        match loaded {
            Some((filter_set, hash_prefixes, fs_rev, hp_rev)) => {
                tracing::debug!(
                    filter_set_revision = fs_rev,
                    hash_prefix_revision = hp_rev,
                    "loaded dataset from disk"
                );
                *self.snapshot.write().unwrap() =
                    Arc::new(DatasetSnapshot { filter_set, hash_prefixes });
                self.filter_set_revision.store(fs_rev, Ordering::SeqCst);
                self.hash_prefix_revision.store(hp_rev, Ordering::SeqCst);
            }
            None => {
                tracing::debug!("on-disk dataset missing, corrupt, or uninitialized; falling back to embedded baseline");
                *self.snapshot.write().unwrap() = Arc::new(DatasetSnapshot {
                    filter_set: embedded_filter_set(),
                    hash_prefixes: embedded_hash_prefixes(),
                });
                self.filter_set_revision.store(EMBEDDED_REVISION, Ordering::SeqCst);
                self.hash_prefix_revision.store(EMBEDDED_REVISION, Ordering::SeqCst);
            }
        }
    }

    /// Persist the full current in-memory state to disk. Best-effort:
    /// a failed write is logged and otherwise ignored.
    pub fn save(&self) {
        let snapshot = self.snapshot();
        self.persist(&self.filter_set_path(), &snapshot.filter_set);
        self.persist(&self.hash_prefixes_path(), &snapshot.hash_prefixes);
        self.persist(&self.filter_set_revision_path(), &self.filter_set_revision());
        self.persist(&self.hash_prefix_revision_path(), &self.hash_prefix_revision());
    }

    /// A clone of the current immutable snapshot. Cheap: clones an
    /// `Arc`, not the underlying sets.
    pub fn snapshot(&self) -> Arc<DatasetSnapshot> {
        self.snapshot.read().unwrap().clone()
    }

    pub fn filter_set_revision(&self) -> u64 {
        self.filter_set_revision.load(Ordering::SeqCst)
    }

    pub fn hash_prefix_revision(&self) -> u64 {
        self.hash_prefix_revision.load(Ordering::SeqCst)
    }

    /// Replace the filter set and persist it. Hash prefixes are left
    /// untouched, swapped in as part of the same new snapshot so
    /// readers never observe a torn combination.
    pub fn save_filter_set(&self, filter_set: HashSet<Filter>) {
        {
            let mut guard = self.snapshot.write().unwrap();
            let next = DatasetSnapshot {
                filter_set,
                hash_prefixes: guard.hash_prefixes.clone(),
            };
            *guard = Arc::new(next);
        }
        self.persist(&self.filter_set_path(), &self.snapshot().filter_set);
    }

    /// Replace the hash-prefix set and persist it.
    pub fn save_hash_prefixes(&self, hash_prefixes: HashSet<HashPrefix>) {
        {
            let mut guard = self.snapshot.write().unwrap();
            let next = DatasetSnapshot {
                filter_set: guard.filter_set.clone(),
                hash_prefixes,
            };
            *guard = Arc::new(next);
        }
        self.persist(&self.hash_prefixes_path(), &self.snapshot().hash_prefixes);
    }

    pub fn save_filter_set_revision(&self, revision: u64) {
        self.filter_set_revision.store(revision, Ordering::SeqCst);
        self.persist(&self.filter_set_revision_path(), &revision);
    }

    pub fn save_hash_prefix_revision(&self, revision: u64) {
        self.hash_prefix_revision.store(revision, Ordering::SeqCst);
        self.persist(&self.hash_prefix_revision_path(), &revision);
    }

    fn persist<T: Serialize>(&self, path: &Path, value: &T) {
        if let Err(err) = write_atomic(&self.dir, path, value) {
            tracing::warn!(path = %path.display(), error = %err, "failed to persist dataset file; keeping in-memory state authoritative");
        }
    }
}

fn read_json_set<T>(path: &Path) -> Option<HashSet<T>>
where
    T: DeserializeOwned + Eq + Hash,
{
    let bytes = std::fs::read(path).ok()?;
    let items: Vec<T> = serde_json::from_slice(&bytes).ok()?;
    Some(items.into_iter().collect())
}

fn read_revision(path: &Path) -> Option<u64> {
    let bytes = std::fs::read(path).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Write `value` as JSON to a sibling temp file, then rename it over
/// `path`. A crash mid-write leaves the original file (or no file)
/// behind, never a half-written one.
fn write_atomic<T: Serialize>(dir: &Path, path: &Path, value: &T) -> Result<(), DatasetError> {
    std::fs::create_dir_all(dir)?;
    let bytes = serde_json::to_vec(value)?;
    let tmp_path = path.with_extension("tmp");
    std::fs::write(&tmp_path, &bytes)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn filter(hash: &str) -> Filter {
        Filter { hash: hash.to_string(), regex: "^https://".into() }
    }

    #[test]
    fn missing_directory_falls_back_to_embedded_baseline() {
        let td = TempDir::new().unwrap();
        let store = DatasetStore::new(td.path().join("does-not-exist"));
        store.load();
        let snapshot = store.snapshot();
        assert_eq!(snapshot.filter_set, embedded_filter_set());
        assert_eq!(snapshot.hash_prefixes, embedded_hash_prefixes());
        assert_eq!(store.filter_set_revision(), EMBEDDED_REVISION);
        assert_eq!(store.hash_prefix_revision(), EMBEDDED_REVISION);
    }

    #[test]
    fn zero_revision_on_disk_falls_back_to_embedded_baseline() {
        let td = TempDir::new().unwrap();
        let store = DatasetStore::new(td.path());
        store.save_filter_set([filter("a")].into_iter().collect());
        store.save_hash_prefixes([HashPrefix("aaaaaaaa".into())].into_iter().collect());
        // revisions left at 0 (never explicitly saved)

        let reloaded = DatasetStore::new(td.path());
        reloaded.load();
        assert_eq!(reloaded.snapshot().filter_set, embedded_filter_set());
    }

    #[test]
    fn save_then_load_round_trips() {
        let td = TempDir::new().unwrap();
        let store = DatasetStore::new(td.path());
        store.save_filter_set([filter("a"), filter("b")].into_iter().collect());
        store.save_hash_prefixes([HashPrefix("11112222".into())].into_iter().collect());
        store.save_filter_set_revision(5);
        store.save_hash_prefix_revision(7);

        let reloaded = DatasetStore::new(td.path());
        reloaded.load();
        let snapshot = reloaded.snapshot();
        assert_eq!(snapshot.filter_set, store.snapshot().filter_set);
        assert_eq!(snapshot.hash_prefixes, store.snapshot().hash_prefixes);
        assert_eq!(reloaded.filter_set_revision(), 5);
        assert_eq!(reloaded.hash_prefix_revision(), 7);
    }

    #[test]
    fn atomic_write_does_not_leave_a_tmp_file_behind() {
        let td = TempDir::new().unwrap();
        let store = DatasetStore::new(td.path());
        store.save_filter_set_revision(2);
        assert!(!td.path().join("filterSetRevision.tmp").exists());
        assert!(td.path().join("filterSetRevision.txt").exists());
    }
}
