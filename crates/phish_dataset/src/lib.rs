//! phish_dataset
//!
//! The persisted dataset: hash-prefix set, filter set, and per-stream
//! revisions, with embedded-baseline fallback and atomic on-disk
//! persistence.

pub mod embedded;
pub mod error;
pub mod store;
pub mod types;

pub use embedded::{embedded_filter_set, embedded_hash_prefixes, EMBEDDED_REVISION};
pub use error::DatasetError;
pub use store::{DatasetSnapshot, DatasetStore};
pub use types::{apply_delta, Delta, Filter, HashPrefix, WellFormed};
