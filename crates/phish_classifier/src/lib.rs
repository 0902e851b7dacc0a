//! phish_classifier
//!
//! The decision function (`is_malicious`) and the top-level
//! `PhishingDetector` facade that composes it with the dataset store
//! and the background updater activity.

pub mod classifier;
pub mod detector;
pub mod telemetry;

pub use classifier::{Classifier, HASH_PREFIX_QUERY_LEN, HASH_PREFIX_STORE_LEN};
pub use detector::PhishingDetector;
pub use telemetry::{ErrorPageShown, NullTelemetrySink, TelemetrySink};
