//! phish_api
//!
//! Wraps the three dataset/match endpoints behind the [`DatasetApi`]
//! trait. The production implementation never surfaces transport or
//! decode failures as errors: per the error handling design, a failed
//! fetch degrades to an empty delta / empty match list and a debug
//! log, because failure here must never block classification or a
//! scheduled retry.

use async_trait::async_trait;
use phish_dataset::{Delta, Filter, HashPrefix};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Reserved documentation domains (RFC 2606); real deployments
/// override these via configuration.
pub const PRODUCTION_BASE_URL: &str = "https://api.phish-feed.example.com/v1";
pub const STAGING_BASE_URL: &str = "https://api.phish-feed.example.org/v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Staging,
}

impl Environment {
    pub fn base_url(self) -> &'static str {
        match self {
            Environment::Production => PRODUCTION_BASE_URL,
            Environment::Staging => STAGING_BASE_URL,
        }
    }
}

/// A match produced by the remote `/matches` endpoint for a short hash
/// prefix. Identical role to [`Filter`] at match time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub hostname: String,
    pub url: String,
    pub regex: String,
    pub hash: String,
}

#[derive(Debug, Deserialize)]
struct MatchesResponse {
    matches: Vec<MatchRecord>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("non-success status: {0}")]
    Status(reqwest::StatusCode),
}

/// The three dataset/match operations, expressed as a trait so tests
/// can substitute a stub without a network stack.
#[async_trait]
pub trait DatasetApi: Send + Sync {
    async fn get_hash_prefixes(&self, revision: u64) -> Delta<HashPrefix>;
    async fn get_filter_set(&self, revision: u64) -> Delta<Filter>;
    async fn get_matches(&self, hash_prefix: &str) -> Vec<MatchRecord>;
}

/// Production `DatasetApi` backed by an injected `reqwest::Client`.
pub struct HttpApiClient {
    client: Client,
    base_url: String,
}

impl HttpApiClient {
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(request_timeout).build()?;
        Ok(Self { client, base_url: base_url.into() })
    }

    /// Construct with an already-built client, e.g. one shared across
    /// several subsystems.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self { client, base_url: base_url.into() }
    }

    fn delta_url(&self, path: &str, revision: u64) -> String {
        let base = format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'));
        if revision > 0 {
            format!("{base}?revision={revision}")
        } else {
            base
        }
    }

    async fn fetch_delta<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        revision: u64,
    ) -> Result<Delta<T>, ApiError> {
        let url = self.delta_url(path, revision);
        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(ApiError::Status(resp.status()));
        }
        Ok(resp.json::<Delta<T>>().await?)
    }
}

#[async_trait]
impl DatasetApi for HttpApiClient {
    async fn get_hash_prefixes(&self, revision: u64) -> Delta<HashPrefix> {
        match self.fetch_delta::<HashPrefix>("hashPrefix", revision).await {
            Ok(delta) => delta,
            Err(err) => {
                tracing::debug!(operation = "getHashPrefixes", revision, error = %err, "update fetch failed; degrading to empty delta");
                Delta::empty_at(revision)
            }
        }
    }

    async fn get_filter_set(&self, revision: u64) -> Delta<Filter> {
        match self.fetch_delta::<Filter>("filterSet", revision).await {
            Ok(delta) => delta,
            Err(err) => {
                tracing::debug!(operation = "getFilterSet", revision, error = %err, "update fetch failed; degrading to empty delta");
                Delta::empty_at(revision)
            }
        }
    }

    async fn get_matches(&self, hash_prefix: &str) -> Vec<MatchRecord> {
        let url = format!(
            "{}/matches?hashPrefix={}",
            self.base_url.trim_end_matches('/'),
            hash_prefix
        );
        let result: Result<Vec<MatchRecord>, ApiError> = async {
            let resp = self.client.get(url).send().await?;
            if !resp.status().is_success() {
                return Err(ApiError::Status(resp.status()));
            }
            Ok(resp.json::<MatchesResponse>().await?.matches)
        }
        .await;

        match result {
            Ok(matches) => matches,
            Err(err) => {
                tracing::debug!(operation = "getMatches", hash_prefix, error = %err, "match query failed; degrading to empty result");
                Vec::new()
            }
        }
    }
}
