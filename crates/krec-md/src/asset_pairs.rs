//! Asset pair resolution for the `"all"` pair wildcard.
//!
//! | Operation   | Method | Path                    |
//! |-------------|--------|-------------------------|
//! | Asset pairs | GET    | `/0/public/AssetPairs`  |
//!
//! The response maps pair keys to pair info; the `wsname` of each entry is
//! the name the streaming feed expects in subscribe requests.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use krec_core::error::KrecError;
use serde::Deserialize;
use tracing::info;

/// Source of the pair list used when `"all"` pairs are requested.
#[async_trait]
pub trait PairResolver: Send + Sync {
    async fn resolve_pairs(&self) -> Result<Vec<String>>;
}

#[derive(Debug, Deserialize)]
struct AssetPairsResponse {
    #[serde(default)]
    error: Vec<String>,
    #[serde(default)]
    result: BTreeMap<String, AssetPairInfo>,
}

#[derive(Debug, Deserialize)]
struct AssetPairInfo {
    wsname: Option<String>,
}

/// Resolves pairs through the public REST API.
pub struct RestPairResolver {
    http: reqwest::Client,
    base_url: String,
}

impl RestPairResolver {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { http: reqwest::Client::new(), base_url: base_url.into() }
    }
}

#[async_trait]
impl PairResolver for RestPairResolver {
    async fn resolve_pairs(&self) -> Result<Vec<String>> {
        let url = format!("{}/0/public/AssetPairs", self.base_url.trim_end_matches('/'));
        let body: AssetPairsResponse = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?
            .error_for_status()?
            .json()
            .await
            .context("decoding AssetPairs response")?;

        let pairs = ws_names(body)?;
        info!("resolved {} pair(s) from {url}", pairs.len());
        Ok(pairs)
    }
}

/// Fixed pair list; used when the pair set is known up front.
pub struct StaticPairResolver(pub Vec<String>);

#[async_trait]
impl PairResolver for StaticPairResolver {
    async fn resolve_pairs(&self) -> Result<Vec<String>> {
        Ok(self.0.clone())
    }
}

/// Collect `wsname` values, in key order. Entries without one are skipped.
fn ws_names(body: AssetPairsResponse) -> Result<Vec<String>> {
    if !body.error.is_empty() {
        return Err(KrecError::Rest(format!("AssetPairs error: {}", body.error.join(", "))).into());
    }
    Ok(body.result.into_values().filter_map(|info| info.wsname).collect())
}
