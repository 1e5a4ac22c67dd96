use dashmap::DashMap;
use reqwest::header::CACHE_CONTROL;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// One entry of the external token metadata list.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenListEntry {
    pub address: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Resolves a mint's decimal precision against the external token list.
///
/// The cache is instance-scoped: construct one resolver at application start
/// and share it by reference. Once a mint resolves, every later call is a
/// cache hit. All failures (network, timeout, not found) degrade to `None`
/// so the caller can fall back to the token's statically-known precision.
pub struct DecimalsResolver {
    http: reqwest::Client,
    token_list_url: String,
    cache: DashMap<String, u8>,
}

impl DecimalsResolver {
    pub fn new(token_list_url: &str, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            http,
            token_list_url: token_list_url.to_string(),
            cache: DashMap::new(),
        }
    }

    pub async fn resolve(&self, mint: &str) -> Option<u8> {
        if let Some(decimals) = self.cache.get(mint) {
            return Some(*decimals);
        }

        match self.fetch_from_token_list(mint).await {
            Some(decimals) => {
                self.cache.insert(mint.to_string(), decimals);
                Some(decimals)
            }
            None => {
                debug!(mint, "Token list lookup failed, caller falls back to catalog decimals");
                None
            }
        }
    }

    async fn fetch_from_token_list(&self, mint: &str) -> Option<u8> {
        let response = self
            .http
            .get(&self.token_list_url)
            .header(CACHE_CONTROL, "max-age=3600")
            .send()
            .await
            .map_err(|e| warn!(error = %e, "Token list request failed"))
            .ok()?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "Token list returned non-success status");
            return None;
        }

        let tokens: Vec<TokenListEntry> = response
            .json()
            .await
            .map_err(|e| warn!(error = %e, "Token list response was not valid JSON"))
            .ok()?;

        let entry = tokens.into_iter().find(|t| t.address == mint)?;
        debug!(symbol = %entry.symbol, decimals = entry.decimals, "Resolved token decimals");
        Some(entry.decimals)
    }

    /// Seeds the cache directly. Used when precision is already known and in
    /// tests.
    pub fn seed(&self, mint: &str, decimals: u8) {
        self.cache.insert(mint.to_string(), decimals);
    }

    pub fn cached(&self, mint: &str) -> Option<u8> {
        self.cache.get(mint).map(|d| *d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_resolver() -> DecimalsResolver {
        DecimalsResolver::new("http://127.0.0.1:1/tokens", Duration::from_millis(100))
    }

    #[tokio::test]
    async fn test_cache_hit_after_seed() {
        let resolver = test_resolver();
        resolver.seed("SomeMint111", 6);
        assert_eq!(resolver.resolve("SomeMint111").await, Some(6));
        assert_eq!(resolver.cached("SomeMint111"), Some(6));
    }

    #[tokio::test]
    async fn test_unreachable_list_degrades_to_none() {
        let resolver = test_resolver();
        // Nothing listens on the endpoint: failure is non-fatal and yields None.
        assert_eq!(resolver.resolve("UnknownMint111").await, None);
        assert_eq!(resolver.cached("UnknownMint111"), None);
    }
}
