use crate::domain::ports::PerformanceProbe;
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

pub const DEFAULT_PAGESPEED_ENDPOINT: &str =
    "https://www.googleapis.com/pagespeedonline/v5/runPagespeed";
pub const DEFAULT_PROBE_STRATEGY: &str = "mobile";
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 4000;
pub const PROBE_CATEGORIES: [&str; 2] = ["PERFORMANCE", "SEO"];

/// PageSpeed Insights client. The whole exchange, body included, must finish
/// inside `timeout` or it is dropped.
pub struct PageSpeedProbe {
    client: Client,
    endpoint: String,
    strategy: String,
    timeout: Duration,
}

impl PageSpeedProbe {
    pub fn new(endpoint: impl Into<String>, strategy: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            strategy: strategy.into(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn query_pairs<'a>(&'a self, url: &'a str) -> Vec<(&'a str, &'a str)> {
        let mut query = vec![("url", url)];
        for category in PROBE_CATEGORIES {
            query.push(("category", category));
        }
        query.push(("strategy", self.strategy.as_str()));
        query
    }

    async fn fetch(&self, url: &str) -> Result<Option<serde_json::Value>> {
        let query = self.query_pairs(url);
        tracing::debug!("Requesting PageSpeed data for: {}", url);
        let response = self.client.get(&self.endpoint).query(&query).send().await?;
        tracing::debug!("PageSpeed response status: {}", response.status());

        if !response.status().is_success() {
            tracing::warn!(
                "⚠️ PageSpeed API unavailable (status {}), falling back to research issues",
                response.status()
            );
            return Ok(None);
        }

        let document: serde_json::Value = response.json().await?;
        Ok(Some(document))
    }
}

impl Default for PageSpeedProbe {
    fn default() -> Self {
        Self::new(
            DEFAULT_PAGESPEED_ENDPOINT,
            DEFAULT_PROBE_STRATEGY,
            Duration::from_millis(DEFAULT_PROBE_TIMEOUT_MS),
        )
    }
}

#[async_trait]
impl PerformanceProbe for PageSpeedProbe {
    async fn probe(&self, url: &str) -> Option<serde_json::Value> {
        match tokio::time::timeout(self.timeout, self.fetch(url)).await {
            Ok(Ok(document)) => document,
            Ok(Err(e)) => {
                tracing::warn!("⚠️ PageSpeed request failed: {}", e);
                None
            }
            Err(_) => {
                tracing::warn!("⏱️ PageSpeed request timed out after {:?}", self.timeout);
                None
            }
        }
    }
}
