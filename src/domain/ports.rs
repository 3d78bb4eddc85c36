use crate::domain::model::ResearchResponse;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Optional technical enrichment. Implementations swallow every failure,
/// including their own timeout, and report it as `None`.
#[async_trait]
pub trait PerformanceProbe: Send + Sync {
    async fn probe(&self, url: &str) -> Option<serde_json::Value>;
}

/// Mandatory market-research source. Errors are fatal for the audit.
#[async_trait]
pub trait MarketResearch: Send + Sync {
    async fn research(&self, url: &str) -> Result<ResearchResponse>;
}

pub trait ConfigProvider: Send + Sync {
    fn probe_endpoint(&self) -> &str;
    fn probe_strategy(&self) -> &str;
    fn probe_timeout_ms(&self) -> u64;
    fn research_endpoint(&self) -> &str;
    fn research_model(&self) -> &str;
    fn research_timeout_seconds(&self) -> Option<u64>;
    fn api_key(&self) -> Option<&str>;
}
