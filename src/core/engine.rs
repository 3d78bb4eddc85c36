use crate::adapters::{GeminiResearcher, PageSpeedProbe};
use crate::core::fusion::{fuse, ProbeResult};
use crate::core::parser::{extract_sources, parse_ai_payload};
use crate::core::{AuditReport, ConfigProvider, MarketResearch, PerformanceProbe};
use crate::utils::error::Result;
use crate::utils::validation::normalize_target;
use chrono::Utc;
use std::time::{Duration, Instant};

pub struct AuditEngine<P: PerformanceProbe, M: MarketResearch> {
    probe: P,
    research: M,
}

impl<P: PerformanceProbe, M: MarketResearch> AuditEngine<P, M> {
    pub fn new(probe: P, research: M) -> Self {
        Self { probe, research }
    }

    /// Runs one audit. Both sources are polled concurrently on the calling
    /// task and both must settle before fusion starts. A failed probe only
    /// shrinks the report; a failed research query fails the whole audit.
    pub async fn produce_audit_report(&self, target: &str) -> Result<AuditReport> {
        let target = normalize_target(target)?;
        let started = Instant::now();
        tracing::info!("🚀 Starting audit for: {}", target);

        let (document, research) = tokio::join!(
            self.probe.probe(&target),
            self.research.research(&target)
        );
        let research = research?;

        let probe = document.as_ref().and_then(ProbeResult::from_document);
        match (&document, &probe) {
            (Some(_), None) => tracing::warn!(
                "⚠️ Performance document has no lighthouseResult, using research fallback issues"
            ),
            (None, _) => tracing::info!("📋 No performance data, using research fallback issues"),
            _ => tracing::debug!("Performance data available, deriving technical issues"),
        }

        let outcome = parse_ai_payload(research.text.as_deref());
        let sources = extract_sources(&research.citations);
        let report = fuse(
            &target,
            probe.as_ref(),
            outcome.into_result(),
            sources,
            Utc::now(),
        );

        tracing::info!(
            "✅ Audit complete for {} in {:?}: score {}, {} issues, {} sources",
            report.target,
            started.elapsed(),
            report.overall_score,
            report.seo_issues.len(),
            report.sources.len()
        );
        Ok(report)
    }
}

impl AuditEngine<PageSpeedProbe, GeminiResearcher> {
    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        let probe = PageSpeedProbe::new(
            config.probe_endpoint(),
            config.probe_strategy(),
            Duration::from_millis(config.probe_timeout_ms()),
        );
        let research = GeminiResearcher::new(
            config.research_endpoint(),
            config.research_model(),
            config.api_key().map(str::to_string),
        )
        .with_timeout(config.research_timeout_seconds().map(Duration::from_secs));

        Self::new(probe, research)
    }
}
