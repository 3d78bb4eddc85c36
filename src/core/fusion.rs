use crate::core::parser::AiResult;
use crate::domain::model::{AuditReport, DeviceShare, IssueOrigin, SeoIssue, Severity, Source};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// Lighthouse audits that become technical issues, in report order.
pub const TECHNICAL_SIGNALS: [&str; 6] = [
    "first-contentful-paint",
    "largest-contentful-paint",
    "cumulative-layout-shift",
    "total-blocking-time",
    "interactive",
    "server-response-time",
];

pub const MAX_SEO_ISSUES: usize = 12;
pub const ISSUE_SCORE_THRESHOLD: f64 = 0.9;
pub const CRITICAL_SCORE_THRESHOLD: f64 = 0.5;
pub const PROBE_FIX_RECOMMENDATION: &str = "See PageSpeed Insights for details.";
pub const DEFAULT_OVERALL_SCORE: u8 = 50;

/// One entry of `lighthouseResult.audits`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LighthouseAudit {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub display_value: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Typed view of a performance-probe document. Only built when the document
/// carries a `lighthouseResult` object; otherwise the probe counts as
/// unusable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProbeResult {
    audits: HashMap<String, LighthouseAudit>,
}

impl ProbeResult {
    pub fn from_document(document: &Value) -> Option<Self> {
        let lighthouse = document.get("lighthouseResult").filter(|v| v.is_object())?;

        let audits = lighthouse
            .get("audits")
            .and_then(Value::as_object)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|(key, value)| {
                        serde_json::from_value::<LighthouseAudit>(value.clone())
                            .map(|audit| (key.clone(), audit))
                            .map_err(|e| tracing::debug!("Skipping audit '{}': {}", key, e))
                            .ok()
                    })
                    .collect()
            })
            .unwrap_or_default();

        Some(Self { audits })
    }

    pub fn audit(&self, key: &str) -> Option<&LighthouseAudit> {
        self.audits.get(key)
    }

    /// Issues for every allow-listed signal scoring below the threshold.
    /// Signals without a score were not evaluated and are skipped.
    pub fn technical_issues(&self) -> Vec<SeoIssue> {
        TECHNICAL_SIGNALS
            .iter()
            .filter_map(|key| {
                let audit = self.audit(key)?;
                let score = audit.score?;
                if score >= ISSUE_SCORE_THRESHOLD {
                    return None;
                }

                let severity = if score < CRITICAL_SCORE_THRESHOLD {
                    Severity::Critical
                } else {
                    Severity::Warning
                };
                let description = audit
                    .display_value
                    .as_deref()
                    .filter(|v| !v.is_empty())
                    .or(audit.description.as_deref())
                    .unwrap_or_default();

                Some(SeoIssue {
                    id: audit.id.clone().unwrap_or_else(|| key.to_string()),
                    severity,
                    title: audit.title.clone().unwrap_or_default(),
                    description: description.to_string(),
                    fix_recommendation: PROBE_FIX_RECOMMENDATION.to_string(),
                })
            })
            .collect()
    }
}

pub fn default_device_distribution() -> Vec<DeviceShare> {
    vec![
        DeviceShare::new("Mobile", 60.0, "#3b82f6"),
        DeviceShare::new("Desktop", 40.0, "#93c5fd"),
    ]
}

pub fn default_summary(target: &str) -> String {
    format!("Analysis complete for {}", target)
}

/// Upstream scores are floats; anything absent or not positive once rounded
/// becomes the neutral default.
pub fn resolve_overall_score(raw: Option<f64>) -> u8 {
    match raw.map(f64::round) {
        Some(score) if score >= 1.0 => score.min(100.0) as u8,
        _ => DEFAULT_OVERALL_SCORE,
    }
}

pub fn resolve_global_rank(raw: Option<f64>) -> Option<u64> {
    raw.map(f64::round).filter(|rank| *rank >= 1.0).map(|rank| rank as u64)
}

/// Merges both sources into the canonical report.
///
/// | field                | source                       | fallback                        |
/// |----------------------|------------------------------|---------------------------------|
/// | `seoIssues`          | probe audits, when usable    | research `fallbackIssues` or [] |
/// | `overallScore`       | research, if >= 1 rounded    | 50                              |
/// | `globalRank`         | research, if >= 1            | absent                          |
/// | `engagement`         | research                     | absent                          |
/// | `trafficHistory`     | research                     | []                              |
/// | `deviceDistribution` | research                     | Mobile 60 / Desktop 40          |
/// | `marketingChannels`  | research                     | []                              |
/// | `topKeywords`        | research                     | []                              |
/// | `topCountries`       | research                     | []                              |
/// | `summary`            | research, if non-blank       | "Analysis complete for <target>"|
/// | `sources`            | grounding citations          | []                              |
pub fn fuse(
    target: &str,
    probe: Option<&ProbeResult>,
    ai: AiResult,
    sources: Vec<Source>,
    generated_at: DateTime<Utc>,
) -> AuditReport {
    let (mut seo_issues, issue_origin) = match probe {
        Some(probe) => (probe.technical_issues(), IssueOrigin::PerformanceProbe),
        None => (
            ai.fallback_issues.unwrap_or_default(),
            IssueOrigin::MarketResearch,
        ),
    };
    seo_issues.truncate(MAX_SEO_ISSUES);

    let summary = ai
        .summary
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default_summary(target));

    AuditReport {
        target: target.to_string(),
        generated_at,
        overall_score: resolve_overall_score(ai.overall_score),
        global_rank: resolve_global_rank(ai.global_rank),
        engagement: ai.engagement,
        traffic_history: ai.traffic_history.unwrap_or_default(),
        device_distribution: ai
            .device_distribution
            .unwrap_or_else(default_device_distribution),
        marketing_channels: ai.marketing_channels.unwrap_or_default(),
        top_keywords: ai.top_keywords.unwrap_or_default(),
        top_countries: ai.top_countries.unwrap_or_default(),
        seo_issues,
        issue_origin,
        summary,
        sources,
    }
}
