use crate::core::normalize;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical, UI-ready result of one audit. Built once by the fusion step and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub target: String,
    pub generated_at: DateTime<Utc>,
    pub overall_score: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_rank: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engagement: Option<EngagementMetrics>,
    pub traffic_history: Vec<TrafficPoint>,
    pub device_distribution: Vec<DeviceShare>,
    pub marketing_channels: Vec<ChannelShare>,
    pub top_keywords: Vec<KeywordRanking>,
    pub top_countries: Vec<CountryShare>,
    pub seo_issues: Vec<SeoIssue>,
    pub issue_origin: IssueOrigin,
    pub summary: String,
    pub sources: Vec<Source>,
}

/// Engagement figures exactly as the provider formatted them ("32.55%", "06:31").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementMetrics {
    #[serde(default, deserialize_with = "lenient::optional_string")]
    pub bounce_rate: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_string")]
    pub pages_per_visit: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_string")]
    pub avg_visit_duration: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficPoint {
    #[serde(alias = "month", default)]
    pub period: String,
    #[serde(alias = "visits", default, deserialize_with = "lenient::u64_or_zero")]
    pub visit_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceShare {
    #[serde(alias = "name", default)]
    pub label: String,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub value: f64,
    #[serde(
        alias = "fill",
        default,
        deserialize_with = "lenient::optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub color_hint: Option<String>,
}

impl DeviceShare {
    pub fn new(label: &str, value: f64, color_hint: &str) -> Self {
        Self {
            label: label.to_string(),
            value,
            color_hint: Some(color_hint.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelShare {
    #[serde(alias = "name", default)]
    pub label: String,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordRanking {
    #[serde(default)]
    pub keyword: String,
    #[serde(default, deserialize_with = "lenient::u64_or_zero")]
    pub volume: u64,
    #[serde(default, deserialize_with = "lenient::u64_or_zero")]
    pub position: u64,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub difficulty: f64,
}

/// Country traffic share. `share_ratio` keeps the raw upstream value; use the
/// accessors below to read it, since upstream may send 0.185 or 18.5 for the
/// same share.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryShare {
    #[serde(default)]
    pub country: String,
    #[serde(alias = "share", default, deserialize_with = "lenient::f64_or_zero")]
    pub share_ratio: f64,
    #[serde(alias = "change", default, deserialize_with = "lenient::f64_or_zero")]
    pub change_percent: f64,
}

impl CountryShare {
    pub fn share_percent(&self) -> f64 {
        normalize::share_percent(self.share_ratio)
    }

    pub fn bar_width(&self) -> f64 {
        normalize::bar_width(self.share_ratio)
    }

    pub fn display_share(&self) -> String {
        normalize::format_share(self.share_ratio)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[serde(alias = "Critical", alias = "CRITICAL")]
    Critical,
    #[serde(alias = "Warning", alias = "WARNING")]
    Warning,
    #[default]
    #[serde(alias = "Info", alias = "INFO")]
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoIssue {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(alias = "fix", default)]
    pub fix_recommendation: String,
}

/// Which upstream the report's issue list came from. The two are never mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IssueOrigin {
    PerformanceProbe,
    MarketResearch,
}

/// Provenance for a search-grounded claim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub uri: String,
}

/// A grounding citation as returned by the research provider; either half may
/// be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroundingCitation {
    pub title: Option<String>,
    pub uri: Option<String>,
}

/// Raw output of the market-research query before parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResearchResponse {
    pub text: Option<String>,
    pub citations: Vec<GroundingCitation>,
}

/// Deserializers that absorb data-quality anomalies instead of failing the
/// whole document.
pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn number_from_value(value: &Value) -> Option<f64> {
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s
                .trim()
                .trim_end_matches('%')
                .replace(',', "")
                .trim()
                .parse::<f64>()
                .ok(),
            _ => None,
        };
        parsed.filter(|n| n.is_finite())
    }

    pub fn f64_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(number_from_value(&value).unwrap_or(0.0))
    }

    pub fn u64_or_zero<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let n = f64_or_zero(deserializer)?;
        Ok(if n > 0.0 { n.round() as u64 } else { 0 })
    }

    pub fn optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }
}
