use crate::domain::model::{
    lenient, ChannelShare, CountryShare, DeviceShare, EngagementMetrics, GroundingCitation,
    KeywordRanking, SeoIssue, Source, TrafficPoint,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Structured view of the market-research answer. Every field is optional;
/// absence is resolved by the fusion step, not here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AiResult {
    pub overall_score: Option<f64>,
    pub global_rank: Option<f64>,
    pub engagement: Option<EngagementMetrics>,
    pub traffic_history: Option<Vec<TrafficPoint>>,
    pub device_distribution: Option<Vec<DeviceShare>>,
    pub marketing_channels: Option<Vec<ChannelShare>>,
    pub top_keywords: Option<Vec<KeywordRanking>>,
    pub top_countries: Option<Vec<CountryShare>>,
    pub summary: Option<String>,
    pub fallback_issues: Option<Vec<SeoIssue>>,
}

impl AiResult {
    /// Reads each field on its own so one malformed field does not take the
    /// rest of the document down with it.
    pub fn from_object(object: &Map<String, Value>) -> Self {
        Self {
            overall_score: number_field(object, "overallScore"),
            global_rank: number_field(object, "globalRank"),
            engagement: object_field(object, "engagement"),
            traffic_history: list_field(object, "trafficHistory"),
            device_distribution: list_field(object, "deviceDistribution"),
            marketing_channels: list_field(object, "marketingChannels"),
            top_keywords: list_field(object, "topKeywords"),
            top_countries: list_field(object, "topCountries"),
            summary: object.get("summary").and_then(Value::as_str).map(str::to_string),
            fallback_issues: list_field(object, "fallbackIssues"),
        }
    }
}

/// Result of parsing the research payload. Parsing never fails outright: a
/// broken payload yields `Empty` together with the reason.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Parsed(AiResult),
    Empty { diagnostic: String },
}

impl ParseOutcome {
    pub fn is_parsed(&self) -> bool {
        matches!(self, ParseOutcome::Parsed(_))
    }

    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            ParseOutcome::Parsed(_) => None,
            ParseOutcome::Empty { diagnostic } => Some(diagnostic),
        }
    }

    pub fn into_result(self) -> AiResult {
        match self {
            ParseOutcome::Parsed(result) => result,
            ParseOutcome::Empty { .. } => AiResult::default(),
        }
    }
}

/// Removes ```` ```json ```` or bare ```` ``` ```` wrappers, nested ones
/// included. Unwrapped input comes back trimmed but otherwise untouched.
pub fn strip_code_fence(raw: &str) -> &str {
    let mut current = raw.trim();
    loop {
        let inner = if let Some(rest) = current.strip_prefix("```json") {
            rest
        } else if let Some(rest) = current.strip_prefix("```") {
            rest
        } else {
            return current;
        };
        current = inner.strip_suffix("```").unwrap_or(inner).trim();
    }
}

pub fn parse_ai_payload(raw: Option<&str>) -> ParseOutcome {
    let outcome = match raw {
        None => ParseOutcome::Empty {
            diagnostic: "research response carried no text".to_string(),
        },
        Some(text) => match serde_json::from_str::<Value>(strip_code_fence(text)) {
            Ok(Value::Object(object)) => ParseOutcome::Parsed(AiResult::from_object(&object)),
            Ok(other) => ParseOutcome::Empty {
                diagnostic: format!("expected a JSON object, got {}", json_kind(&other)),
            },
            Err(e) => ParseOutcome::Empty {
                diagnostic: format!("failed to parse research JSON: {}", e),
            },
        },
    };

    if let Some(diagnostic) = outcome.diagnostic() {
        tracing::warn!("⚠️ {}; falling back to defaults", diagnostic);
    }
    outcome
}

/// Keeps citations that carry both a title and a URI, dropping exact repeats.
pub fn extract_sources(citations: &[GroundingCitation]) -> Vec<Source> {
    let mut sources: Vec<Source> = Vec::new();
    for citation in citations {
        let (Some(title), Some(uri)) = (citation.title.as_deref(), citation.uri.as_deref()) else {
            continue;
        };
        if title.is_empty() || uri.is_empty() {
            continue;
        }
        let source = Source {
            title: title.to_string(),
            uri: uri.to_string(),
        };
        if !sources.contains(&source) {
            sources.push(source);
        }
    }
    sources
}

fn number_field(object: &Map<String, Value>, key: &str) -> Option<f64> {
    let value = object.get(key)?;
    let number = lenient::number_from_value(value);
    if number.is_none() && !value.is_null() {
        tracing::debug!("Ignoring non-numeric '{}': {}", key, value);
    }
    number
}

fn object_field<T: DeserializeOwned>(object: &Map<String, Value>, key: &str) -> Option<T> {
    let value = object.get(key)?;
    if value.is_null() {
        return None;
    }
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::debug!("Ignoring malformed '{}': {}", key, e);
            None
        }
    }
}

fn list_field<T: DeserializeOwned>(object: &Map<String, Value>, key: &str) -> Option<Vec<T>> {
    match object.get(key)? {
        Value::Array(items) => {
            let parsed: Vec<T> = items
                .iter()
                .filter_map(|item| match serde_json::from_value(item.clone()) {
                    Ok(parsed) => Some(parsed),
                    Err(e) => {
                        tracing::debug!("Dropping malformed '{}' entry: {}", key, e);
                        None
                    }
                })
                .collect();
            Some(parsed)
        }
        Value::Null => None,
        other => {
            tracing::debug!("Ignoring '{}': expected a list, got {}", key, json_kind(other));
            None
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
