use crate::domain::model::{GroundingCitation, ResearchResponse};
use crate::domain::ports::MarketResearch;
use crate::utils::error::{AuditError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-pro-preview";
const PROVIDER: &str = "Gemini";

/// Search-grounded structured generation against the Gemini REST API.
pub struct GeminiResearcher {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout: Option<Duration>,
}

impl GeminiResearcher {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            model: model.into(),
            api_key,
            timeout: None,
        }
    }

    /// Bounds the whole call. Unset by default; the provider's own limits apply.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn request_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }

    async fn generate(&self, api_key: &str, url: &str) -> Result<ResearchResponse> {
        tracing::debug!("Sending research request for {} to model {}", url, self.model);

        let response = self
            .client
            .post(self.request_url())
            .header("x-goog-api-key", api_key)
            .json(&build_request_body(url))
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Research response status: {}", status);
        let body = response.text().await?;

        if !status.is_success() {
            return Err(AuditError::ProviderError {
                provider: PROVIDER.to_string(),
                status: status.as_u16(),
                message: provider_error_message(&body),
            });
        }

        let envelope: GenerateContentResponse = serde_json::from_str(&body)?;
        Ok(envelope.into_research_response())
    }
}

#[async_trait]
impl MarketResearch for GeminiResearcher {
    async fn research(&self, url: &str) -> Result<ResearchResponse> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AuditError::MissingCredential {
                provider: PROVIDER.to_string(),
            })?;

        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.generate(api_key, url))
                .await
                .map_err(|_| AuditError::TimeoutError {
                    provider: PROVIDER.to_string(),
                    timeout: limit,
                })?,
            None => self.generate(api_key, url).await,
        }
    }
}

pub fn build_prompt(url: &str) -> String {
    format!(
        r#"You are a professional website auditor.
Task: produce a market analysis for the domain {url}.

Use Google Search to find the most recent public third-party estimates (SimilarWeb, Semrush, Ahrefs or similar) for:
1. Traffic: current monthly visits and total visits over the last 3 months.
2. Engagement: bounce rate, pages per visit, average visit duration.
3. Rank: global rank.
4. Geography: top countries and their share of traffic.
5. Keywords: top organic keywords and their estimated positions.

Return a single JSON object that matches the response schema.

Formatting rules:
- trafficHistory: six months ending with the current month. Values are absolute visit counts on the stated scale; a site with ~5.5B monthly visits has values near 5500000000.
- topCountries: share is a fraction between 0 and 1 (0.19 means 19%). Never return whole-number percentages.
- topKeywords: positions must be realistic and varied (#1, #2, #3, #4-10 ...), not all #1.
- engagement: strings exactly as published, e.g. "32.55%", "06:31", "3.79".

If technical SEO data is unavailable, provide fallbackIssues."#
    )
}

/// Output schema for the research call. Field names match the canonical
/// report's upstream aliases.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "overallScore": { "type": "NUMBER", "description": "Domain Authority Score (0-100)" },
            "globalRank": { "type": "NUMBER" },
            "engagement": {
                "type": "OBJECT",
                "properties": {
                    "bounceRate": { "type": "STRING" },
                    "pagesPerVisit": { "type": "STRING" },
                    "avgVisitDuration": { "type": "STRING" }
                }
            },
            "trafficHistory": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "month": { "type": "STRING" },
                        "visits": { "type": "NUMBER" }
                    }
                }
            },
            "deviceDistribution": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": { "type": "STRING" },
                        "value": { "type": "NUMBER" },
                        "fill": { "type": "STRING" }
                    }
                }
            },
            "marketingChannels": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": { "type": "STRING" },
                        "value": { "type": "NUMBER" }
                    }
                }
            },
            "topKeywords": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "keyword": { "type": "STRING" },
                        "volume": { "type": "NUMBER" },
                        "position": { "type": "NUMBER" },
                        "difficulty": { "type": "NUMBER" }
                    }
                }
            },
            "topCountries": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "country": { "type": "STRING" },
                        "share": { "type": "NUMBER" },
                        "change": { "type": "NUMBER" }
                    }
                }
            },
            "summary": { "type": "STRING" },
            "fallbackIssues": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "id": { "type": "STRING" },
                        "severity": { "type": "STRING", "enum": ["critical", "warning", "info"] },
                        "title": { "type": "STRING" },
                        "description": { "type": "STRING" },
                        "fix": { "type": "STRING" }
                    }
                }
            }
        },
        "required": ["trafficHistory", "topKeywords", "summary", "overallScore", "engagement"]
    })
}

pub fn build_request_body(url: &str) -> Value {
    json!({
        "contents": [
            { "role": "user", "parts": [ { "text": build_prompt(url) } ] }
        ],
        "tools": [ { "google_search": {} } ],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": response_schema()
        }
    })
}

fn provider_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.pointer("/error/message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.chars().take(200).collect())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Default, Deserialize)]
struct GroundingChunk {
    #[serde(default)]
    web: Option<WebChunk>,
}

#[derive(Debug, Default, Deserialize)]
struct WebChunk {
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

impl GenerateContentResponse {
    /// Only the first candidate is used. Its text parts are concatenated since
    /// grounded answers may arrive split across parts.
    fn into_research_response(self) -> ResearchResponse {
        let Some(candidate) = self.candidates.into_iter().next() else {
            return ResearchResponse::default();
        };

        let texts: Vec<String> = candidate
            .content
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        let text = if texts.is_empty() {
            None
        } else {
            Some(texts.concat())
        };

        let citations = candidate
            .grounding_metadata
            .map(|metadata| {
                metadata
                    .grounding_chunks
                    .into_iter()
                    .filter_map(|chunk| chunk.web)
                    .map(|web| GroundingCitation {
                        title: web.title,
                        uri: web.uri,
                    })
                    .collect()
            })
            .unwrap_or_default();

        ResearchResponse { text, citations }
    }
}
