use httpmock::prelude::*;
use serde_json::json;
use site_audit::domain::model::{IssueOrigin, Severity};
use site_audit::{AuditConfig, AuditEngine, AuditError};
use std::io::Write;
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;

const PAGESPEED_PATH: &str = "/pagespeedonline/v5/runPagespeed";
const GEMINI_PATH: &str = "/v1beta/models/gemini-test:generateContent";

fn config_for(server: &MockServer, api_key: Option<&str>, probe_timeout_ms: u64) -> AuditConfig {
    let mut config = AuditConfig::default();
    config.probe.endpoint = server.url(PAGESPEED_PATH);
    config.probe.timeout_ms = probe_timeout_ms;
    config.research.endpoint = server.url("/v1beta");
    config.research.model = "gemini-test".to_string();
    config.research.api_key = api_key.map(str::to_string);
    config
}

fn gemini_envelope(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": { "parts": [ { "text": text } ] },
            "groundingMetadata": {
                "groundingChunks": [
                    { "web": { "uri": "https://www.similarweb.com/website/example.com/", "title": "similarweb.com" } },
                    { "web": { "title": "missing uri" } }
                ]
            }
        }]
    })
}

fn research_payload(fallback_issue_count: usize) -> String {
    let issues: Vec<serde_json::Value> = (0..fallback_issue_count)
        .map(|i| {
            let severity = if i % 2 == 0 { "critical" } else { "info" };
            json!({
                "id": format!("ai-{}", i),
                "severity": severity,
                "title": format!("Issue {}", i),
                "description": "From research",
                "fix": "Follow best practices"
            })
        })
        .collect();

    let payload = json!({
        "overallScore": 88,
        "globalRank": 1520,
        "engagement": { "bounceRate": "32.55%", "pagesPerVisit": "3.79", "avgVisitDuration": "06:31" },
        "trafficHistory": [
            { "month": "May", "visits": 5400000000u64 },
            { "month": "Jun", "visits": 5500000000u64 }
        ],
        "marketingChannels": [ { "name": "Direct", "value": 61.2 } ],
        "topKeywords": [ { "keyword": "example", "volume": 90500, "position": 3, "difficulty": 71 } ],
        "topCountries": [
            { "country": "US", "share": 0.42, "change": 3 },
            { "country": "IN", "share": 18.5, "change": -1 }
        ],
        "summary": "Example is a large reference site.",
        "fallbackIssues": issues
    });
    format!("```json\n{}\n```", payload)
}

fn lighthouse_document() -> serde_json::Value {
    json!({
        "lighthouseResult": {
            "audits": {
                "cumulative-layout-shift": {
                    "id": "cumulative-layout-shift", "title": "Cumulative Layout Shift",
                    "score": 0.3, "displayValue": "0.41"
                },
                "interactive": {
                    "id": "interactive", "title": "Time to Interactive",
                    "score": 0.95, "displayValue": "1.9 s"
                },
                "server-response-time": {
                    "id": "server-response-time", "title": "Initial server response time",
                    "score": 0.7, "displayValue": "Root document took 740 ms"
                }
            }
        }
    })
}

#[tokio::test]
async fn test_end_to_end_with_both_sources() {
    let server = MockServer::start();
    let probe_mock = server.mock(|when, then| {
        when.method(GET)
            .path(PAGESPEED_PATH)
            .query_param("url", "https://example.com")
            .query_param("strategy", "mobile");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(lighthouse_document());
    });
    let research_mock = server.mock(|when, then| {
        when.method(POST)
            .path(GEMINI_PATH)
            .header("x-goog-api-key", "test-key")
            .body_contains("google_search")
            .body_contains("responseSchema");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(gemini_envelope(&research_payload(3)));
    });

    let engine = AuditEngine::from_config(&config_for(&server, Some("test-key"), 2000));
    let report = engine.produce_audit_report("example.com").await.unwrap();

    probe_mock.assert();
    research_mock.assert();

    assert_eq!(report.target, "https://example.com");
    assert_eq!(report.overall_score, 88);
    assert_eq!(report.global_rank, Some(1520));
    assert_eq!(
        report.engagement.as_ref().and_then(|e| e.avg_visit_duration.as_deref()),
        Some("06:31")
    );
    assert_eq!(report.traffic_history[1].visit_count, 5_500_000_000);
    assert_eq!(report.traffic_history[1].period, "Jun");
    assert_eq!(report.device_distribution[0].label, "Mobile");
    assert_eq!(report.marketing_channels[0].label, "Direct");
    assert_eq!(report.top_keywords[0].position, 3);
    assert_eq!(report.top_countries[0].display_share(), "42.00%");
    assert_eq!(report.top_countries[1].display_share(), "18.50%");
    assert_eq!(report.summary, "Example is a large reference site.");

    assert_eq!(report.issue_origin, IssueOrigin::PerformanceProbe);
    let ids: Vec<&str> = report.seo_issues.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["cumulative-layout-shift", "server-response-time"]);
    assert_eq!(report.seo_issues[0].severity, Severity::Critical);
    assert_eq!(report.seo_issues[1].severity, Severity::Warning);
    assert!(report.seo_issues.iter().all(|i| !i.id.starts_with("ai-")));

    assert_eq!(report.sources.len(), 1);
    assert_eq!(report.sources[0].title, "similarweb.com");
}

#[tokio::test]
async fn test_probe_failure_uses_capped_fallback_issues() {
    let server = MockServer::start();
    let probe_mock = server.mock(|when, then| {
        when.method(GET).path(PAGESPEED_PATH);
        then.status(500);
    });
    server.mock(|when, then| {
        when.method(POST).path(GEMINI_PATH);
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(gemini_envelope(&research_payload(15)));
    });

    let engine = AuditEngine::from_config(&config_for(&server, Some("test-key"), 2000));
    let report = engine.produce_audit_report("example.com").await.unwrap();

    probe_mock.assert();
    assert_eq!(report.issue_origin, IssueOrigin::MarketResearch);
    assert_eq!(report.seo_issues.len(), 12);
    assert_eq!(report.seo_issues[0].id, "ai-0");
    assert_eq!(report.seo_issues[0].severity, Severity::Critical);
    assert_eq!(report.seo_issues[1].severity, Severity::Info);
    assert_eq!(report.seo_issues[11].id, "ai-11");
}

#[tokio::test]
async fn test_probe_timeout_does_not_hang_the_audit() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(PAGESPEED_PATH);
        then.status(200)
            .delay(Duration::from_secs(3))
            .json_body(lighthouse_document());
    });
    server.mock(|when, then| {
        when.method(POST).path(GEMINI_PATH);
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(gemini_envelope(&research_payload(2)));
    });

    let engine = AuditEngine::from_config(&config_for(&server, Some("test-key"), 200));
    let started = Instant::now();
    let report = engine.produce_audit_report("example.com").await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(report.issue_origin, IssueOrigin::MarketResearch);
    let ids: Vec<&str> = report.seo_issues.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["ai-0", "ai-1"]);
}

#[tokio::test]
async fn test_research_provider_error_fails_the_audit() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(PAGESPEED_PATH);
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(lighthouse_document());
    });
    server.mock(|when, then| {
        when.method(POST).path(GEMINI_PATH);
        then.status(503)
            .header("Content-Type", "application/json")
            .json_body(json!({"error": {"code": 503, "message": "The model is overloaded."}}));
    });

    let engine = AuditEngine::from_config(&config_for(&server, Some("test-key"), 2000));
    let err = engine.produce_audit_report("example.com").await.unwrap_err();

    match &err {
        AuditError::ProviderError { status, message, .. } => {
            assert_eq!(*status, 503);
            assert_eq!(message, "The model is overloaded.");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(
        err.user_friendly_message(),
        "Failed to audit. Please check your API key or try again."
    );
}

#[tokio::test]
async fn test_missing_api_key_fails_without_calling_research() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(PAGESPEED_PATH);
        then.status(200).json_body(lighthouse_document());
    });
    let research_mock = server.mock(|when, then| {
        when.method(POST).path(GEMINI_PATH);
        then.status(200).json_body(gemini_envelope("{}"));
    });

    let engine = AuditEngine::from_config(&config_for(&server, None, 2000));
    let err = engine.produce_audit_report("example.com").await.unwrap_err();

    assert!(matches!(err, AuditError::MissingCredential { .. }));
    research_mock.assert_hits(0);
}

#[tokio::test]
async fn test_broken_research_json_degrades_to_defaults() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(PAGESPEED_PATH);
        then.status(404);
    });
    server.mock(|when, then| {
        when.method(POST).path(GEMINI_PATH);
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(gemini_envelope("```json\n{\"overallScore\": 77, \"summary\": \n```"));
    });

    let engine = AuditEngine::from_config(&config_for(&server, Some("test-key"), 2000));
    let report = tokio_test::assert_ok!(engine.produce_audit_report("example.com").await);

    assert_eq!(report.overall_score, 50);
    assert_eq!(report.summary, "Analysis complete for https://example.com");
    assert!(report.traffic_history.is_empty());
    assert_eq!(report.device_distribution.len(), 2);
    assert_eq!(report.device_distribution[1].label, "Desktop");
    assert_eq!(report.device_distribution[1].value, 40.0);
    assert!(report.seo_issues.is_empty());
    assert_eq!(report.sources.len(), 1);
}

#[tokio::test]
async fn test_engine_from_config_file() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET)
            .path(PAGESPEED_PATH)
            .query_param("strategy", "desktop");
        then.status(200).json_body(json!({"lighthouseResult": {"audits": {}}}));
    });
    let research_mock = server.mock(|when, then| {
        when.method(POST)
            .path(GEMINI_PATH)
            .header("x-goog-api-key", "file-key");
        then.status(200).json_body(gemini_envelope("{\"summary\":\"ok\"}"));
    });

    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[probe]
endpoint = "{}"
strategy = "desktop"
timeout_ms = 2000

[research]
endpoint = "{}"
model = "gemini-test"
api_key = "file-key"
"#,
        server.url(PAGESPEED_PATH),
        server.url("/v1beta")
    )
    .unwrap();

    let config = AuditConfig::from_file(file.path()).unwrap();
    let report = AuditEngine::from_config(&config)
        .produce_audit_report("https://example.com")
        .await
        .unwrap();

    research_mock.assert();
    assert_eq!(report.summary, "ok");
    assert_eq!(report.issue_origin, IssueOrigin::PerformanceProbe);
    assert!(report.seo_issues.is_empty());
}

#[tokio::test]
async fn test_report_json_shape() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(PAGESPEED_PATH);
        then.status(500);
    });
    server.mock(|when, then| {
        when.method(POST).path(GEMINI_PATH);
        then.status(200).json_body(gemini_envelope(&research_payload(1)));
    });

    let engine = AuditEngine::from_config(&config_for(&server, Some("test-key"), 2000));
    let report = engine.produce_audit_report("example.com").await.unwrap();
    let value = serde_json::to_value(&report).unwrap();

    assert_eq!(value["overallScore"], 88);
    assert_eq!(value["issueOrigin"], "marketResearch");
    assert_eq!(value["seoIssues"][0]["fixRecommendation"], "Follow best practices");
    assert_eq!(value["topCountries"][0]["shareRatio"], 0.42);
    assert_eq!(value["trafficHistory"][0]["visitCount"], 5_400_000_000u64);
    assert_eq!(value["deviceDistribution"][0]["colorHint"], "#3b82f6");
    assert!(value["generatedAt"].is_string());
}
