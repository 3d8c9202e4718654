//! End-to-end runs of `RadarEngine::run_analysis` against mock sites, a mock
//! search/performance API and a mock completion endpoint.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use radar_core::{normalize_site, InsightSource, Position, ThreatLevel};
use radar_engine::{
    analyze_site, AnalyzeOptions, InsightClient, Providers, RadarEngine, RadarError, RunOptions,
};
use radar_providers::{names, PageFetcher, PageSpeedClient, SerpClient, SitemapClient};

const UA: &str = "radar-test/0.1";

const SUBJECT_HTML: &str = r#"<html><head>
<title>Acme Forecasting</title>
<meta name="description" content="Revenue forecasting for SaaS teams">
<script type="application/ld+json">{"@context":"https://schema.org","@type":"Organization","name":"Acme","sameAs":["https://twitter.com/acme"]}</script>
</head><body>
<h1>Forecast revenue with confidence</h1>
<p>Trusted by five hundred finance teams. Start your free trial today.</p>
<a href="/blog">Blog</a> <a href="/pricing">Pricing</a>
<img src="/dashboard.png" alt="Dashboard">
</body></html>"#;

const SITEMAP: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://acme.io/</loc></url>
  <url><loc>https://acme.io/blog/launch</loc></url>
  <url><loc>https://acme.io/pricing</loc></url>
</urlset>"#;

async fn healthy_site() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SUBJECT_HTML))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SITEMAP))
        .mount(&server)
        .await;
    server
}

async fn broken_site() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    server
}

async fn vendor_api() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/runPagespeed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "lighthouseResult": {
                "categories": {"performance": {"score": 0.8}},
                "audits": {"largest-contentful-paint": {"numericValue": 2100.0}}
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "search_information": {"total_results": 120},
            "organic_results": [{"position": 1, "title": "Acme | Forecasting", "link": "http://127.0.0.1/"}]
        })))
        .mount(&server)
        .await;
    server
}

fn providers(api: &MockServer, serp_key: Option<&str>) -> Providers {
    Providers {
        fetcher: PageFetcher::new(5, UA, 0, 1).expect("fetcher"),
        sitemap: SitemapClient::new(5, UA, 0, 1).expect("sitemap client"),
        performance: PageSpeedClient::with_base_url(None, 5, UA, &api.uri())
            .expect("pagespeed client"),
        serp: SerpClient::with_base_url(serp_key, 5, UA, &api.uri()).expect("serp client"),
    }
}

fn insight_client(llm: &MockServer, api_key: Option<&str>, timeout_secs: u64) -> InsightClient {
    InsightClient::with_base_url(api_key, "gpt-test", timeout_secs, UA, &llm.uri())
        .expect("insight client")
}

#[tokio::test]
async fn quick_run_survives_a_failed_competitor() {
    let subject = healthy_site().await;
    let broken = broken_site().await;
    let healthy = healthy_site().await;
    let api = vendor_api().await;
    let llm = MockServer::start().await;

    let engine = RadarEngine::new(providers(&api, Some("serp-key")), insight_client(&llm, None, 5));
    let report = engine
        .run_analysis(
            &subject.uri(),
            &[broken.uri(), healthy.uri()],
            &RunOptions {
                quick: true,
                keywords: vec![],
            },
        )
        .await
        .expect("run should complete");

    let me = &report.your_site;
    assert!(me.content.is_some());
    assert!(me.tech.is_some());
    assert!(me.business.is_some());
    assert!(me.structure.is_some());
    assert!(me.performance.is_none() && me.seo.is_none());
    assert!(me.raw_data.html_fetched && me.raw_data.sitemap_found);

    // The unreachable competitor keeps its slot, with every sub-record absent.
    assert_eq!(report.competitors.len(), 2);
    assert_eq!(report.competitors[0].populated_dimensions(), 0);
    assert!(!report.competitors[0].raw_data.html_fetched);
    assert_eq!(report.competitors[1].populated_dimensions(), 4);

    // Quick mode attempts five providers for a fetched site and two for a
    // site whose landing page failed.
    let summary = &report.provider_summary;
    assert!(!summary.contains_key(names::PERFORMANCE));
    assert!(!summary.contains_key(names::SEO));
    assert_eq!(summary[names::PAGE_FETCH].success, 2);
    assert_eq!(summary[names::PAGE_FETCH].failed, 1);
    assert_eq!(summary[names::STRUCTURE].invocations(), 3);
    assert_eq!(summary[names::CONTENT].invocations(), 2);
    let total: u32 = summary.values().map(|s| s.invocations()).sum();
    assert_eq!(total, 12);

    let domains: Vec<&str> = report.scores.iter().map(|s| s.domain.as_str()).collect();
    assert_eq!(domains[0], me.domain);
    assert!(report.scores[1].composite.abs() < f64::EPSILON);
    assert!((report.scores[2].composite - report.scores[0].composite).abs() < f64::EPSILON);
    assert!(matches!(
        report.overall_position,
        Position::Leading | Position::Competitive
    ));

    let insights = report.ai_insights.as_ref().expect("insights attached");
    assert_eq!(insights.source, InsightSource::Fallback);
    assert!(!insights.action_items.is_empty());
    assert_eq!(report.summary().competitor_count, 2);
}

#[tokio::test]
async fn one_unreachable_competitor_of_five_leaves_the_rest_intact() {
    let subject = healthy_site().await;
    let mut rivals = Vec::new();
    for i in 0..5 {
        rivals.push(if i == 2 {
            broken_site().await
        } else {
            healthy_site().await
        });
    }
    let api = vendor_api().await;
    let llm = MockServer::start().await;

    let engine = RadarEngine::new(providers(&api, Some("serp-key")), insight_client(&llm, None, 5));
    let competitor_uris: Vec<String> = rivals.iter().map(MockServer::uri).collect();
    let report = engine
        .run_analysis(&subject.uri(), &competitor_uris, &RunOptions::default())
        .await
        .expect("run should complete");

    assert_eq!(report.competitors.len(), 5);
    for (i, rival) in report.competitors.iter().enumerate() {
        if i == 2 {
            assert!(!rival.raw_data.html_fetched);
            assert!(rival.content.is_none() && rival.tech.is_none());
            assert!(rival.business.is_none() && rival.structure.is_none());
            // Vendor-backed providers do not depend on the landing page.
            assert_eq!(rival.populated_dimensions(), 2);
        } else {
            assert_eq!(rival.populated_dimensions(), 6, "competitor {i}");
        }
    }
    assert_eq!(report.scores.len(), 6);
    assert!(report.scores[3].composite < report.scores[1].composite);

    // Seven providers per reachable site, four for the unreachable one.
    let summary = &report.provider_summary;
    let total: u32 = summary.values().map(|s| s.invocations()).sum();
    assert_eq!(total, 5 * 7 + 4);
    assert_eq!(summary[names::PAGE_FETCH].invocations(), 6);
    assert_eq!(summary[names::PAGE_FETCH].failed, 1);
    assert_eq!(summary[names::CONTENT].invocations(), 5);
    assert_eq!(summary[names::PERFORMANCE].success, 6);
    assert_eq!(summary[names::SEO].success, 6);
    assert_eq!(summary[names::STRUCTURE].success, 5);
    assert_eq!(summary[names::STRUCTURE].failed, 1);
    assert_eq!(report.summary().competitor_count, 5);
}

#[tokio::test]
async fn full_run_includes_network_providers_for_every_site() {
    let subject = healthy_site().await;
    let competitor = broken_site().await;
    let api = vendor_api().await;
    let llm = MockServer::start().await;

    let engine = RadarEngine::new(providers(&api, Some("serp-key")), insight_client(&llm, None, 5));
    let report = engine
        .run_analysis(&subject.uri(), &[competitor.uri()], &RunOptions::default())
        .await
        .expect("run should complete");

    assert!(report.your_site.performance.is_some());
    assert!(report.your_site.seo.is_some());
    // Network-bound providers run even when the landing page fails.
    let rival = &report.competitors[0];
    assert!(rival.content.is_none());
    assert!(rival.performance.is_some());
    assert_eq!(report.provider_summary[names::PERFORMANCE].success, 2);
    assert_eq!(report.provider_summary[names::SEO].success, 2);
}

#[tokio::test]
async fn slow_completion_falls_back_to_deterministic_insights() {
    let subject = healthy_site().await;
    let competitor = broken_site().await;
    let api = vendor_api().await;
    let llm = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(3))
                .set_body_json(json!({"choices": [{"message": {"content": "{}"}}]})),
        )
        .mount(&llm)
        .await;

    let engine = RadarEngine::new(
        providers(&api, None),
        insight_client(&llm, Some("sk-test"), 1),
    );
    let report = engine
        .run_analysis(
            &subject.uri(),
            &[competitor.uri()],
            &RunOptions {
                quick: true,
                keywords: vec![],
            },
        )
        .await
        .expect("run should complete");

    let insights = report.ai_insights.expect("insights attached");
    assert_eq!(insights.source, InsightSource::Fallback);
    assert!(!insights.positioning.is_empty());
    assert!(!insights.strengths.is_empty());
    assert!(!insights.opportunities.is_empty());
    assert_eq!(insights.competitor_threats.len(), 1);
}

async fn run_with_failing_completion(llm_response: ResponseTemplate) -> radar_core::AiInsights {
    let subject = healthy_site().await;
    let competitor = healthy_site().await;
    let api = vendor_api().await;
    let llm = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(llm_response)
        .expect(1)
        .mount(&llm)
        .await;

    let engine = RadarEngine::new(
        providers(&api, None),
        insight_client(&llm, Some("sk-test"), 5),
    );
    let report = engine
        .run_analysis(
            &subject.uri(),
            &[competitor.uri()],
            &RunOptions {
                quick: true,
                keywords: vec![],
            },
        )
        .await
        .expect("run should complete");
    report.ai_insights.expect("insights attached")
}

#[tokio::test]
async fn completion_server_error_falls_back() {
    let insights = run_with_failing_completion(ResponseTemplate::new(500)).await;
    assert_eq!(insights.source, InsightSource::Fallback);
    assert!(!insights.positioning.is_empty());
    assert!(!insights.action_items.is_empty());
}

#[tokio::test]
async fn non_json_completion_content_falls_back() {
    let body = json!({
        "choices": [{
            "message": {"role": "assistant", "content": "Sorry, I cannot help with that."}
        }]
    });
    let insights =
        run_with_failing_completion(ResponseTemplate::new(200).set_body_json(body)).await;
    assert_eq!(insights.source, InsightSource::Fallback);
    assert!(!insights.weaknesses.is_empty());
    assert_eq!(insights.competitor_threats.len(), 1);
}

#[tokio::test]
async fn completion_is_used_when_available() {
    let subject = healthy_site().await;
    let competitor = broken_site().await;
    let api = vendor_api().await;
    let llm = MockServer::start().await;
    let completion = json!({
        "positioning": "Acme leads a thin field.",
        "threatLevel": "low",
        "strengths": ["Clear pricing"],
        "actionItems": [{"priority": "high", "action": "Publish weekly", "rationale": "Own the category"}]
    });
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": completion.to_string()}}]
        })))
        .expect(1)
        .mount(&llm)
        .await;

    let engine = RadarEngine::new(
        providers(&api, None),
        insight_client(&llm, Some("sk-test"), 5),
    );
    let report = engine
        .run_analysis(
            &subject.uri(),
            &[competitor.uri()],
            &RunOptions {
                quick: true,
                keywords: vec![],
            },
        )
        .await
        .expect("run should complete");

    let insights = report.ai_insights.expect("insights attached");
    assert_eq!(insights.source, InsightSource::Llm);
    assert_eq!(insights.positioning, "Acme leads a thin field.");
    assert_eq!(insights.threat_level, ThreatLevel::Low);
    assert!(insights.weaknesses.is_empty());
    assert_eq!(insights.action_items[0].action, "Publish weekly");
}

#[tokio::test]
async fn contract_violations_fail_before_any_request() {
    let subject = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&subject)
        .await;
    let api = MockServer::start().await;
    let llm = MockServer::start().await;

    let engine = RadarEngine::new(providers(&api, None), insight_client(&llm, None, 5));

    let err = engine
        .run_analysis(&subject.uri(), &[], &RunOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, RadarError::InvalidRequest(_)), "got {err:?}");

    let too_many: Vec<String> = (0..6).map(|i| format!("rival{i}.io")).collect();
    let err = engine
        .run_analysis(&subject.uri(), &too_many, &RunOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, RadarError::InvalidRequest(_)), "got {err:?}");
}

#[tokio::test]
async fn sub_records_match_provider_outcomes() {
    let site_server = healthy_site().await;
    let api = vendor_api().await;
    // No search credential: the seo provider fails while performance succeeds.
    let providers = providers(&api, None);
    let site = normalize_site(&site_server.uri()).unwrap();

    let analysis = analyze_site(&providers, &site, &AnalyzeOptions::default()).await;

    assert_eq!(analysis.statuses.len(), 7);
    for status in &analysis.statuses {
        let present = match status.name.as_str() {
            names::PAGE_FETCH => analysis.intel.raw_data.html_fetched,
            names::CONTENT => analysis.intel.content.is_some(),
            names::TECH => analysis.intel.tech.is_some(),
            names::BUSINESS => analysis.intel.business.is_some(),
            names::STRUCTURE => analysis.intel.structure.is_some(),
            names::PERFORMANCE => analysis.intel.performance.is_some(),
            names::SEO => analysis.intel.seo.is_some(),
            other => panic!("unexpected provider {other}"),
        };
        assert_eq!(status.success, present, "provider {}", status.name);
        assert_eq!(status.error.is_some(), !status.success);
    }
    assert!(analysis.intel.seo.is_none());
    assert!(analysis.intel.performance.is_some());
}
