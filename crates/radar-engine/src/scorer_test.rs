use radar_core::{
    ContentIntelligence, PerformanceIntelligence, SecurityPosture, StructureIntelligence,
    TechIntelligence,
};

use super::*;

fn empty(domain: &str) -> CompetitorIntel {
    CompetitorIntel::empty(format!("https://{domain}"), domain)
}

fn with_performance(domain: &str, mobile: u8, desktop: u8) -> CompetitorIntel {
    let mut intel = empty(domain);
    intel.performance = Some(PerformanceIntelligence {
        mobile_score: mobile,
        desktop_score: desktop,
        largest_contentful_paint_ms: None,
        input_delay_ms: None,
        cumulative_layout_shift: None,
        grade: 'A',
    });
    intel
}

fn maxed_content() -> ContentIntelligence {
    ContentIntelligence {
        title: None,
        meta_description: None,
        word_count: 50_000,
        headings: vec![],
        internal_links: 0,
        external_links: 0,
        image_alt_coverage: 1.0,
        has_blog: true,
        has_pricing: true,
        has_social_proof: true,
        cta_density: CtaDensity::Strong,
    }
}

fn maxed_tech() -> TechIntelligence {
    TechIntelligence {
        cms: None,
        framework: Some("Next.js".to_string()),
        analytics: vec!["Plausible".to_string()],
        marketing: vec!["HubSpot".to_string()],
        cdn: None,
        hosting: None,
        ecommerce: None,
        security: SecurityPosture {
            https: true,
            hsts: true,
            hardening_headers: 5,
        },
    }
}

fn maxed_structure() -> StructureIntelligence {
    StructureIntelligence {
        total_pages: 10_000,
        blog_pages: 400,
        product_pages: 0,
        categories: vec![],
        last_updated: None,
        update_frequency: UpdateFrequency::Daily,
        freshness: FreshnessTier::Fresh,
        sitemap_urls: vec![],
    }
}

#[test]
fn empty_record_scores_zero_everywhere() {
    let score = score_site(&empty("void.io"));
    assert_eq!(score.dimensions, DimensionScores::default());
    assert!(score.composite.abs() < f64::EPSILON);
}

#[test]
fn content_weights_add_up() {
    let mut intel = empty("acme.io");
    intel.content = Some(ContentIntelligence {
        word_count: 850,
        has_blog: true,
        has_pricing: false,
        has_social_proof: true,
        cta_density: CtaDensity::Weak,
        ..maxed_content()
    });
    // 20 + 15 + 5 + 8.5
    assert!((content_score(&intel) - 48.5).abs() < 1e-9);
}

#[test]
fn tech_weights_add_up() {
    let mut intel = empty("acme.io");
    intel.tech = Some(TechIntelligence {
        framework: None,
        marketing: vec![],
        security: SecurityPosture {
            https: true,
            hsts: false,
            hardening_headers: 2,
        },
        ..maxed_tech()
    });
    // 20 + 10 (two hardening headers) + 15 analytics
    assert!((tech_score(&intel) - 45.0).abs() < 1e-9);
}

#[test]
fn structure_weights_add_up() {
    let mut intel = empty("acme.io");
    intel.structure = Some(StructureIntelligence {
        total_pages: 120,
        blog_pages: 0,
        freshness: FreshnessTier::Moderate,
        update_frequency: UpdateFrequency::Monthly,
        ..maxed_structure()
    });
    // 12 + 15 + 5
    assert!((structure_score(&intel) - 32.0).abs() < 1e-9);
}

#[test]
fn every_dimension_is_capped_at_100() {
    let mut intel = with_performance("max.io", 100, 100);
    intel.content = Some(maxed_content());
    intel.tech = Some(maxed_tech());
    intel.structure = Some(maxed_structure());

    let score = score_site(&intel);
    for value in [
        score.dimensions.performance,
        score.dimensions.content,
        score.dimensions.tech,
        score.dimensions.structure,
        score.composite,
    ] {
        assert!((0.0..=100.0).contains(&value), "{value} out of range");
    }
    assert!((score.dimensions.content - 80.0).abs() < 1e-9);
    assert!((score.dimensions.tech - 95.0).abs() < 1e-9);
    assert!((score.dimensions.structure - 100.0).abs() < 1e-9);
}

#[test]
fn missing_performance_pulls_subject_behind() {
    let subject = score_site(&empty("me.io"));
    let competitors: Vec<f64> = ["a.io", "b.io", "c.io"]
        .iter()
        .map(|d| score_site(&with_performance(d, 90, 90)).composite)
        .collect();

    assert!(subject.dimensions.performance.abs() < f64::EPSILON);
    let position = classify_position(subject.composite, &competitors);
    assert!(matches!(position, Position::CatchingUp | Position::Behind));
}

#[test]
fn lead_of_exactly_25_is_leading() {
    let subject = score_site(&with_performance("me.io", 100, 100)).composite;
    let competitor = score_site(&empty("rival.io")).composite;
    assert!((subject - competitor - 25.0).abs() < f64::EPSILON);
    assert_eq!(classify_position(subject, &[competitor]), Position::Leading);
}

#[test]
fn equal_to_average_is_competitive() {
    assert_eq!(classify_position(40.0, &[30.0, 50.0]), Position::Competitive);
}

#[test]
fn position_band_boundaries() {
    assert_eq!(classify_position(70.0, &[50.0]), Position::Competitive);
    assert_eq!(classify_position(70.5, &[50.0]), Position::Leading);
    assert_eq!(classify_position(49.5, &[50.0]), Position::CatchingUp);
    assert_eq!(classify_position(30.5, &[50.0]), Position::CatchingUp);
    assert_eq!(classify_position(30.0, &[50.0]), Position::Behind);
}

#[test]
fn classification_is_deterministic() {
    let competitors = [12.5, 61.0, 33.3];
    let first = classify_position(35.0, &competitors);
    for _ in 0..10 {
        assert_eq!(classify_position(35.0, &competitors), first);
    }
}

#[test]
fn average_of_no_competitors_is_zero() {
    assert!(average_composite(&[]).abs() < f64::EPSILON);
}
