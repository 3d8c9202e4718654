use super::*;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn entry(loc: &str, lastmod: Option<&str>) -> SitemapEntry {
    SitemapEntry {
        loc: loc.to_string(),
        lastmod: lastmod.map(date),
    }
}

#[test]
fn robots_sitemaps_resolve_relative_and_dedupe() {
    let robots = "User-agent: *\nDisallow: /admin\n\
                  Sitemap: https://acme.io/sitemap.xml\n\
                  sitemap: /news-sitemap.xml\n\
                  Sitemap: https://acme.io/sitemap.xml\n";
    assert_eq!(
        parse_robots_sitemaps(robots, "https://acme.io"),
        vec![
            "https://acme.io/sitemap.xml".to_string(),
            "https://acme.io/news-sitemap.xml".to_string(),
        ]
    );
}

#[test]
fn parses_urlset_with_namespaces_and_datetimes() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
        <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
          <url><loc>https://acme.io/</loc><lastmod>2026-10-01T08:00:00+00:00</lastmod></url>
          <url><loc>https://acme.io/blog/launch?a=1&amp;b=2</loc></url>
        </urlset>"#;
    let SitemapDocument::UrlSet(entries) = parse_sitemap(xml).unwrap() else {
        panic!("expected urlset");
    };
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].lastmod, Some(date("2026-10-01")));
    assert_eq!(entries[1].loc, "https://acme.io/blog/launch?a=1&b=2");
    assert_eq!(entries[1].lastmod, None);
}

#[test]
fn parses_sitemap_index() {
    let xml = r"<sitemapindex>
          <sitemap><loc>https://acme.io/pages.xml</loc></sitemap>
          <sitemap><loc>https://acme.io/posts.xml</loc></sitemap>
        </sitemapindex>";
    let SitemapDocument::Index(children) = parse_sitemap(xml).unwrap() else {
        panic!("expected sitemap index");
    };
    assert_eq!(children.len(), 2);
    assert_eq!(children[1].loc, "https://acme.io/posts.xml");
}

#[test]
fn html_error_page_is_not_a_sitemap() {
    let html = "<!DOCTYPE html><html><body><p>Page not found</p></body></html>";
    match parse_sitemap(html) {
        Err(SitemapError::NotASitemap(root)) => assert_eq!(root, "html"),
        other => panic!("expected a non-sitemap root, got {other:?}"),
    }
    assert!(matches!(
        parse_sitemap("   "),
        Err(SitemapError::NotASitemap(_))
    ));
}

#[test]
fn self_closing_urlset_is_an_empty_sitemap() {
    let xml = r#"<?xml version="1.0"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"/>"#;
    assert_eq!(parse_sitemap(xml).unwrap(), SitemapDocument::UrlSet(vec![]));
}

#[test]
fn summarize_counts_kinds_and_ranks_categories() {
    let today = date("2026-10-16");
    let entries = vec![
        entry("https://acme.io/", Some("2026-10-10")),
        entry("https://acme.io/blog/a", Some("2026-10-01")),
        entry("https://acme.io/blog/b", None),
        entry("https://acme.io/blog/b", None),
        entry("https://acme.io/products/widget", None),
        entry("https://acme.io/blogger-program", None),
        entry("https://acme.io/about", None),
    ];
    let intel = summarize(&entries, vec!["https://acme.io/sitemap.xml".into()], today);
    assert_eq!(intel.total_pages, 6);
    assert_eq!(intel.blog_pages, 2);
    assert_eq!(intel.product_pages, 1);
    assert_eq!(intel.categories[0], "blog");
    assert!(intel.categories.contains(&"about".to_string()));
    assert_eq!(intel.last_updated, Some(date("2026-10-10")));
    assert_eq!(intel.freshness, FreshnessTier::Fresh);
    assert_eq!(intel.update_frequency, UpdateFrequency::Weekly);
}

#[test]
fn update_frequency_thresholds() {
    let today = date("2026-10-16");
    let days_ago = |n: i64| today - chrono::Duration::days(n);

    assert_eq!(classify_update_frequency(&[], today), UpdateFrequency::Unknown);
    assert_eq!(
        classify_update_frequency(&(0..7).map(days_ago).collect::<Vec<_>>(), today),
        UpdateFrequency::Daily
    );
    assert_eq!(
        classify_update_frequency(&[days_ago(3)], today),
        UpdateFrequency::Weekly
    );
    assert_eq!(
        classify_update_frequency(&[days_ago(10), days_ago(12), days_ago(20), days_ago(25)], today),
        UpdateFrequency::Weekly
    );
    assert_eq!(
        classify_update_frequency(&[days_ago(40), days_ago(50), days_ago(80)], today),
        UpdateFrequency::Monthly
    );
    assert_eq!(
        classify_update_frequency(&[days_ago(400)], today),
        UpdateFrequency::Rarely
    );
}

#[test]
fn freshness_tiers() {
    let today = date("2026-10-16");
    assert_eq!(classify_freshness(None, today), FreshnessTier::Unknown);
    assert_eq!(
        classify_freshness(Some(date("2026-09-16")), today),
        FreshnessTier::Fresh
    );
    assert_eq!(
        classify_freshness(Some(date("2026-06-01")), today),
        FreshnessTier::Moderate
    );
    assert_eq!(
        classify_freshness(Some(date("2025-01-01")), today),
        FreshnessTier::Stale
    );
}
