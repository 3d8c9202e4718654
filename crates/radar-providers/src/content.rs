//! Content-structure analysis of a fetched landing page.

use std::sync::LazyLock;

use radar_core::site::host_of;
use radar_core::{ContentIntelligence, CtaDensity, Heading};
use regex::Regex;

use crate::error::ProviderError;
use crate::fetch::FetchedPage;
use crate::html::{
    clean_text, extract_hrefs, extract_meta_description, extract_title, path_contains,
    visible_text,
};

/// Outline entries kept per page.
const MAX_HEADINGS: usize = 25;

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<h([1-3])\b[^>]*>(.*?)</h[1-3]>").expect("valid heading regex")
});
static IMG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<img\b[^>]*>").expect("valid img regex"));
static ALT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)\balt\s*=\s*["']([^"']*)["']"#).expect("valid alt attribute regex")
});

const BLOG_PATHS: [&str; 5] = ["/blog", "/news", "/articles", "/insights", "/resources"];
const PRICING_PATHS: [&str; 3] = ["/pricing", "/plans", "/price"];
const SOCIAL_PROOF_PHRASES: [&str; 8] = [
    "testimonial",
    "customer stories",
    "case stud",
    "trusted by",
    "our customers",
    "reviews",
    "rated ",
    "loved by",
];
const CTA_PHRASES: [&str; 12] = [
    "get started",
    "sign up",
    "start free",
    "free trial",
    "try it free",
    "book a demo",
    "request a demo",
    "schedule a demo",
    "contact sales",
    "contact us",
    "buy now",
    "get a quote",
];

/// Analyzes the content structure of an already-fetched page.
///
/// # Errors
///
/// Returns [`ProviderError::NoData`] when the document has no visible text
/// and no headings.
pub fn analyze_content(page: &FetchedPage) -> Result<ContentIntelligence, ProviderError> {
    let html = page.body.as_str();
    let text = visible_text(html);
    let headings = extract_headings(html);

    if text.is_empty() && headings.is_empty() {
        return Err(ProviderError::NoData(format!(
            "document at {} has no visible content",
            page.final_url
        )));
    }

    let word_count = u32::try_from(text.split_whitespace().count()).unwrap_or(u32::MAX);
    let hrefs = extract_hrefs(html);
    let host = host_of(&page.final_url);
    let (internal_links, external_links) = count_links(&hrefs, host.as_deref());

    let lower_text = text.to_lowercase();
    let lower_hrefs: Vec<String> = hrefs.iter().map(|h| h.to_lowercase()).collect();

    let has_blog = lower_hrefs
        .iter()
        .any(|href| BLOG_PATHS.iter().any(|p| path_contains(href, p)));
    let has_pricing = lower_hrefs
        .iter()
        .any(|href| PRICING_PATHS.iter().any(|p| path_contains(href, p)))
        || lower_text.contains("pricing");
    let has_social_proof = SOCIAL_PROOF_PHRASES
        .iter()
        .any(|phrase| lower_text.contains(phrase));

    Ok(ContentIntelligence {
        title: extract_title(html),
        meta_description: extract_meta_description(html),
        word_count,
        headings,
        internal_links,
        external_links,
        image_alt_coverage: image_alt_coverage(html),
        has_blog,
        has_pricing,
        has_social_proof,
        cta_density: cta_density(&lower_text),
    })
}

fn extract_headings(html: &str) -> Vec<Heading> {
    HEADING_RE
        .captures_iter(html)
        .filter_map(|cap| {
            let level = cap.get(1)?.as_str().parse::<u8>().ok()?;
            let text = clean_text(cap.get(2)?.as_str());
            (!text.is_empty()).then_some(Heading { level, text })
        })
        .take(MAX_HEADINGS)
        .collect()
}

/// Share of `<img>` tags with non-empty alt text. A page without images is
/// fully covered.
fn image_alt_coverage(html: &str) -> f64 {
    let mut total = 0u32;
    let mut with_alt = 0u32;
    for img in IMG_RE.find_iter(html) {
        total += 1;
        let has_alt = ALT_RE
            .captures(img.as_str())
            .and_then(|cap| cap.get(1))
            .is_some_and(|alt| !alt.as_str().trim().is_empty());
        if has_alt {
            with_alt += 1;
        }
    }
    if total == 0 {
        1.0
    } else {
        f64::from(with_alt) / f64::from(total)
    }
}

fn cta_density(lower_text: &str) -> CtaDensity {
    let distinct = CTA_PHRASES
        .iter()
        .filter(|phrase| lower_text.contains(*phrase))
        .count();
    match distinct {
        0 => CtaDensity::None,
        1 | 2 => CtaDensity::Weak,
        _ => CtaDensity::Strong,
    }
}

fn count_links(hrefs: &[String], host: Option<&str>) -> (u32, u32) {
    let mut internal = 0u32;
    let mut external = 0u32;
    for href in hrefs {
        let lower = href.to_lowercase();
        let is_absolute = lower.starts_with("http://") || lower.starts_with("https://");
        let is_protocol_relative = lower.starts_with("//");
        if !is_absolute && !is_protocol_relative {
            internal += 1;
            continue;
        }
        let link_host = host_of(&lower);
        let same_site = match (link_host.as_deref(), host) {
            (Some(link), Some(own)) => strip_www(link) == strip_www(own),
            _ => false,
        };
        if same_site {
            internal += 1;
        } else {
            external += 1;
        }
    }
    (internal, external)
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

#[cfg(test)]
#[path = "content_test.rs"]
mod tests;
