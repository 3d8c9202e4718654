//! Regex-based markup helpers shared by the document-derived providers.

use std::sync::LazyLock;

use regex::Regex;

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<[^>]+>").expect("valid tags regex"));
static NON_VISIBLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style|noscript|template|svg)\b[^>]*>.*?</(script|style|noscript|template|svg)>|<!--.*?-->")
        .expect("valid non-visible block regex")
});
static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid title regex"));
static META_DESCRIPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<meta[^>]+name\s*=\s*["']description["'][^>]+content\s*=\s*["'](.*?)["'][^>]*>"#,
    )
    .expect("valid meta description regex")
});
static META_DESCRIPTION_SWAPPED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<meta[^>]+content\s*=\s*["'](.*?)["'][^>]+name\s*=\s*["']description["'][^>]*>"#,
    )
    .expect("valid meta description fallback regex")
});
static HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\b[^>]*href\s*=\s*["']([^"']+)["']"#).expect("valid href regex")
});
static JSON_LD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script[^>]*type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#)
        .expect("valid json-ld script regex")
});

/// Strips tags and collapses whitespace.
pub(crate) fn clean_text(input: &str) -> String {
    let no_tags = TAG_RE.replace_all(input, " ");
    decode_entities(&no_tags)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text a visitor would read: scripts, styles, comments and tags removed.
pub(crate) fn visible_text(html: &str) -> String {
    let without_blocks = NON_VISIBLE_RE.replace_all(html, " ");
    clean_text(&without_blocks)
}

pub(crate) fn extract_title(html: &str) -> Option<String> {
    let cap = TITLE_RE.captures(html)?;
    let title = clean_text(cap.get(1).map_or("", |m| m.as_str()));
    (!title.is_empty()).then_some(title)
}

pub(crate) fn extract_meta_description(html: &str) -> Option<String> {
    let cap = META_DESCRIPTION_RE
        .captures(html)
        .or_else(|| META_DESCRIPTION_SWAPPED_RE.captures(html))?;
    let description = clean_text(cap.get(1).map_or("", |m| m.as_str()));
    (!description.is_empty()).then_some(description)
}

/// Raw `href` values of anchor tags, excluding fragments and pseudo-schemes.
pub(crate) fn extract_hrefs(html: &str) -> Vec<String> {
    HREF_RE
        .captures_iter(html)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str().trim().to_string()))
        .filter(|href| {
            !href.is_empty()
                && !href.starts_with('#')
                && !href.starts_with("mailto:")
                && !href.starts_with("tel:")
                && !href.starts_with("javascript:")
        })
        .collect()
}

/// Raw bodies of every `application/ld+json` script block.
pub(crate) fn json_ld_blocks(html: &str) -> Vec<String> {
    JSON_LD_RE
        .captures_iter(html)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str().trim().to_string()))
        .filter(|raw| !raw.is_empty())
        .collect()
}

/// Matches `needle` as a path prefix segment, so `/blog` matches `/blog/x`
/// and `https://acme.io/blog` but not `/blogger`.
pub(crate) fn path_contains(href: &str, needle: &str) -> bool {
    href.match_indices(needle).any(|(idx, _)| {
        let after = &href[idx + needle.len()..];
        after.is_empty() || after.starts_with(['/', '?', '#'])
    })
}

fn decode_entities(input: &str) -> String {
    input
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
}
