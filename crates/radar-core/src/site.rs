//! Site identifier normalization and URL host helpers.

use reqwest::Url;
use serde::{Deserialize, Serialize};

/// A normalized site identifier plus the origin used for outbound requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SiteTarget {
    /// Lowercase host, plus the port when it is not the scheme default.
    pub domain: String,
    /// `scheme://domain`, keeping the caller's scheme when one was given.
    pub origin: String,
}

impl SiteTarget {
    /// Builds an absolute URL for `path` on this site.
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.origin)
        } else {
            format!("{}/{path}", self.origin)
        }
    }

    /// The host name without any port.
    #[must_use]
    pub fn host(&self) -> String {
        Url::parse(&self.origin)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.trim_end_matches('.').to_owned()))
            .unwrap_or_else(|| self.domain.clone())
    }
}

/// Normalizes a free-form site identifier.
///
/// Accepts bare domains (`Acme.io`), URLs with a scheme
/// (`https://acme.io/pricing/`), and anything in between. A missing scheme
/// defaults to `https`. Returns `None` for non-http(s) schemes and for input
/// with no usable host.
///
/// ```
/// let site = radar_core::normalize_site("HTTPS://Acme.io/").unwrap();
/// assert_eq!(site.domain, "acme.io");
/// assert_eq!(site.origin, "https://acme.io");
/// ```
#[must_use]
pub fn normalize_site(input: &str) -> Option<SiteTarget> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    let url = if trimmed.contains("://") {
        Url::parse(trimmed).ok()?
    } else {
        Url::parse(&format!("https://{trimmed}")).ok()?
    };
    let domain = host_with_port(&url)?;
    Some(SiteTarget {
        origin: format!("{}://{domain}", url.scheme()),
        domain,
    })
}

/// Parses an absolute http(s) URL or a protocol-relative `//host/...`
/// reference (taken as https).
#[must_use]
pub fn parse_http_url(raw: &str) -> Option<Url> {
    let raw = raw.trim();
    let url = match raw.strip_prefix("//") {
        Some(rest) => Url::parse(&format!("https://{rest}")).ok()?,
        None => Url::parse(raw).ok()?,
    };
    matches!(url.scheme(), "http" | "https").then_some(url)
}

/// Host (and non-default port) of an absolute or protocol-relative http(s)
/// URL. User info, path, query and fragment are dropped.
///
/// ```
/// assert_eq!(radar_core::site::host_of("https://u:p@Acme.io:443/a").as_deref(), Some("acme.io"));
/// ```
#[must_use]
pub fn host_of(raw: &str) -> Option<String> {
    host_with_port(&parse_http_url(raw)?)
}

/// Path component of an http(s) URL, `/` when it has none.
#[must_use]
pub fn path_of(raw: &str) -> Option<String> {
    parse_http_url(raw).map(|u| u.path().to_owned())
}

fn host_with_port(url: &Url) -> Option<String> {
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let host = url.host_str()?.trim_end_matches('.').to_ascii_lowercase();
    if host.is_empty() {
        return None;
    }
    // `Url::port` is `None` when the port is the scheme default.
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host,
    })
}
