//! Technology fingerprinting and security-header posture.
//!
//! Signatures are plain substring needles matched against the lowercased
//! document and response headers. The first matching entry wins for
//! single-valued categories; list categories collect every match.

use radar_core::{SecurityPosture, TechIntelligence};

use crate::error::ProviderError;
use crate::fetch::FetchedPage;

type Signature = (&'static str, &'static [&'static str]);

const CMS_SIGNATURES: &[Signature] = &[
    ("WordPress", &["wp-content/", "wp-includes/", "content=\"wordpress"]),
    ("Shopify", &["cdn.shopify.com", "shopify.theme"]),
    ("Webflow", &["data-wf-page", "webflow.js", "assets.website-files.com"]),
    ("Wix", &["static.wixstatic.com", "wix-code"]),
    ("Squarespace", &["static1.squarespace.com", "squarespace-cdn"]),
    ("Drupal", &["drupal-settings-json", "/sites/default/files/"]),
    ("Joomla", &["content=\"joomla", "/media/jui/"]),
    ("Ghost", &["content=\"ghost", "ghost-portal"]),
    ("HubSpot CMS", &["hs-sites.com", "hubspot-cms"]),
    ("Framer", &["framerusercontent.com", "data-framer"]),
];

const FRAMEWORK_SIGNATURES: &[Signature] = &[
    ("Next.js", &["__next_data__", "/_next/static/"]),
    ("Nuxt", &["__nuxt__", "/_nuxt/"]),
    ("Gatsby", &["___gatsby", "gatsby-"]),
    ("Remix", &["__remixcontext", "__remixmanifest"]),
    ("SvelteKit", &["__sveltekit", "data-sveltekit"]),
    ("Angular", &["ng-version=", "ng-app"]),
    ("Vue", &["data-v-app", "vue.runtime", "__vue__"]),
    ("React", &["data-reactroot", "react-dom", "_reactlistening"]),
    ("Astro", &["astro-island", "data-astro-cid"]),
];

const ANALYTICS_SIGNATURES: &[Signature] = &[
    ("Google Analytics", &["google-analytics.com", "gtag(", "googletagmanager.com/gtag"]),
    ("Google Tag Manager", &["googletagmanager.com/gtm.js", "gtm-"]),
    ("Plausible", &["plausible.io/js"]),
    ("Fathom", &["cdn.usefathom.com"]),
    ("Mixpanel", &["cdn.mxpnl.com", "mixpanel.init"]),
    ("Segment", &["cdn.segment.com", "analytics.load("]),
    ("Amplitude", &["cdn.amplitude.com", "amplitude.getinstance"]),
    ("Hotjar", &["static.hotjar.com", "hjsv"]),
    ("PostHog", &["posthog.init", "us.i.posthog.com"]),
    ("Heap", &["heapanalytics.com"]),
];

const MARKETING_SIGNATURES: &[Signature] = &[
    ("HubSpot", &["js.hs-scripts.com", "js.hsforms.net"]),
    ("Intercom", &["widget.intercom.io", "intercomsettings"]),
    ("Drift", &["js.driftt.com"]),
    ("Mailchimp", &["chimpstatic.com", "list-manage.com"]),
    ("Klaviyo", &["static.klaviyo.com"]),
    ("Meta Pixel", &["connect.facebook.net", "fbq("]),
    ("LinkedIn Insight", &["snap.licdn.com"]),
    ("Marketo", &["munchkin.marketo.net"]),
    ("Crisp", &["client.crisp.chat"]),
];

const ECOMMERCE_SIGNATURES: &[Signature] = &[
    ("Shopify", &["cdn.shopify.com", "shopify.checkout"]),
    ("WooCommerce", &["woocommerce", "wc-ajax"]),
    ("BigCommerce", &["cdn11.bigcommerce.com", "bigcommerce"]),
    ("Magento", &["mage/cookies", "magento"]),
    ("Stripe Checkout", &["js.stripe.com", "checkout.stripe.com"]),
];

/// Header-name needles for CDNs, checked before `server`/`via` values.
const CDN_HEADER_SIGNATURES: &[Signature] = &[
    ("Cloudflare", &["cf-ray", "cf-cache-status"]),
    ("Amazon CloudFront", &["x-amz-cf-id", "x-amz-cf-pop"]),
    ("Fastly", &["x-fastly-request-id", "fastly-debug-digest"]),
    ("Akamai", &["x-akamai-transformed", "akamai-grn"]),
    ("Vercel Edge", &["x-vercel-cache"]),
    ("Netlify Edge", &["x-nf-request-id"]),
];

const HOSTING_HEADER_SIGNATURES: &[Signature] = &[
    ("Vercel", &["x-vercel-id"]),
    ("Netlify", &["x-nf-request-id"]),
    ("GitHub Pages", &["x-github-request-id"]),
    ("Heroku", &["heroku-"]),
    ("Fly.io", &["fly-request-id"]),
    ("Render", &["rndr-id"]),
    ("Amazon S3", &["x-amz-request-id"]),
];

/// Hardening headers counted in addition to HSTS.
const HARDENING_HEADERS: [&str; 5] = [
    "content-security-policy",
    "x-frame-options",
    "x-content-type-options",
    "referrer-policy",
    "permissions-policy",
];

/// Fingerprints the technology stack and security posture of a fetched page.
///
/// # Errors
///
/// Returns [`ProviderError::NoData`] when the page has neither a body nor
/// response headers to inspect.
pub fn analyze_tech(page: &FetchedPage) -> Result<TechIntelligence, ProviderError> {
    if page.body.trim().is_empty() && page.headers.is_empty() {
        return Err(ProviderError::NoData(format!(
            "nothing to fingerprint at {}",
            page.final_url
        )));
    }

    let body = page.body.to_lowercase();
    let header_blob = page
        .headers
        .iter()
        .map(|(name, value)| format!("{name}: {}", value.to_lowercase()))
        .collect::<Vec<_>>()
        .join("\n");

    let cms = first_match(CMS_SIGNATURES, &body)
        .or_else(|| generator_hint(page.header("x-powered-by")));
    let framework = first_match(FRAMEWORK_SIGNATURES, &body)
        .or_else(|| framework_from_powered_by(page.header("x-powered-by")));

    Ok(TechIntelligence {
        cms,
        framework,
        analytics: all_matches(ANALYTICS_SIGNATURES, &body),
        marketing: all_matches(MARKETING_SIGNATURES, &body),
        cdn: detect_cdn(page, &header_blob),
        hosting: first_match(HOSTING_HEADER_SIGNATURES, &header_blob),
        ecommerce: first_match(ECOMMERCE_SIGNATURES, &body),
        security: security_posture(page),
    })
}

fn first_match(signatures: &[Signature], haystack: &str) -> Option<String> {
    signatures
        .iter()
        .find(|(_, needles)| needles.iter().any(|n| haystack.contains(n)))
        .map(|(name, _)| (*name).to_string())
}

fn all_matches(signatures: &[Signature], haystack: &str) -> Vec<String> {
    signatures
        .iter()
        .filter(|(_, needles)| needles.iter().any(|n| haystack.contains(n)))
        .map(|(name, _)| (*name).to_string())
        .collect()
}

fn detect_cdn(page: &FetchedPage, header_blob: &str) -> Option<String> {
    if let Some(cdn) = first_match(CDN_HEADER_SIGNATURES, header_blob) {
        return Some(cdn);
    }
    let server = page.header("server").unwrap_or_default().to_lowercase();
    let via = page.header("via").unwrap_or_default().to_lowercase();
    if server.contains("cloudflare") {
        Some("Cloudflare".to_string())
    } else if via.contains("cloudfront") || server.contains("cloudfront") {
        Some("Amazon CloudFront".to_string())
    } else if via.contains("varnish") || server.contains("fastly") {
        Some("Fastly".to_string())
    } else if server.contains("akamai") {
        Some("Akamai".to_string())
    } else {
        None
    }
}

fn generator_hint(powered_by: Option<&str>) -> Option<String> {
    let value = powered_by?.to_lowercase();
    if value.contains("wp engine") || value.contains("wordpress") {
        Some("WordPress".to_string())
    } else {
        None
    }
}

fn framework_from_powered_by(powered_by: Option<&str>) -> Option<String> {
    let value = powered_by?.to_lowercase();
    if value.contains("next.js") {
        Some("Next.js".to_string())
    } else if value.contains("nuxt") {
        Some("Nuxt".to_string())
    } else {
        None
    }
}

fn security_posture(page: &FetchedPage) -> SecurityPosture {
    let hardening = HARDENING_HEADERS
        .iter()
        .filter(|name| page.header(name).is_some())
        .count();
    SecurityPosture {
        https: page.final_url.to_lowercase().starts_with("https://"),
        hsts: page.header("strict-transport-security").is_some(),
        hardening_headers: u8::try_from(hardening).unwrap_or(u8::MAX),
    }
}
