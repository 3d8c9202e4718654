//! Data providers for competitive site analysis.
//!
//! Each provider turns one site into a typed sub-record or a typed failure.
//! Network-bound providers (`structure`, `performance`, `seo`) own their HTTP
//! clients and timeouts; document-derived providers (`content`, `tech`,
//! `business`) are pure functions over a page fetched once by [`PageFetcher`].

pub mod business;
pub mod content;
pub mod error;
pub mod fetch;
pub mod performance;
pub mod seo;
pub mod structure;
pub mod tech;

mod html;
mod retry;

pub use business::analyze_business;
pub use content::analyze_content;
pub use error::ProviderError;
pub use fetch::{FetchedPage, PageFetcher};
pub use performance::PageSpeedClient;
pub use seo::SerpClient;
pub use structure::SitemapClient;
pub use tech::analyze_tech;

/// Provider names as they appear in status logs and report summaries.
pub mod names {
    pub const PAGE_FETCH: &str = "page_fetch";
    pub const CONTENT: &str = "content";
    pub const TECH: &str = "tech";
    pub const BUSINESS: &str = "business";
    pub const STRUCTURE: &str = "structure";
    pub const PERFORMANCE: &str = "performance";
    pub const SEO: &str = "seo";
}
