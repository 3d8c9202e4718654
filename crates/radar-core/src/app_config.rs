#[derive(Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub user_agent: String,
    pub page_timeout_secs: u64,
    pub sitemap_timeout_secs: u64,
    pub performance_timeout_secs: u64,
    pub serp_timeout_secs: u64,
    pub llm_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub serpapi_api_key: Option<String>,
    pub pagespeed_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub llm_model: String,
    pub serp_base_url: String,
    pub pagespeed_base_url: String,
    pub llm_base_url: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field("user_agent", &self.user_agent)
            .field("page_timeout_secs", &self.page_timeout_secs)
            .field("sitemap_timeout_secs", &self.sitemap_timeout_secs)
            .field("performance_timeout_secs", &self.performance_timeout_secs)
            .field("serp_timeout_secs", &self.serp_timeout_secs)
            .field("llm_timeout_secs", &self.llm_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field(
                "serpapi_api_key",
                &self.serpapi_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "pagespeed_api_key",
                &self.pagespeed_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("llm_model", &self.llm_model)
            .field("serp_base_url", &self.serp_base_url)
            .field("pagespeed_base_url", &self.pagespeed_base_url)
            .field("llm_base_url", &self.llm_base_url)
            .finish()
    }
}
