use crate::app_config::AppConfig;
use crate::ConfigError;

pub const DEFAULT_SERP_BASE_URL: &str = "https://serpapi.com";
pub const DEFAULT_PAGESPEED_BASE_URL: &str = "https://www.googleapis.com/pagespeedonline/v5";
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files. Use it in tests
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable has a default; only malformed numbers are rejected.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // Blank secrets are treated as unset so `.env` templates don't enable a
    // provider with an empty key.
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_timeout = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let secs = parse_u64(var, default)?;
        if secs == 0 {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "timeout must be at least 1 second".to_string(),
            });
        }
        Ok(secs)
    };

    let log_level = or_default("RADAR_LOG_LEVEL", "info");
    let user_agent = or_default("RADAR_USER_AGENT", "radar/0.1 (competitive-analysis)");

    let page_timeout_secs = parse_timeout("RADAR_PAGE_TIMEOUT_SECS", "20")?;
    let sitemap_timeout_secs = parse_timeout("RADAR_SITEMAP_TIMEOUT_SECS", "15")?;
    let performance_timeout_secs = parse_timeout("RADAR_PERFORMANCE_TIMEOUT_SECS", "60")?;
    let serp_timeout_secs = parse_timeout("RADAR_SERP_TIMEOUT_SECS", "20")?;
    let llm_timeout_secs = parse_timeout("RADAR_LLM_TIMEOUT_SECS", "45")?;

    let max_retries = parse_u32("RADAR_MAX_RETRIES", "1")?;
    let retry_backoff_base_ms = parse_u64("RADAR_RETRY_BACKOFF_BASE_MS", "500")?;

    let serpapi_api_key = optional("SERPAPI_API_KEY");
    let pagespeed_api_key = optional("PAGESPEED_API_KEY");
    let openai_api_key = optional("OPENAI_API_KEY");
    let llm_model = or_default("RADAR_LLM_MODEL", "gpt-4o-mini");

    let serp_base_url = or_default("RADAR_SERP_BASE_URL", DEFAULT_SERP_BASE_URL);
    let pagespeed_base_url = or_default("RADAR_PAGESPEED_BASE_URL", DEFAULT_PAGESPEED_BASE_URL);
    let llm_base_url = or_default("RADAR_LLM_BASE_URL", DEFAULT_LLM_BASE_URL);

    Ok(AppConfig {
        log_level,
        user_agent,
        page_timeout_secs,
        sitemap_timeout_secs,
        performance_timeout_secs,
        serp_timeout_secs,
        llm_timeout_secs,
        max_retries,
        retry_backoff_base_ms,
        serpapi_api_key,
        pagespeed_api_key,
        openai_api_key,
        llm_model,
        serp_base_url,
        pagespeed_base_url,
        llm_base_url,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
