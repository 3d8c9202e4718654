//! Chat-completions client for the language-model insight path.

use std::time::Duration;

use radar_core::config::DEFAULT_LLM_BASE_URL;
use radar_core::{AiInsights, AppConfig, RadarReport};
use serde_json::{json, Value};

use super::parse::parse_completion;
use super::prompt::{build_prompt, SYSTEM_PROMPT};
use crate::error::InsightError;

const CREDENTIAL: &str = "OPENAI_API_KEY";

/// OpenAI-compatible `chat/completions` client with JSON-object output.
pub struct InsightClient {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    endpoint: String,
}

impl InsightClient {
    /// Creates a client pointed at the public OpenAI API.
    ///
    /// # Errors
    ///
    /// Returns [`InsightError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        api_key: Option<&str>,
        model: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, InsightError> {
        Self::with_base_url(api_key, model, timeout_secs, user_agent, DEFAULT_LLM_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`InsightError::Http`] if the client cannot be constructed,
    /// or [`InsightError::InvalidBaseUrl`] if `base_url` is not http(s).
    pub fn with_base_url(
        api_key: Option<&str>,
        model: &str,
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, InsightError> {
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(InsightError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: "expected an http(s) URL".to_string(),
            });
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.map(str::to_owned),
            model: model.to_string(),
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
        })
    }

    /// Builds the client from the `OPENAI_API_KEY`, `RADAR_LLM_*` settings.
    ///
    /// # Errors
    ///
    /// See [`InsightClient::with_base_url`].
    pub fn from_config(config: &AppConfig) -> Result<Self, InsightError> {
        Self::with_base_url(
            config.openai_api_key.as_deref(),
            &config.llm_model,
            config.llm_timeout_secs,
            &config.user_agent,
            &config.llm_base_url,
        )
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Requests insights for `report` and normalizes the completion.
    ///
    /// # Errors
    ///
    /// - [`InsightError::MissingCredential`] when no API key is configured.
    /// - [`InsightError::Http`] on network failure or timeout.
    /// - [`InsightError::UnexpectedStatus`] for a non-2xx response.
    /// - [`InsightError::EmptyCompletion`] / [`InsightError::Parse`] when the
    ///   completion is missing or not an insight JSON object.
    pub async fn generate(&self, report: &RadarReport) -> Result<AiInsights, InsightError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(InsightError::MissingCredential(CREDENTIAL))?;

        let req_body = json!({
            "model": self.model,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": build_prompt(report) }
            ],
            "temperature": 0.2
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&req_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(InsightError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        let body: Value = response.json().await?;
        let content = body
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|choices| choices.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|msg| msg.get("content"))
            .and_then(Value::as_str)
            .filter(|content| !content.trim().is_empty())
            .ok_or(InsightError::EmptyCompletion)?;

        parse_completion(content, report)
    }
}
