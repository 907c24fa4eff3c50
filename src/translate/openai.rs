//! Provider for OpenAI-compatible servers (LM Studio, vLLM, llama.cpp,
//! OpenAI itself).

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;

use crate::error::{Error, Result};

use super::{
    build_prompt, generate_with_retry, provider_http_error, ProviderConfig, Translator,
};

const ENV_BASE_URL: &str = "OPENAI_COMPAT_BASE_URL";
const ENV_API_KEY: &str = "OPENAI_COMPAT_API_KEY";
const ENV_MODEL: &str = "OPENAI_COMPAT_MODEL";

const LMSTUDIO_ENV_BASE_URL: &str = "LMSTUDIO_BASE_URL";
const LMSTUDIO_ENV_API_KEY: &str = "LMSTUDIO_API_KEY";
const LMSTUDIO_ENV_MODEL: &str = "LMSTUDIO_MODEL";

const DEFAULT_BASE_URL: &str = "http://localhost:1234/v1";

/// Which endpoint style to use against an OpenAI-compatible server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestMode {
    /// POST /chat/completions with a single user message
    #[default]
    Chat,
    /// POST /completions with a bare prompt
    Completion,
}

impl std::str::FromStr for RequestMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "chat" => Ok(RequestMode::Chat),
            "completion" => Ok(RequestMode::Completion),
            other => Err(Error::Config(format!(
                "request_mode must be 'chat' or 'completion', got '{other}'"
            ))),
        }
    }
}

/// Translator backed by any server speaking the OpenAI HTTP API.
pub struct OpenAiCompatProvider {
    client: Client,
    model: String,
    api_key: Option<String>,
    base_url: String,
    temperature: f32,
    request_mode: RequestMode,
    max_retries: u32,
}

impl OpenAiCompatProvider {
    /// Create a provider with `OPENAI_COMPAT_*` environment fallbacks.
    pub fn new(config: ProviderConfig) -> Result<Self> {
        Self::with_env(config, ENV_BASE_URL, ENV_API_KEY, ENV_MODEL)
    }

    /// LM Studio flavor: same protocol, `LMSTUDIO_*` environment fallbacks.
    pub fn lmstudio(config: ProviderConfig) -> Result<Self> {
        Self::with_env(
            config,
            LMSTUDIO_ENV_BASE_URL,
            LMSTUDIO_ENV_API_KEY,
            LMSTUDIO_ENV_MODEL,
        )
    }

    fn with_env(
        config: ProviderConfig,
        env_base_url: &str,
        env_api_key: &str,
        env_model: &str,
    ) -> Result<Self> {
        let model = config
            .model
            .or_else(|| std::env::var(env_model).ok())
            .unwrap_or_default();
        let base_url = normalize_base_url(
            &config
                .base_url
                .or_else(|| std::env::var(env_base_url).ok())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        );
        let api_key = config.api_key.or_else(|| std::env::var(env_api_key).ok());
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            model,
            api_key,
            base_url,
            temperature: config.temperature,
            request_mode: config.request_mode,
            max_retries: config.max_retries,
        })
    }

    fn generate(&self, prompt: &str) -> Result<String> {
        let (url, payload) = match self.request_mode {
            RequestMode::Completion => (
                format!("{}/completions", self.base_url),
                json!({
                    "model": self.model,
                    "prompt": prompt,
                    "temperature": self.temperature,
                    "stream": false,
                }),
            ),
            RequestMode::Chat => (
                format!("{}/chat/completions", self.base_url),
                json!({
                    "model": self.model,
                    "messages": [{"role": "user", "content": prompt}],
                    "temperature": self.temperature,
                    "stream": false,
                }),
            ),
        };

        let mut request = self.client.post(&url).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send()?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(provider_http_error(status, &body));
        }

        let data: serde_json::Value = response.json()?;
        let choice = data
            .get("choices")
            .and_then(|c| c.get(0))
            .cloned()
            .unwrap_or_default();
        let text = match self.request_mode {
            RequestMode::Completion => choice.get("text").and_then(|t| t.as_str()),
            RequestMode::Chat => choice
                .get("message")
                .and_then(|m| m.get("content"))
                .and_then(|c| c.as_str())
                .or_else(|| choice.get("text").and_then(|t| t.as_str())),
        };
        Ok(text.unwrap_or_default().to_string())
    }
}

impl Translator for OpenAiCompatProvider {
    fn translate(&self, text: &str, target_lang: &str) -> Result<String> {
        let prompt = build_prompt(text, target_lang);
        generate_with_retry(&self.model, self.max_retries, || self.generate(&prompt))
    }

    fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/models", self.base_url);
        let mut request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send()?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(provider_http_error(status, &body));
        }
        let data: serde_json::Value = response.json()?;
        let mut models: Vec<String> = data
            .get("data")
            .and_then(|d| d.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|m| m.get("id").and_then(|id| id.as_str()))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        models.sort();
        Ok(models)
    }
}

/// Ensure the base URL ends with exactly one `/v1` segment.
fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    if trimmed.ends_with("/v1") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/v1")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(normalize_base_url("http://host:1234"), "http://host:1234/v1");
        assert_eq!(normalize_base_url("http://host:1234/"), "http://host:1234/v1");
        assert_eq!(normalize_base_url("http://host:1234/v1"), "http://host:1234/v1");
        assert_eq!(normalize_base_url("http://host:1234/v1/"), "http://host:1234/v1");
    }

    #[test]
    fn test_request_mode_parsing() {
        assert_eq!("chat".parse::<RequestMode>().unwrap(), RequestMode::Chat);
        assert_eq!(
            " Completion ".parse::<RequestMode>().unwrap(),
            RequestMode::Completion
        );
        assert!("streaming".parse::<RequestMode>().is_err());
    }

    #[test]
    fn test_explicit_config_wins_over_default() {
        let config = ProviderConfig {
            model: Some("m".to_string()),
            base_url: Some("http://example.test:9999".to_string()),
            ..ProviderConfig::default()
        };
        let provider = OpenAiCompatProvider::new(config).unwrap();
        assert_eq!(provider.base_url, "http://example.test:9999/v1");
        assert_eq!(provider.model, "m");
    }
}
