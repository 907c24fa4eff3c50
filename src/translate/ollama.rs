//! Provider for a local Ollama server.

use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::json;

use crate::error::Result;

use super::{
    build_prompt, generate_with_retry, provider_http_error, ProviderConfig, Translator,
};

const ENV_HOST: &str = "OLLAMA_HOST";
const ENV_MODEL: &str = "OLLAMA_MODEL";
const DEFAULT_HOST: &str = "http://localhost:11434";

/// Translator backed by Ollama's generate API.
pub struct OllamaProvider {
    client: Client,
    model: String,
    base_url: String,
    temperature: f32,
    max_retries: u32,
}

impl OllamaProvider {
    /// Create a provider with `OLLAMA_HOST`/`OLLAMA_MODEL` fallbacks.
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let model = config
            .model
            .or_else(|| std::env::var(ENV_MODEL).ok())
            .unwrap_or_default();
        let base_url = config
            .base_url
            .or_else(|| std::env::var(ENV_HOST).ok())
            .unwrap_or_else(|| DEFAULT_HOST.to_string())
            .trim_end_matches('/')
            .to_string();
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            model,
            base_url,
            temperature: config.temperature,
            max_retries: config.max_retries,
        })
    }

    fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let payload = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": {"temperature": self.temperature},
        });
        let response = self.client.post(&url).json(&payload).send()?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(provider_http_error(status, &body));
        }
        let data: serde_json::Value = response.json()?;
        Ok(data
            .get("response")
            .and_then(|r| r.as_str())
            .unwrap_or_default()
            .to_string())
    }
}

impl Translator for OllamaProvider {
    fn translate(&self, text: &str, target_lang: &str) -> Result<String> {
        let prompt = build_prompt(text, target_lang);
        generate_with_retry(&self.model, self.max_retries, || self.generate(&prompt))
    }

    fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self.client.get(&url).send()?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(provider_http_error(status, &body));
        }
        let data: serde_json::Value = response.json()?;
        let mut names: Vec<String> = data
            .get("models")
            .and_then(|m| m.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|m| m.get("name").and_then(|n| n.as_str()))
                    .filter(|n| !n.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let config = ProviderConfig {
            model: Some("llama3".to_string()),
            base_url: Some("http://box:11434/".to_string()),
            ..ProviderConfig::default()
        };
        let provider = OllamaProvider::new(config).unwrap();
        assert_eq!(provider.base_url, "http://box:11434");
    }
}
