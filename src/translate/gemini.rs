//! Provider for the Gemini REST API.

use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::json;

use crate::error::{Error, Result};

use super::{
    build_prompt, generate_with_retry, provider_http_error, ProviderConfig, Translator,
};

const ENV_API_KEY: &str = "GEMINI_API_KEY";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const API_ROOT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Translator backed by Gemini's generateContent endpoint.
pub struct GeminiProvider {
    client: Client,
    model: String,
    api_key: String,
    api_root: String,
    temperature: f32,
    max_retries: u32,
}

impl GeminiProvider {
    /// Create a provider. The API key comes from the config or
    /// `GEMINI_API_KEY`; a missing key is a configuration error.
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(ENV_API_KEY).ok())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::Config("missing GEMINI_API_KEY".to_string()))?;
        let model = config
            .model
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let api_root = config
            .base_url
            .unwrap_or_else(|| API_ROOT.to_string())
            .trim_end_matches('/')
            .to_string();
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            model,
            api_key,
            api_root,
            temperature: config.temperature,
            max_retries: config.max_retries,
        })
    }

    fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.api_root, self.model, self.api_key
        );
        let payload = json!({
            "contents": [{"parts": [{"text": prompt}]}],
            "generationConfig": {"temperature": self.temperature},
        });
        let response = self.client.post(&url).json(&payload).send()?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(provider_http_error(status, &body));
        }
        let data: serde_json::Value = response.json()?;
        Ok(candidate_text(&data))
    }
}

impl Translator for GeminiProvider {
    fn translate(&self, text: &str, target_lang: &str) -> Result<String> {
        let prompt = build_prompt(text, target_lang);
        generate_with_retry(&self.model, self.max_retries, || self.generate(&prompt))
    }

    fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/models?key={}", self.api_root, self.api_key);
        let response = self.client.get(&url).send()?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(provider_http_error(status, &body));
        }
        let data: serde_json::Value = response.json()?;
        let mut models: Vec<String> = data
            .get("models")
            .and_then(|m| m.as_array())
            .map(|arr| {
                arr.iter()
                    .filter(|m| supports_generate_content(m))
                    .filter_map(|m| m.get("name").and_then(|n| n.as_str()))
                    .map(|name| name.strip_prefix("models/").unwrap_or(name).to_string())
                    .filter(|name| !name.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        models.sort();
        Ok(models)
    }
}

/// Concatenate the text parts of the first candidate.
fn candidate_text(data: &serde_json::Value) -> String {
    data.get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default()
}

fn supports_generate_content(model: &serde_json::Value) -> bool {
    model
        .get("supportedGenerationMethods")
        .and_then(|m| m.as_array())
        .map(|methods| {
            methods
                .iter()
                .filter_map(|m| m.as_str())
                .any(|m| m.to_lowercase().contains("generatecontent"))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key_rejected() {
        let config = ProviderConfig {
            api_key: Some(String::new()),
            ..ProviderConfig::default()
        };
        // An empty explicit key falls through to the env var; absent both,
        // construction fails.
        if std::env::var(ENV_API_KEY).is_err() {
            assert!(matches!(GeminiProvider::new(config), Err(Error::Config(_))));
        }
    }

    #[test]
    fn test_candidate_text_concatenates_parts() {
        let data = serde_json::json!({
            "candidates": [{
                "content": {"parts": [{"text": "Bonjour "}, {"text": "le monde"}]}
            }]
        });
        assert_eq!(candidate_text(&data), "Bonjour le monde");
        assert_eq!(candidate_text(&serde_json::json!({})), "");
    }

    #[test]
    fn test_supports_generate_content() {
        let model = serde_json::json!({
            "name": "models/gemini-2.5-flash",
            "supportedGenerationMethods": ["generateContent", "countTokens"]
        });
        assert!(supports_generate_content(&model));
        let embed = serde_json::json!({
            "name": "models/embedding-001",
            "supportedGenerationMethods": ["embedContent"]
        });
        assert!(!supports_generate_content(&embed));
    }

    #[test]
    fn test_default_model_applied() {
        let config = ProviderConfig {
            api_key: Some("k".to_string()),
            ..ProviderConfig::default()
        };
        let provider = GeminiProvider::new(config).unwrap();
        assert_eq!(provider.model, DEFAULT_MODEL);
    }
}
