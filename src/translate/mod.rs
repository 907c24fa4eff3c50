//! Translation providers.
//!
//! A [`Translator`] turns source text into text in a target language. The
//! concrete providers talk to OpenAI-compatible servers, Ollama, or the
//! Gemini REST API; all share the same prompt shape and retry policy.

pub mod chunk;
mod gemini;
mod lang;
mod ollama;
mod openai;

pub use chunk::chunk_text;
pub use gemini::GeminiProvider;
pub use lang::language_display_name;
pub use ollama::OllamaProvider;
pub use openai::{OpenAiCompatProvider, RequestMode};

use serde::Deserialize;

use crate::error::{Error, Result};

/// A translation backend. `target_lang` is a BCP-47-ish language code
/// ("fr", "pt-BR"); providers receive its display name in the prompt.
pub trait Translator {
    /// Translate one chunk of text.
    fn translate(&self, text: &str, target_lang: &str) -> Result<String>;

    /// List the models the backend offers. Providers without a listing
    /// endpoint return an empty list.
    fn list_models(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

/// Provider configuration, shared across all providers.
///
/// Unset fields fall back to per-provider environment variables and
/// defaults. Deserializable so it can be loaded from a JSON config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
    /// Model name; falls back to the provider's model env var
    pub model: Option<String>,
    /// API key; falls back to the provider's key env var
    pub api_key: Option<String>,
    /// Base URL; falls back to the provider's host env var
    pub base_url: Option<String>,
    /// Sampling temperature
    pub temperature: f32,
    /// Chat vs completion endpoint (OpenAI-compatible providers only)
    pub request_mode: RequestMode,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Attempts before a transient failure becomes an error
    pub max_retries: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            model: None,
            api_key: None,
            base_url: None,
            temperature: 0.2,
            request_mode: RequestMode::Chat,
            timeout_secs: 60,
            max_retries: 3,
        }
    }
}

/// Names accepted by [`create_provider`], sorted.
pub fn list_providers() -> Vec<&'static str> {
    vec!["gemini", "lmstudio", "ollama", "openai-compat"]
}

/// Instantiate a provider by name.
pub fn create_provider(name: &str, config: ProviderConfig) -> Result<Box<dyn Translator>> {
    match name.trim().to_lowercase().as_str() {
        "openai-compat" => Ok(Box::new(OpenAiCompatProvider::new(config)?)),
        "lmstudio" => Ok(Box::new(OpenAiCompatProvider::lmstudio(config)?)),
        "ollama" => Ok(Box::new(OllamaProvider::new(config)?)),
        "gemini" => Ok(Box::new(GeminiProvider::new(config)?)),
        other => Err(Error::UnknownProvider(
            other.to_string(),
            list_providers().join(", "),
        )),
    }
}

/// The instruction sent to every provider, followed by the source text.
pub(crate) fn build_prompt(text: &str, target_lang: &str) -> String {
    let target_name = language_display_name(target_lang);
    format!(
        "Translate the following text into {target_name}. \
         Preserve structure, headings, and line breaks. \
         Do not add commentary or notes.\n\nTEXT:\n{text}"
    )
}

/// Run `generate` with exponential backoff (2^attempt seconds between
/// attempts). A model-not-found response aborts immediately; other errors
/// retry up to `max_retries` attempts.
pub(crate) fn generate_with_retry<F>(
    model: &str,
    max_retries: u32,
    generate: F,
) -> Result<String>
where
    F: Fn() -> Result<String>,
{
    if model.is_empty() {
        return Err(Error::Config(
            "missing model name; provide --model or the provider's model env var".to_string(),
        ));
    }
    let attempts = max_retries.max(1);
    let mut last_err = None;
    for attempt in 0..attempts {
        match generate() {
            Ok(text) => return Ok(text.trim().to_string()),
            Err(e) => {
                if is_model_not_found(&e) {
                    return Err(Error::ModelNotFound(model.to_string()));
                }
                log::warn!("translation attempt {} failed: {e}", attempt + 1);
                if attempt + 1 < attempts {
                    std::thread::sleep(std::time::Duration::from_secs(1u64 << attempt));
                }
                last_err = Some(e);
            }
        }
    }
    Err(last_err.unwrap_or_else(|| Error::Provider("no attempts made".to_string())))
}

fn is_model_not_found(err: &Error) -> bool {
    if matches!(err, Error::ModelNotFound(_)) {
        return true;
    }
    let message = err.to_string().to_lowercase();
    message.contains("not found") || message.contains("404")
}

/// Format an HTTP error body into a provider error, truncating long bodies.
pub(crate) fn provider_http_error(status: reqwest::StatusCode, body: &str) -> Error {
    const BODY_LIMIT: usize = 1000;
    let clean = body.trim();
    let body = if clean.chars().count() <= BODY_LIMIT {
        clean.to_string()
    } else {
        let truncated: String = clean.chars().take(BODY_LIMIT).collect();
        format!("{truncated}... [truncated]")
    };
    Error::Provider(format!("HTTP {}: {body}", status.as_u16()))
}
