use std::fmt;
use std::time::Duration;

use mt_core::Backend;

pub mod models;

/// Translation backend settings, fixed for the lifetime of the process.
#[derive(Clone)]
pub struct Config {
    pub backend: Backend,
    pub api_key: Option<String>,
    /// Falls back to the backend's default model.
    pub model_name: Option<String>,
    /// Falls back to the provider's public endpoint.
    pub base_url: Option<String>,
    /// Longer input is refused rather than truncated.
    pub max_input_chars: usize,
    pub max_output_tokens: u32,
    pub title_max_output_tokens: u32,
    pub temperature: f32,
    pub request_timeout: Duration,
}

impl Config {
    pub fn new(backend: Backend, api_key: Option<String>) -> Self {
        Self {
            backend,
            api_key,
            ..Self::default()
        }
    }

    pub fn model(&self) -> String {
        self.model_name
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| self.backend.default_model().to_string())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::OpenAi,
            api_key: None,
            model_name: None,
            base_url: None,
            max_input_chars: 12_000,
            max_output_tokens: 3000,
            title_max_output_tokens: 1000,
            temperature: 0.3,
            request_timeout: Duration::from_secs(120),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("backend", &self.backend)
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("model_name", &self.model_name)
            .field("base_url", &self.base_url)
            .field("max_input_chars", &self.max_input_chars)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("title_max_output_tokens", &self.title_max_output_tokens)
            .field("temperature", &self.temperature)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

pub mod prelude {
    pub use super::models::create_model;
    pub use super::Config;
    pub use mt_core::{Backend, TextKind, TranslationFailure, TranslationModel};
}

pub use models::create_model;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_defaults() {
        let config = Config::new(Backend::Anthropic, Some("key".to_string()));
        assert_eq!(config.model(), "claude-3-haiku-20240307");

        let config = Config {
            model_name: Some("gpt-4o-mini".to_string()),
            ..Config::new(Backend::OpenAi, None)
        };
        assert_eq!(config.model(), "gpt-4o-mini");
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = Config::new(Backend::OpenAi, Some("sk-secret".to_string()));
        let printed = format!("{:?}", config);
        assert!(!printed.contains("sk-secret"));
        assert!(printed.contains("<redacted>"));
    }
}
