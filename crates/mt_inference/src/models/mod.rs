use std::sync::Arc;

use mt_core::{Backend, BackendErrorKind, Error, Result, TranslationFailure, TranslationModel};
use reqwest::Client;

use crate::Config;

pub mod anthropic;
pub mod dummy;
pub mod openai;

pub use anthropic::AnthropicModel;
pub use dummy::DummyModel;
pub use openai::OpenAiModel;

/// Builds the one backend this deployment is configured for.
pub fn create_model(config: &Config) -> Result<Arc<dyn TranslationModel>> {
    let model: Arc<dyn TranslationModel> = match config.backend {
        Backend::OpenAi => Arc::new(OpenAiModel::new(config)?),
        Backend::Anthropic => Arc::new(AnthropicModel::new(config)?),
    };
    tracing::info!("🧠 Using {} for translations", model.name());
    Ok(model)
}

pub(crate) fn require_api_key(config: &Config) -> Result<String> {
    config
        .api_key
        .clone()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| {
            Error::Config(format!(
                "TRANSLATION_PROVIDER is '{}' but no API key was provided",
                config.backend
            ))
        })
}

pub(crate) fn http_client(config: &Config) -> Result<Client> {
    Ok(Client::builder().timeout(config.request_timeout).build()?)
}

/// Refuses empty input and input the backend would have to truncate.
pub(crate) fn check_input(text: &str, max_chars: usize) -> std::result::Result<(), TranslationFailure> {
    if text.trim().is_empty() {
        return Err(TranslationFailure::backend(
            BackendErrorKind::Unknown,
            "refusing to translate empty text",
        ));
    }
    let chars = text.chars().count();
    if chars > max_chars {
        return Err(TranslationFailure::InputTooLong {
            chars,
            max: max_chars,
        });
    }
    Ok(())
}

/// Maps a non-success HTTP response onto the failure taxonomy.
/// A context-length refusal reports the configured limit, the only one known here.
pub(crate) fn classify_status(
    status: u16,
    body: &str,
    input_chars: usize,
    max_chars: usize,
) -> TranslationFailure {
    let snippet: String = body.chars().take(300).collect();
    let message = format!("HTTP {}: {}", status, snippet);

    if status == 413
        || body.contains("context_length_exceeded")
        || body.contains("prompt is too long")
    {
        return TranslationFailure::InputTooLong {
            chars: input_chars,
            max: max_chars,
        };
    }

    let kind = match status {
        429 => BackendErrorKind::RateLimited,
        401 | 403 => BackendErrorKind::Unauthorized,
        408 | 409 | 500..=599 => BackendErrorKind::Transient,
        _ => BackendErrorKind::Unknown,
    };
    TranslationFailure::backend(kind, message)
}

pub(crate) fn classify_transport(err: reqwest::Error) -> TranslationFailure {
    if err.is_timeout() {
        TranslationFailure::Timeout
    } else if err.is_decode() {
        TranslationFailure::backend(BackendErrorKind::Unknown, format!("malformed response: {}", err))
    } else {
        TranslationFailure::backend(BackendErrorKind::Transient, err.to_string())
    }
}

pub(crate) fn malformed(detail: impl std::fmt::Display) -> TranslationFailure {
    TranslationFailure::backend(BackendErrorKind::Unknown, format!("malformed response: {}", detail))
}

const PREAMBLES: &[&str] = &[
    "here is the english translation:",
    "here's the english translation:",
    "here is the translation:",
    "here's the translation:",
    "english translation:",
    "translation:",
    "english:",
    "assistant:",
];

/// Strips chat role markers and translation preambles the model adds
/// despite being told not to.
pub(crate) fn clean_output(text: &str) -> std::result::Result<String, TranslationFailure> {
    let mut text = text.trim();
    loop {
        let stripped = PREAMBLES.iter().find_map(|preamble| {
            text.get(..preamble.len())
                .filter(|head| head.eq_ignore_ascii_case(preamble))
                .map(|_| text[preamble.len()..].trim_start())
        });
        match stripped {
            Some(rest) => text = rest,
            None => break,
        }
    }

    if text.is_empty() {
        return Err(malformed("empty translation"));
    }
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(429, "", 10, 100).kind(), Some(BackendErrorKind::RateLimited));
        assert_eq!(classify_status(401, "", 10, 100).kind(), Some(BackendErrorKind::Unauthorized));
        assert_eq!(classify_status(403, "", 10, 100).kind(), Some(BackendErrorKind::Unauthorized));
        assert_eq!(classify_status(503, "", 10, 100).kind(), Some(BackendErrorKind::Transient));
        assert_eq!(classify_status(529, "overloaded", 10, 100).kind(), Some(BackendErrorKind::Transient));
        assert_eq!(classify_status(400, "bad request", 10, 100).kind(), Some(BackendErrorKind::Unknown));
        assert!(matches!(
            classify_status(400, r#"{"error":{"code":"context_length_exceeded"}}"#, 10, 100),
            TranslationFailure::InputTooLong { chars: 10, .. }
        ));
        assert!(matches!(classify_status(413, "", 10, 100), TranslationFailure::InputTooLong { .. }));
    }

    #[test]
    fn test_check_input() {
        assert!(check_input("ދިވެހި", 10).is_ok());
        assert_eq!(
            check_input("ދިވެހި ބަސް", 5),
            Err(TranslationFailure::InputTooLong { chars: 11, max: 5 })
        );
        assert_eq!(
            check_input("   ", 5).unwrap_err().kind(),
            Some(BackendErrorKind::Unknown)
        );
    }

    #[test]
    fn test_clean_output() {
        assert_eq!(clean_output("  The minister said.\n").unwrap(), "The minister said.");
        assert_eq!(
            clean_output("Here is the translation:\n\nThe minister said.").unwrap(),
            "The minister said."
        );
        assert_eq!(clean_output("Assistant: English: Hello").unwrap(), "Hello");
        assert_eq!(clean_output("Translations differ.").unwrap(), "Translations differ.");
        assert!(clean_output(" \n ").is_err());
    }

    #[test]
    fn test_create_model_requires_key() {
        let result = create_model(&Config::new(Backend::OpenAi, None));
        assert!(result.is_err());

        let model = create_model(&Config::new(Backend::Anthropic, Some("key".to_string()))).unwrap();
        assert_eq!(model.name(), "Anthropic (claude-3-haiku-20240307)");
    }
}
