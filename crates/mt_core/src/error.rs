use thiserror::Error;

/// Setup and plumbing errors: configuration, I/O, serialization.
///
/// Pipeline failures never surface as this type; each stage has its own
/// failure enum below and the dispatcher turns those into a terminal state.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid chat identifier: {0}")]
    InvalidChat(String),

    #[error("Messaging error: {0}")]
    Messaging(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("timed out")]
    Timeout,

    #[error("HTTP status {0}")]
    Http(u16),
}

impl FetchError {
    /// Network errors, timeouts and server-side statuses may succeed on a
    /// later attempt; client errors (4xx) never will.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Network(_) | FetchError::Timeout => true,
            FetchError::Http(status) => *status >= 500,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionFailure {
    #[error("no article content found")]
    NoContentFound,

    #[error("content too short ({chars} < {min} chars)")]
    ContentTooShort { chars: usize, min: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    RateLimited,
    Unauthorized,
    Transient,
    Unknown,
}

impl std::fmt::Display for BackendErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            BackendErrorKind::RateLimited => "rate limited",
            BackendErrorKind::Unauthorized => "unauthorized",
            BackendErrorKind::Transient => "transient",
            BackendErrorKind::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslationFailure {
    #[error("backend error ({kind}): {message}")]
    Backend {
        kind: BackendErrorKind,
        message: String,
    },

    #[error("input too long ({chars} > {max} chars)")]
    InputTooLong { chars: usize, max: usize },

    #[error("timed out")]
    Timeout,
}

impl TranslationFailure {
    pub fn backend(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        TranslationFailure::Backend {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> Option<BackendErrorKind> {
        match self {
            TranslationFailure::Backend { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            TranslationFailure::Backend { kind, .. } => matches!(
                kind,
                BackendErrorKind::RateLimited | BackendErrorKind::Transient
            ),
            TranslationFailure::Timeout => true,
            TranslationFailure::InputTooLong { .. } => false,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error("timed out")]
    Timeout,
}
