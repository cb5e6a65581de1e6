use std::collections::VecDeque;
use std::sync::Once;

use chrono::{DateTime, Utc};
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Line logger carrying a stack of prefixes, typically the URL a dispatch
/// task is working on.
#[derive(Debug, Clone, Default)]
pub struct Logger {
    prefixes: VecDeque<String>,
}

impl Logger {
    pub fn new() -> Self {
        Self {
            prefixes: VecDeque::new(),
        }
    }

    pub fn with_new_prefixes(mut self, prefix: String) -> Self {
        self.prefixes.clear();
        self.prefixes.push_back(prefix);
        self
    }

    pub fn with_prefix(mut self, prefix: String) -> Self {
        self.prefixes.push_back(prefix);
        self
    }

    fn prefix(&self) -> String {
        self.prefixes.iter().map(|p| format!("{} ", p)).collect::<String>()
    }

    pub fn info(&self, message: &str) {
        tracing::info!("{}{}", self.prefix(), message);
    }

    pub fn error(&self, message: &str) {
        tracing::error!("{}{}", self.prefix(), message);
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!("{}{}", self.prefix(), message);
    }

    pub fn debug(&self, message: &str) {
        tracing::debug!("{}{}", self.prefix(), message);
    }

    /// Structured record of a state-machine transition.
    pub fn stage(&self, url: &str, stage: &str, at: DateTime<Utc>) {
        tracing::info!(
            target: "mt::stage",
            url,
            stage,
            at = %at.to_rfc3339(),
            "{}➡️ {}",
            self.prefix(),
            stage
        );
    }
}

/// Installs the global subscriber once. `RUST_LOG` overrides `default_filter`.
pub fn init_logging(default_filter: &str) -> Logger {
    if !tracing::dispatcher::has_been_set() {
        INIT.call_once(|| {
            let filter = EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter));
            tracing_subscriber::fmt().with_env_filter(filter).init();
        });
    }
    Logger::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixes() {
        let logger = Logger::new()
            .with_prefix("[a]".to_string())
            .with_prefix("[b]".to_string());
        assert_eq!(logger.prefix(), "[a] [b] ");

        let logger = logger.with_new_prefixes("[c]".to_string());
        assert_eq!(logger.prefix(), "[c] ");
        assert_eq!(Logger::new().prefix(), "");
    }

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging("debug").info("first");
        init_logging("debug").info("second");
    }
}
