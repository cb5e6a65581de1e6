use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use mt_core::{
    ArticleSource, ChatId, ExtractionFailure, FetchError, Fetcher, Messenger, SendError, TextKind,
    TranslationFailure, TranslationModel,
};
use mt_extractor::Extractor;
use thiserror::Error;
use tokio::time::{sleep, timeout};

use crate::chunker::message_segments;
use crate::inflight::InFlightSet;
use crate::logging::Logger;
use crate::message::{acknowledgement, compose, failure_notice, USAGE};
use crate::retry::RetryPolicy;
use crate::trigger::Trigger;

/// Where a dispatch is in its pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Fetching,
    Extracting,
    Translating,
    Chunking,
    Sending,
    Done,
    Failed,
}

impl Stage {
    pub fn verb(&self) -> &'static str {
        match self {
            Stage::Idle => "waiting",
            Stage::Fetching => "fetching",
            Stage::Extracting => "extracting",
            Stage::Translating => "translating",
            Stage::Chunking => "chunking",
            Stage::Sending => "sending",
            Stage::Done => "finishing",
            Stage::Failed => "failing",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Fetching => "fetching",
            Stage::Extracting => "extracting",
            Stage::Translating => "translating",
            Stage::Chunking => "chunking",
            Stage::Sending => "sending",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Terminal failure of one dispatch, tagged with the stage that failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("fetch failed: {0}")]
    Fetch(FetchError),

    #[error("extraction failed: {0}")]
    Extract(ExtractionFailure),

    #[error("translation failed: {0}")]
    Translate(TranslationFailure),

    #[error("sending failed after {delivered} of {total} segments: {error}")]
    Send {
        error: SendError,
        delivered: usize,
        total: usize,
    },
}

impl DispatchError {
    pub fn stage(&self) -> Stage {
        match self {
            DispatchError::Fetch(_) => Stage::Fetching,
            DispatchError::Extract(_) => Stage::Extracting,
            DispatchError::Translate(_) => Stage::Translating,
            DispatchError::Send { .. } => Stage::Sending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageEvent {
    pub stage: Stage,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Delivered { segments: usize },
    Failed(DispatchError),
    /// Another dispatch already owned the URL.
    Duplicate,
}

#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub url: String,
    pub trigger: Trigger,
    pub history: Vec<StageEvent>,
    pub outcome: Outcome,
}

impl DispatchReport {
    pub fn stages(&self) -> Vec<Stage> {
        self.history.iter().map(|event| event.stage).collect()
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self.outcome, Outcome::Delivered { .. })
    }
}

#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Destination channel for channel-triggered dispatches.
    pub destination: ChatId,
    pub max_segment_chars: usize,
    pub fetch_timeout: Duration,
    pub translate_timeout: Duration,
    pub send_timeout: Duration,
    pub fetch_retry: RetryPolicy,
    pub translate_retry: RetryPolicy,
    /// Pause between consecutive segments of one article.
    pub segment_delay: Duration,
    pub append_source_link: bool,
    pub translate_title: bool,
}

impl DispatchConfig {
    pub fn new(destination: ChatId) -> Self {
        Self {
            destination,
            max_segment_chars: 4000,
            fetch_timeout: Duration::from_secs(30),
            translate_timeout: Duration::from_secs(180),
            send_timeout: Duration::from_secs(30),
            fetch_retry: RetryPolicy::default(),
            translate_retry: RetryPolicy::default(),
            segment_delay: Duration::from_secs(1),
            append_source_link: true,
            translate_title: true,
        }
    }
}

struct Progress {
    url: String,
    log: Logger,
    history: Vec<StageEvent>,
}

impl Progress {
    fn enter(&mut self, stage: Stage) {
        let at = Utc::now();
        self.log.stage(&self.url, &stage.to_string(), at);
        self.history.push(StageEvent { stage, at });
    }
}

/// Runs one URL through fetch, extract, translate, chunk and send.
///
/// Cloning is cheap; every clone shares the same collaborators and
/// in-flight set.
#[derive(Clone)]
pub struct Dispatcher {
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<Extractor>,
    model: Arc<dyn TranslationModel>,
    messenger: Arc<dyn Messenger>,
    in_flight: InFlightSet,
    config: Arc<DispatchConfig>,
}

impl Dispatcher {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        extractor: Extractor,
        model: Arc<dyn TranslationModel>,
        messenger: Arc<dyn Messenger>,
        in_flight: InFlightSet,
        config: DispatchConfig,
    ) -> Self {
        Self {
            fetcher,
            extractor: Arc::new(extractor),
            model,
            messenger,
            in_flight,
            config: Arc::new(config),
        }
    }

    pub fn in_flight(&self) -> &InFlightSet {
        &self.in_flight
    }

    pub async fn dispatch(&self, trigger: Trigger) -> DispatchReport {
        let url = trigger.url().to_string();
        let log = Logger::new().with_new_prefixes(format!("[{}]", url));

        let Some(guard) = self.in_flight.try_acquire(&url) else {
            log.info("⏭️ Already being processed, skipping");
            return DispatchReport {
                url,
                trigger,
                history: Vec::new(),
                outcome: Outcome::Duplicate,
            };
        };

        let mut progress = Progress {
            url: url.clone(),
            log: log.clone(),
            history: Vec::new(),
        };
        progress.enter(Stage::Idle);
        log.info(&format!("🔗 Picked up link ({})", trigger));

        if let Some(chat) = trigger.reply_to() {
            self.notify(&log, chat, &acknowledgement(&url)).await;
        }

        let result = self.run(&trigger, &mut progress).await;
        drop(guard);

        let outcome = match result {
            Ok(segments) => {
                progress.enter(Stage::Done);
                log.info(&format!("✅ Delivered {} segment(s)", segments));
                Outcome::Delivered { segments }
            }
            Err(err) => {
                progress.enter(Stage::Failed);
                log.error(&format!("❌ Failed while {}: {}", err.stage().verb(), err));
                if let Some(chat) = trigger.reply_to() {
                    self.notify(&log, chat, &failure_notice(&url, &err)).await;
                }
                Outcome::Failed(err)
            }
        };

        DispatchReport {
            url,
            trigger,
            history: progress.history,
            outcome,
        }
    }

    /// Tells `chat` how to use the translate command.
    pub async fn reply_usage(&self, chat: &ChatId) {
        let log = Logger::new().with_new_prefixes(format!("[{}]", chat));
        self.notify(&log, chat, USAGE).await;
    }

    async fn run(&self, trigger: &Trigger, progress: &mut Progress) -> Result<usize, DispatchError> {
        let url = trigger.url();
        let log = progress.log.clone();
        let config = &self.config;

        progress.enter(Stage::Fetching);
        log.info("📰 Fetching article");
        let source = config
            .fetch_retry
            .run(&log, "fetch", move || self.fetch_once(url), FetchError::is_retryable)
            .await
            .map_err(DispatchError::Fetch)?;

        progress.enter(Stage::Extracting);
        let article = self
            .extractor
            .extract(&source.raw_document)
            .map_err(DispatchError::Extract)?;
        log.info(&format!(
            "📝 Extracted {} chars{}",
            article.body.chars().count(),
            if article.title.is_some() { " and a headline" } else { "" }
        ));

        progress.enter(Stage::Translating);
        log.info(&format!("🤖 Translating with {}", self.model.name()));
        let body = self
            .translate(&log, &article.body, TextKind::Body)
            .await
            .map_err(DispatchError::Translate)?;

        let title = match article.title.as_deref() {
            Some(title) if config.translate_title => {
                match self.translate(&log, title, TextKind::Title).await {
                    Ok(title) => Some(title),
                    Err(err) => {
                        log.warn(&format!("⚠️ Headline translation failed, sending without it: {}", err));
                        None
                    }
                }
            }
            _ => None,
        };
        log.info(&format!("✨ Translation ready ({} chars)", body.chars().count()));

        progress.enter(Stage::Chunking);
        let text = compose(
            title.as_deref(),
            &body,
            config.append_source_link.then_some(url),
        );
        let segments = message_segments(&text, config.max_segment_chars);

        progress.enter(Stage::Sending);
        let destination = trigger.reply_to().unwrap_or(&config.destination);
        let total = segments.len();
        log.info(&format!("📤 Sending {} segment(s) to {}", total, destination));

        for (index, segment) in segments.iter().enumerate() {
            if index > 0 && !config.segment_delay.is_zero() {
                sleep(config.segment_delay).await;
            }
            self.send(destination, segment)
                .await
                .map_err(|error| DispatchError::Send {
                    error,
                    delivered: index,
                    total,
                })?;
            log.debug(&format!("Sent segment {}/{}", index + 1, total));
        }

        Ok(total)
    }

    async fn fetch_once(&self, url: &str) -> Result<ArticleSource, FetchError> {
        match timeout(self.config.fetch_timeout, self.fetcher.fetch(url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout),
        }
    }

    async fn translate(&self, log: &Logger, text: &str, kind: TextKind) -> Result<String, TranslationFailure> {
        let label = match kind {
            TextKind::Body => "translation",
            TextKind::Title => "headline translation",
        };
        self.config
            .translate_retry
            .run(log, label, move || self.translate_once(text, kind), TranslationFailure::is_retryable)
            .await
    }

    async fn translate_once(&self, text: &str, kind: TextKind) -> Result<String, TranslationFailure> {
        match timeout(self.config.translate_timeout, self.model.translate(text, kind)).await {
            Ok(result) => result,
            Err(_) => Err(TranslationFailure::Timeout),
        }
    }

    async fn send(&self, chat: &ChatId, text: &str) -> Result<(), SendError> {
        match timeout(self.config.send_timeout, self.messenger.send_message(chat, text)).await {
            Ok(result) => result,
            Err(_) => Err(SendError::Timeout),
        }
    }

    async fn notify(&self, log: &Logger, chat: &ChatId, text: &str) {
        if let Err(err) = self.send(chat, text).await {
            log.warn(&format!("⚠️ Could not reply to {}: {}", chat, err));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_stage() {
        assert_eq!(DispatchError::Fetch(FetchError::Timeout).stage(), Stage::Fetching);
        assert_eq!(
            DispatchError::Extract(ExtractionFailure::NoContentFound).stage(),
            Stage::Extracting
        );
        assert_eq!(
            DispatchError::Translate(TranslationFailure::Timeout).stage(),
            Stage::Translating
        );
        let err = DispatchError::Send {
            error: SendError::Timeout,
            delivered: 1,
            total: 3,
        };
        assert_eq!(err.stage(), Stage::Sending);
        assert_eq!(err.to_string(), "sending failed after 1 of 3 segments: timed out");
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::Translating.to_string(), "translating");
        assert_eq!(Stage::Failed.to_string(), "failed");
        assert_eq!(Stage::Fetching.verb(), "fetching");
    }

    #[test]
    fn test_config_defaults() {
        let config = DispatchConfig::new(ChatId::Id(-100));
        assert_eq!(config.max_segment_chars, 4000);
        assert_eq!(config.segment_delay, Duration::from_secs(1));
        assert_eq!(config.fetch_retry.max_attempts, 3);
        assert!(config.append_source_link);
    }
}
