use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use clap::Parser;
use mt_core::{Backend, ChatId};
use mt_dispatch::{DispatchConfig, RetryPolicy};
use mt_extractor::ExtractorConfig;

/// Durations such as `30s`, `3m` or `1h15m`. A bare number is seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HumanDuration(pub Duration);

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let overflow = || format!("Duration '{}' is too large", s);
        let mut total_ms = 0u64;
        let mut number = String::new();
        let mut chars = s.trim().chars().peekable();
        let mut seen_number = false;

        while let Some(c) = chars.next() {
            if c.is_ascii_digit() {
                number.push(c);
                continue;
            }
            if c.is_whitespace() {
                while chars.peek().map_or(false, |c| c.is_whitespace()) {
                    chars.next();
                }
                if !number.is_empty() && chars.peek().map_or(false, char::is_ascii_digit) {
                    return Err(format!("Missing unit after '{}' in '{}'", number, s));
                }
                continue;
            }
            let value: u64 = number
                .parse()
                .map_err(|_| format!("Expected a number before '{}' in '{}'", c, s))?;
            number.clear();
            seen_number = true;
            let factor = match c {
                'm' if chars.peek() == Some(&'s') => {
                    chars.next();
                    1
                }
                's' => 1_000,
                'm' => 60_000,
                'h' => 3_600_000,
                _ => return Err(format!("Invalid duration unit '{}' in '{}'", c, s)),
            };
            total_ms = value
                .checked_mul(factor)
                .and_then(|ms| total_ms.checked_add(ms))
                .ok_or_else(overflow)?;
        }

        if !number.is_empty() {
            let seconds = number
                .parse::<u64>()
                .map_err(|_| format!("Invalid number in duration '{}'", s))?;
            total_ms = seconds
                .checked_mul(1_000)
                .and_then(|ms| total_ms.checked_add(ms))
                .ok_or_else(overflow)?;
            seen_number = true;
        }
        if !seen_number {
            return Err("Duration must include a number".to_string());
        }
        Ok(HumanDuration(Duration::from_millis(total_ms)))
    }
}

#[derive(Parser, Debug)]
#[command(name = "mt", author, version, about = "Translate Mihaaru articles into English on Telegram", long_about = None)]
pub struct Cli {
    /// Translation backend: openai or anthropic
    #[arg(long, env = "TRANSLATION_PROVIDER", default_value = "openai")]
    pub provider: Backend,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub anthropic_api_key: Option<String>,

    #[arg(long, env = "OPENAI_MODEL_NAME")]
    pub openai_model: Option<String>,

    #[arg(long, env = "ANTHROPIC_MODEL_NAME")]
    pub anthropic_model: Option<String>,

    #[arg(long, env = "OPENAI_BASE_URL")]
    pub openai_base_url: Option<String>,

    #[arg(long, env = "ANTHROPIC_BASE_URL")]
    pub anthropic_base_url: Option<String>,

    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    pub telegram_bot_token: Option<String>,

    /// Where the update offset is kept between runs
    #[arg(long, env = "TELEGRAM_SESSION_FILE", default_value = "mt_session.json")]
    pub session_file: PathBuf,

    /// Channel watched for article links (numeric id or @username)
    #[arg(long, env = "SOURCE_CHANNEL_ID")]
    pub source_channel: Option<ChatId>,

    /// Channel receiving the translations
    #[arg(long, env = "TARGET_CHANNEL_ID")]
    pub target_channel: Option<ChatId>,

    #[arg(long, default_value_t = 4000)]
    pub max_message_chars: usize,

    /// Paragraphs shorter than this are dropped by the unstyled fallback
    #[arg(long, default_value_t = 40)]
    pub min_paragraph_chars: usize,

    #[arg(long, default_value_t = 50)]
    pub min_article_chars: usize,

    #[arg(long, default_value = "30s")]
    pub fetch_timeout: HumanDuration,

    #[arg(long, default_value = "3m")]
    pub translate_timeout: HumanDuration,

    #[arg(long, default_value = "30s")]
    pub send_timeout: HumanDuration,

    /// Pause between the parts of one article
    #[arg(long, default_value = "1s")]
    pub segment_delay: HumanDuration,

    /// Attempts for retryable fetch and translation failures
    #[arg(long, default_value_t = 3)]
    pub retry_attempts: u32,

    /// Leave out the "Original article" footer
    #[arg(long)]
    pub no_source_link: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Watch the source channel and answer /translate commands
    Run,
    /// Translate one article and post it to the target channel
    Translate {
        url: String,
        /// Print the messages instead of sending them
        #[arg(long)]
        dry_run: bool,
    },
    /// Print what would be extracted from an article
    Extract { url: String },
}

impl Cli {
    pub fn inference_config(&self) -> mt_inference::Config {
        let (api_key, model_name, base_url) = match self.provider {
            Backend::OpenAi => (&self.openai_api_key, &self.openai_model, &self.openai_base_url),
            Backend::Anthropic => (
                &self.anthropic_api_key,
                &self.anthropic_model,
                &self.anthropic_base_url,
            ),
        };
        mt_inference::Config {
            model_name: model_name.clone(),
            base_url: base_url.clone(),
            request_timeout: self.translate_timeout.0,
            ..mt_inference::Config::new(self.provider, api_key.clone())
        }
    }

    pub fn extractor_config(&self) -> ExtractorConfig {
        ExtractorConfig {
            min_paragraph_chars: self.min_paragraph_chars,
            min_article_chars: self.min_article_chars,
            ..ExtractorConfig::default()
        }
    }

    pub fn dispatch_config(&self, destination: ChatId) -> DispatchConfig {
        let retry = RetryPolicy::new(self.retry_attempts, Duration::from_secs(2));
        DispatchConfig {
            max_segment_chars: self.max_message_chars,
            fetch_timeout: self.fetch_timeout.0,
            translate_timeout: self.translate_timeout.0,
            send_timeout: self.send_timeout.0,
            fetch_retry: retry.clone(),
            translate_retry: retry,
            segment_delay: self.segment_delay.0,
            append_source_link: !self.no_source_link,
            ..DispatchConfig::new(destination)
        }
    }
}
