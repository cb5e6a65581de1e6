use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use async_trait::async_trait;
use clap::Parser;
use mt_core::{ChatId, Fetcher, Messenger, SendError};
use mt_dispatch::{init_logging, Dispatcher, EventLoop, InFlightSet, Logger, Outcome, RetryPolicy, Trigger};
use mt_extractor::{first_url, Extractor, HttpFetcher};
use mt_telegram::{Poller, SessionStore, TelegramClient};
use tokio::sync::mpsc;
use tracing::info;

mod config;

use config::{Cli, Commands};

const POLL_TIMEOUT: Duration = Duration::from_secs(50);

/// Prints messages instead of sending them, for `translate --dry-run`.
struct StdoutMessenger;

#[async_trait]
impl Messenger for StdoutMessenger {
    async fn send_message(&self, chat: &ChatId, text: &str) -> Result<(), SendError> {
        println!("----- to {} ({} chars) -----\n{}\n", chat, text.chars().count(), text);
        Ok(())
    }
}

fn telegram_client(cli: &Cli) -> anyhow::Result<TelegramClient> {
    let token = cli
        .telegram_bot_token
        .clone()
        .context("TELEGRAM_BOT_TOKEN is required")?;
    Ok(TelegramClient::new(token, None, POLL_TIMEOUT + Duration::from_secs(10))?)
}

async fn check_telegram_with_retry(client: &TelegramClient) -> anyhow::Result<String> {
    let log = Logger::new().with_prefix("[telegram]".to_string());
    let username = RetryPolicy::default()
        .run(&log, "login check", || client.get_me(), |_| true)
        .await?;
    Ok(username)
}

fn build_dispatcher(cli: &Cli, messenger: Arc<dyn Messenger>, destination: ChatId) -> anyhow::Result<Dispatcher> {
    let model = mt_inference::create_model(&cli.inference_config())?;
    let fetcher = HttpFetcher::new(cli.fetch_timeout.0)?;
    Ok(Dispatcher::new(
        Arc::new(fetcher),
        Extractor::new(cli.extractor_config()),
        model,
        messenger,
        InFlightSet::default(),
        cli.dispatch_config(destination),
    ))
}

async fn run_bot(cli: &Cli) -> anyhow::Result<()> {
    let source = cli.source_channel.clone().context("SOURCE_CHANNEL_ID is required")?;
    let target = cli.target_channel.clone().context("TARGET_CHANNEL_ID is required")?;

    let client = telegram_client(cli)?;
    let username = check_telegram_with_retry(&client).await?;
    info!("🤖 Connected to Telegram as @{}", username);

    let dispatcher = build_dispatcher(cli, Arc::new(client.clone()), target.clone())?;
    info!("📡 Forwarding translations from {} to {}", source, target);

    let (tx, rx) = mpsc::channel(64);
    let poller = Poller::new(client, SessionStore::new(cli.session_file.clone()), POLL_TIMEOUT);
    let event_loop = EventLoop::new(dispatcher, source);

    tokio::select! {
        stats = event_loop.run(rx) => info!("👋 Event loop finished: {:?}", stats),
        result = poller.run(tx) => result?,
        _ = tokio::signal::ctrl_c() => info!("🛑 Interrupted, shutting down"),
    }
    Ok(())
}

async fn translate_once(cli: &Cli, url: &str, dry_run: bool) -> anyhow::Result<()> {
    let url = first_url(url).with_context(|| format!("'{}' is not an http(s) URL", url))?;

    let (messenger, destination): (Arc<dyn Messenger>, ChatId) = if dry_run {
        let destination = cli
            .target_channel
            .clone()
            .unwrap_or_else(|| ChatId::Username("stdout".to_string()));
        (Arc::new(StdoutMessenger), destination)
    } else {
        let destination = cli.target_channel.clone().context("TARGET_CHANNEL_ID is required")?;
        (Arc::new(telegram_client(cli)?), destination)
    };

    let dispatcher = build_dispatcher(cli, messenger, destination)?;
    let report = dispatcher.dispatch(Trigger::Channel { url }).await;
    match report.outcome {
        Outcome::Delivered { segments } => {
            info!("✨ Sent {} message(s) for {}", segments, report.url);
            Ok(())
        }
        Outcome::Failed(err) => bail!("{} failed while {}: {}", report.url, err.stage().verb(), err),
        Outcome::Duplicate => bail!("{} is already being processed", report.url),
    }
}

async fn extract_once(cli: &Cli, url: &str) -> anyhow::Result<()> {
    let url = first_url(url).with_context(|| format!("'{}' is not an http(s) URL", url))?;
    let source = HttpFetcher::new(cli.fetch_timeout.0)?
        .fetch(&url)
        .await
        .with_context(|| format!("failed to fetch {}", url))?;
    let article = Extractor::new(cli.extractor_config())
        .extract(&source.raw_document)
        .with_context(|| format!("failed to extract {}", url))?;

    if let Some(title) = &article.title {
        println!("# {}\n", title);
    }
    println!("{}\n", article.body);
    info!(
        "📝 {} paragraph(s), {} chars",
        article.body.split("\n\n").count(),
        article.body.chars().count()
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        match &cli.command {
            Commands::Run => run_bot(&cli).await,
            Commands::Translate { url, dry_run } => translate_once(&cli, url, *dry_run).await,
            Commands::Extract { url } => extract_once(&cli, url).await,
        }
    })
}
