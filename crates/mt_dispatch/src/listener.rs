use mt_core::{ChatId, InboundMessage};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

use crate::dispatcher::{DispatchReport, Dispatcher, Outcome};
use crate::trigger::{route, Action};

/// Counters for one run of the event loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub received: usize,
    pub delivered: usize,
    pub failed: usize,
    pub duplicates: usize,
    pub usage_replies: usize,
}

/// Consumes inbound messages and spawns one dispatch task per detected link.
pub struct EventLoop {
    dispatcher: Dispatcher,
    source: ChatId,
}

impl EventLoop {
    pub fn new(dispatcher: Dispatcher, source: ChatId) -> Self {
        Self { dispatcher, source }
    }

    /// Runs until `inbox` closes, then waits for the remaining tasks.
    pub async fn run(self, mut inbox: mpsc::Receiver<InboundMessage>) -> LoopStats {
        let mut stats = LoopStats::default();
        let mut tasks: JoinSet<Option<DispatchReport>> = JoinSet::new();
        info!("👂 Listening for links in {}", self.source);

        loop {
            tokio::select! {
                message = inbox.recv() => match message {
                    Some(message) => self.handle(message, &mut tasks, &mut stats),
                    None => break,
                },
                Some(finished) = tasks.join_next() => record(finished, &mut stats),
            }
        }

        if !tasks.is_empty() {
            info!("⏳ Inbox closed, waiting for {} running task(s)", tasks.len());
        }
        while let Some(finished) = tasks.join_next().await {
            record(finished, &mut stats);
        }
        stats
    }

    fn handle(
        &self,
        message: InboundMessage,
        tasks: &mut JoinSet<Option<DispatchReport>>,
        stats: &mut LoopStats,
    ) {
        stats.received += 1;
        match route(&message, &self.source) {
            Some(Action::Dispatch(trigger)) => {
                let dispatcher = self.dispatcher.clone();
                tasks.spawn(async move { Some(dispatcher.dispatch(trigger).await) });
            }
            Some(Action::Usage(chat)) => {
                stats.usage_replies += 1;
                let dispatcher = self.dispatcher.clone();
                tasks.spawn(async move {
                    dispatcher.reply_usage(&chat).await;
                    None
                });
            }
            None => debug!("Ignoring message from chat {}", message.chat.id),
        }
    }
}

fn record(finished: Result<Option<DispatchReport>, JoinError>, stats: &mut LoopStats) {
    match finished {
        Ok(Some(report)) => match report.outcome {
            Outcome::Delivered { .. } => stats.delivered += 1,
            Outcome::Failed(_) => stats.failed += 1,
            Outcome::Duplicate => stats.duplicates += 1,
        },
        Ok(None) => {}
        Err(err) if err.is_cancelled() => warn!("Dispatch task cancelled"),
        Err(err) => {
            error!("Dispatch task panicked: {}", err);
            stats.failed += 1;
        }
    }
}
