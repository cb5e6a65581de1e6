use std::time::Duration;

use chrono::Utc;
use mt_core::{InboundMessage, Result};
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::client::TelegramClient;
use crate::session::{Session, SessionStore};

const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Feeds Bot API updates into the event loop and persists the offset after
/// every batch.
#[derive(Debug)]
pub struct Poller {
    client: TelegramClient,
    store: SessionStore,
    poll_timeout: Duration,
}

impl Poller {
    pub fn new(client: TelegramClient, store: SessionStore, poll_timeout: Duration) -> Self {
        Self {
            client,
            store,
            poll_timeout,
        }
    }

    /// Polls until the receiving side of `inbox` is dropped.
    pub async fn run(self, inbox: mpsc::Sender<InboundMessage>) -> Result<()> {
        let mut session = self.store.load().await?;
        let mut backoff = Duration::from_secs(1);

        loop {
            let updates = tokio::select! {
                _ = inbox.closed() => break,
                result = self.client.get_updates(session.next_offset, self.poll_timeout) => result,
            };

            let updates = match updates {
                Ok(updates) => {
                    backoff = Duration::from_secs(1);
                    updates
                }
                Err(err) => {
                    warn!("📡 Polling failed ({}), retrying in {:?}", err, backoff);
                    sleep(backoff).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                    continue;
                }
            };
            if updates.is_empty() {
                continue;
            }

            let mut closed = false;
            for update in updates {
                let id = update.update_id;
                if let Some(message) = update.into_inbound() {
                    if inbox.send(message).await.is_err() {
                        closed = true;
                        break;
                    }
                }
                session.next_offset = id + 1;
            }
            self.persist(&mut session).await?;
            if closed {
                break;
            }
        }

        info!("📡 Inbox closed, stopping poller at offset {}", session.next_offset);
        Ok(())
    }

    async fn persist(&self, session: &mut Session) -> Result<()> {
        session.updated_at = Some(Utc::now());
        self.store.save(session).await
    }
}
