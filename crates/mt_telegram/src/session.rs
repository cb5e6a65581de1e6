use std::path::PathBuf;

use chrono::{DateTime, Utc};
use mt_core::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// What the bot needs to resume where it stopped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// First update id not yet processed.
    pub next_offset: i64,
    pub updated_at: Option<DateTime<Utc>>,
}

/// JSON file holding the [`Session`].
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// A missing file is a fresh session.
    pub async fn load(&self) -> Result<Session> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => {
                let session: Session = serde_json::from_slice(&bytes)?;
                info!("💾 Resuming session from {} (offset {})", self.path.display(), session.next_offset);
                Ok(session)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!("💾 No session at {}, starting fresh", self.path.display());
                Ok(Session::default())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Writes through a temporary file so a crash never leaves half a file.
    pub async fn save(&self, session: &Session) -> Result<()> {
        let data = serde_json::to_vec_pretty(session)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, data).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!("Saved session offset {}", session.next_offset);
        Ok(())
    }
}
