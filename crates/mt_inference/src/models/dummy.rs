use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use mt_core::{TextKind, TranslationFailure, TranslationModel};

/// Offline backend: answers every request with a fixed text, or echoes the
/// input when no text is set.
pub struct DummyModel {
    reply: Option<String>,
    calls: AtomicUsize,
}

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel")
            .field("calls", &self.calls.load(Ordering::SeqCst))
            .finish()
    }
}

impl DummyModel {
    pub fn echo() -> Self {
        Self {
            reply: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn fixed(reply: impl Into<String>) -> Self {
        Self {
            reply: Some(reply.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranslationModel for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn translate(&self, text: &str, _kind: TextKind) -> Result<String, TranslationFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone().unwrap_or_else(|| text.to_string()))
    }
}
