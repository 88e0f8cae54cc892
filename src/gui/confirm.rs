//! Modal confirmation prompt bridging the async protocol and the
//! immediate-mode GUI.
//!
//! The protocol awaits `Confirm::confirm`; that parks a prompt in shared
//! state which the app renders as a modal each frame until the user answers
//! through the oneshot channel.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::divest::Confirm;

/// A prompt waiting for the user's answer.
pub struct PendingPrompt {
    pub message: String,
    answer: Option<oneshot::Sender<bool>>,
}

impl PendingPrompt {
    /// Resolve the prompt. Safe to call once; later calls are no-ops.
    pub fn answer(&mut self, accepted: bool) {
        if let Some(tx) = self.answer.take() {
            let _ = tx.send(accepted);
        }
    }
}

/// Shared confirm collaborator handed to the protocol and the app.
#[derive(Clone, Default)]
pub struct ModalConfirm {
    pending: Arc<Mutex<Option<PendingPrompt>>>,
}

impl ModalConfirm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow the pending prompt, if any. The app renders and answers it.
    pub fn with_pending<R>(&self, f: impl FnOnce(&mut PendingPrompt) -> R) -> Option<R> {
        let mut slot = self.pending.lock().ok()?;
        slot.as_mut().map(f)
    }

    pub fn has_pending(&self) -> bool {
        self.pending
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }

    /// Clear the prompt. Called after an answer and on view teardown;
    /// dropping an unanswered sender reads as a decline.
    pub fn clear(&self) {
        if let Ok(mut slot) = self.pending.lock() {
            *slot = None;
        }
    }
}

#[async_trait]
impl Confirm for ModalConfirm {
    async fn confirm(&self, message: &str) -> bool {
        let (tx, rx) = oneshot::channel();
        {
            let Ok(mut slot) = self.pending.lock() else {
                return false;
            };
            *slot = Some(PendingPrompt {
                message: message.to_string(),
                answer: Some(tx),
            });
        }
        // A dropped sender (teardown, replaced prompt) counts as a decline
        rx.await.unwrap_or(false)
    }
}
