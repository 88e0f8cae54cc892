//! WebSocket-backed session client.
//!
//! One task reads server frames, resolving pending requests by id and fanning
//! events out; another drains the outgoing queue. Handles are cheap clones
//! sharing the same pending map and channels.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::{broadcast, mpsc, oneshot, watch, Mutex};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::{ApiError, Session, SessionEvent};
use crate::history::HistoryEntry;
use crate::mirror::MirrorState;
use crate::session::wire::{ClientFrame, EventFrame, RequestBody, ServerFrame};

const EVENT_CHANNEL_CAPACITY: usize = 64;
const RECONNECT_DELAY: Duration = Duration::from_secs(3);

impl From<&EventFrame> for SessionEvent {
    fn from(frame: &EventFrame) -> Self {
        match frame {
            EventFrame::BankrollChanged { .. } => SessionEvent::BankrollChanged,
            EventFrame::GameEnded => SessionEvent::GameEnded,
            EventFrame::BankrollStatsChanged { .. } => SessionEvent::BankrollStatsChanged,
            EventFrame::UnameChanged { .. } => SessionEvent::UnameChanged,
        }
    }
}

/// Socket client for the game server.
pub struct SocketSession {
    url: String,
    next_id: Arc<AtomicU64>,
    tx: Arc<Mutex<Option<mpsc::Sender<ClientFrame>>>>,
    pending: Arc<Mutex<HashMap<u64, oneshot::Sender<Result<Value, ApiError>>>>>,
    events: broadcast::Sender<SessionEvent>,
    mirror_tx: Arc<watch::Sender<MirrorState>>,
}

impl SocketSession {
    pub fn new(url: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (mirror_tx, _) = watch::channel(MirrorState::default());
        Self {
            url: url.into(),
            next_id: Arc::new(AtomicU64::new(1)),
            tx: Arc::new(Mutex::new(None)),
            pending: Arc::new(Mutex::new(HashMap::new())),
            events,
            mirror_tx: Arc::new(mirror_tx),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Connect and pump frames until the connection drops.
    pub async fn run(&self) -> Result<()> {
        let (ws_stream, _) = connect_async(&self.url).await?;
        tracing::info!("Connected to game server at {}", self.url);

        let (mut write, mut read) = ws_stream.split();

        let (tx, mut rx) = mpsc::channel::<ClientFrame>(32);
        {
            let mut tx_lock = self.tx.lock().await;
            *tx_lock = Some(tx);
        }

        let pending = Arc::clone(&self.pending);
        let events = self.events.clone();
        let mirror_tx = Arc::clone(&self.mirror_tx);

        let read_handle = tokio::spawn(async move {
            while let Some(msg) = read.next().await {
                match msg {
                    Ok(Message::Text(text)) => match serde_json::from_str::<ServerFrame>(&text) {
                        Ok(ServerFrame::Response { id, result, error }) => {
                            let mut pending = pending.lock().await;
                            if let Some(waiter) = pending.remove(&id) {
                                let outcome = match error {
                                    Some(code) => Err(ApiError::from_wire(code)),
                                    None => Ok(result),
                                };
                                let _ = waiter.send(outcome);
                            } else {
                                tracing::warn!("Response for unknown request id {}", id);
                            }
                        }
                        Ok(ServerFrame::Event { event }) => {
                            mirror_tx.send_modify(|state| state.apply_event(&event));
                            // No subscribers yet is fine; events are best-effort
                            let _ = events.send(SessionEvent::from(&event));
                        }
                        Err(e) => {
                            tracing::warn!("Failed to parse server frame: {}", e);
                        }
                    },
                    Ok(Message::Close(_)) => {
                        tracing::info!("Server closed connection");
                        break;
                    }
                    Ok(Message::Ping(_)) => {}
                    Err(e) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }
        });

        let write_handle = tokio::spawn(async move {
            while let Some(frame) = rx.recv().await {
                let json = match serde_json::to_string(&frame) {
                    Ok(j) => j,
                    Err(e) => {
                        tracing::error!("Failed to serialize frame: {}", e);
                        continue;
                    }
                };
                if let Err(e) = write.send(Message::Text(json)).await {
                    tracing::error!("Failed to send frame: {}", e);
                    break;
                }
            }
        });

        tokio::select! {
            _ = read_handle => {}
            _ = write_handle => {}
        }

        self.disconnect().await;
        Ok(())
    }

    /// Keep the session alive, reconnecting after a short delay whenever the
    /// connection drops.
    pub async fn run_with_reconnect(self: Arc<Self>) {
        loop {
            if let Err(e) = self.run().await {
                tracing::warn!("Session connection failed: {}", e);
            }
            tokio::time::sleep(RECONNECT_DELAY).await;
        }
    }

    async fn disconnect(&self) {
        {
            let mut tx_lock = self.tx.lock().await;
            *tx_lock = None;
        }
        // Dropping the waiters makes in-flight requests observe the loss
        let mut pending = self.pending.lock().await;
        let count = pending.len();
        pending.clear();
        if count > 0 {
            tracing::debug!("Dropped {} pending requests on disconnect", count);
        }
    }

    /// Send a request and await its correlated response. There is
    /// deliberately no timeout: a blocked divest legitimately waits as long
    /// as the server needs.
    async fn request(&self, body: RequestBody) -> Result<Value, ApiError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (waiter_tx, waiter_rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().await;
            pending.insert(id, waiter_tx);
        }

        let sender = {
            let tx_lock = self.tx.lock().await;
            tx_lock.clone()
        };
        let Some(sender) = sender else {
            self.pending.lock().await.remove(&id);
            return Err(ApiError::Transport("not connected".to_string()));
        };

        if sender.send(ClientFrame { id, body }).await.is_err() {
            self.pending.lock().await.remove(&id);
            return Err(ApiError::Transport("connection closed".to_string()));
        }

        waiter_rx
            .await
            .map_err(|_| ApiError::Transport("connection closed".to_string()))?
    }
}

#[async_trait]
impl Session for SocketSession {
    async fn bankroll_history(&self) -> Result<Vec<HistoryEntry>, ApiError> {
        let result = self.request(RequestBody::GetBankrollHistory).await?;
        serde_json::from_value(result)
            .map_err(|e| ApiError::Transport(format!("malformed history payload: {}", e)))
    }

    async fn divest(&self, amount: u64) -> Result<(), ApiError> {
        self.request(RequestBody::Divest { amount }).await.map(|_| ())
    }

    fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn mirror(&self) -> watch::Receiver<MirrorState> {
        self.mirror_tx.subscribe()
    }
}

impl Clone for SocketSession {
    fn clone(&self) -> Self {
        Self {
            url: self.url.clone(),
            next_id: Arc::clone(&self.next_id),
            tx: Arc::clone(&self.tx),
            pending: Arc::clone(&self.pending),
            events: self.events.clone(),
            mirror_tx: Arc::clone(&self.mirror_tx),
        }
    }
}
