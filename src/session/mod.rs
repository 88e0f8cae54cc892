//! Remote session service: the socket RPC channel plus the server event feed.
//!
//! Views never talk to the transport directly. They hold a `Session` handle,
//! issue the two RPC operations, and watch the event feed and the user/engine
//! state mirror the session maintains from server pushes.

pub mod socket;
pub mod wire;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{broadcast, watch};

use crate::history::HistoryEntry;
use crate::mirror::MirrorState;

pub use socket::SocketSession;

/// Wire string the server rejects a divest with while a game is running.
pub const NOT_IN_BETWEEN_GAMES: &str = "NOT_IN_BETWEEN_GAMES";

/// Errors surfaced by session operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Expected rejection: a game is in progress. Recovered by retrying
    /// after the next `GameEnded` event, never shown as an error.
    #[error("NOT_IN_BETWEEN_GAMES")]
    NotInBetweenGames,
    /// Any other server rejection, surfaced verbatim.
    #[error("{0}")]
    Server(String),
    /// Connection-level failure.
    #[error("connection error: {0}")]
    Transport(String),
}

impl ApiError {
    /// Map a raw wire error string to the typed taxonomy.
    pub fn from_wire(code: String) -> Self {
        if code == NOT_IN_BETWEEN_GAMES {
            ApiError::NotInBetweenGames
        } else {
            ApiError::Server(code)
        }
    }
}

/// Server-pushed change notifications, fanned out to every subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    BankrollChanged,
    GameEnded,
    BankrollStatsChanged,
    UnameChanged,
}

/// The RPC + event-feed collaborator surface consumed by the views.
#[async_trait]
pub trait Session: Send + Sync {
    /// Fetch the full bankroll transaction log, server-ordered.
    async fn bankroll_history(&self) -> Result<Vec<HistoryEntry>, ApiError>;

    /// Submit a withdrawal, in smallest currency units. `u64::MAX` means
    /// "withdraw everything".
    async fn divest(&self, amount: u64) -> Result<(), ApiError>;

    /// Subscribe to the server event feed. Each receiver sees every event
    /// delivered after the point of subscription.
    fn events(&self) -> broadcast::Receiver<SessionEvent>;

    /// Read-only snapshot of the cached user/engine state, refreshed by the
    /// session as change events arrive.
    fn mirror(&self) -> watch::Receiver<MirrorState>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_wire_not_in_between_games() {
        let err = ApiError::from_wire("NOT_IN_BETWEEN_GAMES".to_string());
        assert_eq!(err, ApiError::NotInBetweenGames);
    }

    #[test]
    fn test_from_wire_other_is_opaque_server_error() {
        let err = ApiError::from_wire("INSUFFICIENT_FUNDS".to_string());
        assert_eq!(err, ApiError::Server("INSUFFICIENT_FUNDS".to_string()));
    }

    #[test]
    fn test_server_error_displays_raw_string() {
        let err = ApiError::Server("something odd".to_string());
        assert_eq!(err.to_string(), "something odd");
    }
}
