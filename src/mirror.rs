//! Read-only mirror of the user/engine state the server owns.
//!
//! The session folds change-event payloads into one snapshot and publishes
//! it on a watch channel; views only ever read it. This replaces the usual
//! pattern of globally shared mutable caches with injected state.

use crate::session::wire::EventFrame;

/// Locally cached copies of the values the withdrawal form gates on.
#[derive(Debug, Clone, PartialEq)]
pub struct MirrorState {
    pub uname: Option<String>,
    /// The user's fractional share of the bankroll, in `[0, 1]`.
    pub stake: f64,
    /// Total bankroll in smallest currency units.
    pub bankroll: u64,
}

impl Default for MirrorState {
    fn default() -> Self {
        Self {
            uname: None,
            stake: 0.0,
            bankroll: 0,
        }
    }
}

impl MirrorState {
    /// Fold one server event into the snapshot. Events without a state
    /// payload (`gameEnded`) leave it untouched.
    pub fn apply_event(&mut self, event: &EventFrame) {
        match event {
            EventFrame::BankrollChanged { bankroll } => self.bankroll = *bankroll,
            EventFrame::BankrollStatsChanged { stake } => self.stake = *stake,
            EventFrame::UnameChanged { uname } => self.uname = Some(uname.clone()),
            EventFrame::GameEnded => {}
        }
    }

    /// The user's slice of the bankroll in base units. Withdrawals are
    /// gated on this falling below the configured minimum.
    pub fn user_share(&self) -> u64 {
        (self.bankroll as f64 * self.stake) as u64
    }
}
