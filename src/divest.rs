//! Withdrawal ("remove from bankroll") submission protocol.
//!
//! The interesting contract in this app: a validated, user-confirmed divest
//! that survives the server rejecting it mid-game. On `NOT_IN_BETWEEN_GAMES`
//! the protocol parks in a blocking state, waits for exactly one `gameEnded`
//! delivery, and resubmits the identical amount. Everything here is GUI-free
//! so the whole flow is testable against a scripted session.

use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;

use crate::config::BITS_SCALE;
use crate::format::format_bits;
use crate::session::{ApiError, Session, SessionEvent};

/// Client-side validation failures, shown inline and never submitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("Not a number")]
    NotANumber,
    #[error("Must be a positive amount")]
    NotPositive,
    #[error("Amount is too large")]
    TooLarge,
    #[error("Cannot withdraw less than {} bits", format_bits(*min))]
    BelowMinimum { min: u64 },
}

/// How much to withdraw, in smallest currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DivestAmount {
    Exact(u64),
    /// The "withdraw everything" sentinel, entered as `*`.
    All,
}

impl DivestAmount {
    /// The value that goes on the wire. `All` maps to the maximum
    /// representable amount; the server clamps it to the actual balance.
    pub fn base_units(self) -> u64 {
        match self {
            DivestAmount::Exact(units) => units,
            DivestAmount::All => u64::MAX,
        }
    }
}

/// One submission attempt. Transient; rebuilt from the form on every submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DivestRequest {
    pub amount: DivestAmount,
    /// Secondary offsite amount from the advanced fields. Collected for
    /// display parity with the server's accounting; not part of the RPC.
    pub offsite: u64,
}

impl DivestRequest {
    pub fn confirm_message(&self) -> String {
        let formatted = match self.amount {
            DivestAmount::All => "all your".to_string(),
            DivestAmount::Exact(units) => format_bits(units),
        };
        format!(
            "Are you sure you want to remove {} bits from the bankroll?",
            formatted
        )
    }
}

/// Parse raw amount text. `*` bypasses numeric validation entirely; anything
/// else must be a positive number of bits no smaller than `min_divest`
/// (given in base units).
pub fn parse_amount(text: &str, min_divest: u64) -> Result<DivestAmount, AmountError> {
    let trimmed = text.trim();
    if trimmed == "*" {
        return Ok(DivestAmount::All);
    }

    let bits: f64 = trimmed.parse().map_err(|_| AmountError::NotANumber)?;
    if !bits.is_finite() || bits <= 0.0 {
        return Err(AmountError::NotPositive);
    }

    let base = (bits * BITS_SCALE as f64).round();
    if base >= u64::MAX as f64 {
        return Err(AmountError::TooLarge);
    }
    let base = base as u64;
    if base < min_divest {
        return Err(AmountError::BelowMinimum { min: min_divest });
    }
    Ok(DivestAmount::Exact(base))
}

/// The user-facing yes/no prompt shown before anything touches the network.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Confirm: Send + Sync {
    async fn confirm(&self, message: &str) -> bool;
}

/// Where the submission currently stands, published for the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DivestPhase {
    #[default]
    Idle,
    Submitting,
    /// Waiting for the current game to end before resubmitting.
    Blocking,
}

/// Terminal result of one protocol run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DivestOutcome {
    /// The server accepted the withdrawal; caller navigates home.
    Completed,
    /// The user declined the confirmation prompt. No RPC was issued.
    Declined,
    /// The view was torn down; no further state may be touched.
    Cancelled,
    /// Unexpected rejection, carrying the raw error text for the
    /// notification feed.
    Failed(String),
}

/// Run one withdrawal end to end: confirm, submit, and retry across
/// `NOT_IN_BETWEEN_GAMES` rejections until the server settles it.
///
/// Invariants: at most one divest RPC is in flight at a time, and each
/// blocking episode consumes exactly one `GameEnded` delivery. The event
/// subscription is scoped to the episode and dropped on every exit path.
pub async fn run_divest(
    session: Arc<dyn Session>,
    confirm: Arc<dyn Confirm>,
    request: DivestRequest,
    phase: watch::Sender<DivestPhase>,
    cancel: CancellationToken,
) -> DivestOutcome {
    let message = request.confirm_message();
    let _ = phase.send(DivestPhase::Submitting);

    let accepted = tokio::select! {
        _ = cancel.cancelled() => return DivestOutcome::Cancelled,
        accepted = confirm.confirm(&message) => accepted,
    };
    if !accepted {
        let _ = phase.send(DivestPhase::Idle);
        return DivestOutcome::Declined;
    }

    // The payload is fixed here; retries must submit the identical amount.
    let amount = request.amount.base_units();

    loop {
        let _ = phase.send(DivestPhase::Submitting);

        let result = tokio::select! {
            _ = cancel.cancelled() => return DivestOutcome::Cancelled,
            result = session.divest(amount) => result,
        };

        match result {
            Ok(()) => {
                let _ = phase.send(DivestPhase::Idle);
                return DivestOutcome::Completed;
            }
            Err(ApiError::NotInBetweenGames) => {
                // Subscribe before announcing Blocking so a prompt game end
                // cannot slip between the two.
                let mut events = session.events();
                let _ = phase.send(DivestPhase::Blocking);
                tracing::info!("Divest blocked by a running game; waiting for it to end");

                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => return DivestOutcome::Cancelled,
                        event = events.recv() => match event {
                            Ok(SessionEvent::GameEnded) => break,
                            Ok(_) => continue,
                            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                                tracing::warn!("Event feed lagged by {} while blocking", skipped);
                                continue;
                            }
                            Err(broadcast::error::RecvError::Closed) => {
                                let _ = phase.send(DivestPhase::Idle);
                                return DivestOutcome::Failed("event feed closed".to_string());
                            }
                        },
                    }
                }
                // Receiver drops here; the next episode gets a fresh one.
            }
            Err(err) => {
                let _ = phase.send(DivestPhase::Idle);
                tracing::error!("Unexpected server error: {}", err);
                return DivestOutcome::Failed(err.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistoryEntry;
    use crate::mirror::MirrorState;
    use std::collections::VecDeque;
    use tokio::sync::Mutex;

    const MIN: u64 = 100 * BITS_SCALE; // 100 bits

    // ==================== parse_amount tests ====================

    #[test]
    fn test_parse_amount_valid() {
        assert_eq!(
            parse_amount("150", MIN),
            Ok(DivestAmount::Exact(15_000))
        );
    }

    #[test]
    fn test_parse_amount_fractional_bits() {
        assert_eq!(
            parse_amount("100.25", MIN),
            Ok(DivestAmount::Exact(10_025))
        );
    }

    #[test]
    fn test_parse_amount_below_minimum() {
        assert_eq!(
            parse_amount("50", MIN),
            Err(AmountError::BelowMinimum { min: MIN })
        );
    }

    #[test]
    fn test_parse_amount_garbage() {
        assert_eq!(parse_amount("abc", MIN), Err(AmountError::NotANumber));
        assert_eq!(parse_amount("", MIN), Err(AmountError::NotANumber));
    }

    #[test]
    fn test_parse_amount_not_positive() {
        assert_eq!(parse_amount("0", MIN), Err(AmountError::NotPositive));
        assert_eq!(parse_amount("-5", MIN), Err(AmountError::NotPositive));
    }

    #[test]
    fn test_parse_amount_star_bypasses_minimum() {
        assert_eq!(parse_amount("*", MIN), Ok(DivestAmount::All));
        assert_eq!(parse_amount("  *  ", MIN), Ok(DivestAmount::All));
    }

    #[test]
    fn test_all_maps_to_max_on_the_wire() {
        assert_eq!(DivestAmount::All.base_units(), u64::MAX);
    }

    #[test]
    fn test_below_minimum_message_is_in_bits() {
        let err = AmountError::BelowMinimum { min: MIN };
        assert_eq!(err.to_string(), "Cannot withdraw less than 100.00 bits");
    }

    // ==================== confirm message tests ====================

    #[test]
    fn test_confirm_message_formats_amount() {
        let request = DivestRequest {
            amount: DivestAmount::Exact(15_000),
            offsite: 0,
        };
        assert_eq!(
            request.confirm_message(),
            "Are you sure you want to remove 150.00 bits from the bankroll?"
        );
    }

    #[test]
    fn test_confirm_message_for_all() {
        let request = DivestRequest {
            amount: DivestAmount::All,
            offsite: 0,
        };
        assert!(request.confirm_message().contains("all your bits"));
    }

    // ==================== protocol tests ====================

    /// Session stub with a scripted sequence of divest responses.
    struct ScriptedSession {
        responses: Mutex<VecDeque<Result<(), ApiError>>>,
        calls: Mutex<Vec<u64>>,
        events: broadcast::Sender<SessionEvent>,
        mirror: watch::Sender<MirrorState>,
    }

    impl ScriptedSession {
        fn new(responses: Vec<Result<(), ApiError>>) -> Arc<Self> {
            let (events, _) = broadcast::channel(16);
            let (mirror, _) = watch::channel(MirrorState::default());
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
                events,
                mirror,
            })
        }

        async fn calls(&self) -> Vec<u64> {
            self.calls.lock().await.clone()
        }
    }

    #[async_trait]
    impl Session for ScriptedSession {
        async fn bankroll_history(&self) -> Result<Vec<HistoryEntry>, ApiError> {
            Ok(Vec::new())
        }

        async fn divest(&self, amount: u64) -> Result<(), ApiError> {
            self.calls.lock().await.push(amount);
            self.responses
                .lock()
                .await
                .pop_front()
                .unwrap_or(Err(ApiError::Server("script exhausted".to_string())))
        }

        fn events(&self) -> broadcast::Receiver<SessionEvent> {
            self.events.subscribe()
        }

        fn mirror(&self) -> watch::Receiver<MirrorState> {
            self.mirror.subscribe()
        }
    }

    fn accepting_confirm() -> Arc<MockConfirm> {
        let mut confirm = MockConfirm::new();
        confirm.expect_confirm().returning(|_| true);
        Arc::new(confirm)
    }

    fn request_of(units: u64) -> DivestRequest {
        DivestRequest {
            amount: DivestAmount::Exact(units),
            offsite: 0,
        }
    }

    #[tokio::test]
    async fn test_happy_path_completes_and_returns_to_idle() {
        let session = ScriptedSession::new(vec![Ok(())]);
        let (phase_tx, phase_rx) = watch::channel(DivestPhase::Idle);

        let outcome = run_divest(
            session.clone(),
            accepting_confirm(),
            request_of(15_000),
            phase_tx,
            CancellationToken::new(),
        )
        .await;

        assert_eq!(outcome, DivestOutcome::Completed);
        assert_eq!(session.calls().await, vec![15_000]);
        assert_eq!(*phase_rx.borrow(), DivestPhase::Idle);
    }

    #[tokio::test]
    async fn test_declined_confirmation_never_submits() {
        let session = ScriptedSession::new(vec![Ok(())]);
        let mut confirm = MockConfirm::new();
        confirm.expect_confirm().returning(|_| false);
        let (phase_tx, phase_rx) = watch::channel(DivestPhase::Idle);

        let outcome = run_divest(
            session.clone(),
            Arc::new(confirm),
            request_of(15_000),
            phase_tx,
            CancellationToken::new(),
        )
        .await;

        assert_eq!(outcome, DivestOutcome::Declined);
        assert!(session.calls().await.is_empty());
        assert_eq!(*phase_rx.borrow(), DivestPhase::Idle);
    }

    #[tokio::test]
    async fn test_confirm_prompt_carries_all_your_bits_wording() {
        let session = ScriptedSession::new(vec![Ok(())]);
        let mut confirm = MockConfirm::new();
        confirm
            .expect_confirm()
            .withf(|message| message.contains("all your bits"))
            .returning(|_| true);
        let (phase_tx, _phase_rx) = watch::channel(DivestPhase::Idle);

        let outcome = run_divest(
            session.clone(),
            Arc::new(confirm),
            DivestRequest {
                amount: DivestAmount::All,
                offsite: 0,
            },
            phase_tx,
            CancellationToken::new(),
        )
        .await;

        assert_eq!(outcome, DivestOutcome::Completed);
        assert_eq!(session.calls().await, vec![u64::MAX]);
    }

    #[tokio::test]
    async fn test_blocked_divest_retries_identical_payload_once() {
        let session = ScriptedSession::new(vec![
            Err(ApiError::NotInBetweenGames),
            Ok(()),
        ]);
        let (phase_tx, mut phase_rx) = watch::channel(DivestPhase::Idle);
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(run_divest(
            session.clone(),
            accepting_confirm(),
            request_of(15_000),
            phase_tx,
            cancel,
        ));

        phase_rx
            .wait_for(|phase| *phase == DivestPhase::Blocking)
            .await
            .unwrap();

        // Two deliveries, but the blocking episode consumes exactly one
        session.events.send(SessionEvent::GameEnded).unwrap();
        let _ = session.events.send(SessionEvent::GameEnded);

        let outcome = handle.await.unwrap();
        assert_eq!(outcome, DivestOutcome::Completed);
        assert_eq!(session.calls().await, vec![15_000, 15_000]);
    }

    #[tokio::test]
    async fn test_blocking_ignores_unrelated_events() {
        let session = ScriptedSession::new(vec![
            Err(ApiError::NotInBetweenGames),
            Ok(()),
        ]);
        let (phase_tx, mut phase_rx) = watch::channel(DivestPhase::Idle);

        let handle = tokio::spawn(run_divest(
            session.clone(),
            accepting_confirm(),
            request_of(15_000),
            phase_tx,
            CancellationToken::new(),
        ));

        phase_rx
            .wait_for(|phase| *phase == DivestPhase::Blocking)
            .await
            .unwrap();

        session.events.send(SessionEvent::BankrollChanged).unwrap();
        session.events.send(SessionEvent::UnameChanged).unwrap();
        assert_eq!(session.calls().await, vec![15_000]);

        session.events.send(SessionEvent::GameEnded).unwrap();
        assert_eq!(handle.await.unwrap(), DivestOutcome::Completed);
        assert_eq!(session.calls().await, vec![15_000, 15_000]);
    }

    #[tokio::test]
    async fn test_cancelled_while_blocking_stops_cold() {
        let session = ScriptedSession::new(vec![Err(ApiError::NotInBetweenGames)]);
        let (phase_tx, mut phase_rx) = watch::channel(DivestPhase::Idle);
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(run_divest(
            session.clone(),
            accepting_confirm(),
            request_of(15_000),
            phase_tx,
            cancel.clone(),
        ));

        phase_rx
            .wait_for(|phase| *phase == DivestPhase::Blocking)
            .await
            .unwrap();

        cancel.cancel();
        assert_eq!(handle.await.unwrap(), DivestOutcome::Cancelled);

        // A late game end must not trigger a resubmission
        let _ = session.events.send(SessionEvent::GameEnded);
        assert_eq!(session.calls().await, vec![15_000]);
    }

    #[tokio::test]
    async fn test_unexpected_error_fails_with_raw_message() {
        let session = ScriptedSession::new(vec![Err(ApiError::Server(
            "INSUFFICIENT_FUNDS".to_string(),
        ))]);
        let (phase_tx, phase_rx) = watch::channel(DivestPhase::Idle);

        let outcome = run_divest(
            session.clone(),
            accepting_confirm(),
            request_of(15_000),
            phase_tx,
            CancellationToken::new(),
        )
        .await;

        assert_eq!(
            outcome,
            DivestOutcome::Failed("INSUFFICIENT_FUNDS".to_string())
        );
        assert_eq!(*phase_rx.borrow(), DivestPhase::Idle);
    }
}
