//! Bankroll transaction log entries and their derived display state.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One bankroll transaction as reported by the server. Immutable once
/// received; the server decides the ordering and the client keeps it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: u64,
    pub created: DateTime<Utc>,
    /// Signed amount in smallest currency units; negative for withdrawals.
    pub amount: i64,
    /// Bankroll total at the time of the transaction.
    pub pre_bankroll: u64,
    /// Funds moved offsite as part of this transaction, if any.
    #[serde(default)]
    pub offsite: u64,
}

/// How an entry is labeled in the history table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Added,
    Removed,
}

impl Operation {
    pub fn label(self) -> &'static str {
        match self {
            Operation::Added => "Added",
            Operation::Removed => "Removed",
        }
    }
}

impl HistoryEntry {
    /// An entry counts as an addition when its amount is positive or it
    /// carries a non-zero offsite amount.
    pub fn operation(&self) -> Operation {
        if self.amount > 0 || self.offsite != 0 {
            Operation::Added
        } else {
            Operation::Removed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(id: u64, amount: i64, offsite: u64) -> HistoryEntry {
        HistoryEntry {
            id,
            created: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            amount,
            pre_bankroll: 1_000_000,
            offsite,
        }
    }

    #[test]
    fn test_positive_amount_is_added() {
        assert_eq!(entry(1, 500, 0).operation(), Operation::Added);
    }

    #[test]
    fn test_negative_amount_is_removed() {
        assert_eq!(entry(2, -200, 0).operation(), Operation::Removed);
    }

    #[test]
    fn test_offsite_forces_added_even_when_amount_negative() {
        assert_eq!(entry(3, -200, 50).operation(), Operation::Added);
    }

    #[test]
    fn test_zero_amount_no_offsite_is_removed() {
        assert_eq!(entry(4, 0, 0).operation(), Operation::Removed);
    }

    #[test]
    fn test_deserialize_with_absent_offsite() {
        let raw = r#"{"id":11,"created":"2024-05-01T12:00:00Z","amount":-300,"preBankroll":90000}"#;
        let parsed: HistoryEntry = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.offsite, 0);
        assert_eq!(parsed.amount, -300);
        assert_eq!(parsed.pre_bankroll, 90_000);
    }
}
