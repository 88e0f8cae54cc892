//! Currency display helpers.
//!
//! Amounts travel in the smallest currency unit (one hundredth of a bit);
//! everything user-facing is rendered in bits with two decimals.

use crate::config::BITS_SCALE;

/// Format a base-unit amount as bits, e.g. `12345` -> `"123.45"`.
pub fn format_bits(base_units: u64) -> String {
    format!("{}.{:02}", base_units / BITS_SCALE, base_units % BITS_SCALE)
}

/// Signed variant for history amounts, which are negative for withdrawals.
pub fn format_bits_signed(base_units: i64) -> String {
    if base_units < 0 {
        format!("-{}", format_bits(base_units.unsigned_abs()))
    } else {
        format_bits(base_units as u64)
    }
}
