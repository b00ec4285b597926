//! # Configuration Objects
//!
//! Explicit configuration passed into the functions that need it.
//!
//! There is no ambient global state in this crate: the dashboard's
//! currency/display preferences and the ledger's correction policy arrive
//! as plain values owned by the caller, so every function stays a pure
//! function of its arguments.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Correction Policy
// =============================================================================

/// What to do when an approved stock correction would drive a quantity
/// below zero.
///
/// The source workflow left this ambiguous; negative stock is never allowed
/// here, so an installation picks one of two explicit behaviors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Default)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionPolicy {
    /// Fail the approval with `InvalidCorrection`, naming the unit.
    #[default]
    Reject,
    /// Floor the affected quantity at zero and apply the rest.
    ClampToZero,
}

// =============================================================================
// Ledger Config
// =============================================================================

/// Configuration for the stock ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Default)]
#[ts(export)]
pub struct LedgerConfig {
    pub correction_policy: CorrectionPolicy,
}

// =============================================================================
// Currency Format
// =============================================================================

/// Display formatting for monetary values.
///
/// Replaces the browser-local currency setting: callers construct one and
/// pass it to `format` instead of reading ambient state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CurrencyFormat {
    /// Symbol prefixed to amounts, e.g. "$" or "KSh ".
    pub symbol: String,
    /// Fractional digits to round to for display.
    pub decimal_places: u32,
}

impl CurrencyFormat {
    /// Formats an amount with the configured symbol, sign first.
    ///
    /// ## Example
    /// ```rust
    /// use mizan_core::config::CurrencyFormat;
    /// use mizan_core::money::Money;
    /// use rust_decimal_macros::dec;
    ///
    /// let fmt = CurrencyFormat::default();
    /// assert_eq!(fmt.format(Money::new(dec!(10.5))), "$10.50");
    /// assert_eq!(fmt.format(Money::new(dec!(-3))), "-$3.00");
    /// ```
    pub fn format(&self, money: Money) -> String {
        let rounded = money.amount().round_dp(self.decimal_places).abs();
        let sign = if money.is_negative() { "-" } else { "" };
        format!(
            "{}{}{:.prec$}",
            sign,
            self.symbol,
            rounded,
            prec = self.decimal_places as usize
        )
    }
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        CurrencyFormat {
            symbol: "$".to_string(),
            decimal_places: 2,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_correction_policy_defaults_to_reject() {
        assert_eq!(LedgerConfig::default().correction_policy, CorrectionPolicy::Reject);
    }

    #[test]
    fn test_currency_format() {
        let fmt = CurrencyFormat {
            symbol: "KSh ".to_string(),
            decimal_places: 0,
        };
        assert_eq!(fmt.format(Money::new(dec!(1200.4))), "KSh 1200");

        let fmt = CurrencyFormat::default();
        assert_eq!(fmt.format(Money::new(dec!(0))), "$0.00");
        assert_eq!(fmt.format(Money::new(dec!(14.286))), "$14.29");
        assert_eq!(fmt.format(Money::new(dec!(-5.5))), "-$5.50");
    }
}
