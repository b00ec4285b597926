//! # Unit Conversion Module
//!
//! Pure conversion layer between the two correlated stock units.
//!
//! ## The Dual-Unit Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  One product, two on-hand quantities                                    │
//! │                                                                         │
//! │    quantity_box  = 10 boxes        quantity_kg = 20 kg (loose)         │
//! │                                                                         │
//! │  Linked by box_to_kg_ratio (kg per box) FOR PRICING ONLY:              │
//! │                                                                         │
//! │    cost_per_kg   = cost_per_box  / ratio                               │
//! │    price_per_kg  = price_per_box / ratio                               │
//! │    profit_per_*  = price_per_*  − cost_per_*                           │
//! │                                                                         │
//! │  The quantities themselves are depleted INDEPENDENTLY: selling 3 kg    │
//! │  loose does not change the box count, so the identity                  │
//! │  quantity_kg == quantity_box * ratio is NOT an invariant.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{LedgerError, LedgerResult};
use crate::money::Money;

// =============================================================================
// Unit Pricing
// =============================================================================

/// Per-unit cost, price, and profit figures derived from a product's
/// per-box figures and its box → kg conversion ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UnitPricing {
    pub cost_per_kg: Money,
    pub price_per_kg: Money,
    pub profit_per_box: Money,
    pub profit_per_kg: Money,
}

impl UnitPricing {
    /// Derives the per-kilogram and profit figures.
    ///
    /// ## Contract
    /// - `cost_per_kg   = cost_per_box / ratio`
    /// - `price_per_kg  = price_per_box / ratio`
    /// - `profit_per_box = price_per_box − cost_per_box`
    /// - `profit_per_kg  = price_per_kg − cost_per_kg`
    ///
    /// Fails with `InvalidRatio` when `ratio <= 0` - the division is never
    /// attempted with a non-positive ratio.
    ///
    /// ## Example
    /// ```rust
    /// use mizan_core::money::Money;
    /// use mizan_core::units::UnitPricing;
    /// use rust_decimal_macros::dec;
    ///
    /// let pricing = UnitPricing::derive(
    ///     Money::new(dec!(80)),
    ///     Money::new(dec!(100)),
    ///     dec!(10),
    /// ).unwrap();
    /// assert_eq!(pricing.cost_per_kg, Money::new(dec!(8)));
    /// assert_eq!(pricing.profit_per_kg, Money::new(dec!(2)));
    /// ```
    pub fn derive(
        cost_per_box: Money,
        price_per_box: Money,
        ratio: Decimal,
    ) -> LedgerResult<Self> {
        if ratio <= Decimal::ZERO {
            return Err(LedgerError::InvalidRatio { ratio });
        }

        let cost_per_kg = cost_per_box / ratio;
        let price_per_kg = price_per_box / ratio;

        Ok(UnitPricing {
            cost_per_kg,
            price_per_kg,
            profit_per_box: price_per_box - cost_per_box,
            profit_per_kg: price_per_kg - cost_per_kg,
        })
    }
}

// =============================================================================
// Expiry Arithmetic
// =============================================================================

/// Whole days until `expiry`, rounded up.
///
/// `ceil((expiry − now) / 1 day)`: any partial day still counts as a day
/// left, down to sub-second remainders. The result goes negative once the
/// expiry has passed - callers display or flag expired stock, this layer
/// does not clamp.
///
/// ## Example
/// ```rust
/// use chrono::{Duration, Utc};
/// use mizan_core::units::days_left;
///
/// let now = Utc::now();
/// assert_eq!(days_left(now + Duration::hours(36), now), 2);
/// assert_eq!(days_left(now - Duration::hours(30), now), -1);
/// ```
pub fn days_left(expiry: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    const MILLIS_PER_DAY: i64 = 86_400_000;

    let millis = (expiry - now).num_milliseconds();
    let days = millis.div_euclid(MILLIS_PER_DAY);
    if millis.rem_euclid(MILLIS_PER_DAY) > 0 {
        days + 1
    } else {
        days
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
