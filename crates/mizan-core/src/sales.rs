//! # Sales Transaction Builder
//!
//! Computes total amount, amount paid, and payment status for a sale
//! **before** any stock is touched.
//!
//! ## Build-Then-Sell Ordering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Recording a Sale                                     │
//! │                                                                         │
//! │  build(product, qty, declared, status)  ← THIS MODULE                  │
//! │       │  total, paid, remaining, status computed & validated           │
//! │       ▼                                                                 │
//! │  StockLedger::sell(product, boxes, kg)                                 │
//! │       │  insufficient stock? → whole sale aborted, nothing persisted   │
//! │       ▼                                                                 │
//! │  Sale record persisted                                                 │
//! │                                                                         │
//! │  One logical transaction: a failed decrement never leaves an           │
//! │  orphaned sale computed against stale stock figures.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{LedgerError, LedgerResult, ValidationError};
use crate::money::Money;
use crate::types::{PaymentStatus, Product, Sale};

// =============================================================================
// Requested Payment
// =============================================================================

/// The payment option the cashier picked on the sale form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RequestedPayment {
    /// Full settlement now; amount paid is the computed total.
    Paid,
    /// Partial settlement; declared amount, or half the total by default.
    HalfPaid,
    /// Nothing paid now; client contact details become mandatory.
    Pending,
}

impl RequestedPayment {
    /// Parses the dashboard's form labels.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim() {
            "Paid" => Some(RequestedPayment::Paid),
            "Half Paid" => Some(RequestedPayment::HalfPaid),
            "Pending" => Some(RequestedPayment::Pending),
            _ => None,
        }
    }

    /// The settlement state a sale built with this option carries.
    pub fn payment_status(&self) -> PaymentStatus {
        match self {
            RequestedPayment::Paid => PaymentStatus::Completed,
            RequestedPayment::HalfPaid => PaymentStatus::Partial,
            RequestedPayment::Pending => PaymentStatus::Pending,
        }
    }
}

// =============================================================================
// Client Info
// =============================================================================

/// Client contact details captured on the sale form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ClientInfo {
    pub name: Option<String>,
    pub phone: Option<String>,
}

impl ClientInfo {
    fn name_or_err(&self) -> LedgerResult<&str> {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Ok(name),
            _ => Err(LedgerError::MissingClientInfo {
                field: "client_name",
            }),
        }
    }

    fn phone_or_err(&self) -> LedgerResult<&str> {
        match self.phone.as_deref().map(str::trim) {
            Some(phone) if !phone.is_empty() => Ok(phone),
            _ => Err(LedgerError::MissingClientInfo {
                field: "phone_number",
            }),
        }
    }
}

// =============================================================================
// Sale Draft
// =============================================================================

/// A fully-computed, validated sale that has not touched stock yet.
///
/// The service turns a draft into a persisted [`Sale`] only after the
/// stock decrement succeeds.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleDraft {
    pub product_id: String,
    pub boxes_quantity: i64,
    #[ts(as = "String")]
    pub kg_quantity: Decimal,
    pub box_price: Money,
    pub kg_price: Money,
    pub total_amount: Money,
    pub amount_paid: Money,
    pub remaining_amount: Money,
    pub payment_status: PaymentStatus,
    pub client_name: Option<String>,
    pub phone_number: Option<String>,
}

impl SaleDraft {
    /// Materializes the draft into a sale record.
    pub fn into_sale(self, performed_by: &str, now: DateTime<Utc>) -> Sale {
        Sale {
            id: Uuid::new_v4().to_string(),
            product_id: self.product_id,
            boxes_quantity: self.boxes_quantity,
            kg_quantity: self.kg_quantity,
            box_price: self.box_price,
            kg_price: self.kg_price,
            total_amount: self.total_amount,
            amount_paid: self.amount_paid,
            remaining_amount: self.remaining_amount,
            payment_status: self.payment_status,
            client_name: self.client_name,
            phone_number: self.phone_number,
            performed_by: performed_by.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Computes and validates a sale against the product's frozen unit prices.
///
/// ## Rules
/// 1. `total = boxes·price_per_box + kg·price_per_kg`
/// 2. `Paid` → paid = total.
///    `Half Paid` → paid = declared if provided, else total/2;
///    `AmountExceedsTotal` if declared > total; `AmbiguousStatus` if the
///    declared amount settles the total within tolerance (should have
///    been `Paid`).
///    `Pending` → paid = 0; client name and phone are mandatory.
/// 3. `remaining = total − paid`.
///
/// Every check runs before any mutation is issued anywhere.
pub fn build(
    product: &Product,
    boxes_qty: i64,
    kg_qty: Decimal,
    amount_declared: Option<Money>,
    requested: RequestedPayment,
    client: &ClientInfo,
) -> LedgerResult<SaleDraft> {
    if boxes_qty < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "boxes_quantity".to_string(),
        }
        .into());
    }
    if kg_qty < Decimal::ZERO {
        return Err(ValidationError::MustBeNonNegative {
            field: "kg_quantity".to_string(),
        }
        .into());
    }
    if boxes_qty == 0 && kg_qty.is_zero() {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }
        .into());
    }

    let total = product.price_per_box * boxes_qty + product.price_per_kg * kg_qty;

    let (amount_paid, client_name, phone_number) = match requested {
        RequestedPayment::Paid => (total, client.name.clone(), client.phone.clone()),

        RequestedPayment::HalfPaid => {
            let paid = match amount_declared {
                Some(declared) => {
                    if declared.is_negative() {
                        return Err(ValidationError::MustBeNonNegative {
                            field: "amount_paid".to_string(),
                        }
                        .into());
                    }
                    if declared > total {
                        return Err(LedgerError::AmountExceedsTotal { declared, total });
                    }
                    if declared.approx_eq(total) {
                        return Err(LedgerError::AmbiguousStatus { declared, total });
                    }
                    declared
                }
                None => total * Decimal::new(5, 1), // half
            };
            (paid, client.name.clone(), client.phone.clone())
        }

        RequestedPayment::Pending => {
            let name = client.name_or_err()?.to_string();
            let phone = client.phone_or_err()?.to_string();
            (Money::zero(), Some(name), Some(phone))
        }
    };

    Ok(SaleDraft {
        product_id: product.id.clone(),
        boxes_quantity: boxes_qty,
        kg_quantity: kg_qty,
        box_price: product.price_per_box,
        kg_price: product.price_per_kg,
        total_amount: total,
        amount_paid,
        remaining_amount: total - amount_paid,
        payment_status: requested.payment_status(),
        client_name,
        phone_number,
    })
}

/// Recomputes a sale's totals after an approved edit changed its
/// quantities or amount paid, keeping the frozen unit prices.
pub fn recompute(sale: &mut Sale, now: DateTime<Utc>) {
    sale.total_amount =
        sale.box_price * sale.boxes_quantity + sale.kg_price * sale.kg_quantity;
    sale.remaining_amount = sale.total_amount - sale.amount_paid;
    sale.payment_status = if sale.amount_paid >= sale.total_amount {
        PaymentStatus::Completed
    } else if sale.amount_paid.is_positive() {
        PaymentStatus::Partial
    } else {
        PaymentStatus::Pending
    };
    sale.updated_at = now;
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    /// Product with price_per_box=100, price_per_kg=10.
    fn test_product() -> Product {
        let now = Utc::now();
        Product {
            id: "p-1".to_string(),
            name: "Frozen Mackerel".to_string(),
            category: None,
            quantity_box: 50,
            quantity_kg: dec!(100),
            box_to_kg_ratio: dec!(10),
            cost_per_box: Money::new(dec!(80)),
            cost_per_kg: Money::new(dec!(8)),
            price_per_box: Money::new(dec!(100)),
            price_per_kg: Money::new(dec!(10)),
            low_stock_threshold: 5,
            expiry_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_paid_settles_full_total() {
        let draft = build(
            &test_product(),
            2,
            dec!(5),
            None,
            RequestedPayment::Paid,
            &ClientInfo::default(),
        )
        .unwrap();

        assert_eq!(draft.total_amount, Money::new(dec!(250)));
        assert_eq!(draft.amount_paid, Money::new(dec!(250)));
        assert_eq!(draft.remaining_amount, Money::zero());
        assert_eq!(draft.payment_status, PaymentStatus::Completed);
    }

    #[test]
    fn test_half_paid_defaults_to_half_the_total() {
        let draft = build(
            &test_product(),
            2,
            dec!(0),
            None,
            RequestedPayment::HalfPaid,
            &ClientInfo::default(),
        )
        .unwrap();

        assert_eq!(draft.total_amount, Money::new(dec!(200)));
        assert_eq!(draft.amount_paid, Money::new(dec!(100)));
        assert_eq!(draft.remaining_amount, Money::new(dec!(100)));
        assert_eq!(draft.payment_status, PaymentStatus::Partial);
    }

    #[test]
    fn test_half_paid_with_declared_amount() {
        let draft = build(
            &test_product(),
            2,
            dec!(0),
            Some(Money::new(dec!(150))),
            RequestedPayment::HalfPaid,
            &ClientInfo::default(),
        )
        .unwrap();

        assert_eq!(draft.amount_paid, Money::new(dec!(150)));
        assert_eq!(draft.remaining_amount, Money::new(dec!(50)));
    }

    #[test]
    fn test_half_paid_declared_equal_to_total_is_ambiguous() {
        // boxes=2, kg=0, declared=200 against total 200
        let err = build(
            &test_product(),
            2,
            dec!(0),
            Some(Money::new(dec!(200))),
            RequestedPayment::HalfPaid,
            &ClientInfo::default(),
        )
        .unwrap_err();

        assert!(matches!(err, LedgerError::AmbiguousStatus { .. }));
    }

    #[test]
    fn test_half_paid_declared_over_total_fails() {
        // declared=250 against total 200
        let err = build(
            &test_product(),
            2,
            dec!(0),
            Some(Money::new(dec!(250))),
            RequestedPayment::HalfPaid,
            &ClientInfo::default(),
        )
        .unwrap_err();

        assert!(matches!(err, LedgerError::AmountExceedsTotal { .. }));
    }

    #[test]
    fn test_pending_requires_client_contact() {
        let err = build(
            &test_product(),
            1,
            dec!(0),
            None,
            RequestedPayment::Pending,
            &ClientInfo::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::MissingClientInfo {
                field: "client_name"
            }
        ));

        let err = build(
            &test_product(),
            1,
            dec!(0),
            None,
            RequestedPayment::Pending,
            &ClientInfo {
                name: Some("Amina W.".to_string()),
                phone: None,
            },
        )
        .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::MissingClientInfo {
                field: "phone_number"
            }
        ));
    }

    #[test]
    fn test_pending_with_contact_builds_zero_paid() {
        let draft = build(
            &test_product(),
            1,
            dec!(2.5),
            None,
            RequestedPayment::Pending,
            &ClientInfo {
                name: Some("Amina W.".to_string()),
                phone: Some("+254700000001".to_string()),
            },
        )
        .unwrap();

        assert_eq!(draft.total_amount, Money::new(dec!(125)));
        assert_eq!(draft.amount_paid, Money::zero());
        assert_eq!(draft.remaining_amount, Money::new(dec!(125)));
        assert_eq!(draft.payment_status, PaymentStatus::Pending);
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let err = build(
            &test_product(),
            0,
            dec!(0),
            None,
            RequestedPayment::Paid,
            &ClientInfo::default(),
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn test_parse_form_labels() {
        assert_eq!(RequestedPayment::parse("Paid"), Some(RequestedPayment::Paid));
        assert_eq!(
            RequestedPayment::parse("Half Paid"),
            Some(RequestedPayment::HalfPaid)
        );
        assert_eq!(
            RequestedPayment::parse("Pending"),
            Some(RequestedPayment::Pending)
        );
        assert_eq!(RequestedPayment::parse("Layaway"), None);
    }

    #[test]
    fn test_recompute_after_edit() {
        let product = test_product();
        let draft = build(
            &product,
            4,
            dec!(0),
            None,
            RequestedPayment::HalfPaid,
            &ClientInfo::default(),
        )
        .unwrap();
        let mut sale = draft.into_sale("cashier", Utc::now());
        assert_eq!(sale.total_amount, Money::new(dec!(400)));
        assert_eq!(sale.amount_paid, Money::new(dec!(200)));

        // Edit approved: quantities drop to 2 boxes, paid amount kept
        sale.boxes_quantity = 2;
        recompute(&mut sale, Utc::now());

        assert_eq!(sale.total_amount, Money::new(dec!(200)));
        assert_eq!(sale.remaining_amount, Money::zero());
        assert_eq!(sale.payment_status, PaymentStatus::Completed);
    }
}
