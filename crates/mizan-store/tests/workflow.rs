//! End-to-end walkthrough of a trading day: stock arrives, sales are
//! recorded, damage is reported and reviewed, and an audited correction
//! reconciles the units - exercising the full permission-gated surface.

use rust_decimal_macros::dec;

use mizan_core::{
    ApprovalState, ClientInfo, Decision, LedgerConfig, LedgerError, Money, MovementStatus,
    PaymentStatus, PermissionSet, RequestedPayment, StaffPermission,
};
use mizan_store::{Actor, LedgerService, NewProduct, ServiceError};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mizan_store=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

fn row(key: &str) -> StaffPermission {
    StaffPermission {
        staff_id: "staff-1".to_string(),
        permission_key: key.to_string(),
        is_enabled: true,
    }
}

/// Storekeeper: inventory + damage reporting, no sales rights at all.
fn storekeeper() -> Actor {
    Actor::new(
        "storekeeper-1",
        PermissionSet::from_raw(&[
            row("staff_inventory_master"),
            row("manage_inventory_view"),
            row("manage_inventory_create"),
            row("manage_inventory_edit"),
            row("damage_reports_view"),
            row("damage_reports_create"),
        ]),
    )
}

#[tokio::test]
async fn test_full_trading_day_workflow() {
    init_tracing();

    let service = LedgerService::new(LedgerConfig::default());
    let owner = Actor::owner("owner-1");
    let keeper = storekeeper();

    // Morning: the storekeeper sets up the product and books a delivery.
    let product = service
        .create_product(
            &keeper,
            NewProduct {
                name: "Frozen Mackerel".to_string(),
                category: Some("fish".to_string()),
                quantity_box: 0,
                quantity_kg: dec!(0),
                box_to_kg_ratio: dec!(10),
                cost_per_box: Money::new(dec!(80)),
                price_per_box: Money::new(dec!(100)),
                low_stock_threshold: 3,
                expiry_date: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(product.price_per_kg, Money::new(dec!(10)));

    service
        .restock(&keeper, &product.id, 10, dec!(20), None)
        .await
        .unwrap();

    // The storekeeper has no sales rights; the owner records the sales.
    let err = service
        .record_sale(
            &keeper,
            &product.id,
            1,
            dec!(0),
            None,
            RequestedPayment::Paid,
            ClientInfo::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Ledger(LedgerError::PermissionDenied { .. })
    ));

    let paid_sale = service
        .record_sale(
            &owner,
            &product.id,
            2,
            dec!(0),
            None,
            RequestedPayment::Paid,
            ClientInfo::default(),
        )
        .await
        .unwrap();
    assert_eq!(paid_sale.total_amount, Money::new(dec!(200)));

    // A pending-payment sale demands client contact details.
    let err = service
        .record_sale(
            &owner,
            &product.id,
            1,
            dec!(2.5),
            None,
            RequestedPayment::Pending,
            ClientInfo::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Ledger(LedgerError::MissingClientInfo { .. })
    ));

    let credit_sale = service
        .record_sale(
            &owner,
            &product.id,
            1,
            dec!(2.5),
            None,
            RequestedPayment::Pending,
            ClientInfo {
                name: Some("Amina W.".to_string()),
                phone: Some("+254700000001".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(credit_sale.payment_status, PaymentStatus::Pending);
    assert_eq!(credit_sale.remaining_amount, Money::new(dec!(125)));
    assert_eq!(service.unsettled_sales(&owner).await.unwrap().len(), 1);

    // Afternoon: a freezer failure. The storekeeper reports, the owner
    // reviews; stock only moves on approval.
    let report = service
        .report_damage(&keeper, &product.id, 1, dec!(2), "freezer failure overnight", None)
        .await
        .unwrap();
    assert_eq!(report.loss_value, Money::new(dec!(96))); // 1·80 + 2·8

    let before = service.get_product(&owner, &product.id).await.unwrap();
    let decided = service
        .decide_damage(&owner, &report.id, Decision::Approve, None)
        .await
        .unwrap();
    assert!(matches!(
        decided.approval,
        ApprovalState::Approved {
            applied_at: Some(_),
            ..
        }
    ));
    let after = service.get_product(&owner, &product.id).await.unwrap();
    assert_eq!(after.quantity_box, before.quantity_box - 1);
    assert_eq!(after.quantity_kg, before.quantity_kg - dec!(2));

    // Evening stocktake finds drift; the keeper proposes a correction, the
    // owner approves it.
    let proposal = service
        .propose_correction(&keeper, &product.id, 0, dec!(1.5), "stocktake recount")
        .await
        .unwrap();
    assert_eq!(service.pending_audits(&owner).await.unwrap().len(), 1);

    service
        .decide_audit(&owner, &proposal.id, Decision::Approve, None)
        .await
        .unwrap();
    let closed = service.get_product(&owner, &product.id).await.unwrap();
    assert_eq!(closed.quantity_kg, after.quantity_kg + dec!(1.5));

    // End of day: ledger arithmetic held up across the whole sequence.
    // Boxes: 10 − 2 − 1 − 1 = 6; kg: 20 − 2.5 − 2 + 1.5 = 17.
    assert_eq!(closed.quantity_box, 6);
    assert_eq!(closed.quantity_kg, dec!(17));
    assert!(!closed.is_low_stock());

    // Nothing left pending, and the movement trail covers every change:
    // restock, 2 sales, damage write-off, correction.
    assert!(service.pending_audits(&owner).await.unwrap().is_empty());
    assert!(service.pending_damages(&owner).await.unwrap().is_empty());
    let trail = service
        .movements_for_product(&owner, &product.id)
        .await
        .unwrap();
    assert_eq!(trail.len(), 5);
    assert!(trail.iter().all(|m| m.status == MovementStatus::Completed));
    assert_eq!(service.reprocess_approved().await, 0);
}
