//! Integration tests for the inventory ledger.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use common::{ClientId, Money, MovementId, PaymentId, ProductId};
use ledger::{
    InMemoryLedgerStore, InventoryLedger, LedgerError, MovementType, MovementUpdate, NewMovement,
};
use resources::{
    InMemoryResourceService, InMemoryResources, Invoice, InvoiceInput, InvoiceStatus, LineItem,
    Payment, PaymentDetails, PaymentInput, PaymentMethod, ProductInput, ResourceError,
    ResourceService,
};

struct TestHarness {
    ledger: InventoryLedger<InMemoryLedgerStore>,
    store: InMemoryLedgerStore,
    resources: InMemoryResources,
}

impl TestHarness {
    fn new() -> Self {
        let resources = InMemoryResources::new();
        let store = InMemoryLedgerStore::new();
        let ledger = InventoryLedger::new(store.clone(), &resources.services());
        Self {
            ledger,
            store,
            resources,
        }
    }

    async fn product(&self, name: &str) -> ProductId {
        self.resources
            .products
            .create(ProductInput {
                name: name.to_string(),
                reference: format!("REF-{name}"),
                unit_price: Money::from_cents(1500),
            })
            .await
            .unwrap()
            .id
    }

    async fn stock_in(&self, product: ProductId, qty: u32) -> MovementId {
        self.ledger
            .create_movement(NewMovement::inbound(
                product,
                qty,
                Money::from_cents(1000),
                "staff",
            ))
            .await
            .unwrap()
            .movements[0]
            .id
    }

    async fn stock_out(&self, product: ProductId, qty: u32) -> MovementId {
        self.ledger
            .create_movement(NewMovement::outbound(
                product,
                qty,
                Money::from_cents(1500),
                "staff",
            ))
            .await
            .unwrap()
            .movements[0]
            .id
    }

    async fn paid_invoice(&self, items: Vec<LineItem>) -> Invoice {
        self.resources
            .invoices
            .create(InvoiceInput {
                client_id: ClientId::new(),
                patient_cin: "AB123456".to_string(),
                appointment_id: None,
                date: NaiveDate::from_ymd_opt(2026, 5, 4).unwrap(),
                items,
                status: InvoiceStatus::Paid,
                payment: Some(PaymentDetails {
                    method: PaymentMethod::Card,
                    cheque: None,
                    paid_at: Utc::now(),
                }),
            })
            .await
            .unwrap()
    }

    async fn assert_invariant(&self, product: ProductId) {
        let stock = self.ledger.stock(product).await.unwrap();
        let recomputed = self.ledger.recompute_stock(product).await.unwrap();
        assert_eq!(stock, recomputed, "stock drifted from movements");
    }
}

#[tokio::test]
async fn test_stock_scenario_with_edit_and_delete() {
    let h = TestHarness::new();
    let p = h.product("P").await;

    h.stock_in(p, 10).await;
    assert_eq!(h.ledger.stock(p).await.unwrap(), 10);

    let inbound = h.stock_in(p, 5).await;
    assert_eq!(h.ledger.stock(p).await.unwrap(), 15);

    let outbound = h.stock_out(p, 3).await;
    assert_eq!(h.ledger.stock(p).await.unwrap(), 12);

    let outcome = h
        .ledger
        .update_movement(
            outbound,
            MovementUpdate {
                quantity: 7,
                unit_price: Money::from_cents(1500),
                product_id: None,
                date: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(h.ledger.stock(p).await.unwrap(), 8);
    assert_eq!(outcome.deltas.len(), 1);
    assert_eq!(outcome.deltas[0].before, 12);
    assert_eq!(outcome.deltas[0].after, 8);
    assert_eq!(outcome.movements[0].total, Money::from_cents(10500));

    h.ledger.delete_movement(inbound).await.unwrap();
    assert_eq!(h.ledger.stock(p).await.unwrap(), 3);
    h.assert_invariant(p).await;
}

#[tokio::test]
async fn test_update_changes_stock_by_quantity_difference() {
    let h = TestHarness::new();
    let p = h.product("P").await;
    let m = h.stock_in(p, 4).await;

    let outcome = h
        .ledger
        .update_movement(
            m,
            MovementUpdate {
                quantity: 9,
                unit_price: Money::from_cents(1000),
                product_id: None,
                date: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(outcome.deltas[0].change, 5);
    assert_eq!(h.ledger.stock(p).await.unwrap(), 9);
}

#[tokio::test]
async fn test_changing_product_moves_delta_between_products() {
    let h = TestHarness::new();
    let old = h.product("old").await;
    let new = h.product("new").await;
    let m = h.stock_in(old, 6).await;

    let outcome = h
        .ledger
        .update_movement(
            m,
            MovementUpdate {
                quantity: 6,
                unit_price: Money::from_cents(1000),
                product_id: Some(new),
                date: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(outcome.deltas.len(), 2);
    assert_eq!(outcome.deltas[0].product_id, old);
    assert_eq!(outcome.deltas[0].change, -6);
    assert_eq!(outcome.deltas[1].product_id, new);
    assert_eq!(outcome.deltas[1].change, 6);
    assert_eq!(
        outcome.deltas.iter().map(|d| d.change).sum::<i64>(),
        0,
        "no net change across both products"
    );
    assert_eq!(h.ledger.stock(old).await.unwrap(), 0);
    assert_eq!(h.ledger.stock(new).await.unwrap(), 6);
    h.assert_invariant(old).await;
    h.assert_invariant(new).await;
}

#[tokio::test]
async fn test_out_movement_can_go_negative() {
    let h = TestHarness::new();
    let p = h.product("P").await;

    let outcome = h
        .ledger
        .create_movement(NewMovement::outbound(p, 2, Money::zero(), "staff"))
        .await
        .unwrap();

    assert!(outcome.deltas[0].is_negative());
    assert_eq!(h.ledger.stock(p).await.unwrap(), -2);
    let levels = h.ledger.stock_levels().await.unwrap();
    assert!(levels.iter().any(|l| l.product_id == p && l.negative));
}

#[tokio::test]
async fn test_invalid_movements_are_rejected_before_writing() {
    let h = TestHarness::new();
    let p = h.product("P").await;

    let zero = h
        .ledger
        .create_movement(NewMovement::inbound(p, 0, Money::zero(), "staff"))
        .await;
    assert!(matches!(zero, Err(LedgerError::Validation(_))));

    let unknown = h
        .ledger
        .create_movement(NewMovement::inbound(
            ProductId::new(),
            1,
            Money::zero(),
            "staff",
        ))
        .await;
    assert!(matches!(unknown, Err(LedgerError::ProductNotFound(_))));

    let oversized = h
        .ledger
        .create_movement(NewMovement::inbound(
            p,
            3,
            Money::from_cents(i64::MAX / 2),
            "staff",
        ))
        .await;
    match oversized {
        Err(LedgerError::Validation(errors)) => {
            assert_eq!(errors.errors()[0].field, "unit_price");
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    let missing = h.ledger.delete_movement(MovementId::new()).await;
    assert!(matches!(missing, Err(LedgerError::MovementNotFound(_))));

    assert_eq!(h.store.movement_count().await, 0);
}

#[tokio::test]
async fn test_manual_path_cannot_create_invoice_movements() {
    let h = TestHarness::new();
    let p = h.product("P").await;
    let invoice = h.paid_invoice(vec![]).await;

    let mut new = NewMovement::outbound(p, 1, Money::zero(), "staff");
    new.invoice_id = Some(invoice.id);

    let err = h.ledger.create_movement(new).await.unwrap_err();
    assert!(err.is_permission_denied());
    assert_eq!(h.ledger.stock(p).await.unwrap(), 0);
}

#[tokio::test]
async fn test_system_movements_are_immutable() {
    let h = TestHarness::new();
    let p = h.product("P").await;
    h.stock_in(p, 10).await;
    let invoice = h
        .paid_invoice(vec![LineItem::product(p, "Gel", 3, Money::from_cents(1500))])
        .await;

    let outcome = h.ledger.materialize_from_paid_invoice(&invoice).await.unwrap();
    let derived = outcome.movements[0].id;
    assert_eq!(h.ledger.stock(p).await.unwrap(), 7);

    let update = h
        .ledger
        .update_movement(
            derived,
            MovementUpdate {
                quantity: 1,
                unit_price: Money::zero(),
                product_id: None,
                date: None,
            },
        )
        .await;
    assert!(matches!(update, Err(LedgerError::PermissionDenied { .. })));

    let delete = h.ledger.delete_movement(derived).await;
    assert!(matches!(delete, Err(LedgerError::PermissionDenied { .. })));

    assert_eq!(h.ledger.stock(p).await.unwrap(), 7);
    assert!(h.ledger.movement(derived).await.is_ok());
}

#[tokio::test]
async fn test_materialization_is_idempotent() {
    let h = TestHarness::new();
    let gel = h.product("gel").await;
    let cream = h.product("cream").await;
    let invoice = h
        .paid_invoice(vec![
            LineItem::product(gel, "Gel", 2, Money::from_cents(1500)),
            LineItem::product(cream, "Cream", 1, Money::from_cents(4000)),
            LineItem::service("SOIN-01", "Consultation", 1, Money::from_cents(30000)),
        ])
        .await;

    let first = h.ledger.materialize_from_paid_invoice(&invoice).await.unwrap();
    assert!(!first.already_materialized);
    assert_eq!(first.movements.len(), 2);
    assert!(
        first
            .movements
            .iter()
            .all(|m| m.movement_type == MovementType::Out && m.invoice_id == Some(invoice.id))
    );
    assert_eq!(first.payment.amount, Money::from_cents(37000));
    assert_eq!(first.payment.method, PaymentMethod::Card);

    let second = h.ledger.materialize_from_paid_invoice(&invoice).await.unwrap();
    assert!(second.already_materialized);
    assert_eq!(second.payment.id, first.payment.id);

    assert_eq!(h.store.movement_count().await, 2);
    assert_eq!(h.resources.payments.count().await, 1);
    assert_eq!(h.ledger.stock(gel).await.unwrap(), -2);
    assert_eq!(h.ledger.stock(cream).await.unwrap(), -1);
}

#[tokio::test]
async fn test_interrupted_materialization_does_not_duplicate_movements() {
    let h = TestHarness::new();
    let p = h.product("P").await;
    let invoice = h
        .paid_invoice(vec![LineItem::product(p, "Gel", 4, Money::from_cents(1500))])
        .await;

    h.resources.payments.set_fail_on_create(true).await;
    let failed = h.ledger.materialize_from_paid_invoice(&invoice).await;
    assert!(matches!(failed, Err(LedgerError::Resource(_))));
    assert_eq!(h.ledger.stock(p).await.unwrap(), -4);

    h.resources.payments.set_fail_on_create(false).await;
    let retried = h.ledger.materialize_from_paid_invoice(&invoice).await.unwrap();
    assert!(!retried.already_materialized);
    assert!(retried.deltas.is_empty());

    assert_eq!(h.store.movement_count().await, 1);
    assert_eq!(h.ledger.stock(p).await.unwrap(), -4);
    assert_eq!(h.resources.payments.count().await, 1);
}

#[tokio::test]
async fn test_unpaid_invoice_is_not_materialized() {
    let h = TestHarness::new();
    let p = h.product("P").await;
    let mut invoice = h
        .paid_invoice(vec![LineItem::product(p, "Gel", 1, Money::zero())])
        .await;
    invoice.status = InvoiceStatus::Unpaid;

    let result = h.ledger.materialize_from_paid_invoice(&invoice).await;
    assert!(matches!(result, Err(LedgerError::InvoiceNotPaid(_))));
    assert_eq!(h.store.movement_count().await, 0);
}

#[tokio::test]
async fn test_materialize_pending_sweeps_only_unsettled_invoices() {
    let h = TestHarness::new();
    let p = h.product("P").await;
    let a = h
        .paid_invoice(vec![LineItem::product(p, "Gel", 1, Money::zero())])
        .await;
    h.ledger.materialize_from_paid_invoice(&a).await.unwrap();
    let b = h
        .paid_invoice(vec![LineItem::product(p, "Gel", 2, Money::zero())])
        .await;

    let outcomes = h.ledger.materialize_pending().await.unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].invoice_id, b.id);

    assert!(h.ledger.materialize_pending().await.unwrap().is_empty());
    assert_eq!(h.ledger.stock(p).await.unwrap(), -3);
    assert_eq!(h.resources.payments.count().await, 2);
}

#[tokio::test]
async fn test_invariant_holds_over_mixed_sequence() {
    let h = TestHarness::new();
    let a = h.product("a").await;
    let b = h.product("b").await;

    let mut manual = Vec::new();
    for qty in [3, 8, 1, 12] {
        manual.push(h.stock_in(a, qty).await);
        manual.push(h.stock_out(b, qty / 2 + 1).await);
    }

    for (i, id) in manual.iter().enumerate() {
        let target = if i % 3 == 0 { Some(b) } else { None };
        h.ledger
            .update_movement(
                *id,
                MovementUpdate {
                    quantity: (i as u32) + 2,
                    unit_price: Money::from_cents(100),
                    product_id: target,
                    date: None,
                },
            )
            .await
            .unwrap();
    }
    for id in manual.iter().step_by(2) {
        h.ledger.delete_movement(*id).await.unwrap();
    }

    let invoice = h
        .paid_invoice(vec![LineItem::product(a, "A", 2, Money::zero())])
        .await;
    h.ledger.materialize_from_paid_invoice(&invoice).await.unwrap();

    for product in [a, b] {
        h.assert_invariant(product).await;
        assert!(h.ledger.is_consistent(product).await.unwrap());
    }
}

/// Payments service whose writes take a while to land.
struct SlowPayments {
    inner: InMemoryResourceService<Payment>,
}

#[async_trait]
impl ResourceService<Payment> for SlowPayments {
    async fn create(&self, input: PaymentInput) -> Result<Payment, ResourceError> {
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.inner.create(input).await
    }

    async fn get_by_id(&self, id: PaymentId) -> Result<Option<Payment>, ResourceError> {
        self.inner.get_by_id(id).await
    }

    async fn update(&self, id: PaymentId, input: PaymentInput) -> Result<Payment, ResourceError> {
        self.inner.update(id, input).await
    }

    async fn delete(&self, id: PaymentId) -> Result<(), ResourceError> {
        self.inner.delete(id).await
    }

    async fn list(&self) -> Result<Vec<Payment>, ResourceError> {
        self.inner.list().await
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_materialization_settles_once() {
    let resources = InMemoryResources::new();
    let mut services = resources.services();
    services.payments = Arc::new(SlowPayments {
        inner: resources.payments.clone(),
    });
    let store = InMemoryLedgerStore::new();
    let ledger = InventoryLedger::new(store.clone(), &services);
    let h = TestHarness {
        ledger: ledger.clone(),
        store: store.clone(),
        resources: resources.clone(),
    };

    let p = h.product("P").await;
    let invoice = h
        .paid_invoice(vec![LineItem::product(p, "Gel", 3, Money::from_cents(1500))])
        .await;

    let direct = {
        let ledger = ledger.clone();
        let invoice = invoice.clone();
        tokio::spawn(async move { ledger.materialize_from_paid_invoice(&invoice).await })
    };
    let sweep = {
        let ledger = ledger.clone();
        tokio::spawn(async move { ledger.materialize_pending().await })
    };
    let retry = {
        let ledger = ledger.clone();
        let invoice_id = invoice.id;
        tokio::spawn(async move { ledger.materialize_invoice(invoice_id).await })
    };

    direct.await.unwrap().unwrap();
    sweep.await.unwrap().unwrap();
    retry.await.unwrap().unwrap();

    assert_eq!(resources.payments.count().await, 1);
    assert_eq!(store.movement_count().await, 1);
    assert_eq!(ledger.stock(p).await.unwrap(), -3);
    h.assert_invariant(p).await;
}
