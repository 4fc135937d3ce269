//! End-to-end posting behaviour against an in-memory database.

use caja_core::{
    DateRange, Money, MovementKind, NewPurchase, NewPurchaseLine, NewSale, NewSaleLine,
    PartyInput, PartyKind, PaymentMethod, PaymentStatus, Product, ProductInput, PurchaseStatus,
    Quantity, Rate, SaleStatus, SessionStatus,
};
use caja_db::{Database, DbConfig, DbError};

async fn setup() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

async fn product(db: &Database, name: &str, price: i64, tax_pct: u32, stock: i64) -> Product {
    let product = db
        .products()
        .create(&ProductInput {
            name: name.to_string(),
            sku: None,
            barcode: None,
            category_id: None,
            base_price: Money::from_cents(price),
            cost_price: Money::from_cents(price / 2),
            tax_rate: Rate::from_percent(tax_pct),
            min_stock: Quantity::zero(),
            track_inventory: true,
        })
        .await
        .unwrap();
    if stock > 0 {
        db.products()
            .adjust_stock(&product.id, Quantity::from_units(stock), "Initial count")
            .await
            .unwrap();
    }
    db.products().get(&product.id).await.unwrap()
}

fn sale_line(p: &Product, units: i64, discount_pct: u32) -> NewSaleLine {
    NewSaleLine {
        product_id: p.id.clone(),
        product_name: p.name.clone(),
        quantity: Quantity::from_units(units),
        unit_price: p.base_price,
        discount_rate: Rate::from_percent(discount_pct),
        tax_rate: p.tax_rate,
    }
}

fn party(name: &str) -> PartyInput {
    PartyInput {
        name: name.to_string(),
        ..PartyInput::default()
    }
}

#[tokio::test]
async fn cash_sale_scenario() {
    let db = setup().await;
    let session = db.sessions().open(Money::from_cents(1000)).await.unwrap();
    let p = product(&db, "Item", 500, 10, 10).await;

    let detail = db
        .sales()
        .complete_sale(&NewSale {
            session_id: session.id.clone(),
            customer_id: None,
            payment_method: PaymentMethod::Cash,
            amount_tendered: Money::from_cents(1100),
            items: vec![sale_line(&p, 2, 0)],
        })
        .await
        .unwrap();

    let sale = &detail.sale;
    assert_eq!(sale.subtotal.cents(), 1000);
    assert_eq!(sale.tax_total.cents(), 100);
    assert_eq!(sale.total.cents(), 1100);
    assert!(sale.change.is_zero());
    assert_eq!(sale.status, SaleStatus::Completed);

    assert_eq!(db.products().get(&p.id).await.unwrap().stock, Quantity::from_units(8));
    let session = db.sessions().get(&session.id).await.unwrap();
    assert_eq!(session.cash_sales.cents(), 1100);
}

#[tokio::test]
async fn sale_totals_hold_with_discounts() {
    let db = setup().await;
    let session = db.sessions().open(Money::zero()).await.unwrap();
    let a = product(&db, "A", 333, 21, 50).await;
    let b = product(&db, "B", 1999, 10, 50).await;

    let detail = db
        .sales()
        .complete_sale(&NewSale {
            session_id: session.id.clone(),
            customer_id: None,
            payment_method: PaymentMethod::Card,
            amount_tendered: Money::from_cents(100_000),
            items: vec![sale_line(&a, 3, 15), sale_line(&b, 1, 0)],
        })
        .await
        .unwrap();

    let sale = &detail.sale;
    assert_eq!(sale.total, sale.subtotal + sale.tax_total);
    let line_sum: Money = detail.items.iter().map(|i| i.line_total).sum();
    assert_eq!(line_sum, sale.total);
    // Card payments never give change.
    assert!(sale.change.is_zero());

    let session = db.sessions().get(&session.id).await.unwrap();
    assert_eq!(session.card_sales, sale.total);
    assert!(session.cash_sales.is_zero());
}

#[tokio::test]
async fn failed_sale_changes_nothing() {
    let db = setup().await;
    let session = db.sessions().open(Money::zero()).await.unwrap();
    let customer = db.customers().create(&party("Ana")).await.unwrap();
    let p = product(&db, "Item", 500, 10, 10).await;

    let mut bad_line = sale_line(&p, 1, 0);
    bad_line.product_id = "no-such-product".to_string();

    let err = db
        .sales()
        .complete_sale(&NewSale {
            session_id: session.id.clone(),
            customer_id: Some(customer.id.clone()),
            payment_method: PaymentMethod::Credit,
            amount_tendered: Money::zero(),
            items: vec![sale_line(&p, 3, 0), bad_line],
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NotFound { .. }));

    assert_eq!(db.products().get(&p.id).await.unwrap().stock, Quantity::from_units(10));
    let session = db.sessions().get(&session.id).await.unwrap();
    assert!(session.total_sales().is_zero());
    assert!(db.customers().get(&customer.id).await.unwrap().current_balance.is_zero());
    assert!(db
        .ledger()
        .get_ledger(PartyKind::Customer, &customer.id)
        .await
        .unwrap()
        .is_empty());
    assert!(db
        .sales()
        .list(&DateRange::all_time(), None, 10)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn stock_floor_is_enforced_in_the_posting() {
    let db = setup().await;
    let session = db.sessions().open(Money::zero()).await.unwrap();
    let p = product(&db, "Item", 500, 0, 2).await;

    let err = db
        .sales()
        .complete_sale(&NewSale {
            session_id: session.id.clone(),
            customer_id: None,
            payment_method: PaymentMethod::Cash,
            amount_tendered: Money::from_cents(5000),
            items: vec![sale_line(&p, 3, 0)],
        })
        .await
        .unwrap_err();

    match err {
        DbError::OutOfStock { available, requested, .. } => {
            assert_eq!(available, Quantity::from_units(2));
            assert_eq!(requested, Quantity::from_units(3));
        }
        other => panic!("expected OutOfStock, got {other:?}"),
    }
}

#[tokio::test]
async fn balances_always_equal_folded_ledger() {
    let db = setup().await;
    let session = db.sessions().open(Money::zero()).await.unwrap();
    let customer = db.customers().create(&party("Bruno")).await.unwrap();
    let supplier = db.suppliers().create(&party("Molinos")).await.unwrap();
    let p = product(&db, "Item", 1000, 10, 20).await;

    let check = |kind: PartyKind, id: String| {
        let ledger = db.ledger();
        async move {
            let check = ledger.recompute_balance(kind, &id).await.unwrap();
            assert!(check.is_consistent(), "{check:?}");
            check
        }
    };

    let credit_sale = NewSale {
        session_id: session.id.clone(),
        customer_id: Some(customer.id.clone()),
        payment_method: PaymentMethod::Credit,
        amount_tendered: Money::zero(),
        items: vec![sale_line(&p, 2, 0)],
    };
    let first = db.sales().complete_sale(&credit_sale).await.unwrap();
    check(PartyKind::Customer, customer.id.clone()).await;

    db.sales().complete_sale(&credit_sale).await.unwrap();
    db.ledger()
        .register_payment(PartyKind::Customer, &customer.id, Money::from_cents(1500), Some("Partial"))
        .await
        .unwrap();
    check(PartyKind::Customer, customer.id.clone()).await;

    db.sales().refund_sale(&first.sale.id, "Returned").await.unwrap();
    let after_refund = check(PartyKind::Customer, customer.id.clone()).await;
    assert_eq!(after_refund.stored.cents(), 2200 - 1500);

    let purchase = db
        .purchases()
        .create_purchase(&NewPurchase {
            supplier_id: supplier.id.clone(),
            payment_method: PaymentMethod::Credit,
            notes: None,
            items: vec![NewPurchaseLine {
                product_id: p.id.clone(),
                product_name: p.name.clone(),
                quantity: Quantity::from_units(4),
                unit_cost: Money::from_cents(400),
                tax_rate: Rate::zero(),
            }],
        })
        .await
        .unwrap();
    check(PartyKind::Supplier, supplier.id.clone()).await;

    db.ledger()
        .register_payment(PartyKind::Supplier, &supplier.id, Money::from_cents(2000), None)
        .await
        .unwrap();
    db.purchases().cancel(&purchase.purchase.id).await.unwrap();
    let supplier_check = check(PartyKind::Supplier, supplier.id.clone()).await;
    // Paid 2000 against a cancelled 1600 purchase: we are owed the difference.
    assert_eq!(supplier_check.stored.cents(), -2000);
    assert_eq!(supplier_check.entry_count, 3);
}

#[tokio::test]
async fn purchase_scenario_and_round_trip() {
    let db = setup().await;
    let supplier = db.suppliers().create(&party("Lacteos")).await.unwrap();
    let p = product(&db, "Item", 200, 21, 7).await;

    let detail = db
        .purchases()
        .create_purchase(&NewPurchase {
            supplier_id: supplier.id.clone(),
            payment_method: PaymentMethod::Credit,
            notes: None,
            items: vec![NewPurchaseLine {
                product_id: p.id.clone(),
                product_name: p.name.clone(),
                quantity: Quantity::from_units(5),
                unit_cost: Money::from_cents(100),
                tax_rate: Rate::from_percent(21),
            }],
        })
        .await
        .unwrap();

    assert_eq!(detail.purchase.subtotal.cents(), 500);
    assert_eq!(detail.purchase.tax_total.cents(), 105);
    assert_eq!(detail.purchase.total.cents(), 605);
    assert_eq!(detail.purchase.payment_status, PaymentStatus::Pending);
    assert_eq!(db.products().get(&p.id).await.unwrap().stock, Quantity::from_units(12));
    assert_eq!(db.suppliers().get(&supplier.id).await.unwrap().current_balance.cents(), 605);

    let cancelled = db
        .purchases()
        .update_status(&detail.purchase.id, PurchaseStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(cancelled.purchase.status, PurchaseStatus::Cancelled);
    assert_eq!(db.products().get(&p.id).await.unwrap().stock, Quantity::from_units(7));
    assert!(db.suppliers().get(&supplier.id).await.unwrap().current_balance.is_zero());

    let again = db
        .purchases()
        .update_status(&detail.purchase.id, PurchaseStatus::Cancelled)
        .await
        .unwrap_err();
    assert!(matches!(again, DbError::InvalidState(_)));
}

#[tokio::test]
async fn expected_float_at_close() {
    let db = setup().await;
    let session = db.sessions().open(Money::from_cents(1000)).await.unwrap();
    let p = product(&db, "Item", 1000, 0, 10).await;

    let cash_sale = NewSale {
        session_id: session.id.clone(),
        customer_id: None,
        payment_method: PaymentMethod::Cash,
        amount_tendered: Money::from_cents(2000),
        items: vec![sale_line(&p, 1, 0)],
    };
    db.sales().complete_sale(&cash_sale).await.unwrap();
    let refunded = db.sales().complete_sale(&cash_sale).await.unwrap();
    db.sales().refund_sale(&refunded.sale.id, "Damaged").await.unwrap();

    let mut card_sale = cash_sale.clone();
    card_sale.payment_method = PaymentMethod::Card;
    db.sales().complete_sale(&card_sale).await.unwrap();

    db.sessions()
        .add_movement(&session.id, Money::from_cents(500), MovementKind::In, "Change top-up")
        .await
        .unwrap();
    db.sessions()
        .add_movement(&session.id, Money::from_cents(300), MovementKind::Out, "Courier")
        .await
        .unwrap();

    let closed = db
        .sessions()
        .close(&session.id, Money::from_cents(3150), Some("End of day"))
        .await
        .unwrap();

    // 1000 + 2000 - 1000 + 500 - 300
    assert_eq!(closed.expected_float, Some(Money::from_cents(2200)));
    assert_eq!(closed.discrepancy(), Some(Money::from_cents(950)));
    assert_eq!(closed.status, SessionStatus::Closed);
    assert_eq!(closed.card_sales.cents(), 1000);

    let err = db
        .sessions()
        .close(&session.id, Money::zero(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::InvalidState(_)));
}

#[tokio::test]
async fn only_one_session_open_at_a_time() {
    let db = setup().await;
    let first = db.sessions().open(Money::zero()).await.unwrap();

    let err = db.sessions().open(Money::zero()).await.unwrap_err();
    assert!(matches!(err, DbError::InvalidState(_)));

    db.sessions().close(&first.id, Money::zero(), None).await.unwrap();
    let second = db.sessions().open(Money::zero()).await.unwrap();
    assert_eq!(db.sessions().get_active().await.unwrap().map(|s| s.id), Some(second.id));
}

#[tokio::test]
async fn receipt_numbers_are_unique_and_monotonic() {
    let db = setup().await;
    let session = db.sessions().open(Money::zero()).await.unwrap();
    let p = product(&db, "Item", 100, 0, 100).await;

    let mut receipts = Vec::new();
    for _ in 0..5 {
        let detail = db
            .sales()
            .complete_sale(&NewSale {
                session_id: session.id.clone(),
                customer_id: None,
                payment_method: PaymentMethod::Card,
                amount_tendered: Money::zero(),
                items: vec![sale_line(&p, 1, 0)],
            })
            .await
            .unwrap();
        receipts.push(detail.sale.receipt_number);
    }

    let mut sorted = receipts.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(sorted, receipts);
    assert_eq!(receipts.first().map(String::as_str), Some("V-000001"));
    assert_eq!(receipts.last().map(String::as_str), Some("V-000005"));
}
