//! End-to-end: fill an order, close it for PIX, build and check the code.

use std::sync::{Arc, Mutex};

use comanda_core::pix::{crc16, parse_fields, verify_payload};
use comanda_core::{
    Money, OrderStatus, PaidStatus, SettlementDisposition, SettlementEvent, SettlementMethod,
    StateError,
};
use comanda_ledger::{
    AppConfig, CloseOutcome, Ledger, LedgerError, PixSettings, RevenueDashboard,
};

async fn open_ledger() -> Ledger {
    let mut config = AppConfig::default();
    config.database.path = Some(":memory:".into());
    config.pix = PixSettings::with_key("cashier@example.com");
    comanda_ledger::open(&config).await.unwrap()
}

#[tokio::test]
async fn pix_settlement_end_to_end() {
    let ledger = open_ledger().await;
    let dashboard = RevenueDashboard::new(&ledger);

    let events = Arc::new(Mutex::new(Vec::<SettlementEvent>::new()));
    let sink = Arc::clone(&events);
    let _subscription = ledger.bus().subscribe(move |event| {
        sink.lock().unwrap().push(*event);
        Ok(())
    });

    let coxinha = ledger.create_product("Coxinha", "7,50").await.unwrap();
    let order = ledger.create_order("Mesa 4").await.unwrap();
    ledger.add_product_item(order.id, coxinha.id, 2).await.unwrap();
    let suco = ledger
        .add_free_item(order.id, "Suco", Money::from_cents(500), 1)
        .await
        .unwrap();

    assert_eq!(
        ledger.compute_order_total(order.id).await.unwrap(),
        Money::from_cents(2000)
    );

    let outcome = ledger
        .close_order(order.id, SettlementDisposition::PixPending)
        .await
        .unwrap();
    let expected = SettlementEvent {
        order_id: order.id,
        total: Money::from_cents(2000),
    };
    assert_eq!(outcome, CloseOutcome::Closed(expected));
    assert_eq!(*events.lock().unwrap(), vec![expected]);

    let closed = ledger.get_order(order.id).await.unwrap();
    assert_eq!(closed.status, OrderStatus::Closed);
    assert_eq!(closed.paid, PaidStatus::NotPaid);
    assert_eq!(closed.settlement_method, Some(SettlementMethod::Pix));
    assert!(closed.closed_at.is_some());

    let code = ledger.build_settlement_payload(order.id).await.unwrap();
    assert_eq!(code.amount, Money::from_cents(2000));
    assert!(code.payload.contains("540520.00"));
    assert!(code.payload.contains("5904LOJA"));
    assert!(code.payload.contains("6009SAO PAULO"));

    let (body, checksum) = code.payload.split_at(code.payload.len() - 4);
    assert!(body.ends_with("6304"));
    assert!(checksum.chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
    assert_eq!(crc16(body), checksum);
    assert!(verify_payload(&code.payload));

    let tags: Vec<String> = parse_fields(&code.payload)
        .unwrap()
        .into_iter()
        .map(|f| f.tag)
        .collect();
    assert_eq!(tags, ["00", "26", "52", "53", "54", "58", "59", "60", "62", "63"]);

    // Frozen after closing.
    assert!(matches!(
        ledger.set_item_quantity(suco.id, 3).await,
        Err(LedgerError::State(StateError::OrderClosed { .. }))
    ));
    assert_eq!(
        ledger.compute_order_total(order.id).await.unwrap(),
        Money::from_cents(2000)
    );

    // Closing again changes nothing and publishes nothing.
    assert_eq!(
        ledger
            .close_order(order.id, SettlementDisposition::Paid)
            .await
            .unwrap(),
        CloseOutcome::AlreadyClosed
    );
    assert_eq!(events.lock().unwrap().len(), 1);

    assert_eq!(dashboard.closures_seen(), 1);
    assert_eq!(dashboard.today().await.unwrap(), Money::from_cents(2000));

    // The customer paid; the cashier marks it.
    assert_eq!(ledger.toggle_paid(order.id).await.unwrap(), PaidStatus::Paid);
}

#[tokio::test]
async fn long_merchant_name_is_truncated_in_payload() {
    let mut config = AppConfig::default();
    config.database.path = Some(":memory:".into());
    config.pix = PixSettings::with_key("cashier@example.com");
    config.pix.merchant_name = "Lanchonete e Pastelaria da Praça Central".to_string();
    let ledger = comanda_ledger::open(&config).await.unwrap();

    let order = ledger.create_order("Balcão").await.unwrap();
    ledger
        .add_free_item_entry(order.id, "Pastel 9,00", 1)
        .await
        .unwrap();

    let code = ledger.build_settlement_payload(order.id).await.unwrap();
    assert!(code.payload.contains("5925LANCHONETE E PASTELARIA"));
    assert!(verify_payload(&code.payload));
}

#[tokio::test]
async fn empty_order_cannot_be_charged_but_can_be_closed() {
    let ledger = open_ledger().await;
    let order = ledger.create_order("Mesa 9").await.unwrap();

    assert!(matches!(
        ledger.build_settlement_payload(order.id).await,
        Err(LedgerError::NothingToCharge { .. })
    ));

    let outcome = ledger
        .close_order(order.id, SettlementDisposition::NotPaid)
        .await
        .unwrap();
    assert_eq!(outcome.event().map(|e| e.total), Some(Money::zero()));
}
