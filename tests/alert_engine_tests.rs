mod common;

use std::time::Duration;

use alertbot::{
    error::MarketDataError,
    models::Direction,
    services::alert_engine::{AlertEngine, EngineOptions},
};
use common::{add_alert, harness, harness_with, register, FailingStore, FakeMarket, RecordingNotifier};

#[tokio::test]
async fn sweep_notifies_owner_when_price_crosses_and_stays_quiet_when_it_does_not() {
    let h = harness();
    register(&h.store, "42").await;
    add_alert(&h.store, "42", "ethx", 100.00, Direction::Above).await;

    h.market.set_price("ethx", 150.00);
    let report = h.engine.sweep().await.unwrap();
    assert_eq!(report.triggered.len(), 1);

    let sent = h.notifier.sent_to("42");
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("ETHX"));
    assert!(sent[0].contains("above $100.00"));
    assert!(sent[0].contains("Current price: $150.00"));

    h.market.set_price("ethx", 90.00);
    let report = h.engine.sweep().await.unwrap();
    assert!(report.triggered.is_empty());
    assert_eq!(h.notifier.sent_to("42").len(), 1);
}

#[tokio::test]
async fn sweep_fetches_each_symbol_once_regardless_of_alert_count() {
    let h = harness();
    register(&h.store, "1").await;
    register(&h.store, "2").await;
    add_alert(&h.store, "1", "btc", 50_000.0, Direction::Above).await;
    add_alert(&h.store, "2", "BTC", 70_000.0, Direction::Below).await;
    add_alert(&h.store, "2", "sol", 10.0, Direction::Above).await;

    h.market.set_price("btc", 60_000.0);
    h.market.set_price("sol", 5.0);

    let report = h.engine.sweep().await.unwrap();

    assert_eq!(h.market.calls("btc"), 1);
    assert_eq!(h.market.calls("sol"), 1);
    assert_eq!(report.symbols, 2);
    assert_eq!(report.alerts, 3);
    assert_eq!(h.notifier.sent_to("1").len(), 1);
    assert_eq!(h.notifier.sent_to("2").len(), 1);
}

#[tokio::test]
async fn repeated_sweeps_with_same_inputs_trigger_the_same_alerts() {
    let h = harness();
    register(&h.store, "7").await;
    add_alert(&h.store, "7", "eth", 2_000.0, Direction::Above).await;
    add_alert(&h.store, "7", "eth", 1_000.0, Direction::Below).await;
    add_alert(&h.store, "7", "doge", 1.0, Direction::Below).await;

    h.market.set_price("eth", 2_500.0);
    h.market.set_price("doge", 0.1);

    let first = h.engine.sweep().await.unwrap();
    let second = h.engine.sweep().await.unwrap();

    assert_eq!(first.triggered.len(), 2);
    assert_eq!(first.triggered, second.triggered);
    // no suppression: the still-true condition is announced again
    assert_eq!(h.notifier.sent_to("7").len(), 4);
}

#[tokio::test]
async fn price_equal_to_threshold_never_triggers_in_a_sweep() {
    let h = harness();
    register(&h.store, "9").await;
    add_alert(&h.store, "9", "ada", 0.5, Direction::Above).await;
    add_alert(&h.store, "9", "ada", 0.5, Direction::Below).await;
    h.market.set_price("ada", 0.5);

    let report = h.engine.sweep().await.unwrap();

    assert!(report.triggered.is_empty());
    assert!(h.notifier.sent().is_empty());
}

#[tokio::test]
async fn failing_symbols_are_skipped_without_aborting_the_sweep() {
    let h = harness();
    register(&h.store, "5").await;
    add_alert(&h.store, "5", "nosuchcoin", 1.0, Direction::Above).await;
    add_alert(&h.store, "5", "eth", 1.0, Direction::Above).await;
    add_alert(&h.store, "5", "btc", 1.0, Direction::Above).await;

    h.market
        .set_error("eth", MarketDataError::Transient("502 Bad Gateway".to_string()));
    h.market.set_price("btc", 2.0);

    let report = h.engine.sweep().await.unwrap();

    assert_eq!(report.failed_symbols, vec!["eth".to_string(), "nosuchcoin".to_string()]);
    assert_eq!(report.triggered.len(), 1);
    assert_eq!(report.triggered[0].alert.symbol, "btc");
    assert_eq!(h.notifier.sent_to("5").len(), 1);
}

#[tokio::test]
async fn slow_fetch_times_out_as_failed_symbol() {
    let h = harness_with(EngineOptions {
        fetch_timeout: Duration::from_millis(50),
        ..EngineOptions::default()
    });
    register(&h.store, "5").await;
    add_alert(&h.store, "5", "eth", 1.0, Direction::Above).await;
    h.market.set_price("eth", 2.0);
    h.market.set_delay(Duration::from_millis(500));

    let report = h.engine.sweep().await.unwrap();

    assert_eq!(report.failed_symbols, vec!["eth".to_string()]);
    assert!(report.triggered.is_empty());
    assert!(h.notifier.sent().is_empty());
}

#[tokio::test]
async fn delivery_failure_for_one_user_does_not_stop_others() {
    let h = harness();
    register(&h.store, "1").await;
    register(&h.store, "2").await;
    add_alert(&h.store, "1", "eth", 1.0, Direction::Above).await;
    add_alert(&h.store, "2", "eth", 1.0, Direction::Above).await;
    h.market.set_price("eth", 3.0);
    h.notifier.fail_for("1");

    let report = h.engine.sweep().await.unwrap();

    assert_eq!(report.triggered.len(), 2);
    assert_eq!(report.delivery_failures, 1);
    assert_eq!(h.notifier.sent_to("2").len(), 1);
}

#[tokio::test]
async fn alerts_of_unregistered_owners_are_not_notified() {
    let h = harness();
    add_alert(&h.store, "ghost", "eth", 1.0, Direction::Above).await;
    h.market.set_price("eth", 3.0);

    let report = h.engine.sweep().await.unwrap();

    assert!(report.triggered.is_empty());
    assert!(h.notifier.sent().is_empty());
}

#[tokio::test]
async fn sweep_with_no_alerts_makes_no_calls() {
    let h = harness();

    let report = h.engine.sweep().await.unwrap();

    assert_eq!(report.alerts, 0);
    assert_eq!(h.market.total_calls(), 0);
}

#[tokio::test]
async fn digest_sends_one_enumerated_message_per_user_with_alerts() {
    let h = harness();
    register(&h.store, "10").await;
    register(&h.store, "11").await;
    add_alert(&h.store, "10", "btc", 100.0, Direction::Above).await;
    add_alert(&h.store, "10", "eth", 200.0, Direction::Below).await;
    add_alert(&h.store, "10", "sol", 300.5, Direction::Above).await;

    let report = h.engine.digest().await.unwrap();

    assert_eq!(report.users, 2);
    assert_eq!(report.sent, 1);
    assert!(h.notifier.sent_to("11").is_empty());

    let sent = h.notifier.sent_to("10");
    assert_eq!(sent.len(), 1);
    let text = &sent[0];
    assert!(text.starts_with("Daily summary of your active alerts:"));
    assert!(text.contains("1. [1] BTC - above $100.00"));
    assert!(text.contains("2. [2] ETH - below $200.00"));
    assert!(text.contains("3. [3] SOL - above $300.50"));
    assert_eq!(h.market.total_calls(), 0);
}

#[tokio::test]
async fn digest_counts_delivery_failures_and_continues() {
    let h = harness();
    register(&h.store, "1").await;
    register(&h.store, "2").await;
    add_alert(&h.store, "1", "btc", 1.0, Direction::Above).await;
    add_alert(&h.store, "2", "btc", 1.0, Direction::Above).await;
    h.notifier.fail_for("1");

    let report = h.engine.digest().await.unwrap();

    assert_eq!(report.sent, 1);
    assert_eq!(report.failures, 1);
    assert_eq!(h.notifier.sent_to("2").len(), 1);
}

#[tokio::test]
async fn store_errors_for_one_user_only_drop_that_user() {
    let store = FailingStore::for_user("1");
    let market = FakeMarket::new();
    let notifier = RecordingNotifier::new();
    let engine = AlertEngine::new(
        store.clone(),
        market.clone(),
        notifier.clone(),
        EngineOptions::default(),
    );

    register(&store.inner, "1").await;
    register(&store.inner, "2").await;
    add_alert(&store.inner, "1", "eth", 100.0, Direction::Above).await;
    let healthy = add_alert(&store.inner, "2", "eth", 100.0, Direction::Above).await;
    market.set_price("eth", 150.0);

    let sweep = engine.sweep().await.unwrap();
    assert_eq!(sweep.triggered.len(), 1);
    assert_eq!(sweep.triggered[0].alert.id, healthy);
    assert_eq!(notifier.sent_to("1").len(), 0);
    assert_eq!(notifier.sent_to("2").len(), 1);

    let digest = engine.digest().await.unwrap();
    assert_eq!(digest.users, 2);
    assert_eq!(digest.sent, 1);
    assert_eq!(digest.failures, 1);

    let to_two = notifier.sent_to("2");
    assert_eq!(to_two.len(), 2);
    assert!(to_two[1].starts_with("Daily summary"));
    assert!(notifier.sent_to("1").is_empty());
}
