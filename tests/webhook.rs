//! End-to-end tests for the payment webhook.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use chrono::{DateTime, Duration, Timelike, Utc};
use serde_json::{json, Value};

use linguapulse_payments::config::validation::validate_config;
use linguapulse_payments::config::ServiceConfig;
use linguapulse_payments::payments::types::format_timestamp;

mod common;

use common::{FailingStore, TEST_BOT_TOKEN};

fn parse(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw).unwrap().with_timezone(&Utc)
}

fn payment(telegram_id: Value) -> Value {
    json!({ "telegram_id": telegram_id, "action": "process_subscription" })
}

#[tokio::test]
async fn test_first_subscription_unlocks_immediately() {
    let (telegram, sent) = common::start_telegram_backend(200).await;
    let store = common::memory_store().await;
    common::insert_profile(&store, 1001, None, 0.0).await;
    let server = common::spawn_server(
        ServiceConfig::default(),
        common::processor(Arc::new(store.clone()), telegram),
    )
    .await;

    let before = Utc::now();
    let res = common::client()
        .post(server.url("/"))
        .json(&payment(json!(1001)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Subscription activated successfully");

    let next = parse(body["next_lesson_access_at"].as_str().unwrap());
    assert!(next < before, "first lesson must already be available");

    let expiry_raw = body["subscription_expired_at"].as_str().unwrap();
    assert!(expiry_raw.ends_with("T23:59:59.999Z"), "{expiry_raw}");
    let expiry_day = parse(expiry_raw).date_naive();
    let after = Utc::now();
    let expected = [before, after].map(|at| (at + Duration::days(7)).date_naive());
    assert!(expected.contains(&expiry_day), "{expiry_day} not in {expected:?}");

    let (amount, status): (f64, String) =
        sqlx::query_as("SELECT amount, status FROM payment_history WHERE telegram_id = 1001")
            .fetch_one(store.pool())
            .await
            .unwrap();
    assert_eq!((amount, status.as_str()), (1.0, "completed"));

    let sent = sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].path, format!("/bot{}/sendMessage", TEST_BOT_TOKEN));
    let message: Value = serde_json::from_str(&sent[0].body).unwrap();
    assert_eq!(message["chat_id"], 1001);
    assert_eq!(
        message["reply_markup"]["inline_keyboard"][0][0]["callback_data"],
        "lesson:start"
    );

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_renewal_unlocks_at_two_am() {
    let (telegram, _) = common::start_telegram_backend(200).await;
    let store = common::memory_store().await;
    let running = format_timestamp(Utc::now() + Duration::days(3));
    common::insert_profile(&store, 1002, Some(&running), 4.0).await;
    let server = common::spawn_server(
        ServiceConfig::default(),
        common::processor(Arc::new(store.clone()), telegram),
    )
    .await;

    let before = Utc::now();
    let body: Value = common::client()
        .post(server.url("/"))
        .json(&payment(json!("1002")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let next = parse(body["next_lesson_access_at"].as_str().unwrap());
    assert_eq!((next.hour(), next.minute(), next.second()), (2, 0, 0));
    assert!(next > before);
    assert!(next <= before + Duration::days(1));

    assert_eq!(common::amount_paid(&store, 1002).await, 5.0);

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_lapsed_subscription_is_treated_as_new() {
    let (telegram, _) = common::start_telegram_backend(200).await;
    let store = common::memory_store().await;
    let lapsed = format_timestamp(Utc::now() - Duration::days(2));
    common::insert_profile(&store, 1003, Some(&lapsed), 1.0).await;
    let server = common::spawn_server(
        ServiceConfig::default(),
        common::processor(Arc::new(store), telegram),
    )
    .await;

    let before = Utc::now();
    let body: Value = common::client()
        .post(server.url("/"))
        .json(&payment(json!(1003)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert!(parse(body["next_lesson_access_at"].as_str().unwrap()) < before);
    server.shutdown.trigger();
}

#[tokio::test]
async fn test_repeated_payments_accumulate() {
    let (telegram, _) = common::start_telegram_backend(200).await;
    let store = common::memory_store().await;
    common::insert_profile(&store, 1004, None, 0.0).await;
    let server = common::spawn_server(
        ServiceConfig::default(),
        common::processor(Arc::new(store.clone()), telegram),
    )
    .await;

    let client = common::client();
    for _ in 0..3 {
        let res = client
            .post(server.url("/"))
            .json(&payment(json!(1004)))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
    }

    assert_eq!(common::amount_paid(&store, 1004).await, 3.0);

    assert_eq!(common::payment_count(&store, 1004).await, 3);

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_client_errors() {
    let (telegram, sent) = common::start_telegram_backend(200).await;
    let store = common::memory_store().await;
    let server = common::spawn_server(
        ServiceConfig::default(),
        common::processor(Arc::new(store), telegram),
    )
    .await;
    let client = common::client();

    let res = client.get(server.url("/")).send().await.unwrap();
    assert_eq!(res.status(), 405);
    assert_eq!(res.text().await.unwrap(), "Method not allowed");

    let res = client
        .post(server.url("/"))
        .header("content-type", "application/json")
        .body("{oops")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    assert_eq!(res.text().await.unwrap(), "Invalid JSON");

    let res = client
        .post(server.url("/"))
        .json(&payment(json!("not-a-number")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    assert_eq!(res.text().await.unwrap(), "Invalid telegram ID");

    let res = client
        .post(server.url("/"))
        .json(&json!({ "telegram_id": 1, "action": "unknown" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    assert_eq!(res.text().await.unwrap(), "Invalid action");

    let res = client
        .post(server.url("/"))
        .json(&payment(json!(999)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
    assert_eq!(res.text().await.unwrap(), "User not found");

    assert!(sent.lock().unwrap().is_empty());
    server.shutdown.trigger();
}

#[tokio::test]
async fn test_payment_record_failure_still_succeeds() {
    let (telegram, _) = common::start_telegram_backend(200).await;
    let sqlite = common::memory_store().await;
    common::insert_profile(&sqlite, 2001, None, 0.0).await;
    let store = Arc::new(FailingStore::new(sqlite.clone()));
    store.fail_insert.store(true, Ordering::SeqCst);
    let server = common::spawn_server(
        ServiceConfig::default(),
        common::processor(store, telegram),
    )
    .await;

    let res = common::client()
        .post(server.url("/"))
        .json(&payment(json!(2001)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    assert_eq!(common::amount_paid(&sqlite, 2001).await, 1.0);

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_profile_update_failure_returns_500() {
    let (telegram, sent) = common::start_telegram_backend(200).await;
    let sqlite = common::memory_store().await;
    common::insert_profile(&sqlite, 2002, None, 0.0).await;
    let store = Arc::new(FailingStore::new(sqlite));
    store.fail_update.store(true, Ordering::SeqCst);
    let server = common::spawn_server(
        ServiceConfig::default(),
        common::processor(store, telegram),
    )
    .await;

    let res = common::client()
        .post(server.url("/"))
        .json(&payment(json!(2002)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 500);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);
    let error = body["error"].as_str().unwrap();
    assert!(error.starts_with("Database error: "), "{error}");
    assert!(error.contains("injected failure"), "{error}");

    assert!(sent.lock().unwrap().is_empty(), "no notification after a failed update");
    server.shutdown.trigger();
}

#[tokio::test]
async fn test_notification_failure_still_succeeds() {
    let (telegram, sent) = common::start_telegram_backend(500).await;
    let store = common::memory_store().await;
    common::insert_profile(&store, 2003, None, 0.0).await;
    let server = common::spawn_server(
        ServiceConfig::default(),
        common::processor(Arc::new(store), telegram),
    )
    .await;

    let res = common::client()
        .post(server.url("/"))
        .json(&payment(json!(2003)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(sent.lock().unwrap().len(), 1);

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_custom_webhook_path() {
    let (telegram, _) = common::start_telegram_backend(200).await;
    let store = common::memory_store().await;
    common::insert_profile(&store, 2004, None, 0.0).await;
    let mut config = ServiceConfig::default();
    config.server.webhook_path = "/payments/webhook".to_string();
    let server = common::spawn_server(config, common::processor(Arc::new(store), telegram)).await;
    let client = common::client();

    let res = client
        .post(server.url("/payments/webhook"))
        .json(&payment(json!(2004)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let res = client.post(server.url("/")).json(&payment(json!(2004))).send().await.unwrap();
    assert_eq!(res.status(), 404);

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_graceful_shutdown() {
    let (telegram, _) = common::start_telegram_backend(200).await;
    let store = common::memory_store().await;
    let server = common::spawn_server(
        ServiceConfig::default(),
        common::processor(Arc::new(store), telegram),
    )
    .await;

    server.shutdown.trigger();
    let result = tokio::time::timeout(std::time::Duration::from_secs(5), server.handle)
        .await
        .expect("server did not stop")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_unanswered_notification_does_not_fail_committed_payment() {
    let (telegram, sent) = common::start_silent_telegram_backend().await;
    let store = common::memory_store().await;
    common::insert_profile(&store, 2005, None, 0.0).await;

    let mut config = ServiceConfig::default();
    config.database.url = "sqlite::memory:".to_string();
    config.server.request_timeout_secs = 3;
    config.telegram = common::telegram_config(telegram);
    config.telegram.timeout_secs = 1;
    assert!(validate_config(&config).is_ok());

    let processor = common::processor_with(Arc::new(store.clone()), &config.telegram);
    let server = common::spawn_server(config, processor).await;

    let res = common::client()
        .post(server.url("/"))
        .json(&payment(json!(2005)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(sent.lock().unwrap().len(), 1);
    assert_eq!(common::amount_paid(&store, 2005).await, 1.0);
    assert_eq!(common::payment_count(&store, 2005).await, 1);

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_naive_stored_expiry_is_renewal() {
    let (telegram, _) = common::start_telegram_backend(200).await;
    let store = common::memory_store().await;
    common::insert_profile(&store, 2006, Some("2099-01-01 00:00:00"), 3.0).await;
    common::insert_profile(&store, 2007, Some("not a date"), 1.0).await;
    let server = common::spawn_server(
        ServiceConfig::default(),
        common::processor(Arc::new(store), telegram),
    )
    .await;
    let client = common::client();

    for id in [2006, 2007] {
        let before = Utc::now();
        let body: Value = client
            .post(server.url("/"))
            .json(&payment(json!(id)))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        let next = parse(body["next_lesson_access_at"].as_str().unwrap());
        assert_eq!((next.hour(), next.minute(), next.second()), (2, 0, 0), "{id}");
        assert!(next > before, "{id}");
    }

    server.shutdown.trigger();
}
