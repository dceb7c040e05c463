//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use linguapulse_payments::config::{DatabaseConfig, ServiceConfig, TelegramConfig};
use linguapulse_payments::http::HttpServer;
use linguapulse_payments::lifecycle::Shutdown;
use linguapulse_payments::payments::{
    LessonSchedule, PaymentRecord, SubscriptionUpdate, UserProfile,
};
use linguapulse_payments::store::{SqliteStore, StoreError, StoreResult, SubscriptionStore};
use linguapulse_payments::telegram::TelegramNotifier;
use linguapulse_payments::SubscriptionProcessor;

pub const TEST_BOT_TOKEN: &str = "123:test-token";

/// One request seen by the mock Telegram API.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub body: String,
}

/// Start a mock Bot API answering every call with `status`.
///
/// Returns its address and the requests it received.
pub async fn start_telegram_backend(status: u16) -> (SocketAddr, Arc<Mutex<Vec<RecordedRequest>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let received = Arc::new(Mutex::new(Vec::new()));
    let log = received.clone();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let log = log.clone();
                    tokio::spawn(async move {
                        if let Some(request) = read_request(&mut socket).await {
                            log.lock().unwrap().push(request);
                        }
                        let (status_text, body) = match status {
                            200 => ("200 OK", r#"{"ok":true,"result":{}}"#),
                            400 => (
                                "400 Bad Request",
                                r#"{"ok":false,"description":"Bad Request"}"#,
                            ),
                            _ => ("500 Internal Server Error", r#"{"ok":false}"#),
                        };
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\n\
                             Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, received)
}

/// Start a mock Bot API that reads each request and never answers.
pub async fn start_silent_telegram_backend() -> (SocketAddr, Arc<Mutex<Vec<RecordedRequest>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let received = Arc::new(Mutex::new(Vec::new()));
    let log = received.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let log = log.clone();
            tokio::spawn(async move {
                if let Some(request) = read_request(&mut socket).await {
                    log.lock().unwrap().push(request);
                }
                tokio::time::sleep(Duration::from_secs(60)).await;
                drop(socket);
            });
        }
    });

    (addr, received)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> Option<RecordedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let path = head.split_whitespace().nth(1)?.to_string();
    let content_length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let body = String::from_utf8_lossy(&buf[header_end..]).to_string();
    Some(RecordedRequest { path, body })
}

/// Fresh in-memory database with the service tables.
pub async fn memory_store() -> SqliteStore {
    SqliteStore::connect(&DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        create_schema: true,
    })
    .await
    .unwrap()
}

pub async fn insert_profile(
    store: &SqliteStore,
    telegram_id: i64,
    expired_at: Option<&str>,
    amount_paid: f64,
) {
    sqlx::query(
        "INSERT INTO user_profiles (telegram_id, subscription_expired_at, amount_paid)
         VALUES (?, ?, ?)",
    )
    .bind(telegram_id)
    .bind(expired_at)
    .bind(amount_paid)
    .execute(store.pool())
    .await
    .unwrap();
}

pub async fn amount_paid(store: &SqliteStore, telegram_id: i64) -> f64 {
    sqlx::query_scalar("SELECT amount_paid FROM user_profiles WHERE telegram_id = ?")
        .bind(telegram_id)
        .fetch_one(store.pool())
        .await
        .unwrap()
}

pub async fn payment_count(store: &SqliteStore, telegram_id: i64) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM payment_history WHERE telegram_id = ?")
        .bind(telegram_id)
        .fetch_one(store.pool())
        .await
        .unwrap()
}

/// Store wrapper that can be told to fail individual writes.
pub struct FailingStore {
    inner: SqliteStore,
    pub fail_insert: AtomicBool,
    pub fail_update: AtomicBool,
}

impl FailingStore {
    pub fn new(inner: SqliteStore) -> Self {
        Self {
            inner,
            fail_insert: AtomicBool::new(false),
            fail_update: AtomicBool::new(false),
        }
    }
}

fn injected() -> StoreError {
    StoreError::Database(sqlx::Error::Protocol("injected failure".to_string()))
}

#[async_trait]
impl SubscriptionStore for FailingStore {
    async fn find_profile(&self, telegram_id: i64) -> StoreResult<Option<UserProfile>> {
        self.inner.find_profile(telegram_id).await
    }

    async fn insert_payment(&self, record: &PaymentRecord) -> StoreResult<()> {
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(injected());
        }
        self.inner.insert_payment(record).await
    }

    async fn update_subscription(
        &self,
        expected: &UserProfile,
        update: &SubscriptionUpdate,
    ) -> StoreResult<bool> {
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(injected());
        }
        self.inner.update_subscription(expected, update).await
    }
}

/// Telegram settings pointing at the mock Bot API.
pub fn telegram_config(telegram: SocketAddr) -> TelegramConfig {
    TelegramConfig {
        api_base: format!("http://{}", telegram),
        bot_token: TEST_BOT_TOKEN.to_string(),
        timeout_secs: 2,
    }
}

/// Processor over `store` notifying the mock Bot API at `telegram`.
pub fn processor(store: Arc<dyn SubscriptionStore>, telegram: SocketAddr) -> SubscriptionProcessor {
    processor_with(store, &telegram_config(telegram))
}

pub fn processor_with(
    store: Arc<dyn SubscriptionStore>,
    telegram: &TelegramConfig,
) -> SubscriptionProcessor {
    let notifier = TelegramNotifier::new(telegram).unwrap();
    SubscriptionProcessor::new(store, Arc::new(notifier), LessonSchedule::default())
}

/// A running service bound to an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: tokio::task::JoinHandle<Result<(), std::io::Error>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

pub async fn spawn_server(config: ServiceConfig, processor: SubscriptionProcessor) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, Arc::new(processor));
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));
    tokio::time::sleep(Duration::from_millis(50)).await;
    TestServer { addr, shutdown, handle }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
