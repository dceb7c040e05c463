//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, timeout, body limit, tracing)
//!     → webhook.rs (POST only, everything else answers 405)
//!     → request.rs (parse JSON, validate telegram_id and action)
//!     → payments::SubscriptionProcessor
//!     → response.rs (success JSON or error mapping)
//! ```

pub mod request;
pub mod response;
pub mod server;
pub mod webhook;

pub use request::{WebhookAction, WebhookRequest, X_REQUEST_ID};
pub use response::{SubscriptionResponse, WebhookError};
pub use server::{AppState, HttpServer};
