//! Webhook request parsing.
//!
//! # Responsibilities
//! - Parse the JSON body into a typed request
//! - Validate `telegram_id` (integer or numeric string, non-zero)
//! - Recognize the `action` selector
//!
//! # Design Decisions
//! - Checks run in a fixed order: JSON, then identifier, then action, so a
//!   body with several problems always reports the first one
//! - The body is parsed as untyped JSON first; a non-object body is not a JSON
//!   error but a missing identifier

use serde_json::Value;

use crate::http::response::WebhookError;

/// The only action the webhook accepts.
pub const PROCESS_SUBSCRIPTION_ACTION: &str = "process_subscription";

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Actions the webhook understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookAction {
    /// Apply one weekly subscription payment.
    ProcessSubscription,
}

impl WebhookAction {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            PROCESS_SUBSCRIPTION_ACTION => Some(WebhookAction::ProcessSubscription),
            _ => None,
        }
    }
}

/// A validated webhook request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookRequest {
    pub telegram_id: i64,
    pub action: WebhookAction,
}

impl WebhookRequest {
    /// Parse and validate a raw request body.
    pub fn from_body(body: &[u8]) -> Result<Self, WebhookError> {
        let value: Value = serde_json::from_slice(body).map_err(|_| WebhookError::InvalidJson)?;

        let telegram_id = value
            .get("telegram_id")
            .and_then(parse_telegram_id)
            .ok_or(WebhookError::InvalidTelegramId)?;

        let action = value
            .get("action")
            .and_then(Value::as_str)
            .and_then(WebhookAction::parse)
            .ok_or(WebhookError::InvalidAction)?;

        Ok(Self { telegram_id, action })
    }
}

fn parse_telegram_id(value: &Value) -> Option<i64> {
    let id = match value {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    (id != 0).then_some(id)
}
