//! Webhook responses and error mapping.
//!
//! # Design Decisions
//! - Client errors answer with a plain-text body naming the problem
//! - Persistence failures answer with JSON `{ success: false, error }` so the
//!   payment provider's retry logs carry the cause

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::payments::types::format_timestamp;
use crate::payments::{ProcessError, ProcessedSubscription};

/// Message returned with every successful activation.
pub const SUCCESS_MESSAGE: &str = "Subscription activated successfully";

/// Everything that can go wrong handling a webhook call.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Invalid JSON")]
    InvalidJson,

    #[error("Invalid telegram ID")]
    InvalidTelegramId,

    #[error("Invalid action")]
    InvalidAction,

    #[error(transparent)]
    Process(#[from] ProcessError),
}

impl WebhookError {
    pub fn status(&self) -> StatusCode {
        match self {
            WebhookError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            WebhookError::InvalidJson
            | WebhookError::InvalidTelegramId
            | WebhookError::InvalidAction => StatusCode::BAD_REQUEST,
            WebhookError::Process(ProcessError::UserNotFound(_)) => StatusCode::NOT_FOUND,
            WebhookError::Process(ProcessError::Persistence(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            WebhookError::Process(ProcessError::UserNotFound(_)) => {
                (status, "User not found").into_response()
            }
            WebhookError::Process(err @ ProcessError::Persistence(_)) => (
                status,
                Json(FailureResponse {
                    success: false,
                    error: err.to_string(),
                }),
            )
                .into_response(),
            client => (status, client.to_string()).into_response(),
        }
    }
}

/// Body of a successful activation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionResponse {
    pub success: bool,
    pub message: String,
    pub subscription_expired_at: String,
    pub next_lesson_access_at: String,
}

impl From<&ProcessedSubscription> for SubscriptionResponse {
    fn from(result: &ProcessedSubscription) -> Self {
        Self {
            success: true,
            message: SUCCESS_MESSAGE.to_string(),
            subscription_expired_at: format_timestamp(result.subscription_expired_at),
            next_lesson_access_at: format_timestamp(result.next_lesson_access_at),
        }
    }
}

/// Body of a 500 answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureResponse {
    pub success: bool,
    pub error: String,
}
