//! Payment webhook handler.

use std::time::Instant;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::http::request::{WebhookAction, WebhookRequest};
use crate::http::response::{SubscriptionResponse, WebhookError};
use crate::http::server::AppState;
use crate::observability::metrics;

/// Handle `POST` on the webhook path.
///
/// The body is read as raw bytes so malformed JSON maps to our own
/// "Invalid JSON" answer instead of axum's extractor rejection.
pub async fn handle_webhook(State(state): State<AppState>, body: Bytes) -> Response {
    let start = Instant::now();

    let response = match dispatch(&state, &body).await {
        Ok(response) => response,
        Err(e) => {
            let status = e.status();
            if status.is_server_error() {
                tracing::error!(error = %e, "Subscription processing failed");
            } else {
                tracing::info!(status = status.as_u16(), reason = %e, "Rejected webhook call");
            }
            e.into_response()
        }
    };

    metrics::record_request(response.status().as_u16(), start);
    response
}

async fn dispatch(state: &AppState, body: &[u8]) -> Result<Response, WebhookError> {
    let request = WebhookRequest::from_body(body)?;

    match request.action {
        WebhookAction::ProcessSubscription => {
            let result = state.processor.process(request.telegram_id).await?;
            Ok((StatusCode::OK, Json(SubscriptionResponse::from(&result))).into_response())
        }
    }
}

/// Any method other than `POST` on the webhook path.
pub async fn method_not_allowed() -> Response {
    metrics::record_request(StatusCode::METHOD_NOT_ALLOWED.as_u16(), Instant::now());
    WebhookError::MethodNotAllowed.into_response()
}
