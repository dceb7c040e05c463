use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::http::server::AppState;
use crate::payments::types::{format_timestamp, UserProfile};

#[derive(Debug, Serialize, Deserialize)]
pub struct SystemStatus {
    pub version: String,
    pub status: String,
}

/// A profile as seen at the moment of the request.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserStatus {
    pub telegram_id: i64,
    pub subscribed_at: Option<String>,
    pub subscription_expired_at: Option<String>,
    pub next_lesson_access_at: Option<String>,
    pub amount_paid: f64,
    pub subscription_active: bool,
    pub lesson_available: bool,
}

impl UserStatus {
    fn new(profile: &UserProfile, now: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            telegram_id: profile.telegram_id,
            subscribed_at: profile.subscribed_at.map(format_timestamp),
            subscription_expired_at: profile.subscription_expired_at.map(format_timestamp),
            next_lesson_access_at: profile.next_lesson_access_at.map(format_timestamp),
            amount_paid: profile.amount_paid,
            subscription_active: profile.is_subscription_active(now),
            lesson_available: profile.is_lesson_available(now),
        }
    }
}

pub async fn get_status() -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "operational".to_string(),
    })
}

pub async fn get_user(State(state): State<AppState>, Path(telegram_id): Path<i64>) -> Response {
    let processor = &state.processor;
    match processor.store().find_profile(telegram_id).await {
        Ok(Some(profile)) => {
            Json(UserStatus::new(&profile, processor.clock().now())).into_response()
        }
        Ok(None) => (StatusCode::NOT_FOUND, "User not found").into_response(),
        Err(e) => {
            tracing::error!(telegram_id, error = %e, "Failed to load profile");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Database error: {e}")).into_response()
        }
    }
}
