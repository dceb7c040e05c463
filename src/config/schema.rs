//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the payments
//! service. All types derive Serde traits for deserialization from config files.
//! Secrets (bot token, admin key, database URL) have no literal defaults; they
//! come from the config file or the environment.

use serde::{Deserialize, Serialize};

/// Root configuration for the payments service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP server settings (bind address, webhook path, limits).
    pub server: ServerConfig,

    /// Relational store settings.
    pub database: DatabaseConfig,

    /// Telegram Bot API settings.
    pub telegram: TelegramConfig,

    /// Lesson schedule settings.
    pub schedule: ScheduleConfig,

    /// Subscription processor tuning.
    pub processor: ProcessorConfig,

    /// Beginner funnel logging.
    pub funnel: FunnelConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub admin: AdminConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Path the payment webhook is mounted on.
    pub webhook_path: String,

    /// Request timeout (total time for request/response) in seconds.
    pub request_timeout_secs: u64,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            webhook_path: "/".to_string(),
            request_timeout_secs: 30,
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Relational store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection URL (e.g., "sqlite://linguapulse.db"). Overridden by `DATABASE_URL`.
    pub url: String,

    /// Maximum pooled connections.
    pub max_connections: u32,

    /// Create the tables on startup if they are missing.
    pub create_schema: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 5,
            create_schema: false,
        }
    }
}

/// Telegram Bot API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot API base URL.
    pub api_base: String,

    /// Bot token. Overridden by `BOT_TOKEN`. Empty disables notifications.
    pub bot_token: String,

    /// Outbound request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.telegram.org".to_string(),
            bot_token: String::new(),
            timeout_secs: 5,
        }
    }
}

/// Lesson schedule configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Offset of the service's local time from UTC, in minutes.
    pub utc_offset_minutes: i32,
}

/// Subscription processor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Attempts at the conditional profile update before giving up.
    pub max_update_attempts: u32,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            max_update_attempts: 3,
        }
    }
}

/// Beginner funnel logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FunnelConfig {
    /// Enable funnel logging.
    pub enabled: bool,

    /// Survey language levels that count as beginners.
    pub beginner_levels: Vec<String>,
}

impl Default for FunnelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            beginner_levels: vec!["Начинающий".to_string(), "Beginner".to_string()],
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin routes.
    pub enabled: bool,

    /// API key for authentication (Bearer token). Overridden by `ADMIN_API_KEY`.
    pub api_key: String,
}
