//! Startup orchestration: turn a validated config into a ready processor.

use std::sync::Arc;

use thiserror::Error;

use crate::config::ServiceConfig;
use crate::funnel::{BeginnerFunnelLogger, FunnelObserver, NoopFunnel};
use crate::payments::{LessonSchedule, SubscriptionProcessor};
use crate::store::{SqliteStore, StoreError};
use crate::telegram::{DisabledNotifier, NotifyError, Notifier, TelegramNotifier};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to open database: {0}")]
    Store(#[from] StoreError),

    #[error("failed to build Telegram client: {0}")]
    Notifier(#[from] NotifyError),

    #[error("invalid UTC offset: {0} minutes")]
    InvalidOffset(i32),
}

/// Open the store and assemble the processor with its collaborators.
pub async fn build_processor(
    config: &ServiceConfig,
) -> Result<SubscriptionProcessor, StartupError> {
    let store = SqliteStore::connect(&config.database).await?;

    let notifier: Arc<dyn Notifier> = if config.telegram.bot_token.is_empty() {
        tracing::warn!("No bot token configured, Telegram notifications disabled");
        Arc::new(DisabledNotifier)
    } else {
        Arc::new(TelegramNotifier::new(&config.telegram)?)
    };

    let funnel: Arc<dyn FunnelObserver> = if config.funnel.enabled {
        Arc::new(BeginnerFunnelLogger::new(store.pool().clone(), &config.funnel))
    } else {
        Arc::new(NoopFunnel)
    };

    let offset = config.schedule.utc_offset_minutes;
    let schedule =
        LessonSchedule::from_offset_minutes(offset).ok_or(StartupError::InvalidOffset(offset))?;

    Ok(
        SubscriptionProcessor::new(Arc::new(store), notifier, schedule)
            .with_funnel(funnel)
            .with_max_update_attempts(config.processor.max_update_attempts),
    )
}
