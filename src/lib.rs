//! LinguaPulse payment webhook library.

pub mod admin;
pub mod config;
pub mod funnel;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod payments;
pub mod store;
pub mod telegram;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use payments::SubscriptionProcessor;
