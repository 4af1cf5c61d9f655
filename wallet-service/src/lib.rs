pub mod app;
pub mod config;
pub mod gateway;
pub mod metrics;
pub mod payment_handlers;
pub mod reference;
pub mod store;
pub mod webhook;

pub use app::{build_router, AppState};
pub use config::{AppConfig, PaystackConfig};
