//! Tollgate - periodic invoice charging.
//!
//! Tollgate charges pending invoices against an external payment provider
//! on a calendar schedule, built on Tokio and Axum. Transient provider
//! failures are retried with bounded exponential backoff; business
//! failures (unknown customer, currency mismatch, insufficient funds)
//! abort immediately, and no invoice is ever charged twice.
//!
//! # Features
//!
//! - **Charging**: per-invoice retry loop with a closed failure taxonomy
//! - **Batching**: concurrent, isolated fan-out over the pending batch
//! - **Scheduling**: a monthly trigger with clean shutdown
//! - **Storage**: pluggable invoice/customer stores, in-memory included
//! - **REST**: invoice/customer lookup and manual billing triggers
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tollgate::{BillingService, Config, InMemoryStore, RandomPaymentProvider};
//!
//! #[tokio::main]
//! async fn main() {
//!     tollgate::init_tracing();
//!
//!     let config = Config::from_env();
//!     let store = InMemoryStore::new();
//!     let billing = BillingService::new(
//!         Arc::new(store.clone()),
//!         Arc::new(RandomPaymentProvider::default()),
//!         config.billing.clone(),
//!     );
//!     // ... seed data, start the scheduler, serve the REST surface
//! }
//! ```

mod app;
pub mod billing;
pub mod bootstrap;
mod config;
mod error;
pub mod rest;
pub mod scheduler;
pub mod store;
pub mod utils;

// Re-exports for public API
pub use app::AppContext;
pub use billing::{
    BackoffPolicy, BillingRunSummary, BillingService, ChargeError, ChargeOutcome, ChargeReceipt,
    Currency, Customer, CustomerId, Invoice, InvoiceId, InvoiceStatus, Money, PaymentProvider,
    ProviderError, RandomPaymentProvider,
};
pub use config::{BillingConfig, Config, LoggingConfig, SchedulerConfig, ServerConfig};
pub use error::{Result, TollgateError};
pub use scheduler::{Period, ScheduledTask, schedule_every};
pub use store::{CustomerStore, InMemoryStore, InvoiceStore};

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging with sensible defaults.
///
/// Call this early in your application, before constructing the services.
///
/// # Environment Variables
///
/// - `RUST_LOG`: Set log level (e.g., "info", "debug", "tollgate=debug")
/// - `TOLLGATE_LOG_JSON`: Set to "true" for JSON formatted logs
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = std::env::var("TOLLGATE_LOG_JSON")
        .map(|v| v.parse::<bool>().unwrap_or(false))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Initialize tracing with a custom configuration.
pub fn init_tracing_with_config(config: &Config) {
    let env_filter = EnvFilter::new(&config.logging.level);

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
