//! Invoice billing: domain types, the charge orchestrator, and its
//! retry/backoff machinery.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tollgate::billing::{BillingService, RandomPaymentProvider};
//! use tollgate::store::{InMemoryStore, InvoiceStore};
//! use tollgate::{BillingConfig, Config};
//!
//! let store = InMemoryStore::new();
//! let billing = BillingService::new(
//!     Arc::new(store.clone()),
//!     Arc::new(RandomPaymentProvider::default()),
//!     BillingConfig::default(),
//! );
//!
//! let pending = store.fetch_pending_invoices().await?;
//! let summary = billing.charge_invoices(pending).await;
//! tracing::info!(charged = summary.charged(), failed = summary.failed(), "Run finished");
//! ```

pub mod audit;
pub mod backoff;
pub mod charger;
pub mod customer;
pub mod error;
pub mod invoice;
pub mod provider;

// Domain exports
pub use customer::{Customer, CustomerId};
pub use invoice::{Currency, Invoice, InvoiceId, InvoiceStatus, InvoiceStatusParseError, Money};

// Orchestrator exports
pub use charger::{BillingRunSummary, BillingService, ChargeFailure, ChargeOutcome, ChargeReceipt};

// Retry machinery exports
pub use backoff::BackoffPolicy;

// Provider exports
pub use provider::{PaymentProvider, ProviderError, RandomPaymentProvider};

// Error exports
pub use error::ChargeError;

// Audit exports
pub use audit::{BillingAuditEvent, BillingAuditLogger, NoOpAuditLogger, TracingAuditLogger};

// Test exports
#[cfg(any(test, feature = "test-support"))]
pub use provider::test::{MockCharge, MockPaymentProvider};
