//! Audit reporting for billing runs.
//!
//! Every charge outcome is reported through an audit logger keyed by
//! invoice and customer id, so operators can tell actionable failures
//! (a customer without funds) apart from operational ones (the provider
//! unreachable until retries ran out).

use std::fmt;

use async_trait::async_trait;

use super::customer::CustomerId;
use super::invoice::{InvoiceId, Money};

/// Audit event types for billing runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingAuditEvent {
    /// A billing run started.
    RunStarted { invoices: usize },
    /// A billing run finished with the given tallies.
    RunCompleted { charged: usize, failed: usize },
    /// An invoice was charged and marked paid.
    InvoiceCharged {
        invoice_id: InvoiceId,
        customer_id: CustomerId,
        amount: Money,
        attempts: u32,
    },
    /// The provider declined the charge for insufficient funds.
    ChargeDeclined {
        invoice_id: InvoiceId,
        customer_id: CustomerId,
    },
    /// A transient failure was seen and another attempt is scheduled.
    RetryScheduled {
        invoice_id: InvoiceId,
        attempt: u32,
        max_attempts: u32,
    },
    /// All retry attempts were consumed without a successful charge.
    RetriesExhausted {
        invoice_id: InvoiceId,
        attempts: u32,
    },
    /// Charging was aborted with a terminal classification.
    ChargeAborted {
        invoice_id: InvoiceId,
        kind: &'static str,
        message: String,
    },
}

impl fmt::Display for BillingAuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RunStarted { invoices } => {
                write!(f, "Billing run started: {} pending invoice(s)", invoices)
            }
            Self::RunCompleted { charged, failed } => {
                write!(f, "Billing run completed: charged={}, failed={}", charged, failed)
            }
            Self::InvoiceCharged {
                invoice_id,
                customer_id,
                amount,
                attempts,
            } => {
                write!(
                    f,
                    "Invoice {} charged: customer={}, amount={}, attempts={}",
                    invoice_id, customer_id, amount, attempts
                )
            }
            Self::ChargeDeclined {
                invoice_id,
                customer_id,
            } => {
                write!(
                    f,
                    "Invoice {} declined: customer={} has insufficient funds",
                    invoice_id, customer_id
                )
            }
            Self::RetryScheduled {
                invoice_id,
                attempt,
                max_attempts,
            } => {
                write!(
                    f,
                    "Invoice {} hit a network error, retrying {}/{}",
                    invoice_id, attempt, max_attempts
                )
            }
            Self::RetriesExhausted {
                invoice_id,
                attempts,
            } => {
                write!(
                    f,
                    "Invoice {} abandoned after {} network attempt(s)",
                    invoice_id, attempts
                )
            }
            Self::ChargeAborted {
                invoice_id,
                kind,
                message,
            } => {
                write!(f, "Invoice {} aborted ({}): {}", invoice_id, kind, message)
            }
        }
    }
}

/// Trait for audit logging backends.
///
/// Implementations should handle failures gracefully to avoid disrupting
/// billing runs.
#[async_trait]
pub trait BillingAuditLogger: Send + Sync {
    /// Record one billing audit event.
    async fn log(&self, event: BillingAuditEvent);
}

/// No-op audit logger for when reporting is not needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpAuditLogger;

#[async_trait]
impl BillingAuditLogger for NoOpAuditLogger {
    async fn log(&self, _event: BillingAuditEvent) {
        // No-op
    }
}

/// Tracing-based audit logger.
///
/// Success and run lifecycle events log at INFO, retries and declines at
/// WARN, terminal aborts at ERROR.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditLogger;

#[async_trait]
impl BillingAuditLogger for TracingAuditLogger {
    async fn log(&self, event: BillingAuditEvent) {
        let kind = event_kind(&event);
        match &event {
            BillingAuditEvent::RunStarted { .. }
            | BillingAuditEvent::RunCompleted { .. }
            | BillingAuditEvent::InvoiceCharged { .. } => {
                tracing::info!(target: "tollgate::billing", event_type = kind, "{}", event);
            }
            BillingAuditEvent::ChargeDeclined { .. }
            | BillingAuditEvent::RetryScheduled { .. } => {
                tracing::warn!(target: "tollgate::billing", event_type = kind, "{}", event);
            }
            BillingAuditEvent::RetriesExhausted { .. }
            | BillingAuditEvent::ChargeAborted { .. } => {
                tracing::error!(target: "tollgate::billing", event_type = kind, "{}", event);
            }
        }
    }
}

/// Get the event kind as a string for structured logging.
fn event_kind(event: &BillingAuditEvent) -> &'static str {
    match event {
        BillingAuditEvent::RunStarted { .. } => "run_started",
        BillingAuditEvent::RunCompleted { .. } => "run_completed",
        BillingAuditEvent::InvoiceCharged { .. } => "invoice_charged",
        BillingAuditEvent::ChargeDeclined { .. } => "charge_declined",
        BillingAuditEvent::RetryScheduled { .. } => "retry_scheduled",
        BillingAuditEvent::RetriesExhausted { .. } => "retries_exhausted",
        BillingAuditEvent::ChargeAborted { .. } => "charge_aborted",
    }
}
