//! The invoice-charging orchestrator.
//!
//! [`BillingService`] drives one invoice through the retry/backoff loop
//! and fans a batch of invoices out across isolated tasks. Provider
//! responses are folded into a single tagged [`AttemptOutcome`] so the
//! retry decision branches on data rather than error downcasting.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::BillingConfig;
use crate::store::InvoiceStore;

use super::audit::{BillingAuditEvent, BillingAuditLogger, TracingAuditLogger};
use super::backoff::BackoffPolicy;
use super::customer::CustomerId;
use super::error::ChargeError;
use super::invoice::{Invoice, InvoiceId, InvoiceStatus, Money};
use super::provider::{PaymentProvider, ProviderError};

/// Proof that an invoice was charged and persisted as paid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeReceipt {
    pub invoice_id: InvoiceId,
    pub customer_id: CustomerId,
    pub amount: Money,
    /// Provider calls it took to get here (1 when the first attempt lands).
    pub attempts: u32,
}

/// Terminal failure for one invoice within a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeFailure {
    pub invoice_id: InvoiceId,
    pub customer_id: CustomerId,
    pub error: ChargeError,
}

/// Terminal state of one invoice's charge task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChargeOutcome {
    Charged(ChargeReceipt),
    Failed(ChargeFailure),
}

impl ChargeOutcome {
    #[must_use]
    pub fn is_charged(&self) -> bool {
        matches!(self, Self::Charged(_))
    }

    #[must_use]
    pub fn invoice_id(&self) -> InvoiceId {
        match self {
            Self::Charged(receipt) => receipt.invoice_id,
            Self::Failed(failure) => failure.invoice_id,
        }
    }
}

/// Per-invoice outcomes of one billing run.
#[derive(Debug, Default)]
pub struct BillingRunSummary {
    outcomes: Vec<ChargeOutcome>,
}

impl BillingRunSummary {
    #[must_use]
    pub fn outcomes(&self) -> &[ChargeOutcome] {
        &self.outcomes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Number of invoices that ended up paid.
    #[must_use]
    pub fn charged(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_charged()).count()
    }

    /// Number of invoices that ended in a classified failure.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.charged()
    }
}

/// What a single provider call told us.
enum AttemptOutcome {
    Succeeded,
    Declined,
    Failed(ChargeError),
}

/// Charges invoices against the payment provider.
///
/// Cloning shares the underlying store, provider, and audit logger.
#[derive(Clone)]
pub struct BillingService {
    store: Arc<dyn InvoiceStore>,
    provider: Arc<dyn PaymentProvider>,
    audit: Arc<dyn BillingAuditLogger>,
    config: BillingConfig,
}

impl BillingService {
    /// Create a billing service reporting through the tracing audit logger.
    #[must_use]
    pub fn new(
        store: Arc<dyn InvoiceStore>,
        provider: Arc<dyn PaymentProvider>,
        config: BillingConfig,
    ) -> Self {
        Self {
            store,
            provider,
            audit: Arc::new(TracingAuditLogger),
            config,
        }
    }

    /// Replace the audit logger.
    #[must_use]
    pub fn with_audit_logger(mut self, audit: Arc<dyn BillingAuditLogger>) -> Self {
        self.audit = audit;
        self
    }

    /// Charge a single invoice, retrying transient failures with backoff.
    ///
    /// A paid invoice fails immediately with
    /// [`ChargeError::DoubleCharge`] without touching the provider. On
    /// success the invoice is persisted as paid with exactly one store
    /// write; on failure nothing is persisted and the error carries the
    /// classification.
    pub async fn charge_invoice(&self, invoice: &Invoice) -> Result<ChargeReceipt, ChargeError> {
        if invoice.is_paid() {
            let err = ChargeError::DoubleCharge {
                invoice_id: invoice.id,
            };
            self.audit
                .log(BillingAuditEvent::ChargeAborted {
                    invoice_id: invoice.id,
                    kind: err.kind(),
                    message: err.to_string(),
                })
                .await;
            return Err(err);
        }

        let mut policy = BackoffPolicy::new(
            self.config.max_attempts,
            Duration::from_millis(self.config.base_delay_ms),
        );

        while policy.has_next() {
            let attempt = policy.next().await;
            tracing::debug!(
                invoice_id = %invoice.id,
                customer_id = %invoice.customer_id,
                attempt,
                "Charging invoice"
            );

            match self.attempt_charge(invoice, attempt).await {
                AttemptOutcome::Succeeded => {
                    let paid = invoice.with_status(InvoiceStatus::Paid);
                    if let Err(err) = self.store.update_invoice(&paid).await {
                        let err = ChargeError::Unexpected {
                            invoice_id: invoice.id,
                            message: format!("failed to persist paid status: {}", err),
                        };
                        self.audit
                            .log(BillingAuditEvent::ChargeAborted {
                                invoice_id: invoice.id,
                                kind: err.kind(),
                                message: err.to_string(),
                            })
                            .await;
                        return Err(err);
                    }

                    let receipt = ChargeReceipt {
                        invoice_id: invoice.id,
                        customer_id: invoice.customer_id,
                        amount: invoice.amount,
                        attempts: attempt,
                    };
                    self.audit
                        .log(BillingAuditEvent::InvoiceCharged {
                            invoice_id: receipt.invoice_id,
                            customer_id: receipt.customer_id,
                            amount: receipt.amount,
                            attempts: receipt.attempts,
                        })
                        .await;
                    return Ok(receipt);
                }
                AttemptOutcome::Declined => {
                    let err = ChargeError::InsufficientFunds {
                        invoice_id: invoice.id,
                        customer_id: invoice.customer_id,
                    };
                    self.audit
                        .log(BillingAuditEvent::ChargeDeclined {
                            invoice_id: invoice.id,
                            customer_id: invoice.customer_id,
                        })
                        .await;
                    return Err(err);
                }
                AttemptOutcome::Failed(err) if err.is_retryable() => {
                    if policy.has_next() {
                        self.audit
                            .log(BillingAuditEvent::RetryScheduled {
                                invoice_id: invoice.id,
                                attempt,
                                max_attempts: policy.max_attempts(),
                            })
                            .await;
                    } else {
                        self.audit
                            .log(BillingAuditEvent::RetriesExhausted {
                                invoice_id: invoice.id,
                                attempts: attempt,
                            })
                            .await;
                        return Err(err);
                    }
                }
                AttemptOutcome::Failed(err) => {
                    self.audit
                        .log(BillingAuditEvent::ChargeAborted {
                            invoice_id: invoice.id,
                            kind: err.kind(),
                            message: err.to_string(),
                        })
                        .await;
                    return Err(err);
                }
            }
        }

        // Only reachable with a zero-attempt policy, which new() rejects.
        Err(ChargeError::Unexpected {
            invoice_id: invoice.id,
            message: "retry policy offered no attempts".to_string(),
        })
    }

    /// Charge a batch of invoices concurrently.
    ///
    /// One task per invoice, bounded by `batch_concurrency`; a failure or
    /// panic in one task never affects its siblings, and the summary holds
    /// exactly one terminal outcome per input invoice.
    pub async fn charge_invoices(&self, invoices: Vec<Invoice>) -> BillingRunSummary {
        self.audit
            .log(BillingAuditEvent::RunStarted {
                invoices: invoices.len(),
            })
            .await;

        let semaphore = Arc::new(Semaphore::new(self.config.batch_concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for invoice in invoices {
            let service = self.clone();
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("batch semaphore closed");
                service.charge_outcome(invoice).await
            });
        }

        let mut summary = BillingRunSummary::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => summary.outcomes.push(outcome),
                // Panics are caught inside the task; this only fires if the
                // task was aborted out from under us.
                Err(err) => {
                    tracing::error!(error = %err, "Charge task did not report an outcome");
                }
            }
        }

        self.audit
            .log(BillingAuditEvent::RunCompleted {
                charged: summary.charged(),
                failed: summary.failed(),
            })
            .await;
        summary
    }

    /// Run one invoice to a terminal outcome, catching panics so a broken
    /// charge path cannot take the batch down with it.
    async fn charge_outcome(&self, invoice: Invoice) -> ChargeOutcome {
        let invoice_id = invoice.id;
        let customer_id = invoice.customer_id;

        let charged = std::panic::AssertUnwindSafe(self.charge_invoice(&invoice))
            .catch_unwind()
            .await;

        match charged {
            Ok(Ok(receipt)) => ChargeOutcome::Charged(receipt),
            Ok(Err(error)) => ChargeOutcome::Failed(ChargeFailure {
                invoice_id,
                customer_id,
                error,
            }),
            Err(_) => ChargeOutcome::Failed(ChargeFailure {
                invoice_id,
                customer_id,
                error: ChargeError::Unexpected {
                    invoice_id,
                    message: "charge task panicked".to_string(),
                },
            }),
        }
    }

    /// Invoke the provider once and fold the response into a tagged outcome.
    async fn attempt_charge(&self, invoice: &Invoice, attempt: u32) -> AttemptOutcome {
        match self.provider.charge(invoice).await {
            Ok(true) => AttemptOutcome::Succeeded,
            Ok(false) => AttemptOutcome::Declined,
            Err(ProviderError::CustomerNotFound) => {
                AttemptOutcome::Failed(ChargeError::CustomerNotFound {
                    invoice_id: invoice.id,
                    customer_id: invoice.customer_id,
                })
            }
            Err(ProviderError::CurrencyMismatch) => {
                AttemptOutcome::Failed(ChargeError::CurrencyMismatch {
                    invoice_id: invoice.id,
                    customer_id: invoice.customer_id,
                })
            }
            Err(ProviderError::Network(message)) => {
                AttemptOutcome::Failed(ChargeError::Network {
                    invoice_id: invoice.id,
                    attempts: attempt,
                    message,
                })
            }
        }
    }
}
