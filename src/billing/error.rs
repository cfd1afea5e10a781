//! Charge failure taxonomy.
//!
//! A closed classification of everything that can go wrong while charging
//! one invoice. The billing service branches on this data to decide retry
//! vs abort: only transient network failures are retried, every
//! business-rule failure is deterministic and aborts immediately.

use std::fmt;

use super::customer::CustomerId;
use super::invoice::InvoiceId;

/// Classified failure for a single invoice charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChargeError {
    /// The invoice was already paid before charging began.
    DoubleCharge { invoice_id: InvoiceId },
    /// The payment provider does not know the customer.
    CustomerNotFound {
        invoice_id: InvoiceId,
        customer_id: CustomerId,
    },
    /// The invoice currency does not match the customer's account currency.
    CurrencyMismatch {
        invoice_id: InvoiceId,
        customer_id: CustomerId,
    },
    /// The provider declined the charge (a business answer, not an error).
    InsufficientFunds {
        invoice_id: InvoiceId,
        customer_id: CustomerId,
    },
    /// The provider call failed transiently; `attempts` provider calls were
    /// made before giving up.
    Network {
        invoice_id: InvoiceId,
        attempts: u32,
        message: String,
    },
    /// Anything else, including a crashed batch task.
    Unexpected {
        invoice_id: InvoiceId,
        message: String,
    },
}

impl fmt::Display for ChargeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DoubleCharge { invoice_id } => {
                write!(f, "Attempt to charge invoice {} more than once", invoice_id)
            }
            Self::CustomerNotFound {
                invoice_id,
                customer_id,
            } => {
                write!(
                    f,
                    "Invoice {} failed: customer {} does not exist",
                    invoice_id, customer_id
                )
            }
            Self::CurrencyMismatch {
                invoice_id,
                customer_id,
            } => {
                write!(
                    f,
                    "Invoice {} failed: currency does not match customer {}'s account",
                    invoice_id, customer_id
                )
            }
            Self::InsufficientFunds {
                invoice_id,
                customer_id,
            } => {
                write!(
                    f,
                    "Invoice {} declined: insufficient funds on customer {}",
                    invoice_id, customer_id
                )
            }
            Self::Network {
                invoice_id,
                attempts,
                message,
            } => {
                write!(
                    f,
                    "Invoice {} failed after {} attempt(s): network error: {}",
                    invoice_id, attempts, message
                )
            }
            Self::Unexpected {
                invoice_id,
                message,
            } => {
                write!(f, "Invoice {} failed unexpectedly: {}", invoice_id, message)
            }
        }
    }
}

impl std::error::Error for ChargeError {}

impl ChargeError {
    /// Check if this failure may be retried with backoff.
    ///
    /// Only transient network failures qualify; everything else is
    /// deterministic and would fail again.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Stable kind tag for structured logging and API payloads.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DoubleCharge { .. } => "double_charge",
            Self::CustomerNotFound { .. } => "customer_not_found",
            Self::CurrencyMismatch { .. } => "currency_mismatch",
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::Network { .. } => "network_error",
            Self::Unexpected { .. } => "unexpected",
        }
    }

    /// The invoice this failure belongs to.
    #[must_use]
    pub fn invoice_id(&self) -> InvoiceId {
        match self {
            Self::DoubleCharge { invoice_id }
            | Self::CustomerNotFound { invoice_id, .. }
            | Self::CurrencyMismatch { invoice_id, .. }
            | Self::InsufficientFunds { invoice_id, .. }
            | Self::Network { invoice_id, .. }
            | Self::Unexpected { invoice_id, .. } => *invoice_id,
        }
    }

    /// The customer involved, when the failure identifies one.
    #[must_use]
    pub fn customer_id(&self) -> Option<CustomerId> {
        match self {
            Self::CustomerNotFound { customer_id, .. }
            | Self::CurrencyMismatch { customer_id, .. }
            | Self::InsufficientFunds { customer_id, .. } => Some(*customer_id),
            _ => None,
        }
    }
}

impl From<ChargeError> for crate::error::TollgateError {
    fn from(err: ChargeError) -> Self {
        match &err {
            ChargeError::DoubleCharge { .. } => {
                crate::error::TollgateError::Conflict(err.to_string())
            }
            ChargeError::CustomerNotFound { .. } => {
                crate::error::TollgateError::NotFound(err.to_string())
            }
            ChargeError::CurrencyMismatch { .. } | ChargeError::InsufficientFunds { .. } => {
                crate::error::TollgateError::Unprocessable(err.to_string())
            }
            ChargeError::Network { .. } => {
                crate::error::TollgateError::UpstreamUnavailable(err.to_string())
            }
            ChargeError::Unexpected { .. } => {
                crate::error::TollgateError::Internal(err.to_string())
            }
        }
    }
}
