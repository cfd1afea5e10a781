//! Payment provider capability.
//!
//! The provider answers a single question — did the charge go through — as
//! a boolean, where `false` means the customer's account had insufficient
//! funds. Everything else it can tell us (unknown customer, wrong currency,
//! a transient network fault) arrives as an explicit [`ProviderError`]
//! signal rather than a business return value; the billing service maps
//! those onto the charge failure taxonomy.

use async_trait::async_trait;

use super::invoice::Invoice;

/// Failure signals a payment provider can raise instead of answering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The provider has no account for the invoice's customer.
    CustomerNotFound,
    /// The invoice currency does not match the customer account currency.
    CurrencyMismatch,
    /// The provider could not be reached or the call was interrupted.
    Network(String),
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CustomerNotFound => write!(f, "customer not found"),
            Self::CurrencyMismatch => write!(f, "currency mismatch"),
            Self::Network(message) => write!(f, "network error: {}", message),
        }
    }
}

impl std::error::Error for ProviderError {}

/// External payment provider capability.
///
/// Implementations charge a customer account for the amount on the invoice.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Charge the invoice against the owning customer's account.
    ///
    /// Returns `Ok(true)` when the charge succeeded and `Ok(false)` when
    /// the account balance did not allow the charge.
    async fn charge(&self, invoice: &Invoice) -> Result<bool, ProviderError>;
}

/// A provider that settles charges by coin flip.
///
/// Stands in for a real payment network in demo runs and local
/// development, the way the reference deployment seeds one.
#[derive(Debug, Clone)]
pub struct RandomPaymentProvider {
    success_rate: f64,
    network_failure_rate: f64,
}

impl RandomPaymentProvider {
    /// Create a provider that succeeds with `success_rate` probability and
    /// declines the rest of the time, never raising errors.
    #[must_use]
    pub fn new(success_rate: f64) -> Self {
        Self {
            success_rate: success_rate.clamp(0.0, 1.0),
            network_failure_rate: 0.0,
        }
    }

    /// Additionally raise a transient network error with the given
    /// probability, so demo runs exercise the retry path.
    #[must_use]
    pub fn with_network_failures(mut self, rate: f64) -> Self {
        self.network_failure_rate = rate.clamp(0.0, 1.0);
        self
    }
}

impl Default for RandomPaymentProvider {
    fn default() -> Self {
        Self::new(0.5)
    }
}

#[async_trait]
impl PaymentProvider for RandomPaymentProvider {
    async fn charge(&self, _invoice: &Invoice) -> Result<bool, ProviderError> {
        use rand::Rng;
        let mut rng = rand::thread_rng();

        if self.network_failure_rate > 0.0 && rng.gen_bool(self.network_failure_rate) {
            return Err(ProviderError::Network("simulated outage".to_string()));
        }
        Ok(rng.gen_bool(self.success_rate))
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod test {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// One scripted provider response.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum MockCharge {
        Success,
        Decline,
        CustomerNotFound,
        CurrencyMismatch,
        NetworkError,
    }

    /// Scripted payment provider for tests.
    ///
    /// Plays back a fixed sequence of responses, then repeats a default
    /// response once the script is exhausted. Records how many times
    /// `charge` was invoked so tests can assert retry counts.
    pub struct MockPaymentProvider {
        script: Mutex<VecDeque<MockCharge>>,
        fallback: MockCharge,
        calls: AtomicU32,
    }

    impl MockPaymentProvider {
        /// A provider that always succeeds.
        #[must_use]
        pub fn succeeding() -> Self {
            Self::repeating(MockCharge::Success)
        }

        /// A provider that always declines.
        #[must_use]
        pub fn declining() -> Self {
            Self::repeating(MockCharge::Decline)
        }

        /// A provider that repeats the same response forever.
        #[must_use]
        pub fn repeating(response: MockCharge) -> Self {
            Self {
                script: Mutex::new(VecDeque::new()),
                fallback: response,
                calls: AtomicU32::new(0),
            }
        }

        /// A provider that plays `script` in order, then repeats `fallback`.
        #[must_use]
        pub fn scripted(script: Vec<MockCharge>, fallback: MockCharge) -> Self {
            Self {
                script: Mutex::new(script.into()),
                fallback,
                calls: AtomicU32::new(0),
            }
        }

        /// Number of times `charge` has been invoked.
        pub fn call_count(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PaymentProvider for MockPaymentProvider {
        async fn charge(&self, _invoice: &Invoice) -> Result<bool, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(self.fallback);
            match next {
                MockCharge::Success => Ok(true),
                MockCharge::Decline => Ok(false),
                MockCharge::CustomerNotFound => Err(ProviderError::CustomerNotFound),
                MockCharge::CurrencyMismatch => Err(ProviderError::CurrencyMismatch),
                MockCharge::NetworkError => {
                    Err(ProviderError::Network("simulated outage".to_string()))
                }
            }
        }
    }
}
