//! Customer types.

use serde::{Deserialize, Serialize};

use super::invoice::Currency;

/// Unique customer identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub u64);

impl std::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A customer account that invoices are charged against.
///
/// The account currency is the one the payment provider settles in; an
/// invoice denominated in any other currency is rejected by the provider
/// with a currency mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub currency: Currency,
}

impl Customer {
    #[must_use]
    pub fn new(id: CustomerId, currency: Currency) -> Self {
        Self { id, currency }
    }
}
