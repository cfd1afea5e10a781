//! Storage traits for invoices and customers.
//!
//! Implement these traits to persist billing state to your database. The
//! in-memory implementation in [`memory`] backs tests, demos, and
//! single-instance deployments.

pub mod memory;

use async_trait::async_trait;

use crate::billing::{Currency, Customer, CustomerId, Invoice, InvoiceId, InvoiceStatus, Money};
use crate::error::Result;

pub use memory::InMemoryStore;

/// Data access for invoices.
///
/// The billing service only ever flips a fetched invoice from pending to
/// paid; creation comes from seeding and next-period generation, and
/// nothing deletes invoices.
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Fetch one invoice by id.
    async fn fetch_invoice(&self, id: InvoiceId) -> Result<Option<Invoice>>;

    /// Fetch all invoices, ordered by id.
    async fn fetch_invoices(&self) -> Result<Vec<Invoice>>;

    /// Fetch all pending invoices, ordered by id.
    async fn fetch_pending_invoices(&self) -> Result<Vec<Invoice>>;

    /// Create a new invoice and assign it an id.
    async fn create_invoice(
        &self,
        customer_id: CustomerId,
        amount: Money,
        status: InvoiceStatus,
    ) -> Result<Invoice>;

    /// Replace the stored invoice with the same id.
    ///
    /// Fails with `NotFound` if the id is absent.
    async fn update_invoice(&self, invoice: &Invoice) -> Result<()>;
}

/// Data access for customers.
#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// Fetch one customer by id.
    async fn fetch_customer(&self, id: CustomerId) -> Result<Option<Customer>>;

    /// Fetch all customers, ordered by id.
    async fn fetch_customers(&self) -> Result<Vec<Customer>>;

    /// Create a new customer with the given account currency.
    async fn create_customer(&self, currency: Currency) -> Result<Customer>;
}
