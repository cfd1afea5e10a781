//! In-memory invoice and customer store.
//!
//! Suitable for development, testing, and single-instance deployments.
//! All state lives in maps guarded by async mutexes; ids are handed out
//! from atomic counters so concurrent creates never collide.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::billing::{Currency, Customer, CustomerId, Invoice, InvoiceId, InvoiceStatus, Money};
use crate::error::{Result, TollgateError};

use super::{CustomerStore, InvoiceStore};

/// In-memory implementation of [`InvoiceStore`] and [`CustomerStore`].
///
/// Cloning is cheap and all clones share the same underlying state.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    invoices: Arc<Mutex<BTreeMap<InvoiceId, Invoice>>>,
    customers: Arc<Mutex<BTreeMap<CustomerId, Customer>>>,
    next_invoice_id: Arc<AtomicU64>,
    next_customer_id: Arc<AtomicU64>,
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored invoices.
    pub async fn invoice_count(&self) -> usize {
        self.invoices.lock().await.len()
    }
}

#[async_trait]
impl InvoiceStore for InMemoryStore {
    async fn fetch_invoice(&self, id: InvoiceId) -> Result<Option<Invoice>> {
        Ok(self.invoices.lock().await.get(&id).cloned())
    }

    async fn fetch_invoices(&self) -> Result<Vec<Invoice>> {
        Ok(self.invoices.lock().await.values().cloned().collect())
    }

    async fn fetch_pending_invoices(&self) -> Result<Vec<Invoice>> {
        Ok(self
            .invoices
            .lock()
            .await
            .values()
            .filter(|invoice| invoice.status == InvoiceStatus::Pending)
            .cloned()
            .collect())
    }

    async fn create_invoice(
        &self,
        customer_id: CustomerId,
        amount: Money,
        status: InvoiceStatus,
    ) -> Result<Invoice> {
        let id = InvoiceId(self.next_invoice_id.fetch_add(1, Ordering::SeqCst) + 1);
        let invoice = Invoice::new(id, customer_id, amount, status);
        self.invoices.lock().await.insert(id, invoice.clone());
        Ok(invoice)
    }

    async fn update_invoice(&self, invoice: &Invoice) -> Result<()> {
        let mut invoices = self.invoices.lock().await;
        match invoices.get_mut(&invoice.id) {
            Some(stored) => {
                *stored = invoice.clone();
                Ok(())
            }
            None => Err(TollgateError::NotFound(format!(
                "Invoice not found: {}",
                invoice.id
            ))),
        }
    }
}

#[async_trait]
impl CustomerStore for InMemoryStore {
    async fn fetch_customer(&self, id: CustomerId) -> Result<Option<Customer>> {
        Ok(self.customers.lock().await.get(&id).copied())
    }

    async fn fetch_customers(&self) -> Result<Vec<Customer>> {
        Ok(self.customers.lock().await.values().copied().collect())
    }

    async fn create_customer(&self, currency: Currency) -> Result<Customer> {
        let id = CustomerId(self.next_customer_id.fetch_add(1, Ordering::SeqCst) + 1);
        let customer = Customer::new(id, currency);
        self.customers.lock().await.insert(id, customer);
        Ok(customer)
    }
}
