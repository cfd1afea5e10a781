use std::sync::Arc;

use crate::billing::BillingService;
use crate::config::Config;
use crate::store::{CustomerStore, InvoiceStore};

/// Application context shared with REST handlers.
///
/// Holds the configuration and the collaborators the handlers need; all
/// fields are cheaply cloneable handles to shared state.
#[derive(Clone)]
pub struct AppContext {
    pub config: Config,
    pub invoices: Arc<dyn InvoiceStore>,
    pub customers: Arc<dyn CustomerStore>,
    pub billing: Arc<BillingService>,
}

impl AppContext {
    #[must_use]
    pub fn new(
        config: Config,
        invoices: Arc<dyn InvoiceStore>,
        customers: Arc<dyn CustomerStore>,
        billing: Arc<BillingService>,
    ) -> Self {
        Self {
            config,
            invoices,
            customers,
            billing,
        }
    }
}
