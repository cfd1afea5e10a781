//! Demo data seeding and next-period invoice generation.

use rand::Rng;

use crate::billing::{Currency, InvoiceStatus, Money};
use crate::error::Result;
use crate::store::{CustomerStore, InvoiceStore};

/// Customers created by [`seed_demo_data`].
const SEED_CUSTOMERS: usize = 100;
/// Invoices created per seeded customer; only the first stays pending.
const SEED_INVOICES_PER_CUSTOMER: usize = 10;

/// Random invoice amount between 10.00 and 500.00 in minor units.
fn random_amount_minor() -> i64 {
    rand::thread_rng().gen_range(1_000..=50_000)
}

fn random_currency() -> Currency {
    let index = rand::thread_rng().gen_range(0..Currency::ALL.len());
    Currency::ALL[index]
}

/// Populate the store with demo customers and invoices.
///
/// Each customer gets one pending invoice for the upcoming billing run and
/// a tail of already-paid history, all denominated in the customer's
/// account currency.
pub async fn seed_demo_data<S>(store: &S) -> Result<()>
where
    S: InvoiceStore + CustomerStore,
{
    for _ in 0..SEED_CUSTOMERS {
        let customer = store.create_customer(random_currency()).await?;

        for n in 0..SEED_INVOICES_PER_CUSTOMER {
            let status = if n == 0 {
                InvoiceStatus::Pending
            } else {
                InvoiceStatus::Paid
            };
            let amount = Money::new(random_amount_minor(), customer.currency);
            store.create_invoice(customer.id, amount, status).await?;
        }
    }

    tracing::info!(
        customers = SEED_CUSTOMERS,
        invoices = SEED_CUSTOMERS * SEED_INVOICES_PER_CUSTOMER,
        "Seeded demo data"
    );
    Ok(())
}

/// Create one pending invoice per customer for the next billing period.
///
/// Runs after each scheduled billing run completes, regardless of how many
/// charges in that run failed. Returns the number of invoices created.
pub async fn generate_next_period_invoices<S>(store: &S) -> Result<usize>
where
    S: InvoiceStore + CustomerStore,
{
    let customers = store.fetch_customers().await?;
    let mut created = 0;

    for customer in customers {
        let amount = Money::new(random_amount_minor(), customer.currency);
        store
            .create_invoice(customer.id, amount, InvoiceStatus::Pending)
            .await?;
        created += 1;
    }

    tracing::info!(invoices = created, "Generated next period invoices");
    Ok(created)
}
