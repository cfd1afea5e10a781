//! REST control surface.
//!
//! Read-only lookups over invoices and customers, plus manual billing
//! triggers for a single invoice or the whole pending batch. The periodic
//! scheduler uses the same billing service as these handlers, so a manual
//! run behaves exactly like a scheduled one.

pub mod response;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::app::AppContext;
use crate::billing::{
    BillingRunSummary, ChargeOutcome, ChargeReceipt, Customer, CustomerId, Invoice, InvoiceId,
    InvoiceStatus, Money,
};
use crate::error::{Result, TollgateError};

pub use response::ApiResponse;

/// Build the REST router; the caller supplies the [`AppContext`] state.
pub fn router() -> Router<AppContext> {
    Router::new()
        .route("/health", get(health))
        .route("/v1/invoices", get(list_invoices))
        .route("/v1/invoices/:id", get(get_invoice))
        .route("/v1/invoices/:id/charge", post(charge_invoice))
        .route("/v1/customers", get(list_customers))
        .route("/v1/customers/:id", get(get_customer))
        .route("/v1/billing/run", post(run_billing))
}

#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
}

async fn health() -> Json<ApiResponse<HealthBody>> {
    Json(ApiResponse::success(HealthBody { status: "ok" }))
}

#[derive(Debug, Deserialize)]
struct InvoiceListQuery {
    status: Option<String>,
}

async fn list_invoices(
    State(ctx): State<AppContext>,
    Query(query): Query<InvoiceListQuery>,
) -> Result<Json<ApiResponse<Vec<Invoice>>>> {
    let invoices = match query.status.as_deref() {
        None => ctx.invoices.fetch_invoices().await?,
        Some(raw) => {
            let status: InvoiceStatus = raw
                .parse()
                .map_err(|err: crate::billing::InvoiceStatusParseError| {
                    TollgateError::bad_request(err.to_string())
                })?;
            let all = ctx.invoices.fetch_invoices().await?;
            all.into_iter().filter(|i| i.status == status).collect()
        }
    };
    Ok(Json(ApiResponse::success(invoices)))
}

async fn get_invoice(
    State(ctx): State<AppContext>,
    Path(id): Path<u64>,
) -> Result<Json<ApiResponse<Invoice>>> {
    let invoice = ctx
        .invoices
        .fetch_invoice(InvoiceId(id))
        .await?
        .ok_or_else(|| TollgateError::not_found(format!("Invoice not found: {}", id)))?;
    Ok(Json(ApiResponse::success(invoice)))
}

async fn list_customers(
    State(ctx): State<AppContext>,
) -> Result<Json<ApiResponse<Vec<Customer>>>> {
    Ok(Json(ApiResponse::success(
        ctx.customers.fetch_customers().await?,
    )))
}

async fn get_customer(
    State(ctx): State<AppContext>,
    Path(id): Path<u64>,
) -> Result<Json<ApiResponse<Customer>>> {
    let customer = ctx
        .customers
        .fetch_customer(CustomerId(id))
        .await?
        .ok_or_else(|| TollgateError::not_found(format!("Customer not found: {}", id)))?;
    Ok(Json(ApiResponse::success(customer)))
}

/// Receipt payload for a manual single-invoice charge.
#[derive(Debug, Serialize)]
pub struct ChargeReceiptBody {
    pub invoice_id: InvoiceId,
    pub customer_id: CustomerId,
    pub amount: Money,
    pub attempts: u32,
}

impl From<ChargeReceipt> for ChargeReceiptBody {
    fn from(receipt: ChargeReceipt) -> Self {
        Self {
            invoice_id: receipt.invoice_id,
            customer_id: receipt.customer_id,
            amount: receipt.amount,
            attempts: receipt.attempts,
        }
    }
}

async fn charge_invoice(
    State(ctx): State<AppContext>,
    Path(id): Path<u64>,
) -> Result<Json<ApiResponse<ChargeReceiptBody>>> {
    let invoice = ctx
        .invoices
        .fetch_invoice(InvoiceId(id))
        .await?
        .ok_or_else(|| TollgateError::not_found(format!("Invoice not found: {}", id)))?;

    let receipt = ctx.billing.charge_invoice(&invoice).await?;
    Ok(Json(ApiResponse::success(receipt.into())))
}

/// One per-invoice outcome in a billing run payload.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeBody {
    Charged {
        invoice_id: InvoiceId,
        customer_id: CustomerId,
        amount: Money,
        attempts: u32,
    },
    Failed {
        invoice_id: InvoiceId,
        customer_id: CustomerId,
        kind: &'static str,
        message: String,
    },
}

/// Billing run payload.
#[derive(Debug, Serialize)]
pub struct BillingRunBody {
    pub total: usize,
    pub charged: usize,
    pub failed: usize,
    pub outcomes: Vec<OutcomeBody>,
}

impl From<BillingRunSummary> for BillingRunBody {
    fn from(summary: BillingRunSummary) -> Self {
        let outcomes = summary
            .outcomes()
            .iter()
            .map(|outcome| match outcome {
                ChargeOutcome::Charged(receipt) => OutcomeBody::Charged {
                    invoice_id: receipt.invoice_id,
                    customer_id: receipt.customer_id,
                    amount: receipt.amount,
                    attempts: receipt.attempts,
                },
                ChargeOutcome::Failed(failure) => OutcomeBody::Failed {
                    invoice_id: failure.invoice_id,
                    customer_id: failure.customer_id,
                    kind: failure.error.kind(),
                    message: failure.error.to_string(),
                },
            })
            .collect();

        Self {
            total: summary.len(),
            charged: summary.charged(),
            failed: summary.failed(),
            outcomes,
        }
    }
}

async fn run_billing(
    State(ctx): State<AppContext>,
) -> Result<Json<ApiResponse<BillingRunBody>>> {
    let pending = ctx.invoices.fetch_pending_invoices().await?;
    let summary = ctx.billing.charge_invoices(pending).await;
    Ok(Json(ApiResponse::success(summary.into())))
}
