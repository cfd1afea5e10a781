//! Service entry point.
//!
//! Wires the in-memory store, a randomized demo payment provider, the
//! billing service, the monthly scheduler, and the REST surface together.

use std::sync::Arc;
use std::time::Duration;

use tokio::signal;

use tollgate::billing::{BillingService, RandomPaymentProvider};
use tollgate::store::{InMemoryStore, InvoiceStore};
use tollgate::{AppContext, Config, bootstrap, rest, schedule_every};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tollgate::init_tracing();

    let config = Config::from_env();
    let addr = config.server.addr()?;

    // In-memory store seeded with demo customers and invoices, as a real
    // deployment would swap in its database-backed stores here.
    let store = InMemoryStore::new();
    bootstrap::seed_demo_data(&store).await?;

    // Demo provider: half the charges settle, and an occasional simulated
    // outage exercises the retry path.
    let provider = Arc::new(RandomPaymentProvider::default().with_network_failures(0.1));

    let billing = Arc::new(BillingService::new(
        Arc::new(store.clone()),
        provider,
        config.billing.clone(),
    ));

    let scheduler_task = if config.scheduler.enabled {
        let billing = Arc::clone(&billing);
        let job_store = store.clone();
        Some(schedule_every(config.scheduler.period, move || {
            let billing = Arc::clone(&billing);
            let store = job_store.clone();
            async move {
                run_billing_cycle(&billing, &store).await;
            }
        }))
    } else {
        tracing::info!("Scheduler disabled, billing runs only on manual triggers");
        None
    };

    let ctx = AppContext::new(
        config,
        Arc::new(store.clone()),
        Arc::new(store),
        billing,
    );
    let router = rest::router().with_state(ctx);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("Health check available at http://{}/health", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(task) = scheduler_task {
        task.shutdown().await;
    }
    Ok(())
}

/// One scheduled billing cycle: charge the pending batch, then generate
/// invoices for the next period regardless of individual charge outcomes.
async fn run_billing_cycle(billing: &BillingService, store: &InMemoryStore) {
    match store.fetch_pending_invoices().await {
        Ok(pending) => {
            let summary = billing.charge_invoices(pending).await;
            tracing::info!(
                charged = summary.charged(),
                failed = summary.failed(),
                "Scheduled billing run finished"
            );
        }
        Err(err) => {
            tracing::error!(error = %err, "Failed to fetch pending invoices, skipping run");
        }
    }

    if let Err(err) = bootstrap::generate_next_period_invoices(store).await {
        tracing::error!(error = %err, "Failed to generate next period invoices");
    }
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, starting graceful shutdown");
        },
    }

    // Give connections a grace period to close
    tokio::time::sleep(Duration::from_secs(1)).await;
}
