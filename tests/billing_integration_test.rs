//! End-to-end billing behavior against scripted payment providers.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use tollgate::billing::{BillingService, NoOpAuditLogger};
use tollgate::store::{CustomerStore, InMemoryStore, InvoiceStore};
use tollgate::{
    BillingConfig, ChargeError, Currency, Invoice, InvoiceId, InvoiceStatus, Money,
    PaymentProvider, ProviderError,
};

/// Provider behavior assigned to one invoice.
#[derive(Debug, Clone, Copy)]
enum Behavior {
    Succeed,
    Decline,
    UnknownCustomer,
    WrongCurrency,
    NetworkFailAlways,
    /// Network errors for the given number of calls, then success.
    NetworkFailTimes(u32),
}

/// Deterministic provider: each invoice id gets its own scripted behavior.
struct ScriptedProvider {
    behaviors: HashMap<InvoiceId, Behavior>,
    calls: Mutex<HashMap<InvoiceId, u32>>,
    call_times: Mutex<Vec<Instant>>,
}

impl ScriptedProvider {
    fn new(behaviors: impl IntoIterator<Item = (InvoiceId, Behavior)>) -> Self {
        Self {
            behaviors: behaviors.into_iter().collect(),
            calls: Mutex::new(HashMap::new()),
            call_times: Mutex::new(Vec::new()),
        }
    }

    async fn calls_for(&self, id: InvoiceId) -> u32 {
        self.calls.lock().await.get(&id).copied().unwrap_or(0)
    }

    async fn call_times(&self) -> Vec<Instant> {
        self.call_times.lock().await.clone()
    }
}

#[async_trait]
impl PaymentProvider for ScriptedProvider {
    async fn charge(&self, invoice: &Invoice) -> Result<bool, ProviderError> {
        let call = {
            let mut calls = self.calls.lock().await;
            let entry = calls.entry(invoice.id).or_insert(0);
            *entry += 1;
            *entry
        };
        self.call_times.lock().await.push(Instant::now());

        match self.behaviors.get(&invoice.id) {
            Some(Behavior::Succeed) => Ok(true),
            Some(Behavior::Decline) => Ok(false),
            Some(Behavior::UnknownCustomer) => Err(ProviderError::CustomerNotFound),
            Some(Behavior::WrongCurrency) => Err(ProviderError::CurrencyMismatch),
            Some(Behavior::NetworkFailAlways) => {
                Err(ProviderError::Network("unreachable".to_string()))
            }
            Some(Behavior::NetworkFailTimes(n)) if call <= *n => {
                Err(ProviderError::Network("unreachable".to_string()))
            }
            Some(Behavior::NetworkFailTimes(_)) => Ok(true),
            None => Err(ProviderError::CustomerNotFound),
        }
    }
}

const BASE_DELAY_MS: u64 = 100;

fn config(max_attempts: u32) -> BillingConfig {
    BillingConfig {
        max_attempts,
        base_delay_ms: BASE_DELAY_MS,
        batch_concurrency: 8,
    }
}

fn service(store: &InMemoryStore, provider: Arc<ScriptedProvider>, max_attempts: u32) -> BillingService {
    BillingService::new(Arc::new(store.clone()), provider, config(max_attempts))
        .with_audit_logger(Arc::new(NoOpAuditLogger))
}

async fn pending_invoice(store: &InMemoryStore, currency: Currency) -> Invoice {
    let customer = store.create_customer(currency).await.unwrap();
    store
        .create_invoice(customer.id, Money::new(3200, currency), InvoiceStatus::Pending)
        .await
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_network_retries_call_provider_exactly_max_attempts_times() {
    let store = InMemoryStore::new();
    let invoice = pending_invoice(&store, Currency::Eur).await;

    let provider = Arc::new(ScriptedProvider::new([(invoice.id, Behavior::NetworkFailAlways)]));
    let billing = service(&store, Arc::clone(&provider), 5);

    let err = billing.charge_invoice(&invoice).await.unwrap_err();

    assert!(matches!(err, ChargeError::Network { attempts: 5, .. }));
    assert_eq!(provider.calls_for(invoice.id).await, 5);
    assert!(!store.fetch_invoice(invoice.id).await.unwrap().unwrap().is_paid());
}

#[tokio::test(start_paused = true)]
async fn test_backoff_delay_doubles_before_each_attempt() {
    let store = InMemoryStore::new();
    let invoice = pending_invoice(&store, Currency::Eur).await;

    let provider = Arc::new(ScriptedProvider::new([(invoice.id, Behavior::NetworkFailAlways)]));
    let billing = service(&store, Arc::clone(&provider), 4);

    let started = Instant::now();
    let _ = billing.charge_invoice(&invoice).await;

    let times = provider.call_times().await;
    assert_eq!(times.len(), 4);

    // Attempt k happens after base * (2^k - 1) total sleep.
    let base = Duration::from_millis(BASE_DELAY_MS);
    assert_eq!(times[0] - started, base);
    assert_eq!(times[1] - times[0], base * 2);
    assert_eq!(times[2] - times[1], base * 4);
    assert_eq!(times[3] - times[2], base * 8);
}

#[tokio::test(start_paused = true)]
async fn test_recovers_when_network_heals_before_exhaustion() {
    let store = InMemoryStore::new();
    let invoice = pending_invoice(&store, Currency::Usd).await;

    let provider = Arc::new(ScriptedProvider::new([(
        invoice.id,
        Behavior::NetworkFailTimes(4),
    )]));
    let billing = service(&store, Arc::clone(&provider), 5);

    let receipt = billing.charge_invoice(&invoice).await.unwrap();

    assert_eq!(receipt.attempts, 5);
    assert_eq!(provider.calls_for(invoice.id).await, 5);
    assert!(store.fetch_invoice(invoice.id).await.unwrap().unwrap().is_paid());
}

#[tokio::test(start_paused = true)]
async fn test_double_charge_never_reaches_the_provider() {
    let store = InMemoryStore::new();
    let invoice = pending_invoice(&store, Currency::Gbp).await;
    let paid = invoice.with_status(InvoiceStatus::Paid);
    store.update_invoice(&paid).await.unwrap();

    let provider = Arc::new(ScriptedProvider::new([(invoice.id, Behavior::Succeed)]));
    let billing = service(&store, Arc::clone(&provider), 5);

    let err = billing.charge_invoice(&paid).await.unwrap_err();

    assert!(matches!(err, ChargeError::DoubleCharge { .. }));
    assert_eq!(provider.calls_for(invoice.id).await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_batch_reports_one_outcome_per_invoice_with_isolation() {
    let store = InMemoryStore::new();
    let ok = pending_invoice(&store, Currency::Eur).await;
    let declined = pending_invoice(&store, Currency::Eur).await;
    let unknown = pending_invoice(&store, Currency::Usd).await;
    let mismatched = pending_invoice(&store, Currency::Dkk).await;
    let unreachable = pending_invoice(&store, Currency::Sek).await;

    let provider = Arc::new(ScriptedProvider::new([
        (ok.id, Behavior::Succeed),
        (declined.id, Behavior::Decline),
        (unknown.id, Behavior::UnknownCustomer),
        (mismatched.id, Behavior::WrongCurrency),
        (unreachable.id, Behavior::NetworkFailAlways),
    ]));
    let billing = service(&store, Arc::clone(&provider), 3);

    let batch = vec![
        ok.clone(),
        declined.clone(),
        unknown.clone(),
        mismatched.clone(),
        unreachable.clone(),
    ];
    let summary = billing.charge_invoices(batch).await;

    assert_eq!(summary.len(), 5);
    assert_eq!(summary.charged(), 1);
    assert_eq!(summary.failed(), 4);

    let kind_of = |id: InvoiceId| {
        summary.outcomes().iter().find_map(|outcome| match outcome {
            tollgate::ChargeOutcome::Failed(failure) if failure.invoice_id == id => {
                Some(failure.error.kind())
            }
            _ => None,
        })
    };
    assert_eq!(kind_of(declined.id), Some("insufficient_funds"));
    assert_eq!(kind_of(unknown.id), Some("customer_not_found"));
    assert_eq!(kind_of(mismatched.id), Some("currency_mismatch"));
    assert_eq!(kind_of(unreachable.id), Some("network_error"));

    // Terminal kinds are single-shot, the network case burned its retries.
    assert_eq!(provider.calls_for(declined.id).await, 1);
    assert_eq!(provider.calls_for(unknown.id).await, 1);
    assert_eq!(provider.calls_for(mismatched.id).await, 1);
    assert_eq!(provider.calls_for(unreachable.id).await, 3);

    // The one success is the only persistence mutation.
    assert!(store.fetch_invoice(ok.id).await.unwrap().unwrap().is_paid());
    for failed in [declined.id, unknown.id, mismatched.id, unreachable.id] {
        assert!(!store.fetch_invoice(failed).await.unwrap().unwrap().is_paid());
    }
}

#[tokio::test(start_paused = true)]
async fn test_batch_larger_than_concurrency_bound_completes() {
    let store = InMemoryStore::new();
    let mut invoices = Vec::new();
    let mut behaviors = Vec::new();
    for _ in 0..20 {
        let invoice = pending_invoice(&store, Currency::Eur).await;
        behaviors.push((invoice.id, Behavior::Succeed));
        invoices.push(invoice);
    }

    let provider = Arc::new(ScriptedProvider::new(behaviors));
    let billing = BillingService::new(
        Arc::new(store.clone()),
        Arc::clone(&provider) as Arc<dyn PaymentProvider>,
        BillingConfig {
            max_attempts: 5,
            base_delay_ms: BASE_DELAY_MS,
            batch_concurrency: 4,
        },
    )
    .with_audit_logger(Arc::new(NoOpAuditLogger));

    let summary = billing.charge_invoices(invoices).await;

    assert_eq!(summary.len(), 20);
    assert_eq!(summary.charged(), 20);
    assert_eq!(store.fetch_pending_invoices().await.unwrap().len(), 0);
}

/// Counts concurrent callers to prove the batch bound is respected.
struct GaugedProvider {
    current: AtomicU32,
    peak: AtomicU32,
}

#[async_trait]
impl PaymentProvider for GaugedProvider {
    async fn charge(&self, _invoice: &Invoice) -> Result<bool, ProviderError> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.current.fetch_sub(1, Ordering::SeqCst);
        Ok(true)
    }
}

#[tokio::test(start_paused = true)]
async fn test_batch_concurrency_is_bounded() {
    let store = InMemoryStore::new();
    let mut invoices = Vec::new();
    for _ in 0..12 {
        invoices.push(pending_invoice(&store, Currency::Gbp).await);
    }

    let provider = Arc::new(GaugedProvider {
        current: AtomicU32::new(0),
        peak: AtomicU32::new(0),
    });
    let billing = BillingService::new(
        Arc::new(store.clone()),
        Arc::clone(&provider) as Arc<dyn PaymentProvider>,
        BillingConfig {
            max_attempts: 5,
            base_delay_ms: BASE_DELAY_MS,
            batch_concurrency: 3,
        },
    )
    .with_audit_logger(Arc::new(NoOpAuditLogger));

    let summary = billing.charge_invoices(invoices).await;

    assert_eq!(summary.charged(), 12);
    assert!(provider.peak.load(Ordering::SeqCst) <= 3);
}
