//! Scheduler firing behavior under a paused clock.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use chrono::Utc;

use tollgate::{Period, schedule_every};

const MARGIN: Duration = Duration::from_secs(60);

/// Give the scheduler task a chance to observe the advanced clock.
async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

fn counting_job(counter: Arc<AtomicU32>) -> impl Fn() -> std::pin::Pin<Box<dyn Future<Output = ()> + Send>> {
    move || {
        let counter = Arc::clone(&counter);
        Box::pin(async move {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }
}

#[tokio::test(start_paused = true)]
async fn test_fires_once_at_the_boundary_and_not_before() {
    let counter = Arc::new(AtomicU32::new(0));
    let task = schedule_every(Period::Monthly, counting_job(Arc::clone(&counter)));

    // Let the scheduler task start its wait before touching the clock.
    tokio::task::yield_now().await;
    let wait = Period::Monthly.until_next_boundary(Utc::now()).unwrap();

    // Just short of the boundary: nothing may fire yet.
    tokio::time::advance(wait.saturating_sub(MARGIN)).await;
    settle().await;
    assert_eq!(counter.load(Ordering::SeqCst), 0);

    // Cross the boundary: exactly one invocation.
    tokio::time::advance(MARGIN * 2).await;
    settle().await;
    assert_eq!(counter.load(Ordering::SeqCst), 1);

    task.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_consecutive_runs_are_separated_by_a_full_wait() {
    let counter = Arc::new(AtomicU32::new(0));
    let task = schedule_every(Period::Monthly, counting_job(Arc::clone(&counter)));

    tokio::task::yield_now().await;
    let wait = Period::Monthly.until_next_boundary(Utc::now()).unwrap();

    tokio::time::advance(wait + MARGIN).await;
    settle().await;
    assert_eq!(counter.load(Ordering::SeqCst), 1);

    // Well inside the next interval: no second run yet.
    tokio::time::advance(Duration::from_secs(3600)).await;
    settle().await;
    assert_eq!(counter.load(Ordering::SeqCst), 1);

    // A full recomputed wait later the second run has happened.
    tokio::time::advance(wait + MARGIN).await;
    settle().await;
    assert_eq!(counter.load(Ordering::SeqCst), 2);

    task.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_the_loop_before_any_run() {
    let counter = Arc::new(AtomicU32::new(0));
    let task = schedule_every(Period::Monthly, counting_job(Arc::clone(&counter)));

    tokio::task::yield_now().await;
    task.shutdown().await;

    let wait = Period::Monthly.until_next_boundary(Utc::now()).unwrap();
    tokio::time::advance(wait + MARGIN).await;
    settle().await;
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}
