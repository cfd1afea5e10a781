//! Periodic billing trigger.
//!
//! One long-lived background task waits for each calendar boundary and
//! invokes the supplied job. Runs are strictly sequential: the wait for
//! the next boundary is not computed until the job returns, so a slow run
//! can never overlap the next one. The host holds a [`ScheduledTask`]
//! handle and signals shutdown through it; invoice-level failures inside
//! the job never stop the loop.

use std::time::Duration;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Calendar period between billing runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// Fire at the first instant of each calendar month (UTC).
    Monthly,
}

impl Default for Period {
    fn default() -> Self {
        Self::Monthly
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Monthly => write!(f, "monthly"),
        }
    }
}

impl Period {
    /// The next boundary strictly after `now`, with time-of-day zeroed.
    ///
    /// Pure calendar arithmetic; `None` only if the computed date is not
    /// representable, which the run loop treats as fatal.
    #[must_use]
    pub fn next_boundary(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Monthly => {
                let (year, month) = if now.month() == 12 {
                    (now.year() + 1, 1)
                } else {
                    (now.year(), now.month() + 1)
                };
                Some(
                    NaiveDate::from_ymd_opt(year, month, 1)?
                        .and_hms_opt(0, 0, 0)?
                        .and_utc(),
                )
            }
        }
    }

    /// How long to sleep from `now` until the next boundary.
    #[must_use]
    pub fn until_next_boundary(&self, now: DateTime<Utc>) -> Option<Duration> {
        let boundary = self.next_boundary(now)?;
        Some((boundary - now).to_std().unwrap_or(Duration::ZERO))
    }
}

/// Handle to a running periodic schedule.
///
/// Dropping the handle leaves the background task running for the life of
/// the process; call [`shutdown`](ScheduledTask::shutdown) to stop it
/// cleanly. In-flight work is not interrupted mid-charge — uncharged
/// invoices stay pending and are picked up by a future run.
pub struct ScheduledTask {
    shutdown_tx: mpsc::Sender<()>,
    handle: tokio::task::JoinHandle<()>,
}

impl ScheduledTask {
    /// Signal the schedule to stop and wait for the task to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        let _ = self.handle.await;
    }
}

/// Run `job` at every boundary of `period` until shutdown.
///
/// The job is a zero-argument async callback; for a billing deployment it
/// charges the pending batch and then generates next-period invoices.
pub fn schedule_every<F, Fut>(period: Period, job: F) -> ScheduledTask
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);

    let handle = tokio::spawn(async move {
        tracing::info!(%period, "Billing scheduler started");

        loop {
            let now = Utc::now();
            let Some(wait) = period.until_next_boundary(now) else {
                tracing::error!(%period, "Failed to compute next boundary, stopping scheduler");
                break;
            };
            tracing::debug!(wait_secs = wait.as_secs(), "Waiting for next period boundary");

            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!("Shutdown signal received, stopping scheduler");
                    break;
                }
                _ = tokio::time::sleep(wait) => {}
            }

            job().await;
        }

        tracing::info!("Billing scheduler stopped");
    });

    ScheduledTask {
        shutdown_tx,
        handle,
    }
}
