//! Expiry sweeper
//!
//! The lifecycle service expires overdue requests lazily when a caller
//! touches them; the sweeper catches the rest. One conditional UPDATE per
//! tick, idempotent, safe to run alongside the lazy path and alongside other
//! sweeper instances.

use chrono::Utc;
use numio_core::{traits::RequestRepository, AppResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Periodic force-expiry of overdue requests
pub struct ExpirySweeper<R: RequestRepository> {
    request_repo: Arc<R>,
    interval: Duration,
}

impl<R: RequestRepository + 'static> ExpirySweeper<R> {
    /// Create a new sweeper
    pub fn new(request_repo: Arc<R>, interval_secs: u64) -> Self {
        Self {
            request_repo,
            interval: Duration::from_secs(interval_secs),
        }
    }

    /// Run one sweep; returns the number of requests expired
    #[instrument(skip(self))]
    pub async fn run_once(&self) -> AppResult<u64> {
        let swept = self.request_repo.sweep_expired(Utc::now()).await?;
        if swept > 0 {
            info!("Sweep expired {} requests", swept);
        } else {
            debug!("Sweep found nothing to expire");
        }
        Ok(swept)
    }

    /// Spawn the sweep loop as a background task
    ///
    /// A failed sweep is logged and retried on the next tick.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        info!(
            "Starting expiry sweeper with {}s interval",
            self.interval.as_secs()
        );

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            // The immediate first tick handles requests left over from
            // before a restart.
            loop {
                ticker.tick().await;
                if let Err(e) = self.run_once().await {
                    warn!("Expiry sweep failed: {}", e);
                }
            }
        })
    }
}
