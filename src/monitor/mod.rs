pub mod listings;
pub mod oversold;

use crate::api::retry::CircuitBreaker;
use crate::error::Result;
use async_trait::async_trait;
use log::{debug, error, info};
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};

pub use listings::ListingMonitor;
pub use oversold::OversoldMonitor;

#[async_trait]
pub trait Monitor: Send {
    fn name(&self) -> &'static str;

    /// One poll cycle. Returns the number of pairs alerted.
    async fn tick(&mut self) -> Result<usize>;
}

/// Poll until the future is dropped. Failed cycles feed the breaker, which
/// skips cycles while open instead of hammering the API.
pub async fn run<T: Monitor + ?Sized>(monitor: &mut T, every: Duration, breaker: &mut CircuitBreaker) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!("{} monitor polling every {:?}", monitor.name(), every);

    loop {
        ticker.tick().await;
        if !breaker.allow(Instant::now()) {
            debug!("{} cycle skipped, circuit open", monitor.name());
            continue;
        }
        match monitor.tick().await {
            Ok(alerted) => {
                if alerted > 0 {
                    info!("{} cycle alerted on {} pairs", monitor.name(), alerted);
                }
                breaker.record_success();
            }
            Err(e) => {
                error!("{} cycle failed: {}", monitor.name(), e);
                breaker.record_failure(Instant::now(), &e);
            }
        }
    }
}

/// Resolves on Ctrl-C, or SIGTERM from the service manager.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
