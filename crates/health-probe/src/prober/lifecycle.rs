//! Background probe cadence.

use super::Prober;
use crate::config::StopPolicy;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// Handle to a running probe loop.
///
/// Dropping the handle stops the loop as if [`stop`](Self::stop) was called.
pub struct ProbeLoop {
    stop_tx: watch::Sender<bool>,
    done_rx: watch::Receiver<bool>,
}

impl ProbeLoop {
    pub(super) fn start(prober: Arc<Prober>) -> Self {
        let (stop_tx, stop_rx) = watch::channel(false);
        let (done_tx, done_rx) = watch::channel(false);
        tokio::spawn(drive(prober, stop_rx, done_tx));
        Self { stop_tx, done_rx }
    }

    /// Ask the loop to end. Probes already sent are not cancelled.
    pub fn stop(&self) {
        self.stop_tx.send_replace(true);
    }

    /// Resolves once the loop has fully torn down.
    pub async fn stopped(&self) {
        let mut done = self.done_rx.clone();
        // An error means the task is gone, which is as stopped as it gets.
        let _ = done.wait_for(|finished| *finished).await;
    }

    pub fn is_stopped(&self) -> bool {
        *self.done_rx.borrow()
    }
}

async fn drive(prober: Arc<Prober>, mut stop_rx: watch::Receiver<bool>, done_tx: watch::Sender<bool>) {
    let policy = prober.config().stop_policy;
    let mut ticker = tokio::time::interval(prober.config().interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(interval = ?prober.config().interval, ?policy, "Probe loop started");

    loop {
        if *stop_rx.borrow_and_update() {
            break;
        }

        tokio::select! {
            biased;
            _ = stop_rx.changed() => break,
            _ = ticker.tick() => {}
        }

        match policy {
            StopPolicy::Drain => {
                if let Err(e) = prober.run_once().await {
                    warn!(error = %e, "Probe round failed");
                }
            }
            StopPolicy::Discard => {
                tokio::select! {
                    biased;
                    _ = stop_rx.changed() => {
                        info!("Discarding in-flight probe round");
                        break;
                    }
                    result = prober.run_once() => {
                        if let Err(e) = result {
                            warn!(error = %e, "Probe round failed");
                        }
                    }
                }
            }
        }
    }

    if policy == StopPolicy::Drain {
        prober.flush().await;
    }
    info!("Probe loop stopped");
    done_tx.send_replace(true);
}
