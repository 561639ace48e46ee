//! Process-wide request throttle shared by every worker.
//!
//! A background task ticks once per period and offers a single permit. Ticks
//! that find the previous permit unconsumed are dropped, so an idle stretch
//! never builds up a burst. Because all workers draw from the same source, the
//! worker count controls how many requests are in flight while the rate
//! limit alone controls how fast new ones start.

use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub struct RateGate {
    period: Duration,
    permits: Mutex<mpsc::Receiver<()>>,
    ticker: JoinHandle<()>,
}

impl RateGate {
    /// Starts ticking immediately. Must be called inside a tokio runtime.
    pub fn new(requests_per_second: u32) -> Self {
        let period = Self::period_for(requests_per_second);
        let (tx, rx) = mpsc::channel(1);

        let ticker = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                match tx.try_send(()) {
                    Ok(()) | Err(TrySendError::Full(())) => {}
                    Err(TrySendError::Closed(())) => break,
                }
            }
        });

        log::debug!("Rate gate started: one request every {:?}", period);
        Self {
            period,
            permits: Mutex::new(rx),
            ticker,
        }
    }

    /// `1000 / rate` milliseconds, never less than one.
    pub fn period_for(requests_per_second: u32) -> Duration {
        let millis = 1000 / u64::from(requests_per_second.max(1));
        Duration::from_millis(millis.max(1))
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Waits for the next permit. Waiters are served in arrival order.
    /// Returns `false` once the gate has been stopped; no permit was granted.
    #[must_use]
    pub async fn acquire(&self) -> bool {
        let mut permits = self.permits.lock().await;
        permits.recv().await.is_some()
    }

    pub fn stop(&self) {
        self.ticker.abort();
    }
}

impl Drop for RateGate {
    fn drop(&mut self) {
        self.ticker.abort();
    }
}
