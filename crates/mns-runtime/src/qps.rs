//! Client-side admission control.
//!
//! The service throttles each queue and topic independently. A [`QpsMonitor`]
//! keeps a ring of per-second call counters over a trailing window of `W`
//! seconds and admits a call only while the window total is below
//! `ceiling × W`. A call that would exceed it waits for the next second
//! boundary and tries again.
//!
//! # Examples
//!
//! ```
//! use mns_runtime::QpsMonitor;
//!
//! # tokio_test::block_on(async {
//! let monitor = QpsMonitor::new(5, 2000);
//! monitor.admit().await;
//! assert!(monitor.current_rate() > 0.0);
//! # });
//! ```

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time::Instant;
use tracing::debug;

#[cfg(test)]
#[path = "qps_tests.rs"]
mod tests;

/// Per-second counters over the trailing window
#[derive(Debug)]
struct RateWindow {
    buckets: Vec<u64>,
    /// Second (relative to the monitor's start) the ring was last advanced to
    current_second: u64,
}

impl RateWindow {
    fn new(window_seconds: usize) -> Self {
        Self {
            buckets: vec![0; window_seconds],
            current_second: 0,
        }
    }

    /// Zero the buckets of every second that elapsed since the last call
    fn advance(&mut self, second: u64) {
        if second <= self.current_second {
            return;
        }
        let width = self.buckets.len() as u64;
        let elapsed = second - self.current_second;
        if elapsed >= width {
            self.buckets.iter_mut().for_each(|b| *b = 0);
        } else {
            for s in (self.current_second + 1)..=second {
                self.buckets[(s % width) as usize] = 0;
            }
        }
        self.current_second = second;
    }

    fn total(&self) -> u64 {
        self.buckets.iter().sum()
    }

    fn record(&mut self, second: u64) {
        let width = self.buckets.len() as u64;
        self.buckets[(second % width) as usize] += 1;
    }
}

/// Sliding-window QPS limiter owned by one queue or topic handle
#[derive(Debug)]
pub struct QpsMonitor {
    window_seconds: u64,
    ceiling: u32,
    /// Start of the wall-clock second the monitor was created in
    epoch: Instant,
    window: Mutex<RateWindow>,
}

impl QpsMonitor {
    /// Create a monitor; zero window or ceiling is raised to one
    pub fn new(window_seconds: u64, ceiling: u32) -> Self {
        let into_second = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| Duration::from_nanos(u64::from(d.subsec_nanos())))
            .unwrap_or_default();
        Self::with_phase(window_seconds, ceiling, into_second)
    }

    /// Create a monitor that starts `into_second` past a second boundary
    fn with_phase(window_seconds: u64, ceiling: u32, into_second: Duration) -> Self {
        let window_seconds = window_seconds.max(1);
        let now = Instant::now();
        Self {
            window_seconds,
            ceiling: ceiling.max(1),
            epoch: now.checked_sub(into_second).unwrap_or(now),
            window: Mutex::new(RateWindow::new(window_seconds as usize)),
        }
    }

    pub fn ceiling(&self) -> u32 {
        self.ceiling
    }

    pub fn window_seconds(&self) -> u64 {
        self.window_seconds
    }

    fn lock(&self) -> MutexGuard<'_, RateWindow> {
        // Counters stay usable even if a holder panicked
        self.window.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Whole wall-clock seconds elapsed since the monitor's epoch
    fn second_of(&self, now: Instant) -> u64 {
        now.duration_since(self.epoch).as_secs()
    }

    /// Wait until the window has room, then record the call
    pub async fn admit(&self) {
        loop {
            let retry_at = {
                let now = Instant::now();
                let second = self.second_of(now);
                let mut window = self.lock();
                window.advance(second);

                if window.total() < u64::from(self.ceiling) * self.window_seconds {
                    window.record(second);
                    return;
                }
                self.epoch + Duration::from_secs(second + 1)
            };

            debug!(
                ceiling = self.ceiling,
                window_seconds = self.window_seconds,
                "QPS ceiling reached, waiting for next second"
            );
            tokio::time::sleep_until(retry_at).await;
        }
    }

    /// Average calls per second over the trailing window
    pub fn current_rate(&self) -> f64 {
        let second = self.second_of(Instant::now());
        let mut window = self.lock();
        window.advance(second);
        window.total() as f64 / self.window_seconds as f64
    }
}
