//! Periodic refresh scheduler for the Teebox occupancy board.
//!
//! The board recomputes displayed elapsed time and accrued fees on a
//! fixed period (1 second in the reference behavior). This crate owns
//! that timer as an explicit, cancellable object instead of a
//! free-running process-wide interval: the scheduler lives inside the
//! board actor's `tokio::select!` loop and dies with it.
//!
//! # Disabled mode
//!
//! When `period` is zero, [`RefreshScheduler::wait_for_refresh`] pends
//! forever. This is the correct behavior for boards driven purely by
//! commands (tests, batch tooling) — `select!` still services the
//! other branches.
//!
//! # Integration
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         info = scheduler.wait_for_refresh() => {
//!             board.publish_snapshot(Utc::now());
//!         }
//!     }
//! }
//! ```

use std::time::Duration;

use rand::Rng;
use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the refresh scheduler.
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Refresh period. `Duration::ZERO` disables the loop entirely.
    pub period: Duration,
    /// Random jitter (0–max µs) added to the *first* refresh so boards
    /// spawned at the same instant don't all wake together.
    pub initial_jitter_us: u64,
}

impl RefreshConfig {
    /// Shortest supported period. Refreshing faster than this buys
    /// nothing for a wall-clock display and burns CPU.
    pub const MIN_PERIOD: Duration = Duration::from_millis(100);

    /// The reference behavior: refresh once per second.
    pub fn one_second() -> Self {
        Self {
            period: Duration::from_secs(1),
            ..Self::default()
        }
    }

    /// No periodic refresh; `wait_for_refresh` pends forever.
    pub fn disabled() -> Self {
        Self {
            period: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Clamps out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`RefreshScheduler::new`]. A non-zero
    /// period shorter than [`Self::MIN_PERIOD`] is raised to the
    /// minimum (zero stays zero — that means disabled).
    pub fn validated(mut self) -> Self {
        if !self.period.is_zero() && self.period < Self::MIN_PERIOD {
            warn!(
                period_ms = self.period.as_millis() as u64,
                min_ms = Self::MIN_PERIOD.as_millis() as u64,
                "refresh period below minimum, clamping"
            );
            self.period = Self::MIN_PERIOD;
        }
        self
    }

    /// The effective period, or `None` when disabled.
    pub fn effective_period(&self) -> Option<Duration> {
        if self.period.is_zero() {
            None
        } else {
            Some(self.period)
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(1),
            initial_jitter_us: 2_000,
        }
    }
}

// ---------------------------------------------------------------------------
// RefreshInfo
// ---------------------------------------------------------------------------

/// Information about a fired refresh, returned by
/// [`RefreshScheduler::wait_for_refresh`].
#[derive(Debug, Clone)]
pub struct RefreshInfo {
    /// Monotonically increasing refresh number (starts at 1).
    pub tick: u64,
    /// `true` if this refresh fired noticeably late.
    pub late: bool,
    /// How many whole periods were skipped because of lateness
    /// (0 in normal operation).
    pub periods_skipped: u64,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Fixed-period refresh scheduler. One per occupancy board.
///
/// When a refresh fires late (the task was starved), the next deadline
/// is rescheduled from *now* rather than the missed deadline — a
/// display refresh has no catch-up semantics, the skipped periods are
/// simply dropped.
pub struct RefreshScheduler {
    config: RefreshConfig,
    period: Option<Duration>,
    tick_count: u64,
    overrun_count: u64,
    next_refresh: Option<TokioInstant>,
    paused: bool,
}

impl RefreshScheduler {
    /// Creates a scheduler from config, scheduling the first refresh
    /// with optional jitter.
    pub fn new(config: RefreshConfig) -> Self {
        let config = config.validated();
        let period = config.effective_period();

        let next_refresh = period.map(|p| {
            let jitter = if config.initial_jitter_us > 0 {
                let us = rand::rng().random_range(0..config.initial_jitter_us);
                Duration::from_micros(us)
            } else {
                Duration::ZERO
            };
            TokioInstant::now() + p + jitter
        });

        if period.is_none() {
            debug!("refresh scheduler created in disabled mode");
        } else {
            debug!(period_ms = config.period.as_millis() as u64, "refresh scheduler created");
        }

        Self {
            config,
            period,
            tick_count: 0,
            overrun_count: 0,
            next_refresh,
            paused: false,
        }
    }

    /// A scheduler with the reference 1-second period.
    pub fn one_second() -> Self {
        Self::new(RefreshConfig::one_second())
    }

    /// Waits until the next refresh is due.
    ///
    /// In disabled mode or while paused, this future pends forever —
    /// it will never resolve on its own, but `tokio::select!` will
    /// still process other branches.
    pub async fn wait_for_refresh(&mut self) -> RefreshInfo {
        let (next, period) = match (self.next_refresh, self.period) {
            (Some(next), Some(period)) if !self.paused => (next, period),
            _ => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        };

        time::sleep_until(next).await;

        let now = TokioInstant::now();
        self.tick_count += 1;

        let late_by = now.saturating_duration_since(next);
        let late = late_by > period / 10;
        let mut periods_skipped = 0u64;
        if late {
            self.overrun_count += 1;
            periods_skipped = late_by.as_nanos() as u64 / period.as_nanos() as u64;
            if periods_skipped > 0 {
                warn!(
                    tick = self.tick_count,
                    skipped = periods_skipped,
                    late_ms = late_by.as_secs_f64() * 1000.0,
                    "refresh fired late, skipping ahead"
                );
            }
        }

        // Always reschedule from now, not from the missed deadline.
        self.next_refresh = Some(now + period);

        trace!(tick = self.tick_count, late, "refresh fired");

        RefreshInfo {
            tick: self.tick_count,
            late,
            periods_skipped,
        }
    }

    /// Pauses the refresh loop. `wait_for_refresh` pends until
    /// [`resume`](Self::resume). Idempotent.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(tick = self.tick_count, "refresh scheduler paused");
        }
    }

    /// Resumes after a pause, rescheduling from now so the time spent
    /// paused doesn't produce a burst of refreshes.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            if let Some(period) = self.period {
                self.next_refresh = Some(TokioInstant::now() + period);
            }
            debug!(tick = self.tick_count, "refresh scheduler resumed");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether this scheduler never fires (period zero).
    pub fn is_disabled(&self) -> bool {
        self.period.is_none()
    }

    /// Refreshes fired so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Refreshes that fired noticeably late.
    pub fn overrun_count(&self) -> u64 {
        self.overrun_count
    }

    /// The effective refresh period, or `None` when disabled.
    pub fn period(&self) -> Option<Duration> {
        self.period
    }

    pub fn config(&self) -> &RefreshConfig {
        &self.config
    }
}
