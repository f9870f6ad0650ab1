//! Pure fee and elapsed-time computations.
//!
//! Everything here is a read-time projection: nothing is stored
//! incrementally, so the displayed fee for an occupied room is always
//! recomputable from `game_start_time`, the current config, and `now`.

use chrono::{DateTime, Duration, Utc};
use std::fmt;
use teebox_model::{BillingConfig, Room};

use crate::BillingError;

/// Elapsed time since a session started, clamped to zero.
///
/// The clamp guards against clock skew: a `now` earlier than the start
/// must read as zero elapsed, never negative.
pub fn elapsed(start: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (now - start).max(Duration::zero())
}

/// The step-function fee accrued by an occupied room at `now`.
///
/// `floor(elapsed_secs / interval_secs) * rate_per_interval` — the fee
/// jumps by `rate_per_interval` exactly at each interval boundary and
/// is never interpolated between them. Rooms without an active session
/// accrue nothing.
pub fn accrued_fee(
    room: &Room,
    config: &BillingConfig,
    now: DateTime<Utc>,
) -> Result<u64, BillingError> {
    let Some(start) = room.game_start_time.filter(|_| room.status.is_occupied()) else {
        return Ok(0);
    };
    if config.time_interval == 0 {
        return Err(BillingError::ConfigurationMissing);
    }

    let elapsed_secs = elapsed(start, now).num_seconds() as u64;
    let interval_secs = u64::from(config.time_interval) * 60;
    let completed_intervals = elapsed_secs / interval_secs;
    Ok(completed_intervals * config.rate_per_interval)
}

// ---------------------------------------------------------------------------
// ElapsedClock
// ---------------------------------------------------------------------------

/// An elapsed duration broken into hours/minutes/seconds for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElapsedClock {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl ElapsedClock {
    /// Projects the elapsed time of a session for display. Clamped to
    /// zero like [`elapsed`].
    pub fn since(start: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let total_secs = elapsed(start, now).num_seconds() as u64;
        Self {
            hours: total_secs / 3_600,
            minutes: (total_secs % 3_600) / 60,
            seconds: total_secs % 60,
        }
    }

    pub const ZERO: Self = Self {
        hours: 0,
        minutes: 0,
        seconds: 0,
    };
}

impl fmt::Display for ElapsedClock {
    /// Leading units are dropped: "1h 2m 5s", "2m 5s", or "5s".
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hours > 0 {
            write!(f, "{}h {}m {}s", self.hours, self.minutes, self.seconds)
        } else if self.minutes > 0 {
            write!(f, "{}m {}s", self.minutes, self.seconds)
        } else {
            write!(f, "{}s", self.seconds)
        }
    }
}
