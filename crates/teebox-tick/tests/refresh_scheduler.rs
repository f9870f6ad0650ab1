//! Integration tests for the refresh scheduler.
//!
//! Uses `tokio::time::pause()` (via `start_paused`) so `sleep_until`
//! resolves deterministically without real waiting.

use std::time::Duration;

use teebox_tick::{RefreshConfig, RefreshScheduler};

fn no_jitter(period_ms: u64) -> RefreshConfig {
    RefreshConfig {
        period: Duration::from_millis(period_ms),
        initial_jitter_us: 0,
    }
}

// =========================================================================
// RefreshConfig
// =========================================================================

#[test]
fn test_default_config_is_one_second() {
    let cfg = RefreshConfig::default();
    assert_eq!(cfg.period, Duration::from_secs(1));
    assert_eq!(cfg.effective_period(), Some(Duration::from_secs(1)));
}

#[test]
fn test_disabled_config_has_no_period() {
    let cfg = RefreshConfig::disabled();
    assert_eq!(cfg.effective_period(), None);
}

#[test]
fn test_validated_clamps_tiny_periods() {
    let cfg = no_jitter(10).validated();
    assert_eq!(cfg.period, RefreshConfig::MIN_PERIOD);

    // Zero means disabled and is left alone.
    let cfg = no_jitter(0).validated();
    assert!(cfg.period.is_zero());
}

// =========================================================================
// Scheduler creation and accessors
// =========================================================================

#[test]
fn test_scheduler_initial_state() {
    let s = RefreshScheduler::new(no_jitter(1_000));
    assert_eq!(s.tick_count(), 0);
    assert_eq!(s.overrun_count(), 0);
    assert!(!s.is_disabled());
    assert!(!s.is_paused());
    assert_eq!(s.period(), Some(Duration::from_secs(1)));
}

#[test]
fn test_scheduler_disabled_mode() {
    let s = RefreshScheduler::new(RefreshConfig::disabled());
    assert!(s.is_disabled());
    assert_eq!(s.period(), None);
}

#[test]
fn test_one_second_constructor() {
    let s = RefreshScheduler::one_second();
    assert_eq!(s.period(), Some(Duration::from_secs(1)));
}

// =========================================================================
// Refresh firing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_wait_for_refresh_fires_and_increments() {
    let mut s = RefreshScheduler::new(no_jitter(1_000));

    let info = s.wait_for_refresh().await;
    assert_eq!(info.tick, 1);
    assert!(!info.late);
    assert_eq!(info.periods_skipped, 0);
    assert_eq!(s.tick_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_refreshes_increment_monotonically() {
    let mut s = RefreshScheduler::new(no_jitter(1_000));

    for expected in 1..=5 {
        let info = s.wait_for_refresh().await;
        assert_eq!(info.tick, expected);
    }
    assert_eq!(s.tick_count(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_disabled_scheduler_never_fires() {
    let mut s = RefreshScheduler::new(RefreshConfig::disabled());

    let fired = tokio::time::timeout(
        Duration::from_secs(60),
        s.wait_for_refresh(),
    )
    .await;
    assert!(fired.is_err(), "disabled scheduler must pend forever");
    assert_eq!(s.tick_count(), 0);
}

// =========================================================================
// Pause / resume
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_paused_scheduler_pends() {
    let mut s = RefreshScheduler::new(no_jitter(1_000));
    s.pause();
    assert!(s.is_paused());

    let fired = tokio::time::timeout(
        Duration::from_secs(10),
        s.wait_for_refresh(),
    )
    .await;
    assert!(fired.is_err(), "paused scheduler must pend");
}

#[tokio::test(start_paused = true)]
async fn test_resume_fires_one_period_later() {
    let mut s = RefreshScheduler::new(no_jitter(1_000));
    s.pause();
    s.resume();
    assert!(!s.is_paused());

    let info = tokio::time::timeout(
        Duration::from_secs(2),
        s.wait_for_refresh(),
    )
    .await
    .expect("resumed scheduler should fire again");
    assert_eq!(info.tick, 1);
}

#[tokio::test(start_paused = true)]
async fn test_pause_is_idempotent() {
    let mut s = RefreshScheduler::new(no_jitter(1_000));
    s.pause();
    s.pause();
    assert!(s.is_paused());
    s.resume();
    s.resume();
    assert!(!s.is_paused());
}

// =========================================================================
// Overrun handling
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_late_refresh_skips_instead_of_bursting() {
    let mut s = RefreshScheduler::new(no_jitter(1_000));

    // First refresh at t=1s.
    let info = s.wait_for_refresh().await;
    assert!(!info.late);

    // Starve the loop for 3.5 periods, then refresh. The scheduler
    // must report the lateness and NOT fire a burst of catch-ups.
    tokio::time::sleep(Duration::from_millis(3_500)).await;

    let info = s.wait_for_refresh().await;
    assert!(info.late);
    assert!(info.periods_skipped >= 2);
    assert_eq!(s.overrun_count(), 1);

    // Next refresh is one clean period away, not immediate.
    let before = tokio::time::Instant::now();
    let _ = s.wait_for_refresh().await;
    let elapsed = tokio::time::Instant::now() - before;
    assert!(elapsed >= Duration::from_millis(900));
}
