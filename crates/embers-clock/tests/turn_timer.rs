//! Integration tests for the turn timeout supervisor.
//!
//! Uses `tokio::time::pause()` (via `start_paused`) to control time
//! deterministically: `sleep_until` resolves instantly once the mocked
//! clock reaches the deadline.

use std::time::Duration;

use embers_clock::{TimedOut, TurnTimer};

#[test]
fn test_new_timer_is_unarmed() {
    let timer = TurnTimer::new();
    assert!(!timer.is_armed());
    assert_eq!(timer.armed_turn(), None);
}

#[tokio::test(start_paused = true)]
async fn test_unarmed_timer_pends_forever() {
    let mut timer = TurnTimer::new();

    let result = tokio::time::timeout(Duration::from_secs(3600), timer.expired()).await;
    assert!(result.is_err(), "unarmed timer should pend forever");
}

#[tokio::test(start_paused = true)]
async fn test_armed_timer_fires_at_deadline() {
    let mut timer = TurnTimer::new();
    timer.arm(4, Duration::from_secs(30));
    assert!(timer.is_armed());
    assert_eq!(timer.armed_turn(), Some(4));

    let fired = timer.expired().await;
    assert_eq!(fired, TimedOut { turn: 4 });
    assert!(!timer.is_armed(), "timer returns to unarmed after firing");
}

#[tokio::test(start_paused = true)]
async fn test_timer_does_not_fire_early() {
    let mut timer = TurnTimer::new();
    timer.arm(1, Duration::from_secs(60));

    let result = tokio::time::timeout(Duration::from_secs(59), timer.expired()).await;
    assert!(result.is_err(), "deadline is 60s, must not fire at 59s");
}

#[tokio::test(start_paused = true)]
async fn test_disarm_cancels_pending_deadline() {
    let mut timer = TurnTimer::new();
    timer.arm(2, Duration::from_secs(5));
    timer.disarm();
    assert!(!timer.is_armed());

    let result = tokio::time::timeout(Duration::from_secs(10), timer.expired()).await;
    assert!(result.is_err(), "disarmed timer should pend forever");
}

#[tokio::test(start_paused = true)]
async fn test_rearm_supersedes_previous_deadline() {
    let mut timer = TurnTimer::new();
    timer.arm(1, Duration::from_secs(5));
    // The player acted; the next turn arms a later, longer deadline.
    timer.arm(2, Duration::from_secs(120));

    let fired = timer.expired().await;
    assert_eq!(fired.turn, 2, "only the latest deadline exists");
}

#[tokio::test(start_paused = true)]
async fn test_zero_remaining_fires_immediately() {
    let mut timer = TurnTimer::new();
    timer.arm(7, Duration::ZERO);

    let fired = tokio::time::timeout(Duration::from_millis(1), timer.expired())
        .await
        .expect("zero-duration deadline should fire at once");
    assert_eq!(fired.turn, 7);
}

#[tokio::test(start_paused = true)]
async fn test_disarm_without_arm_is_noop() {
    let mut timer = TurnTimer::new();
    timer.disarm();
    assert!(!timer.is_armed());
}

// Mirrors the table actor's select! loop: commands win while the
// deadline is still in the future, the deadline wins once time passes.
#[tokio::test(start_paused = true)]
async fn test_select_loop_pattern() {
    let mut timer = TurnTimer::new();
    timer.arm(1, Duration::from_secs(30));

    let (tx, mut rx) = tokio::sync::mpsc::channel::<&str>(4);
    tx.send("act").await.unwrap();

    // A queued command is handled before the deadline.
    tokio::select! {
        Some(cmd) = rx.recv() => assert_eq!(cmd, "act"),
        _ = timer.expired() => panic!("deadline should not win with 30s left"),
    }

    // With no commands pending, the deadline eventually fires.
    let fired = tokio::select! {
        Some(_) = rx.recv() => panic!("no command was sent"),
        fired = timer.expired() => fired,
    };
    assert_eq!(fired.turn, 1);
}
