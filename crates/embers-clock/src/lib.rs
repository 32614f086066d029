//! Turn timeout supervision for Embers.
//!
//! In timed games, each turn arms a deadline equal to the acting
//! player's remaining clock. If the deadline passes before the player
//! acts, the table actor synthesizes a timeout pseudo-action and the
//! game ends as a loss. In untimed games the timer is simply never
//! armed and [`TurnTimer::expired`] pends forever.
//!
//! # Integration
//!
//! The timer is designed to sit inside the table actor's
//! `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         fired = timer.expired() => {
//!             // Stale-fire guard: compare fired.turn to the game's
//!             // current turn before synthesizing a timeout.
//!         }
//!     }
//! }
//! ```
//!
//! At most one deadline is pending per timer; [`TurnTimer::arm`] for a
//! new turn supersedes the previous one. The captured turn number is
//! carried through [`TimedOut`] so a late fire can always be detected
//! and discarded, even if the host never calls [`TurnTimer::disarm`] —
//! disarming is an optimization, the guard is the contract.

use std::time::Duration;

use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace};

/// Notification that an armed deadline elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedOut {
    /// The turn number captured when the deadline was armed. The host
    /// must discard the notification if this no longer matches the
    /// game's current turn.
    pub turn: u32,
}

/// One game's turn-timeout deadline.
///
/// One `TurnTimer` per table actor. Not shared: the actor owns it and
/// polls it from its select loop, so no locking is involved.
#[derive(Debug, Default)]
pub struct TurnTimer {
    /// When the pending deadline fires and the turn it was armed for.
    deadline: Option<(TokioInstant, u32)>,
}

impl TurnTimer {
    /// Creates an unarmed timer. [`expired`](Self::expired) pends
    /// forever until [`arm`](Self::arm) is called.
    pub fn new() -> Self {
        Self { deadline: None }
    }

    /// Arms the deadline for `turn`, superseding any pending deadline.
    ///
    /// `remaining` is the acting player's remaining clock. A zero
    /// duration fires on the next poll — a player who is already out
    /// of time times out immediately.
    pub fn arm(&mut self, turn: u32, remaining: Duration) {
        self.deadline = Some((TokioInstant::now() + remaining, turn));
        debug!(turn, remaining_ms = remaining.as_millis() as u64, "turn timer armed");
    }

    /// Clears any pending deadline.
    ///
    /// Optional: a stale fire is already rejected by the turn-number
    /// guard. Disarming just avoids waking the actor for nothing.
    pub fn disarm(&mut self) {
        if self.deadline.take().is_some() {
            debug!("turn timer disarmed");
        }
    }

    /// Whether a deadline is currently pending.
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// The turn number the pending deadline was armed for, if any.
    pub fn armed_turn(&self) -> Option<u32> {
        self.deadline.map(|(_, turn)| turn)
    }

    /// Waits until the armed deadline elapses.
    ///
    /// When unarmed this future pends forever — it will never resolve
    /// on its own, but `tokio::select!` still processes other branches.
    /// On firing, the timer returns to the unarmed state.
    pub async fn expired(&mut self) -> TimedOut {
        let Some((deadline, turn)) = self.deadline else {
            // Untimed game or no pending deadline: pend forever.
            std::future::pending::<()>().await;
            unreachable!()
        };

        time::sleep_until(deadline).await;
        self.deadline = None;
        trace!(turn, "turn timer fired");
        TimedOut { turn }
    }
}
