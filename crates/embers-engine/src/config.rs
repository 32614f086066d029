//! Game configuration.

use std::time::Duration;

use embers_variants::Variant;
use serde::{Deserialize, Serialize};

/// Hard cap on clue tokens.
pub const MAX_CLUES: u8 = 8;

/// Strikes at which the game is lost.
pub const MAX_STRIKES: u8 = 3;

/// Settings fixed when a table transitions from lobby to running.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Which ruleset (suit set, clue colors, deck) this game uses.
    pub variant: Variant,

    /// Whether players are on a clock. In untimed games clocks count
    /// upward into negative values to show thinking time, and the turn
    /// timer is never armed.
    pub timed: bool,

    /// Whether the chop-reorder convention is enforced server-side.
    pub reorder_cards: bool,

    /// Each player's starting clock in timed games.
    pub starting_time: Duration,

    /// Clock credit granted per completed turn in timed games.
    pub extra_turn_time: Duration,

    /// Whether spectators may watch this game.
    pub allow_spectators: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            variant: Variant::Standard,
            timed: false,
            reorder_cards: false,
            starting_time: Duration::from_secs(5 * 60),
            extra_turn_time: Duration::from_secs(10),
            allow_spectators: true,
        }
    }
}

impl GameConfig {
    /// Cards dealt to each player: 5 for 2–3 players, 4 for 4–5.
    pub fn hand_size(player_count: usize) -> usize {
        if player_count <= 3 { 5 } else { 4 }
    }
}
