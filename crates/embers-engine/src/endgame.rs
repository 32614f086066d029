//! End-of-game detection.
//!
//! Evaluated once per completed turn, after the turn counter has
//! advanced. The four terminal conditions, checked in order: a third
//! strike (loss), the final go-around after the deck ran out, a
//! perfect score, and a dead end where no undiscarded card can ever
//! extend a stack.

use crate::config::MAX_STRIKES;
use crate::state::GameState;

/// Whether the game continues after the turn that just completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Continue,
    /// The game is over. `score` is the final recorded score, which is
    /// 0 for a loss regardless of stacks played.
    Over { score: u32, loss: bool },
}

impl Verdict {
    pub fn is_over(&self) -> bool {
        matches!(self, Verdict::Over { .. })
    }
}

/// Evaluates the terminal conditions against the current state.
pub fn evaluate(state: &GameState) -> Verdict {
    if state.strikes >= MAX_STRIKES {
        return Verdict::Over {
            score: 0,
            loss: true,
        };
    }

    if Some(state.turn_num) == state.end_turn {
        return Verdict::Over {
            score: state.score,
            loss: false,
        };
    }

    if state.score == state.config.variant.max_score() {
        return Verdict::Over {
            score: state.score,
            loss: false,
        };
    }

    // Dead end: for every suit, either the stack is complete or every
    // copy of the next needed rank has been discarded. Cards still in
    // hands count as reachable.
    for (suit, &top) in state.stacks.iter().enumerate() {
        if top >= 5 {
            continue;
        }
        let needed = top + 1;
        let reachable = state
            .deck
            .iter()
            .any(|c| c.suit == suit as u8 && c.rank == needed && !c.discarded);
        if reachable {
            return Verdict::Continue;
        }
    }

    Verdict::Over {
        score: state.score,
        loss: false,
    }
}
