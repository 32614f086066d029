//! Core message types for the Embers engine.
//!
//! Everything the engine accepts from clients ([`Action`]) or emits to
//! them ([`GameEvent`]) is defined here. These types are the contract
//! between the game-state engine and the transport layer: the engine
//! never sees a socket, it only produces `(Recipient, GameEvent)` pairs
//! and hands them to whatever delivers them.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a user account.
///
/// Newtype over `u64` so a `UserId` can never be confused with a
/// [`GameId`] or a seat index. `#[serde(transparent)]` keeps the JSON
/// representation a plain number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U-{}", self.0)
    }
}

/// A unique identifier for a running game (one table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub u64);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "G-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Recipient — who should receive an event?
// ---------------------------------------------------------------------------

/// Specifies who should receive a server event.
///
/// The turn-action processor returns a list of `(Recipient, GameEvent)`
/// pairs; the table actor resolves each recipient to concrete outbound
/// channels. Spectators always count as "everyone".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every seated player and every spectator.
    All,

    /// One specific seated player.
    Player(UserId),

    /// Everyone except the specified player (spectators included).
    AllExcept(UserId),
}

// ---------------------------------------------------------------------------
// Clues and inbound actions
// ---------------------------------------------------------------------------

/// The two kinds of clue a player can give.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClueKind {
    /// "These are your threes." `value` is a rank, 1–5.
    Rank,
    /// "These are your blues." `value` is a clue-color index; which
    /// suits it touches depends on the variant.
    Color,
}

/// One clue: a kind plus a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clue {
    pub kind: ClueKind,
    pub value: u8,
}

impl Clue {
    pub fn rank(value: u8) -> Self {
        Self { kind: ClueKind::Rank, value }
    }

    pub fn color(value: u8) -> Self {
        Self { kind: ClueKind::Color, value }
    }
}

/// An in-game action submitted by a seated player.
///
/// `target` is a seat index for clues and a card's deck position
/// (its draw order) for plays and discards. The deck blind-play carries
/// no target — it is only legal when exactly one card remains, and that
/// card is implied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Action {
    /// Give a clue to another player.
    Clue { target: usize, clue: Clue },

    /// Play a card from your own hand onto the stacks.
    Play { target: usize },

    /// Discard a card from your own hand to regain a clue token.
    Discard { target: usize },

    /// Draw and immediately play the final card of the deck.
    BlindDeckPlay,
}

// ---------------------------------------------------------------------------
// Outbound events
// ---------------------------------------------------------------------------

/// Sound cue tokens, sent per-recipient at the end of each turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundToken {
    /// It just became your turn.
    TurnUs,
    /// Someone else acted.
    TurnOther,
    /// A play failed (strike).
    Fail,
    /// A card was played blind.
    Blind,
}

/// An event describing one observable change to a game.
///
/// Internally tagged so the JSON carries a `"type"` discriminator:
/// `{ "type": "status", "clues": 7, "score": 3 }`. The engine appends
/// every event to the game's action log; the same values are fanned out
/// to clients (with [`GameEvent::Draw`] scrubbed for the drawing
/// player — see [`GameEvent::scrubbed`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    /// Current clue count and score, emitted after every action.
    Status { clues: u8, score: u32 },

    /// A clue was given. `touched` lists the deck orders of every card
    /// in the target's hand matched by the clue.
    Clue {
        giver: usize,
        target: usize,
        clue: Clue,
        touched: Vec<usize>,
    },

    /// A player drew a card. `suit` and `rank` are `None` in the copy
    /// sent to the drawing player themselves: a player must never learn
    /// their own card's identity over this channel.
    Draw {
        who: usize,
        order: usize,
        suit: Option<u8>,
        rank: Option<u8>,
    },

    /// Cards remaining in the deck after a draw.
    DrawSize { size: usize },

    /// A card was successfully played onto its stack.
    Played {
        who: usize,
        order: usize,
        suit: u8,
        rank: u8,
    },

    /// A card went to the discard pile. `failed` marks a misplay that
    /// was converted into a discard.
    Discard {
        who: usize,
        order: usize,
        suit: u8,
        rank: u8,
        failed: bool,
    },

    /// The strike counter advanced.
    Strike { num: u8 },

    /// A new turn began. `who` is the seat now expected to act.
    Turn { num: u32, who: usize },

    /// A hand was reordered by the chop-reorder feature. `hand` is the
    /// full new order (deck orders, oldest first).
    Reorder { who: usize, hand: Vec<usize> },

    /// Play a sound cue. Always sent per-recipient.
    Sound { file: SoundToken },

    /// Clock values for every seat. `active` is `None` once the game
    /// has ended, which tells clients to stop their timers.
    Clock {
        times: Vec<i64>,
        active: Option<usize>,
    },

    /// The game ended. `score` is 0 when `loss` is true.
    GameOver { score: u32, loss: bool },

    /// Identity of a card still hidden in a hand at game end.
    Reveal {
        who: usize,
        order: usize,
        suit: u8,
        rank: u8,
    },

    /// A human-readable log line describing an action.
    Text { text: String },
}

impl GameEvent {
    /// Returns the copy of this event safe to deliver to `seat`.
    ///
    /// Only [`GameEvent::Draw`] is affected: the drawing player gets a
    /// version with `suit` and `rank` removed. Every other event is
    /// identical for all recipients.
    pub fn scrubbed(&self, seat: usize) -> GameEvent {
        match self {
            GameEvent::Draw { who, order, .. } if *who == seat => GameEvent::Draw {
                who: *who,
                order: *order,
                suit: None,
                rank: None,
            },
            other => other.clone(),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The JSON shapes here are what clients parse; a serde attribute
    //! mismatch means the client renders garbage, so each shape is
    //! pinned by a test.

    use super::*;

    // =====================================================================
    // Identity types
    // =====================================================================

    #[test]
    fn test_user_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&UserId(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_user_id_deserializes_from_plain_number() {
        let uid: UserId = serde_json::from_str("42").unwrap();
        assert_eq!(uid, UserId(42));
    }

    #[test]
    fn test_user_id_display() {
        assert_eq!(UserId(7).to_string(), "U-7");
    }

    #[test]
    fn test_game_id_display() {
        assert_eq!(GameId(3).to_string(), "G-3");
    }

    // =====================================================================
    // Actions — decode what clients actually send
    // =====================================================================

    #[test]
    fn test_action_clue_json_format() {
        let json = r#"{
            "type": "Clue",
            "target": 1,
            "clue": { "kind": "Rank", "value": 3 }
        }"#;
        let action: Action = serde_json::from_str(json).unwrap();
        assert_eq!(
            action,
            Action::Clue {
                target: 1,
                clue: Clue::rank(3),
            }
        );
    }

    #[test]
    fn test_action_play_round_trip() {
        let action = Action::Play { target: 17 };
        let bytes = serde_json::to_vec(&action).unwrap();
        let decoded: Action = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(action, decoded);
    }

    #[test]
    fn test_action_discard_round_trip() {
        let action = Action::Discard { target: 4 };
        let bytes = serde_json::to_vec(&action).unwrap();
        let decoded: Action = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(action, decoded);
    }

    #[test]
    fn test_action_blind_deck_play_json_format() {
        let json: serde_json::Value =
            serde_json::to_value(Action::BlindDeckPlay).unwrap();
        assert_eq!(json["type"], "BlindDeckPlay");
    }

    #[test]
    fn test_clue_color_constructor() {
        let clue = Clue::color(2);
        assert_eq!(clue.kind, ClueKind::Color);
        assert_eq!(clue.value, 2);
    }

    // =====================================================================
    // Events — pin the tagged JSON shapes
    // =====================================================================

    #[test]
    fn test_status_event_json_format() {
        let event = GameEvent::Status { clues: 7, score: 3 };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "status");
        assert_eq!(json["clues"], 7);
        assert_eq!(json["score"], 3);
    }

    #[test]
    fn test_clue_event_json_format() {
        let event = GameEvent::Clue {
            giver: 0,
            target: 1,
            clue: Clue::color(2),
            touched: vec![5, 9],
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "clue");
        assert_eq!(json["clue"]["kind"], "Color");
        assert_eq!(json["touched"], serde_json::json!([5, 9]));
    }

    #[test]
    fn test_draw_event_round_trip_with_identity() {
        let event = GameEvent::Draw {
            who: 2,
            order: 11,
            suit: Some(3),
            rank: Some(1),
        };
        let bytes = serde_json::to_vec(&event).unwrap();
        let decoded: GameEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(event, decoded);
    }

    #[test]
    fn test_sound_token_serializes_as_snake_case() {
        let json = serde_json::to_string(&SoundToken::TurnUs).unwrap();
        assert_eq!(json, "\"turn_us\"");
        let json = serde_json::to_string(&SoundToken::Fail).unwrap();
        assert_eq!(json, "\"fail\"");
    }

    #[test]
    fn test_clock_event_with_no_active_seat() {
        let event = GameEvent::Clock {
            times: vec![30_000, -1_200],
            active: None,
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "clock");
        assert!(json["active"].is_null());
    }

    #[test]
    fn test_game_over_round_trip() {
        let event = GameEvent::GameOver { score: 0, loss: true };
        let bytes = serde_json::to_vec(&event).unwrap();
        let decoded: GameEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(event, decoded);
    }

    // =====================================================================
    // Draw scrubbing — the information-hiding contract
    // =====================================================================

    #[test]
    fn test_scrubbed_hides_identity_from_drawing_player() {
        let event = GameEvent::Draw {
            who: 1,
            order: 20,
            suit: Some(0),
            rank: Some(5),
        };
        let scrubbed = event.scrubbed(1);
        assert_eq!(
            scrubbed,
            GameEvent::Draw {
                who: 1,
                order: 20,
                suit: None,
                rank: None,
            }
        );
    }

    #[test]
    fn test_scrubbed_leaves_other_seats_untouched() {
        let event = GameEvent::Draw {
            who: 1,
            order: 20,
            suit: Some(0),
            rank: Some(5),
        };
        assert_eq!(event.scrubbed(0), event);
        assert_eq!(event.scrubbed(2), event);
    }

    #[test]
    fn test_scrubbed_is_identity_for_non_draw_events() {
        let event = GameEvent::Strike { num: 2 };
        assert_eq!(event.scrubbed(0), event);
    }

    // =====================================================================
    // Error cases — malformed input
    // =====================================================================

    #[test]
    fn test_decode_garbage_returns_error() {
        let garbage = b"not json at all";
        let result: Result<Action, _> = serde_json::from_slice(garbage);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_unknown_action_type_returns_error() {
        let unknown = r#"{"type": "Shuffle", "target": 0}"#;
        let result: Result<Action, _> = serde_json::from_str(unknown);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_clue_missing_target_returns_error() {
        let wrong = r#"{"type": "Clue", "clue": {"kind": "Rank", "value": 1}}"#;
        let result: Result<Action, _> = serde_json::from_str(wrong);
        assert!(result.is_err());
    }
}
