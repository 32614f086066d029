//! The authoritative data model: cards, deck, players, and the
//! aggregate [`GameState`].
//!
//! All mutation goes through the turn-action processor
//! ([`crate::action`]); this module only provides the structures and
//! the low-level bookkeeping operations it builds on (drawing, hand
//! removal, chop computation).

use std::collections::HashMap;
use std::time::Instant;

use embers_protocol::{GameEvent, SoundToken, UserId};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::EngineError;
use crate::config::GameConfig;

/// One physical card.
///
/// A card's identity (`suit`, `rank`) is fixed at deck creation; its
/// deck position is its index in [`GameState::deck`], assigned by the
/// shuffle and stable for the whole game — events refer to cards by
/// that position ("order"). `touched` and `discarded` are the only
/// mutable fields, and both are monotonic: once set they stay set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Card {
    pub suit: u8,
    pub rank: u8,
    /// Whether any clue has ever touched this card.
    pub touched: bool,
    /// Whether this card is in the discard pile (misplays included).
    pub discarded: bool,
}

impl Card {
    pub fn new(suit: u8, rank: u8) -> Self {
        Self {
            suit,
            rank,
            touched: false,
            discarded: false,
        }
    }
}

/// One seated player.
#[derive(Debug, Clone)]
pub struct Player {
    pub user_id: UserId,
    pub name: String,

    /// Deck orders of held cards, oldest first. The last element is
    /// "slot 1", the most recently drawn card.
    pub hand: Vec<usize>,

    /// Remaining clock in milliseconds. In untimed games this starts
    /// at 0 and decrements into negative values, recording how much
    /// thinking time the player has used.
    pub time_remaining_ms: i64,

    /// Private notes, keyed by card order.
    pub notes: HashMap<usize, String>,

    /// Whether the player's connection is currently live.
    pub present: bool,
}

/// The full authoritative state of one running game.
///
/// Created once when a table goes from lobby to running (deck shuffled,
/// hands dealt, clocks initialized); owned by exactly one table actor
/// thereafter, which serializes all access.
#[derive(Debug, Clone)]
pub struct GameState {
    pub config: GameConfig,
    pub players: Vec<Player>,

    /// The shuffled deck, fixed at game start. A card's index here is
    /// its order for the rest of the game.
    pub deck: Vec<Card>,

    /// Draw cursor. Only ever increases; `deck[deck_index..]` is what
    /// remains undrawn.
    pub deck_index: usize,

    /// Highest rank played per suit (0 = nothing played).
    pub stacks: Vec<u8>,

    /// Clue tokens available, 0..=8.
    pub clue_num: u8,

    /// Strikes accrued, 0..=3.
    pub strikes: u8,

    pub score: u32,
    pub turn_num: u32,
    pub turn_player_index: usize,

    /// Set when the last card is drawn: the turn on which the final
    /// go-around ends the game.
    pub end_turn: Option<u32>,

    /// Outcome sound for the action taken this turn, if any. Cleared
    /// at the start of the next action.
    pub sound: Option<SoundToken>,

    /// Whether the previous turn ended in a discard (drives the
    /// chop-reorder feature).
    pub discard_signal_outstanding: bool,

    /// Append-only log of every event emitted, in order. Persisted at
    /// game end for replay reconstruction.
    pub actions: Vec<GameEvent>,

    /// When the current turn began; used to charge thinking time to
    /// the acting player's clock.
    pub turn_begin: Instant,

    /// The shuffle seed, recorded for the persisted game.
    pub seed: u64,
}

impl GameState {
    /// Builds a fresh game: deck created per the variant, shuffled once
    /// with `seed`, starting hands dealt in seat order.
    pub fn new(
        config: GameConfig,
        roster: Vec<(UserId, String)>,
        seed: u64,
    ) -> Result<Self, EngineError> {
        let variant = config.variant;
        let mut deck = Vec::with_capacity(variant.deck_size());
        for suit in 0..variant.suit_count() as u8 {
            for &rank in variant.deck_ranks(suit) {
                deck.push(Card::new(suit, rank));
            }
        }
        let mut rng = StdRng::seed_from_u64(seed);
        deck.shuffle(&mut rng);
        Self::init(config, roster, deck, seed)
    }

    /// Builds a game over a caller-supplied deck (no shuffle).
    ///
    /// For deterministic tests and replay tooling. The deck must match
    /// the variant's composition for scoring to make sense.
    pub fn with_deck(
        config: GameConfig,
        roster: Vec<(UserId, String)>,
        deck: Vec<Card>,
    ) -> Result<Self, EngineError> {
        Self::init(config, roster, deck, 0)
    }

    fn init(
        config: GameConfig,
        roster: Vec<(UserId, String)>,
        deck: Vec<Card>,
        seed: u64,
    ) -> Result<Self, EngineError> {
        if !(2..=5).contains(&roster.len()) {
            return Err(EngineError::InvalidPlayerCount(roster.len()));
        }

        let starting_ms = if config.timed {
            config.starting_time.as_millis() as i64
        } else {
            0
        };
        let players: Vec<Player> = roster
            .into_iter()
            .map(|(user_id, name)| Player {
                user_id,
                name,
                hand: Vec::new(),
                time_remaining_ms: starting_ms,
                notes: HashMap::new(),
                present: true,
            })
            .collect();

        let mut state = Self {
            stacks: vec![0; config.variant.suit_count()],
            config,
            players,
            deck,
            deck_index: 0,
            clue_num: crate::config::MAX_CLUES,
            strikes: 0,
            score: 0,
            turn_num: 0,
            turn_player_index: 0,
            end_turn: None,
            sound: None,
            discard_signal_outstanding: false,
            actions: Vec::new(),
            turn_begin: Instant::now(),
            seed,
        };

        // Deal starting hands. The draw events land in the action log
        // so a replay reconstructs the deal exactly.
        let hand_size = GameConfig::hand_size(state.players.len());
        for seat in 0..state.players.len() {
            for _ in 0..hand_size {
                state.draw_card(seat);
            }
        }

        Ok(state)
    }

    /// Resolves a user to their seat index.
    pub fn seat_of(&self, user_id: UserId) -> Option<usize> {
        self.players.iter().position(|p| p.user_id == user_id)
    }

    /// The player whose turn it is.
    pub fn current_player(&self) -> &Player {
        &self.players[self.turn_player_index]
    }

    /// Cards left undrawn in the deck.
    pub fn deck_remaining(&self) -> usize {
        self.deck.len() - self.deck_index
    }

    /// Draws the next deck card into `seat`'s hand, logging the draw
    /// and draw-size events. No-op once the deck is exhausted.
    ///
    /// Drawing the final card starts the terminal countdown: the game
    /// ends after one more full go-around plus the current turn.
    pub fn draw_card(&mut self, seat: usize) -> Vec<GameEvent> {
        if self.deck_index >= self.deck.len() {
            return Vec::new();
        }

        let order = self.deck_index;
        let card = self.deck[order];
        self.players[seat].hand.push(order);
        self.deck_index += 1;

        let events = vec![
            GameEvent::Draw {
                who: seat,
                order,
                suit: Some(card.suit),
                rank: Some(card.rank),
            },
            GameEvent::DrawSize {
                size: self.deck_remaining(),
            },
        ];
        self.actions.extend(events.iter().cloned());

        if self.deck_index >= self.deck.len() {
            self.end_turn = Some(self.turn_num + self.players.len() as u32 + 1);
        }

        events
    }

    /// Position in `seat`'s hand of the chop card: the oldest card
    /// never touched by a clue, or the first-drawn card when the whole
    /// hand is touched.
    pub fn chop_index(&self, seat: usize) -> usize {
        let hand = &self.players[seat].hand;
        hand.iter()
            .position(|&order| !self.deck[order].touched)
            .unwrap_or(0)
    }

    /// Removes the card with deck position `order` from `seat`'s hand.
    ///
    /// Returns the slot number the card vacated (slot 1 = most recently
    /// drawn), used for log lines. `None` if the card is not in that
    /// hand.
    pub fn remove_from_hand(&mut self, seat: usize, order: usize) -> Option<usize> {
        let hand = &mut self.players[seat].hand;
        let index = hand.iter().position(|&o| o == order)?;
        hand.remove(index);
        Some(hand.len() - index + 1)
    }

    /// Records a private note for `seat` against a card order.
    pub fn set_note(&mut self, seat: usize, order: usize, note: String) {
        self.players[seat].notes.insert(order, note);
    }
}
