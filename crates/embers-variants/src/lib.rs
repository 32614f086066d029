//! Variant rule tables for Embers.
//!
//! A [`Variant`] maps to a suit set, a clue-color set, a deck
//! composition, and the clue-touch predicate [`Variant::touches`].
//! The engine consults this table when applying clues and computing
//! the maximum score; client-side prediction logic must use the same
//! table, so everything here is pure data plus pure functions — no
//! engine state, no I/O.

use embers_protocol::{Clue, ClueKind};
use serde::{Deserialize, Serialize};

/// Rank distribution of a normal suit: three 1s, two each of 2–4, one 5.
const NORMAL_RANKS: [u8; 10] = [1, 1, 1, 2, 2, 3, 3, 4, 4, 5];

/// Rank distribution of a one-of-each suit.
const ONE_OF_EACH_RANKS: [u8; 5] = [1, 2, 3, 4, 5];

/// Which suits each clue color touches in the mixed-suits variant.
/// Four clue colors (Blue, Yellow, Red, Black); every suit is a blend
/// of two of them.
const MIXED_TOUCH: [[u8; 3]; 4] = [
    [0, 1, 2], // Blue touches Green, Magenta, Navy
    [0, 3, 4], // Yellow touches Green, Orange, Tan
    [1, 3, 5], // Red touches Magenta, Orange, Burgundy
    [2, 4, 5], // Black touches Navy, Tan, Burgundy
];

/// A named ruleset altering the suit set and the clue-to-suit
/// correspondence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Variant {
    /// Five suits, one clue color per suit.
    #[default]
    Standard,
    /// Adds a sixth suit (Black) with its own clue color.
    Black,
    /// Like [`Variant::Black`], but the Black suit has only one card
    /// of each rank.
    BlackOneOfEach,
    /// Adds a sixth suit (Rainbow) touched by every color clue.
    Rainbow,
    /// Six two-color blend suits clued by four colors; each suit is
    /// touched by exactly two clue colors.
    MixedSuits,
    /// Five two-color blend suits plus Rainbow, clued by five colors.
    MixedAndMulti,
}

impl Variant {
    /// Every variant, in wire order.
    pub const ALL: [Variant; 6] = [
        Variant::Standard,
        Variant::Black,
        Variant::BlackOneOfEach,
        Variant::Rainbow,
        Variant::MixedSuits,
        Variant::MixedAndMulti,
    ];

    /// Number of suits (and play stacks) in this variant.
    pub fn suit_count(self) -> usize {
        match self {
            Variant::Standard => 5,
            _ => 6,
        }
    }

    /// Display name of a suit, for log lines.
    pub fn suit_name(self, suit: u8) -> &'static str {
        const BASE: [&str; 6] = ["Blue", "Green", "Yellow", "Red", "Purple", "Black"];
        const MIXED: [&str; 6] = ["Green", "Magenta", "Navy", "Orange", "Tan", "Burgundy"];
        const MIXED_MULTI: [&str; 6] =
            ["Teal", "Lime", "Orange", "Burgundy", "Indigo", "Rainbow"];

        match self {
            Variant::Standard | Variant::Black | Variant::BlackOneOfEach => {
                BASE[suit as usize]
            }
            Variant::Rainbow => {
                if suit == 5 {
                    "Rainbow"
                } else {
                    BASE[suit as usize]
                }
            }
            Variant::MixedSuits => MIXED[suit as usize],
            Variant::MixedAndMulti => MIXED_MULTI[suit as usize],
        }
    }

    /// Number of distinct color clues available in this variant.
    pub fn clue_color_count(self) -> u8 {
        match self {
            Variant::Standard | Variant::Rainbow | Variant::MixedAndMulti => 5,
            Variant::Black | Variant::BlackOneOfEach => 6,
            Variant::MixedSuits => 4,
        }
    }

    /// Display name of a color clue, for log lines.
    pub fn clue_color_name(self, value: u8) -> &'static str {
        const BASE: [&str; 6] = ["Blue", "Green", "Yellow", "Red", "Purple", "Black"];
        const MIXED: [&str; 4] = ["Blue", "Yellow", "Red", "Black"];
        const MIXED_MULTI: [&str; 5] = ["Blue", "Green", "Yellow", "Red", "Black"];

        match self {
            Variant::MixedSuits => MIXED[value as usize],
            Variant::MixedAndMulti => MIXED_MULTI[value as usize],
            _ => BASE[value as usize],
        }
    }

    /// Whether `clue` is in range for this variant at all.
    pub fn clue_valid(self, clue: Clue) -> bool {
        match clue.kind {
            ClueKind::Rank => (1..=5).contains(&clue.value),
            ClueKind::Color => clue.value < self.clue_color_count(),
        }
    }

    /// The clue-touch predicate: does `clue` touch a card of
    /// `suit`/`rank`?
    ///
    /// Rank clues are variant-independent. Color clues follow the
    /// variant's correspondence, including suits touched by multiple
    /// colors and the Rainbow suit touched by every color.
    pub fn touches(self, clue: Clue, suit: u8, rank: u8) -> bool {
        match clue.kind {
            ClueKind::Rank => rank == clue.value,
            ClueKind::Color => match self {
                Variant::Standard | Variant::Black | Variant::BlackOneOfEach => {
                    suit == clue.value
                }
                Variant::Rainbow => suit == clue.value || suit == 5,
                Variant::MixedSuits => {
                    MIXED_TOUCH[clue.value as usize].contains(&suit)
                }
                Variant::MixedAndMulti => {
                    // Suit i blends colors i and i+1; suit 5 is Rainbow.
                    suit == 5 || suit == clue.value || suit == (clue.value + 4) % 5
                }
            },
        }
    }

    /// The multiset of ranks printed for one suit of the deck.
    pub fn deck_ranks(self, suit: u8) -> &'static [u8] {
        if self == Variant::BlackOneOfEach && suit == 5 {
            &ONE_OF_EACH_RANKS
        } else {
            &NORMAL_RANKS
        }
    }

    /// Total cards in this variant's deck.
    pub fn deck_size(self) -> usize {
        (0..self.suit_count() as u8)
            .map(|suit| self.deck_ranks(suit).len())
            .sum()
    }

    /// The maximum obtainable score: a completed stack per suit.
    pub fn max_score(self) -> u32 {
        self.suit_count() as u32 * 5
    }
}
