//! The Embers game engine: authoritative state, turn processing, and
//! table actors for a cooperative fireworks card game.
//!
//! Each running game is owned by one table actor — an isolated Tokio
//! task reached through an mpsc channel. The actor validates actions,
//! advances the [`GameState`], fans events out per recipient (hiding
//! each player's own cards), supervises the turn clock in timed games,
//! and persists the finished game through a [`GameStore`].
//!
//! # Key types
//!
//! - [`GameRegistry`] — creates/destroys games, routes commands
//! - [`TableHandle`] — send commands to a running table actor
//! - [`GameState`] — the full authoritative state of one game
//! - [`Rejection`] — an illegal action, bounced back to its actor
//! - [`GameStore`] — persistence of finished games and player stats
//!
//! [`GameState`]: crate::state::GameState

#![allow(async_fn_in_trait)]

mod action;
mod config;
mod endgame;
mod error;
mod registry;
pub mod state;
mod store;
mod table;

pub use action::{Rejection, TurnAction, TurnOutcome, apply};
pub use config::{GameConfig, MAX_CLUES, MAX_STRIKES};
pub use endgame::{Verdict, evaluate};
pub use error::EngineError;
pub use registry::{DEFAULT_CHANNEL_SIZE, GameRegistry};
pub use store::{CompletedGame, GameStore, MemoryStore, StoreError, UserStats, persist_completed};
pub use table::{EventSender, SeatAssignment, TableHandle, TableInfo, TableOutbound};
