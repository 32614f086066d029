//! Error types for the engine layer.

use embers_protocol::{GameId, UserId};

/// Errors surfaced by the registry and table handles.
///
/// These are host-facing errors. A player's illegal *move* is not an
/// `EngineError` — it is a [`Rejection`](crate::Rejection) delivered
/// back to that player only.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The game does not exist (or has already been torn down).
    #[error("game {0} not found")]
    NotFound(GameId),

    /// The user is not seated at this game.
    #[error("user {0} is not seated at game {1}")]
    NotSeated(UserId, GameId),

    /// A game needs 2–5 seated players.
    #[error("a game requires between 2 and 5 players, got {0}")]
    InvalidPlayerCount(usize),

    /// The game's command channel is full or closed.
    #[error("game {0} is unavailable")]
    Unavailable(GameId),

    /// The game is in a state that does not allow this operation.
    #[error("invalid game state for this operation: {0}")]
    InvalidState(String),
}
