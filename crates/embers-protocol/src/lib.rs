//! Message contract for the Embers game engine.
//!
//! This crate defines what travels between the engine core and its
//! collaborators:
//!
//! - **Types** ([`Action`], [`GameEvent`], [`Recipient`], identity
//!   newtypes) — the inbound actions players submit and the outbound
//!   events the engine emits.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages
//!   are converted to/from bytes at the transport and persistence
//!   boundaries.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! The engine and any client-side prediction logic must agree on these
//! shapes exactly, so everything here is plain data with pinned serde
//! representations and no engine state.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    Action, Clue, ClueKind, GameEvent, GameId, Recipient, SoundToken, UserId,
};
