//! The game registry: creates table actors and routes commands to
//! them by [`GameId`].
//!
//! The registry itself holds no game state — just a handle per live
//! table. It is the single place game IDs are allocated.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use embers_protocol::{Action, GameId, UserId};
use tracing::info;

use crate::config::GameConfig;
use crate::store::GameStore;
use crate::table::{spawn_table, EventSender, SeatAssignment, TableHandle, TableInfo};
use crate::EngineError;

/// Global counter for allocating game IDs.
static NEXT_GAME_ID: AtomicU64 = AtomicU64::new(1);

/// Default bound of each table's command channel.
pub const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Owns the handles of every live table.
pub struct GameRegistry<S: GameStore> {
    games: HashMap<GameId, TableHandle>,
    store: Arc<S>,
    channel_size: usize,
}

impl<S: GameStore> GameRegistry<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_channel_size(store, DEFAULT_CHANNEL_SIZE)
    }

    pub fn with_channel_size(store: Arc<S>, channel_size: usize) -> Self {
        Self {
            games: HashMap::new(),
            store,
            channel_size,
        }
    }

    /// Deals a new game for the given seats and spawns its actor.
    ///
    /// `seed` fixes the shuffle, so two games created with the same
    /// seed deal identical hands.
    pub fn create_game(
        &mut self,
        config: GameConfig,
        seats: Vec<SeatAssignment>,
        seed: u64,
    ) -> Result<GameId, EngineError> {
        if !(2..=5).contains(&seats.len()) {
            return Err(EngineError::InvalidPlayerCount(seats.len()));
        }

        let game_id = GameId(NEXT_GAME_ID.fetch_add(1, Ordering::Relaxed));
        let handle = spawn_table(
            game_id,
            config,
            seats,
            seed,
            Arc::clone(&self.store),
            self.channel_size,
        )?;
        self.games.insert(game_id, handle);
        info!(%game_id, games = self.games.len(), "game created");
        Ok(game_id)
    }

    /// Looks up the handle for a live game.
    pub fn get(&self, game_id: GameId) -> Option<&TableHandle> {
        self.games.get(&game_id)
    }

    /// Routes an in-game action to its table.
    pub async fn act(
        &self,
        game_id: GameId,
        user_id: UserId,
        action: Action,
    ) -> Result<(), EngineError> {
        self.handle(game_id)?.act(user_id, action).await
    }

    /// Registers a spectator on a live game.
    pub async fn spectate(
        &self,
        game_id: GameId,
        user_id: UserId,
        sender: EventSender,
    ) -> Result<(), EngineError> {
        self.handle(game_id)?.spectate(user_id, sender).await
    }

    /// Fetches a metadata snapshot for one game.
    pub async fn info(&self, game_id: GameId) -> Result<TableInfo, EngineError> {
        self.handle(game_id)?.info().await
    }

    /// Shuts a table down and forgets its handle.
    pub async fn destroy_game(&mut self, game_id: GameId) -> Result<(), EngineError> {
        let handle = self
            .games
            .remove(&game_id)
            .ok_or(EngineError::NotFound(game_id))?;
        handle.shutdown().await?;
        info!(%game_id, games = self.games.len(), "game destroyed");
        Ok(())
    }

    pub fn game_ids(&self) -> Vec<GameId> {
        self.games.keys().copied().collect()
    }

    pub fn game_count(&self) -> usize {
        self.games.len()
    }

    fn handle(&self, game_id: GameId) -> Result<&TableHandle, EngineError> {
        self.games
            .get(&game_id)
            .ok_or(EngineError::NotFound(game_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::table::TableOutbound;
    use tokio::sync::mpsc;

    fn seats(n: u64) -> (Vec<SeatAssignment>, Vec<mpsc::UnboundedReceiver<TableOutbound>>) {
        let mut assignments = Vec::new();
        let mut receivers = Vec::new();
        for i in 0..n {
            let (tx, rx) = mpsc::unbounded_channel();
            assignments.push(SeatAssignment {
                user_id: UserId(i),
                name: format!("p{i}"),
                sender: tx,
            });
            receivers.push(rx);
        }
        (assignments, receivers)
    }

    #[tokio::test]
    async fn test_create_and_inspect_a_game() {
        let mut registry = GameRegistry::new(Arc::new(MemoryStore::new()));
        let (assignments, _receivers) = seats(3);
        let game_id = registry
            .create_game(GameConfig::default(), assignments, 11)
            .unwrap();

        let info = registry.info(game_id).await.unwrap();
        assert_eq!(info.game_id, game_id);
        assert_eq!(info.turn_num, 0);
        assert_eq!(info.active_seat, 0);
        assert_eq!(info.score, 0);
        assert!(!info.finished);
        assert_eq!(registry.game_count(), 1);
    }

    #[tokio::test]
    async fn test_rejects_bad_seat_counts() {
        let mut registry = GameRegistry::new(Arc::new(MemoryStore::new()));
        let (one_seat, _rx) = seats(1);
        let err = registry
            .create_game(GameConfig::default(), one_seat, 0)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidPlayerCount(1)));

        let (six_seats, _rx) = seats(6);
        let err = registry
            .create_game(GameConfig::default(), six_seats, 0)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidPlayerCount(6)));
    }

    #[tokio::test]
    async fn test_unknown_game_is_not_found() {
        let registry = GameRegistry::new(Arc::new(MemoryStore::new()));
        let err = registry.info(GameId(9999)).await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound(GameId(9999))));
    }

    #[tokio::test]
    async fn test_destroy_forgets_the_game() {
        let mut registry = GameRegistry::new(Arc::new(MemoryStore::new()));
        let (assignments, _receivers) = seats(2);
        let game_id = registry
            .create_game(GameConfig::default(), assignments, 0)
            .unwrap();

        registry.destroy_game(game_id).await.unwrap();
        assert_eq!(registry.game_count(), 0);
        assert!(registry.info(game_id).await.is_err());

        let err = registry.destroy_game(game_id).await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_game_ids_lists_live_games() {
        let mut registry = GameRegistry::new(Arc::new(MemoryStore::new()));
        let (a, _ra) = seats(2);
        let (b, _rb) = seats(2);
        let first = registry.create_game(GameConfig::default(), a, 0).unwrap();
        let second = registry.create_game(GameConfig::default(), b, 0).unwrap();

        let mut ids = registry.game_ids();
        ids.sort_by_key(|id| id.0);
        assert_eq!(ids, vec![first, second]);
        assert_ne!(first, second);
    }
}
