//! Persistence of finished games.
//!
//! The table actor hands a [`CompletedGame`] to [`persist_completed`]
//! exactly once, after the final turn resolves. The pipeline runs the
//! store calls in a fixed order and halts at the first failure; the
//! game is gone from memory either way, so a failure costs history,
//! not correctness.

use std::collections::HashMap;
use std::sync::Mutex;

use embers_protocol::{GameEvent, GameId, UserId};
use embers_variants::Variant;
use tracing::error;

/// A record of one finished game, ready to persist.
#[derive(Debug, Clone)]
pub struct CompletedGame {
    pub game_id: GameId,
    pub variant: Variant,
    pub timed: bool,
    pub seed: u64,
    /// Final score: 0 for a loss.
    pub score: u32,
    pub loss: bool,
    /// Seated players in seat order.
    pub roster: Vec<UserId>,
    /// The full action log, in emission order.
    pub actions: Vec<GameEvent>,
}

/// Aggregate statistics for one user.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UserStats {
    pub num_played: u64,
    pub average_score: f64,
    pub strikeout_rate: f64,
}

/// A store operation failed.
#[derive(Debug, thiserror::Error)]
#[error("store operation failed: {0}")]
pub struct StoreError(pub String);

/// Backing storage for finished games and per-user statistics.
///
/// Implementations are infallible-async: each call either commits or
/// returns a [`StoreError`] that aborts the rest of the pipeline.
pub trait GameStore: Send + Sync + 'static {
    /// Records the game row itself.
    fn record_game(
        &self,
        game: &CompletedGame,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Records one participant of a recorded game.
    fn record_participant(
        &self,
        game_id: GameId,
        user_id: UserId,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Records the game's full action log.
    fn record_actions(
        &self,
        game_id: GameId,
        actions: &[GameEvent],
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// How many already-recorded games share this game's seed
    /// (games dealt from the same shuffle are comparable).
    fn count_similar_games(
        &self,
        seed: u64,
    ) -> impl std::future::Future<Output = Result<u64, StoreError>> + Send;

    /// Folds a finished game into the user's aggregates.
    fn update_stats(
        &self,
        user_id: UserId,
        score: u32,
        strikeout: bool,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Reads back the user's current aggregates.
    fn fetch_stats(
        &self,
        user_id: UserId,
    ) -> impl std::future::Future<Output = Result<UserStats, StoreError>> + Send;
}

/// Runs the full persistence pipeline for one finished game.
///
/// Order: game row, participants, action log, similar-game count, then
/// stat update and read-back per player. Stops at the first error,
/// logging it; the caller does not retry.
pub async fn persist_completed<S: GameStore>(store: &S, game: &CompletedGame) {
    if let Err(e) = store.record_game(game).await {
        error!(game_id = %game.game_id, %e, "failed to record game");
        return;
    }
    for &user_id in &game.roster {
        if let Err(e) = store.record_participant(game.game_id, user_id).await {
            error!(game_id = %game.game_id, %user_id, %e, "failed to record participant");
            return;
        }
    }
    if let Err(e) = store.record_actions(game.game_id, &game.actions).await {
        error!(game_id = %game.game_id, %e, "failed to record action log");
        return;
    }
    let num_similar = match store.count_similar_games(game.seed).await {
        Ok(n) => n,
        Err(e) => {
            error!(game_id = %game.game_id, %e, "failed to count similar games");
            return;
        }
    };
    tracing::debug!(game_id = %game.game_id, num_similar, "game recorded");

    for &user_id in &game.roster {
        if let Err(e) = store.update_stats(user_id, game.score, game.loss).await {
            error!(game_id = %game.game_id, %user_id, %e, "failed to update stats");
            return;
        }
        match store.fetch_stats(user_id).await {
            Ok(stats) => {
                tracing::debug!(
                    %user_id,
                    num_played = stats.num_played,
                    average_score = stats.average_score,
                    "stats refreshed"
                );
            }
            Err(e) => {
                error!(game_id = %game.game_id, %user_id, %e, "failed to fetch stats");
                return;
            }
        }
    }
}

/// An in-memory store, used by tests and the demo binary.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryStoreInner>,
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    games: Vec<CompletedGame>,
    participants: Vec<(GameId, UserId)>,
    action_logs: HashMap<u64, usize>,
    stats: HashMap<u64, StatsAccumulator>,
}

#[derive(Debug, Default, Clone, Copy)]
struct StatsAccumulator {
    num_played: u64,
    total_score: u64,
    strikeouts: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of games recorded so far.
    pub fn recorded_games(&self) -> usize {
        self.inner.lock().unwrap().games.len()
    }

    /// The recorded score of a game, if it was recorded.
    pub fn recorded_score(&self, game_id: GameId) -> Option<u32> {
        self.inner
            .lock()
            .unwrap()
            .games
            .iter()
            .find(|g| g.game_id == game_id)
            .map(|g| g.score)
    }

    /// Length of the persisted action log for a game.
    pub fn recorded_action_count(&self, game_id: GameId) -> Option<usize> {
        self.inner.lock().unwrap().action_logs.get(&game_id.0).copied()
    }
}

impl GameStore for MemoryStore {
    async fn record_game(&self, game: &CompletedGame) -> Result<(), StoreError> {
        self.inner.lock().unwrap().games.push(game.clone());
        Ok(())
    }

    async fn record_participant(
        &self,
        game_id: GameId,
        user_id: UserId,
    ) -> Result<(), StoreError> {
        self.inner.lock().unwrap().participants.push((game_id, user_id));
        Ok(())
    }

    async fn record_actions(
        &self,
        game_id: GameId,
        actions: &[GameEvent],
    ) -> Result<(), StoreError> {
        self.inner
            .lock()
            .unwrap()
            .action_logs
            .insert(game_id.0, actions.len());
        Ok(())
    }

    async fn count_similar_games(&self, seed: u64) -> Result<u64, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.games.iter().filter(|g| g.seed == seed).count() as u64)
    }

    async fn update_stats(
        &self,
        user_id: UserId,
        score: u32,
        strikeout: bool,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let acc = inner.stats.entry(user_id.0).or_default();
        acc.num_played += 1;
        acc.total_score += u64::from(score);
        if strikeout {
            acc.strikeouts += 1;
        }
        Ok(())
    }

    async fn fetch_stats(&self, user_id: UserId) -> Result<UserStats, StoreError> {
        let inner = self.inner.lock().unwrap();
        let acc = inner.stats.get(&user_id.0).copied().unwrap_or_default();
        if acc.num_played == 0 {
            return Ok(UserStats::default());
        }
        Ok(UserStats {
            num_played: acc.num_played,
            average_score: acc.total_score as f64 / acc.num_played as f64,
            strikeout_rate: acc.strikeouts as f64 / acc.num_played as f64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(game_id: u64, seed: u64, score: u32, loss: bool) -> CompletedGame {
        CompletedGame {
            game_id: GameId(game_id),
            variant: Variant::Standard,
            timed: false,
            seed,
            score,
            loss,
            roster: vec![UserId(1), UserId(2)],
            actions: vec![
                GameEvent::Status { clues: 8, score },
                GameEvent::GameOver { score, loss },
            ],
        }
    }

    #[tokio::test]
    async fn test_pipeline_records_everything() {
        let store = MemoryStore::new();
        persist_completed(&store, &completed(1, 99, 17, false)).await;

        assert_eq!(store.recorded_games(), 1);
        assert_eq!(store.recorded_score(GameId(1)), Some(17));
        assert_eq!(store.recorded_action_count(GameId(1)), Some(2));
    }

    #[tokio::test]
    async fn test_stats_accumulate_across_games() {
        let store = MemoryStore::new();
        persist_completed(&store, &completed(1, 5, 20, false)).await;
        persist_completed(&store, &completed(2, 6, 0, true)).await;

        let stats = store.fetch_stats(UserId(1)).await.unwrap();
        assert_eq!(stats.num_played, 2);
        assert!((stats.average_score - 10.0).abs() < f64::EPSILON);
        assert!((stats.strikeout_rate - 0.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_similar_games_share_a_seed() {
        let store = MemoryStore::new();
        persist_completed(&store, &completed(1, 42, 20, false)).await;
        persist_completed(&store, &completed(2, 42, 23, false)).await;
        persist_completed(&store, &completed(3, 7, 11, false)).await;

        assert_eq!(store.count_similar_games(42).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_unknown_user_has_default_stats() {
        let store = MemoryStore::new();
        let stats = store.fetch_stats(UserId(99)).await.unwrap();
        assert_eq!(stats, UserStats::default());
    }
}
