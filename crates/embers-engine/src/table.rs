//! Table actor: an isolated Tokio task that owns one running game.
//!
//! Each table runs in its own task, communicating with the outside
//! world through an mpsc channel. No shared mutable state, just
//! message passing: the actor is the only code that ever touches its
//! [`GameState`], so turn processing needs no locks.
//!
//! The actor loop selects between inbound commands and the turn timer;
//! in untimed games the timer is never armed and pends forever, making
//! the loop purely command-driven.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use embers_clock::{TimedOut, TurnTimer};
use embers_protocol::{Action, GameEvent, GameId, Recipient, UserId};
use tokio::sync::{mpsc, oneshot};

use crate::action::{self, TurnAction, TurnOutcome};
use crate::config::GameConfig;
use crate::endgame::Verdict;
use crate::state::GameState;
use crate::store::{persist_completed, CompletedGame, GameStore};
use crate::EngineError;

/// An outbound message from the table actor to one connection handler.
#[derive(Debug, Clone, PartialEq)]
pub enum TableOutbound {
    /// A game event, already scrubbed for this recipient.
    Event(GameEvent),
    /// The recipient's own action was rejected.
    Denied { reason: String },
}

/// Channel sender for delivering outbound messages to one user.
pub type EventSender = mpsc::UnboundedSender<TableOutbound>;

/// One seat at a table: a user plus their outbound channel.
pub struct SeatAssignment {
    pub user_id: UserId,
    pub name: String,
    pub sender: EventSender,
}

/// Commands sent to a table actor through its channel.
///
/// The `oneshot::Sender` in some variants is a reply channel: the
/// caller sends a command and waits for the response on it. Actions
/// are fire-and-forget; a rejection comes back on the player's own
/// event channel as [`TableOutbound::Denied`].
pub(crate) enum TableCommand {
    /// An in-game action from a seated player.
    Act { user_id: UserId, action: Action },

    /// Add a spectator; they receive the full action log as catch-up.
    Spectate {
        user_id: UserId,
        sender: EventSender,
        reply: oneshot::Sender<Result<(), EngineError>>,
    },

    /// Remove a spectator.
    LeaveSpectate { user_id: UserId },

    /// Attach a private note to a card.
    SetNote {
        user_id: UserId,
        order: usize,
        note: String,
    },

    /// Mark a seated player's connection as live or dropped.
    SetPresence { user_id: UserId, present: bool },

    /// Request a metadata snapshot.
    GetInfo { reply: oneshot::Sender<TableInfo> },

    /// Tear the table down.
    Shutdown,
}

/// A snapshot of table metadata (not the hidden game state).
#[derive(Debug, Clone)]
pub struct TableInfo {
    pub game_id: GameId,
    pub turn_num: u32,
    pub active_seat: usize,
    pub score: u32,
    pub strikes: u8,
    pub clue_num: u8,
    pub deck_remaining: usize,
    pub finished: bool,
    pub spectator_count: usize,
}

/// Handle to a running table actor.
///
/// Cheap to clone — it's just an `mpsc::Sender` wrapper. The
/// `GameRegistry` holds one of these per game.
#[derive(Clone)]
pub struct TableHandle {
    game_id: GameId,
    sender: mpsc::Sender<TableCommand>,
}

impl TableHandle {
    pub fn game_id(&self) -> GameId {
        self.game_id
    }

    /// Submits an in-game action (fire-and-forget).
    pub async fn act(&self, user_id: UserId, action: Action) -> Result<(), EngineError> {
        self.sender
            .send(TableCommand::Act { user_id, action })
            .await
            .map_err(|_| EngineError::Unavailable(self.game_id))
    }

    /// Registers a spectator and waits for the catch-up to be queued.
    pub async fn spectate(
        &self,
        user_id: UserId,
        sender: EventSender,
    ) -> Result<(), EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(TableCommand::Spectate {
                user_id,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| EngineError::Unavailable(self.game_id))?;
        reply_rx
            .await
            .map_err(|_| EngineError::Unavailable(self.game_id))?
    }

    pub async fn leave_spectate(&self, user_id: UserId) -> Result<(), EngineError> {
        self.sender
            .send(TableCommand::LeaveSpectate { user_id })
            .await
            .map_err(|_| EngineError::Unavailable(self.game_id))
    }

    /// Stores a private note against a card order.
    pub async fn set_note(
        &self,
        user_id: UserId,
        order: usize,
        note: String,
    ) -> Result<(), EngineError> {
        self.sender
            .send(TableCommand::SetNote {
                user_id,
                order,
                note,
            })
            .await
            .map_err(|_| EngineError::Unavailable(self.game_id))
    }

    pub async fn set_presence(&self, user_id: UserId, present: bool) -> Result<(), EngineError> {
        self.sender
            .send(TableCommand::SetPresence { user_id, present })
            .await
            .map_err(|_| EngineError::Unavailable(self.game_id))
    }

    pub async fn info(&self) -> Result<TableInfo, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(TableCommand::GetInfo { reply: reply_tx })
            .await
            .map_err(|_| EngineError::Unavailable(self.game_id))?;
        reply_rx
            .await
            .map_err(|_| EngineError::Unavailable(self.game_id))
    }

    pub async fn shutdown(&self) -> Result<(), EngineError> {
        self.sender
            .send(TableCommand::Shutdown)
            .await
            .map_err(|_| EngineError::Unavailable(self.game_id))
    }
}

/// What woke the actor loop.
enum Wake {
    Command(Option<TableCommand>),
    Deadline(TimedOut),
}

/// The internal table actor state. Runs inside a Tokio task.
struct TableActor<S: GameStore> {
    game_id: GameId,
    state: GameState,
    /// Outbound channels of seated players.
    senders: HashMap<UserId, EventSender>,
    spectators: HashMap<UserId, EventSender>,
    timer: TurnTimer,
    store: Arc<S>,
    finished: bool,
}

impl<S: GameStore> TableActor<S> {
    async fn run(mut self, mut receiver: mpsc::Receiver<TableCommand>) {
        tracing::info!(
            game_id = %self.game_id,
            players = self.state.players.len(),
            variant = ?self.state.config.variant,
            "table started"
        );

        self.announce_start();
        self.arm_timer();

        loop {
            let wake = tokio::select! {
                cmd = receiver.recv() => Wake::Command(cmd),
                fired = self.timer.expired() => Wake::Deadline(fired),
            };

            match wake {
                Wake::Command(Some(TableCommand::Act { user_id, action })) => {
                    self.handle_act(user_id, action).await;
                }
                Wake::Command(Some(TableCommand::Spectate {
                    user_id,
                    sender,
                    reply,
                })) => {
                    let _ = reply.send(self.handle_spectate(user_id, sender));
                }
                Wake::Command(Some(TableCommand::LeaveSpectate { user_id })) => {
                    self.spectators.remove(&user_id);
                }
                Wake::Command(Some(TableCommand::SetNote {
                    user_id,
                    order,
                    note,
                })) => {
                    self.handle_set_note(user_id, order, note);
                }
                Wake::Command(Some(TableCommand::SetPresence { user_id, present })) => {
                    self.handle_set_presence(user_id, present);
                }
                Wake::Command(Some(TableCommand::GetInfo { reply })) => {
                    let _ = reply.send(self.info());
                }
                Wake::Command(Some(TableCommand::Shutdown)) | Wake::Command(None) => {
                    tracing::info!(game_id = %self.game_id, "table shutting down");
                    break;
                }
                Wake::Deadline(fired) => {
                    self.handle_timeout(fired).await;
                }
            }
        }

        tracing::info!(game_id = %self.game_id, "table stopped");
    }

    /// Replays the deal to every seat (scrubbed) and announces the
    /// first turn.
    fn announce_start(&mut self) {
        let deal = self.state.actions.clone();
        for event in &deal {
            self.send_all(event);
        }

        let turn = GameEvent::Turn {
            num: self.state.turn_num,
            who: self.state.turn_player_index,
        };
        self.state.actions.push(turn.clone());
        self.send_all(&turn);
        self.send_all(&self.clock_event(Some(self.state.turn_player_index)));
    }

    async fn handle_act(&mut self, user_id: UserId, action: Action) {
        if self.finished {
            self.deny(user_id, "the game is over");
            return;
        }
        let Some(seat) = self.state.seat_of(user_id) else {
            tracing::warn!(game_id = %self.game_id, %user_id, "action from non-player");
            self.deny(user_id, "you are not seated at this game");
            return;
        };

        match action::apply(&mut self.state, seat, TurnAction::Player(action)) {
            Ok(outcome) => self.resolve(outcome).await,
            Err(rejection) => {
                tracing::debug!(
                    game_id = %self.game_id,
                    %user_id,
                    %rejection,
                    "action rejected"
                );
                self.deny(user_id, &rejection.to_string());
            }
        }
    }

    async fn handle_timeout(&mut self, fired: TimedOut) {
        if self.finished {
            return;
        }
        // A stale deadline: the player acted while it was in flight.
        if fired.turn != self.state.turn_num {
            return;
        }

        let seat = self.state.turn_player_index;
        tracing::info!(
            game_id = %self.game_id,
            player = %self.state.players[seat].name,
            turn = fired.turn,
            "turn clock expired"
        );
        match action::apply(&mut self.state, seat, TurnAction::Timeout) {
            Ok(outcome) => self.resolve(outcome).await,
            Err(rejection) => {
                tracing::error!(game_id = %self.game_id, %rejection, "timeout not applied");
            }
        }
    }

    /// Fans out a completed turn and either re-arms the timer or runs
    /// the finalization sequence.
    async fn resolve(&mut self, outcome: TurnOutcome) {
        self.dispatch(&outcome.events);
        if let Some(file) = outcome.spectator_sound {
            self.send_spectators(&GameEvent::Sound { file });
        }

        match outcome.verdict {
            Verdict::Continue => self.arm_timer(),
            Verdict::Over { score, loss } => self.finish(score, loss).await,
        }
    }

    /// Arms the turn timer for the player now on turn. Untimed games
    /// never arm it.
    fn arm_timer(&mut self) {
        if !self.state.config.timed || self.finished {
            return;
        }
        let remaining = self.state.current_player().time_remaining_ms.max(0) as u64;
        self.timer
            .arm(self.state.turn_num, Duration::from_millis(remaining));
    }

    /// Runs the end-of-game sequence once: finishing times, the
    /// game-over event, clock teardown, hand reveals, persistence.
    async fn finish(&mut self, score: u32, loss: bool) {
        self.finished = true;
        self.timer.disarm();

        let timed = self.state.config.timed;
        let finishing: Vec<String> = self
            .state
            .players
            .iter()
            .map(|p| {
                let mut seconds = div_ceil_ms(p.time_remaining_ms);
                if !timed {
                    seconds = -seconds;
                }
                format!(
                    "{} finished with a time of {}",
                    p.name,
                    time_display(seconds)
                )
            })
            .collect();
        for text in finishing {
            tracing::info!(game_id = %self.game_id, "{text}");
            let event = GameEvent::Text { text };
            self.state.actions.push(event.clone());
            self.send_all(&event);
        }

        let over = GameEvent::GameOver { score, loss };
        self.state.actions.push(over.clone());
        self.send_all(&over);

        // An inactive clock tells clients to stop their timers.
        self.send_all(&self.clock_event(None));

        // Each player finally learns what they were holding.
        for (seat, player) in self.state.players.iter().enumerate() {
            for &order in &player.hand {
                let card = self.state.deck[order];
                self.send_to(
                    player.user_id,
                    seat,
                    &GameEvent::Reveal {
                        who: seat,
                        order,
                        suit: card.suit,
                        rank: card.rank,
                    },
                );
            }
        }

        let completed = CompletedGame {
            game_id: self.game_id,
            variant: self.state.config.variant,
            timed,
            seed: self.state.seed,
            score,
            loss,
            roster: self.state.players.iter().map(|p| p.user_id).collect(),
            actions: self.state.actions.clone(),
        };
        persist_completed(self.store.as_ref(), &completed).await;

        tracing::info!(game_id = %self.game_id, score, loss, "game ended");
    }

    fn handle_spectate(
        &mut self,
        user_id: UserId,
        sender: EventSender,
    ) -> Result<(), EngineError> {
        if !self.state.config.allow_spectators {
            return Err(EngineError::InvalidState(
                "spectators are not allowed at this table".to_string(),
            ));
        }
        if self.state.seat_of(user_id).is_some() {
            return Err(EngineError::InvalidState(
                "seated players cannot spectate".to_string(),
            ));
        }

        // Catch-up: the full unscrubbed log, so the spectator sees
        // every hand.
        for event in &self.state.actions {
            let _ = sender.send(TableOutbound::Event(event.clone()));
        }
        self.spectators.insert(user_id, sender);
        tracing::info!(
            game_id = %self.game_id,
            %user_id,
            spectators = self.spectators.len(),
            "spectator joined"
        );
        Ok(())
    }

    fn handle_set_note(&mut self, user_id: UserId, order: usize, note: String) {
        let Some(seat) = self.state.seat_of(user_id) else {
            tracing::warn!(game_id = %self.game_id, %user_id, "note from non-player");
            return;
        };
        if order >= self.state.deck_index {
            // Notes only attach to cards already drawn.
            return;
        }
        self.state.set_note(seat, order, note);
    }

    fn handle_set_presence(&mut self, user_id: UserId, present: bool) {
        let Some(seat) = self.state.seat_of(user_id) else {
            return;
        };
        self.state.players[seat].present = present;
        tracing::debug!(game_id = %self.game_id, %user_id, present, "presence changed");
    }

    /// Dispatches a turn's event fan-out to the correct recipients.
    fn dispatch(&self, events: &[(Recipient, GameEvent)]) {
        for (recipient, event) in events {
            match recipient {
                Recipient::All => self.send_all(event),
                Recipient::Player(user_id) => {
                    if let Some(seat) = self.state.seat_of(*user_id) {
                        self.send_to(*user_id, seat, event);
                    }
                }
                Recipient::AllExcept(excluded) => {
                    for (seat, player) in self.state.players.iter().enumerate() {
                        if player.user_id != *excluded {
                            self.send_to(player.user_id, seat, event);
                        }
                    }
                    self.send_spectators(event);
                }
            }
        }
    }

    /// Sends to every seat (scrubbed per seat) and every spectator
    /// (raw).
    fn send_all(&self, event: &GameEvent) {
        for (seat, player) in self.state.players.iter().enumerate() {
            self.send_to(player.user_id, seat, event);
        }
        self.send_spectators(event);
    }

    /// Sends one event to one seat, scrubbed for that seat. Silently
    /// drops if the receiver is gone (player disconnected).
    fn send_to(&self, user_id: UserId, seat: usize, event: &GameEvent) {
        if let Some(sender) = self.senders.get(&user_id) {
            let _ = sender.send(TableOutbound::Event(event.scrubbed(seat)));
        }
    }

    fn send_spectators(&self, event: &GameEvent) {
        for sender in self.spectators.values() {
            let _ = sender.send(TableOutbound::Event(event.clone()));
        }
    }

    /// Bounces a denial back to whoever sent a bad command.
    fn deny(&self, user_id: UserId, reason: &str) {
        let sender = self
            .senders
            .get(&user_id)
            .or_else(|| self.spectators.get(&user_id));
        if let Some(sender) = sender {
            let _ = sender.send(TableOutbound::Denied {
                reason: reason.to_string(),
            });
        }
    }

    fn clock_event(&self, active: Option<usize>) -> GameEvent {
        GameEvent::Clock {
            times: self
                .state
                .players
                .iter()
                .map(|p| p.time_remaining_ms)
                .collect(),
            active,
        }
    }

    fn info(&self) -> TableInfo {
        TableInfo {
            game_id: self.game_id,
            turn_num: self.state.turn_num,
            active_seat: self.state.turn_player_index,
            score: self.state.score,
            strikes: self.state.strikes,
            clue_num: self.state.clue_num,
            deck_remaining: self.state.deck_remaining(),
            finished: self.finished,
            spectator_count: self.spectators.len(),
        }
    }
}

/// Ceiling division of milliseconds into whole seconds, keeping the
/// sign for untimed clocks.
fn div_ceil_ms(ms: i64) -> i64 {
    (ms as f64 / 1000.0).ceil() as i64
}

/// Formats whole seconds as `m:ss`.
fn time_display(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Spawns a table actor for a freshly dealt game and returns a handle
/// to communicate with it.
///
/// `channel_size` controls backpressure — if the command channel fills
/// up, senders wait.
pub(crate) fn spawn_table<S: GameStore>(
    game_id: GameId,
    config: GameConfig,
    seats: Vec<SeatAssignment>,
    seed: u64,
    store: Arc<S>,
    channel_size: usize,
) -> Result<TableHandle, EngineError> {
    let roster: Vec<(UserId, String)> = seats
        .iter()
        .map(|s| (s.user_id, s.name.clone()))
        .collect();
    let state = GameState::new(config, roster, seed)?;
    let senders: HashMap<UserId, EventSender> =
        seats.into_iter().map(|s| (s.user_id, s.sender)).collect();

    let (tx, rx) = mpsc::channel(channel_size);
    let actor = TableActor {
        game_id,
        state,
        senders,
        spectators: HashMap::new(),
        timer: TurnTimer::new(),
        store,
        finished: false,
    };
    tokio::spawn(actor.run(rx));

    Ok(TableHandle {
        game_id,
        sender: tx,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_display_pads_seconds() {
        assert_eq!(time_display(0), "0:00");
        assert_eq!(time_display(5), "0:05");
        assert_eq!(time_display(65), "1:05");
        assert_eq!(time_display(600), "10:00");
    }

    #[test]
    fn test_div_ceil_ms_rounds_toward_positive() {
        assert_eq!(div_ceil_ms(0), 0);
        assert_eq!(div_ceil_ms(1), 1);
        assert_eq!(div_ceil_ms(999), 1);
        assert_eq!(div_ceil_ms(1000), 1);
        assert_eq!(div_ceil_ms(1001), 2);
        // Negative thinking time in untimed games rounds toward zero.
        assert_eq!(div_ceil_ms(-1500), -1);
    }
}
