//! The turn-action processor.
//!
//! [`apply`] is the single entry point through which a game advances:
//! it validates one action fully, then mutates the state and produces
//! the ordered event fan-out for that turn. Validation is strictly
//! before mutation — a rejected action leaves the state untouched, so
//! the caller can deny it to the actor and carry on.

use std::time::Instant;

use embers_protocol::{Action, Clue, ClueKind, GameEvent, Recipient, SoundToken};

use crate::config::{MAX_CLUES, MAX_STRIKES};
use crate::endgame::{self, Verdict};
use crate::state::GameState;

/// An illegal action, bounced back to the actor only. The display
/// strings are shown verbatim to the player.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("you cannot perform an action when it is not your turn")]
    NotYourTurn,

    #[error("you cannot give a clue to yourself")]
    SelfClue,

    #[error("you cannot give a clue when you have 0 clues available")]
    NoCluesLeft,

    #[error("that clue is not valid in this variant")]
    InvalidClue,

    #[error("there is no player in that seat")]
    NoSuchSeat,

    #[error("you are not holding that card")]
    CardNotInHand,

    #[error("you cannot discard while at 8 clues")]
    DiscardAtMaxClues,

    #[error("you can only play the deck when exactly 1 card remains")]
    DeckPlayUnavailable,

    #[error("that clue would not touch any cards")]
    EmptyClue,
}

/// What the table actor feeds the processor: either a player's own
/// action or the timeout the server injects when a clock hits zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnAction {
    Player(Action),
    Timeout,
}

/// The result of one successfully applied turn.
#[derive(Debug)]
pub struct TurnOutcome {
    /// Events in emission order, each with its audience. `Draw` events
    /// are unscrubbed here; the dispatcher scrubs per seat.
    pub events: Vec<(Recipient, GameEvent)>,

    pub verdict: Verdict,

    /// Sound cue for spectators (seated players get theirs as
    /// `Recipient::Player` events). `None` once the game is over.
    pub spectator_sound: Option<SoundToken>,
}

/// Validates and applies one turn action for the player in `seat`.
pub fn apply(
    state: &mut GameState,
    seat: usize,
    action: TurnAction,
) -> Result<TurnOutcome, Rejection> {
    if seat != state.turn_player_index {
        return Err(Rejection::NotYourTurn);
    }

    // Full validation up front. For a clue this includes computing the
    // touched set, so an empty clue is rejected before the token is
    // spent.
    let touched_orders = match &action {
        TurnAction::Player(Action::Clue { target, clue }) => {
            let target = *target;
            if target >= state.players.len() {
                return Err(Rejection::NoSuchSeat);
            }
            if target == seat {
                return Err(Rejection::SelfClue);
            }
            if state.clue_num == 0 {
                return Err(Rejection::NoCluesLeft);
            }
            if !state.config.variant.clue_valid(*clue) {
                return Err(Rejection::InvalidClue);
            }
            let touched: Vec<usize> = state.players[target]
                .hand
                .iter()
                .copied()
                .filter(|&order| {
                    let card = state.deck[order];
                    state.config.variant.touches(*clue, card.suit, card.rank)
                })
                .collect();
            if touched.is_empty() {
                tracing::warn!(turn = state.turn_num, "clue touches no cards");
                return Err(Rejection::EmptyClue);
            }
            Some(touched)
        }
        TurnAction::Player(Action::Play { target }) => {
            if !state.players[seat].hand.contains(target) {
                return Err(Rejection::CardNotInHand);
            }
            None
        }
        TurnAction::Player(Action::Discard { target }) => {
            if state.clue_num == MAX_CLUES {
                return Err(Rejection::DiscardAtMaxClues);
            }
            if !state.players[seat].hand.contains(target) {
                return Err(Rejection::CardNotInHand);
            }
            None
        }
        TurnAction::Player(Action::BlindDeckPlay) => {
            if state.deck_index != state.deck.len() - 1 {
                return Err(Rejection::DeckPlayUnavailable);
            }
            None
        }
        TurnAction::Timeout => None,
    };

    let is_timeout = matches!(action, TurnAction::Timeout);
    let mut out: Vec<(Recipient, GameEvent)> = Vec::new();

    // Clear the outcome sound from the previous turn.
    state.sound = None;

    // Chop reorder: when the feature is on and the previous turn
    // discarded, the actor's chop card moves to the newest slot before
    // the action resolves. Plays skip it, the played card's slot is
    // what the player saw when they chose it.
    let reorder_applies = !matches!(
        action,
        TurnAction::Player(Action::Play { .. }) | TurnAction::Player(Action::BlindDeckPlay)
    );
    if state.config.reorder_cards && state.discard_signal_outstanding && reorder_applies {
        let chop = state.chop_index(seat);
        let hand_len = state.players[seat].hand.len();
        if chop != hand_len - 1 {
            let order = state.players[seat].hand.remove(chop);
            state.players[seat].hand.push(order);
            let event = GameEvent::Reorder {
                who: seat,
                hand: state.players[seat].hand.clone(),
            };
            emit(state, &mut out, event);
        }
    }

    match action {
        TurnAction::Player(Action::Clue { target, clue }) => {
            let touched = touched_orders.unwrap_or_default();
            state.clue_num -= 1;
            state.discard_signal_outstanding = false;
            for &order in &touched {
                state.deck[order].touched = true;
            }
            emit(
                state,
                &mut out,
                GameEvent::Clue {
                    giver: seat,
                    target,
                    clue,
                    touched: touched.clone(),
                },
            );
            let text = clue_text(state, seat, target, clue, touched.len());
            emit_text(state, &mut out, text);
        }
        TurnAction::Player(Action::Play { target }) => {
            let slot = state.remove_from_hand(seat, target);
            play_card(state, &mut out, seat, target, slot);
            draw_replacement(state, &mut out, seat);
        }
        TurnAction::Player(Action::Discard { target }) => {
            state.clue_num += 1;
            let slot = state.remove_from_hand(seat, target);
            discard_card(state, &mut out, seat, target, slot, false);
            draw_replacement(state, &mut out, seat);
        }
        TurnAction::Player(Action::BlindDeckPlay) => {
            let order = state.deck.len() - 1;
            draw_replacement(state, &mut out, seat);
            let drawn = state.remove_from_hand(seat, order);
            debug_assert!(drawn.is_some(), "the drawn deck card must be in the hand");
            play_card(state, &mut out, seat, order, None);
        }
        TurnAction::Timeout => {
            state.strikes = MAX_STRIKES;
            state.players[seat].time_remaining_ms = 0;
            let text = format!("{} ran out of time!", state.players[seat].name);
            emit_text(state, &mut out, text);
        }
    }

    emit(
        state,
        &mut out,
        GameEvent::Status {
            clues: state.clue_num,
            score: state.score,
        },
    );

    // Charge thinking time to the actor's clock. A timeout already
    // zeroed it.
    if !is_timeout {
        let elapsed = state.turn_begin.elapsed().as_millis() as i64;
        let extra = state.config.extra_turn_time.as_millis() as i64;
        let player = &mut state.players[seat];
        player.time_remaining_ms -= elapsed;
        if state.config.timed {
            player.time_remaining_ms += extra;
        }
    }
    state.turn_begin = Instant::now();

    state.turn_num += 1;
    state.turn_player_index = (state.turn_player_index + 1) % state.players.len();

    let verdict = endgame::evaluate(state);

    if let Verdict::Over { score, loss } = verdict {
        let text = if loss {
            "Players lose!".to_string()
        } else {
            format!("Players score {score} points")
        };
        emit_text(state, &mut out, text);
    }

    // The turn advances even on a finished game, giving the log a
    // separator before the finishing times.
    emit(
        state,
        &mut out,
        GameEvent::Turn {
            num: state.turn_num,
            who: state.turn_player_index,
        },
    );

    let mut spectator_sound = None;
    if !verdict.is_over() {
        tracing::info!(
            turn = state.turn_num,
            player = %state.current_player().name,
            "turn begins"
        );
        for (i, player) in state.players.iter().enumerate() {
            let file = state.sound.unwrap_or(if i == state.turn_player_index {
                SoundToken::TurnUs
            } else {
                SoundToken::TurnOther
            });
            out.push((
                Recipient::Player(player.user_id),
                GameEvent::Sound { file },
            ));
        }
        spectator_sound = Some(state.sound.unwrap_or(SoundToken::TurnOther));
        out.push((
            Recipient::All,
            GameEvent::Clock {
                times: state.players.iter().map(|p| p.time_remaining_ms).collect(),
                active: Some(state.turn_player_index),
            },
        ));
    }

    Ok(TurnOutcome {
        events: out,
        verdict,
        spectator_sound,
    })
}

/// Appends a loggable event to both the action log and the fan-out.
fn emit(state: &mut GameState, out: &mut Vec<(Recipient, GameEvent)>, event: GameEvent) {
    state.actions.push(event.clone());
    out.push((Recipient::All, event));
}

fn emit_text(state: &mut GameState, out: &mut Vec<(Recipient, GameEvent)>, text: String) {
    tracing::info!("{text}");
    emit(state, out, GameEvent::Text { text });
}

/// Draws the actor's replacement card into the fan-out. No-op once the
/// deck is empty.
fn draw_replacement(state: &mut GameState, out: &mut Vec<(Recipient, GameEvent)>, seat: usize) {
    // draw_card logs to the action log itself.
    let draws = state.draw_card(seat);
    out.extend(draws.into_iter().map(|event| (Recipient::All, event)));
}

/// Resolves a card hitting the stacks: a successful play or a strike
/// plus forced discard. `slot` is `None` for the deck blind-play.
fn play_card(
    state: &mut GameState,
    out: &mut Vec<(Recipient, GameEvent)>,
    seat: usize,
    order: usize,
    slot: Option<usize>,
) {
    let card = state.deck[order];
    if card.rank == state.stacks[card.suit as usize] + 1 {
        state.score += 1;
        state.stacks[card.suit as usize] += 1;
        emit(
            state,
            out,
            GameEvent::Played {
                who: seat,
                order,
                suit: card.suit,
                rank: card.rank,
            },
        );

        let mut text = format!(
            "{} plays {} {} from {}",
            state.players[seat].name,
            state.config.variant.suit_name(card.suit),
            card.rank,
            slot_text(slot),
        );
        if !card.touched {
            text.push_str(" (blind)");
            state.sound = Some(SoundToken::Blind);
        }
        emit_text(state, out, text);

        // A completed stack refunds a clue, wasted at the cap.
        if card.rank == 5 && state.clue_num < MAX_CLUES {
            state.clue_num += 1;
        }
    } else {
        state.strikes += 1;
        emit(state, out, GameEvent::Strike { num: state.strikes });
        discard_card(state, out, seat, order, slot, true);
    }
}

fn discard_card(
    state: &mut GameState,
    out: &mut Vec<(Recipient, GameEvent)>,
    seat: usize,
    order: usize,
    slot: Option<usize>,
    failed: bool,
) {
    let card = state.deck[order];
    state.discard_signal_outstanding = true;
    state.deck[order].discarded = true;

    emit(
        state,
        out,
        GameEvent::Discard {
            who: seat,
            order,
            suit: card.suit,
            rank: card.rank,
            failed,
        },
    );

    let verb = if failed {
        state.sound = Some(SoundToken::Fail);
        "fails to play"
    } else {
        "discards"
    };
    let mut text = format!(
        "{} {} {} {} from {}",
        state.players[seat].name,
        verb,
        state.config.variant.suit_name(card.suit),
        card.rank,
        slot_text(slot),
    );
    if !failed && card.touched {
        text.push_str(" (clued)");
    }
    if failed && slot.is_some() && !card.touched {
        text.push_str(" (blind)");
    }
    emit_text(state, out, text);
}

fn slot_text(slot: Option<usize>) -> String {
    match slot {
        Some(n) => format!("slot #{n}"),
        None => "the deck".to_string(),
    }
}

fn clue_text(state: &GameState, giver: usize, target: usize, clue: Clue, count: usize) -> String {
    const WORDS: [&str; 6] = ["", "one", "two", "three", "four", "five"];
    let what = match clue.kind {
        ClueKind::Rank => clue.value.to_string(),
        ClueKind::Color => state.config.variant.clue_color_name(clue.value).to_string(),
    };
    let mut text = format!(
        "{} tells {} about {} {}",
        state.players[giver].name, state.players[target].name, WORDS[count], what,
    );
    if count > 1 {
        text.push('s');
    }
    text
}
