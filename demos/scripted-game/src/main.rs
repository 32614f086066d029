//! A scripted three-player game driven entirely through the public
//! engine API.
//!
//! Three naive bots each play their oldest card every turn, tracking
//! their hands the way a real client would: from the `Draw`, `Played`,
//! and `Discard` events arriving on their own channels (a bot never
//! sees its own cards' identities, only their deck orders). The game
//! log lines are printed as they happen; random plays usually strike
//! out within a dozen turns.
//!
//! Run with `RUST_LOG=info cargo run -p scripted-game` to also see the
//! engine's structured logs.

use std::sync::Arc;

use embers_engine::{GameConfig, GameRegistry, MemoryStore, SeatAssignment, TableOutbound};
use embers_protocol::{Action, GameEvent, UserId};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

const PLAYERS: u64 = 3;
const SEED: u64 = 2026;
const MAX_TURNS: u32 = 200;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let store = Arc::new(MemoryStore::new());
    let mut registry = GameRegistry::new(Arc::clone(&store));

    let mut seats = Vec::new();
    let mut receivers = Vec::new();
    for i in 0..PLAYERS {
        let (tx, rx) = mpsc::unbounded_channel();
        seats.push(SeatAssignment {
            user_id: UserId(i),
            name: format!("bot{i}"),
            sender: tx,
        });
        receivers.push(rx);
    }

    let game_id = registry.create_game(GameConfig::default(), seats, SEED)?;
    println!("== game {game_id} (seed {SEED}) ==");

    // Each bot's view of its own hand: deck orders only.
    let mut hands: Vec<Vec<usize>> = vec![Vec::new(); PLAYERS as usize];

    loop {
        let info = registry.info(game_id).await?;

        // Fold everything delivered so far into the bots' hand views,
        // printing the human-readable log as it goes by.
        for (seat, rx) in receivers.iter_mut().enumerate() {
            while let Ok(msg) = rx.try_recv() {
                let TableOutbound::Event(event) = msg else {
                    continue;
                };
                match &event {
                    GameEvent::Draw { who, order, .. } if *who == seat => {
                        hands[seat].push(*order);
                    }
                    GameEvent::Played { who, order, .. }
                    | GameEvent::Discard { who, order, .. }
                        if *who == seat =>
                    {
                        hands[seat].retain(|&o| o != *order);
                    }
                    GameEvent::Reorder { who, hand } if *who == seat => {
                        hands[seat] = hand.clone();
                    }
                    _ => {}
                }
                // Seat 0's channel doubles as the console feed.
                if seat == 0 {
                    match &event {
                        GameEvent::Text { text } => println!("  {text}"),
                        GameEvent::Status { clues, score } => {
                            println!("    [clues {clues}, score {score}]")
                        }
                        GameEvent::GameOver { .. } => {
                            println!("{}", serde_json::to_string(&event)?)
                        }
                        _ => {}
                    }
                }
            }
        }

        if info.finished || info.turn_num >= MAX_TURNS {
            break;
        }

        // The active bot plays its oldest card, sight unseen.
        let seat = info.active_seat;
        let Some(&oldest) = hands[seat].first() else {
            break;
        };
        registry
            .act(game_id, UserId(seat as u64), Action::Play { target: oldest })
            .await?;
    }

    match store.recorded_score(game_id) {
        Some(score) => println!("== final score: {score} =="),
        None => println!("== game did not finish within {MAX_TURNS} turns =="),
    }

    registry.destroy_game(game_id).await?;
    Ok(())
}
