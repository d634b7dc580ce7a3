use std::collections::HashMap;

use memory_match_client::{
    BoardView, CardFace, CardId, ClientConfig, Difficulty, GameEvent, MemoryMatchGame,
};
use tokio::time::{Duration, sleep};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Server URL and timings come from MEMORY_MATCH_* variables
    let game = MemoryMatchGame::from_config(ClientConfig::from_env())?;

    // Subscribe to game events for background listening
    let mut event_receiver = game.subscribe_to_events().await;

    let event_handler = tokio::spawn(async move {
        while let Some(event) = event_receiver.recv().await {
            match event {
                GameEvent::GameLoaded {
                    player_name,
                    difficulty,
                    total_pairs,
                } => {
                    println!(
                        "🎮 {} is playing {} with {} pairs",
                        player_name,
                        difficulty.label(),
                        total_pairs
                    );
                }
                GameEvent::CountersUpdated {
                    attempts,
                    matched_pairs,
                    ..
                } => {
                    println!("📋 Attempts: {}, pairs: {}", attempts, matched_pairs);
                }
                GameEvent::PairMatched { first, second } => {
                    println!("✅ Cards {} and {} matched", first, second);
                }
                GameEvent::PairHidden { first, second } => {
                    println!("🙈 Cards {} and {} turned back", first, second);
                }
                GameEvent::GameCompleted(summary) => {
                    println!(
                        "🎉 Done in {} with {} attempts, score {}",
                        summary.formatted_time(),
                        summary.attempts,
                        summary.score
                    );
                }
                GameEvent::ScoreSaved { score } => {
                    println!("💾 Score saved: {:?}", score);
                }
                GameEvent::ReturnedToSetup => {
                    println!("👋 Back to setup");
                    break;
                }
                GameEvent::BoardUpdated | GameEvent::ClockTick { .. } => {}
            }
        }
    });

    game.start_game("Demo", Difficulty::Easy).await?;

    // Remember every face we have seen and play until the game is over
    let mut seen: HashMap<CardId, String> = HashMap::new();

    while game.summary().await.is_none() {
        let Some(board) = game.board().await else {
            break;
        };
        remember(&board, &mut seen);

        if board.input_locked {
            sleep(Duration::from_millis(100)).await;
            continue;
        }

        let Some(card_id) = next_card(&board, &seen) else {
            sleep(Duration::from_millis(100)).await;
            continue;
        };
        println!("Flipping card {}: {:?}", card_id, game.flip(card_id).await);
    }

    if let Some(board) = game.board().await {
        display_board(&board);
    }

    game.save_score().await?;

    let table = game.high_scores(Difficulty::Easy).await?;
    println!("\nHigh scores ({}):", table.difficulty.label());
    for (rank, entry) in table.high_scores.iter().enumerate() {
        println!(
            "  {:2}. {:<16} {:>5}  {}  {} attempts",
            rank + 1,
            entry.player_name,
            entry.score,
            memory_match_client::elapsed::format(entry.duration),
            entry.attempts
        );
    }

    game.restart().await;
    let _ = event_handler.await;

    Ok(())
}

fn remember(board: &BoardView, seen: &mut HashMap<CardId, String>) {
    for card in &board.cards {
        if let Some(value) = &card.value {
            seen.insert(card.id, value.clone());
        }
    }
}

/// Pick the partner of a face-up card when we know it, otherwise a card we
/// have not seen yet
fn next_card(board: &BoardView, seen: &HashMap<CardId, String>) -> Option<CardId> {
    let hidden: Vec<CardId> = board
        .cards
        .iter()
        .filter(|c| c.face == CardFace::Hidden)
        .map(|c| c.id)
        .collect();

    let face_up = board.cards.iter().find(|c| c.face == CardFace::Revealed);
    if let Some(value) = face_up.and_then(|c| c.value.as_ref()) {
        let partner = hidden
            .iter()
            .find(|id| seen.get(*id) == Some(value))
            .or_else(|| hidden.iter().find(|id| !seen.contains_key(*id)));
        return partner.copied();
    }

    for (i, a) in hidden.iter().enumerate() {
        if let Some(value) = seen.get(a)
            && hidden[i + 1..].iter().any(|b| seen.get(b) == Some(value))
        {
            return Some(*a);
        }
    }

    hidden
        .iter()
        .find(|id| !seen.contains_key(*id))
        .or(hidden.first())
        .copied()
}

fn display_board(board: &BoardView) {
    println!(
        "\n{} ({}) - time {}, attempts {}, pairs {}/{}",
        board.player_name,
        board.difficulty,
        board.time,
        board.attempts,
        board.matched_pairs,
        board.total_pairs
    );
    for row in board.rows() {
        print!("  ");
        for card in row {
            let symbol = match card.face {
                CardFace::Hidden => "·".to_string(),
                CardFace::Revealed | CardFace::Matched => card.value.clone().unwrap_or_default(),
            };
            print!("{:>4}", symbol);
        }
        println!();
    }
}
