use memory_match_client::{Difficulty, GameService, MemoryMatchClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Create a client connecting to the server
    let client = MemoryMatchClient::new("http://localhost:5000")?;

    // Create a new game; the session cookie identifies it from now on
    client.new_game("Demo", Difficulty::Easy).await?;
    println!(
        "Created game, high scores at {}",
        client.high_scores_page(Difficulty::Easy)?
    );

    let Some(state) = client.get_game_state().await? else {
        println!("Server did not keep the game");
        return Ok(());
    };
    println!(
        "{} has {} cards, {}/{} pairs found",
        state.player_name,
        state.cards.len(),
        state.matched_pairs,
        state.total_pairs
    );

    // Flip the first two cards
    for card in state.cards.iter().take(2) {
        let response = client.flip_card(card.id).await?;
        println!(
            "Flipped card {}: match {}, attempts {}, time {}s",
            card.id, response.is_match, response.attempts, response.elapsed_time
        );
    }

    // Turn unmatched cards back
    let reset = client.reset_unmatched().await?;
    println!("Reset succeeded: {}", reset.success);

    // Look at the face-up cards the server reports now
    if let Some(state) = client.get_game_state().await? {
        for card in state.active_cards() {
            println!("  Card {} is still face up: {}", card.id, card.value);
        }
        println!("Elapsed time: {}s", state.elapsed_time);
    }

    // A score is only accepted once the game is completed
    match client.save_score().await {
        Ok(response) => println!("Saved: {:?}", response),
        Err(e) => println!("Save refused: {}", e),
    }

    Ok(())
}
