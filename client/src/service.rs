use async_trait::async_trait;
use memory_match_common::{
    models::{CardId, Difficulty, GameSnapshot},
    protocol::{FlipResponse, HighScoresResponse, ResetResponse, SaveScoreResponse},
};

use crate::error::ServiceError;

/// Operations of the authoritative game service.
///
/// The service owns the deck, validates matches, keeps score and stores high
/// scores. [`MemoryMatchClient`](crate::MemoryMatchClient) speaks to it over
/// HTTP; tests plug in an in-memory implementation.
#[async_trait]
pub trait GameService: Send + Sync + 'static {
    /// Current game state, or `None` when no game is in progress
    async fn get_game_state(&self) -> Result<Option<GameSnapshot>, ServiceError>;

    async fn flip_card(&self, card_id: CardId) -> Result<FlipResponse, ServiceError>;

    async fn reset_unmatched(&self) -> Result<ResetResponse, ServiceError>;

    async fn save_score(&self) -> Result<SaveScoreResponse, ServiceError>;

    /// Setup flow: replace whatever game is in progress with a fresh one
    async fn new_game(&self, player_name: &str, difficulty: Difficulty)
    -> Result<(), ServiceError>;

    async fn high_scores(&self, difficulty: Difficulty)
    -> Result<HighScoresResponse, ServiceError>;
}
