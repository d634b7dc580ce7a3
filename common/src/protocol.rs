use serde::{Deserialize, Serialize};

use crate::models::{CardId, Difficulty, GameSnapshot, HighScoreEntry, elapsed};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlipRequest {
    pub card_id: CardId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlipResponse {
    pub success: bool,
    #[serde(default)]
    pub is_match: bool,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub matched_pairs: u32,
    #[serde(rename = "time", with = "elapsed", default)]
    pub elapsed_time: u64,
    #[serde(default)]
    pub score: u32,
}

impl FlipResponse {
    pub fn final_score(&self) -> Option<u32> {
        self.is_completed.then_some(self.score)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveScoreResponse {
    pub success: bool,
    #[serde(default)]
    pub score: Option<u32>,
    #[serde(default)]
    pub player_name: Option<String>,
}

/// Body of a 4xx reply from the service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Form posted by the setup flow to create a game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGameForm {
    pub player_name: String,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScoresResponse {
    pub difficulty: Difficulty,
    pub high_scores: Vec<HighScoreEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoGame {
    #[serde(default)]
    pub error: Option<String>,
}

/// Reply to a state fetch: either a game in progress or nothing to show
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GameStateResponse {
    InProgress(GameSnapshot),
    NoGame(NoGame),
}

impl GameStateResponse {
    /// A snapshot without a player name is treated as "no game"
    pub fn into_snapshot(self) -> Option<GameSnapshot> {
        match self {
            GameStateResponse::InProgress(snapshot) if !snapshot.player_name.is_empty() => {
                Some(snapshot)
            }
            _ => None,
        }
    }
}
