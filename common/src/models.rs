use std::{collections::HashSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type CardId = u32;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    #[serde(rename = "easy")]
    Easy,
    #[default]
    #[serde(rename = "normal")]
    Normal,
    #[serde(rename = "hard")]
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard];

    /// Number of pairs the service deals for this difficulty
    pub fn pairs(self) -> usize {
        match self {
            Difficulty::Easy => 6,
            Difficulty::Normal => 8,
            Difficulty::Hard => 12,
        }
    }

    /// Cards per row on the board
    pub fn columns(self) -> usize {
        match self {
            Difficulty::Easy | Difficulty::Normal => 4,
            Difficulty::Hard => 6,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown difficulty: {0}")]
pub struct UnknownDifficulty(pub String);

impl FromStr for Difficulty {
    type Err = UnknownDifficulty;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "normal" => Ok(Difficulty::Normal),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(UnknownDifficulty(value.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub value: String,
    pub is_flipped: bool,
    pub is_matched: bool,
}

impl Card {
    /// Face up but not yet part of a matched pair
    pub fn is_active(&self) -> bool {
        self.is_flipped && !self.is_matched
    }

    /// Whether a click on this card may turn into a flip request
    pub fn is_eligible(&self) -> bool {
        !self.is_flipped && !self.is_matched
    }
}

/// Authoritative game state as reported by the service.
///
/// A snapshot is replaced wholesale on every fetch; `cards` keeps the board
/// layout order for the whole game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub player_name: String,
    pub difficulty: Difficulty,
    #[serde(rename = "time", with = "elapsed")]
    pub elapsed_time: u64,
    pub attempts: u32,
    pub matched_pairs: u32,
    pub total_pairs: u32,
    pub is_completed: bool,
    /// Reported as 0 until the game is completed
    #[serde(default)]
    pub score: u32,
    pub cards: Vec<Card>,
}

impl GameSnapshot {
    pub fn card(&self, id: CardId) -> Option<&Card> {
        self.cards.iter().find(|card| card.id == id)
    }

    pub fn card_mut(&mut self, id: CardId) -> Option<&mut Card> {
        self.cards.iter_mut().find(|card| card.id == id)
    }

    /// Cards currently flipped but unmatched, in board order
    pub fn active_cards(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter().filter(|card| card.is_active())
    }

    pub fn active_count(&self) -> usize {
        self.active_cards().count()
    }

    pub fn matched_count(&self) -> usize {
        self.cards.iter().filter(|card| card.is_matched).count()
    }

    pub fn final_score(&self) -> Option<u32> {
        self.is_completed.then_some(self.score)
    }

    /// Check every invariant a renderable snapshot must satisfy
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.total_pairs == 0 {
            return Err(SnapshotError::NoPairs);
        }

        if self.cards.len() != self.total_pairs as usize * 2 {
            return Err(SnapshotError::DeckSize {
                cards: self.cards.len(),
                total_pairs: self.total_pairs,
            });
        }

        let mut seen = HashSet::with_capacity(self.cards.len());
        for card in &self.cards {
            if !seen.insert(card.id) {
                return Err(SnapshotError::DuplicateCard(card.id));
            }
            if card.is_matched && !card.is_flipped {
                return Err(SnapshotError::MatchedFaceDown(card.id));
            }
        }

        if self.matched_pairs > self.total_pairs {
            return Err(SnapshotError::TooManyMatched {
                matched_pairs: self.matched_pairs,
                total_pairs: self.total_pairs,
            });
        }

        let matched_cards = self.matched_count();
        if matched_cards != self.matched_pairs as usize * 2 {
            return Err(SnapshotError::MatchedCountMismatch {
                matched_cards,
                matched_pairs: self.matched_pairs,
            });
        }

        let active = self.active_count();
        if active > 2 {
            return Err(SnapshotError::TooManyActive(active));
        }

        if self.is_completed && self.matched_pairs != self.total_pairs {
            return Err(SnapshotError::PrematureCompletion {
                matched_pairs: self.matched_pairs,
                total_pairs: self.total_pairs,
            });
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("snapshot has no pairs")]
    NoPairs,
    #[error("deck holds {cards} cards for {total_pairs} pairs")]
    DeckSize { cards: usize, total_pairs: u32 },
    #[error("card id {0} appears more than once")]
    DuplicateCard(CardId),
    #[error("card {0} is matched but face down")]
    MatchedFaceDown(CardId),
    #[error("{matched_pairs} matched pairs exceed {total_pairs} total pairs")]
    TooManyMatched { matched_pairs: u32, total_pairs: u32 },
    #[error("{matched_cards} matched cards do not account for {matched_pairs} matched pairs")]
    MatchedCountMismatch {
        matched_cards: usize,
        matched_pairs: u32,
    },
    #[error("{0} unmatched cards are face up at once")]
    TooManyActive(usize),
    #[error("game completed with only {matched_pairs} of {total_pairs} pairs")]
    PrematureCompletion { matched_pairs: u32, total_pairs: u32 },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub player_name: String,
    pub score: u32,
    /// Game duration in whole seconds
    #[serde(rename = "time")]
    pub duration: u64,
    pub attempts: u32,
    pub date: String,
}

/// Elapsed time on the wire: `MM:SS` text, or plain seconds.
pub mod elapsed {
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seconds(u64),
        Text(String),
    }

    pub fn format(seconds: u64) -> String {
        format!("{:02}:{:02}", seconds / 60, seconds % 60)
    }

    pub fn parse(text: &str) -> Option<u64> {
        let (minutes, seconds) = text.trim().split_once(':')?;
        let minutes: u64 = minutes.parse().ok()?;
        let seconds: u64 = seconds.parse().ok()?;
        if seconds >= 60 {
            return None;
        }
        Some(minutes * 60 + seconds)
    }

    pub fn serialize<S: Serializer>(seconds: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(*seconds))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Seconds(seconds) => Ok(seconds),
            Raw::Text(text) => parse(&text)
                .ok_or_else(|| D::Error::custom(format!("invalid elapsed time: {text:?}"))),
        }
    }
}
