use memory_match_common::models::{CardId, elapsed};

use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardFace {
    Hidden,
    Revealed,
    Matched,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardView {
    pub id: CardId,
    pub face: CardFace,
    /// Symbol on the card, absent while it is face down
    pub value: Option<String>,
}

/// Read-only projection of the session for a renderer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardView {
    pub player_name: String,
    pub difficulty: &'static str,
    pub columns: usize,
    pub time: String,
    pub attempts: u32,
    pub matched_pairs: u32,
    pub total_pairs: u32,
    pub cards: Vec<CardView>,
    /// Clicks are currently no-ops
    pub input_locked: bool,
    pub completed: bool,
}

impl BoardView {
    pub(crate) fn project(session: &Session) -> Self {
        let snapshot = &session.snapshot;
        let pending = session.phase.pending_match();

        let cards = snapshot
            .cards
            .iter()
            .map(|card| {
                let pending_match = pending.is_some_and(|pair| pair.contains(&card.id));
                let face = if card.is_matched && !pending_match {
                    CardFace::Matched
                } else if card.is_flipped {
                    CardFace::Revealed
                } else {
                    CardFace::Hidden
                };

                CardView {
                    id: card.id,
                    face,
                    value: (face != CardFace::Hidden).then(|| card.value.clone()),
                }
            })
            .collect();

        Self {
            player_name: snapshot.player_name.clone(),
            difficulty: snapshot.difficulty.label(),
            columns: snapshot.difficulty.columns(),
            time: elapsed::format(snapshot.elapsed_time),
            attempts: snapshot.attempts,
            matched_pairs: snapshot.matched_pairs,
            total_pairs: snapshot.total_pairs,
            cards,
            input_locked: !session.accepts_input(),
            completed: snapshot.is_completed,
        }
    }

    pub fn card(&self, id: CardId) -> Option<&CardView> {
        self.cards.iter().find(|card| card.id == id)
    }

    /// Cards grouped into board rows
    pub fn rows(&self) -> impl Iterator<Item = &[CardView]> {
        self.cards.chunks(self.columns.max(1))
    }
}
