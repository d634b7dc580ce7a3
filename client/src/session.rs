use memory_match_common::{
    models::{CardId, GameSnapshot},
    protocol::FlipResponse,
};

use crate::{
    completion::{Completion, GameSummary, SaveState},
    error::{Error, SyncError},
    heartbeat::PollerHandle,
};

/// Where the active pair stands.
///
/// Input is accepted only in `Idle` and `OneFlipped`; every other phase is
/// the input lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Idle,
    OneFlipped(CardId),
    /// A flip request is outstanding
    Flipping {
        first: Option<CardId>,
        card: CardId,
    },
    /// Matched pair waiting out the match delay
    Resolving { pair: [CardId; 2] },
    /// Mismatched pair waiting to be turned back
    Resetting { pair: [CardId; 2] },
}

impl Phase {
    pub(crate) fn accepts_input(&self) -> bool {
        matches!(self, Phase::Idle | Phase::OneFlipped(_))
    }

    /// Pair the service has matched but the board has not yet shown as matched
    pub(crate) fn pending_match(&self) -> Option<[CardId; 2]> {
        match self {
            Phase::Resolving { pair } => Some(*pair),
            _ => None,
        }
    }
}

/// Why a click did not become a flip request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// No game in progress
    NoGame,
    /// An active pair or a flip request is pending
    Locked,
    /// The card is already face up or matched
    NotEligible,
    UnknownCard,
    /// The game is over
    Completed,
}

/// What an accepted flip turned into
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FlipStep {
    Revealed,
    Matched {
        pair: [CardId; 2],
        score: Option<u32>,
    },
    Mismatched {
        pair: [CardId; 2],
    },
}

/// Result of a heartbeat fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Beat {
    Tick { elapsed_time: u64 },
    /// The service reports completion the session had not seen yet
    Completed(GameSummary),
    /// Older than the clock already shown
    Skipped,
}

/// Everything the controller knows about one game, from load to teardown.
///
/// Snapshots are sequenced at request time; a response is applied only when
/// its sequence number is newer than the last state applied.
#[derive(Debug)]
pub(crate) struct Session {
    pub(crate) generation: u64,
    pub(crate) snapshot: GameSnapshot,
    pub(crate) phase: Phase,
    pub(crate) completion: Completion,
    pub(crate) poller: Option<PollerHandle>,
    next_seq: u64,
    applied_seq: u64,
    clock_seq: u64,
}

impl Session {
    /// The loaded snapshot counts as sequence number 1
    pub(crate) fn new(generation: u64, snapshot: GameSnapshot) -> Self {
        Self {
            generation,
            snapshot,
            phase: Phase::Idle,
            completion: Completion::Pending,
            poller: None,
            next_seq: 1,
            applied_seq: 1,
            clock_seq: 1,
        }
    }

    pub(crate) fn issue_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn check_fresh(&self, seq: u64) -> Result<(), SyncError> {
        if seq <= self.applied_seq {
            return Err(SyncError::Outdated {
                seq,
                applied: self.applied_seq,
            });
        }
        Ok(())
    }

    fn replace(&mut self, seq: u64, snapshot: GameSnapshot) {
        self.snapshot = snapshot;
        self.applied_seq = seq;
        self.clock_seq = self.clock_seq.max(seq);
    }

    /// Replace the held snapshot wholesale with a fetched one
    pub(crate) fn apply_snapshot(
        &mut self,
        seq: u64,
        snapshot: GameSnapshot,
    ) -> Result<GameSnapshot, SyncError> {
        snapshot.validate()?;
        self.check_fresh(seq)?;
        self.replace(seq, snapshot);
        Ok(self.snapshot.clone())
    }

    /// Take only the clock from a heartbeat fetch, unless it reveals a
    /// completion the coordinator has not handled yet.
    pub(crate) fn apply_heartbeat(
        &mut self,
        seq: u64,
        snapshot: GameSnapshot,
    ) -> Result<Beat, SyncError> {
        snapshot.validate()?;

        if snapshot.is_completed && !self.snapshot.is_completed && self.check_fresh(seq).is_ok() {
            self.replace(seq, snapshot);
            if let Some(summary) = self.completion_due() {
                return Ok(Beat::Completed(summary));
            }
            return Ok(Beat::Tick {
                elapsed_time: self.snapshot.elapsed_time,
            });
        }

        if let Some(summary) = self.completion_due() {
            return Ok(Beat::Completed(summary));
        }

        if seq <= self.clock_seq {
            return Ok(Beat::Skipped);
        }
        self.clock_seq = seq;
        self.snapshot.elapsed_time = snapshot.elapsed_time;
        Ok(Beat::Tick {
            elapsed_time: snapshot.elapsed_time,
        })
    }

    /// Summary to hand to the coordinator when the held snapshot shows a
    /// completed game nobody has reported yet. A pending match reports its
    /// own completion once the match delay is over.
    pub(crate) fn completion_due(&self) -> Option<GameSummary> {
        let due = self.snapshot.is_completed
            && self.completion == Completion::Pending
            && self.phase.pending_match().is_none();
        due.then(|| self.summary(self.snapshot.score))
    }

    /// Whether a click on an eligible card would be sent to the service
    pub(crate) fn accepts_input(&self) -> bool {
        self.completion == Completion::Pending
            && !self.snapshot.is_completed
            && self.phase.accepts_input()
            && self.snapshot.active_count() < 2
    }

    /// Engage the input lock for a click, or say why the click is a no-op
    pub(crate) fn begin_flip(&mut self, card_id: CardId) -> Result<u64, IgnoreReason> {
        if !matches!(self.completion, Completion::Pending) || self.snapshot.is_completed {
            return Err(IgnoreReason::Completed);
        }

        let first = match self.phase {
            Phase::Idle => None,
            Phase::OneFlipped(first) => Some(first),
            _ => return Err(IgnoreReason::Locked),
        };

        let card = self
            .snapshot
            .card(card_id)
            .ok_or(IgnoreReason::UnknownCard)?;
        if !card.is_eligible() {
            return Err(IgnoreReason::NotEligible);
        }
        if self.snapshot.active_count() >= 2 {
            return Err(IgnoreReason::Locked);
        }

        self.phase = Phase::Flipping {
            first,
            card: card_id,
        };
        Ok(self.issue_seq())
    }

    /// Drop the lock a rejected flip engaged
    pub(crate) fn cancel_flip(&mut self) {
        if let Phase::Flipping { first, .. } = self.phase {
            self.phase = first.map_or(Phase::Idle, Phase::OneFlipped);
        }
    }

    /// Overlay the authoritative counters of a flip response and move the
    /// active pair to its next phase.
    pub(crate) fn finish_flip(
        &mut self,
        seq: u64,
        card_id: CardId,
        response: &FlipResponse,
    ) -> FlipStep {
        if self.check_fresh(seq).is_ok() {
            let mut overlaid = self.snapshot.clone();
            overlay_flip(&mut overlaid, card_id, response);
            if overlaid.validate().is_ok() {
                self.snapshot = overlaid;
                self.applied_seq = seq;
                self.clock_seq = self.clock_seq.max(seq);
            }
        }

        // The held snapshot may predate this flip, so the pair comes from
        // the clicks themselves
        let first = match self.phase {
            Phase::Flipping { first, .. } => first,
            _ => None,
        };

        match (first, response.is_match) {
            (first, true) => {
                let pair = first.map_or_else(|| self.pair_of(card_id), |a| [a, card_id]);
                self.phase = Phase::Resolving { pair };
                FlipStep::Matched {
                    pair,
                    score: response.final_score(),
                }
            }
            (Some(a), false) => {
                let pair = [a, card_id];
                self.phase = Phase::Resetting { pair };
                FlipStep::Mismatched { pair }
            }
            (None, false) => {
                self.phase = Phase::OneFlipped(card_id);
                FlipStep::Revealed
            }
        }
    }

    /// The two cards sharing a value with `card_id`
    fn pair_of(&self, card_id: CardId) -> [CardId; 2] {
        let Some(value) = self.snapshot.card(card_id).map(|card| card.value.as_str()) else {
            return [card_id, card_id];
        };
        let mut ids = self
            .snapshot
            .cards
            .iter()
            .filter(|card| card.value == value)
            .map(|card| card.id);
        match (ids.next(), ids.next()) {
            (Some(a), Some(b)) => [a, b],
            _ => [card_id, card_id],
        }
    }

    /// Release the lock after the match delay; false if the pair moved on
    pub(crate) fn resolve_match(&mut self, pair: [CardId; 2]) -> bool {
        if self.phase == (Phase::Resolving { pair }) {
            self.phase = Phase::Idle;
            true
        } else {
            false
        }
    }

    pub(crate) fn release_reset(&mut self, pair: [CardId; 2]) -> bool {
        if self.phase == (Phase::Resetting { pair }) {
            self.phase = Phase::Idle;
            true
        } else {
            false
        }
    }

    pub(crate) fn summary(&self, score: u32) -> GameSummary {
        GameSummary {
            player_name: self.snapshot.player_name.clone(),
            difficulty: self.snapshot.difficulty,
            elapsed_time: self.snapshot.elapsed_time,
            attempts: self.snapshot.attempts,
            matched_pairs: self.snapshot.matched_pairs,
            score,
        }
    }

    /// One-shot: only the first completion signal of a game counts
    pub(crate) fn mark_completed(&mut self, summary: GameSummary) -> bool {
        if !matches!(self.completion, Completion::Pending) {
            return false;
        }
        self.completion = Completion::Completed {
            summary,
            save: SaveState::Available,
        };
        true
    }

    /// Claim the save action. `Ok(false)` when it is already used or in flight.
    pub(crate) fn begin_save(&mut self) -> Result<bool, Error> {
        match &mut self.completion {
            Completion::Pending => Err(Error::NotCompleted),
            Completion::Completed { save, .. } => match save {
                SaveState::Available => {
                    *save = SaveState::Saving;
                    Ok(true)
                }
                SaveState::Saving | SaveState::Saved => Ok(false),
            },
        }
    }

    pub(crate) fn finish_save(&mut self, saved: bool) {
        if let Completion::Completed { save, .. } = &mut self.completion {
            *save = if saved {
                SaveState::Saved
            } else {
                SaveState::Available
            };
        }
    }
}

fn overlay_flip(snapshot: &mut GameSnapshot, card_id: CardId, response: &FlipResponse) {
    snapshot.attempts = response.attempts;
    snapshot.matched_pairs = response.matched_pairs;
    snapshot.elapsed_time = response.elapsed_time;
    snapshot.is_completed = response.is_completed;
    snapshot.score = response.score;

    let value = match snapshot.card_mut(card_id) {
        Some(card) => {
            card.is_flipped = true;
            card.value.clone()
        }
        None => return,
    };

    if response.is_match {
        for card in snapshot
            .cards
            .iter_mut()
            .filter(|card| card.value == value && (card.id == card_id || card.is_active()))
        {
            card.is_flipped = true;
            card.is_matched = true;
        }
    }
}
