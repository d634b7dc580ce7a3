#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, Once},
    time::Duration,
};

use async_trait::async_trait;
use memory_match_client::{
    Card, CardId, ClientConfig, Difficulty, FlipResponse, GameEvent, GameService, GameSnapshot,
    HighScoreEntry, HighScoresResponse, MemoryMatchGame, ResetResponse, SaveScoreResponse,
    ServiceError,
};
use tokio::{sync::mpsc, time::Instant};
use tracing_subscriber::{EnvFilter, fmt};

/// Board of the normal difficulty used throughout the tests: card 3 and 7
/// hold "A", 2 holds "B" and 5 holds "C".
pub const LAYOUT: [&str; 16] = [
    "D", "E", "B", "A", "F", "C", "G", "A", "B", "C", "D", "E", "F", "G", "H", "H",
];

static LOGGING: Once = Once::new();

/// Test logging, quiet unless `TEST_LOG` or `RUST_LOG` asks otherwise
pub fn init_logging() {
    LOGGING.call_once(|| {
        let filter = std::env::var("TEST_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .map(EnvFilter::new)
            .unwrap_or_else(|_| EnvFilter::new("warn"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .without_time()
            .try_init()
            .ok();
    });
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub fetches: usize,
    pub flips: usize,
    pub resets: usize,
    pub saves: usize,
}

struct FakeGame {
    player_name: String,
    difficulty: Difficulty,
    cards: Vec<Card>,
    attempts: u32,
    matched_pairs: u32,
    is_completed: bool,
    started: Instant,
    ended: Option<Instant>,
}

impl FakeGame {
    fn new(player_name: &str, difficulty: Difficulty, layout: &[&str]) -> Self {
        Self {
            player_name: player_name.to_string(),
            difficulty,
            cards: layout
                .iter()
                .enumerate()
                .map(|(id, value)| Card {
                    id: id as CardId,
                    value: value.to_string(),
                    is_flipped: false,
                    is_matched: false,
                })
                .collect(),
            attempts: 0,
            matched_pairs: 0,
            is_completed: false,
            started: Instant::now(),
            ended: None,
        }
    }

    fn total_pairs(&self) -> u32 {
        self.cards.len() as u32 / 2
    }

    fn elapsed(&self) -> u64 {
        self.ended
            .unwrap_or_else(Instant::now)
            .duration_since(self.started)
            .as_secs()
    }

    fn score(&self) -> u32 {
        if !self.is_completed {
            return 0;
        }
        let base = match self.difficulty {
            Difficulty::Easy => 1000.0,
            Difficulty::Normal => 2000.0,
            Difficulty::Hard => 3000.0,
        };
        let time_factor = 1.0 - (self.elapsed() as f64 / 300.0).min(0.7);
        let extra_attempts = self.attempts.saturating_sub(self.matched_pairs) as f64;
        let attempt_factor = 1.0 - (extra_attempts / 30.0).min(0.5);
        ((base * time_factor * attempt_factor) as u32).max(1)
    }

    fn active(&self) -> usize {
        self.cards.iter().filter(|c| c.is_active()).count()
    }

    fn match_value(&mut self, value: &str) {
        for card in self.cards.iter_mut().filter(|c| c.value == value) {
            card.is_flipped = true;
            card.is_matched = true;
        }
        self.matched_pairs += 1;
        self.attempts += 1;
        if self.matched_pairs == self.total_pairs() {
            self.is_completed = true;
            self.ended = Some(Instant::now());
        }
    }

    fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            player_name: self.player_name.clone(),
            difficulty: self.difficulty,
            elapsed_time: self.elapsed(),
            attempts: self.attempts,
            matched_pairs: self.matched_pairs,
            total_pairs: self.total_pairs(),
            is_completed: self.is_completed,
            score: self.score(),
            cards: self.cards.clone(),
        }
    }
}

#[derive(Default)]
struct FakeState {
    game: Option<FakeGame>,
    counters: Counters,
    fail_fetches: usize,
    fail_resets: usize,
    fail_saves: usize,
    reject_flips: usize,
    fetch_delays: VecDeque<Duration>,
    flip_delay: Option<Duration>,
    max_active: usize,
    high_scores: Vec<(Difficulty, HighScoreEntry)>,
}

/// In-memory game service following the real service's rules: a flip
/// toggles a card, two face-up cards are checked for a match, reset turns
/// unmatched cards back.
#[derive(Clone, Default)]
pub struct FakeService {
    state: Arc<Mutex<FakeState>>,
}

impl FakeService {
    /// No game in progress
    pub fn empty() -> Self {
        Self::default()
    }

    /// A normal game on [`LAYOUT`]
    pub fn scenario() -> Self {
        let fake = Self::default();
        fake.state().game = Some(FakeGame::new("Ada", Difficulty::Normal, &LAYOUT));
        fake
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    /// Match the pairs holding `values` as if the player had found them
    pub fn prematch(&self, values: &[&str]) {
        let mut state = self.state();
        let game = state.game.as_mut().unwrap();
        for value in values {
            game.match_value(value);
        }
    }

    /// Finish the game behind the client's back, e.g. from another tab
    pub fn complete_externally(&self) {
        let mut state = self.state();
        let game = state.game.as_mut().unwrap();
        let open: Vec<String> = game
            .cards
            .iter()
            .filter(|c| !c.is_matched)
            .map(|c| c.value.clone())
            .collect();
        let mut done = Vec::new();
        for value in open {
            if !done.contains(&value) {
                game.match_value(&value);
                done.push(value);
            }
        }
    }

    pub fn fail_next_fetches(&self, n: usize) {
        self.state().fail_fetches = n;
    }

    pub fn fail_next_resets(&self, n: usize) {
        self.state().fail_resets = n;
    }

    pub fn fail_next_saves(&self, n: usize) {
        self.state().fail_saves = n;
    }

    pub fn reject_next_flips(&self, n: usize) {
        self.state().reject_flips = n;
    }

    /// Delay the responses of the next fetches; the state they carry is the
    /// one at request time
    pub fn delay_next_fetches(&self, delays: &[Duration]) {
        self.state().fetch_delays = delays.iter().copied().collect();
    }

    pub fn set_flip_delay(&self, delay: Duration) {
        self.state().flip_delay = Some(delay);
    }

    pub fn counters(&self) -> Counters {
        self.state().counters
    }

    /// Highest number of face-up unmatched cards ever seen by the service
    pub fn max_active(&self) -> usize {
        self.state().max_active
    }

    pub fn server_snapshot(&self) -> Option<GameSnapshot> {
        self.state().game.as_ref().map(FakeGame::snapshot)
    }
}

fn bad_request(message: &str) -> ServiceError {
    ServiceError::Status {
        status: 400,
        message: message.to_string(),
    }
}

#[async_trait]
impl GameService for FakeService {
    async fn get_game_state(&self) -> Result<Option<GameSnapshot>, ServiceError> {
        let (snapshot, delay) = {
            let mut state = self.state();
            state.counters.fetches += 1;
            if state.fail_fetches > 0 {
                state.fail_fetches -= 1;
                return Err(ServiceError::Unavailable("fetch dropped".to_string()));
            }
            let delay = state.fetch_delays.pop_front();
            (state.game.as_ref().map(FakeGame::snapshot), delay)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(snapshot)
    }

    async fn flip_card(&self, card_id: CardId) -> Result<FlipResponse, ServiceError> {
        let delay = {
            let mut state = self.state();
            state.counters.flips += 1;
            if state.reject_flips > 0 {
                state.reject_flips -= 1;
                return Err(bad_request("Invalid card ID or card already matched"));
            }
            state.flip_delay
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state();
        let FakeState {
            game, max_active, ..
        } = &mut *state;
        let game = game.as_mut().ok_or_else(|| bad_request("No active game"))?;

        let card = game
            .cards
            .iter_mut()
            .find(|c| c.id == card_id && !c.is_matched)
            .ok_or_else(|| bad_request("Invalid card ID or card already matched"))?;
        card.is_flipped = !card.is_flipped;

        *max_active = (*max_active).max(game.active());

        let active: Vec<usize> = (0..game.cards.len())
            .filter(|&i| game.cards[i].is_active())
            .collect();
        let mut is_match = false;
        if let &[a, b] = active.as_slice() {
            game.attempts += 1;
            if game.cards[a].value == game.cards[b].value {
                game.cards[a].is_matched = true;
                game.cards[b].is_matched = true;
                game.matched_pairs += 1;
                if game.matched_pairs == game.total_pairs() {
                    game.is_completed = true;
                    game.ended = Some(Instant::now());
                }
                is_match = true;
            }
        }

        Ok(FlipResponse {
            success: true,
            is_match,
            is_completed: game.is_completed,
            attempts: game.attempts,
            matched_pairs: game.matched_pairs,
            elapsed_time: game.elapsed(),
            score: game.score(),
        })
    }

    async fn reset_unmatched(&self) -> Result<ResetResponse, ServiceError> {
        let mut state = self.state();
        state.counters.resets += 1;
        if state.fail_resets > 0 {
            state.fail_resets -= 1;
            return Err(ServiceError::Unavailable("reset dropped".to_string()));
        }
        let game = state
            .game
            .as_mut()
            .ok_or_else(|| bad_request("No active game"))?;
        for card in game.cards.iter_mut().filter(|c| c.is_active()) {
            card.is_flipped = false;
        }
        Ok(ResetResponse { success: true })
    }

    async fn save_score(&self) -> Result<SaveScoreResponse, ServiceError> {
        let mut state = self.state();
        if state.fail_saves > 0 {
            state.fail_saves -= 1;
            return Err(ServiceError::Unavailable("save dropped".to_string()));
        }
        let game = state
            .game
            .as_ref()
            .ok_or_else(|| bad_request("No active game"))?;
        if !game.is_completed {
            return Err(bad_request("Game not completed yet"));
        }

        let difficulty = game.difficulty;
        let entry = HighScoreEntry {
            player_name: game.player_name.clone(),
            score: game.score(),
            duration: game.elapsed(),
            attempts: game.attempts,
            date: "2025-01-01 12:00:00".to_string(),
        };
        state.counters.saves += 1;
        state.high_scores.push((difficulty, entry.clone()));

        Ok(SaveScoreResponse {
            success: true,
            score: Some(entry.score),
            player_name: Some(entry.player_name),
        })
    }

    async fn new_game(
        &self,
        player_name: &str,
        difficulty: Difficulty,
    ) -> Result<(), ServiceError> {
        let layout: Vec<String> = if difficulty == Difficulty::Normal {
            LAYOUT.iter().map(|v| v.to_string()).collect()
        } else {
            (0..difficulty.pairs() * 2)
                .map(|i| format!("V{}", i / 2))
                .collect()
        };
        let layout: Vec<&str> = layout.iter().map(String::as_str).collect();
        self.state().game = Some(FakeGame::new(player_name, difficulty, &layout));
        Ok(())
    }

    async fn high_scores(&self, difficulty: Difficulty) -> Result<HighScoresResponse, ServiceError> {
        let state = self.state();
        let mut high_scores: Vec<HighScoreEntry> = state
            .high_scores
            .iter()
            .filter(|(d, _)| *d == difficulty)
            .map(|(_, entry)| entry.clone())
            .collect();
        high_scores.sort_by(|a, b| b.score.cmp(&a.score));
        high_scores.truncate(10);
        Ok(HighScoresResponse {
            difficulty,
            high_scores,
        })
    }
}

/// Controller over `fake` with the game loaded and events subscribed
pub async fn started(
    fake: &FakeService,
) -> (MemoryMatchGame<FakeService>, mpsc::UnboundedReceiver<GameEvent>) {
    started_with(fake, ClientConfig::default()).await
}

pub async fn started_with(
    fake: &FakeService,
    config: ClientConfig,
) -> (MemoryMatchGame<FakeService>, mpsc::UnboundedReceiver<GameEvent>) {
    init_logging();
    let game = MemoryMatchGame::with_service(fake.clone(), config);
    let events = game.subscribe_to_events().await;
    assert!(game.load().await.unwrap());
    (game, events)
}

pub fn drain(events: &mut mpsc::UnboundedReceiver<GameEvent>) -> Vec<GameEvent> {
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    seen
}

pub fn completions(events: &[GameEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, GameEvent::GameCompleted(_)))
        .count()
}

pub async fn advance(millis: u64) {
    tokio::time::sleep(Duration::from_millis(millis)).await;
}
