use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use memory_match_common::{
    models::{CardId, Difficulty, GameSnapshot},
    protocol::HighScoresResponse,
};
use tokio::sync::{Mutex, RwLock, mpsc};
use tracing::{debug, info};

use crate::{
    MemoryMatchClient, Result,
    completion::{self, Completion, GameSummary},
    config::ClientConfig,
    error::SyncError,
    heartbeat,
    orchestrator::{self, FlipOutcome},
    service::GameService,
    session::Session,
    view::BoardView,
};

/// Events emitted by the memory match game
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// A game was loaded and the board should be drawn
    GameLoaded {
        player_name: String,
        difficulty: Difficulty,
        total_pairs: u32,
    },
    /// A fresh snapshot replaced the board
    BoardUpdated,
    /// Counters reported by a flip response
    CountersUpdated {
        attempts: u32,
        matched_pairs: u32,
        elapsed_time: u64,
    },
    /// Heartbeat moved the clock
    ClockTick { elapsed_time: u64 },
    PairMatched { first: CardId, second: CardId },
    /// A mismatched pair was turned face down again
    PairHidden { first: CardId, second: CardId },
    /// Game over: show the summary
    GameCompleted(GameSummary),
    ScoreSaved { score: Option<u32> },
    /// The game was left; the setup form should be shown
    ReturnedToSetup,
}

/// State shared by the controller and the tasks it spawns
pub(crate) struct Context<S> {
    pub(crate) service: S,
    pub(crate) config: ClientConfig,
    session: Mutex<Option<Session>>,
    generations: AtomicU64,
    event_sender: RwLock<Option<mpsc::UnboundedSender<GameEvent>>>,
}

impl<S: GameService> Context<S> {
    /// Run `f` against the session if game `generation` is still the active one
    pub(crate) async fn with_session<R>(
        &self,
        generation: u64,
        f: impl FnOnce(&mut Session) -> R,
    ) -> Option<R> {
        let mut session = self.session.lock().await;
        session
            .as_mut()
            .filter(|session| session.generation == generation)
            .map(f)
    }

    pub(crate) async fn with_current<R>(&self, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        self.session.lock().await.as_mut().map(f)
    }

    pub(crate) async fn is_current(&self, generation: u64) -> bool {
        self.with_session(generation, |_| ()).await.is_some()
    }

    pub(crate) async fn emit(&self, event: GameEvent) {
        if let Some(ref sender) = *self.event_sender.read().await {
            let _ = sender.send(event);
        }
    }

    /// Install a freshly loaded game, replacing any previous one
    async fn install(self: &Arc<Self>, snapshot: GameSnapshot) -> u64 {
        let generation = self.generations.fetch_add(1, Ordering::Relaxed) + 1;
        let completed_score = snapshot.final_score();
        let loaded = GameEvent::GameLoaded {
            player_name: snapshot.player_name.clone(),
            difficulty: snapshot.difficulty,
            total_pairs: snapshot.total_pairs,
        };

        let mut session = Session::new(generation, snapshot);
        if completed_score.is_none() {
            session.poller = Some(heartbeat::spawn(self.clone(), generation));
        }

        // Dropping the previous session stops its heartbeat
        let previous = self.session.lock().await.replace(session);
        drop(previous);

        info!("Loaded game #{}", generation);
        self.emit(loaded).await;

        if let Some(score) = completed_score
            && let Some(summary) = self
                .with_session(generation, |session| session.summary(score))
                .await
        {
            completion::complete(self, generation, summary).await;
        }
        generation
    }

    async fn teardown(&self) -> bool {
        let previous = self.session.lock().await.take();
        let Some(mut session) = previous else {
            return false;
        };

        if let Some(poller) = session.poller.take() {
            poller.stop();
        }
        info!("Left game #{}", session.generation);
        self.emit(GameEvent::ReturnedToSetup).await;
        true
    }
}

/// High-level memory match controller that keeps the local view of one game
/// in step with the service.
///
/// Cloning is cheap; clones drive the same game.
pub struct MemoryMatchGame<S = MemoryMatchClient> {
    ctx: Arc<Context<S>>,
}

impl<S> Clone for MemoryMatchGame<S> {
    fn clone(&self) -> Self {
        Self {
            ctx: self.ctx.clone(),
        }
    }
}

impl MemoryMatchGame<MemoryMatchClient> {
    /// Create a new controller talking HTTP to `server_url`
    pub fn new(server_url: &str) -> Result<Self> {
        Self::from_config(ClientConfig {
            server_url: server_url.to_string(),
            ..ClientConfig::default()
        })
    }

    pub fn from_config(config: ClientConfig) -> Result<Self> {
        let client = MemoryMatchClient::from_config(&config)?;
        Ok(Self::with_service(client, config))
    }
}

impl<S: GameService> MemoryMatchGame<S> {
    pub fn with_service(service: S, config: ClientConfig) -> Self {
        Self {
            ctx: Arc::new(Context {
                service,
                config,
                session: Mutex::new(None),
                generations: AtomicU64::new(0),
                event_sender: RwLock::new(None),
            }),
        }
    }

    /// Subscribe to game events. Returns a receiver for game events.
    pub async fn subscribe_to_events(&self) -> mpsc::UnboundedReceiver<GameEvent> {
        let (sender, receiver) = mpsc::unbounded_channel();
        *self.ctx.event_sender.write().await = Some(sender);
        receiver
    }

    /// Pick up the game in progress on the service, if any.
    ///
    /// Returns `false` and stays in the setup state when there is none.
    pub async fn load(&self) -> Result<bool> {
        let Some(snapshot) = self.ctx.service.get_game_state().await? else {
            debug!("No game in progress");
            return Ok(false);
        };
        snapshot.validate().map_err(SyncError::from)?;

        self.ctx.install(snapshot).await;
        Ok(true)
    }

    /// Setup flow: leave the current game, create a new one and load it
    pub async fn start_game(&self, player_name: &str, difficulty: Difficulty) -> Result<()> {
        info!(
            "Starting new {} game for {}",
            difficulty.as_str(),
            player_name
        );

        self.leave().await;
        self.ctx.service.new_game(player_name, difficulty).await?;

        if self.load().await? {
            Ok(())
        } else {
            Err(SyncError::NoGame.into())
        }
    }

    /// Click on a card
    pub async fn flip(&self, card_id: CardId) -> FlipOutcome {
        orchestrator::flip(&self.ctx, card_id).await
    }

    /// Save the score of the completed game; only the first success counts
    pub async fn save_score(&self) -> Result<bool> {
        completion::save_score(&self.ctx).await
    }

    /// Play again from the game-over summary: discard the game and return
    /// to setup
    pub async fn restart(&self) -> bool {
        self.ctx.teardown().await
    }

    /// Leave the game in progress without a summary
    pub async fn leave(&self) -> bool {
        self.ctx.teardown().await
    }

    pub async fn high_scores(&self, difficulty: Difficulty) -> Result<HighScoresResponse> {
        Ok(self.ctx.service.high_scores(difficulty).await?)
    }

    pub async fn board(&self) -> Option<BoardView> {
        self.ctx.with_current(|session| BoardView::project(session)).await
    }

    /// Get the current game state
    pub async fn snapshot(&self) -> Option<GameSnapshot> {
        self.ctx
            .with_current(|session| session.snapshot.clone())
            .await
    }

    /// Summary of the completed game, once there is one
    pub async fn summary(&self) -> Option<GameSummary> {
        self.ctx
            .with_current(|session| match &session.completion {
                Completion::Completed { summary, .. } => Some(summary.clone()),
                Completion::Pending => None,
            })
            .await
            .flatten()
    }

    /// Check if a game is loaded
    pub async fn is_active(&self) -> bool {
        self.ctx.with_current(|_| ()).await.is_some()
    }

    /// Check if the heartbeat is running
    pub async fn is_polling(&self) -> bool {
        self.ctx
            .with_current(|session| session.poller.as_ref().is_some_and(|p| p.is_running()))
            .await
            .unwrap_or(false)
    }
}
