use memory_match_common::models::{Difficulty, elapsed};
use tracing::{debug, info, warn};

use crate::{
    error::{Error, Result},
    game::{Context, GameEvent},
    service::GameService,
};

/// Final figures of a completed game, as shown on the game-over summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSummary {
    pub player_name: String,
    pub difficulty: Difficulty,
    /// Elapsed time in seconds
    pub elapsed_time: u64,
    pub attempts: u32,
    pub matched_pairs: u32,
    pub score: u32,
}

impl GameSummary {
    pub fn formatted_time(&self) -> String {
        elapsed::format(self.elapsed_time)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Completion {
    Pending,
    Completed { summary: GameSummary, save: SaveState },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SaveState {
    Available,
    Saving,
    Saved,
}

/// Enter the game-over state for `generation`.
///
/// Both the flip path and the heartbeat call this; whichever arrives first
/// wins and later calls return `false`. Stops the heartbeat.
pub(crate) async fn complete<S: GameService>(
    ctx: &Context<S>,
    generation: u64,
    summary: GameSummary,
) -> bool {
    let poller = ctx
        .with_session(generation, |session| {
            session
                .mark_completed(summary.clone())
                .then(|| session.poller.take())
        })
        .await
        .flatten();

    let Some(poller) = poller else {
        debug!("Completion already handled for game #{}", generation);
        return false;
    };

    info!(
        "Game completed: {} in {} with {} attempts, score {}",
        summary.player_name,
        summary.formatted_time(),
        summary.attempts,
        summary.score
    );
    ctx.emit(GameEvent::GameCompleted(summary)).await;

    // May be the heartbeat's own task, so this stays last
    if let Some(poller) = poller {
        poller.stop();
    }
    true
}

/// Submit the score of the completed game. Usable once per game: returns
/// `Ok(false)` without contacting the service once saved or while saving.
pub(crate) async fn save_score<S: GameService>(ctx: &Context<S>) -> Result<bool> {
    let claim = ctx
        .with_current(|session| session.begin_save().map(|claimed| (session.generation, claimed)))
        .await
        .ok_or(Error::NotCompleted)??;

    let (generation, true) = claim else {
        debug!("Score already saved or being saved");
        return Ok(false);
    };

    let result = match ctx.service.save_score().await {
        Ok(response) if response.success => Ok(response.score),
        Ok(_) => Err(Error::SaveRejected(
            "service reported failure".to_string(),
        )),
        Err(e) => Err(e.into()),
    };

    let saved = result.is_ok();
    ctx.with_session(generation, |session| session.finish_save(saved))
        .await;

    match result {
        Ok(score) => {
            info!("Score saved for game #{}", generation);
            ctx.emit(GameEvent::ScoreSaved { score }).await;
            Ok(true)
        }
        Err(e) => {
            warn!("Failed to save score: {}", e);
            Err(e)
        }
    }
}
