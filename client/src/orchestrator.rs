use std::sync::Arc;

use memory_match_common::models::CardId;
use tokio::time;
use tracing::{debug, info, warn};

use crate::{
    completion,
    error::{Error, ServiceError, SyncError},
    game::{Context, GameEvent},
    service::GameService,
    session::{FlipStep, IgnoreReason},
    sync,
};

/// What became of a click on a card
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlipOutcome {
    /// No request was sent
    Ignored(IgnoreReason),
    /// The service refused the flip; the board is unchanged
    Rejected(String),
    /// First card of a pair is face up
    Revealed,
    Matched { completed: bool },
    Mismatched,
    /// The game was left while the request was in flight
    Abandoned,
}

pub(crate) async fn flip<S: GameService>(ctx: &Arc<Context<S>>, card_id: CardId) -> FlipOutcome {
    let claim = ctx
        .with_current(|session| {
            session
                .begin_flip(card_id)
                .map(|seq| (session.generation, seq))
        })
        .await;

    let (generation, seq) = match claim {
        None => return FlipOutcome::Ignored(IgnoreReason::NoGame),
        Some(Err(reason)) => {
            debug!("Ignoring click on card {}: {:?}", card_id, reason);
            return FlipOutcome::Ignored(reason);
        }
        Some(Ok(claim)) => claim,
    };

    let response = match ctx.service.flip_card(card_id).await {
        Ok(response) if response.success => response,
        Ok(_) => return reject(ctx, generation, card_id, "service reported failure").await,
        Err(ServiceError::Status { message, .. }) => {
            return reject(ctx, generation, card_id, &message).await;
        }
        Err(e) => return reject(ctx, generation, card_id, &e.to_string()).await,
    };

    let Some(step) = ctx
        .with_session(generation, |session| {
            session.finish_flip(seq, card_id, &response)
        })
        .await
    else {
        debug!("Game left before flip of card {} returned", card_id);
        return FlipOutcome::Abandoned;
    };

    ctx.emit(GameEvent::CountersUpdated {
        attempts: response.attempts,
        matched_pairs: response.matched_pairs,
        elapsed_time: response.elapsed_time,
    })
    .await;

    let refresher = ctx.clone();
    tokio::spawn(async move {
        if let Err(e) = sync::refresh(&refresher, generation).await {
            debug!("Refresh after flip not applied: {}", e);
        }
    });

    match step {
        FlipStep::Revealed => FlipOutcome::Revealed,
        FlipStep::Matched { pair, score } => {
            tokio::spawn(resolve_match(ctx.clone(), generation, pair, score));
            FlipOutcome::Matched {
                completed: score.is_some(),
            }
        }
        FlipStep::Mismatched { pair } => {
            tokio::spawn(reset_pair(ctx.clone(), generation, pair));
            FlipOutcome::Mismatched
        }
    }
}

async fn reject<S: GameService>(
    ctx: &Context<S>,
    generation: u64,
    card_id: CardId,
    reason: &str,
) -> FlipOutcome {
    let error = Error::FlipRejected {
        card_id,
        reason: reason.to_string(),
    };
    warn!("{}", error);

    ctx.with_session(generation, |session| session.cancel_flip())
        .await;
    FlipOutcome::Rejected(reason.to_string())
}

/// Show the pair as matched once the match delay has passed, then hand a
/// completed game straight to the coordinator.
async fn resolve_match<S: GameService>(
    ctx: Arc<Context<S>>,
    generation: u64,
    pair: [CardId; 2],
    score: Option<u32>,
) {
    time::sleep(ctx.config.match_delay).await;

    let resolved = ctx
        .with_session(generation, |session| {
            session
                .resolve_match(pair)
                .then(|| score.map(|score| session.summary(score)))
        })
        .await
        .flatten();

    let Some(summary) = resolved else {
        return;
    };

    debug!("Cards {} and {} matched", pair[0], pair[1]);
    ctx.emit(GameEvent::PairMatched {
        first: pair[0],
        second: pair[1],
    })
    .await;

    if let Some(summary) = summary {
        completion::complete(&ctx, generation, summary).await;
    }
}

/// Turn a mismatched pair back after the mismatch delay.
///
/// The lock is only released once a fetched snapshot shows the pair face
/// down; failed resets and refreshes are retried every `retry_interval`.
async fn reset_pair<S: GameService>(ctx: Arc<Context<S>>, generation: u64, pair: [CardId; 2]) {
    let mut delay = ctx.config.mismatch_delay;

    loop {
        time::sleep(delay).await;
        if !ctx.is_current(generation).await {
            return;
        }

        match ctx.service.reset_unmatched().await {
            Ok(response) if response.success => {}
            Ok(_) => warn!(
                "{}",
                Error::ResetFailed("service reported failure".to_string())
            ),
            Err(e) => warn!("{}", Error::ResetFailed(e.to_string())),
        }

        match sync::refresh(&ctx, generation).await {
            Ok(snapshot) if snapshot.active_count() < 2 => break,
            Ok(_) => debug!("Cards {} and {} still face up", pair[0], pair[1]),
            Err(SyncError::Inactive) => return,
            Err(e) => warn!("Refresh after reset failed: {}", e),
        }

        delay = ctx.config.retry_interval;
        info!("Retrying reset of cards {} and {}", pair[0], pair[1]);
    }

    let released = ctx
        .with_session(generation, |session| session.release_reset(pair))
        .await;
    if released == Some(true) {
        ctx.emit(GameEvent::PairHidden {
            first: pair[0],
            second: pair[1],
        })
        .await;
    }
}
