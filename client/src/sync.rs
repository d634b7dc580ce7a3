//! State synchronizer: the only path by which fetched state reaches the session.

use memory_match_common::models::GameSnapshot;
use tracing::{debug, info};

use crate::{
    completion,
    error::SyncError,
    game::{Context, GameEvent},
    service::GameService,
    session::Beat,
};

/// Fetch the authoritative state and replace the session snapshot with it.
///
/// On any failure the held snapshot stays as it was. A completion the
/// snapshot reveals goes to the completion coordinator.
pub(crate) async fn refresh<S: GameService>(
    ctx: &Context<S>,
    generation: u64,
) -> Result<GameSnapshot, SyncError> {
    let seq = ctx
        .with_session(generation, |session| session.issue_seq())
        .await
        .ok_or(SyncError::Inactive)?;

    let snapshot = ctx
        .service
        .get_game_state()
        .await?
        .ok_or(SyncError::NoGame)?;

    let (applied, due) = ctx
        .with_session(generation, |session| {
            session
                .apply_snapshot(seq, snapshot)
                .map(|applied| (applied, session.completion_due()))
        })
        .await
        .ok_or(SyncError::Inactive)??;

    debug!(
        "Applied snapshot #{}: {}/{} pairs, {} attempts",
        seq, applied.matched_pairs, applied.total_pairs, applied.attempts
    );
    ctx.emit(GameEvent::BoardUpdated).await;

    if let Some(summary) = due {
        info!("Refresh saw game #{} completed", generation);
        completion::complete(ctx, generation, summary).await;
    }
    Ok(applied)
}

/// Heartbeat fetch: moves the clock and reports a completion the session
/// has not seen, leaving cards and counters to the flip path.
pub(crate) async fn heartbeat<S: GameService>(
    ctx: &Context<S>,
    generation: u64,
) -> Result<Beat, SyncError> {
    let seq = ctx
        .with_session(generation, |session| session.issue_seq())
        .await
        .ok_or(SyncError::Inactive)?;

    let snapshot = ctx
        .service
        .get_game_state()
        .await?
        .ok_or(SyncError::NoGame)?;

    ctx.with_session(generation, |session| session.apply_heartbeat(seq, snapshot))
        .await
        .ok_or(SyncError::Inactive)?
}
