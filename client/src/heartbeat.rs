use std::sync::Arc;

use tokio::{
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::{
    completion,
    error::SyncError,
    game::{Context, GameEvent},
    service::GameService,
    session::Beat,
    sync,
};

/// Owner of the heartbeat task. Dropping the handle stops the poller, so a
/// torn-down session cannot leave one running.
#[derive(Debug)]
pub(crate) struct PollerHandle {
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub(crate) fn stop(self) {
        self.task.abort();
    }

    pub(crate) fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Poll the service every `poll_interval` for as long as the game is active.
///
/// A tick refreshes the clock only. A completion that the session has not
/// seen yet goes to the completion coordinator and ends the loop.
pub(crate) fn spawn<S: GameService>(ctx: Arc<Context<S>>, generation: u64) -> PollerHandle {
    let period = ctx.config.poll_interval;

    let task = tokio::spawn(async move {
        let mut ticks = time::interval_at(Instant::now() + period, period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!("Heartbeat started for game #{} every {:?}", generation, period);

        loop {
            ticks.tick().await;

            match sync::heartbeat(&ctx, generation).await {
                Ok(Beat::Tick { elapsed_time }) => {
                    ctx.emit(GameEvent::ClockTick { elapsed_time }).await;
                }
                Ok(Beat::Completed(summary)) => {
                    info!("Heartbeat saw game #{} completed", generation);
                    completion::complete(&ctx, generation, summary).await;
                    break;
                }
                Ok(Beat::Skipped) => debug!("Heartbeat response older than the clock shown"),
                Err(SyncError::Inactive) => break,
                Err(e) => warn!("Heartbeat skipped: {}", e),
            }
        }

        debug!("Heartbeat for game #{} finished", generation);
    });

    PollerHandle { task }
}
