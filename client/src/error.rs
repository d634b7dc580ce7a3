use memory_match_common::models::{CardId, SnapshotError};
use thiserror::Error;

/// Failure talking to the game service
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid service URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("service answered {status}: {message}")]
    Status { status: u16, message: String },
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

/// A state fetch that could not be applied to the session
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("no game in progress")]
    NoGame,
    #[error("inconsistent snapshot: {0}")]
    Inconsistent(#[from] SnapshotError),
    #[error("discarded snapshot #{seq}, already applied #{applied}")]
    Outdated { seq: u64, applied: u64 },
    #[error("game is no longer active")]
    Inactive,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("flip of card {card_id} rejected: {reason}")]
    FlipRejected { card_id: CardId, reason: String },
    #[error("resetting unmatched cards failed: {0}")]
    ResetFailed(String),
    #[error("saving score rejected: {0}")]
    SaveRejected(String),
    #[error("game is not completed")]
    NotCompleted,
}

pub type Result<T> = std::result::Result<T, Error>;
