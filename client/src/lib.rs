//! Memory Match Client Library
//!
//! This library drives the client side of the memory match card game: it
//! relays card flips to the game service, keeps a local view of the board in
//! step with the service's answers, and runs the end-of-game flow.
//!
//! ## Usage
//!
//! ### High-Level Interface (Recommended)
//!
//! `MemoryMatchGame` holds the session for one game. It enforces that at most
//! two unmatched cards are face up, times the match and mismatch reveals,
//! polls the service once a second and reports the completed game exactly once:
//!
//! ```rust,no_run
//! use memory_match_client::{Difficulty, FlipOutcome, GameEvent, MemoryMatchGame};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let game = MemoryMatchGame::new("http://localhost:5000")?;
//!     let mut events = game.subscribe_to_events().await;
//!
//!     game.start_game("Ada", Difficulty::Normal).await?;
//!
//!     if let FlipOutcome::Matched { completed } = game.flip(3).await {
//!         println!("Matched! Completed: {}", completed);
//!     }
//!
//!     while let Some(event) = events.recv().await {
//!         if let GameEvent::GameCompleted(summary) = event {
//!             println!("Score: {}", summary.score);
//!             game.save_score().await?;
//!             break;
//!         }
//!     }
//!
//!     game.restart().await;
//!     Ok(())
//! }
//! ```
//!
//! ### Low-Level Interface
//!
//! `MemoryMatchClient` implements `GameService` over HTTP and can be used
//! directly:
//!
//! ```rust,no_run
//! use memory_match_client::{Difficulty, GameService, MemoryMatchClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let client = MemoryMatchClient::new("http://localhost:5000")?;
//!     client.new_game("Ada", Difficulty::Easy).await?;
//!
//!     if let Some(state) = client.get_game_state().await? {
//!         println!("{} cards on the board", state.cards.len());
//!     }
//!
//!     let flip = client.flip_card(0).await?;
//!     println!("Attempts so far: {}", flip.attempts);
//!     Ok(())
//! }
//! ```

mod client;
mod completion;
mod config;
mod error;
mod game;
mod heartbeat;
mod orchestrator;
mod service;
mod session;
mod sync;
mod view;

pub use client::MemoryMatchClient;
pub use completion::GameSummary;
pub use config::{ClientConfig, DEFAULT_SERVER_URL};
pub use error::{Error, Result, ServiceError, SyncError};
pub use game::{GameEvent, MemoryMatchGame};
pub use orchestrator::FlipOutcome;
pub use service::GameService;
pub use session::IgnoreReason;
pub use view::{BoardView, CardFace, CardView};

// Re-export common types for convenience
pub use memory_match_common::{models::*, protocol::*};
