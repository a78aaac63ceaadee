// Library surface for the terminal host and integration tests.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod config;
pub mod difficulty;
pub mod error;
pub mod game_mode;
pub mod leaderboard;
pub mod question;
pub mod runtime;
pub mod scoring;
pub mod session;

pub use difficulty::{classify, validate_description, DifficultyLabel, DifficultyMultiplier};
pub use error::{Result, TriviaError};
pub use game_mode::{Directive, GameModeConfig, GameModeController, SessionStatus};
pub use scoring::{ScoreCalculator, ScoreInput, ScoreResult, ScoreState};
pub use session::{Session, SessionSettings};
