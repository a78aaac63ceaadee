//! Game mode state machine: `Idle -> Running <-> Paused -> GameOver`.
//!
//! The controller owns no timer. The host drives it with `tick(now_ms)` from
//! its own interval and reports answers with `record_answer`; every call
//! returns a [`Directive`] telling the host whether to keep going and whether
//! to fetch another question. `GameOver` is terminal and sticky.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

use crate::error::{Result, TriviaError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum GameModeConfig {
    TimeLimited { total_time_ms: u64 },
    QuestionLimited { total_questions: u32 },
    Unlimited,
}

impl GameModeConfig {
    pub fn validate(&self) -> Result<()> {
        match *self {
            GameModeConfig::TimeLimited { total_time_ms: 0 } => Err(TriviaError::Config(
                "time-limited mode needs a time budget above 0 ms".to_string(),
            )),
            GameModeConfig::QuestionLimited { total_questions: 0 } => Err(TriviaError::Config(
                "question-limited mode needs at least 1 question".to_string(),
            )),
            _ => Ok(()),
        }
    }

    pub fn is_time_limited(&self) -> bool {
        matches!(self, GameModeConfig::TimeLimited { .. })
    }
}

impl Default for GameModeConfig {
    fn default() -> Self {
        GameModeConfig::QuestionLimited {
            total_questions: 10,
        }
    }
}

impl fmt::Display for GameModeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameModeConfig::TimeLimited { total_time_ms }
                if *total_time_ms >= 1000 && total_time_ms % 1000 == 0 =>
            {
                write!(f, "{}s", total_time_ms / 1000)
            }
            GameModeConfig::TimeLimited { total_time_ms } => write!(f, "{total_time_ms}ms"),
            GameModeConfig::QuestionLimited { total_questions } => {
                write!(f, "{total_questions} questions")
            }
            GameModeConfig::Unlimited => write!(f, "unlimited"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SessionStatus {
    Idle,
    Running,
    Paused,
    #[strum(to_string = "game over")]
    GameOver,
}

/// Controller operations, named in transition errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Operation {
    #[strum(to_string = "start")]
    Start,
    #[strum(to_string = "tick")]
    Tick,
    #[strum(to_string = "record an answer")]
    RecordAnswer,
    #[strum(to_string = "pause")]
    Pause,
    #[strum(to_string = "resume")]
    Resume,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
pub enum GameOverReason {
    #[strum(to_string = "time expired")]
    TimeExpired,
    #[strum(to_string = "all questions answered")]
    QuestionsExhausted,
    #[strum(to_string = "no questions left")]
    OutOfQuestions,
    #[strum(to_string = "abandoned")]
    Abandoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SessionTimerState {
    pub is_running: bool,
    pub start_timestamp: Option<u64>,
    pub elapsed_ms: u64,
    /// Only tracked in time-limited mode.
    pub remaining_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SessionProgress {
    pub questions_answered: u32,
    /// `None` when the mode has no question budget.
    pub questions_remaining: Option<u32>,
    pub is_game_over: bool,
}

/// What the host should do after a controller call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Directive {
    pub should_continue: bool,
    /// Request another question (after the host's feedback delay).
    pub load_next: bool,
    pub game_over: Option<GameOverReason>,
}

impl Directive {
    fn keep_going() -> Self {
        Self {
            should_continue: true,
            load_next: false,
            game_over: None,
        }
    }

    fn next_question() -> Self {
        Self {
            should_continue: true,
            load_next: true,
            game_over: None,
        }
    }

    fn over(reason: GameOverReason) -> Self {
        Self {
            should_continue: false,
            load_next: false,
            game_over: Some(reason),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GameModeController {
    config: GameModeConfig,
    status: SessionStatus,
    timer: SessionTimerState,
    progress: SessionProgress,
    last_directive: Directive,
}

impl GameModeController {
    pub fn new(config: GameModeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            status: SessionStatus::Idle,
            timer: Self::initial_timer(&config),
            progress: Self::initial_progress(&config),
            last_directive: Directive::keep_going(),
        })
    }

    fn initial_timer(config: &GameModeConfig) -> SessionTimerState {
        SessionTimerState {
            remaining_ms: match *config {
                GameModeConfig::TimeLimited { total_time_ms } => Some(total_time_ms),
                _ => None,
            },
            ..SessionTimerState::default()
        }
    }

    fn initial_progress(config: &GameModeConfig) -> SessionProgress {
        SessionProgress {
            questions_remaining: match *config {
                GameModeConfig::QuestionLimited { total_questions } => Some(total_questions),
                _ => None,
            },
            ..SessionProgress::default()
        }
    }

    /// Back to `Idle` with fresh timer and progress for a restart.
    pub fn reset(&mut self) {
        self.status = SessionStatus::Idle;
        self.timer = Self::initial_timer(&self.config);
        self.progress = Self::initial_progress(&self.config);
        self.last_directive = Directive::keep_going();
    }

    pub fn config(&self) -> &GameModeConfig {
        &self.config
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn timer(&self) -> &SessionTimerState {
        &self.timer
    }

    pub fn progress(&self) -> &SessionProgress {
        &self.progress
    }

    pub fn last_directive(&self) -> Directive {
        self.last_directive
    }

    pub fn game_over_reason(&self) -> Option<GameOverReason> {
        self.last_directive.game_over
    }

    pub fn is_game_over(&self) -> bool {
        self.status == SessionStatus::GameOver
    }

    pub fn start(&mut self, now_ms: u64) -> Result<()> {
        self.require(Operation::Start, SessionStatus::Idle)?;
        self.status = SessionStatus::Running;
        self.timer.is_running = true;
        self.timer.start_timestamp = Some(now_ms);
        self.timer.elapsed_ms = 0;
        info!(mode = %self.config, "session started");
        Ok(())
    }

    pub fn tick(&mut self, now_ms: u64) -> Result<Directive> {
        if self.is_game_over() {
            return Ok(self.last_directive);
        }
        self.require(Operation::Tick, SessionStatus::Running)?;

        self.advance_clock(now_ms);
        if self.timer.remaining_ms == Some(0) {
            return Ok(self.finish(GameOverReason::TimeExpired));
        }

        self.last_directive = Directive::keep_going();
        Ok(self.last_directive)
    }

    pub fn record_answer(&mut self) -> Result<Directive> {
        if self.is_game_over() {
            return Ok(self.last_directive);
        }
        self.require(Operation::RecordAnswer, SessionStatus::Running)?;

        self.progress.questions_answered += 1;
        if let Some(remaining) = self.progress.questions_remaining.as_mut() {
            *remaining = remaining.saturating_sub(1);
            if *remaining == 0 {
                return Ok(self.finish(GameOverReason::QuestionsExhausted));
            }
        }

        debug!(
            answered = self.progress.questions_answered,
            remaining = ?self.progress.questions_remaining,
            "answer recorded"
        );
        self.last_directive = Directive::next_question();
        Ok(self.last_directive)
    }

    /// Ticks to `now_ms` before recording the answer.
    ///
    /// An expired clock wins over the answer: if the tick ends the session
    /// the answer is not counted.
    pub fn record_answer_at(&mut self, now_ms: u64) -> Result<Directive> {
        if self.is_game_over() {
            return Ok(self.last_directive);
        }
        self.require(Operation::RecordAnswer, SessionStatus::Running)?;

        let directive = self.tick(now_ms)?;
        if directive.game_over.is_some() {
            return Ok(directive);
        }
        self.record_answer()
    }

    pub fn pause(&mut self) -> Result<()> {
        self.require(Operation::Pause, SessionStatus::Running)?;
        self.status = SessionStatus::Paused;
        self.timer.is_running = false;
        info!(elapsed_ms = self.timer.elapsed_ms, "session paused");
        Ok(())
    }

    /// Resumes and re-anchors the start timestamp so paused time is not counted.
    pub fn resume(&mut self, now_ms: u64) -> Result<()> {
        self.require(Operation::Resume, SessionStatus::Paused)?;
        self.status = SessionStatus::Running;
        self.timer.is_running = true;
        self.timer.start_timestamp = Some(now_ms.saturating_sub(self.timer.elapsed_ms));
        info!(elapsed_ms = self.timer.elapsed_ms, "session resumed");
        Ok(())
    }

    /// Player abandonment. No-op once the game is over.
    pub fn end(&mut self) -> Directive {
        self.end_with(GameOverReason::Abandoned)
    }

    pub fn end_with(&mut self, reason: GameOverReason) -> Directive {
        if self.is_game_over() {
            return self.last_directive;
        }
        self.finish(reason)
    }

    fn advance_clock(&mut self, now_ms: u64) {
        let start = self.timer.start_timestamp.unwrap_or(now_ms);
        // Never run the clock backwards.
        self.timer.elapsed_ms = now_ms.saturating_sub(start).max(self.timer.elapsed_ms);
        if let GameModeConfig::TimeLimited { total_time_ms } = self.config {
            self.timer.remaining_ms = Some(total_time_ms.saturating_sub(self.timer.elapsed_ms));
        }
    }

    fn finish(&mut self, reason: GameOverReason) -> Directive {
        self.status = SessionStatus::GameOver;
        self.timer.is_running = false;
        self.progress.is_game_over = true;
        self.last_directive = Directive::over(reason);
        info!(
            %reason,
            answered = self.progress.questions_answered,
            elapsed_ms = self.timer.elapsed_ms,
            "game over"
        );
        self.last_directive
    }

    fn require(&self, operation: Operation, expected: SessionStatus) -> Result<()> {
        if self.status == expected {
            Ok(())
        } else {
            Err(TriviaError::InvalidStateTransition {
                operation,
                state: self.status,
            })
        }
    }
}
