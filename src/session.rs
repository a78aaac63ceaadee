//! Reference host for one play-through.
//!
//! Wires a [`GameModeController`] and a [`ScoreCalculator`] to a
//! [`QuestionSource`] the way a front end is expected to: the controller
//! decides whether to go on, the calculator scores each answer independently,
//! and the host owns question identity, the "already answered" guard and the
//! feedback delay before the next question.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::difficulty::{DifficultyLabel, DifficultyMultiplier};
use crate::error::Result;
use crate::game_mode::{
    Directive, GameModeConfig, GameModeController, GameOverReason, SessionStatus,
};
use crate::question::{QuestionSource, TriviaQuestion, ANY_TOPIC};
use crate::scoring::{AnswerOptionCount, ScoreCalculator, ScoreResult, ScoreSettings, ScoreState};

/// How long correctness feedback stays up before the next question.
pub const DEFAULT_ADVANCE_DELAY_MS: u64 = 2000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSettings {
    pub mode: GameModeConfig,
    pub difficulty: DifficultyLabel,
    pub topic: String,
    pub answer_options: AnswerOptionCount,
    pub scoring: ScoreSettings,
    pub advance_delay_ms: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            mode: GameModeConfig::default(),
            difficulty: DifficultyLabel::default(),
            topic: ANY_TOPIC.to_string(),
            answer_options: AnswerOptionCount::default(),
            scoring: ScoreSettings::default(),
            advance_delay_ms: DEFAULT_ADVANCE_DELAY_MS,
        }
    }
}

impl SessionSettings {
    /// Everything that must hold before a session may start.
    pub fn validate(&self) -> Result<()> {
        self.mode.validate()?;
        self.difficulty.validate().into_result()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub chosen: usize,
    pub correct_index: Option<usize>,
    pub is_correct: bool,
    pub score: ScoreResult,
    pub directive: Directive,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub mode: GameModeConfig,
    pub difficulty: DifficultyLabel,
    pub topic: String,
    pub score: u64,
    pub correct: usize,
    pub answered: usize,
    pub best_streak: u32,
    pub accuracy: f64,
    pub elapsed_ms: u64,
    pub reason: Option<GameOverReason>,
}

#[derive(Debug)]
pub struct Session {
    settings: SessionSettings,
    multiplier: DifficultyMultiplier,
    controller: GameModeController,
    calculator: ScoreCalculator,
    score: ScoreState,
    current: Option<TriviaQuestion>,
    question_started_at: Option<u64>,
    answered_current: bool,
    pending_advance: Option<u64>,
    paused_at: Option<u64>,
    last_feedback: Option<AnswerFeedback>,
}

impl Session {
    pub fn new(settings: SessionSettings) -> Result<Self> {
        settings.validate()?;
        let controller = GameModeController::new(settings.mode)?;
        Ok(Self {
            multiplier: settings.difficulty.multiplier(),
            calculator: ScoreCalculator::new(settings.scoring),
            controller,
            settings,
            score: ScoreState::new(),
            current: None,
            question_started_at: None,
            answered_current: false,
            pending_advance: None,
            paused_at: None,
            last_feedback: None,
        })
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn multiplier(&self) -> DifficultyMultiplier {
        self.multiplier
    }

    pub fn controller(&self) -> &GameModeController {
        &self.controller
    }

    pub fn score(&self) -> &ScoreState {
        &self.score
    }

    pub fn current_question(&self) -> Option<&TriviaQuestion> {
        self.current.as_ref()
    }

    pub fn last_feedback(&self) -> Option<&AnswerFeedback> {
        self.last_feedback.as_ref()
    }

    pub fn pending_advance(&self) -> Option<u64> {
        self.pending_advance
    }

    pub fn is_answered(&self) -> bool {
        self.answered_current
    }

    pub fn status(&self) -> SessionStatus {
        self.controller.status()
    }

    pub fn is_over(&self) -> bool {
        self.controller.is_game_over()
    }

    pub fn start(&mut self, now_ms: u64, source: &mut dyn QuestionSource) -> Result<()> {
        self.controller.start(now_ms)?;
        self.load_next(now_ms, source);
        Ok(())
    }

    /// Clears all per-session state so the same settings can be played again.
    pub fn restart(&mut self, now_ms: u64, source: &mut dyn QuestionSource) -> Result<()> {
        self.controller.reset();
        self.score = ScoreState::new();
        self.current = None;
        self.question_started_at = None;
        self.answered_current = false;
        self.pending_advance = None;
        self.paused_at = None;
        self.last_feedback = None;
        self.start(now_ms, source)
    }

    /// Remaining time on the current question's countdown.
    pub fn question_remaining_ms(&self, now_ms: u64) -> Option<u64> {
        let started = self.question_started_at?;
        let elapsed = now_ms.saturating_sub(started);
        Some(self.settings.scoring.question_time_ms.saturating_sub(elapsed))
    }

    /// Submits the player's choice for the current question.
    ///
    /// Returns `None` when the answer is ignored: a repeat submission for the
    /// same question, no question on screen, a session that is not running, or
    /// an answer that arrived after the clock ran out.
    pub fn answer(&mut self, index: usize, now_ms: u64) -> Option<AnswerFeedback> {
        if self.answered_current {
            debug!(index, "question already answered, ignoring");
            return None;
        }
        if self.controller.status() != SessionStatus::Running {
            debug!(status = %self.controller.status(), "answer outside a running session, ignoring");
            return None;
        }
        let question = self.current.as_ref()?;

        let answered_before = self.controller.progress().questions_answered;
        let directive = lenient(self.controller.record_answer_at(now_ms))?;
        if self.controller.progress().questions_answered == answered_before {
            debug!("answer arrived after time expired");
            self.pending_advance = None;
            return None;
        }
        self.answered_current = true;

        let is_correct = question.is_correct(index);
        let options = question
            .option_count()
            .unwrap_or(self.settings.answer_options);
        let input = self.score.input_for(
            is_correct,
            self.multiplier,
            options,
            self.question_remaining_ms(now_ms),
        );
        let result = self.calculator.compute(&input);
        self.score.record(&input, result);
        debug!(
            is_correct,
            points = result.points_awarded,
            streak = result.new_streak,
            "answer scored"
        );

        self.pending_advance = if directive.load_next {
            Some(now_ms + self.settings.advance_delay_ms)
        } else {
            None
        };

        let feedback = AnswerFeedback {
            chosen: index,
            correct_index: question.correct_index(),
            is_correct,
            score: result,
            directive,
        };
        self.last_feedback = Some(feedback);
        Some(feedback)
    }

    /// Host interval callback. Advances the clock and, once the feedback
    /// delay has passed, loads the next question.
    pub fn tick(&mut self, now_ms: u64, source: &mut dyn QuestionSource) -> Directive {
        match self.controller.status() {
            SessionStatus::Running => {}
            _ => {
                if self.controller.is_game_over() {
                    self.pending_advance = None;
                }
                return self.controller.last_directive();
            }
        }

        let directive = match lenient(self.controller.tick(now_ms)) {
            Some(directive) => directive,
            None => return self.controller.last_directive(),
        };
        if directive.game_over.is_some() {
            self.pending_advance = None;
            return directive;
        }

        if self.pending_advance.is_some_and(|due| now_ms >= due) {
            self.pending_advance = None;
            self.load_next(now_ms, source);
        }
        self.controller.last_directive()
    }

    /// Catches the clock up to `now_ms` before pausing; a session whose time
    /// ran out in the meantime ends instead of pausing.
    pub fn pause(&mut self, now_ms: u64) -> bool {
        if self.controller.status() == SessionStatus::Running {
            let caught_up = lenient(self.controller.tick(now_ms));
            if caught_up.is_some_and(|d| d.game_over.is_some()) {
                self.pending_advance = None;
                return false;
            }
        }
        if lenient(self.controller.pause()).is_none() {
            return false;
        }
        self.paused_at = Some(now_ms);
        true
    }

    /// Resumes play and shifts the feedback delay and question countdown by
    /// the paused interval.
    pub fn resume(&mut self, now_ms: u64) -> bool {
        if lenient(self.controller.resume(now_ms)).is_none() {
            return false;
        }
        let paused_for = self
            .paused_at
            .take()
            .map_or(0, |at| now_ms.saturating_sub(at));
        if let Some(due) = self.pending_advance.as_mut() {
            *due += paused_for;
        }
        if let Some(started) = self.question_started_at.as_mut() {
            *started += paused_for;
        }
        true
    }

    /// Ends the session and drops any scheduled advance.
    pub fn abandon(&mut self) -> Directive {
        self.pending_advance = None;
        self.controller.end()
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            mode: self.settings.mode,
            difficulty: self.settings.difficulty.clone(),
            topic: self.settings.topic.clone(),
            score: self.score.total_score,
            correct: self.score.correct(),
            answered: self.score.answered(),
            best_streak: self.score.best_streak,
            accuracy: self.score.accuracy(),
            elapsed_ms: self.controller.timer().elapsed_ms,
            reason: self.controller.game_over_reason(),
        }
    }

    fn load_next(&mut self, now_ms: u64, source: &mut dyn QuestionSource) {
        let next = source.next_question(
            &self.settings.topic,
            &self.settings.difficulty,
            self.settings.answer_options,
        );
        match next {
            Some(question) => {
                debug!(topic = %question.topic, "question loaded");
                self.current = Some(question);
                self.question_started_at = Some(now_ms);
                self.answered_current = false;
            }
            None => {
                warn!(topic = %self.settings.topic, "question source exhausted");
                self.current = None;
                self.question_started_at = None;
                self.controller.end_with(GameOverReason::OutOfQuestions);
            }
        }
    }
}

// Controller misuse from a live session is logged and treated as a no-op.
fn lenient<T>(result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(%err, "ignoring controller call");
            None
        }
    }
}
