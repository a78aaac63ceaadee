use serde::{Deserialize, Serialize};

use crate::difficulty::DifficultyMultiplier;
use crate::error::{Result, TriviaError};

pub const BASE_POINTS: u32 = 100;
pub const STREAK_BONUS_CAP: u32 = 10;
pub const STREAK_BONUS_STEP: f64 = 0.1;
pub const TIME_BONUS_RATE: f64 = 0.5;
pub const DEFAULT_QUESTION_TIME_MS: u64 = 30_000;

/// Number of answer options shown per question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub enum AnswerOptionCount {
    Three,
    #[default]
    Four,
    Five,
}

impl AnswerOptionCount {
    pub fn count(self) -> usize {
        match self {
            AnswerOptionCount::Three => 3,
            AnswerOptionCount::Four => 4,
            AnswerOptionCount::Five => 5,
        }
    }

    pub fn multiplier(self) -> f64 {
        match self {
            AnswerOptionCount::Three => 1.0,
            AnswerOptionCount::Four => 1.2,
            AnswerOptionCount::Five => 1.4,
        }
    }
}

impl TryFrom<usize> for AnswerOptionCount {
    type Error = TriviaError;

    fn try_from(count: usize) -> Result<Self> {
        match count {
            3 => Ok(AnswerOptionCount::Three),
            4 => Ok(AnswerOptionCount::Four),
            5 => Ok(AnswerOptionCount::Five),
            n => Err(TriviaError::Config(format!(
                "answer option count must be 3, 4 or 5 (got {n})"
            ))),
        }
    }
}

impl From<AnswerOptionCount> for usize {
    fn from(count: AnswerOptionCount) -> Self {
        count.count()
    }
}

/// How base points are chosen. The two policies are never mixed.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ScoringPolicy {
    /// Flat 100 points scaled by difficulty, option count and streak.
    #[default]
    Compounding,
    /// 10/20/30 points by coarse difficulty, no multipliers.
    Tiered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSettings {
    pub policy: ScoringPolicy,
    pub time_bonus: bool,
    /// Per-question countdown the time bonus is measured against.
    pub question_time_ms: u64,
}

impl Default for ScoreSettings {
    fn default() -> Self {
        Self {
            policy: ScoringPolicy::Compounding,
            time_bonus: true,
            question_time_ms: DEFAULT_QUESTION_TIME_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreInput {
    pub is_correct: bool,
    pub difficulty_multiplier: DifficultyMultiplier,
    pub answer_option_count: AnswerOptionCount,
    pub remaining_time_ms: Option<u64>,
    pub current_streak: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ScoreResult {
    pub points_awarded: u32,
    pub new_streak: u32,
    /// Portion of `points_awarded` that came from the time bonus.
    pub time_bonus: u32,
}

pub fn streak_multiplier(streak: u32) -> f64 {
    1.0 + streak.min(STREAK_BONUS_CAP) as f64 * STREAK_BONUS_STEP
}

/// Base points for the tiered policy.
pub fn tiered_base_points(multiplier: DifficultyMultiplier) -> u32 {
    match multiplier.value() {
        m if m < 1.5 => 10,
        m if m < 2.0 => 20,
        _ => 30,
    }
}

/// Pure per-answer score computation. Holds only its settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreCalculator {
    settings: ScoreSettings,
}

impl ScoreCalculator {
    pub fn new(settings: ScoreSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ScoreSettings {
        &self.settings
    }

    pub fn compute(&self, input: &ScoreInput) -> ScoreResult {
        if !input.is_correct {
            return ScoreResult::default();
        }

        let base = self.base_points(input.difficulty_multiplier);
        let scaled = match self.settings.policy {
            ScoringPolicy::Compounding => (base as f64
                * input.difficulty_multiplier.value()
                * input.answer_option_count.multiplier()
                * streak_multiplier(input.current_streak))
            .round() as u32,
            ScoringPolicy::Tiered => base,
        };
        let time_bonus = self.time_bonus(base, input.remaining_time_ms);

        ScoreResult {
            points_awarded: scaled + time_bonus,
            new_streak: input.current_streak.saturating_add(1),
            time_bonus,
        }
    }

    pub fn base_points(&self, multiplier: DifficultyMultiplier) -> u32 {
        match self.settings.policy {
            ScoringPolicy::Compounding => BASE_POINTS,
            ScoringPolicy::Tiered => tiered_base_points(multiplier),
        }
    }

    fn time_bonus(&self, base: u32, remaining_time_ms: Option<u64>) -> u32 {
        let total = self.settings.question_time_ms;
        match remaining_time_ms {
            Some(remaining) if self.settings.time_bonus && total > 0 => {
                let fraction = remaining.min(total) as f64 / total as f64;
                (base as f64 * fraction * TIME_BONUS_RATE).floor() as u32
            }
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionRecord {
    pub is_correct: bool,
    pub points_awarded: u32,
    pub time_bonus: u32,
    pub streak_after: u32,
    pub remaining_time_ms: Option<u64>,
}

/// Running score for one session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreState {
    pub total_score: u64,
    pub streak: u32,
    pub best_streak: u32,
    pub history: Vec<QuestionRecord>,
}

impl ScoreState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the calculator input for the next answer from the current streak.
    pub fn input_for(
        &self,
        is_correct: bool,
        difficulty_multiplier: DifficultyMultiplier,
        answer_option_count: AnswerOptionCount,
        remaining_time_ms: Option<u64>,
    ) -> ScoreInput {
        ScoreInput {
            is_correct,
            difficulty_multiplier,
            answer_option_count,
            remaining_time_ms,
            current_streak: self.streak,
        }
    }

    pub fn record(&mut self, input: &ScoreInput, result: ScoreResult) {
        self.total_score += u64::from(result.points_awarded);
        self.streak = result.new_streak;
        self.best_streak = self.best_streak.max(self.streak);
        self.history.push(QuestionRecord {
            is_correct: input.is_correct,
            points_awarded: result.points_awarded,
            time_bonus: result.time_bonus,
            streak_after: result.new_streak,
            remaining_time_ms: input.remaining_time_ms,
        });
    }

    pub fn answered(&self) -> usize {
        self.history.len()
    }

    pub fn correct(&self) -> usize {
        self.history.iter().filter(|r| r.is_correct).count()
    }

    /// Percentage of correct answers, 0 when nothing was answered.
    pub fn accuracy(&self) -> f64 {
        if self.history.is_empty() {
            0.0
        } else {
            ((self.correct() as f64 / self.answered() as f64) * 100.0).round()
        }
    }
}
