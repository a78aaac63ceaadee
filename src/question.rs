use include_dir::{include_dir, Dir};
use itertools::Itertools;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::path::Path;
use tracing::{debug, info};

use crate::difficulty::DifficultyLabel;
use crate::error::{Result, TriviaError};
use crate::scoring::AnswerOptionCount;

static QUESTION_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/questions");

/// Matches every topic when passed to a [`QuestionSource`].
pub const ANY_TOPIC: &str = "any";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOption {
    pub text: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriviaQuestion {
    pub question: String,
    pub answers: Vec<AnswerOption>,
    pub difficulty: DifficultyLabel,
    #[serde(default)]
    pub topic: String,
}

impl TriviaQuestion {
    pub fn option_count(&self) -> Result<AnswerOptionCount> {
        AnswerOptionCount::try_from(self.answers.len())
    }

    pub fn correct_index(&self) -> Option<usize> {
        self.answers.iter().position(|a| a.is_correct)
    }

    /// Out-of-range indexes are wrong answers.
    pub fn is_correct(&self, index: usize) -> bool {
        self.answers.get(index).is_some_and(|a| a.is_correct)
    }

    pub fn validate(&self) -> Result<()> {
        if self.question.trim().is_empty() {
            return Err(TriviaError::Validation("question text is empty".to_string()));
        }
        let correct = self.answers.iter().filter(|a| a.is_correct).count();
        if correct != 1 {
            return Err(TriviaError::Validation(format!(
                "\"{}\" has {correct} correct answers, expected exactly 1",
                self.question
            )));
        }
        Ok(())
    }

    /// Keeps the correct answer plus enough wrong ones to fill `options`, in
    /// random order.
    pub fn with_options<R: rand::Rng + ?Sized>(
        &self,
        options: AnswerOptionCount,
        rng: &mut R,
    ) -> Result<TriviaQuestion> {
        self.validate()?;
        let wanted = options.count();
        if self.answers.len() < wanted {
            return Err(TriviaError::Validation(format!(
                "\"{}\" has {} answers, {wanted} needed",
                self.question,
                self.answers.len()
            )));
        }

        let (mut correct, mut wrong): (Vec<_>, Vec<_>) =
            self.answers.iter().cloned().partition(|a| a.is_correct);
        wrong.shuffle(rng);
        correct.extend(wrong.into_iter().take(wanted - 1));
        correct.shuffle(rng);

        Ok(TriviaQuestion {
            answers: correct,
            ..self.clone()
        })
    }
}

/// Supplies questions to a session. Stands in for the question generation
/// service.
pub trait QuestionSource {
    /// `None` when nothing more can be served for this topic.
    fn next_question(
        &mut self,
        topic: &str,
        difficulty: &DifficultyLabel,
        options: AnswerOptionCount,
    ) -> Option<TriviaQuestion>;
}

/// Serves pre-built questions in order, ignoring the request.
impl QuestionSource for VecDeque<TriviaQuestion> {
    fn next_question(
        &mut self,
        _topic: &str,
        _difficulty: &DifficultyLabel,
        _options: AnswerOptionCount,
    ) -> Option<TriviaQuestion> {
        self.pop_front()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuestionPack {
    pub topic: String,
    pub questions: Vec<TriviaQuestion>,
}

impl QuestionPack {
    pub fn from_json(json: &str) -> Result<Self> {
        let mut pack: QuestionPack = serde_json::from_str(json)?;
        for question in pack.questions.iter_mut() {
            question.validate()?;
            if question.topic.is_empty() {
                question.topic = pack.topic.clone();
            }
        }
        Ok(pack)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

/// Shuffled question pool. Serves each matching question once before
/// repeating any.
#[derive(Debug)]
pub struct QuestionBank {
    questions: Vec<TriviaQuestion>,
    served: HashSet<usize>,
    rng: StdRng,
}

impl QuestionBank {
    pub fn new(packs: Vec<QuestionPack>, rng: StdRng) -> Self {
        let questions = packs.into_iter().flat_map(|p| p.questions).collect();
        Self {
            questions,
            served: HashSet::new(),
            rng,
        }
    }

    /// The packs compiled into the binary.
    pub fn bundled() -> Result<Self> {
        Ok(Self::new(bundled_packs()?, StdRng::from_entropy()))
    }

    pub fn bundled_with_seed(seed: u64) -> Result<Self> {
        Ok(Self::new(bundled_packs()?, StdRng::seed_from_u64(seed)))
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn topics(&self) -> Vec<String> {
        self.questions
            .iter()
            .map(|q| q.topic.clone())
            .unique()
            .sorted()
            .collect()
    }

    fn candidates(&self, topic: &str, options: AnswerOptionCount) -> Vec<usize> {
        self.questions
            .iter()
            .enumerate()
            .filter(|(_, q)| {
                topic.eq_ignore_ascii_case(ANY_TOPIC) || q.topic.eq_ignore_ascii_case(topic)
            })
            .filter(|(_, q)| q.answers.len() >= options.count())
            .map(|(idx, _)| idx)
            .collect()
    }
}

impl QuestionSource for QuestionBank {
    fn next_question(
        &mut self,
        topic: &str,
        difficulty: &DifficultyLabel,
        options: AnswerOptionCount,
    ) -> Option<TriviaQuestion> {
        let candidates = self.candidates(topic, options);
        if candidates.is_empty() {
            debug!(topic, "no questions for topic");
            return None;
        }

        let mut unserved: Vec<usize> = candidates
            .iter()
            .copied()
            .filter(|idx| !self.served.contains(idx))
            .collect();
        if unserved.is_empty() {
            info!(topic, "question pool exhausted, reshuffling");
            for idx in &candidates {
                self.served.remove(idx);
            }
            unserved = candidates;
        }

        let idx = *unserved.choose(&mut self.rng)?;
        self.served.insert(idx);

        let mut question = self.questions[idx].with_options(options, &mut self.rng).ok()?;
        question.difficulty = difficulty.clone();
        Some(question)
    }
}

pub fn bundled_packs() -> Result<Vec<QuestionPack>> {
    QUESTION_DIR
        .files()
        .filter(|f| f.path().extension().is_some_and(|ext| ext == "json"))
        .sorted_by_key(|f| f.path().to_path_buf())
        .map(|f| {
            let json = f.contents_utf8().ok_or_else(|| {
                TriviaError::Config(format!("{} is not valid UTF-8", f.path().display()))
            })?;
            QuestionPack::from_json(json)
        })
        .collect()
}
