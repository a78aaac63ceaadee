use chrono::{DateTime, Local};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::Result;
use crate::session::SessionSummary;

/// One finished game as stored in the results log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameResult {
    pub played_at: DateTime<Local>,
    pub player: String,
    pub topic: String,
    pub difficulty: String,
    pub mode: String,
    pub score: u64,
    pub correct: u32,
    pub answered: u32,
    pub best_streak: u32,
}

impl GameResult {
    pub fn from_summary(
        summary: &SessionSummary,
        player: &str,
        played_at: DateTime<Local>,
    ) -> Self {
        Self {
            played_at,
            player: player.to_string(),
            topic: summary.topic.clone(),
            difficulty: summary.difficulty.to_string(),
            mode: summary.mode.to_string(),
            score: summary.score,
            correct: summary.correct as u32,
            answered: summary.answered as u32,
            best_streak: summary.best_streak,
        }
    }

    pub fn accuracy(&self) -> f64 {
        if self.answered == 0 {
            0.0
        } else {
            (self.correct as f64 / self.answered as f64) * 100.0
        }
    }
}

// Higher score first, then better accuracy, then whoever got there first.
fn ranking(a: &GameResult, b: &GameResult) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| {
            b.accuracy()
                .partial_cmp(&a.accuracy())
                .unwrap_or(Ordering::Equal)
        })
        .then_with(|| a.played_at.cmp(&b.played_at))
}

/// Results log backed by a CSV file.
#[derive(Debug)]
pub struct Leaderboard {
    path: PathBuf,
    results: Vec<GameResult>,
}

impl Leaderboard {
    /// A missing file is an empty board.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let results = if path.exists() {
            let mut reader = csv::Reader::from_path(&path)?;
            reader
                .deserialize::<GameResult>()
                .collect::<std::result::Result<Vec<_>, _>>()?
        } else {
            Vec::new()
        };
        Ok(Self { path, results })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Appends to the log, writing the header only for a new file.
    pub fn record(&mut self, result: GameResult) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let needs_header = fs::metadata(&self.path).map_or(true, |m| m.len() == 0);

        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(&result)?;
        writer.flush()?;

        info!(score = result.score, player = %result.player, "result recorded");
        self.results.push(result);
        Ok(())
    }

    pub fn top(&self, n: usize) -> Vec<&GameResult> {
        self.results
            .iter()
            .sorted_by(|a, b| ranking(a, b))
            .take(n)
            .collect()
    }

    /// 1-based position of `result` among all recorded results.
    pub fn rank_of(&self, result: &GameResult) -> Option<usize> {
        self.results
            .iter()
            .sorted_by(|a, b| ranking(a, b))
            .position(|r| r == result)
            .map(|idx| idx + 1)
    }
}
