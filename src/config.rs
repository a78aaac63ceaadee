use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::app_dirs::AppDirs;
use crate::difficulty::DifficultyLabel;
use crate::error::{Result, TriviaError};
use crate::game_mode::GameModeConfig;
use crate::question::ANY_TOPIC;
use crate::scoring::{AnswerOptionCount, ScoreSettings, ScoringPolicy, DEFAULT_QUESTION_TIME_MS};
use crate::session::{SessionSettings, DEFAULT_ADVANCE_DELAY_MS};

/// Settings remembered between runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub time_secs: Option<u64>,
    pub questions: Option<u32>,
    pub difficulty: String,
    pub topic: String,
    pub answer_options: usize,
    pub time_bonus: bool,
    pub scoring: ScoringPolicy,
    pub question_secs: u64,
    pub player: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            time_secs: None,
            questions: Some(10),
            difficulty: "medium".to_string(),
            topic: ANY_TOPIC.to_string(),
            answer_options: 4,
            time_bonus: true,
            scoring: ScoringPolicy::Compounding,
            question_secs: DEFAULT_QUESTION_TIME_MS / 1000,
            player: std::env::var("USER").unwrap_or_else(|_| "player".to_string()),
        }
    }
}

impl Config {
    pub fn mode(&self) -> Result<GameModeConfig> {
        match (self.time_secs, self.questions) {
            (Some(_), Some(_)) => Err(TriviaError::Config(
                "choose either a time limit or a question limit, not both".to_string(),
            )),
            (Some(secs), None) => Ok(GameModeConfig::TimeLimited {
                total_time_ms: secs_to_ms(secs, "time limit")?,
            }),
            (None, Some(total_questions)) => Ok(GameModeConfig::QuestionLimited { total_questions }),
            (None, None) => Ok(GameModeConfig::Unlimited),
        }
    }

    /// Parses and validates everything a session needs.
    pub fn to_settings(&self) -> Result<SessionSettings> {
        let settings = SessionSettings {
            mode: self.mode()?,
            difficulty: self.difficulty.parse::<DifficultyLabel>()?,
            topic: self.topic.clone(),
            answer_options: AnswerOptionCount::try_from(self.answer_options)?,
            scoring: ScoreSettings {
                policy: self.scoring,
                time_bonus: self.time_bonus,
                question_time_ms: secs_to_ms(self.question_secs, "question countdown")?,
            },
            advance_delay_ms: DEFAULT_ADVANCE_DELAY_MS,
        };
        settings.validate()?;
        Ok(settings)
    }
}

fn secs_to_ms(secs: u64, what: &str) -> Result<u64> {
    secs.checked_mul(1000)
        .ok_or_else(|| TriviaError::Config(format!("{what} of {secs}s is too large")))
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(err) => {
                warn!(path = %self.path.display(), %err, "unreadable config, using defaults");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::StandardDifficulty;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            time_secs: Some(90),
            questions: None,
            difficulty: "custom:phd organic chemistry".into(),
            topic: "Science".into(),
            answer_options: 5,
            time_bonus: false,
            scoring: ScoringPolicy::Tiered,
            question_secs: 15,
            player: "ana".into(),
        };
        store.save(&cfg).unwrap();
        assert_eq!(store.load(), cfg);
    }

    #[test]
    fn corrupt_or_partial_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, b"{ not json").unwrap();
        assert_eq!(FileConfigStore::with_path(&path).load(), Config::default());

        fs::write(&path, br#"{"topic": "History"}"#).unwrap();
        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.topic, "History");
        assert_eq!(cfg.answer_options, 4);
    }

    #[test]
    fn default_config_builds_question_limited_settings() {
        let settings = Config::default().to_settings().unwrap();
        assert_eq!(
            settings.mode,
            GameModeConfig::QuestionLimited {
                total_questions: 10
            }
        );
        assert_eq!(
            settings.difficulty,
            DifficultyLabel::Standard(StandardDifficulty::Medium)
        );
        assert_eq!(settings.answer_options, AnswerOptionCount::Four);
        assert_eq!(settings.scoring.question_time_ms, 30_000);
    }

    #[test]
    fn mode_selection() {
        let mut cfg = Config {
            time_secs: Some(60),
            questions: None,
            ..Config::default()
        };
        assert_eq!(
            cfg.mode().unwrap(),
            GameModeConfig::TimeLimited {
                total_time_ms: 60_000
            }
        );
        cfg.time_secs = None;
        assert_eq!(cfg.mode().unwrap(), GameModeConfig::Unlimited);
        cfg.time_secs = Some(60);
        cfg.questions = Some(5);
        assert_matches!(cfg.mode(), Err(TriviaError::Config(_)));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let cfg = Config {
            answer_options: 6,
            ..Config::default()
        };
        assert_matches!(cfg.to_settings(), Err(TriviaError::Config(_)));

        let cfg = Config {
            difficulty: "custom:ab".into(),
            ..Config::default()
        };
        assert_matches!(cfg.to_settings(), Err(TriviaError::Validation(_)));

        let cfg = Config {
            time_secs: Some(0),
            questions: None,
            ..Config::default()
        };
        assert_matches!(cfg.to_settings(), Err(TriviaError::Config(_)));
    }

    #[test]
    fn oversized_durations_are_rejected() {
        let cfg = Config {
            time_secs: Some(u64::MAX / 10),
            questions: None,
            ..Config::default()
        };
        assert_matches!(cfg.mode(), Err(TriviaError::Config(_)));
        assert_matches!(cfg.to_settings(), Err(TriviaError::Config(_)));

        let cfg = Config {
            question_secs: u64::MAX / 10,
            ..Config::default()
        };
        assert_matches!(cfg.to_settings(), Err(TriviaError::Config(_)));
    }
}
