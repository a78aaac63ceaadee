use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn project() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "trivium")
    }

    pub fn config_path() -> PathBuf {
        Self::project()
            .map(|pd| pd.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("trivium_config.json"))
    }

    /// Results log under $HOME/.local/state/trivium when HOME is set.
    pub fn results_path() -> PathBuf {
        Self::state_dir()
            .map(|dir| dir.join("results.csv"))
            .unwrap_or_else(|| PathBuf::from("trivium_results.csv"))
    }

    pub fn log_path() -> PathBuf {
        Self::state_dir()
            .map(|dir| dir.join("trivium.log"))
            .unwrap_or_else(|| PathBuf::from("trivium.log"))
    }

    fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(PathBuf::from(home).join(".local").join("state").join("trivium"))
        } else {
            Self::project().map(|pd| pd.data_local_dir().to_path_buf())
        }
    }
}
