use anyhow::{Context, Result};
use std::path::PathBuf;

pub(crate) const DEFAULT_CURRENCY: &str = "MVR";
pub(crate) const DEFAULT_LOG_FILTER: &str = "fintrack=info";

const DB_ENV: &str = "FINTRACK_DB";
const CURRENCY_ENV: &str = "FINTRACK_CURRENCY";
const LOG_ENV: &str = "FINTRACK_LOG";

#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub(crate) data_dir: PathBuf,
    pub(crate) db_path: PathBuf,
    pub(crate) log_path: PathBuf,
    /// Label appended to every formatted amount.
    pub(crate) currency: String,
    pub(crate) log_filter: String,
}

impl Config {
    /// Resolve paths and settings from the platform data directory and the
    /// `FINTRACK_*` environment variables, creating the data directory.
    pub(crate) fn load() -> Result<Self> {
        let proj_dirs = directories::ProjectDirs::from("com", "fintrack", "FinTrack")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        let config = Self::resolve(proj_dirs.data_dir().to_path_buf(), |key| {
            std::env::var(key).ok()
        });
        std::fs::create_dir_all(&config.data_dir).with_context(|| {
            format!(
                "Failed to create data directory: {}",
                config.data_dir.display()
            )
        })?;
        Ok(config)
    }

    fn resolve(data_dir: PathBuf, env: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let db_path = non_empty(DB_ENV)
            .map(|p| PathBuf::from(crate::run::shellexpand(&p)))
            .unwrap_or_else(|| data_dir.join("fintrack.db"));

        Self {
            log_path: data_dir.join("fintrack.log"),
            db_path,
            currency: non_empty(CURRENCY_ENV)
                .map(|c| c.trim().to_string())
                .unwrap_or_else(|| DEFAULT_CURRENCY.into()),
            log_filter: non_empty(LOG_ENV).unwrap_or_else(|| DEFAULT_LOG_FILTER.into()),
            data_dir,
        }
    }
}
