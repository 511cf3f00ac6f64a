use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use studydesk_lib::flashcards::{JsonCardStore, ReviewSession};
use studydesk_lib::planner::{JsonTaskStore, PlannerEngine};
use studydesk_lib::preferences::PreferenceContext;
use studydesk_lib::storage::default_data_dir;
use studydesk_lib::AppConfig;

/// Shared application state for CLI commands
pub struct App {
    pub data_dir: PathBuf,
    pub config: AppConfig,
    pub cards: Arc<JsonCardStore>,
    pub tasks: Arc<JsonTaskStore>,
}

impl App {
    /// Initialize from an explicit data directory or the default one.
    /// Without an explicit directory, `data_dir` in the config may redirect the stores.
    pub fn new(data_dir: Option<&Path>) -> Result<Self> {
        let config_dir = match data_dir {
            Some(dir) => dir.to_path_buf(),
            None => default_data_dir().context("Failed to get data directory")?,
        };

        let config = AppConfig::load_from_dir(&config_dir)
            .with_context(|| format!("Failed to load config from {:?}", config_dir))?;

        let data_dir = match data_dir {
            Some(_) => config_dir,
            None => config
                .resolve_data_dir()
                .context("Failed to get data directory")?,
        };
        log::debug!("Using data directory {:?}", data_dir);

        Ok(Self {
            cards: Arc::new(JsonCardStore::new(&data_dir)),
            tasks: Arc::new(JsonTaskStore::new(&data_dir)),
            data_dir,
            config,
        })
    }

    pub fn review_session(&self) -> ReviewSession {
        ReviewSession::new(self.cards.clone(), self.config.scheduler.clone())
    }

    pub fn planner(&self) -> PlannerEngine {
        PlannerEngine::new(self.tasks.clone(), self.config.planner.clone())
    }

    pub fn preferences(&self) -> Result<PreferenceContext> {
        let path = self.data_dir.join("preferences.json");
        PreferenceContext::load(&path)
            .with_context(|| format!("Failed to load preferences from {:?}", path))
    }
}
