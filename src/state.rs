use std::{sync::Arc, time::Duration};

use tracing::{info, warn};

use crate::calories::CalorieTable;
use crate::config::AppConfig;
use crate::drafts::store::DraftStore;
use crate::meals::repo::{InMemoryMealRepository, MealRepository, PgMealRepository};
use crate::storage::{Storage, StorageClient};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn MealRepository>,
    pub calories: Arc<CalorieTable>,
    pub drafts: DraftStore,
    pub storage: Option<Arc<dyn StorageClient>>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let repo = match &config.database_url {
            Some(url) => {
                Arc::new(PgMealRepository::connect(url).await?) as Arc<dyn MealRepository>
            }
            None => {
                warn!("DATABASE_URL not set, meals are kept in memory only");
                Arc::new(InMemoryMealRepository::default()) as Arc<dyn MealRepository>
            }
        };

        let storage = match &config.storage {
            Some(cfg) => Some(Arc::new(Storage::new(cfg).await?) as Arc<dyn StorageClient>),
            None => {
                warn!("S3 storage not configured, photo uploads are disabled");
                None
            }
        };

        let calories = match &config.calorie_table_path {
            Some(path) => CalorieTable::from_json_file(path)?,
            None => CalorieTable::default(),
        };
        info!(entries = calories.len(), "calorie table ready");

        Ok(Self::from_parts(repo, Arc::new(calories), storage, config))
    }

    pub fn from_parts(
        repo: Arc<dyn MealRepository>,
        calories: Arc<CalorieTable>,
        storage: Option<Arc<dyn StorageClient>>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            repo,
            calories,
            drafts: DraftStore::with_idle_timeout(Duration::from_secs(config.draft_idle_secs)),
            storage,
            config,
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            database_url: None,
            storage: None,
            photo_url_ttl_secs: 600,
            calorie_table_path: None,
            draft_idle_secs: 3600,
            host: "127.0.0.1".into(),
            port: 0,
        });
        Self::from_parts(
            Arc::new(InMemoryMealRepository::default()),
            Arc::new(CalorieTable::default()),
            Some(Arc::new(crate::storage::MemoryStorage::default())),
            config,
        )
    }
}
