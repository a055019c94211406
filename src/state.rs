use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use crate::ai::{Estimator, GeminiClient, GenerativeModel};
use crate::config::AppConfig;
use crate::store::{EventStore, MemoryStore, PgStore, SettingsStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub events: Arc<dyn EventStore>,
    pub settings: Arc<dyn SettingsStore>,
    pub estimator: Estimator,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let model = Arc::new(GeminiClient::new(&config.gemini).context("build gemini client")?)
            as Arc<dyn GenerativeModel>;
        if !model.is_configured() {
            warn!("GEMINI_API_KEY not set; AI estimation requests will be refused");
        }
        let estimator = Estimator::new(model, config.gemini.timeout());

        let (events, settings): (Arc<dyn EventStore>, Arc<dyn SettingsStore>) =
            match &config.database_url {
                Some(url) => {
                    let db = sqlx::postgres::PgPoolOptions::new()
                        .max_connections(config.db_max_connections)
                        .connect(url)
                        .await
                        .context("connect to database")?;

                    // Run migrations if present
                    if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
                        warn!(error = %e, "migrations folder not found or migration failed; continuing");
                    }

                    let store = Arc::new(PgStore::new(db));
                    let events: Arc<dyn EventStore> = store.clone();
                    let settings: Arc<dyn SettingsStore> = store;
                    (events, settings)
                }
                None => {
                    info!("DATABASE_URL not set; using in-memory store");
                    let store = Arc::new(MemoryStore::new());
                    let events: Arc<dyn EventStore> = store.clone();
                    let settings: Arc<dyn SettingsStore> = store;
                    (events, settings)
                }
            };

        Ok(Self::from_parts(config, events, settings, estimator))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        events: Arc<dyn EventStore>,
        settings: Arc<dyn SettingsStore>,
        estimator: Estimator,
    ) -> Self {
        Self {
            config,
            events,
            settings,
            estimator,
        }
    }

    /// In-memory state around the given model, for tests.
    #[cfg(test)]
    pub fn fake(model: Arc<dyn GenerativeModel>) -> (Self, Arc<MemoryStore>) {
        let config = Arc::new(AppConfig::default());
        let store = Arc::new(MemoryStore::new());
        let estimator = Estimator::new(model, std::time::Duration::from_millis(200));
        (
            Self::from_parts(config, store.clone(), store.clone(), estimator),
            store,
        )
    }
}
