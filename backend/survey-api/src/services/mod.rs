use chrono::Duration as ChronoDuration;
use redis::aio::ConnectionManager;
use std::sync::Arc;

use crate::config::{clamp_session_ttl, Config, StorageConfig};

use self::session_service::{SessionRegistry, SessionSettings};
use self::survey_store::{FileSurveyStore, RedisSurveyStore, SurveyStore};

pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn SurveyStore>,
    pub sessions: SessionRegistry,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store: Arc<dyn SurveyStore> = match &config.storage {
            StorageConfig::File { path } => {
                tracing::info!(path = %path.display(), "Using file survey store");
                Arc::new(FileSurveyStore::new(path.clone()))
            }
            StorageConfig::Redis { uri } => {
                tracing::info!("Attempting to connect to Redis...");
                let client = redis::Client::open(uri.as_str())?;

                let redis = tokio::time::timeout(
                    std::time::Duration::from_secs(30),
                    ConnectionManager::new(client),
                )
                .await
                .map_err(|_| anyhow::anyhow!("Redis connection timeout after 30s"))??;

                let store = RedisSurveyStore::new(redis, config.storage_key.clone());
                store.ping().await?;
                tracing::info!("Redis connection established successfully");
                Arc::new(store)
            }
        };

        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: Config, store: Arc<dyn SurveyStore>) -> Self {
        let sessions = SessionRegistry::new(SessionSettings {
            ttl: clamp_session_ttl(config.session_ttl_seconds)
                .and_then(ChronoDuration::try_seconds)
                .unwrap_or_else(|| SessionSettings::default().ttl),
            max_pointer_samples: config.pointer_max_samples,
        });

        Self {
            config,
            store,
            sessions,
        }
    }
}

pub mod export_encoder;
pub mod pointer_tracker;
pub mod response_accumulator;
pub mod session_service;
pub mod survey_service;
pub mod survey_store;
pub mod validation;
