use std::sync::Arc;

use tracing::info;

use super::{
    config::{Config, StoreBackend},
    database::RedisStore,
    error::AppError,
    identity::{IdentityGate, SessionGate},
    store::{CampaignStore, MemoryStore},
    uploads::UploadStore,
};

pub struct State {
    pub config: Config,
    pub store: Arc<dyn CampaignStore>,
    pub uploads: UploadStore,
    pub gate: Arc<dyn IdentityGate>,
}

impl State {
    pub async fn new() -> Result<Arc<Self>, AppError> {
        let config = Config::load()?;

        let store: Arc<dyn CampaignStore> = match config.store_backend {
            StoreBackend::Redis => Arc::new(
                RedisStore::connect(&config.redis_url)
                    .await
                    .map_err(|e| AppError::InternalError(Box::new(e)))?,
            ),
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
        };
        info!("Campaign store backend: {}", store.backend_tag());

        let gate = SessionGate::new(&config.session_secret)
            .map_err(|e| AppError::Config(format!("session secret: {e}")))?;

        Ok(Self::with_parts(config, store, Arc::new(gate)))
    }

    pub fn with_parts(
        config: Config,
        store: Arc<dyn CampaignStore>,
        gate: Arc<dyn IdentityGate>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            store,
            uploads: UploadStore::new(),
            gate,
        })
    }
}
