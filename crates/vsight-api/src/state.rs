//! Application state.

use std::sync::Arc;

use vsight_engine::{EngineConfig, EngineError, Orchestrator};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    /// Create new application state, initializing the engine's work
    /// directory.
    pub async fn new(config: ApiConfig, engine_config: EngineConfig) -> Result<Self, EngineError> {
        let orchestrator = Orchestrator::new(engine_config).await?;

        Ok(Self {
            config,
            orchestrator: Arc::new(orchestrator),
        })
    }
}
