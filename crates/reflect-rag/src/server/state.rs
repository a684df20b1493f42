//! Shared application state for the HTTP server

use std::sync::Arc;

use crate::config::ReflectConfig;
use crate::error::Result;
use crate::pipeline::{SelfRag, Services};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ReflectConfig,
    services: Services,
    pipeline: SelfRag,
}

impl AppState {
    /// Initialize services from configuration
    pub fn new(config: ReflectConfig) -> Result<Self> {
        let services = Services::from_config(&config)?;
        Ok(Self::with_services(config, services))
    }

    /// Build state around already-initialized services
    pub fn with_services(config: ReflectConfig, services: Services) -> Self {
        let pipeline = SelfRag::new(&services, config.retrieval.top_k);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                services,
                pipeline,
            }),
        }
    }

    pub fn config(&self) -> &ReflectConfig {
        &self.inner.config
    }

    pub fn services(&self) -> &Services {
        &self.inner.services
    }

    pub fn pipeline(&self) -> &SelfRag {
        &self.inner.pipeline
    }
}
