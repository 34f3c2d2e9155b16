use std::sync::Arc;

use axum::Router;
use homefinder_agent::ConversationController;
use homefinder_core::config::{AppConfig, ConfigError, LoadOptions};
use homefinder_core::contact::ContactDispatcher;
use homefinder_core::search::SearchEngine;
use homefinder_core::store::{ListingStore, StoreError};
use thiserror::Error;
use tracing::info;

use crate::contact::ChannelDispatcher;
use crate::health::HealthState;
use crate::{api, health};

pub struct Application {
    pub config: AppConfig,
    pub store: Arc<ListingStore>,
    pub controller: Arc<ConversationController>,
    pub contact_channels: Vec<&'static str>,
}

impl Application {
    pub fn router(&self) -> Router {
        api::router(self.controller.clone()).merge(health::router(HealthState {
            store: self.store.clone(),
            contact_channels: self.contact_channels.clone(),
        }))
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("listing dataset could not be loaded: {0}")]
    Store(#[from] StoreError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    bootstrap_with_config(AppConfig::load(options)?).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    let store = Arc::new(ListingStore::from_json_path(&config.data.listings_path)?);
    let (min_rent, max_rent) = store.price_range();
    info!(
        event_name = "system.bootstrap.dataset_loaded",
        correlation_id = "bootstrap",
        path = %config.data.listings_path.display(),
        listing_count = store.len(),
        min_rent,
        max_rent,
        "listing dataset loaded"
    );

    let engine = SearchEngine::new(store.clone())
        .with_weights(config.search.weights)
        .with_default_top_n(config.search.default_top_n);
    let mut controller = ConversationController::new(engine);

    let mut contact_channels = Vec::new();
    if let Some(dispatcher) = ChannelDispatcher::from_config(&config.contact) {
        contact_channels = dispatcher.channels();
        let dispatcher: Arc<dyn ContactDispatcher> = Arc::new(dispatcher);
        controller = controller.with_dispatcher(dispatcher);
    }
    info!(
        event_name = "system.bootstrap.contact_configured",
        correlation_id = "bootstrap",
        channels = ?contact_channels,
        "contact channels resolved"
    );

    Ok(Application { config, store, controller: Arc::new(controller), contact_channels })
}
