//! Application state and initialization
//!
//! Holds the configuration and the gateway. The store is opened on first
//! use, exactly once, even when several tasks ask for it at the same time.

use crate::config::AppConfig;
use crate::database::Store;
use crate::error::Result;
use crate::services::{Gateway, RecipeService};
use crate::timestamp::DisplayFormat;
use tokio::sync::OnceCell;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `default_filter`. Later calls leave the first
/// subscriber in place.
pub fn init_logging(default_filter: &str) {
    let result = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();

    if result.is_err() {
        tracing::debug!("Logging already initialized");
    }
}

struct OpenStore {
    store: Store,
    gateway: Gateway,
}

/// Central application state
pub struct AppState {
    config: AppConfig,
    open: OnceCell<OpenStore>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            open: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    async fn open(&self) -> Result<&OpenStore> {
        self.open
            .get_or_try_init(|| async {
                tracing::info!("Initializing store at {:?}", self.config.database_path);

                let format = DisplayFormat::from_config(&self.config)?;
                let store = Store::open(&self.config.database_path).await?;
                let gateway = Gateway::new(&store, format);

                Ok(OpenStore { store, gateway })
            })
            .await
    }

    /// The gateway, opening the store on first call.
    ///
    /// Failing to open the store is an error here, not a degraded gateway.
    pub async fn gateway(&self) -> Result<&Gateway> {
        Ok(&self.open().await?.gateway)
    }

    pub async fn recipes(&self) -> Result<RecipeService> {
        Ok(RecipeService::new(self.gateway().await?.clone()))
    }

    /// Close the store if it was opened
    pub async fn shutdown(&self) {
        if let Some(open) = self.open.get() {
            open.store.close().await;
        }
    }
}
