use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::info;

use campus_assistant::Assistant;
use campus_auth::Authenticator;
use campus_billing::PaymentGateway;
use campus_config::AppConfig;
use campus_database::initialize_database;

pub mod telemetry {
    use anyhow::Result;
    use tracing::Level;
    use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

    pub fn init_tracing() -> Result<()> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = SubscriberBuilder::default()
            .with_max_level(Level::INFO)
            .with_env_filter(env_filter)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|error| anyhow::anyhow!("failed to set tracing subscriber: {error}"))
    }
}

/// Everything the HTTP layer needs, wired from configuration.
#[derive(Clone)]
pub struct BackendServices {
    pub db_pool: SqlitePool,
    pub authenticator: Authenticator,
    pub billing: Arc<dyn PaymentGateway>,
    pub assistant: Arc<Assistant>,
}

impl BackendServices {
    pub async fn initialise(config: &AppConfig) -> Result<Self> {
        let db_pool = initialize_database(&config.database)
            .await
            .context("failed to initialize database")?;

        let authenticator = Authenticator::new(db_pool.clone(), config.auth.clone());

        let billing = campus_billing::from_config(&config.billing)
            .context("failed to build payment gateway")?;

        let assistant = Arc::new(
            campus_assistant::from_config(&config.assistant)
                .context("failed to build assistant provider chain")?,
        );
        info!(
            configured = assistant.is_configured(),
            "assistant provider chain ready"
        );

        Ok(Self {
            db_pool,
            authenticator,
            billing,
            assistant,
        })
    }
}

pub async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(?error, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
