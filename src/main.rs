//! # Membership API Main Entry Point
//!
//! This is the main entry point for the Membership API service.

use std::sync::Arc;

use membership::{
    config::ConfigLoader,
    db,
    identity::HttpIdentityProvider,
    mail::HttpNotificationDispatcher,
    migration::{Migrator, MigratorTrait},
    server::run_server,
    telemetry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from layered env files and variables
    let config = ConfigLoader::new().load()?;

    telemetry::init_tracing(&config)?;

    if let Ok(redacted) = config.redacted_json() {
        tracing::info!(profile = %config.profile, config = %redacted, "Configuration loaded");
    }

    let pool = db::init_pool(&config).await?;
    Migrator::up(&pool, None).await?;

    let service_key = config.identity_service_key.clone().unwrap_or_default();
    let identity = Arc::new(HttpIdentityProvider::new(
        config.identity_base_url.clone(),
        service_key.clone(),
    ));
    let mailer = Arc::new(HttpNotificationDispatcher::new(
        config.mail_endpoint.clone(),
        service_key,
    ));

    run_server(config, pool, identity, mailer).await
}
