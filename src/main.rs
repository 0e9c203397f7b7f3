//! Storefront API server

use std::sync::Arc;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_api::auth::JwksVerifier;
use storefront_api::domain::events::EventPublisher;
use storefront_api::store::PgStore;
use storefront_api::{router, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let db = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&db).await?;

    let nats = match config.nats_url.as_deref() {
        Some(url) => match async_nats::connect(url).await {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "NATS unavailable, domain events disabled");
                None
            }
        },
        None => None,
    };

    let jwks_url = config.jwks_url()?;
    tracing::info!(%jwks_url, "session tokens verified against JWKS");
    let verifier = JwksVerifier::new(jwks_url)?;

    let state = AppState::new(Arc::new(PgStore::new(db)), Arc::new(verifier), EventPublisher::new(nats))
        .with_thresholds(config.sweep);
    let app = router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("🚀 Storefront API listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(&addr).await?, app).await?;
    Ok(())
}
