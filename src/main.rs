use anyhow::{Context, Result};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use rentalcar_catalog::{
    config::Settings,
    rental_api::RentalApiClient,
    routes::{self, AppState},
    storage::JsonFileStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file first. Ignore errors (e.g., file not found)
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rentalcar_catalog=info,tower_http=info".into()),
        )
        .with(fmt::layer())
        .init();

    tracing::info!("Initializing rental car catalog server...");

    let settings = match Settings::new() {
        Ok(s) => {
            tracing::info!("Configuration loaded successfully.");
            s
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {:#}", e);
            return Err(e);
        }
    };
    let shared_settings = Arc::new(settings);

    let api_client = RentalApiClient::from_settings(&shared_settings)
        .context("Failed to create listing API client")?;
    tracing::info!("Listing API client targets {}", api_client.base_url());

    let store = Arc::new(JsonFileStore::new(&shared_settings.storage_dir));
    tracing::info!("Persisting favorites and filters under {}", store.dir().display());

    let app_state = AppState::new(&shared_settings, Arc::new(api_client), store);
    let app = routes::create_router(app_state);

    let addr: SocketAddr = shared_settings.server_address.parse().with_context(|| {
        format!(
            "Invalid server address format in configuration ('{}')",
            shared_settings.server_address
        )
    })?;

    let listener = match TcpListener::bind(&addr).await {
        Ok(l) => {
            tracing::info!("Server listening on {}", addr);
            l
        }
        Err(e) => {
            tracing::error!("Failed to bind to address {}: {}", addr, e);
            return Err(e.into());
        }
    };

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
