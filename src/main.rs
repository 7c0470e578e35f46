use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use lending_risk_monitor::config::Settings;
use lending_risk_monitor::models::AssetMetadata;
use lending_risk_monitor::store::{InMemoryAlertStore, InMemoryPositionStore};
use lending_risk_monitor::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let settings = Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(settings.logging.level.clone())),
        )
        .init();

    info!("Starting lending risk monitor");

    let position_store = Arc::new(InMemoryPositionStore::with_assets(default_assets()));
    let alert_store = Arc::new(InMemoryAlertStore::new());
    let state = AppState::new(settings.clone(), position_store, alert_store)?;

    let app = create_router(state);
    let addr: SocketAddr = format!("{}:{}", settings.api.host, settings.api.port).parse()?;
    info!("API server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tokio::select! {
        result = axum::serve(listener, app) => {
            if let Err(e) = result {
                error!("Web server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    info!("Shutting down lending risk monitor");
    Ok(())
}

/// Seed asset listing for local runs; a deployment replaces this with its
/// real market configuration.
fn default_assets() -> Vec<AssetMetadata> {
    vec![
        AssetMetadata {
            id: Uuid::new_v4(),
            symbol: "ETH".to_string(),
            name: "Ether".to_string(),
            decimals: 18,
            supply_apy: 2.1,
            borrow_apy: 3.4,
            max_ltv: 0.75,
            liquidation_threshold: 0.80,
            liquidation_penalty: 0.05,
            price_usd: 2400.0,
            is_active: true,
        },
        AssetMetadata {
            id: Uuid::new_v4(),
            symbol: "USDC".to_string(),
            name: "USD Coin".to_string(),
            decimals: 6,
            supply_apy: 4.2,
            borrow_apy: 5.8,
            max_ltv: 0.80,
            liquidation_threshold: 0.85,
            liquidation_penalty: 0.04,
            price_usd: 1.0,
            is_active: true,
        },
        AssetMetadata {
            id: Uuid::new_v4(),
            symbol: "DAI".to_string(),
            name: "Dai Stablecoin".to_string(),
            decimals: 18,
            supply_apy: 3.9,
            borrow_apy: 5.2,
            max_ltv: 0.77,
            liquidation_threshold: 0.82,
            liquidation_penalty: 0.04,
            price_usd: 1.0,
            is_active: true,
        },
        AssetMetadata {
            id: Uuid::new_v4(),
            symbol: "WBTC".to_string(),
            name: "Wrapped Bitcoin".to_string(),
            decimals: 8,
            supply_apy: 0.8,
            borrow_apy: 1.9,
            max_ltv: 0.70,
            liquidation_threshold: 0.75,
            liquidation_penalty: 0.06,
            price_usd: 64000.0,
            is_active: true,
        },
    ]
}
