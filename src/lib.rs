pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod store;

use std::sync::Arc;

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Settings;
use crate::error::AppError;
use crate::services::{
    AdvisoryService, AlertEngine, AuditLog, HealthFactorCalculator, MonitoringService,
    PositionAggregator, PriceFeed, RiskOrchestrator, RiskScorer, ScoringClient, SnapshotCache,
};
use crate::store::{AlertStore, InMemoryAlertStore, InMemoryPositionStore, PositionStore};

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub position_store: Arc<dyn PositionStore>,
    pub alert_store: Arc<dyn AlertStore>,
    pub aggregator: Arc<PositionAggregator>,
    pub health_calculator: Arc<HealthFactorCalculator>,
    pub orchestrator: Arc<RiskOrchestrator>,
    pub alert_engine: Arc<AlertEngine>,
    pub advisory: Arc<AdvisoryService>,
    pub monitoring: Arc<MonitoringService>,
    pub audit_log: Arc<AuditLog>,
    pub snapshots: SnapshotCache,
}

impl AppState {
    /// Wires the full service graph over the given stores.
    pub fn new(
        settings: Settings,
        position_store: Arc<dyn PositionStore>,
        alert_store: Arc<dyn AlertStore>,
    ) -> Result<Self, AppError> {
        let scoring_client = ScoringClient::new(&settings.scoring)?;
        let advisory = Arc::new(AdvisoryService::new(
            &settings.advisory,
            settings.risk.collateral_factor,
        )?);

        let aggregator = Arc::new(PositionAggregator::new(position_store.clone()));
        let health_calculator =
            Arc::new(HealthFactorCalculator::new(settings.risk.collateral_factor)?);
        let alert_engine = Arc::new(AlertEngine::new(
            alert_store.clone(),
            settings.alerts.clone(),
        ));
        let audit_log = Arc::new(AuditLog::new());
        let price_feed = Arc::new(PriceFeed::new(settings.risk.default_volatility));
        let snapshots = SnapshotCache::new();

        let orchestrator = Arc::new(RiskOrchestrator::new(
            PositionAggregator::new(position_store.clone()),
            HealthFactorCalculator::new(settings.risk.collateral_factor)?,
            RiskScorer::new(scoring_client, &settings.risk),
            alert_engine.clone(),
            audit_log.clone(),
            price_feed.clone(),
            snapshots.clone(),
        ));

        let monitoring = Arc::new(MonitoringService::new(
            orchestrator.clone(),
            position_store.clone(),
            price_feed,
            alert_engine.clone(),
            settings.monitoring.clone(),
        ));

        Ok(Self {
            settings: Arc::new(settings),
            position_store,
            alert_store,
            aggregator,
            health_calculator,
            orchestrator,
            alert_engine,
            advisory,
            monitoring,
            audit_log,
            snapshots,
        })
    }

    /// In-memory stores, the default for local runs and tests.
    pub fn in_memory(settings: Settings) -> Result<Self, AppError> {
        Self::new(
            settings,
            Arc::new(InMemoryPositionStore::new()),
            Arc::new(InMemoryAlertStore::new()),
        )
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/v1/risk/:id", get(handlers::evaluate_risk))
        .route("/api/v1/risk/:id/cached", get(handlers::cached_risk))
        .route("/api/v1/portfolio/:id", get(handlers::get_portfolio))
        .route("/api/v1/positions/:id", get(handlers::get_positions))
        .route("/api/v1/positions", post(handlers::upsert_position))
        .route("/api/v1/alerts/:id", get(handlers::list_alerts))
        .route("/api/v1/alerts/:id/read", put(handlers::mark_alert_read))
        .route("/api/v1/alerts/:id/read-all", put(handlers::mark_all_alerts_read))
        .route("/api/v1/advisory", post(handlers::ask_advisory))
        .route("/api/v1/monitor/:id", post(handlers::start_monitoring))
        .route("/api/v1/monitor/:id", delete(handlers::stop_monitoring))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
