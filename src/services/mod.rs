pub mod advisory_service;
pub mod alert_engine;
pub mod audit_log;
pub mod health_factor;
pub mod monitoring_service;
pub mod position_aggregator;
pub mod price_feed;
pub mod risk_orchestrator;
pub mod risk_scorer;
pub mod scoring_client;
pub mod snapshot_cache;

pub use advisory_service::{AdvisoryContext, AdvisoryReply, AdvisoryService};
pub use alert_engine::AlertEngine;
pub use audit_log::{AuditLog, AuditRecord};
pub use health_factor::HealthFactorCalculator;
pub use monitoring_service::{MonitorKind, MonitoringService};
pub use position_aggregator::PositionAggregator;
pub use price_feed::{MarketData, PriceFeed};
pub use risk_orchestrator::RiskOrchestrator;
pub use risk_scorer::RiskScorer;
pub use scoring_client::ScoringClient;
pub use snapshot_cache::{RiskSnapshot, SnapshotCache};
