pub mod advisory;
pub mod alerts;
pub mod health;
pub mod monitor;
pub mod portfolio;
pub mod positions;
pub mod risk;

pub use advisory::ask_advisory;
pub use alerts::{list_alerts, mark_alert_read, mark_all_alerts_read};
pub use health::health_check;
pub use monitor::{start_monitoring, stop_monitoring};
pub use portfolio::get_portfolio;
pub use positions::{get_positions, upsert_position};
pub use risk::{cached_risk, evaluate_risk};
