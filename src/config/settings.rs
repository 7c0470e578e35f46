use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub api: ApiSettings,
    pub risk: RiskSettings,
    pub scoring: ScoringServiceSettings,
    pub advisory: AdvisorySettings,
    pub alerts: AlertSettings,
    pub monitoring: MonitoringSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskSettings {
    /// Global liquidation-relevant collateral ratio applied to the
    /// supplied total when deriving the health factor.
    pub collateral_factor: f64,
    /// Volatility figure forwarded to the scoring service when the price
    /// feed has nothing fresher.
    pub default_volatility: f64,
    /// LTV percentage above which the fallback scorer adds its surcharge.
    pub ltv_surcharge_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringServiceSettings {
    pub url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorySettings {
    pub url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertSettings {
    /// Risk score above which a liquidation warning is raised.
    pub liquidation_score_threshold: f64,
    /// Health factor below which the warning gets the urgent framing.
    pub critical_health_factor: f64,
    /// Minimum APY move (percentage points) that produces a rate_change alert.
    pub rate_change_threshold: f64,
    /// When enabled, only risk-level transitions produce alerts instead of
    /// every qualifying cycle.
    pub dedupe_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringSettings {
    pub market_data_interval_seconds: u64,
    pub portfolio_interval_seconds: u64,
    pub health_factor_interval_seconds: u64,
    pub risk_assessment_interval_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            api: ApiSettings::default(),
            risk: RiskSettings::default(),
            scoring: ScoringServiceSettings::default(),
            advisory: AdvisorySettings::default(),
            alerts: AlertSettings::default(),
            monitoring: MonitoringSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for RiskSettings {
    fn default() -> Self {
        RiskSettings {
            collateral_factor: 0.75,
            default_volatility: 0.2,
            ltv_surcharge_threshold: 70.0,
        }
    }
}

impl Default for ScoringServiceSettings {
    fn default() -> Self {
        ScoringServiceSettings {
            url: "http://localhost:8001".to_string(),
            timeout_seconds: 5,
        }
    }
}

impl Default for AdvisorySettings {
    fn default() -> Self {
        AdvisorySettings {
            url: "http://localhost:8002".to_string(),
            timeout_seconds: 10,
        }
    }
}

impl Default for AlertSettings {
    fn default() -> Self {
        AlertSettings {
            liquidation_score_threshold: 60.0,
            critical_health_factor: 1.2,
            rate_change_threshold: 0.5,
            dedupe_enabled: false,
        }
    }
}

impl Default for MonitoringSettings {
    fn default() -> Self {
        MonitoringSettings {
            market_data_interval_seconds: 30,
            portfolio_interval_seconds: 15,
            health_factor_interval_seconds: 10,
            risk_assessment_interval_seconds: 60,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            level: "info".to_string(),
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, config::ConfigError> {
        let _settings = config::Config::builder()
            .add_source(config::Environment::default())
            .build()?;

        Ok(Settings {
            api: ApiSettings {
                host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("API_PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()
                    .unwrap_or(8080),
            },
            risk: RiskSettings {
                collateral_factor: env::var("COLLATERAL_FACTOR")
                    .unwrap_or_else(|_| "0.75".to_string())
                    .parse()
                    .unwrap_or(0.75),
                default_volatility: env::var("DEFAULT_VOLATILITY")
                    .unwrap_or_else(|_| "0.2".to_string())
                    .parse()
                    .unwrap_or(0.2),
                ltv_surcharge_threshold: env::var("LTV_SURCHARGE_THRESHOLD")
                    .unwrap_or_else(|_| "70".to_string())
                    .parse()
                    .unwrap_or(70.0),
            },
            scoring: ScoringServiceSettings {
                url: env::var("SCORING_SERVICE_URL")
                    .unwrap_or_else(|_| "http://localhost:8001".to_string()),
                timeout_seconds: env::var("SCORING_SERVICE_TIMEOUT")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .unwrap_or(5),
            },
            advisory: AdvisorySettings {
                url: env::var("ADVISORY_SERVICE_URL")
                    .unwrap_or_else(|_| "http://localhost:8002".to_string()),
                timeout_seconds: env::var("ADVISORY_SERVICE_TIMEOUT")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
            },
            alerts: AlertSettings {
                liquidation_score_threshold: env::var("LIQUIDATION_SCORE_THRESHOLD")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()
                    .unwrap_or(60.0),
                critical_health_factor: env::var("CRITICAL_HEALTH_FACTOR")
                    .unwrap_or_else(|_| "1.2".to_string())
                    .parse()
                    .unwrap_or(1.2),
                rate_change_threshold: env::var("RATE_CHANGE_THRESHOLD")
                    .unwrap_or_else(|_| "0.5".to_string())
                    .parse()
                    .unwrap_or(0.5),
                dedupe_enabled: env::var("ALERT_DEDUPE_ENABLED")
                    .unwrap_or_else(|_| "false".to_string())
                    .parse()
                    .unwrap_or(false),
            },
            monitoring: MonitoringSettings {
                market_data_interval_seconds: env::var("MARKET_DATA_INTERVAL_SECONDS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .unwrap_or(30),
                portfolio_interval_seconds: env::var("PORTFOLIO_INTERVAL_SECONDS")
                    .unwrap_or_else(|_| "15".to_string())
                    .parse()
                    .unwrap_or(15),
                health_factor_interval_seconds: env::var("HEALTH_FACTOR_INTERVAL_SECONDS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
                risk_assessment_interval_seconds: env::var("RISK_ASSESSMENT_INTERVAL_SECONDS")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()
                    .unwrap_or(60),
            },
            logging: LoggingSettings {
                level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.risk.collateral_factor, 0.75);
        assert_eq!(settings.alerts.liquidation_score_threshold, 60.0);
        assert!(!settings.alerts.dedupe_enabled);
        assert_eq!(settings.monitoring.risk_assessment_interval_seconds, 60);
    }
}
