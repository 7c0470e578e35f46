use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ScoringServiceSettings;
use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    #[error("scoring service request failed: {0}")]
    RequestFailed(String),

    #[error("scoring service returned {0}")]
    BadStatus(reqwest::StatusCode),

    #[error("scoring service payload invalid: {0}")]
    InvalidResponse(String),
}

/// Request body for a liquidation-risk prediction.
#[derive(Debug, Serialize)]
pub struct PredictionRequest {
    pub prediction_type: &'static str,
    pub user_id: Uuid,
    pub input: PredictionInput,
}

#[derive(Debug, Serialize)]
pub struct PredictionInput {
    pub health_factor: f64,
    pub volatility: f64,
    pub total_borrowed: f64,
    pub total_supplied: f64,
    pub ltv: f64,
}

#[derive(Debug, Deserialize)]
pub struct PredictionResponse {
    pub success: bool,
    pub prediction: Option<Prediction>,
    pub confidence_score: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct Prediction {
    pub risk_score: f64,
    pub liquidation_probability: Option<f64>,
    pub recommended_action: Option<String>,
    pub time_to_liquidation_estimate: Option<String>,
}

/// Validated remote prediction handed to the scorer.
#[derive(Debug, Clone)]
pub struct RemotePrediction {
    pub risk_score: f64,
    pub liquidation_probability: f64,
    pub recommended_action: String,
    pub time_to_liquidation_estimate: String,
    pub confidence_score: f64,
}

/// HTTP client for the remote scoring service. One bounded attempt per
/// call; any retry happens on the next scheduled tick, never here.
#[derive(Clone)]
pub struct ScoringClient {
    client: Client,
    base_url: String,
}

impl ScoringClient {
    pub fn new(settings: &ScoringServiceSettings) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            base_url: settings.url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn predict_liquidation_risk(
        &self,
        user_id: Uuid,
        input: PredictionInput,
    ) -> Result<RemotePrediction, ScoringError> {
        let request = PredictionRequest {
            prediction_type: "liquidation_risk",
            user_id,
            input,
        };
        let url = format!("{}/predictions", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ScoringError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ScoringError::BadStatus(response.status()));
        }

        let body: PredictionResponse = response
            .json()
            .await
            .map_err(|e| ScoringError::InvalidResponse(e.to_string()))?;

        Self::validate(body)
    }

    fn validate(body: PredictionResponse) -> Result<RemotePrediction, ScoringError> {
        if !body.success {
            return Err(ScoringError::InvalidResponse(
                "service reported success=false".to_string(),
            ));
        }

        let prediction = body
            .prediction
            .ok_or_else(|| ScoringError::InvalidResponse("missing prediction".to_string()))?;

        if !(0.0..=100.0).contains(&prediction.risk_score) || !prediction.risk_score.is_finite() {
            return Err(ScoringError::InvalidResponse(format!(
                "risk_score {} out of range",
                prediction.risk_score
            )));
        }

        Ok(RemotePrediction {
            risk_score: prediction.risk_score,
            liquidation_probability: prediction
                .liquidation_probability
                .unwrap_or(prediction.risk_score / 100.0)
                .clamp(0.0, 1.0),
            recommended_action: prediction
                .recommended_action
                .unwrap_or_else(|| "Position is healthy".to_string()),
            time_to_liquidation_estimate: prediction
                .time_to_liquidation_estimate
                .unwrap_or_else(|| "> 1 week".to_string()),
            confidence_score: body.confidence_score.unwrap_or(0.85).clamp(0.0, 1.0),
        })
    }
}
