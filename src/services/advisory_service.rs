use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AdvisorySettings;
use crate::error::AppError;

/// Numeric context handed to the advisory layer. The health factor
/// carries the usual zero-plus-flag sentinel for the no-debt case.
#[derive(Debug, Clone, Serialize)]
pub struct AdvisoryContext {
    pub total_supplied: f64,
    pub total_borrowed: f64,
    pub health_factor: f64,
    pub has_debt: bool,
    pub risk_score: f64,
    pub position_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisoryReply {
    pub response: String,
    pub model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    user_id: Uuid,
    context: &'a AdvisoryContext,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    success: bool,
    response: Option<String>,
    model: Option<String>,
}

/// Conversational guidance: remote chat service first, keyword-matched
/// templates populated with the user's live numbers on any failure. Like
/// the scorer, this never surfaces an error to the caller.
pub struct AdvisoryService {
    client: Client,
    base_url: String,
    collateral_factor: f64,
}

impl AdvisoryService {
    pub fn new(settings: &AdvisorySettings, collateral_factor: f64) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            base_url: settings.url.trim_end_matches('/').to_string(),
            collateral_factor,
        })
    }

    pub async fn ask(&self, user_id: Uuid, query: &str, context: &AdvisoryContext) -> AdvisoryReply {
        match self.ask_remote(user_id, query, context).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(
                    user_id = %user_id,
                    error = %e,
                    "advisory service unavailable, using templated response"
                );
                AdvisoryReply {
                    response: self.templated_response(query, context),
                    model: "rule-based-fallback".to_string(),
                }
            }
        }
    }

    async fn ask_remote(
        &self,
        user_id: Uuid,
        query: &str,
        context: &AdvisoryContext,
    ) -> Result<AdvisoryReply, AppError> {
        let url = format!("{}/chat", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&ChatRequest {
                message: query,
                user_id,
                context,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::UpstreamUnavailable(format!(
                "advisory service returned {}",
                response.status()
            )));
        }

        let body: ChatResponse = response.json().await?;
        match (body.success, body.response) {
            (true, Some(text)) => Ok(AdvisoryReply {
                response: text,
                model: body.model.unwrap_or_else(|| "remote".to_string()),
            }),
            _ => Err(AppError::UpstreamUnavailable(
                "advisory service returned no response".to_string(),
            )),
        }
    }

    /// Keyword-matched template, first match wins. Mirrors the ladder the
    /// hosted assistant uses when its model is unreachable.
    fn templated_response(&self, query: &str, ctx: &AdvisoryContext) -> String {
        let q = query.to_lowercase();
        let max_borrow = ctx.total_supplied * self.collateral_factor;

        if q.contains("risk") || q.contains("health") || q.contains("safe") {
            return self.risk_template(ctx, max_borrow);
        }

        if q.contains("apy") || q.contains("yield") || q.contains("earn") || q.contains("return") {
            return format!(
                "Supply stablecoins for steady returns and use them as collateral. \
                 You currently supply ${:.2}; borrowing against it and re-supplying \
                 can add roughly 2-3% net yield after borrow costs.",
                ctx.total_supplied
            );
        }

        if q.contains("borrow") || q.contains("loan") {
            let available = (max_borrow - ctx.total_borrowed).max(0.0);
            return format!(
                "You have supplied ${:.2} and borrowed ${:.2}. Up to ${:.2} is still \
                 available at the {:.0}% loan-to-value ceiling. Keep your health \
                 factor above 1.5 when borrowing.",
                ctx.total_supplied,
                ctx.total_borrowed,
                available,
                self.collateral_factor * 100.0
            );
        }

        if q.contains("liquidat") {
            let status = if ctx.has_debt && ctx.health_factor < 1.5 {
                "Your current health factor needs attention - consider adding collateral."
            } else {
                "Your position is currently safe."
            };
            return format!(
                "Liquidation happens when the health factor drops below 1.0: \
                 collateral is seized to cover debt, with a penalty. Keep a buffer \
                 above 1.5 and stay ready to add collateral quickly. {}",
                status
            );
        }

        if q.contains("strategy") || q.contains("optimi") || q.contains("improve") {
            return format!(
                "With {} position(s): diversify supply across assets, borrow no more \
                 than 50-60% of supplied value, and rebalance whenever the health \
                 factor slips under 1.5. Checking the portfolio daily is enough.",
                ctx.position_count
            );
        }

        if q.contains("supply") || q.contains("deposit") || q.contains("lend") {
            return format!(
                "Supplying earns interest immediately and doubles as collateral. You \
                 currently supply ${:.2}; spreading across three or four assets \
                 smooths the yield.",
                ctx.total_supplied
            );
        }

        format!(
            "I can help with portfolio analysis, borrowing limits and liquidation \
             protection. Right now you supply ${:.2}, borrow ${:.2}, and your risk \
             score is {:.0}/100. What would you like to know more about?",
            ctx.total_supplied, ctx.total_borrowed, ctx.risk_score
        )
    }

    fn risk_template(&self, ctx: &AdvisoryContext, max_borrow: f64) -> String {
        if !ctx.has_debt {
            return format!(
                "You have no active borrows, so your health factor is effectively \
                 infinite - the safest position possible. You could borrow up to \
                 ${:.2} against your supplied ${:.2} if you want to put the \
                 collateral to work.",
                max_borrow, ctx.total_supplied
            );
        }

        if ctx.health_factor < 1.2 {
            format!(
                "URGENT: your health factor is {:.2}, critically low. Add collateral \
                 or repay part of the ${:.2} you borrowed immediately; target a \
                 health factor above 1.5.",
                ctx.health_factor, ctx.total_borrowed
            )
        } else if ctx.health_factor < 1.5 {
            format!(
                "Your health factor is {:.2} - moderate risk. Add collateral to get \
                 above 1.5 and avoid borrowing more first. Maximum safe borrow \
                 against your supply is ${:.2}.",
                ctx.health_factor, max_borrow
            )
        } else {
            format!(
                "Your health factor is {:.2} - healthy. You could borrow up to \
                 ${:.2} more while keeping a sensible buffer.",
                ctx.health_factor,
                (max_borrow - ctx.total_borrowed).max(0.0)
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AdvisoryService {
        AdvisoryService::new(&AdvisorySettings::default(), 0.75).unwrap()
    }

    fn context(supplied: f64, borrowed: f64, hf: f64, has_debt: bool) -> AdvisoryContext {
        AdvisoryContext {
            total_supplied: supplied,
            total_borrowed: borrowed,
            health_factor: hf,
            has_debt,
            risk_score: 35.0,
            position_count: 2,
        }
    }

    #[test]
    fn test_no_debt_reads_as_safe() {
        let reply = service().templated_response("How safe am I?", &context(1000.0, 0.0, 0.0, false));
        assert!(reply.contains("no active borrows"));
        assert!(reply.contains("safest"));
    }

    #[test]
    fn test_critical_health_is_urgent() {
        let reply =
            service().templated_response("what is my risk?", &context(1000.0, 900.0, 0.83, true));
        assert!(reply.starts_with("URGENT"));
    }

    #[test]
    fn test_borrow_keyword_reports_capacity() {
        let reply =
            service().templated_response("can I borrow more?", &context(1000.0, 500.0, 1.5, true));
        assert!(reply.contains("$250.00"));
    }

    #[test]
    fn test_liquidation_keyword() {
        let reply =
            service().templated_response("explain liquidation", &context(1000.0, 100.0, 7.5, true));
        assert!(reply.contains("below 1.0"));
        assert!(reply.contains("currently safe"));
    }

    #[test]
    fn test_unmatched_query_gets_default_summary() {
        let reply = service().templated_response("hello", &context(1000.0, 500.0, 1.5, true));
        assert!(reply.contains("risk score is 35/100"));
    }
}
