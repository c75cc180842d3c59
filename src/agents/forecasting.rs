//! Demand forecasting agent
//!
//! Projects future sales with a least-squares linear trend fit over
//! `context["sales_history"]` (array of numbers). `context["periods"]`
//! optionally sets the projection horizon (default 12).

use super::{Agent, AgentResult, ContextBag};
use crate::error::PipelineError;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::debug;

const DEFAULT_PERIODS: usize = 12;

/// Agent for demand planning and sales forecasting
#[derive(Debug, Clone, Default)]
pub struct ForecastingAgent;

impl ForecastingAgent {
    pub fn new() -> Self {
        Self
    }

    /// Least-squares fit of y over x = 0..n, returning (slope, intercept)
    fn linear_fit(values: &[f64]) -> (f64, f64) {
        let n = values.len() as f64;
        let x_mean = (n - 1.0) / 2.0;
        let y_mean = values.iter().sum::<f64>() / n;

        let mut covariance = 0.0;
        let mut x_variance = 0.0;
        for (i, y) in values.iter().enumerate() {
            let dx = i as f64 - x_mean;
            covariance += dx * (y - y_mean);
            x_variance += dx * dx;
        }

        let slope = if x_variance > 0.0 {
            covariance / x_variance
        } else {
            0.0
        };
        (slope, y_mean - slope * x_mean)
    }
}

#[async_trait::async_trait]
impl Agent for ForecastingAgent {
    fn id(&self) -> &str {
        "forecast-agent"
    }

    async fn execute(
        &self,
        query: &str,
        context: &ContextBag,
    ) -> Result<AgentResult, PipelineError> {
        debug!(query_len = query.len(), "Running sales forecast");

        let history: Vec<f64> = match context.get("sales_history").and_then(Value::as_array) {
            Some(values) => values.iter().filter_map(Value::as_f64).collect(),
            None => {
                return Ok(AgentResult::soft_failure(
                    self.id(),
                    "Historical data not found for forecasting.",
                ))
            }
        };

        if history.len() < 2 {
            return Ok(AgentResult::soft_failure(
                self.id(),
                "Forecasting failed: insufficient data.",
            ));
        }

        let periods = context
            .get("periods")
            .and_then(Value::as_u64)
            .map(|p| p as usize)
            .unwrap_or(DEFAULT_PERIODS);

        let (slope, intercept) = Self::linear_fit(&history);
        let forecast: Vec<f64> = (history.len()..history.len() + periods)
            .map(|x| slope * x as f64 + intercept)
            .collect();

        let historical_mean = history.iter().sum::<f64>() / history.len() as f64;
        let predicted_mean = if forecast.is_empty() {
            historical_mean
        } else {
            forecast.iter().sum::<f64>() / forecast.len() as f64
        };
        let trend = if slope > 0.0 { "upward" } else { "downward" };

        let content = format!(
            "Projected requirements from a linear trend over {} periods of sales history. \
             The trend is {trend}: the historical average of {historical_mean:.2} units is \
             expected to shift to {predicted_mean:.2} over the next {periods} periods.",
            history.len()
        );

        let mut metadata = HashMap::new();
        metadata.insert("historical_mean".to_string(), json!(historical_mean));
        metadata.insert("predicted_mean".to_string(), json!(predicted_mean));
        metadata.insert("trend".to_string(), json!(trend));
        metadata.insert("forecast_values".to_string(), json!(forecast));

        Ok(AgentResult::new(self.id(), content, 0.9).with_metadata(metadata))
    }
}
