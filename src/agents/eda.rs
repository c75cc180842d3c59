//! Exploratory data analysis agent
//!
//! Profiles a dataset supplied in the request context: per-column descriptive
//! statistics, missing-value counts, and z-score anomaly detection. The
//! dataset is `context["dataset"]`, a JSON object mapping column names to
//! arrays of numbers (nulls count as missing).

use super::{Agent, AgentResult, ContextBag};
use crate::error::PipelineError;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::debug;

/// Z-score above which a value is reported as anomalous
const ANOMALY_Z_THRESHOLD: f64 = 3.0;

/// Agent for data profiling, anomaly detection, and insights
#[derive(Debug, Clone, Default)]
pub struct EdaAgent;

/// Per-column profile collected during analysis
#[derive(Debug)]
struct ColumnProfile {
    count: usize,
    missing: usize,
    mean: f64,
    std_dev: f64,
    min: f64,
    max: f64,
    anomaly_indices: Vec<usize>,
}

impl EdaAgent {
    pub fn new() -> Self {
        Self
    }

    fn profile_column(values: &[Value]) -> ColumnProfile {
        let mut numbers: Vec<(usize, f64)> = Vec::with_capacity(values.len());
        let mut missing = 0usize;
        for (index, value) in values.iter().enumerate() {
            match value.as_f64() {
                Some(n) => numbers.push((index, n)),
                None => missing += 1,
            }
        }

        if numbers.is_empty() {
            return ColumnProfile {
                count: 0,
                missing,
                mean: 0.0,
                std_dev: 0.0,
                min: 0.0,
                max: 0.0,
                anomaly_indices: Vec::new(),
            };
        }

        let count = numbers.len();
        let mean = numbers.iter().map(|(_, n)| n).sum::<f64>() / count as f64;
        let variance = numbers
            .iter()
            .map(|(_, n)| (n - mean).powi(2))
            .sum::<f64>()
            / count as f64;
        let std_dev = variance.sqrt();
        let min = numbers.iter().map(|(_, n)| *n).fold(f64::INFINITY, f64::min);
        let max = numbers
            .iter()
            .map(|(_, n)| *n)
            .fold(f64::NEG_INFINITY, f64::max);

        let anomaly_indices = if std_dev > 0.0 {
            numbers
                .iter()
                .filter(|(_, n)| ((n - mean) / std_dev).abs() > ANOMALY_Z_THRESHOLD)
                .map(|(index, _)| *index)
                .collect()
        } else {
            Vec::new()
        };

        ColumnProfile {
            count,
            missing,
            mean,
            std_dev,
            min,
            max,
            anomaly_indices,
        }
    }
}

#[async_trait::async_trait]
impl Agent for EdaAgent {
    fn id(&self) -> &str {
        "eda-agent"
    }

    async fn execute(
        &self,
        query: &str,
        context: &ContextBag,
    ) -> Result<AgentResult, PipelineError> {
        debug!(query_len = query.len(), "Running EDA profile");

        let dataset = match context.get("dataset").and_then(Value::as_object) {
            Some(columns) if !columns.is_empty() => columns,
            _ => {
                return Ok(AgentResult::soft_failure(
                    self.id(),
                    "No dataset provided for analysis.",
                ))
            }
        };

        let mut summary = serde_json::Map::new();
        let mut missing_values = serde_json::Map::new();
        let mut anomalies = serde_json::Map::new();
        let mut row_count = 0usize;
        let mut anomaly_total = 0usize;

        for (name, column) in dataset {
            let values = match column.as_array() {
                Some(values) => values,
                None => continue,
            };
            row_count = row_count.max(values.len());

            let profile = Self::profile_column(values);
            anomaly_total += profile.anomaly_indices.len();

            summary.insert(
                name.clone(),
                json!({
                    "count": profile.count,
                    "mean": profile.mean,
                    "std": profile.std_dev,
                    "min": profile.min,
                    "max": profile.max,
                }),
            );
            missing_values.insert(name.clone(), json!(profile.missing));
            anomalies.insert(name.clone(), json!(profile.anomaly_indices));
        }

        if summary.is_empty() {
            return Ok(AgentResult::soft_failure(
                self.id(),
                "No dataset provided for analysis.",
            ));
        }

        let content = format!(
            "Analysis complete for dataset with {row_count} rows. \
             Found {anomaly_total} potential anomalies. Summary statistics generated."
        );

        let mut metadata = HashMap::new();
        metadata.insert("summary".to_string(), Value::Object(summary));
        metadata.insert("missing_values".to_string(), Value::Object(missing_values));
        metadata.insert("anomalies".to_string(), Value::Object(anomalies));

        Ok(AgentResult::new(self.id(), content, 0.95).with_metadata(metadata))
    }
}
