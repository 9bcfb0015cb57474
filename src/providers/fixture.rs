use crate::core::{MetricId, MetricValue, MetricsProvider};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Serves metrics from a JSON document keyed by metric identifier.
///
/// Each top-level key is optional; a metric without a key fails to fetch.
pub struct FixtureProvider {
    metrics: HashMap<String, serde_json::Value>,
}

impl FixtureProvider {
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read metrics fixture: {}", path.display()))?;
        let provider = Self::from_json_str(&content)
            .with_context(|| format!("Failed to parse metrics fixture: {}", path.display()))?;
        debug!(
            "Loaded {} metrics from fixture {}",
            provider.metrics.len(),
            path.display()
        );
        Ok(provider)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let metrics: HashMap<String, serde_json::Value> = serde_json::from_str(content)?;
        Ok(Self { metrics })
    }
}

#[async_trait]
impl MetricsProvider for FixtureProvider {
    async fn fetch_metric(&self, id: MetricId) -> Result<MetricValue> {
        let value = self
            .metrics
            .get(id.key())
            .cloned()
            .ok_or_else(|| anyhow!("Metric {} not present in fixture", id))?;
        MetricValue::from_json(id, value)
            .with_context(|| format!("Invalid fixture payload for metric: {id}"))
    }
}
