use crate::core::config::{ApiProviderConfig, QueryConfig};
use crate::core::{MetricId, MetricValue, MetricsProvider};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const RETRIES: usize = 2;
const RETRY_DELAY_MS: u64 = 300;

/// Reads metrics from the advisor back office's business-intelligence API.
pub struct BiApiProvider {
    base_url: String,
    token: Option<String>,
    queries: QueryConfig,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl BiApiProvider {
    pub fn new(config: &ApiProviderConfig, queries: &QueryConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("fadash/0.1")
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            queries: queries.clone(),
            client,
        })
    }

    /// Path and query string for a metric, relative to the base URL.
    pub fn endpoint(&self, id: MetricId) -> String {
        let path = match id {
            MetricId::AumOverview => "aum".to_string(),
            MetricId::AumByBranch => "aum/by-branch".to_string(),
            MetricId::AumByRm => "aum/by-rm".to_string(),
            MetricId::NetFlows => format!("net-flows?months={}", self.queries.net_flow_months),
            MetricId::SipHealth => "sip-health".to_string(),
            MetricId::RevenueProjection => "revenue-projection".to_string(),
            MetricId::ClientConcentration => format!(
                "client-concentration?topN={}",
                self.queries.concentration_top_n
            ),
            MetricId::DormantClients => "dormant-clients".to_string(),
            MetricId::MonthlyScorecard => "monthly-scorecard".to_string(),
            MetricId::RevenueAttribution => "revenue-attribution".to_string(),
            MetricId::ClientSegmentation => "client-segmentation".to_string(),
        };
        format!("/api/v1/bi/{path}")
    }

    async fn send(&self, url: &str) -> Result<reqwest::Response> {
        let mut attempt = 0;
        loop {
            let mut request = self.client.get(url);
            if let Some(token) = &self.token {
                request = request.bearer_auth(token);
            }
            match request.send().await {
                Ok(response) => return Ok(response),
                Err(e) if attempt < RETRIES => {
                    attempt += 1;
                    debug!("Request to {} failed ({}), retry {}/{}", url, e, attempt, RETRIES);
                    tokio::time::sleep(Duration::from_millis(RETRY_DELAY_MS)).await;
                }
                Err(e) => return Err(e).with_context(|| format!("Failed to send request: {url}")),
            }
        }
    }
}

#[async_trait]
impl MetricsProvider for BiApiProvider {
    async fn fetch_metric(&self, id: MetricId) -> Result<MetricValue> {
        let url = format!("{}{}", self.base_url, self.endpoint(id));
        debug!("Requesting metric {} from {}", id, url);

        let response = self.send(&url).await?;
        let status = response.status();
        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read response for metric: {id}"))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|e| e.message)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            return Err(anyhow!("Metric {} request failed: {}", id, message));
        }
        if body.trim().is_empty() {
            return Err(anyhow!("Received empty response for metric: {}", id));
        }

        let json: serde_json::Value = serde_json::from_str(&body)
            .with_context(|| format!("Failed to parse response for metric: {id}"))?;
        MetricValue::from_json(id, json)
            .with_context(|| format!("Unexpected payload shape for metric: {id}"))
    }
}
