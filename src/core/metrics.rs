//! Business-intelligence metric payloads and the provider abstraction

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

/// Identifies one metric the dashboard loads per view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetricId {
    AumOverview,
    AumByBranch,
    AumByRm,
    NetFlows,
    SipHealth,
    RevenueProjection,
    ClientConcentration,
    DormantClients,
    MonthlyScorecard,
    RevenueAttribution,
    ClientSegmentation,
}

impl MetricId {
    pub const ALL: [MetricId; 11] = [
        MetricId::AumOverview,
        MetricId::AumByBranch,
        MetricId::AumByRm,
        MetricId::NetFlows,
        MetricId::SipHealth,
        MetricId::RevenueProjection,
        MetricId::ClientConcentration,
        MetricId::DormantClients,
        MetricId::MonthlyScorecard,
        MetricId::RevenueAttribution,
        MetricId::ClientSegmentation,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            MetricId::AumOverview => "aum-overview",
            MetricId::AumByBranch => "aum-by-branch",
            MetricId::AumByRm => "aum-by-rm",
            MetricId::NetFlows => "net-flows",
            MetricId::SipHealth => "sip-health",
            MetricId::RevenueProjection => "revenue-projection",
            MetricId::ClientConcentration => "client-concentration",
            MetricId::DormantClients => "dormant-clients",
            MetricId::MonthlyScorecard => "monthly-scorecard",
            MetricId::RevenueAttribution => "revenue-attribution",
            MetricId::ClientSegmentation => "client-segmentation",
        }
    }
}

impl Display for MetricId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for MetricId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricId::ALL
            .into_iter()
            .find(|id| id.key() == s.to_lowercase())
            .ok_or_else(|| anyhow::anyhow!("Invalid metric: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AumOverview {
    pub total_aum: f64,
    #[serde(default)]
    pub equity_aum: f64,
    #[serde(default)]
    pub debt_aum: f64,
    #[serde(default)]
    pub hybrid_aum: f64,
    #[serde(default)]
    pub other_aum: f64,
    #[serde(default)]
    pub by_category: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchAum {
    pub name: String,
    pub aum: f64,
    pub client_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RmAum {
    pub id: String,
    pub name: String,
    pub aum: f64,
    pub client_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetFlowPeriod {
    pub period: String,
    pub purchases: f64,
    pub redemptions: f64,
    pub net: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SipHealth {
    pub total: u32,
    pub active: u32,
    pub paused: u32,
    pub cancelled: u32,
    pub total_monthly_amount: f64,
    #[serde(default)]
    pub mandate_expiring_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectedTrail {
    pub period: String,
    pub projected_aum: f64,
    pub projected_trail: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueProjection {
    pub current_aum: f64,
    pub avg_trail_rate: f64,
    #[serde(default)]
    pub current_monthly_trail: f64,
    #[serde(default, rename = "annual12MProjection")]
    pub annual_12m_projection: f64,
    #[serde(default)]
    pub projections: Vec<ProjectedTrail>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConcentrationClient {
    pub id: String,
    pub name: String,
    pub aum: f64,
    pub rank: u32,
    pub percent_of_total: f64,
    #[serde(default)]
    pub cumulative_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConcentration {
    pub total_aum: f64,
    pub top_n: u32,
    pub top_n_aum: f64,
    pub concentration_percent: f64,
    #[serde(default)]
    pub clients: Vec<ConcentrationClient>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DormantClient {
    pub id: String,
    pub name: String,
    pub email: String,
    pub aum: f64,
    pub last_transaction_date: String,
    pub days_since_last_txn: i64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorecardDelta {
    pub current: f64,
    pub previous: f64,
    pub delta: f64,
    #[serde(default)]
    pub delta_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyScorecard {
    pub period: String,
    pub prev_period: String,
    pub aum: ScorecardDelta,
    pub net_flows: ScorecardDelta,
    pub sip_book: ScorecardDelta,
    pub client_count: ScorecardDelta,
    pub new_clients: u32,
    pub lost_clients: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmcRevenue {
    pub amc_name: String,
    pub aum_amount: f64,
    pub trail_rate: f64,
    pub estimated_trail: f64,
    #[serde(default)]
    pub holdings_count: u32,
    pub percent_of_total: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueAttribution {
    pub total_trail_income: f64,
    #[serde(default)]
    pub by_amc: Vec<AmcRevenue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierClient {
    pub id: String,
    pub name: String,
    pub aum: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientTier {
    pub tier: String,
    pub client_count: u32,
    pub total_aum: f64,
    pub avg_aum: f64,
    pub percent_of_aum: f64,
    #[serde(default)]
    pub clients: Vec<TierClient>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSegmentation {
    #[serde(default)]
    pub tiers: Vec<ClientTier>,
    pub total_aum: f64,
    pub total_clients: u32,
}

/// One successfully fetched metric, tagged by the metric it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    AumOverview(AumOverview),
    AumByBranch(Vec<BranchAum>),
    AumByRm(Vec<RmAum>),
    NetFlows(Vec<NetFlowPeriod>),
    SipHealth(SipHealth),
    RevenueProjection(RevenueProjection),
    ClientConcentration(ClientConcentration),
    DormantClients(Vec<DormantClient>),
    MonthlyScorecard(MonthlyScorecard),
    RevenueAttribution(RevenueAttribution),
    ClientSegmentation(ClientSegmentation),
}

impl MetricValue {
    pub fn id(&self) -> MetricId {
        match self {
            MetricValue::AumOverview(_) => MetricId::AumOverview,
            MetricValue::AumByBranch(_) => MetricId::AumByBranch,
            MetricValue::AumByRm(_) => MetricId::AumByRm,
            MetricValue::NetFlows(_) => MetricId::NetFlows,
            MetricValue::SipHealth(_) => MetricId::SipHealth,
            MetricValue::RevenueProjection(_) => MetricId::RevenueProjection,
            MetricValue::ClientConcentration(_) => MetricId::ClientConcentration,
            MetricValue::DormantClients(_) => MetricId::DormantClients,
            MetricValue::MonthlyScorecard(_) => MetricId::MonthlyScorecard,
            MetricValue::RevenueAttribution(_) => MetricId::RevenueAttribution,
            MetricValue::ClientSegmentation(_) => MetricId::ClientSegmentation,
        }
    }

    /// Decodes a JSON payload into the typed value for `id`.
    pub fn from_json(id: MetricId, value: serde_json::Value) -> Result<Self> {
        use serde_json::from_value;

        let metric = match id {
            MetricId::AumOverview => MetricValue::AumOverview(from_value(value)?),
            MetricId::AumByBranch => MetricValue::AumByBranch(from_value(value)?),
            MetricId::AumByRm => MetricValue::AumByRm(from_value(value)?),
            MetricId::NetFlows => MetricValue::NetFlows(from_value(value)?),
            MetricId::SipHealth => MetricValue::SipHealth(from_value(value)?),
            MetricId::RevenueProjection => MetricValue::RevenueProjection(from_value(value)?),
            MetricId::ClientConcentration => MetricValue::ClientConcentration(from_value(value)?),
            MetricId::DormantClients => MetricValue::DormantClients(from_value(value)?),
            MetricId::MonthlyScorecard => MetricValue::MonthlyScorecard(from_value(value)?),
            MetricId::RevenueAttribution => MetricValue::RevenueAttribution(from_value(value)?),
            MetricId::ClientSegmentation => MetricValue::ClientSegmentation(from_value(value)?),
        };
        Ok(metric)
    }
}

/// Upstream source of dashboard metrics. Each fetch is independent and may fail.
#[async_trait]
pub trait MetricsProvider: Send + Sync {
    async fn fetch_metric(&self, id: MetricId) -> Result<MetricValue>;
}
