//! The tabular datasets the dashboard can display and export.
//!
//! Each dataset kind is described once: where its rows come from in the
//! snapshot, which columns can be sorted, and the export header order.

use crate::core::aggregator::Snapshot;
use crate::core::metrics::{AmcRevenue, ClientTier, DormantClient, MetricId, NetFlowPeriod};
use crate::core::table::{
    self, CellValue, ColumnGetters, ColumnSpec, Getter, SortSpec, to_delimited_text,
};
use anyhow::Result;
use std::fmt::Display;
use std::str::FromStr;

/// Filter value that keeps every period.
pub const ALL_PERIODS: &str = "all";

/// Every sortable column across the datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Category,
    Aum,
    Percent,
    Branch,
    Clients,
    Period,
    Purchases,
    Redemptions,
    Net,
    Metric,
    Value,
    Trail,
    Cumulative,
    Name,
    Rank,
    Email,
    Days,
    Amc,
    TrailRate,
    Tier,
    Avg,
}

impl Column {
    pub const ALL: [Column; 21] = [
        Column::Category,
        Column::Aum,
        Column::Percent,
        Column::Branch,
        Column::Clients,
        Column::Period,
        Column::Purchases,
        Column::Redemptions,
        Column::Net,
        Column::Metric,
        Column::Value,
        Column::Trail,
        Column::Cumulative,
        Column::Name,
        Column::Rank,
        Column::Email,
        Column::Days,
        Column::Amc,
        Column::TrailRate,
        Column::Tier,
        Column::Avg,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Column::Category => "category",
            Column::Aum => "aum",
            Column::Percent => "percent",
            Column::Branch => "branch",
            Column::Clients => "clients",
            Column::Period => "period",
            Column::Purchases => "purchases",
            Column::Redemptions => "redemptions",
            Column::Net => "net",
            Column::Metric => "metric",
            Column::Value => "value",
            Column::Trail => "trail",
            Column::Cumulative => "cumulative",
            Column::Name => "name",
            Column::Rank => "rank",
            Column::Email => "email",
            Column::Days => "days",
            Column::Amc => "amc",
            Column::TrailRate => "trail-rate",
            Column::Tier => "tier",
            Column::Avg => "avg",
        }
    }
}

impl Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for Column {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.to_lowercase();
        Column::ALL
            .into_iter()
            .find(|c| c.key() == key)
            .ok_or_else(|| anyhow::anyhow!("Invalid column: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    Category,
    Branch,
    Flows,
    Sip,
    Revenue,
    Rm,
    Concentration,
    Dormant,
    RevenueAttribution,
    Tiers,
}

impl Dataset {
    pub const ALL: [Dataset; 10] = [
        Dataset::Category,
        Dataset::Branch,
        Dataset::Flows,
        Dataset::Sip,
        Dataset::Revenue,
        Dataset::Rm,
        Dataset::Concentration,
        Dataset::Dormant,
        Dataset::RevenueAttribution,
        Dataset::Tiers,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Dataset::Category => "category",
            Dataset::Branch => "branch",
            Dataset::Flows => "flows",
            Dataset::Sip => "sip",
            Dataset::Revenue => "revenue",
            Dataset::Rm => "rm",
            Dataset::Concentration => "concentration",
            Dataset::Dormant => "dormant",
            Dataset::RevenueAttribution => "revenue-attribution",
            Dataset::Tiers => "tiers",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Dataset::Category => "AUM by Category",
            Dataset::Branch => "AUM by Branch",
            Dataset::Flows => "Net Flows",
            Dataset::Sip => "SIP Health",
            Dataset::Revenue => "Revenue Projection",
            Dataset::Rm => "RM Breakdown",
            Dataset::Concentration => "Client Concentration",
            Dataset::Dormant => "Dormant Clients",
            Dataset::RevenueAttribution => "Revenue by AMC",
            Dataset::Tiers => "Client Tiers",
        }
    }

    /// Base name of the exported CSV file.
    pub fn file_stem(&self) -> &'static str {
        match self {
            Dataset::Category => "aum-by-category",
            Dataset::Branch => "aum-by-branch",
            Dataset::Flows => "net-flows",
            Dataset::Sip => "sip-health",
            Dataset::Revenue => "revenue-projection",
            Dataset::Rm => "rm-breakdown",
            Dataset::Concentration => "client-concentration",
            Dataset::Dormant => "dormant-clients",
            Dataset::RevenueAttribution => "revenue-by-amc",
            Dataset::Tiers => "client-tiers",
        }
    }

    /// The metric whose snapshot field feeds this dataset.
    pub fn source(&self) -> MetricId {
        match self {
            Dataset::Category => MetricId::AumOverview,
            Dataset::Branch => MetricId::AumByBranch,
            Dataset::Flows => MetricId::NetFlows,
            Dataset::Sip => MetricId::SipHealth,
            Dataset::Revenue => MetricId::RevenueProjection,
            Dataset::Rm => MetricId::AumByRm,
            Dataset::Concentration => MetricId::ClientConcentration,
            Dataset::Dormant => MetricId::DormantClients,
            Dataset::RevenueAttribution => MetricId::RevenueAttribution,
            Dataset::Tiers => MetricId::ClientSegmentation,
        }
    }

    /// Builds the table for this dataset, or `None` when its metric has
    /// never been fetched.
    pub fn build(&self, snapshot: &Snapshot) -> Option<Box<dyn TableView>> {
        let dataset = *self;
        let view: Box<dyn TableView> = match dataset {
            Dataset::Category => {
                let aum = snapshot.aum.as_ref()?;
                let rows = aum
                    .by_category
                    .iter()
                    .map(|(category, value)| CategoryRow {
                        category: category.clone(),
                        aum: *value,
                        percent_of_total: share(*value, aum.total_aum),
                    })
                    .collect();
                Box::new(DatasetTable {
                    dataset,
                    rows,
                    getters: ColumnGetters::new()
                        .with(Column::Category, |r: &CategoryRow| r.category.as_str().into())
                        .with(Column::Aum, |r| r.aum.into())
                        .with(Column::Percent, |r| r.percent_of_total.unwrap_or(0.0).into()),
                    filter_field: None,
                    columns: vec![
                        ColumnSpec::new("Category", |r: &CategoryRow| r.category.as_str().into()),
                        ColumnSpec::new("AUM", |r: &CategoryRow| r.aum.into()),
                        ColumnSpec::new("% of Total", |r: &CategoryRow| percent_label(r.percent_of_total)),
                    ],
                })
            }
            Dataset::Branch | Dataset::Rm => {
                let shares: Vec<(String, f64, u32)> = if dataset == Dataset::Branch {
                    let branches = snapshot.branches.as_ref()?;
                    branches
                        .iter()
                        .map(|b| (b.name.clone(), b.aum, b.client_count))
                        .collect()
                } else {
                    let rms = snapshot.rms.as_ref()?;
                    rms.iter()
                        .map(|r| (r.name.clone(), r.aum, r.client_count))
                        .collect()
                };
                let total: f64 = shares.iter().map(|(_, aum, _)| aum).sum();
                let rows = shares
                    .into_iter()
                    .map(|(name, aum, client_count)| AumShareRow {
                        name,
                        aum,
                        client_count,
                        percent_of_total: share(aum, total),
                    })
                    .collect();
                let name_column = if dataset == Dataset::Branch {
                    Column::Branch
                } else {
                    Column::Name
                };
                let name_header = if dataset == Dataset::Branch {
                    "Branch"
                } else {
                    "RM Name"
                };
                Box::new(DatasetTable {
                    dataset,
                    rows,
                    getters: ColumnGetters::new()
                        .with(name_column, |r: &AumShareRow| r.name.as_str().into())
                        .with(Column::Aum, |r| r.aum.into())
                        .with(Column::Clients, |r| r.client_count.into())
                        .with(Column::Percent, |r| r.percent_of_total.unwrap_or(0.0).into()),
                    filter_field: None,
                    columns: vec![
                        ColumnSpec::new(name_header, |r: &AumShareRow| r.name.as_str().into()),
                        ColumnSpec::new("AUM", |r: &AumShareRow| r.aum.into()),
                        ColumnSpec::new("Clients", |r: &AumShareRow| r.client_count.into()),
                        ColumnSpec::new("% of Total", |r: &AumShareRow| percent_label(r.percent_of_total)),
                    ],
                })
            }
            Dataset::Flows => Box::new(DatasetTable {
                dataset,
                rows: snapshot.net_flows.clone()?,
                getters: ColumnGetters::new()
                    .with(Column::Period, |r: &NetFlowPeriod| r.period.as_str().into())
                    .with(Column::Purchases, |r| r.purchases.into())
                    .with(Column::Redemptions, |r| r.redemptions.into())
                    .with(Column::Net, |r| r.net.into()),
                filter_field: Some(|r: &NetFlowPeriod| r.period.as_str().into()),
                columns: vec![
                    ColumnSpec::new("Month", |r: &NetFlowPeriod| r.period.as_str().into()),
                    ColumnSpec::new("Purchases", |r: &NetFlowPeriod| r.purchases.into()),
                    ColumnSpec::new("Redemptions", |r: &NetFlowPeriod| r.redemptions.into()),
                    ColumnSpec::new("Net", |r: &NetFlowPeriod| r.net.into()),
                ],
            }),
            Dataset::Sip => {
                let sip = snapshot.sip_health.as_ref()?;
                let rows = vec![
                    SipMetricRow::new("Active SIPs", sip.active.into()),
                    SipMetricRow::new("Paused SIPs", sip.paused.into()),
                    SipMetricRow::new("Cancelled SIPs", sip.cancelled.into()),
                    SipMetricRow::new("Total SIPs", sip.total.into()),
                    SipMetricRow::new("Monthly Book", sip.total_monthly_amount),
                    SipMetricRow::new("Mandate Expiring", sip.mandate_expiring_count.into()),
                ];
                Box::new(DatasetTable {
                    dataset,
                    rows,
                    getters: ColumnGetters::new()
                        .with(Column::Metric, |r: &SipMetricRow| r.metric.into())
                        .with(Column::Value, |r| r.value.into()),
                    filter_field: None,
                    columns: vec![
                        ColumnSpec::new("Metric", |r: &SipMetricRow| r.metric.into()),
                        ColumnSpec::new("Value", |r: &SipMetricRow| r.value.into()),
                    ],
                })
            }
            Dataset::Revenue => {
                let revenue = snapshot.revenue.as_ref()?;
                // Running total follows the time order of the projection,
                // before any display sort or filter.
                let mut running = 0.0;
                let rows = revenue
                    .projections
                    .iter()
                    .map(|p| {
                        running += p.projected_trail;
                        RevenueRow {
                            period: p.period.clone(),
                            projected_aum: p.projected_aum,
                            projected_trail: p.projected_trail,
                            cumulative: round_to_cents(running),
                        }
                    })
                    .collect();
                Box::new(DatasetTable {
                    dataset,
                    rows,
                    getters: ColumnGetters::new()
                        .with(Column::Period, |r: &RevenueRow| r.period.as_str().into())
                        .with(Column::Aum, |r| r.projected_aum.into())
                        .with(Column::Trail, |r| r.projected_trail.into())
                        .with(Column::Cumulative, |r| r.cumulative.into()),
                    filter_field: Some(|r: &RevenueRow| r.period.as_str().into()),
                    columns: vec![
                        ColumnSpec::new("Month", |r: &RevenueRow| r.period.as_str().into()),
                        ColumnSpec::new("Projected AUM", |r: &RevenueRow| r.projected_aum.into()),
                        ColumnSpec::new("Trail", |r: &RevenueRow| r.projected_trail.into()),
                        ColumnSpec::new("Cumulative", |r: &RevenueRow| r.cumulative.into()),
                    ],
                })
            }
            Dataset::Concentration => {
                let concentration = snapshot.concentration.as_ref()?;
                let mut running = 0.0;
                let rows = concentration
                    .clients
                    .iter()
                    .map(|c| {
                        running += c.percent_of_total;
                        ConcentrationRow {
                            rank: c.rank,
                            name: c.name.clone(),
                            aum: c.aum,
                            percent_of_total: c.percent_of_total,
                            cumulative_percent: running,
                        }
                    })
                    .collect();
                Box::new(DatasetTable {
                    dataset,
                    rows,
                    getters: ColumnGetters::new()
                        .with(Column::Rank, |r: &ConcentrationRow| r.rank.into())
                        .with(Column::Name, |r| r.name.as_str().into())
                        .with(Column::Aum, |r| r.aum.into())
                        .with(Column::Percent, |r| r.percent_of_total.into())
                        .with(Column::Cumulative, |r| r.cumulative_percent.into()),
                    filter_field: None,
                    columns: vec![
                        ColumnSpec::new("Rank", |r: &ConcentrationRow| r.rank.into()),
                        ColumnSpec::new("Name", |r: &ConcentrationRow| r.name.as_str().into()),
                        ColumnSpec::new("AUM", |r: &ConcentrationRow| r.aum.into()),
                        ColumnSpec::new("% of Total", |r: &ConcentrationRow| r.percent_of_total.into()),
                        ColumnSpec::new("Cumulative %", |r: &ConcentrationRow| {
                            percent_label(Some(r.cumulative_percent))
                        }),
                    ],
                })
            }
            Dataset::Dormant => Box::new(DatasetTable {
                dataset,
                rows: snapshot.dormant_clients.clone()?,
                getters: ColumnGetters::new()
                    .with(Column::Name, |r: &DormantClient| r.name.as_str().into())
                    .with(Column::Email, |r| r.email.as_str().into())
                    .with(Column::Aum, |r| r.aum.into())
                    .with(Column::Days, |r| r.days_since_last_txn.into()),
                filter_field: None,
                columns: vec![
                    ColumnSpec::new("Name", |r: &DormantClient| r.name.as_str().into()),
                    ColumnSpec::new("Email", |r: &DormantClient| r.email.as_str().into()),
                    ColumnSpec::new("AUM", |r: &DormantClient| r.aum.into()),
                    ColumnSpec::new("Days Inactive", |r: &DormantClient| r.days_since_last_txn.into()),
                ],
            }),
            Dataset::RevenueAttribution => Box::new(DatasetTable {
                dataset,
                rows: snapshot.revenue_attribution.as_ref()?.by_amc.clone(),
                getters: ColumnGetters::new()
                    .with(Column::Amc, |r: &AmcRevenue| r.amc_name.as_str().into())
                    .with(Column::Aum, |r| r.aum_amount.into())
                    .with(Column::TrailRate, |r| r.trail_rate.into())
                    .with(Column::Trail, |r| r.estimated_trail.into())
                    .with(Column::Percent, |r| r.percent_of_total.into()),
                filter_field: None,
                columns: vec![
                    ColumnSpec::new("AMC", |r: &AmcRevenue| r.amc_name.as_str().into()),
                    ColumnSpec::new("AUM", |r: &AmcRevenue| r.aum_amount.into()),
                    ColumnSpec::new("Trail Rate %", |r: &AmcRevenue| r.trail_rate.into()),
                    ColumnSpec::new("Est. Trail", |r: &AmcRevenue| r.estimated_trail.into()),
                    ColumnSpec::new("% of Total", |r: &AmcRevenue| r.percent_of_total.into()),
                ],
            }),
            Dataset::Tiers => Box::new(DatasetTable {
                dataset,
                rows: snapshot.segmentation.as_ref()?.tiers.clone(),
                getters: ColumnGetters::new()
                    .with(Column::Tier, |r: &ClientTier| r.tier.as_str().into())
                    .with(Column::Clients, |r| r.client_count.into())
                    .with(Column::Aum, |r| r.total_aum.into())
                    .with(Column::Avg, |r| r.avg_aum.into())
                    .with(Column::Percent, |r| r.percent_of_aum.into()),
                filter_field: None,
                columns: vec![
                    ColumnSpec::new("Tier", |r: &ClientTier| r.tier.as_str().into()),
                    ColumnSpec::new("Clients", |r: &ClientTier| r.client_count.into()),
                    ColumnSpec::new("Total AUM", |r: &ClientTier| r.total_aum.into()),
                    ColumnSpec::new("Avg AUM", |r: &ClientTier| r.avg_aum.into()),
                    ColumnSpec::new("% of AUM", |r: &ClientTier| r.percent_of_aum.into()),
                ],
            }),
        };
        Some(view)
    }
}

impl Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for Dataset {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.to_lowercase();
        Dataset::ALL
            .into_iter()
            .find(|d| d.key() == key)
            .ok_or_else(|| anyhow::anyhow!("Invalid dataset: {}", s))
    }
}

/// A dataset's rows, viewed through its registered columns.
pub trait TableView {
    fn dataset(&self) -> Dataset;

    fn headers(&self) -> Vec<&'static str>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn sortable_columns(&self) -> Vec<Column>;

    /// Distinct period values in source order; empty when the dataset has
    /// no period filter.
    fn filter_options(&self) -> Vec<String>;

    /// Cells of the rows matching `filter`, ordered by `sort`.
    fn view(&self, sort: &SortSpec<Column>, filter: &str) -> Vec<Vec<CellValue>>;

    /// The full dataset in source order as CSV.
    fn to_csv(&self) -> Result<String>;
}

struct DatasetTable<R> {
    dataset: Dataset,
    rows: Vec<R>,
    getters: ColumnGetters<R, Column>,
    filter_field: Option<Getter<R>>,
    columns: Vec<ColumnSpec<R>>,
}

impl<R: Clone> TableView for DatasetTable<R> {
    fn dataset(&self) -> Dataset {
        self.dataset
    }

    fn headers(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.header).collect()
    }

    fn len(&self) -> usize {
        self.rows.len()
    }

    fn sortable_columns(&self) -> Vec<Column> {
        self.getters.columns().collect()
    }

    fn filter_options(&self) -> Vec<String> {
        let Some(field) = self.filter_field else {
            return Vec::new();
        };
        let mut options: Vec<String> = Vec::new();
        for row in &self.rows {
            let value = field(row).to_string();
            if !options.contains(&value) {
                options.push(value);
            }
        }
        options
    }

    fn view(&self, sort: &SortSpec<Column>, filter: &str) -> Vec<Vec<CellValue>> {
        let filtered = match self.filter_field {
            Some(field) => table::filter_exact(&self.rows, field, filter, ALL_PERIODS),
            None => self.rows.clone(),
        };
        table::sort_rows(&filtered, sort, &self.getters)
            .iter()
            .map(|row| self.columns.iter().map(|c| (c.value)(row)).collect())
            .collect()
    }

    fn to_csv(&self) -> Result<String> {
        to_delimited_text(&self.rows, &self.columns)
    }
}

#[derive(Debug, Clone)]
struct CategoryRow {
    category: String,
    aum: f64,
    percent_of_total: Option<f64>,
}

#[derive(Debug, Clone)]
struct AumShareRow {
    name: String,
    aum: f64,
    client_count: u32,
    percent_of_total: Option<f64>,
}

#[derive(Debug, Clone)]
struct SipMetricRow {
    metric: &'static str,
    value: f64,
}

impl SipMetricRow {
    fn new(metric: &'static str, value: f64) -> Self {
        Self { metric, value }
    }
}

#[derive(Debug, Clone)]
struct RevenueRow {
    period: String,
    projected_aum: f64,
    projected_trail: f64,
    cumulative: f64,
}

#[derive(Debug, Clone)]
struct ConcentrationRow {
    rank: u32,
    name: String,
    aum: f64,
    percent_of_total: f64,
    cumulative_percent: f64,
}

/// Percentage of `total`, or `None` when there is no total to divide by.
fn share(value: f64, total: f64) -> Option<f64> {
    (total > 0.0).then(|| value / total * 100.0)
}

fn percent_label(percent: Option<f64>) -> CellValue {
    match percent {
        Some(p) => format!("{p:.1}%").into(),
        None => "0%".into(),
    }
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
