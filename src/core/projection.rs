//! Month-by-month compounding of AUM, contribution book and trail revenue.

use crate::core::aggregator::Snapshot;
use crate::core::config::ProjectionConfig;
use serde::{Deserialize, Serialize};

/// Trail rate assumed when the snapshot carries no revenue projection.
pub const DEFAULT_REVENUE_RATE_PERCENT: f64 = 0.5;

/// Horizons offered as quick picks, in months.
pub const HORIZON_PRESETS: [u32; 3] = [12, 24, 36];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionInputs {
    pub base_aum: f64,
    pub base_contribution_monthly: f64,
    pub base_revenue_rate_percent: f64,
    pub annual_aum_growth_percent: f64,
    pub annual_contribution_growth_percent: f64,
    pub rate_adjustment_bps: f64,
    pub horizon_months: u32,
}

impl ProjectionInputs {
    /// Seeds the base figures from the snapshot and the assumptions from
    /// `config`. Missing metrics fall back to zero (or the default rate).
    pub fn from_snapshot(snapshot: &Snapshot, config: &ProjectionConfig) -> Self {
        Self {
            base_aum: snapshot.aum.as_ref().map_or(0.0, |a| a.total_aum),
            base_contribution_monthly: snapshot
                .sip_health
                .as_ref()
                .map_or(0.0, |s| s.total_monthly_amount),
            base_revenue_rate_percent: snapshot
                .revenue
                .as_ref()
                .map(|r| r.avg_trail_rate)
                .filter(|rate| *rate != 0.0)
                .unwrap_or(DEFAULT_REVENUE_RATE_PERCENT),
            annual_aum_growth_percent: config.annual_aum_growth_percent,
            annual_contribution_growth_percent: config.annual_contribution_growth_percent,
            rate_adjustment_bps: config.rate_adjustment_bps,
            horizon_months: config.horizon_months,
        }
    }
}

/// One projected month. Produced in increasing month order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionRow {
    pub month: u32,
    pub projected_aum: f64,
    pub projected_contribution_book: f64,
    pub period_revenue: f64,
    pub cumulative_revenue: f64,
}

/// Runs the projection for `inputs.horizon_months` months.
///
/// Each month grows AUM by the monthly rate and then adds that month's
/// contribution; the contribution itself grows afterwards. Revenue accrues on
/// the month-end AUM at the adjusted annual rate.
pub fn project(inputs: &ProjectionInputs) -> Vec<ProjectionRow> {
    let monthly_aum_growth = inputs.annual_aum_growth_percent / 100.0 / 12.0;
    let monthly_contribution_growth = inputs.annual_contribution_growth_percent / 100.0 / 12.0;
    let effective_rate = inputs.base_revenue_rate_percent + inputs.rate_adjustment_bps / 100.0;

    let mut aum = inputs.base_aum;
    let mut contribution = inputs.base_contribution_monthly;
    let mut cumulative_revenue = 0.0;

    (1..=inputs.horizon_months)
        .map(|month| {
            aum = aum * (1.0 + monthly_aum_growth) + contribution;
            contribution *= 1.0 + monthly_contribution_growth;
            let period_revenue = aum * effective_rate / 100.0 / 12.0;
            cumulative_revenue += period_revenue;

            ProjectionRow {
                month,
                projected_aum: aum.round(),
                projected_contribution_book: contribution.round(),
                period_revenue: round_to_cents(period_revenue),
                cumulative_revenue: round_to_cents(cumulative_revenue),
            }
        })
        .collect()
}

/// Headline figures at the end of a projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionSummary {
    pub final_aum: f64,
    pub final_contribution_book: f64,
    pub total_revenue: f64,
    /// Growth of the final AUM over the base, in percent. `None` for a zero base.
    pub aum_growth_percent: Option<f64>,
}

pub fn summarize(base_aum: f64, rows: &[ProjectionRow]) -> Option<ProjectionSummary> {
    let last = rows.last()?;
    Some(ProjectionSummary {
        final_aum: last.projected_aum,
        final_contribution_book: last.projected_contribution_book,
        total_revenue: last.cumulative_revenue,
        aum_growth_percent: (base_aum > 0.0)
            .then(|| (last.projected_aum - base_aum) / base_aum * 100.0),
    })
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
