use super::ui;
use crate::core::aggregator::{MetricSource, SourceAggregator};
use crate::core::config::ProjectionConfig;
use crate::core::metrics::{MetricId, MetricsProvider};
use crate::core::projection::{self, ProjectionInputs, ProjectionRow, ProjectionSummary};
use anyhow::Result;
use comfy_table::Cell;

/// Assumptions given on the command line, each replacing the configured one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectionOverrides {
    pub annual_aum_growth_percent: Option<f64>,
    pub annual_contribution_growth_percent: Option<f64>,
    pub rate_adjustment_bps: Option<f64>,
    pub horizon_months: Option<u32>,
}

impl ProjectionOverrides {
    pub fn apply(&self, config: &ProjectionConfig) -> ProjectionConfig {
        ProjectionConfig {
            annual_aum_growth_percent: self
                .annual_aum_growth_percent
                .unwrap_or(config.annual_aum_growth_percent),
            annual_contribution_growth_percent: self
                .annual_contribution_growth_percent
                .unwrap_or(config.annual_contribution_growth_percent),
            rate_adjustment_bps: self
                .rate_adjustment_bps
                .unwrap_or(config.rate_adjustment_bps),
            horizon_months: self.horizon_months.unwrap_or(config.horizon_months),
        }
    }
}

/// Metrics the projection is seeded from.
const SEED_METRICS: [MetricId; 3] = [
    MetricId::AumOverview,
    MetricId::SipHealth,
    MetricId::RevenueProjection,
];

pub async fn run(
    provider: &(dyn MetricsProvider + Send + Sync),
    config: &ProjectionConfig,
    overrides: &ProjectionOverrides,
) -> Result<()> {
    let mut aggregator = SourceAggregator::new();
    let sources = SEED_METRICS
        .into_iter()
        .map(|id| MetricSource::from_provider(provider, id))
        .collect();
    let snapshot = aggregator.fetch_all(sources).await;

    let inputs = ProjectionInputs::from_snapshot(snapshot, &overrides.apply(config));
    let rows = projection::project(&inputs);
    println!("{}", render(&inputs, &rows));
    Ok(())
}

pub fn render(inputs: &ProjectionInputs, rows: &[ProjectionRow]) -> String {
    let mut output = format!(
        "{}\n",
        ui::style_text("Revenue Projection", ui::StyleType::Title)
    );
    output.push_str(&ui::style_text(
        &format!(
            "Base AUM {} | SIP book {}/month | trail {:.2}% {:+} bps | AUM growth {}% | SIP growth {}%",
            ui::format_inr(inputs.base_aum),
            ui::format_inr(inputs.base_contribution_monthly),
            inputs.base_revenue_rate_percent,
            inputs.rate_adjustment_bps,
            inputs.annual_aum_growth_percent,
            inputs.annual_contribution_growth_percent,
        ),
        ui::StyleType::Subtle,
    ));
    output.push_str("\n\n");

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Month"),
        ui::header_cell("Projected AUM"),
        ui::header_cell("SIP Book"),
        ui::header_cell("Revenue"),
        ui::header_cell("Cumulative"),
    ]);
    for row in rows {
        table.add_row(vec![
            Cell::new(row.month),
            ui::number_cell(ui::format_inr(row.projected_aum)),
            ui::number_cell(ui::format_inr(row.projected_contribution_book)),
            ui::number_cell(ui::format_inr(row.period_revenue)),
            ui::number_cell(ui::format_inr(row.cumulative_revenue)),
        ]);
    }
    output.push_str(&table.to_string());

    if let Some(summary) = projection::summarize(inputs.base_aum, rows) {
        output.push_str(&summary_lines(&summary, rows.len()));
    }
    output
}

fn summary_lines(summary: &ProjectionSummary, months: usize) -> String {
    let growth = summary
        .aum_growth_percent
        .map_or("N/A".to_string(), |g| format!("{g:+.1}%"));
    format!(
        "\n\n{} {} ({})\n{} {}",
        ui::style_text(&format!("AUM after {months} months:"), ui::StyleType::TotalLabel),
        ui::style_text(&ui::format_inr(summary.final_aum), ui::StyleType::TotalValue),
        growth,
        ui::style_text("Total revenue:", ui::StyleType::TotalLabel),
        ui::style_text(&ui::format_inr(summary.total_revenue), ui::StyleType::TotalValue),
    )
}
