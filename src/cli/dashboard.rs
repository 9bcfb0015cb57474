use super::ui;
use crate::core::aggregator::{self, Snapshot, SourceAggregator};
use crate::core::metrics::{MetricId, MetricsProvider, ScorecardDelta};
use anyhow::Result;
use comfy_table::Cell;

/// Loads every metric and prints the headline figures.
pub async fn run(provider: &(dyn MetricsProvider + Send + Sync)) -> Result<()> {
    let mut aggregator = SourceAggregator::new();
    let sources = aggregator::catalogue(provider);

    let pb = ui::new_progress_bar(sources.len() as u64, true);
    pb.set_message("Fetching metrics...");
    let snapshot = aggregator
        .fetch_all_with_progress(sources, &|| pb.inc(1))
        .await;
    pb.finish_and_clear();

    println!("{}", render(snapshot));
    Ok(())
}

/// Headline table, the month-on-month scorecard and an availability footer.
pub fn render(snapshot: &Snapshot) -> String {
    let mut output = format!(
        "{}\n\n",
        ui::style_text("Business Overview", ui::StyleType::Title)
    );
    output.push_str(&headline_table(snapshot).to_string());

    if let Some(scorecard) = &snapshot.scorecard {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell(&format!("{} vs {}", scorecard.period, scorecard.prev_period)),
            ui::header_cell("Current"),
            ui::header_cell("Previous"),
            ui::header_cell("Change"),
        ]);
        let deltas: [(&str, &ScorecardDelta); 4] = [
            ("AUM", &scorecard.aum),
            ("Net Flows", &scorecard.net_flows),
            ("SIP Book", &scorecard.sip_book),
            ("Clients", &scorecard.client_count),
        ];
        for (label, delta) in deltas {
            table.add_row(vec![
                Cell::new(label),
                ui::number_cell(ui::format_inr(delta.current)),
                ui::number_cell(ui::format_inr(delta.previous)),
                ui::change_cell(delta.delta_percent),
            ]);
        }
        output.push_str("\n\n");
        output.push_str(&table.to_string());
        output.push_str(&format!(
            "\nNew clients: {}  Lost clients: {}",
            scorecard.new_clients, scorecard.lost_clients
        ));
    }

    let available = snapshot.available();
    output.push_str(&format!(
        "\n\n{}",
        ui::style_text(
            &format!(
                "Loaded {}/{} metrics",
                available.len(),
                MetricId::ALL.len()
            ),
            ui::StyleType::TotalLabel
        )
    ));
    let missing: Vec<&str> = MetricId::ALL
        .iter()
        .filter(|id| !snapshot.is_available(**id))
        .map(|id| id.key())
        .collect();
    if !missing.is_empty() {
        output.push_str(&format!(
            "\n{}",
            ui::style_text(
                &format!("Unavailable: {}", missing.join(", ")),
                ui::StyleType::Error
            )
        ));
    }
    output
}

fn headline_table(snapshot: &Snapshot) -> comfy_table::Table {
    let money = ui::format_inr;
    let count = |v: u32| v.to_string();
    let percent = |v: f64| format!("{v:.1}%");

    let aum = snapshot.aum.as_ref();
    let sip = snapshot.sip_health.as_ref();
    let revenue = snapshot.revenue.as_ref();
    let concentration = snapshot.concentration.as_ref();
    let segmentation = snapshot.segmentation.as_ref();

    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Metric"), ui::header_cell("Value")]);

    let rows: Vec<(String, Cell)> = vec![
        (
            "Total AUM".to_string(),
            ui::format_optional_cell(aum.map(|a| a.total_aum), money),
        ),
        (
            "Equity AUM".to_string(),
            ui::format_optional_cell(aum.map(|a| a.equity_aum), money),
        ),
        (
            "Debt AUM".to_string(),
            ui::format_optional_cell(aum.map(|a| a.debt_aum), money),
        ),
        (
            "Active SIPs".to_string(),
            ui::format_optional_cell(sip.map(|s| s.active), count),
        ),
        (
            "Monthly SIP Book".to_string(),
            ui::format_optional_cell(sip.map(|s| s.total_monthly_amount), money),
        ),
        (
            "Monthly Trail".to_string(),
            ui::format_optional_cell(revenue.map(|r| r.current_monthly_trail), money),
        ),
        (
            "12M Trail Projection".to_string(),
            ui::format_optional_cell(revenue.map(|r| r.annual_12m_projection), money),
        ),
        (
            "Average Trail Rate".to_string(),
            ui::format_optional_cell(revenue.map(|r| r.avg_trail_rate), |v: f64| {
                format!("{v:.2}%")
            }),
        ),
        (
            format!(
                "Top {} Client Share",
                concentration.map_or("N".to_string(), |c| c.top_n.to_string())
            ),
            ui::format_optional_cell(concentration.map(|c| c.concentration_percent), percent),
        ),
        (
            "Dormant Clients".to_string(),
            ui::format_optional_cell(
                snapshot.dormant_clients.as_ref().map(|d| d.len() as u32),
                count,
            ),
        ),
        (
            "Trail Income (All AMCs)".to_string(),
            ui::format_optional_cell(
                snapshot
                    .revenue_attribution
                    .as_ref()
                    .map(|r| r.total_trail_income),
                money,
            ),
        ),
        (
            "Total Clients".to_string(),
            ui::format_optional_cell(segmentation.map(|s| s.total_clients), count),
        ),
    ];

    for (label, value) in rows {
        table.add_row(vec![Cell::new(label), value]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metrics::{AumOverview, SipHealth};

    #[test]
    fn test_render_marks_missing_metrics() {
        let snapshot = Snapshot {
            aum: Some(AumOverview {
                total_aum: 2_500_000.0,
                ..AumOverview::default()
            }),
            sip_health: Some(SipHealth {
                active: 7,
                ..SipHealth::default()
            }),
            ..Snapshot::default()
        };
        let output = render(&snapshot);

        assert!(output.contains("25,00,000.00"));
        assert!(output.contains("N/A"));
        assert!(output.contains("Loaded 2/11 metrics"));
        assert!(output.contains("dormant-clients"));
        assert!(!output.contains("aum-overview,"));
    }

    #[test]
    fn test_render_empty_snapshot() {
        let output = render(&Snapshot::default());
        assert!(output.contains("Loaded 0/11 metrics"));
        assert!(output.contains("Top N Client Share"));
    }
}
