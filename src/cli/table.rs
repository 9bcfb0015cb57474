use super::ui;
use crate::core::aggregator::{MetricSource, SourceAggregator};
use crate::core::datasets::{ALL_PERIODS, Column, Dataset, TableView};
use crate::core::metrics::MetricsProvider;
use crate::core::table::{CellValue, SortDirection, SortSpec};
use anyhow::{Context, Result, bail};
use comfy_table::{Cell, CellAlignment};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct TableOptions {
    pub dataset: Dataset,
    /// Column selections in the order they were made.
    pub sort: Vec<Column>,
    pub filter: Option<String>,
    pub export: Option<PathBuf>,
}

impl TableOptions {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset,
            sort: Vec::new(),
            filter: None,
            export: None,
        }
    }
}

/// Replays column selections from the default sort; picking the same column
/// twice in a row flips it to descending.
pub fn sort_spec(selections: &[Column]) -> SortSpec<Column> {
    selections
        .iter()
        .fold(SortSpec::default(), |spec, column| spec.toggle(*column))
}

pub async fn run(
    provider: &(dyn MetricsProvider + Send + Sync),
    options: &TableOptions,
) -> Result<()> {
    let dataset = options.dataset;
    let mut aggregator = SourceAggregator::new();
    let snapshot = aggregator
        .fetch_all(vec![MetricSource::from_provider(provider, dataset.source())])
        .await;

    let Some(view) = dataset.build(snapshot) else {
        bail!(
            "{} is unavailable: metric {} could not be loaded",
            dataset.label(),
            dataset.source()
        );
    };

    let sort = sort_spec(&options.sort);
    if let Some(column) = sort.column
        && !view.sortable_columns().contains(&column)
    {
        warn!("Column {} is not sortable on {}; keeping source order", column, dataset);
    }

    let filter = options.filter.as_deref().unwrap_or(ALL_PERIODS);
    if filter != ALL_PERIODS && view.filter_options().is_empty() {
        warn!("{} has no period filter; showing all rows", dataset);
    }

    println!("{}", render(view.as_ref(), &sort, filter));

    if let Some(path) = &options.export {
        let written = export(view.as_ref(), path)?;
        println!(
            "\n{}",
            ui::style_text(
                &format!("Exported {} rows to {}", view.len(), written.display()),
                ui::StyleType::Subtle
            )
        );
    }
    Ok(())
}

pub fn render(view: &dyn TableView, sort: &SortSpec<Column>, filter: &str) -> String {
    let dataset = view.dataset();
    let mut table = ui::new_styled_table();
    table.set_header(view.headers().into_iter().map(ui::header_cell).collect::<Vec<_>>());

    let rows = view.view(sort, filter);
    let shown = rows.len();
    for row in rows {
        table.add_row(row.iter().map(format_cell).collect::<Vec<_>>());
    }

    let mut output = format!(
        "{}\n\n",
        ui::style_text(dataset.label(), ui::StyleType::Title)
    );
    output.push_str(&table.to_string());

    let mut footer = format!("{shown} of {} rows", view.len());
    if let Some(column) = sort.column {
        let arrow = match sort.direction {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        };
        footer.push_str(&format!(", sorted by {column} {arrow}"));
    }
    let options = view.filter_options();
    if !options.is_empty() {
        footer.push_str(&format!(
            ", period {filter} (available: {}, {})",
            ALL_PERIODS,
            options.join(", ")
        ));
    }
    output.push_str(&format!(
        "\n{}",
        ui::style_text(&footer, ui::StyleType::Subtle)
    ));
    output
}

/// Writes the full dataset as CSV. A directory target gets the dataset's
/// default file name.
pub fn export(view: &dyn TableView, path: &Path) -> Result<PathBuf> {
    let target = if path.is_dir() {
        path.join(format!("{}.csv", view.dataset().file_stem()))
    } else {
        path.to_path_buf()
    };

    let csv = view.to_csv()?;
    std::fs::write(&target, csv)
        .with_context(|| format!("Failed to write export to {}", target.display()))?;
    info!("Exported {} to {}", view.dataset(), target.display());
    Ok(target)
}

fn format_cell(value: &CellValue) -> Cell {
    match value {
        CellValue::Number(n) if n.fract() == 0.0 => {
            Cell::new(format!("{n:.0}")).set_alignment(CellAlignment::Right)
        }
        CellValue::Number(n) => Cell::new(format!("{n:.2}")).set_alignment(CellAlignment::Right),
        CellValue::Text(s) => Cell::new(s),
    }
}
