//! Sorting, filtering and delimited-text export shared by every data table.
//!
//! The engine never looks at a row directly. Each dataset registers an
//! extractor per column once, and every operation goes through those.

use anyhow::{Context, Result, anyhow};
use std::cmp::Ordering;
use std::fmt::Display;

/// A value pulled out of a row for comparison or display.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<u32> for CellValue {
    fn from(value: u32) -> Self {
        CellValue::Number(value.into())
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

/// Numeric when both sides are numbers, case-insensitive text otherwise.
///
/// Text is compared by code point after lowercasing, not by locale collation,
/// so accented letters sort after `z`.
pub fn compare_cells(a: &CellValue, b: &CellValue) -> Ordering {
    match (a, b) {
        (CellValue::Number(x), CellValue::Number(y)) => x.total_cmp(y),
        _ => {
            let left = a.to_string().to_lowercase();
            let right = b.to_string().to_lowercase();
            left.cmp(&right)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Column to sort on and the direction. No column means source order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec<C> {
    pub column: Option<C>,
    pub direction: SortDirection,
}

impl<C> Default for SortSpec<C> {
    fn default() -> Self {
        Self {
            column: None,
            direction: SortDirection::Asc,
        }
    }
}

impl<C: Copy + PartialEq> SortSpec<C> {
    pub fn new(column: C, direction: SortDirection) -> Self {
        Self {
            column: Some(column),
            direction,
        }
    }

    /// Selecting the current column again flips direction; any other column
    /// starts ascending.
    pub fn toggle(self, column: C) -> Self {
        let direction = match (self.column, self.direction) {
            (Some(current), SortDirection::Asc) if current == column => SortDirection::Desc,
            _ => SortDirection::Asc,
        };
        Self::new(column, direction)
    }
}

pub type Getter<R> = fn(&R) -> CellValue;

/// Closed mapping from column identifier to extractor, built once per dataset.
pub struct ColumnGetters<R, C> {
    entries: Vec<(C, Getter<R>)>,
}

impl<R, C: Copy + PartialEq> ColumnGetters<R, C> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn with(mut self, column: C, getter: Getter<R>) -> Self {
        self.entries.retain(|(c, _)| *c != column);
        self.entries.push((column, getter));
        self
    }

    pub fn get(&self, column: C) -> Option<Getter<R>> {
        self.entries
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, getter)| *getter)
    }

    pub fn columns(&self) -> impl Iterator<Item = C> + '_ {
        self.entries.iter().map(|(c, _)| *c)
    }
}

impl<R, C: Copy + PartialEq> Default for ColumnGetters<R, C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns a new, stably ordered copy of `rows`.
///
/// A column without a registered getter leaves the order untouched.
pub fn sort_rows<R: Clone, C: Copy + PartialEq>(
    rows: &[R],
    spec: &SortSpec<C>,
    getters: &ColumnGetters<R, C>,
) -> Vec<R> {
    let mut sorted = rows.to_vec();
    let Some(getter) = spec.column.and_then(|column| getters.get(column)) else {
        return sorted;
    };

    sorted.sort_by(|a, b| {
        let ordering = compare_cells(&getter(a), &getter(b));
        match spec.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
    sorted
}

/// Keeps rows whose `field` equals `value`, or every row for `all_sentinel`.
pub fn filter_exact<R: Clone>(
    rows: &[R],
    field: Getter<R>,
    value: &str,
    all_sentinel: &str,
) -> Vec<R> {
    if value == all_sentinel {
        return rows.to_vec();
    }
    rows.iter()
        .filter(|row| field(row).to_string() == value)
        .cloned()
        .collect()
}

/// Header text plus the extractor for one exported column.
pub struct ColumnSpec<R> {
    pub header: &'static str,
    pub value: Getter<R>,
}

impl<R> ColumnSpec<R> {
    pub fn new(header: &'static str, value: Getter<R>) -> Self {
        Self { header, value }
    }
}

/// Serializes `rows` as CSV: one header line then one line per row.
///
/// Line breaks inside a cell become spaces so every record stays on one line.
pub fn to_delimited_text<R>(rows: &[R], columns: &[ColumnSpec<R>]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(columns.iter().map(|c| c.header))
        .context("Failed to write CSV header")?;

    for (i, row) in rows.iter().enumerate() {
        writer
            .write_record(columns.iter().map(|c| single_line((c.value)(row).to_string())))
            .with_context(|| format!("Failed to write CSV row {i}"))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to flush CSV output: {}", e.error()))?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

fn single_line(text: String) -> String {
    if text.contains(['\r', '\n']) {
        text.replace("\r\n", " ").replace(['\r', '\n'], " ")
    } else {
        text
    }
}
