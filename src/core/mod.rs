//! Dashboard analytics: metric aggregation, tables, projections and personas

pub mod aggregator;
pub mod config;
pub mod datasets;
pub mod log;
pub mod metrics;
pub mod persona;
pub mod projection;
pub mod table;

// Re-export main types for cleaner imports
pub use aggregator::{MetricSource, Snapshot, SourceAggregator};
pub use datasets::{Column, Dataset, TableView};
pub use metrics::{MetricId, MetricValue, MetricsProvider};
pub use persona::{ClientProfile, PersonaLabel};
pub use projection::{ProjectionInputs, ProjectionRow};
