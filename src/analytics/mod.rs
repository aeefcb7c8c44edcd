pub mod aggregate;
pub mod compile;
pub mod filters;
pub mod options;
pub mod pipeline;

pub use aggregate::{aggregate, total_count, ActionAmounts, AggregateResult, DimensionBreakdown};
pub use filters::{AnalyticsFilters, ParsedFilters};
pub use options::{filter_options, FilterOptions};
pub use pipeline::{build_pipeline, Dimension, Limits, Pipeline, Stage};
