use thiserror::Error;

use crate::dispatch::ChartKind;

/// Why a single render request was rejected.
///
/// None of these touch the table or the session; the next request starts clean.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChartError {
    #[error("Column '{column}' not found")]
    UnknownColumn { column: String },

    #[error("Unsupported chart kind '{kind}'")]
    UnsupportedKind { kind: String },

    #[error("{kind} chart needs numeric values in column '{column}'")]
    NonNumericAxis { kind: ChartKind, column: String },

    #[error("Multi-series chart needs columns {}", .missing.join(", "))]
    MissingSeriesColumns { missing: Vec<String> },

    #[error("Dataset has no rows to plot")]
    EmptyDataset,

    #[error("Heatmap needs at least two numeric columns, found {found}")]
    NotEnoughNumericColumns { found: usize },

    #[error("Column '{column}' must be categorical for this chart")]
    CategoricalAxisRequired { column: String },
}

/// Failure of a two-chart comparison, naming the side(s) that failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompareError {
    #[error("Chart 1 failed: {0}")]
    Left(ChartError),

    #[error("Chart 2 failed: {0}")]
    Right(ChartError),

    #[error("Both charts failed: chart 1: {left}; chart 2: {right}")]
    Both { left: ChartError, right: ChartError },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    #[error("Forecast needs at least {needed} values, got {found}")]
    NotEnoughHistory { needed: usize, found: usize },

    #[error("Forecast horizon must be at least one period")]
    InvalidHorizon,

    #[error("Forecast produced non-finite values")]
    NonFinite,
}

/// Session-level conditions. Recoverable ones are returned for the caller
/// to decide on a fallback; none of them end the process.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("No source table available")]
    EmptySource,

    #[error("No rows left after applying filter {filter}")]
    NoDataAfterFilter { filter: String },

    #[error(transparent)]
    Chart(#[from] ChartError),

    #[error(transparent)]
    Compare(#[from] CompareError),

    #[error("Forecast failed: {0}")]
    Forecast(#[from] ForecastError),
}
