use std::fmt;

use crate::dispatch::ChartKind;
use crate::stats::{Bin, FiveNumber, LinearFit};

// =============================================================================
// Chart specification
// =============================================================================

/// Validated, renderable description of one chart.
///
/// Owns all of its data; nothing here points back at the source table, so a
/// spec can be handed to a renderer or exporter after the table is gone.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    /// `None` suppresses the axis label (pie charts suppress both).
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub data: ChartData,
}

/// A position on the x axis: a number for continuous axes, a label otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum AxisValue {
    Number(f64),
    Category(String),
}

impl fmt::Display for AxisValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisValue::Number(n) => write!(f, "{n}"),
            AxisValue::Category(c) => write!(f, "{c}"),
        }
    }
}

/// Resolved series data, one shape per chart kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartData {
    Line {
        points: Vec<(AxisValue, f64)>,
    },
    Bar {
        bars: Vec<Bar>,
    },
    Pie {
        slices: Vec<PieSlice>,
    },
    Scatter {
        /// Grouping column, when colour grouping is active.
        group_by: Option<String>,
        groups: Vec<PointGroup>,
    },
    Histogram {
        bins: Vec<Bin>,
        /// Density scaled to bin counts so it overlays the bars.
        density: Vec<(f64, f64)>,
    },
    Box {
        boxes: Vec<BoxGroup>,
    },
    Heatmap {
        columns: Vec<String>,
        /// Row-major correlation matrix; NaN where a column has no variance.
        matrix: Vec<Vec<f64>>,
        annotations: Vec<Vec<String>>,
    },
    Trendline {
        points: Vec<(f64, f64)>,
        fit: Option<LinearFit>,
        /// Month labels when x was coerced from month names, indexed by ordinal - 1.
        x_ticks: Option<Vec<String>>,
    },
    MultiSeries {
        categories: Vec<String>,
        series: Vec<Series>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    /// Height drawn for this bar, after the request's aggregation.
    pub value: f64,
    pub sum: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub label: String,
    pub value: f64,
    /// Share of the total, in `[0, 1]` for non-negative data.
    pub fraction: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointGroup {
    pub key: String,
    pub points: Vec<(AxisValue, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxGroup {
    pub label: String,
    pub summary: FiveNumber,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    /// One value per category, aligned with `ChartData::MultiSeries::categories`.
    pub values: Vec<f64>,
}

// =============================================================================
// Comparison layout
// =============================================================================

/// Two independently validated charts placed side by side.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub left: ChartSpec,
    pub right: ChartSpec,
    pub layout: Layout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub rows: usize,
    pub cols: usize,
}

impl Layout {
    pub fn side_by_side() -> Self {
        Self { rows: 1, cols: 2 }
    }
}
