// Chart dispatcher: validate a request against a table and build a ChartSpec

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use log::{debug, info};

use crate::classify::{classify, classify_values, ColumnKind};
use crate::data::{Table, Value, EXPENSES_COLUMN, REGION_COLUMN, SALES_COLUMN};
use crate::error::ChartError;
use crate::ir::{AxisValue, Bar, BoxGroup, ChartData, ChartSpec, PieSlice, PointGroup, Series};
use crate::stats;

/// Histograms always use this many equal-width bins.
pub const HISTOGRAM_BINS: usize = 20;

/// Resolution of the density overlay drawn over a histogram.
const DENSITY_POINTS: usize = 128;

const MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    Line,
    Bar,
    Pie,
    Scatter,
    Histogram,
    Box,
    Heatmap,
    Trendline,
    MultiSeries,
}

impl ChartKind {
    pub const ALL: [ChartKind; 9] = [
        ChartKind::Line,
        ChartKind::Bar,
        ChartKind::Pie,
        ChartKind::Scatter,
        ChartKind::Histogram,
        ChartKind::Box,
        ChartKind::Heatmap,
        ChartKind::Trendline,
        ChartKind::MultiSeries,
    ];

    /// Human-readable name used in titles.
    pub fn label(&self) -> &'static str {
        match self {
            ChartKind::Line => "Line",
            ChartKind::Bar => "Bar",
            ChartKind::Pie => "Pie",
            ChartKind::Scatter => "Scatter",
            ChartKind::Histogram => "Histogram",
            ChartKind::Box => "Box",
            ChartKind::Heatmap => "Heatmap",
            ChartKind::Trendline => "Trendline",
            ChartKind::MultiSeries => "Multi-series",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ChartKind {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "line" => ChartKind::Line,
            "bar" => ChartKind::Bar,
            "pie" => ChartKind::Pie,
            "scatter" => ChartKind::Scatter,
            "hist" | "histogram" => ChartKind::Histogram,
            "box" | "boxplot" => ChartKind::Box,
            "heatmap" => ChartKind::Heatmap,
            "trend" | "trendline" => ChartKind::Trendline,
            "multi" | "multiseries" | "multi_series" => ChartKind::MultiSeries,
            _ => {
                return Err(ChartError::UnsupportedKind {
                    kind: s.to_string(),
                })
            }
        };
        Ok(kind)
    }
}

/// How bar heights are derived from the rows of each x group.
///
/// Bars default to the group mean. Totals per group, as in the sales
/// walkthrough where North shows 300 from Jan 100 and Feb 200, are asked
/// for with `agg: sum`. Every bar keeps its sum and count either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Aggregate {
    #[default]
    Mean,
    /// Also the right choice for pre-aggregated data with one row per group.
    Sum,
}

impl Aggregate {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "mean" | "avg" | "average" => Some(Aggregate::Mean),
            "sum" | "total" => Some(Aggregate::Sum),
            _ => None,
        }
    }
}

/// One render request: which chart, over which columns.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRequest {
    pub kind: ChartKind,
    pub x: String,
    pub y: String,
    pub aggregate: Aggregate,
    /// Colour grouping for scatter plots. Defaults to a `Region` column when present.
    pub group_by: Option<String>,
}

impl ChartRequest {
    pub fn new(kind: ChartKind, x: impl Into<String>, y: impl Into<String>) -> Self {
        Self {
            kind,
            x: x.into(),
            y: y.into(),
            aggregate: Aggregate::default(),
            group_by: None,
        }
    }

    pub fn with_aggregate(mut self, aggregate: Aggregate) -> Self {
        self.aggregate = aggregate;
        self
    }

    pub fn with_group_by(mut self, column: impl Into<String>) -> Self {
        self.group_by = Some(column.into());
        self
    }
}

/// Validate `request` against `table` and build the chart specification.
///
/// Pure: the table is only read, and any per-kind preprocessing (month
/// coercion for trendlines) works on a private copy.
pub fn render(request: &ChartRequest, table: &Table) -> Result<ChartSpec, ChartError> {
    debug!(
        "Rendering {} chart (x: '{}', y: '{}') over {} rows",
        request.kind,
        request.x,
        request.y,
        table.len()
    );

    let spec = match request.kind {
        ChartKind::Line => render_line(request, table),
        ChartKind::Bar => render_bar(request, table),
        ChartKind::Pie => render_pie(request, table),
        ChartKind::Scatter => render_scatter(request, table),
        ChartKind::Histogram => render_histogram(request, table),
        ChartKind::Box => render_box(request, table),
        ChartKind::Heatmap => render_heatmap(table),
        ChartKind::Trendline => render_trendline(request, table),
        ChartKind::MultiSeries => render_multi_series(request, table),
    }?;

    info!("Built {} chart '{}'", spec.kind, spec.title);
    Ok(spec)
}

// =============================================================================
// Per-kind handlers
// =============================================================================

fn render_line(request: &ChartRequest, table: &Table) -> Result<ChartSpec, ChartError> {
    let (x, y) = resolve_xy(request, table)?;
    let ys = numeric_cells(table, y, request.kind)?;
    let points = axis_values(table, x)
        .into_iter()
        .zip(ys)
        .filter_map(|(x, y)| y.map(|y| (x, y)))
        .collect();

    Ok(xy_spec(request.kind, table, x, y, ChartData::Line { points }))
}

fn render_bar(request: &ChartRequest, table: &Table) -> Result<ChartSpec, ChartError> {
    let (x, y) = resolve_xy(request, table)?;
    let ys = numeric_cells(table, y, request.kind)?;

    let bars = group_in_order(table, x, &ys)
        .into_iter()
        .map(|(label, values)| {
            let sum: f64 = values.iter().sum();
            let value = match request.aggregate {
                Aggregate::Mean => stats::mean(&values),
                Aggregate::Sum => sum,
            };
            Bar {
                label,
                value,
                sum,
                count: values.len(),
            }
        })
        .collect();

    Ok(xy_spec(request.kind, table, x, y, ChartData::Bar { bars }))
}

fn render_pie(request: &ChartRequest, table: &Table) -> Result<ChartSpec, ChartError> {
    let (x, y) = resolve_xy(request, table)?;
    let ys = numeric_cells(table, y, request.kind)?;

    let mut sums: BTreeMap<String, f64> = BTreeMap::new();
    for (label, value) in table.column(x).zip(&ys) {
        if let Some(v) = value {
            *sums.entry(label.label()).or_insert(0.0) += v;
        }
    }
    let total: f64 = sums.values().sum();
    let slices = sums
        .into_iter()
        .map(|(label, value)| PieSlice {
            label,
            value,
            fraction: if total != 0.0 { value / total } else { 0.0 },
        })
        .collect();

    let mut spec = xy_spec(request.kind, table, x, y, ChartData::Pie { slices });
    spec.x_label = None;
    spec.y_label = None;
    Ok(spec)
}

fn render_scatter(request: &ChartRequest, table: &Table) -> Result<ChartSpec, ChartError> {
    let (x, y) = resolve_xy(request, table)?;
    let ys = numeric_cells(table, y, request.kind)?;

    let group_idx = match &request.group_by {
        Some(name) => Some(require_column(table, name)?),
        None => table.column_index(REGION_COLUMN),
    };

    let xs = axis_values(table, x);
    let mut grouped: BTreeMap<String, Vec<(AxisValue, f64)>> = BTreeMap::new();
    for (row_idx, (xv, yv)) in xs.into_iter().zip(ys).enumerate() {
        let Some(yv) = yv else { continue };
        let key = match group_idx {
            Some(g) => table.rows()[row_idx][g].label(),
            None => table.columns()[y].clone(),
        };
        grouped.entry(key).or_default().push((xv, yv));
    }

    let groups = grouped
        .into_iter()
        .map(|(key, points)| PointGroup { key, points })
        .collect();
    let group_by = group_idx.map(|g| table.columns()[g].clone());

    Ok(xy_spec(request.kind, table, x, y, ChartData::Scatter { group_by, groups }))
}

fn render_histogram(request: &ChartRequest, table: &Table) -> Result<ChartSpec, ChartError> {
    let y = require_column(table, &request.y)?;
    require_rows(table)?;
    let values: Vec<f64> = numeric_cells(table, y, request.kind)?.into_iter().flatten().collect();

    let bins = stats::histogram(&values, HISTOGRAM_BINS);
    let density = match (bins.first(), bins.last()) {
        (Some(first), Some(last)) => {
            let scale = values.len() as f64 * (first.end - first.start);
            stats::kde(&values, first.start, last.end, DENSITY_POINTS)
                .into_iter()
                .map(|(x, d)| (x, d * scale))
                .collect()
        }
        _ => Vec::new(),
    };

    let name = table.columns()[y].clone();
    Ok(ChartSpec {
        kind: request.kind,
        title: format!("Histogram of {}", name),
        x_label: Some(name),
        y_label: Some("Count".to_string()),
        data: ChartData::Histogram { bins, density },
    })
}

fn render_box(request: &ChartRequest, table: &Table) -> Result<ChartSpec, ChartError> {
    let (x, y) = resolve_xy(request, table)?;
    let ys = numeric_cells(table, y, request.kind)?;

    let boxes = group_in_order(table, x, &ys)
        .into_iter()
        .filter_map(|(label, values)| {
            stats::five_number(&values).map(|summary| BoxGroup { label, summary })
        })
        .collect();

    Ok(xy_spec(request.kind, table, x, y, ChartData::Box { boxes }))
}

fn render_heatmap(table: &Table) -> Result<ChartSpec, ChartError> {
    require_rows(table)?;
    let schema = classify(table);
    let numeric: Vec<usize> = schema
        .columns
        .iter()
        .enumerate()
        .filter(|(_, (_, kind))| *kind == ColumnKind::Numeric)
        .map(|(idx, _)| idx)
        .collect();

    if numeric.len() < 2 {
        return Err(ChartError::NotEnoughNumericColumns {
            found: numeric.len(),
        });
    }

    let mut matrix = vec![vec![f64::NAN; numeric.len()]; numeric.len()];
    for (i, &a) in numeric.iter().enumerate() {
        for (j, &b) in numeric.iter().enumerate().skip(i) {
            let (xs, ys): (Vec<f64>, Vec<f64>) = table
                .rows()
                .iter()
                .filter_map(|row| Some((row[a].as_f64()?, row[b].as_f64()?)))
                .unzip();
            let r = stats::pearson(&xs, &ys);
            matrix[i][j] = r;
            matrix[j][i] = r;
        }
    }

    let annotations = matrix
        .iter()
        .map(|row| {
            row.iter()
                .map(|r| if r.is_nan() { "nan".to_string() } else { format!("{:.2}", r) })
                .collect()
        })
        .collect();

    Ok(ChartSpec {
        kind: ChartKind::Heatmap,
        title: "Correlation Heatmap".to_string(),
        x_label: None,
        y_label: None,
        data: ChartData::Heatmap {
            columns: numeric.iter().map(|&i| table.columns()[i].clone()).collect(),
            matrix,
            annotations,
        },
    })
}

fn render_trendline(request: &ChartRequest, table: &Table) -> Result<ChartSpec, ChartError> {
    let (x, y) = resolve_xy(request, table)?;
    let ys = numeric_cells(table, y, request.kind)?;

    let (coerced, x_ticks) = coerce_month_axis(table, x);
    let source = coerced.as_ref().unwrap_or(table);
    if classify_values(source.column(x)) != ColumnKind::Numeric {
        return Err(ChartError::NonNumericAxis {
            kind: request.kind,
            column: table.columns()[x].clone(),
        });
    }

    let points: Vec<(f64, f64)> = source
        .column(x)
        .zip(ys)
        .filter_map(|(xv, yv)| Some((xv.as_f64()?, yv?)))
        .collect();
    let (xs, fit_ys): (Vec<f64>, Vec<f64>) = points.iter().cloned().unzip();
    let fit = stats::linear_fit(&xs, &fit_ys);
    if fit.is_none() {
        debug!("Trendline over '{}' has fewer than two distinct x values; no fit", request.x);
    }

    Ok(xy_spec(
        request.kind,
        table,
        x,
        y,
        ChartData::Trendline {
            points,
            fit,
            x_ticks,
        },
    ))
}

fn render_multi_series(request: &ChartRequest, table: &Table) -> Result<ChartSpec, ChartError> {
    let x = require_column(table, &request.x)?;

    let missing: Vec<String> = [SALES_COLUMN, EXPENSES_COLUMN]
        .iter()
        .filter(|name| !table.has_column(name))
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ChartError::MissingSeriesColumns { missing });
    }
    require_rows(table)?;

    if classify_values(table.column(x)) != ColumnKind::Categorical {
        return Err(ChartError::CategoricalAxisRequired {
            column: table.columns()[x].clone(),
        });
    }

    let mut categories: Vec<String> = Vec::new();
    for value in table.column(x) {
        let label = value.label();
        if !categories.contains(&label) {
            categories.push(label);
        }
    }

    let mut series = Vec::new();
    for name in [SALES_COLUMN, EXPENSES_COLUMN] {
        let idx = require_column(table, name)?;
        let cells = numeric_cells(table, idx, request.kind)?;
        let mut values = vec![0.0; categories.len()];
        for (label, cell) in table.column(x).zip(cells) {
            if let (Some(v), Some(slot)) = (cell, categories.iter().position(|c| *c == label.label())) {
                values[slot] += v;
            }
        }
        series.push(Series {
            name: table.columns()[idx].clone(),
            values,
        });
    }

    let x_name = table.columns()[x].clone();
    Ok(ChartSpec {
        kind: request.kind,
        title: format!("{} and {} by {}", SALES_COLUMN, EXPENSES_COLUMN, x_name),
        x_label: Some(x_name),
        y_label: Some("Total".to_string()),
        data: ChartData::MultiSeries { categories, series },
    })
}

// =============================================================================
// Validation and extraction helpers
// =============================================================================

fn require_column(table: &Table, name: &str) -> Result<usize, ChartError> {
    table.column_index(name).ok_or_else(|| ChartError::UnknownColumn {
        column: name.to_string(),
    })
}

fn require_rows(table: &Table) -> Result<(), ChartError> {
    if table.is_empty() {
        return Err(ChartError::EmptyDataset);
    }
    Ok(())
}

/// Both axes must exist before the row count is considered.
fn resolve_xy(request: &ChartRequest, table: &Table) -> Result<(usize, usize), ChartError> {
    let x = require_column(table, &request.x)?;
    let y = require_column(table, &request.y)?;
    require_rows(table)?;
    Ok((x, y))
}

/// Numeric cells of a column aligned with the rows; `None` for missing cells.
fn numeric_cells(table: &Table, idx: usize, kind: ChartKind) -> Result<Vec<Option<f64>>, ChartError> {
    if classify_values(table.column(idx)) != ColumnKind::Numeric {
        return Err(ChartError::NonNumericAxis {
            kind,
            column: table.columns()[idx].clone(),
        });
    }
    Ok(table.column(idx).map(Value::as_f64).collect())
}

fn axis_values(table: &Table, idx: usize) -> Vec<AxisValue> {
    let numeric = classify_values(table.column(idx)) == ColumnKind::Numeric;
    table
        .column(idx)
        .map(|v| match (numeric, v.as_f64()) {
            (true, Some(n)) => AxisValue::Number(n),
            _ => AxisValue::Category(v.label()),
        })
        .collect()
}

/// Group y values by x label, keeping groups in order of first appearance.
fn group_in_order(table: &Table, x: usize, ys: &[Option<f64>]) -> Vec<(String, Vec<f64>)> {
    let mut groups: Vec<(String, Vec<f64>)> = Vec::new();
    for (value, y) in table.column(x).zip(ys) {
        let Some(y) = y else { continue };
        let label = value.label();
        match groups.iter_mut().find(|(l, _)| *l == label) {
            Some((_, values)) => values.push(*y),
            None => groups.push((label, vec![*y])),
        }
    }
    groups
}

fn xy_spec(kind: ChartKind, table: &Table, x: usize, y: usize, data: ChartData) -> ChartSpec {
    let x_name = table.columns()[x].clone();
    let y_name = table.columns()[y].clone();
    ChartSpec {
        kind,
        title: format!("{} of {} vs {}", kind, y_name, x_name),
        x_label: Some(x_name),
        y_label: Some(y_name),
        data,
    }
}

/// Ordinal (1-12) of a month name or its three-letter abbreviation.
pub fn month_ordinal(label: &str) -> Option<u32> {
    let needle = label.trim().to_lowercase();
    if needle.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|m| {
            let m = m.to_lowercase();
            m == needle || (needle.len() == 3 && m.starts_with(&needle)) || (needle == "sept" && m == "september")
        })
        .map(|i| i as u32 + 1)
}

/// When a categorical column holds only month labels, return a copy of the
/// table with that column replaced by month ordinals, plus tick labels.
fn coerce_month_axis(table: &Table, x: usize) -> (Option<Table>, Option<Vec<String>>) {
    if classify_values(table.column(x)) != ColumnKind::Categorical {
        return (None, None);
    }

    let mut ordinals = Vec::with_capacity(table.len());
    for value in table.column(x) {
        match value {
            Value::Missing => ordinals.push(Value::Missing),
            other => match month_ordinal(&other.label()) {
                Some(n) => ordinals.push(Value::Number(n as f64)),
                None => return (None, None),
            },
        }
    }

    debug!("Coercing month labels in '{}' to ordinals", table.columns()[x]);
    let ticks = MONTHS.iter().map(|m| m[..3].to_string()).collect();
    (Some(table.with_column_values(x, ordinals)), Some(ticks))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper to create a test table
    fn make_table(headers: Vec<&str>, rows: Vec<Vec<&str>>) -> Table {
        Table::from_text_rows(headers, rows).unwrap()
    }

    fn sales_table() -> Table {
        make_table(
            vec!["Month", "Region", "Sales", "Expenses"],
            vec![
                vec!["Jan", "North", "100", "40"],
                vec!["Jan", "South", "300", "50"],
                vec!["Feb", "North", "200", "60"],
            ],
        )
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("hist".parse::<ChartKind>(), Ok(ChartKind::Histogram));
        assert_eq!("Multi-Series".parse::<ChartKind>(), Ok(ChartKind::MultiSeries));
        assert_eq!(
            "radar".parse::<ChartKind>(),
            Err(ChartError::UnsupportedKind { kind: "radar".to_string() })
        );
    }

    #[test]
    fn test_unknown_column() {
        let request = ChartRequest::new(ChartKind::Line, "Month", "Profit");
        assert_eq!(
            render(&request, &sales_table()),
            Err(ChartError::UnknownColumn { column: "Profit".to_string() })
        );
    }

    #[test]
    fn test_empty_dataset() {
        let table = make_table(vec!["Month", "Sales"], vec![]);
        for kind in ChartKind::ALL {
            let request = ChartRequest::new(kind, "Month", "Sales");
            let result = render(&request, &table);
            if kind == ChartKind::MultiSeries {
                assert!(matches!(result, Err(ChartError::MissingSeriesColumns { .. })));
            } else {
                assert_eq!(result, Err(ChartError::EmptyDataset), "kind {}", kind);
            }
        }
    }

    #[test]
    fn test_line_keeps_row_order() {
        let spec = render(&ChartRequest::new(ChartKind::Line, "Month", "Sales"), &sales_table()).unwrap();
        let ChartData::Line { points } = spec.data else { panic!("expected line data") };
        let ys: Vec<f64> = points.iter().map(|(_, y)| *y).collect();
        assert_eq!(ys, vec![100.0, 300.0, 200.0]);
        assert_eq!(points[0].0, AxisValue::Category("Jan".to_string()));
        assert_eq!(spec.title, "Line of Sales vs Month");
    }

    #[test]
    fn test_bar_groups_by_x() {
        let spec = render(&ChartRequest::new(ChartKind::Bar, "Region", "Sales"), &sales_table()).unwrap();
        let ChartData::Bar { bars } = spec.data else { panic!("expected bar data") };
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].label, "North");
        assert_eq!(bars[0].sum, 300.0);
        assert_eq!(bars[0].value, 150.0);
        assert_eq!(bars[0].count, 2);
        assert_eq!(bars[1].label, "South");
        assert_eq!(bars[1].sum, 300.0);
    }

    #[test]
    fn test_bar_sum_aggregate() {
        let request = ChartRequest::new(ChartKind::Bar, "Region", "Sales").with_aggregate(Aggregate::Sum);
        let spec = render(&request, &sales_table()).unwrap();
        let ChartData::Bar { bars } = spec.data else { panic!("expected bar data") };
        assert_eq!(bars[0].value, 300.0);
    }

    #[test]
    fn test_bar_non_numeric_y() {
        let request = ChartRequest::new(ChartKind::Bar, "Region", "Month");
        assert_eq!(
            render(&request, &sales_table()),
            Err(ChartError::NonNumericAxis { kind: ChartKind::Bar, column: "Month".to_string() })
        );
    }

    #[test]
    fn test_pie_sums_and_fractions() {
        let spec = render(&ChartRequest::new(ChartKind::Pie, "Month", "Sales"), &sales_table()).unwrap();
        assert_eq!(spec.x_label, None);
        assert_eq!(spec.y_label, None);
        let ChartData::Pie { slices } = spec.data else { panic!("expected pie data") };
        assert_eq!(slices.len(), 2);
        let jan = slices.iter().find(|s| s.label == "Jan").unwrap();
        assert_eq!(jan.value, 400.0);
        assert!((jan.fraction - 400.0 / 600.0).abs() < 1e-12);
        let total: f64 = slices.iter().map(|s| s.fraction).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_scatter_groups_by_region() {
        let spec = render(&ChartRequest::new(ChartKind::Scatter, "Sales", "Expenses"), &sales_table()).unwrap();
        let ChartData::Scatter { group_by, groups } = spec.data else { panic!("expected scatter data") };
        assert_eq!(group_by.as_deref(), Some("Region"));
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, "North");
        assert_eq!(groups[0].points[0], (AxisValue::Number(100.0), 40.0));
    }

    #[test]
    fn test_scatter_without_region() {
        let table = make_table(vec!["A", "B"], vec![vec!["1", "2"], vec!["3", "4"]]);
        let spec = render(&ChartRequest::new(ChartKind::Scatter, "A", "B"), &table).unwrap();
        let ChartData::Scatter { group_by, groups } = spec.data else { panic!("expected scatter data") };
        assert_eq!(group_by, None);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].points.len(), 2);
    }

    #[test]
    fn test_histogram_has_twenty_bins() {
        let rows: Vec<Vec<String>> = (0..50).map(|i| vec![format!("{}", i * 3)]).collect();
        let table = Table::from_text_rows(vec!["Sales".to_string()], rows).unwrap();
        let spec = render(&ChartRequest::new(ChartKind::Histogram, "Sales", "Sales"), &table).unwrap();
        let ChartData::Histogram { bins, density } = spec.data else { panic!("expected histogram data") };
        assert_eq!(bins.len(), HISTOGRAM_BINS);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 50);
        assert_eq!(density.len(), DENSITY_POINTS);
    }

    #[test]
    fn test_histogram_ignores_x() {
        let request = ChartRequest::new(ChartKind::Histogram, "Nope", "Sales");
        assert!(render(&request, &sales_table()).is_ok());
    }

    #[test]
    fn test_histogram_requires_numeric_y() {
        let request = ChartRequest::new(ChartKind::Histogram, "Region", "Region");
        assert!(matches!(
            render(&request, &sales_table()),
            Err(ChartError::NonNumericAxis { .. })
        ));
    }

    #[test]
    fn test_box_summaries_per_group() {
        let spec = render(&ChartRequest::new(ChartKind::Box, "Region", "Sales"), &sales_table()).unwrap();
        let ChartData::Box { boxes } = spec.data else { panic!("expected box data") };
        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes[0].label, "North");
        assert_eq!(boxes[0].summary.min, 100.0);
        assert_eq!(boxes[0].summary.median, 150.0);
        assert_eq!(boxes[0].summary.max, 200.0);
    }

    #[test]
    fn test_heatmap_uses_numeric_columns() {
        let spec = render(&ChartRequest::new(ChartKind::Heatmap, "", ""), &sales_table()).unwrap();
        let ChartData::Heatmap { columns, matrix, annotations } = spec.data else { panic!("expected heatmap") };
        assert_eq!(columns, vec!["Sales".to_string(), "Expenses".to_string()]);
        assert!((matrix[0][0] - 1.0).abs() < 1e-12);
        assert_eq!(matrix[0][1], matrix[1][0]);
        assert_eq!(annotations[0][0], "1.00");
    }

    #[test]
    fn test_heatmap_needs_two_numeric_columns() {
        let table = make_table(vec!["Region", "Sales"], vec![vec!["North", "1"]]);
        assert_eq!(
            render(&ChartRequest::new(ChartKind::Heatmap, "", ""), &table),
            Err(ChartError::NotEnoughNumericColumns { found: 1 })
        );
    }

    #[test]
    fn test_trendline_rejects_non_month_categories() {
        let request = ChartRequest::new(ChartKind::Trendline, "Region", "Sales");
        assert_eq!(
            render(&request, &sales_table()),
            Err(ChartError::NonNumericAxis { kind: ChartKind::Trendline, column: "Region".to_string() })
        );
    }

    #[test]
    fn test_trendline_coerces_month_names() {
        let table = sales_table();
        let spec = render(&ChartRequest::new(ChartKind::Trendline, "Month", "Sales"), &table).unwrap();
        let ChartData::Trendline { points, fit, x_ticks } = spec.data else { panic!("expected trendline") };
        assert_eq!(points, vec![(1.0, 100.0), (1.0, 300.0), (2.0, 200.0)]);
        assert!(fit.is_some());
        assert_eq!(x_ticks.unwrap()[0], "Jan");
        // caller's table keeps its labels
        assert_eq!(table.rows()[0][0], Value::Text("Jan".to_string()));
    }

    #[test]
    fn test_trendline_numeric_x() {
        let table = make_table(vec!["T", "V"], vec![vec!["1", "3"], vec!["2", "5"], vec!["3", "7"]]);
        let spec = render(&ChartRequest::new(ChartKind::Trendline, "T", "V"), &table).unwrap();
        let ChartData::Trendline { fit, x_ticks, .. } = spec.data else { panic!("expected trendline") };
        let fit = fit.unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-9);
        assert!(x_ticks.is_none());
    }

    #[test]
    fn test_multi_series_requires_expenses() {
        let table = make_table(vec!["Month", "Sales"], vec![vec!["Jan", "1"]]);
        assert_eq!(
            render(&ChartRequest::new(ChartKind::MultiSeries, "Month", "Sales"), &table),
            Err(ChartError::MissingSeriesColumns { missing: vec!["Expenses".to_string()] })
        );
    }

    #[test]
    fn test_multi_series_pivots_sums() {
        let spec = render(&ChartRequest::new(ChartKind::MultiSeries, "Month", "Sales"), &sales_table()).unwrap();
        let ChartData::MultiSeries { categories, series } = spec.data else { panic!("expected multi-series") };
        assert_eq!(categories, vec!["Jan".to_string(), "Feb".to_string()]);
        assert_eq!(series[0].name, "Sales");
        assert_eq!(series[0].values, vec![400.0, 200.0]);
        assert_eq!(series[1].values, vec![90.0, 60.0]);
    }

    #[test]
    fn test_multi_series_requires_categorical_x() {
        let request = ChartRequest::new(ChartKind::MultiSeries, "Sales", "Sales");
        assert_eq!(
            render(&request, &sales_table()),
            Err(ChartError::CategoricalAxisRequired { column: "Sales".to_string() })
        );
    }

    #[test]
    fn test_month_ordinal() {
        assert_eq!(month_ordinal("Jan"), Some(1));
        assert_eq!(month_ordinal("december"), Some(12));
        assert_eq!(month_ordinal("Sept"), Some(9));
        assert_eq!(month_ordinal("Ja"), None);
        assert_eq!(month_ordinal("Janus"), None);
    }
}
