use std::collections::BTreeMap;

use chrono::{DateTime, Local};
use log::debug;

use crate::classify::{classify_values, ColumnKind};
use crate::data::{Table, Value, EXPENSES_COLUMN, MONTH_COLUMN, REGION_COLUMN, SALES_COLUMN};

pub const PEAK_SALES_MONTH: &str = "PeakSalesMonth";
pub const TOP_SALES_REGION: &str = "TopSalesRegion";
pub const TOP_EXPENSE_REGION: &str = "TopExpenseRegion";

/// Each insight: (name, group column, metric column, report caption).
const INSIGHTS: [(&str, &str, &str, &str); 3] = [
    (PEAK_SALES_MONTH, MONTH_COLUMN, SALES_COLUMN, "Peak Sales Month"),
    (TOP_SALES_REGION, REGION_COLUMN, SALES_COLUMN, "Top Sales Region"),
    (TOP_EXPENSE_REGION, REGION_COLUMN, EXPENSES_COLUMN, "Highest Expenses Region"),
];

/// Summary values derived from one table snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsightReport {
    values: BTreeMap<String, Value>,
}

impl InsightReport {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// One line per insight, in a fixed order, using readable captions.
    pub fn lines(&self) -> Vec<String> {
        INSIGHTS
            .iter()
            .filter_map(|(name, _, _, caption)| {
                self.values.get(*name).map(|v| format!("{}: {}", caption, v))
            })
            .collect()
    }

    /// Plain-text body handed to the export adapter for report generation.
    pub fn to_report_text(&self, generated: DateTime<Local>) -> String {
        let body = if self.is_empty() {
            "No insights available for this dataset.".to_string()
        } else {
            self.lines().join("\n")
        };
        format!(
            "Data Insights Report\n\n{}\n\nGenerated on: {}\n",
            body,
            generated.format("%Y-%m-%d %H:%M:%S")
        )
    }
}

/// Compute every insight whose columns are present. Missing preconditions
/// omit the insight rather than failing.
pub fn summarize(table: &Table) -> InsightReport {
    let mut values = BTreeMap::new();
    for (name, group_col, metric_col, _) in INSIGHTS {
        match top_group(table, group_col, metric_col) {
            Some(label) => {
                values.insert(name.to_string(), label);
            }
            None => debug!("Insight {} skipped", name),
        }
    }
    InsightReport { values }
}

/// The group with the largest summed metric. Ties go to the lexicographically
/// smallest label so repeated runs agree regardless of row order.
fn top_group(table: &Table, group_col: &str, metric_col: &str) -> Option<Value> {
    let g = table.column_index(group_col)?;
    let m = table.column_index(metric_col)?;
    if classify_values(table.column(m)) != ColumnKind::Numeric {
        return None;
    }

    let mut sums: BTreeMap<String, (f64, &Value)> = BTreeMap::new();
    for row in table.rows() {
        let (Some(metric), group) = (row[m].as_f64(), &row[g]) else { continue };
        if group.is_missing() {
            continue;
        }
        sums.entry(group.label()).or_insert((0.0, group)).0 += metric;
    }

    let mut best: Option<(f64, &Value)> = None;
    for (sum, group) in sums.values() {
        if best.map_or(true, |(top, _)| *sum > top) {
            best = Some((*sum, group));
        }
    }
    best.map(|(_, group)| group.clone())
}
