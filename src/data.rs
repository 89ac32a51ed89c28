use anyhow::{anyhow, bail, Result};
use serde_json::Value as JsonValue;
use std::fmt;

use crate::normalize::normalize_name;

/// Column names the insight and multi-series logic look for, in canonical form.
pub const MONTH_COLUMN: &str = "Month";
pub const REGION_COLUMN: &str = "Region";
pub const SALES_COLUMN: &str = "Sales";
pub const EXPENSES_COLUMN: &str = "Expenses";

/// Cell texts treated as missing on load, in addition to the empty string.
const MISSING_MARKERS: &[&str] = &[
    "NA", "N/A", "n/a", "NaN", "nan", "-nan", "null", "NULL", "None", "<NA>", "#N/A", "#NA",
];

/// A single cell of a [`Table`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Missing,
}

impl Value {
    /// Interpret a raw text cell: missing markers, then numbers, then text.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || MISSING_MARKERS.contains(&trimmed) {
            return Value::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => Value::Number(n),
            _ => Value::Text(trimmed.to_string()),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Numeric view of the cell. Text that spells a finite number counts.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            Value::Missing => None,
        }
    }

    /// Label used for grouping, filtering and axis ticks.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Missing => Ok(()),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

/// Row-major table with a stable column order.
///
/// Every row holds exactly one value per column; the constructors reject
/// anything else so later stages can index rows by column position.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        for (idx, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                bail!(
                    "Row {} has {} values but the table has {} columns",
                    idx + 1,
                    row.len(),
                    columns.len()
                );
            }
        }
        Ok(Self { columns, rows })
    }

    /// Build a table from raw text cells, parsing each with [`Value::parse`].
    /// Short rows are padded with missing values.
    pub fn from_text_rows<S: AsRef<str>>(headers: Vec<S>, rows: Vec<Vec<S>>) -> Result<Self> {
        let columns: Vec<String> = headers.iter().map(|h| h.as_ref().to_string()).collect();
        let width = columns.len();
        let mut parsed = Vec::with_capacity(rows.len());
        for (idx, row) in rows.into_iter().enumerate() {
            if row.len() > width {
                bail!(
                    "Row {} has {} values but the table has {} columns",
                    idx + 1,
                    row.len(),
                    width
                );
            }
            let mut values: Vec<Value> = row.iter().map(|cell| Value::parse(cell.as_ref())).collect();
            values.resize(width, Value::Missing);
            parsed.push(values);
        }
        Ok(Self { columns, rows: parsed })
    }

    /// Create a Table from a JSON array of objects.
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        let array = value
            .as_array()
            .ok_or_else(|| anyhow!("Input data must be a JSON array of objects"))?;

        let Some(first) = array.first() else {
            return Ok(Self::default());
        };

        // Extract headers from the first object
        let first_obj = first
            .as_object()
            .ok_or_else(|| anyhow!("Items in array must be objects"))?;
        let columns: Vec<String> = first_obj.keys().cloned().collect();

        let mut rows = Vec::with_capacity(array.len());
        for item in array {
            let obj = item
                .as_object()
                .ok_or_else(|| anyhow!("Items in array must be objects"))?;

            let mut row = Vec::with_capacity(columns.len());
            for header in &columns {
                let value = match obj.get(header) {
                    Some(JsonValue::String(s)) => Value::parse(s),
                    Some(JsonValue::Number(n)) => n.as_f64().map(Value::Number).unwrap_or(Value::Missing),
                    Some(JsonValue::Bool(b)) => Value::Text(b.to_string()),
                    Some(JsonValue::Null) | None => Value::Missing,
                    _ => bail!("Unsupported value type for field '{}'", header),
                };
                row.push(value);
            }
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column. Requested names go through the same
    /// normalization as the headers, then fall back to a case-insensitive match.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        if let Some(idx) = self.columns.iter().position(|c| c == name) {
            return Some(idx);
        }
        let wanted = normalize_name(name);
        self.columns
            .iter()
            .position(|c| *c == wanted)
            .or_else(|| self.columns.iter().position(|c| c.eq_ignore_ascii_case(&wanted)))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Iterate over one column's cells in row order.
    pub fn column(&self, idx: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().map(move |row| &row[idx])
    }

    /// Assemble a table whose rows are already known to match `columns`.
    pub(crate) fn from_parts(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        Self { columns, rows }
    }

    /// Same columns, different rows.
    pub(crate) fn with_rows(&self, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Same rows, renamed columns. The caller keeps the count equal.
    pub(crate) fn with_columns(self, columns: Vec<String>) -> Self {
        debug_assert_eq!(columns.len(), self.columns.len());
        Self {
            columns,
            rows: self.rows,
        }
    }

    /// Copy of the table with one column's cells replaced.
    pub(crate) fn with_column_values(&self, idx: usize, values: Vec<Value>) -> Self {
        let rows = self
            .rows
            .iter()
            .zip(values)
            .map(|(row, value)| {
                let mut row = row.clone();
                row[idx] = value;
                row
            })
            .collect();
        self.with_rows(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_parse() {
        assert_eq!(Value::parse("12.5"), Value::Number(12.5));
        assert_eq!(Value::parse(" 7 "), Value::Number(7.0));
        assert_eq!(Value::parse("North"), Value::Text("North".to_string()));
        assert_eq!(Value::parse("  North "), Value::Text("North".to_string()));
        assert_eq!(Value::parse(""), Value::Missing);
        assert_eq!(Value::parse("NaN"), Value::Missing);
        assert_eq!(Value::parse("N/A"), Value::Missing);
    }

    #[test]
    fn test_value_label_drops_integer_fraction() {
        assert_eq!(Value::Number(300.0).label(), "300");
        assert_eq!(Value::Number(2.5).label(), "2.5");
        assert_eq!(Value::Text("Jan".into()).label(), "Jan");
    }

    #[test]
    fn test_from_text_rows_pads_short_rows() {
        let table = Table::from_text_rows(vec!["a", "b"], vec![vec!["1"]]).unwrap();
        assert_eq!(table.rows()[0], vec![Value::Number(1.0), Value::Missing]);
    }

    #[test]
    fn test_new_rejects_ragged_rows() {
        let result = Table::new(vec!["a".into()], vec![vec![Value::Missing, Value::Missing]]);
        assert!(result.is_err());
    }

    #[test]
    fn test_column_index_normalizes_request() {
        let table = Table::from_text_rows(vec!["Region", "Sales"], vec![vec!["North", "1"]]).unwrap();
        assert_eq!(table.column_index("region"), Some(0));
        assert_eq!(table.column_index("  sales "), Some(1));
        assert_eq!(table.column_index("Profit"), None);
    }

    #[test]
    fn test_from_json() {
        let data = json!([
            {"Region": "North", "Sales": 100},
            {"Region": "South", "Sales": null}
        ]);
        let table = Table::from_json(&data).unwrap();
        assert_eq!(table.len(), 2);
        let sales = table.column_index("Sales").unwrap();
        assert_eq!(table.rows()[0][sales], Value::Number(100.0));
        assert!(table.rows()[1][sales].is_missing());
    }

    #[test]
    fn test_from_json_not_array() {
        assert!(Table::from_json(&json!({"a": 1})).is_err());
    }
}
