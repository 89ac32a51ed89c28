use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use log::debug;

use crate::data::{Table, Value};

/// Accepted values per column. A column that is absent, or present with an
/// empty set, imposes no constraint. Values compare case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    accepted: BTreeMap<String, BTreeSet<String>>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add accepted values for a column, merging with any already present.
    pub fn with<I, S>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.insert(column, values);
        self
    }

    pub fn insert<I, S>(&mut self, column: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set = self.accepted.entry(column.to_string()).or_default();
        set.extend(values.into_iter().map(|v| fold(v.as_ref())));
    }

    /// Merge another spec into this one.
    pub fn merge(mut self, other: FilterSpec) -> Self {
        for (column, values) in other.accepted {
            self.accepted.entry(column).or_default().extend(values);
        }
        self
    }

    /// True when no column carries a constraint.
    pub fn is_empty(&self) -> bool {
        self.accepted.values().all(|set| set.is_empty())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.accepted
            .iter()
            .filter(|(_, set)| !set.is_empty())
            .map(|(col, _)| col.as_str())
    }
}

impl fmt::Display for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .accepted
            .iter()
            .filter(|(_, set)| !set.is_empty())
            .map(|(col, set)| format!("{}={}", col, set.iter().cloned().collect::<Vec<_>>().join(",")))
            .collect();
        write!(f, "{{{}}}", parts.join("; "))
    }
}

fn fold(value: &str) -> String {
    value.trim().to_lowercase()
}

/// One column's accepted values, with the ones that spell numbers kept
/// aside so `100.0` matches a cell holding `100`.
struct Accepted<'a> {
    labels: &'a BTreeSet<String>,
    numbers: Vec<f64>,
}

impl<'a> Accepted<'a> {
    fn new(labels: &'a BTreeSet<String>) -> Self {
        let numbers = labels
            .iter()
            .filter_map(|v| v.parse::<f64>().ok())
            .filter(|n| n.is_finite())
            .collect();
        Self { labels, numbers }
    }

    fn matches(&self, cell: &Value) -> bool {
        if self.labels.contains(&fold(&cell.label())) {
            return true;
        }
        match cell {
            Value::Number(n) => self.numbers.iter().any(|m| m == n),
            _ => false,
        }
    }
}

/// Keep the rows whose value in every constrained column is accepted.
///
/// Constraints on columns the table does not have are skipped. The result
/// may be empty; deciding on a fallback is up to the caller.
pub fn apply(table: &Table, spec: &FilterSpec) -> Table {
    let mut active: Vec<(usize, Accepted)> = Vec::new();
    for (column, set) in &spec.accepted {
        if set.is_empty() {
            continue;
        }
        match table.column_index(column) {
            Some(idx) => active.push((idx, Accepted::new(set))),
            None => debug!("Filter column '{}' not in table; ignored", column),
        }
    }

    if active.is_empty() {
        return table.clone();
    }

    let rows: Vec<_> = table
        .rows()
        .iter()
        .filter(|row| {
            active
                .iter()
                .all(|(idx, accepted)| accepted.matches(&row[*idx]))
        })
        .cloned()
        .collect();

    debug!("Filter {} kept {} of {} rows", spec, rows.len(), table.len());
    table.with_rows(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baseline() -> Table {
        Table::from_text_rows(
            vec!["Month", "Region", "Sales"],
            vec![
                vec!["Jan", "North", "100"],
                vec!["Jan", "South", "300"],
                vec!["Feb", "North", "200"],
                vec!["Feb", "South", "150"],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_filter_membership_is_case_insensitive() {
        let spec = FilterSpec::new().with("Region", ["north"]);
        let filtered = apply(&baseline(), &spec);
        assert_eq!(filtered.len(), 2);
        assert!(filtered.rows().iter().all(|r| r[1].label() == "North"));
    }

    #[test]
    fn test_empty_set_imposes_no_constraint() {
        let spec = FilterSpec::new().with("Region", Vec::<String>::new());
        assert!(spec.is_empty());
        assert_eq!(apply(&baseline(), &spec).len(), 4);
    }

    #[test]
    fn test_multiple_values_are_a_set() {
        let spec = FilterSpec::new().with("Month", ["JAN", "feb"]);
        assert_eq!(apply(&baseline(), &spec).len(), 4);
    }

    #[test]
    fn test_numeric_values_match_by_label() {
        let spec = FilterSpec::new().with("Sales", ["300"]);
        assert_eq!(apply(&baseline(), &spec).len(), 1);
    }

    #[test]
    fn test_numeric_values_match_by_number() {
        let spec = FilterSpec::new().with("Sales", ["100.0", "2e2"]);
        let filtered = apply(&baseline(), &spec);
        assert_eq!(filtered.len(), 2);

        let spec = FilterSpec::new().with("Month", ["1"]);
        assert!(apply(&baseline(), &spec).is_empty());
    }

    #[test]
    fn test_filter_is_order_independent() {
        let base = baseline();
        let region = FilterSpec::new().with("Region", ["North"]);
        let month = FilterSpec::new().with("Month", ["Jan"]);

        let one_pass = apply(&base, &region.clone().merge(month.clone()));
        let region_then_month = apply(&apply(&base, &region), &month);
        let month_then_region = apply(&apply(&base, &month), &region);

        assert_eq!(one_pass, region_then_month);
        assert_eq!(one_pass, month_then_region);
        assert_eq!(one_pass.len(), 1);
    }

    #[test]
    fn test_filter_can_yield_empty_table() {
        let spec = FilterSpec::new().with("Region", ["West"]);
        let filtered = apply(&baseline(), &spec);
        assert!(filtered.is_empty());
        assert_eq!(filtered.columns().len(), 3);
    }

    #[test]
    fn test_unknown_filter_column_is_ignored() {
        let spec = FilterSpec::new().with("Country", ["Peru"]);
        assert_eq!(apply(&baseline(), &spec).len(), 4);
    }

    #[test]
    fn test_display() {
        let spec = FilterSpec::new().with("Region", ["North"]).with("Month", ["Jan"]);
        assert_eq!(spec.to_string(), "{Month=jan; Region=north}");
    }
}
