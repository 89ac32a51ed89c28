use log::{debug, warn};

use crate::data::Table;

/// Result of the missing-value sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct Cleaned {
    pub table: Table,
    /// Columns that held at least one missing cell, in column order.
    pub affected_columns: Vec<String>,
    pub dropped_rows: usize,
}

/// Drop every row that has a missing value in any column.
///
/// Runs once on the full column set before filtering, so the affected
/// column report reflects the source distribution of missing values.
pub fn clean(table: Table) -> Cleaned {
    let affected_columns: Vec<String> = table
        .columns()
        .iter()
        .enumerate()
        .filter(|(idx, _)| table.column(*idx).any(|v| v.is_missing()))
        .map(|(_, name)| name.clone())
        .collect();

    if affected_columns.is_empty() {
        debug!("No missing values in {} rows", table.len());
        return Cleaned {
            table,
            affected_columns,
            dropped_rows: 0,
        };
    }

    let kept: Vec<_> = table
        .rows()
        .iter()
        .filter(|row| !row.iter().any(|v| v.is_missing()))
        .cloned()
        .collect();
    let dropped_rows = table.len() - kept.len();

    warn!(
        "Missing values found in [{}]; dropped {} of {} rows",
        affected_columns.join(", "),
        dropped_rows,
        table.len()
    );

    Cleaned {
        table: table.with_rows(kept),
        affected_columns,
        dropped_rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_drops_rows_with_any_missing_cell() {
        let table = Table::from_text_rows(
            vec!["Month", "Region", "Sales"],
            vec![
                vec!["Jan", "North", "100"],
                vec!["Feb", "", "200"],
                vec!["Mar", "South", "NaN"],
                vec!["Apr", "South", "50"],
            ],
        )
        .unwrap();
        let cleaned = clean(table);
        assert_eq!(cleaned.table.len(), 2);
        assert_eq!(cleaned.dropped_rows, 2);
        assert_eq!(cleaned.affected_columns, vec!["Region".to_string(), "Sales".to_string()]);
        assert_eq!(cleaned.table.columns().len(), 3);
    }

    #[test]
    fn test_clean_table_is_untouched() {
        let table = Table::from_text_rows(vec!["a", "b"], vec![vec!["1", "x"], vec!["2", "y"]]).unwrap();
        let cleaned = clean(table.clone());
        assert_eq!(cleaned.table, table);
        assert!(cleaned.affected_columns.is_empty());
        assert_eq!(cleaned.dropped_rows, 0);
    }

    #[test]
    fn test_clean_count_matches_complete_rows() {
        let table = Table::from_text_rows(
            vec!["a", "b", "c"],
            vec![
                vec!["1", "", "3"],
                vec!["1", "2", "3"],
                vec!["", "", ""],
                vec!["4", "5", "6"],
                vec!["7", "8"],
            ],
        )
        .unwrap();
        let complete = table
            .rows()
            .iter()
            .filter(|r| r.iter().all(|v| !v.is_missing()))
            .count();
        assert_eq!(clean(table).table.len(), complete);
    }
}
