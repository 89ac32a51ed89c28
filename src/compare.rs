use log::debug;

use crate::data::Table;
use crate::dispatch::{render, ChartRequest};
use crate::error::CompareError;
use crate::ir::{Comparison, Layout};

/// Render two requests against the same table and place them side by side.
///
/// Both sides are always evaluated so a failure report can name every side
/// that failed. The pair succeeds or fails as a unit.
pub fn compare(
    left: &ChartRequest,
    right: &ChartRequest,
    table: &Table,
) -> Result<Comparison, CompareError> {
    debug!("Comparing {} and {} charts", left.kind, right.kind);
    match (render(left, table), render(right, table)) {
        (Ok(left), Ok(right)) => Ok(Comparison {
            left,
            right,
            layout: Layout::side_by_side(),
        }),
        (Err(err), Ok(_)) => Err(CompareError::Left(err)),
        (Ok(_), Err(err)) => Err(CompareError::Right(err)),
        (Err(left), Err(right)) => Err(CompareError::Both { left, right }),
    }
}

/// Destination stem for a comparison image: `compare_<x1>_<y1>_vs_<x2>_<y2>`.
pub fn comparison_name(left: &ChartRequest, right: &ChartRequest) -> String {
    format!(
        "compare_{}_{}_vs_{}_{}",
        left.x, left.y, right.x, right.y
    )
    .replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::ChartKind;
    use crate::error::ChartError;

    fn make_table() -> Table {
        Table::from_text_rows(
            vec!["Month", "Region", "Sales", "Expenses"],
            vec![
                vec!["Jan", "North", "100", "40"],
                vec!["Jan", "South", "300", "50"],
                vec!["Feb", "North", "200", "60"],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_compare_success() {
        let left = ChartRequest::new(ChartKind::Bar, "Region", "Sales");
        let right = ChartRequest::new(ChartKind::Line, "Month", "Expenses");
        let comparison = compare(&left, &right, &make_table()).unwrap();
        assert_eq!(comparison.left.kind, ChartKind::Bar);
        assert_eq!(comparison.right.kind, ChartKind::Line);
        assert_eq!(comparison.layout, Layout { rows: 1, cols: 2 });
    }

    #[test]
    fn test_compare_is_atomic_when_right_fails() {
        let left = ChartRequest::new(ChartKind::Bar, "Region", "Sales");
        let right = ChartRequest::new(ChartKind::Bar, "Country", "Sales");
        assert!(render(&left, &make_table()).is_ok());

        let err = compare(&left, &right, &make_table()).unwrap_err();
        assert_eq!(
            err,
            CompareError::Right(ChartError::UnknownColumn {
                column: "Country".to_string()
            })
        );
    }

    #[test]
    fn test_compare_reports_left_and_both() {
        let good = ChartRequest::new(ChartKind::Bar, "Region", "Sales");
        let bad = ChartRequest::new(ChartKind::Trendline, "Region", "Sales");

        let err = compare(&bad, &good, &make_table()).unwrap_err();
        assert!(matches!(err, CompareError::Left(ChartError::NonNumericAxis { .. })));

        let err = compare(&bad, &bad, &make_table()).unwrap_err();
        assert!(matches!(err, CompareError::Both { .. }));
    }

    #[test]
    fn test_comparison_name() {
        let left = ChartRequest::new(ChartKind::Bar, "Region", "Sales");
        let right = ChartRequest::new(ChartKind::Line, "Order Month", "Expenses");
        assert_eq!(
            comparison_name(&left, &right),
            "compare_Region_Sales_vs_Order_Month_Expenses"
        );
    }
}
