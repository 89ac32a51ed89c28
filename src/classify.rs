use crate::data::{Table, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

/// Column kinds of one table snapshot, in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub columns: Vec<(String, ColumnKind)>,
}

impl Schema {
    pub fn kind_of(&self, name: &str) -> Option<ColumnKind> {
        self.columns
            .iter()
            .find(|(col, _)| col == name)
            .map(|(_, kind)| *kind)
    }

    pub fn numeric(&self) -> Vec<&str> {
        self.of_kind(ColumnKind::Numeric)
    }

    pub fn categorical(&self) -> Vec<&str> {
        self.of_kind(ColumnKind::Categorical)
    }

    fn of_kind(&self, kind: ColumnKind) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|(_, k)| *k == kind)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Classify every column of the table from its current content.
pub fn classify(table: &Table) -> Schema {
    let columns = table
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.clone(), classify_values(table.column(idx))))
        .collect();
    Schema { columns }
}

/// Numeric when every non-missing value reads as a number and there is at
/// least one such value; categorical otherwise. Zero rows, or only missing
/// cells, give no numeric evidence.
pub fn classify_values<'a, I>(values: I) -> ColumnKind
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut seen = false;
    for value in values {
        if value.is_missing() {
            continue;
        }
        if value.as_f64().is_none() {
            return ColumnKind::Categorical;
        }
        seen = true;
    }
    if seen {
        ColumnKind::Numeric
    } else {
        ColumnKind::Categorical
    }
}
