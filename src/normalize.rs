use log::warn;

use crate::data::Table;

/// Canonical form of a column name: trimmed, single-spaced, title-cased.
///
/// Title-casing upper-cases a letter that follows a non-letter and
/// lower-cases the rest, so `"total_SALES"` becomes `"Total_Sales"`.
/// Names that are empty after trimming are returned unchanged.
pub fn normalize_name(raw: &str) -> String {
    let tokens: Vec<String> = raw.split_whitespace().map(title_case).collect();
    if tokens.is_empty() {
        return raw.to_string();
    }
    tokens.join(" ")
}

fn title_case(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    let mut prev_alpha = false;
    for c in token.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// A normalized table plus the names that absorbed an alias.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub table: Table,
    /// Canonical names that more than one raw header mapped to.
    pub aliases: Vec<String>,
}

/// Rename every column to its canonical form. Row values are untouched.
///
/// When several raw headers normalize to the same name the last one wins:
/// the column keeps the position of its first occurrence but takes the
/// cells of the last.
pub fn normalize_table(table: Table) -> Normalized {
    let canonical: Vec<String> = table.columns().iter().map(|c| normalize_name(c)).collect();

    let mut order: Vec<String> = Vec::with_capacity(canonical.len());
    let mut source: Vec<usize> = Vec::with_capacity(canonical.len());
    let mut aliases: Vec<String> = Vec::new();

    for (idx, name) in canonical.iter().enumerate() {
        match order.iter().position(|existing| existing == name) {
            Some(slot) => {
                source[slot] = idx;
                if !aliases.contains(name) {
                    aliases.push(name.clone());
                }
            }
            None => {
                order.push(name.clone());
                source.push(idx);
            }
        }
    }

    if aliases.is_empty() {
        return Normalized {
            table: table.with_columns(canonical),
            aliases,
        };
    }

    for name in &aliases {
        warn!("Columns normalizing to '{}' collide; keeping the last one", name);
    }

    let rows = table
        .rows()
        .iter()
        .map(|row| source.iter().map(|&i| row[i].clone()).collect())
        .collect();
    Normalized {
        table: Table::from_parts(order, rows),
        aliases,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Value;

    #[test]
    fn test_normalize_trims_and_title_cases() {
        assert_eq!(normalize_name("  sales "), "Sales");
        assert_eq!(normalize_name("order   date"), "Order Date");
        assert_eq!(normalize_name("REGION"), "Region");
        assert_eq!(normalize_name("total_SALES"), "Total_Sales");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in ["  sales ", "order   date", "x1y", "ÉTÉ temp", "", "   ", "a-b c_d", "3rd place"] {
            let once = normalize_name(raw);
            assert_eq!(normalize_name(&once), once, "not idempotent for {:?}", raw);
        }
    }

    #[test]
    fn test_empty_names_pass_through() {
        assert_eq!(normalize_name(""), "");
        assert_eq!(normalize_name("   "), "   ");
    }

    #[test]
    fn test_normalize_table_renames_columns_only() {
        let table = Table::from_text_rows(vec![" month", "sales "], vec![vec!["jan", "10"]]).unwrap();
        let normalized = normalize_table(table);
        assert_eq!(normalized.table.columns(), &["Month".to_string(), "Sales".to_string()]);
        assert_eq!(normalized.table.rows()[0][0], Value::Text("jan".to_string()));
        assert!(normalized.aliases.is_empty());
    }

    #[test]
    fn test_aliases_last_one_wins() {
        let table = Table::from_text_rows(
            vec!["sales", "Region", "SALES "],
            vec![vec!["1", "North", "2"]],
        )
        .unwrap();
        let normalized = normalize_table(table);
        assert_eq!(normalized.table.columns(), &["Sales".to_string(), "Region".to_string()]);
        assert_eq!(normalized.table.rows()[0][0], Value::Number(2.0));
        assert_eq!(normalized.aliases, vec!["Sales".to_string()]);
    }
}
