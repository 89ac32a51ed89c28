// Filter expression parser
// Format: Region=North,South or "Order Month"="Jan","Feb"

use super::lexer::{column_name, string_literal, ws};
use crate::filter::FilterSpec;
use anyhow::{anyhow, bail, Result};
use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::char,
    combinator::map,
    multi::separated_list1,
    IResult,
};

/// An unquoted value runs up to the next comma.
fn bare_value(input: &str) -> IResult<&str, String> {
    map(take_while1(|c| c != ','), |s: &str| s.trim().to_string())(input)
}

fn filter_value(input: &str) -> IResult<&str, String> {
    alt((ws(string_literal), bare_value))(input)
}

/// Parse the syntax of one filter expression into a column and its values
pub fn parse_filter_expr(input: &str) -> IResult<&str, (String, Vec<String>)> {
    let (input, column) = ws(column_name)(input)?;
    let (input, _) = ws(char('='))(input)?;
    let (input, values) = separated_list1(ws(char(',')), filter_value)(input)?;
    Ok((input, (column, values)))
}

/// Parse `COLUMN=V1,V2,...` into a column name and accepted values.
pub fn parse_filter(input: &str) -> Result<(String, Vec<String>)> {
    let (rest, (column, values)) = parse_filter_expr(input)
        .map_err(|e| anyhow!("Invalid filter '{}': {:?}", input.trim(), e))?;
    if !rest.trim().is_empty() {
        bail!("Unexpected input after filter: '{}'", rest.trim());
    }
    let values: Vec<String> = values.into_iter().filter(|v| !v.is_empty()).collect();
    if values.is_empty() {
        bail!("Filter on '{}' lists no values", column);
    }
    Ok((column, values))
}

/// Combine several filter expressions into one spec. Repeated columns
/// accumulate their values.
pub fn parse_filters<S: AsRef<str>>(exprs: &[S]) -> Result<FilterSpec> {
    let mut spec = FilterSpec::new();
    for expr in exprs {
        let (column, values) = parse_filter(expr.as_ref())?;
        spec.insert(&column, values);
    }
    Ok(spec)
}
