// Chart request parser
// Format: bar(x: Region, y: Sales, agg: sum) or heatmap

use super::ast::{Arg, RequestAst};
use super::lexer::{column_name, identifier, ws};
use crate::dispatch::{Aggregate, ChartKind, ChartRequest};
use anyhow::{anyhow, bail, Result};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char},
    combinator::{map, opt, recognize},
    multi::{many0_count, separated_list0},
    sequence::{delimited, pair},
    IResult,
};

/// Kind names may contain dashes, e.g. `multi-series`.
fn kind_name(input: &str) -> IResult<&str, String> {
    map(
        recognize(pair(
            alpha1,
            many0_count(alt((alphanumeric1, tag("_"), tag("-")))),
        )),
        |s: &str| s.to_string(),
    )(input)
}

fn argument(input: &str) -> IResult<&str, Arg> {
    let (input, key) = ws(identifier)(input)?;
    let (input, _) = ws(char(':'))(input)?;
    let (input, value) = ws(column_name)(input)?;
    Ok((input, Arg { key, value }))
}

/// Parse the request syntax without interpreting it
pub fn parse_request_ast(input: &str) -> IResult<&str, RequestAst> {
    let (input, kind) = ws(kind_name)(input)?;
    let (input, args) = opt(delimited(
        ws(char('(')),
        separated_list0(ws(char(',')), argument),
        ws(char(')')),
    ))(input)?;

    Ok((
        input,
        RequestAst {
            kind,
            args: args.unwrap_or_default(),
        },
    ))
}

/// Parse and interpret a chart request.
///
/// An unknown chart kind surfaces as [`crate::error::ChartError::UnsupportedKind`]
/// inside the returned error, so callers can downcast it.
pub fn parse_request(input: &str) -> Result<ChartRequest> {
    let (rest, ast) = parse_request_ast(input)
        .map_err(|e| anyhow!("Invalid chart request '{}': {:?}", input.trim(), e))?;
    if !rest.trim().is_empty() {
        bail!("Unexpected input after chart request: '{}'", rest.trim());
    }
    build_request(ast)
}

/// Turn a syntax tree into a request, applying per-kind argument defaults
pub fn build_request(ast: RequestAst) -> Result<ChartRequest> {
    let kind: ChartKind = ast.kind.parse()?;

    let mut x = None;
    let mut y = None;
    let mut aggregate = None;
    let mut group = None;

    for Arg { key, value } in ast.args {
        match key.to_ascii_lowercase().as_str() {
            "x" => x = Some(value),
            "y" => y = Some(value),
            "agg" | "aggregate" => {
                let agg = Aggregate::from_name(&value)
                    .ok_or_else(|| anyhow!("Unknown aggregate '{}' (expected mean or sum)", value))?;
                aggregate = Some(agg);
            }
            "group" | "color" => group = Some(value),
            other => bail!("Unknown argument '{}' for {} chart", other, kind),
        }
    }

    let (x, y) = match (kind, x, y) {
        (ChartKind::Heatmap, x, y) => (x.unwrap_or_default(), y.unwrap_or_default()),
        (ChartKind::Histogram, x, Some(y)) => (x.unwrap_or_else(|| y.clone()), y),
        (ChartKind::Histogram, Some(x), None) => (x.clone(), x),
        (ChartKind::MultiSeries, Some(x), y) => (x, y.unwrap_or_default()),
        (_, Some(x), Some(y)) => (x, y),
        (kind, _, _) => bail!("{} chart needs both x and y columns", kind),
    };

    let mut request = ChartRequest::new(kind, x, y);
    if let Some(aggregate) = aggregate {
        request = request.with_aggregate(aggregate);
    }
    if let Some(group) = group {
        request = request.with_group_by(group);
    }
    Ok(request)
}
