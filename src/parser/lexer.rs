// Lexical helpers shared by the request and filter parsers

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{alpha1, alphanumeric1, char, multispace0},
    combinator::{map, recognize},
    multi::many0_count,
    sequence::{delimited, pair},
    IResult,
};

/// Wrap a parser so it skips surrounding whitespace
pub fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// Parse an identifier: a letter or underscore, then letters, digits or underscores
pub fn identifier(input: &str) -> IResult<&str, String> {
    map(
        recognize(pair(
            alt((alpha1, tag("_"))),
            many0_count(alt((alphanumeric1, tag("_")))),
        )),
        |s: &str| s.to_string(),
    )(input)
}

/// Parse a single- or double-quoted string (no escapes)
pub fn string_literal(input: &str) -> IResult<&str, String> {
    map(
        alt((
            delimited(char('"'), take_while(|c| c != '"'), char('"')),
            delimited(char('\''), take_while(|c| c != '\''), char('\'')),
        )),
        |s: &str| s.to_string(),
    )(input)
}

/// A column reference: quoted when it contains spaces or punctuation
pub fn column_name(input: &str) -> IResult<&str, String> {
    alt((string_literal, identifier))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier() {
        assert_eq!(identifier("Sales rest"), Ok((" rest", "Sales".to_string())));
        assert_eq!(identifier("_col2)"), Ok((")", "_col2".to_string())));
        assert!(identifier("2col").is_err());
    }

    #[test]
    fn test_string_literal() {
        assert_eq!(string_literal("\"Order Month\","), Ok((",", "Order Month".to_string())));
        assert_eq!(string_literal("'Net Sales'"), Ok(("", "Net Sales".to_string())));
        assert!(string_literal("\"unterminated").is_err());
    }

    #[test]
    fn test_ws_skips_whitespace() {
        let mut parser = ws(identifier);
        assert_eq!(parser("  Region  ,"), Ok((",", "Region".to_string())));
    }
}
