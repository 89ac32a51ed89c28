// Syntax tree for chart requests

/// A parsed request before it is checked against the known chart kinds.
/// Format: `kind(key: value, ...)`; the argument list may be omitted.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestAst {
    pub kind: String,
    pub args: Vec<Arg>,
}

/// One `key: value` argument. Values are column names or option words.
#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    pub key: String,
    pub value: String,
}
