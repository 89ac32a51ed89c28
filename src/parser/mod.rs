// Request language parser: chart requests and filter expressions

pub mod ast;
pub mod filter;
pub mod lexer;
pub mod request;

// Public API re-exports
pub use ast::{Arg, RequestAst};
pub use filter::{parse_filter, parse_filters};
pub use request::parse_request;
