//! Generic XML element tree, parser, and path queries.
//!
//! The tree keeps element order, attributes, and trimmed-away whitespace-only
//! text is dropped. Queries use a small subset of the ElementTree path syntax:
//! `tag`, `a/b`, `.//a`, and `.//a//b`.

pub mod parser;
pub mod query;
pub mod tree;

pub use parser::{parse, parse_file, ParseError};
pub use query::{Pattern, QueryError, Selected};
pub use tree::XmlNode;
