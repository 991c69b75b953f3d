//! CCTM Parser
//!
//! This crate turns classification-tree XML into the canonical model:
//! - XML tokenizing and element-tree construction
//! - Range-string parsing (`0-30`, `-inf-0, >300`, `true`, ...)
//! - Schema detection and one reader per supported document shape
//!   (versioned trees, single tree, legacy data dictionary, draw.io diagram)
//! - Error handling with location information

mod dom;
mod error;
mod lexer;
pub mod range;
pub mod schema;

pub use dom::*;
pub use error::*;
pub use lexer::{Lexer, Span, Token, TokenKind};
pub use range::{parse_range, ParsedRange, RangeContent, RangeMode};
pub use schema::{parse, parse_versions, SchemaKind};
