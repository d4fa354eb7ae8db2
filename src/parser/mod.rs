//! Script parser for MongoDB playgrounds
//!
//! This module turns playground source text into a syntax tree that the
//! context visitors walk.
//!
//! # Architecture
//!
//! The parser is split into multiple focused modules:
//! - `lexer`: Error-tolerant tokenizer; any malformed literal becomes an
//!   `Invalid` token that the parser rejects
//! - `ast`: Statement and expression node definitions with char spans
//! - `script`: Recursive-descent parser with automatic semicolon insertion
//! - `position`: Editor and parser coordinates and the line index between them
//!
//! Parsing is all-or-nothing: an input with a syntax error produces a
//! [`ParseError`](crate::error::ParseError) and no tree.
//!
//! # Examples
//!
//! ```
//! use mongodb_lang::parser::{parse_script, ast::Stmt};
//!
//! let program = parse_script("use('test');\ndb.users.find({ age: { $gt: 18 } })").unwrap();
//! assert_eq!(program.body.len(), 2);
//! assert!(matches!(program.body[1], Stmt::Expr(_)));
//!
//! assert!(parse_script("db.users.find({").is_err());
//! ```

pub mod ast;
pub mod lexer;
pub mod position;
mod script;

pub use position::{LineColumn, LineIndex, Position, Selection, SourceLocation, SourceRange, Span};
pub use script::ScriptParser;

use crate::error::Result;
use ast::Program;

/// Parse a playground script as a module-level program
///
/// # Arguments
/// * `text` - Script source, possibly containing the trigger marker
///
/// # Returns
/// * `Result<Program>` - The complete syntax tree, or the first syntax error
pub fn parse_script(text: &str) -> Result<Program> {
    ScriptParser::parse(text)
}
