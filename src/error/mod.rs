//! Error handling module.
//!
//! This module provides the crate-wide error type and the more specific error
//! kinds it wraps:
//! - Script parse errors produced by the playground parser
//! - Configuration loading and validation errors
//! - I/O and output serialization errors surfaced by the command-line host
//!
//! The analysis entry points never return these errors to their callers: a
//! failed parse is reported as [`crate::visitor::Analysis::ParseFailed`] and
//! degrades to an empty context.
//!
//! # Example
//!
//! ```rust,no_run
//! use mongodb_lang::error::{LangError, ParseError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(ParseError::UnexpectedEof.into())
//! }
//!
//! if let Err(LangError::Parse(err)) = example_operation() {
//!     eprintln!("{err}");
//! }
//! ```

pub mod kinds;

// Re-export commonly used types
pub use kinds::{ConfigError, LangError, ParseError, Result};
