//! MongoDB Playground Language Library
//!
//! Static analysis for MongoDB playground scripts, the engine behind editor
//! completion, namespace detection and "run selection" features.
//!
//! # Modules
//!
//! - `cli`: Command-line interface and argument parsing
//! - `config`: Configuration management
//! - `diagnostics`: Interactive shell syntax that scripts cannot run
//! - `error`: Error types and handling
//! - `parser`: Script lexer, parser and source positions
//! - `trigger`: Cursor marker injection
//! - `visitor`: Completion, namespace and selection analysis
//!
//! # Example
//!
//! ```
//! use mongodb_lang::{Position, completion_context};
//!
//! let text = "use('shop');\ndb.orders.aggregate([{ $match: {  } }])";
//! let state = completion_context(text, Position::new(1, 33)).into_state();
//!
//! assert_eq!(state.database_name.as_deref(), Some("shop"));
//! assert_eq!(state.collection_name.as_deref(), Some("orders"));
//! assert_eq!(state.stage_operator.as_deref(), Some("$match"));
//! ```

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod parser;
pub mod trigger;
pub mod visitor;

// Re-export commonly used types
pub use config::{AnalysisConfig, Config};
pub use diagnostics::Diagnostic;
pub use error::{LangError, Result};
pub use parser::{Position, Selection, parse_script};
pub use trigger::{TRIGGER_CHARACTER, inject_trigger_character};
pub use visitor::{
    Analysis, Analyzer, CompletionState, NamespaceState, SelectionState, completion_context,
    namespace_context, selection_context,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
///
/// # Returns
/// * `&str` - Version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
