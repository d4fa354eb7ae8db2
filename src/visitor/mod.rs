//! Static-analysis visitors for MongoDB playground scripts
//!
//! This module answers "what is the user typing at the cursor?" for the
//! completion provider, and two related questions for other features:
//! - **Completion** ([`completion_context`]): splices the trigger marker in at
//!   the cursor, parses, and runs the check battery over every node
//! - **Namespace** ([`namespace_context`]): the database and collection a
//!   script works on, for prompt building
//! - **Selection** ([`selection_context`]): the statements, calls and array
//!   literals around an editor selection, for running code
//!
//! # Design Principles
//!
//! - One parse and one depth-first walk per request; no state survives a call
//! - Each entry point owns its result type; no visitor writes fields another
//!   one reads
//! - A parse failure is not an error: it yields [`Analysis::ParseFailed`]
//!   carrying the default state
//!
//! # Examples
//!
//! ```
//! use mongodb_lang::parser::Position;
//! use mongodb_lang::visitor::completion_context;
//!
//! let text = "use('shop');\ndb.";
//! let state = completion_context(text, Position::new(1, 3)).into_state();
//!
//! assert_eq!(state.database_name.as_deref(), Some("shop"));
//! assert!(state.is_collection_symbol);
//! assert!(state.is_collection_name);
//! ```

pub mod checks;
mod completion;
mod namespace;
pub mod selection;
pub mod state;
pub mod walk;


pub use state::{CompletionState, NamespaceState, SelectionState};
pub use walk::{Visit, walk_expr, walk_program, walk_stmt};

use tracing::{debug, trace};

use crate::config::AnalysisConfig;
use crate::error::LangError;
use crate::parser::ast::Program;
use crate::parser::{Position, Selection, parse_script};
use crate::trigger::inject_trigger_character;
use checks::CheckContext;
use completion::CompletionVisitor;
use namespace::NamespaceVisitor;
use selection::SelectionVisitor;

/// Outcome of one analysis request
///
/// Both variants carry a state; on parse failure it is the all-defaults
/// state, so callers that only want the state can use [`Analysis::into_state`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Analysis<T> {
    /// The script parsed and was fully traversed
    Parsed(T),
    /// The script could not be parsed
    ParseFailed {
        state: T,
        /// Parser error message
        reason: String,
    },
}

impl<T> Analysis<T> {
    pub fn state(&self) -> &T {
        match self {
            Analysis::Parsed(state) => state,
            Analysis::ParseFailed { state, .. } => state,
        }
    }

    pub fn into_state(self) -> T {
        match self {
            Analysis::Parsed(state) => state,
            Analysis::ParseFailed { state, .. } => state,
        }
    }

    pub fn is_parse_failure(&self) -> bool {
        matches!(self, Analysis::ParseFailed { .. })
    }

    /// Parser error message, if parsing failed
    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            Analysis::Parsed(_) => None,
            Analysis::ParseFailed { reason, .. } => Some(reason),
        }
    }
}

impl<T: Default> Analysis<T> {
    fn parse_failed(err: LangError) -> Self {
        debug!("Script parse failed, falling back to empty context: {}", err);
        Analysis::ParseFailed {
            state: T::default(),
            reason: err.to_string(),
        }
    }
}

/// Analysis entry points bound to one configuration
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    config: AnalysisConfig,
}

impl Analyzer {
    /// Create an analyzer with the given configuration
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Completion context at a cursor position
    ///
    /// # Arguments
    /// * `text` - Document text as typed
    /// * `position` - Zero-indexed cursor position
    ///
    /// # Returns
    /// * `Analysis<CompletionState>` - Flags and names found at the cursor
    pub fn completion_context(&self, text: &str, position: Position) -> Analysis<CompletionState> {
        let injected = inject_trigger_character(text, position);
        let program = match parse_script(&injected) {
            Ok(program) => program,
            Err(err) => return Analysis::parse_failed(err),
        };

        let ctx = CheckContext::new(position, &self.config, &program.line_index);
        let mut visitor = CompletionVisitor::new(ctx);
        walk_program(&mut visitor, &program);

        let state = visitor.into_state();
        trace!(?state, line = position.line, character = position.character, "Completion context");
        Analysis::Parsed(state)
    }

    /// Database and collection a script works on
    ///
    /// The text is parsed as is; `position` only bounds which `use(...)`
    /// calls count.
    pub fn namespace_context(&self, text: &str, position: Position) -> Analysis<NamespaceState> {
        let program = match parse_script(text) {
            Ok(program) => program,
            Err(err) => return Analysis::parse_failed(err),
        };

        let ctx = CheckContext::new(position, &self.config, &program.line_index);
        let mut visitor = NamespaceVisitor::new(ctx);
        walk_program(&mut visitor, &program);

        let state = visitor.into_state();
        trace!(?state, "Namespace context");
        Analysis::Parsed(state)
    }

    /// Code structure around an editor selection
    pub fn selection_context(&self, text: &str, selection: Selection) -> Analysis<SelectionState> {
        let program = match parse_script(text) {
            Ok(program) => program,
            Err(err) => return Analysis::parse_failed(err),
        };

        let state = Self::walk_selection(&program, selection);
        trace!(statements = state.statements.len(), "Selection context");
        Analysis::Parsed(state)
    }

    fn walk_selection(program: &Program, selection: Selection) -> SelectionState {
        let mut visitor = SelectionVisitor::new(&program.line_index, selection);
        visitor.collect_statements(program);
        walk_program(&mut visitor, program);
        visitor.into_state()
    }
}

/// Completion context with the default configuration
pub fn completion_context(text: &str, position: Position) -> Analysis<CompletionState> {
    Analyzer::default().completion_context(text, position)
}

/// Namespace context with the default configuration
pub fn namespace_context(text: &str, position: Position) -> Analysis<NamespaceState> {
    Analyzer::default().namespace_context(text, position)
}

/// Selection context with the default configuration
pub fn selection_context(text: &str, selection: Selection) -> Analysis<SelectionState> {
    Analyzer::default().selection_context(text, selection)
}
