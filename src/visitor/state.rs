//! Context records produced by the visitors
//!
//! All three records start from [`Default`] for every request and are only
//! ever written by the traversal that owns them. Boolean flags are set to
//! `true` and never reset within one walk; several may be true at once.

use serde::Serialize;

use crate::parser::SourceRange;

/// Everything discovered about the MongoDB context at the cursor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionState {
    /// Database selected by the last `use("...")` before the cursor
    pub database_name: Option<String>,
    /// Collection the cursor expression is chained off
    pub collection_name: Option<String>,
    /// Stream processor the cursor expression is chained off
    pub stream_processor_name: Option<String>,

    // Context symbols
    pub is_global_symbol: bool,
    pub is_db_symbol: bool,
    pub is_sp_symbol: bool,
    pub is_collection_symbol: bool,
    pub is_stream_processor_symbol: bool,

    // Value positions inside an object literal
    pub is_object_key: bool,
    pub is_identifier_object_value: bool,
    pub is_text_object_value: bool,

    // Aggregation pipeline
    pub is_stage: bool,
    /// Key of the `{ $operator: { ... } }` stage enclosing the cursor
    pub stage_operator: Option<String>,

    // Name arguments of lookup calls
    pub is_collection_name: bool,
    pub is_stream_processor_name: bool,
    pub is_use_call_expression: bool,

    // Result cursors
    pub is_aggregation_cursor: bool,
    pub is_find_cursor: bool,
}

impl CompletionState {
    /// Create an all-defaults state
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any context flag or operator was found
    ///
    /// Captured names alone do not count: a `use("db")` line above the cursor
    /// tells nothing about what is being completed.
    pub fn has_context(&self) -> bool {
        self.is_global_symbol
            || self.is_db_symbol
            || self.is_sp_symbol
            || self.is_collection_symbol
            || self.is_stream_processor_symbol
            || self.is_object_key
            || self.is_identifier_object_value
            || self.is_text_object_value
            || self.is_stage
            || self.stage_operator.is_some()
            || self.is_collection_name
            || self.is_stream_processor_name
            || self.is_use_call_expression
            || self.is_aggregation_cursor
            || self.is_find_cursor
    }
}

/// Database and collection a script operates on
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceState {
    pub database_name: Option<String>,
    pub collection_name: Option<String>,
}

impl NamespaceState {
    /// `database.collection`, when both parts are known
    pub fn namespace(&self) -> Option<String> {
        match (&self.database_name, &self.collection_name) {
            (Some(db), Some(coll)) => Some(format!("{db}.{coll}")),
            _ => None,
        }
    }
}

/// Code structure around an editor selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionState {
    /// An object literal lies within the (non-empty) selection
    pub is_object_selection: bool,
    /// An array literal lies within the (non-empty) selection
    pub is_array_selection: bool,
    /// Top-level statements on the selected lines, in source order
    pub statements: Vec<SourceRange>,
    /// Innermost statement enclosing the selection
    pub enclosing_statement: Option<SourceRange>,
    /// Innermost call expression enclosing the selection
    pub enclosing_call: Option<SourceRange>,
    /// Innermost array literal enclosing the selection
    pub enclosing_array: Option<SourceRange>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_has_no_context() {
        let state = CompletionState::new();
        assert!(!state.has_context());
        assert_eq!(state, CompletionState::default());
    }

    #[test]
    fn test_names_alone_are_not_context() {
        let state = CompletionState {
            database_name: Some("test".to_string()),
            collection_name: Some("users".to_string()),
            ..Default::default()
        };
        assert!(!state.has_context());

        let state = CompletionState {
            stage_operator: Some("$match".to_string()),
            ..Default::default()
        };
        assert!(state.has_context());
    }

    #[test]
    fn test_serializes_camel_case() {
        let state = CompletionState {
            is_collection_symbol: true,
            database_name: Some("test".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["isCollectionSymbol"], true);
        assert_eq!(json["databaseName"], "test");
        assert!(json["stageOperator"].is_null());
    }

    #[test]
    fn test_namespace() {
        let mut state = NamespaceState::default();
        assert_eq!(state.namespace(), None);
        state.database_name = Some("shop".to_string());
        state.collection_name = Some("orders".to_string());
        assert_eq!(state.namespace().as_deref(), Some("shop.orders"));
    }
}
