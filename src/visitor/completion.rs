//! Completion context visitor

use super::checks::{self, CheckContext};
use super::state::CompletionState;
use super::walk::Visit;
use crate::parser::ast::*;

/// Runs the full check battery over a marker-injected program
pub(crate) struct CompletionVisitor<'a> {
    ctx: CheckContext<'a>,
    state: CompletionState,
}

impl<'a> CompletionVisitor<'a> {
    pub(crate) fn new(ctx: CheckContext<'a>) -> Self {
        Self {
            ctx,
            state: CompletionState::default(),
        }
    }

    pub(crate) fn into_state(self) -> CompletionState {
        self.state
    }
}

impl Visit for CompletionVisitor<'_> {
    fn visit_call(&mut self, call: &CallExpr) {
        checks::check_use_call_expression(call, &mut self.state);
        checks::check_name_argument(call, &self.ctx, &mut self.state);

        if let Some(database) = checks::use_database_before_cursor(call, &self.ctx) {
            self.state.database_name = Some(database.to_string());
        }
    }

    fn visit_member(&mut self, member: &MemberExpr) {
        checks::check_cursor_method(member, &mut self.state);
        checks::check_symbol_member(member, &self.ctx, &mut self.state);

        if let Some(collection) = checks::collection_of_member(member, &self.ctx) {
            self.state.collection_name = Some(collection.to_string());
        }
        if let Some(processor) = checks::processor_of_member(member, &self.ctx) {
            self.state.stream_processor_name = Some(processor.to_string());
        }
    }

    fn visit_expr_stmt(&mut self, stmt: &ExprStmt) {
        checks::check_global_symbol(stmt, &mut self.state);
        checks::check_root_symbol(stmt, &self.ctx, &mut self.state);
    }

    fn visit_object(&mut self, object: &ObjectExpr) {
        checks::check_object_members(object, &mut self.state);
    }

    fn visit_array(&mut self, array: &ArrayExpr) {
        checks::check_stage(array, &mut self.state);
        checks::check_stage_operator(array, &mut self.state);
    }
}
