//! Namespace extraction visitor
//!
//! Works on the document as typed, without a marker. The database is the
//! last `use("...")` ending at or before the position; the collection is the
//! first one the script accesses.

use super::checks::{self, CheckContext};
use super::state::NamespaceState;
use super::walk::Visit;
use crate::parser::ast::*;

pub(crate) struct NamespaceVisitor<'a> {
    ctx: CheckContext<'a>,
    state: NamespaceState,
}

impl<'a> NamespaceVisitor<'a> {
    pub(crate) fn new(ctx: CheckContext<'a>) -> Self {
        Self {
            ctx,
            state: NamespaceState::default(),
        }
    }

    pub(crate) fn into_state(self) -> NamespaceState {
        self.state
    }

    fn capture_collection(&mut self, name: Option<&str>) {
        if self.state.collection_name.is_none() {
            self.state.collection_name = name.map(str::to_string);
        }
    }
}

impl Visit for NamespaceVisitor<'_> {
    fn visit_call(&mut self, call: &CallExpr) {
        if let Some(database) = checks::use_database_before_cursor(call, &self.ctx) {
            self.state.database_name = Some(database.to_string());
        }

        // A bare `db.getCollection("name")` statement has no member chained off it
        self.capture_collection(checks::collection_getter(call, &self.ctx));
    }

    fn visit_member(&mut self, member: &MemberExpr) {
        self.capture_collection(checks::collection_of_member(member, &self.ctx));
    }
}
