//! Structural checks run by the completion and namespace visitors
//!
//! Each `check_*` function inspects one node, and sets flags on the
//! [`CompletionState`] accumulator when the node has exactly the shape it
//! looks for. Checks are independent: several may fire on the same node and
//! none of them fails on a shape it does not recognise.
//!
//! The names captured along the way (database, collection, stream processor)
//! come from pure extractors returning `Option<&str>` so that both visitors
//! can share them without writing into each other's state.
//!
//! Marker detection is always substring containment, so a marker glued onto
//! a partially typed identifier (`db.us<marker>`) still matches.

use super::state::CompletionState;
use crate::config::AnalysisConfig;
use crate::parser::ast::*;
use crate::parser::{LineIndex, Position, Span};
use crate::trigger::contains_trigger;

/// Everything a check needs besides the node itself
#[derive(Debug, Clone, Copy)]
pub struct CheckContext<'a> {
    /// Editor position of the cursor
    pub cursor: Position,
    pub config: &'a AnalysisConfig,
    pub line_index: &'a LineIndex,
}

impl<'a> CheckContext<'a> {
    pub fn new(cursor: Position, config: &'a AnalysisConfig, line_index: &'a LineIndex) -> Self {
        Self {
            cursor,
            config,
            line_index,
        }
    }

    /// Bare database global
    pub fn is_db(&self, expr: &Expr) -> bool {
        expr.is_ident(&self.config.database_symbol)
    }

    /// Bare stream processing global
    pub fn is_sp(&self, expr: &Expr) -> bool {
        expr.is_ident(&self.config.stream_processor_symbol)
    }

    /// Editor position of the end of a span
    pub fn end_position(&self, span: &Span) -> Position {
        self.line_index.line_column(span.end).to_position()
    }
}

/// Text of a string literal or of a template without substitutions
pub fn literal_text(expr: &Expr) -> Option<&str> {
    match expr {
        Expr::String(lit) => Some(&lit.value),
        Expr::Template(template) => template.single_quasi(),
        _ => None,
    }
}

/// Literal argument of a one-argument call
fn single_literal_argument(call: &CallExpr) -> Option<&str> {
    call.single_argument().and_then(literal_text)
}

fn is_use_call(call: &CallExpr) -> bool {
    call.callee.is_ident("use")
}

/// `<root>.<method>(...)` where `root` satisfies the predicate
fn is_root_method_call(call: &CallExpr, method: &str, is_root: impl Fn(&Expr) -> bool) -> bool {
    match &call.callee {
        Expr::Member(member) => is_root(&member.object) && member.property_ident() == Some(method),
        _ => false,
    }
}

fn marker_free(name: &str) -> Option<&str> {
    (!contains_trigger(name)).then_some(name)
}

/* ========================= Call expressions ========================= */

/// `use("<marker>")`: the database name is being typed
pub fn check_use_call_expression(call: &CallExpr, state: &mut CompletionState) {
    if is_use_call(call) && single_literal_argument(call).is_some_and(contains_trigger) {
        state.is_use_call_expression = true;
    }
}

/// `db.getCollection("<marker>")` or `sp.getProcessor("<marker>")`
pub fn check_name_argument(call: &CallExpr, ctx: &CheckContext, state: &mut CompletionState) {
    if !single_literal_argument(call).is_some_and(contains_trigger) {
        return;
    }

    if is_root_method_call(call, "getCollection", |e| ctx.is_db(e)) {
        state.is_collection_name = true;
    }
    if is_root_method_call(call, "getProcessor", |e| ctx.is_sp(e)) {
        state.is_stream_processor_name = true;
    }
}

/// Database selected by a `use("name")` call that ends at or before the cursor
///
/// Called in source order, the last match is the most recent `use` above the
/// cursor.
pub fn use_database_before_cursor<'a>(call: &'a CallExpr, ctx: &CheckContext) -> Option<&'a str> {
    if !is_use_call(call) {
        return None;
    }

    let name = single_literal_argument(call).and_then(marker_free)?;
    (ctx.end_position(&call.span) <= ctx.cursor).then_some(name)
}

/* ========================= Member expressions ========================= */

/// `db.coll.find().<marker>` or `db.coll.aggregate([]).<marker>`
pub fn check_cursor_method(member: &MemberExpr, state: &mut CompletionState) {
    if !member.property_name().is_some_and(contains_trigger) {
        return;
    }

    let Expr::Call(call) = &member.object else {
        return;
    };
    let Expr::Member(callee) = &call.callee else {
        return;
    };

    match callee.property_ident() {
        Some("aggregate") => state.is_aggregation_cursor = true,
        Some("find") => state.is_find_cursor = true,
        _ => {}
    }
}

/// Marker property off a root global or off a collection / processor
///
/// `db.<marker>` is both a collection symbol and a collection name being
/// typed; `db.users.<marker>` is a member access off a collection.
pub fn check_symbol_member(member: &MemberExpr, ctx: &CheckContext, state: &mut CompletionState) {
    if !member.property_name().is_some_and(contains_trigger) {
        return;
    }

    if ctx.is_db(&member.object) {
        state.is_collection_symbol = true;
        state.is_collection_name = true;
    } else if ctx.is_sp(&member.object) {
        state.is_stream_processor_symbol = true;
        state.is_stream_processor_name = true;
    } else if collection_access(&member.object, ctx).is_some() {
        state.is_collection_symbol = true;
    } else if processor_access(&member.object, ctx).is_some() {
        state.is_stream_processor_symbol = true;
    }
}

/// Collection named by `db.<name>` or `db.getCollection("name")`
pub fn collection_access<'a>(expr: &'a Expr, ctx: &CheckContext) -> Option<&'a str> {
    named_access(expr, "getCollection", |e| ctx.is_db(e))
}

/// Stream processor named by `sp.<name>` or `sp.getProcessor("name")`
pub fn processor_access<'a>(expr: &'a Expr, ctx: &CheckContext) -> Option<&'a str> {
    named_access(expr, "getProcessor", |e| ctx.is_sp(e))
}

/// Collection named by a `db.getCollection("name")` call
pub fn collection_getter<'a>(call: &'a CallExpr, ctx: &CheckContext) -> Option<&'a str> {
    named_getter(call, "getCollection", |e| ctx.is_db(e))
}

fn named_access<'a>(expr: &'a Expr, getter: &str, is_root: impl Fn(&Expr) -> bool) -> Option<&'a str> {
    match expr {
        Expr::Member(member) if is_root(&member.object) => {
            member.property_name().and_then(marker_free)
        }
        Expr::Call(call) => named_getter(call, getter, is_root),
        _ => None,
    }
}

fn named_getter<'a>(call: &'a CallExpr, getter: &str, is_root: impl Fn(&Expr) -> bool) -> Option<&'a str> {
    if !is_root_method_call(call, getter, is_root) {
        return None;
    }
    single_literal_argument(call).and_then(marker_free)
}

/// Collection of the object a member expression is chained off
pub fn collection_of_member<'a>(member: &'a MemberExpr, ctx: &CheckContext) -> Option<&'a str> {
    collection_access(&member.object, ctx)
}

/// Stream processor of the object a member expression is chained off
pub fn processor_of_member<'a>(member: &'a MemberExpr, ctx: &CheckContext) -> Option<&'a str> {
    processor_access(&member.object, ctx)
}

/* ========================= Expression statements ========================= */

/// A bare identifier statement carrying the marker
pub fn check_global_symbol(stmt: &ExprStmt, state: &mut CompletionState) {
    if let Expr::Ident(ident) = &stmt.expression {
        if contains_trigger(&ident.name) {
            state.is_global_symbol = true;
        }
    }
}

/// A statement that is a member access off bare `db` / `sp`
pub fn check_root_symbol(stmt: &ExprStmt, ctx: &CheckContext, state: &mut CompletionState) {
    if let Expr::Member(member) = &stmt.expression {
        if ctx.is_db(&member.object) {
            state.is_db_symbol = true;
        }
        if ctx.is_sp(&member.object) {
            state.is_sp_symbol = true;
        }
    }
}

/* ========================= Object expressions ========================= */

/// Marker in a key, an identifier value or a text value
pub fn check_object_members(object: &ObjectExpr, state: &mut CompletionState) {
    for prop in object.props() {
        if prop.key.as_ident().is_some_and(contains_trigger) {
            state.is_object_key = true;
        }

        match &prop.value {
            Expr::Ident(ident) if contains_trigger(&ident.name) => {
                state.is_identifier_object_value = true;
            }
            value if literal_text(value).is_some_and(contains_trigger) => {
                state.is_text_object_value = true;
            }
            _ => {}
        }
    }
}

/* ========================= Array expressions ========================= */

/// A pipeline element whose key carries the marker: `[{ <marker> }]`
pub fn check_stage(array: &ArrayExpr, state: &mut CompletionState) {
    let in_stage_key = array.elements.iter().any(|element| match element {
        Expr::Object(object) => object
            .props()
            .any(|prop| prop.key.static_name().is_some_and(contains_trigger)),
        _ => false,
    });

    if in_stage_key {
        state.is_stage = true;
    }
}

/// `[{ $operator: { ... <marker> ... } }]`: the cursor is inside a stage body
pub fn check_stage_operator(array: &ArrayExpr, state: &mut CompletionState) {
    if let Some(operator) = stage_operator(array) {
        state.is_stage = true;
        state.stage_operator = Some(operator.to_string());
    }
}

/// Key of the stage whose object value contains the marker
pub fn stage_operator(array: &ArrayExpr) -> Option<&str> {
    array
        .elements
        .iter()
        .filter_map(|element| match element {
            Expr::Object(object) => Some(object),
            _ => None,
        })
        .flat_map(|object| object.props())
        .filter(|prop| matches!(prop.value, Expr::Object(_)))
        .filter(|prop| contains_marker(&prop.value))
        .filter_map(|prop| prop.key.static_name())
        .last()
}

/// Whether the marker occurs anywhere inside an expression
pub fn contains_marker(expr: &Expr) -> bool {
    let mut finder = MarkerFinder::default();
    super::walk::walk_expr(&mut finder, expr);
    finder.found
}

#[derive(Default)]
struct MarkerFinder {
    found: bool,
}

impl super::walk::Visit for MarkerFinder {
    fn visit_expr(&mut self, expr: &Expr) {
        let text = match expr {
            Expr::Ident(ident) => Some(ident.name.as_str()),
            Expr::String(lit) => Some(lit.value.as_str()),
            Expr::Template(template) => {
                if template.quasis.iter().any(|q| contains_trigger(&q.raw)) {
                    self.found = true;
                }
                None
            }
            _ => None,
        };
        if text.is_some_and(contains_trigger) {
            self.found = true;
        }
    }

    fn visit_member(&mut self, member: &MemberExpr) {
        if member.property_ident().is_some_and(contains_trigger) {
            self.found = true;
        }
    }

    fn visit_object(&mut self, object: &ObjectExpr) {
        if object
            .props()
            .any(|prop| prop.key.static_name().is_some_and(contains_trigger))
        {
            self.found = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_script;
    use crate::trigger::TRIGGER_CHARACTER;

    fn marked(text: &str) -> String {
        text.replace("<M>", TRIGGER_CHARACTER)
    }

    fn first_expr(text: &str) -> (Expr, LineIndex) {
        let program = parse_script(&marked(text)).unwrap();
        let line_index = program.line_index.clone();
        match program.body.into_iter().next() {
            Some(Stmt::Expr(stmt)) => (stmt.expression, line_index),
            other => panic!("Expected expression statement, got {other:?}"),
        }
    }

    fn first_stmt(text: &str) -> ExprStmt {
        let program = parse_script(&marked(text)).unwrap();
        match program.body.into_iter().next() {
            Some(Stmt::Expr(stmt)) => stmt,
            other => panic!("Expected expression statement, got {other:?}"),
        }
    }

    fn as_call(expr: &Expr) -> &CallExpr {
        match expr {
            Expr::Call(call) => call,
            other => panic!("Expected call expression, got {other:?}"),
        }
    }

    fn as_member(expr: &Expr) -> &MemberExpr {
        match expr {
            Expr::Member(member) => member,
            other => panic!("Expected member expression, got {other:?}"),
        }
    }

    #[test]
    fn test_use_call_expression() {
        let mut state = CompletionState::default();
        let (expr, _) = first_expr("use('te<M>')");
        check_use_call_expression(as_call(&expr), &mut state);
        assert!(state.is_use_call_expression);

        let mut state = CompletionState::default();
        let (expr, _) = first_expr("use(`<M>`)");
        check_use_call_expression(as_call(&expr), &mut state);
        assert!(state.is_use_call_expression);

        let mut state = CompletionState::default();
        let (expr, _) = first_expr("print('<M>')");
        check_use_call_expression(as_call(&expr), &mut state);
        assert!(!state.is_use_call_expression);
    }

    #[test]
    fn test_use_database_before_cursor() {
        let config = AnalysisConfig::default();
        let (expr, index) = first_expr("use('shop')");
        let call = as_call(&expr);

        let after = CheckContext::new(Position::new(1, 0), &config, &index);
        assert_eq!(use_database_before_cursor(call, &after), Some("shop"));

        let same_line_end = CheckContext::new(Position::new(0, 11), &config, &index);
        assert_eq!(use_database_before_cursor(call, &same_line_end), Some("shop"));

        let inside = CheckContext::new(Position::new(0, 5), &config, &index);
        assert_eq!(use_database_before_cursor(call, &inside), None);
    }

    #[test]
    fn test_use_with_marker_is_not_captured() {
        let config = AnalysisConfig::default();
        let (expr, index) = first_expr("use('<M>')");
        let ctx = CheckContext::new(Position::new(5, 0), &config, &index);
        assert_eq!(use_database_before_cursor(as_call(&expr), &ctx), None);
    }

    #[test]
    fn test_name_argument() {
        let config = AnalysisConfig::default();

        let (expr, index) = first_expr("db.getCollection('<M>')");
        let ctx = CheckContext::new(Position::new(0, 0), &config, &index);
        let mut state = CompletionState::default();
        check_name_argument(as_call(&expr), &ctx, &mut state);
        assert!(state.is_collection_name);
        assert!(!state.is_stream_processor_name);

        let (expr, index) = first_expr("sp.getProcessor(\"p<M>\")");
        let ctx = CheckContext::new(Position::new(0, 0), &config, &index);
        let mut state = CompletionState::default();
        check_name_argument(as_call(&expr), &ctx, &mut state);
        assert!(state.is_stream_processor_name);
    }

    #[test]
    fn test_cursor_method() {
        let (expr, _) = first_expr("db.coll.find({}).<M>");
        let mut state = CompletionState::default();
        check_cursor_method(as_member(&expr), &mut state);
        assert!(state.is_find_cursor);
        assert!(!state.is_aggregation_cursor);

        let (expr, _) = first_expr("db.coll.aggregate([]).to<M>");
        let mut state = CompletionState::default();
        check_cursor_method(as_member(&expr), &mut state);
        assert!(state.is_aggregation_cursor);

        let (expr, _) = first_expr("db.coll.count().<M>");
        let mut state = CompletionState::default();
        check_cursor_method(as_member(&expr), &mut state);
        assert!(!state.is_find_cursor && !state.is_aggregation_cursor);
    }

    #[test]
    fn test_symbol_member() {
        let config = AnalysisConfig::default();

        let (expr, index) = first_expr("db.<M>");
        let ctx = CheckContext::new(Position::new(0, 3), &config, &index);
        let mut state = CompletionState::default();
        check_symbol_member(as_member(&expr), &ctx, &mut state);
        assert!(state.is_collection_symbol);
        assert!(state.is_collection_name);

        let (expr, index) = first_expr("db['<M>']");
        let ctx = CheckContext::new(Position::new(0, 4), &config, &index);
        let mut state = CompletionState::default();
        check_symbol_member(as_member(&expr), &ctx, &mut state);
        assert!(state.is_collection_symbol);

        let (expr, index) = first_expr("sp.<M>");
        let ctx = CheckContext::new(Position::new(0, 3), &config, &index);
        let mut state = CompletionState::default();
        check_symbol_member(as_member(&expr), &ctx, &mut state);
        assert!(state.is_stream_processor_symbol);
        assert!(state.is_stream_processor_name);
        assert!(!state.is_collection_symbol);

        let (expr, index) = first_expr("db.users.<M>");
        let ctx = CheckContext::new(Position::new(0, 9), &config, &index);
        let mut state = CompletionState::default();
        check_symbol_member(as_member(&expr), &ctx, &mut state);
        assert!(state.is_collection_symbol);
        assert!(!state.is_collection_name);
    }

    #[test]
    fn test_collection_access() {
        let config = AnalysisConfig::default();

        let (expr, index) = first_expr("db.users");
        let ctx = CheckContext::new(Position::new(0, 0), &config, &index);
        assert_eq!(collection_access(&expr, &ctx), Some("users"));

        let (expr, _) = first_expr("db.getCollection('audit log')");
        assert_eq!(collection_access(&expr, &ctx), Some("audit log"));

        let (expr, _) = first_expr("db.getCollection(name)");
        assert_eq!(collection_access(&expr, &ctx), None);

        let (expr, _) = first_expr("db.<M>");
        assert_eq!(collection_access(&expr, &ctx), None);

        let (expr, _) = first_expr("sp.getProcessor('proc')");
        assert_eq!(processor_access(&expr, &ctx), Some("proc"));
        assert_eq!(collection_access(&expr, &ctx), None);
    }

    #[test]
    fn test_custom_symbols() {
        let config = AnalysisConfig {
            database_symbol: "mdb".to_string(),
            ..Default::default()
        };
        let (expr, index) = first_expr("mdb.orders");
        let ctx = CheckContext::new(Position::new(0, 0), &config, &index);
        assert_eq!(collection_access(&expr, &ctx), Some("orders"));

        let (expr, _) = first_expr("db.orders");
        assert_eq!(collection_access(&expr, &ctx), None);
    }

    #[test]
    fn test_global_and_root_symbols() {
        let config = AnalysisConfig::default();
        let index = LineIndex::new("");
        let ctx = CheckContext::new(Position::new(0, 0), &config, &index);

        let mut state = CompletionState::default();
        check_global_symbol(&first_stmt("pri<M>"), &mut state);
        assert!(state.is_global_symbol);

        let mut state = CompletionState::default();
        check_global_symbol(&first_stmt("print"), &mut state);
        assert!(!state.is_global_symbol);

        let mut state = CompletionState::default();
        check_root_symbol(&first_stmt("db.<M>"), &ctx, &mut state);
        assert!(state.is_db_symbol);
        assert!(!state.is_sp_symbol);

        let mut state = CompletionState::default();
        check_root_symbol(&first_stmt("sp.<M>"), &ctx, &mut state);
        assert!(state.is_sp_symbol);
    }

    #[test]
    fn test_object_members() {
        let object = |text: &str| match first_expr(text).0 {
            Expr::Object(object) => object,
            other => panic!("Expected object, got {other:?}"),
        };

        let mut state = CompletionState::default();
        check_object_members(&object("({ na<M>: 1 })"), &mut state);
        assert!(state.is_object_key);
        assert!(!state.is_identifier_object_value);

        let mut state = CompletionState::default();
        check_object_members(&object("({ name: <M> })"), &mut state);
        assert!(state.is_identifier_object_value);
        assert!(!state.is_object_key);

        let mut state = CompletionState::default();
        check_object_members(&object("({ name: 'Jo<M>' })"), &mut state);
        assert!(state.is_text_object_value);

        let mut state = CompletionState::default();
        check_object_members(&object("({ <M> })"), &mut state);
        assert!(state.is_object_key);
        assert!(state.is_identifier_object_value);
    }

    #[test]
    fn test_stage_and_operator() {
        let array = |text: &str| match first_expr(text).0 {
            Expr::Array(array) => array,
            other => panic!("Expected array, got {other:?}"),
        };

        let mut state = CompletionState::default();
        check_stage(&array("[{ $ma<M> }]"), &mut state);
        assert!(state.is_stage);

        let pipeline = array("[{ $match: { a: 1 } }, { $group: { _id: { $sum: '<M>' } } }]");
        assert_eq!(stage_operator(&pipeline), Some("$group"));

        let mut state = CompletionState::default();
        check_stage(&pipeline, &mut state);
        assert!(!state.is_stage);
        check_stage_operator(&pipeline, &mut state);
        assert!(state.is_stage);
        assert_eq!(state.stage_operator.as_deref(), Some("$group"));

        assert_eq!(stage_operator(&array("[{ $match: { a: 1 } }]")), None);
        assert_eq!(stage_operator(&array("[{ '$project': { <M> } }]")), Some("$project"));
    }

    #[test]
    fn test_contains_marker() {
        let (expr, _) = first_expr("({ a: [1, { b: f(x.<M>) }] })");
        assert!(contains_marker(&expr));

        let (expr, _) = first_expr("({ a: `x<M>` })");
        assert!(contains_marker(&expr));

        let (expr, _) = first_expr("({ a: [1, { b: f(x.y) }] })");
        assert!(!contains_marker(&expr));
    }
}
