//! Depth-first syntax tree traversal
//!
//! [`Visit`] exposes one enter hook per node kind the context checks care
//! about. The `walk_*` functions call the hooks in source order and then
//! descend into children; there are no exit hooks.

use crate::parser::ast::*;

/// Enter-only visitor over a [`Program`]
///
/// Every hook defaults to a no-op, so implementors only override the node
/// kinds they inspect. `visit_expr` and `visit_stmt` fire for every node
/// before the kind-specific hook.
pub trait Visit {
    fn visit_stmt(&mut self, _stmt: &Stmt) {}
    fn visit_expr_stmt(&mut self, _stmt: &ExprStmt) {}
    fn visit_expr(&mut self, _expr: &Expr) {}
    fn visit_call(&mut self, _call: &CallExpr) {}
    fn visit_member(&mut self, _member: &MemberExpr) {}
    fn visit_object(&mut self, _object: &ObjectExpr) {}
    fn visit_array(&mut self, _array: &ArrayExpr) {}
}

/// Walk every statement of the program in order
pub fn walk_program<V: Visit + ?Sized>(visitor: &mut V, program: &Program) {
    for stmt in &program.body {
        walk_stmt(visitor, stmt);
    }
}

pub fn walk_stmt<V: Visit + ?Sized>(visitor: &mut V, stmt: &Stmt) {
    visitor.visit_stmt(stmt);

    match stmt {
        Stmt::Expr(expr_stmt) => {
            visitor.visit_expr_stmt(expr_stmt);
            walk_expr(visitor, &expr_stmt.expression);
        }
        Stmt::Var(decl) => {
            for declarator in &decl.declarations {
                if let Some(init) = &declarator.init {
                    walk_expr(visitor, init);
                }
            }
        }
        Stmt::Function(function) => walk_block(visitor, &function.body),
        Stmt::Return(ret) => {
            if let Some(argument) = &ret.argument {
                walk_expr(visitor, argument);
            }
        }
        Stmt::If(if_stmt) => {
            walk_expr(visitor, &if_stmt.test);
            walk_stmt(visitor, &if_stmt.consequent);
            if let Some(alternate) = &if_stmt.alternate {
                walk_stmt(visitor, alternate);
            }
        }
        Stmt::Block(block) => walk_block(visitor, block),
        Stmt::While(while_stmt) => {
            walk_expr(visitor, &while_stmt.test);
            walk_stmt(visitor, &while_stmt.body);
        }
        Stmt::For(for_stmt) => {
            if let Some(init) = &for_stmt.init {
                walk_stmt(visitor, init);
            }
            if let Some(test) = &for_stmt.test {
                walk_expr(visitor, test);
            }
            if let Some(update) = &for_stmt.update {
                walk_expr(visitor, update);
            }
            walk_stmt(visitor, &for_stmt.body);
        }
        Stmt::ForInOf(for_stmt) => {
            walk_stmt(visitor, &for_stmt.left);
            walk_expr(visitor, &for_stmt.right);
            walk_stmt(visitor, &for_stmt.body);
        }
        Stmt::Empty(_) => {}
    }
}

fn walk_block<V: Visit + ?Sized>(visitor: &mut V, block: &BlockStmt) {
    for stmt in &block.body {
        walk_stmt(visitor, stmt);
    }
}

pub fn walk_expr<V: Visit + ?Sized>(visitor: &mut V, expr: &Expr) {
    visitor.visit_expr(expr);

    match expr {
        Expr::Ident(_)
        | Expr::String(_)
        | Expr::Number(_)
        | Expr::Boolean(..)
        | Expr::Null(_)
        | Expr::This(_)
        | Expr::Regex(_) => {}
        Expr::Template(template) => {
            for expression in &template.expressions {
                walk_expr(visitor, expression);
            }
        }
        Expr::Object(object) => {
            visitor.visit_object(object);
            for member in &object.properties {
                match member {
                    ObjectMember::Property(prop) => {
                        if let PropertyKey::Computed(key) = &prop.key {
                            walk_expr(visitor, key);
                        }
                        walk_expr(visitor, &prop.value);
                    }
                    ObjectMember::Spread(spread) => walk_expr(visitor, &spread.argument),
                }
            }
        }
        Expr::Array(array) => {
            visitor.visit_array(array);
            for element in &array.elements {
                walk_expr(visitor, element);
            }
        }
        Expr::Member(member) => {
            visitor.visit_member(member);
            walk_expr(visitor, &member.object);
            if let MemberProperty::Computed(property) = &member.property {
                walk_expr(visitor, property);
            }
        }
        Expr::Call(call) => {
            visitor.visit_call(call);
            walk_expr(visitor, &call.callee);
            for argument in &call.arguments {
                walk_expr(visitor, argument);
            }
        }
        Expr::New(new_expr) => {
            walk_expr(visitor, &new_expr.callee);
            for argument in &new_expr.arguments {
                walk_expr(visitor, argument);
            }
        }
        Expr::Unary(unary) => walk_expr(visitor, &unary.argument),
        Expr::Update(update) => walk_expr(visitor, &update.argument),
        Expr::Binary(binary) => {
            walk_expr(visitor, &binary.left);
            walk_expr(visitor, &binary.right);
        }
        Expr::Assign(assign) => {
            walk_expr(visitor, &assign.target);
            walk_expr(visitor, &assign.value);
        }
        Expr::Conditional(cond) => {
            walk_expr(visitor, &cond.test);
            walk_expr(visitor, &cond.consequent);
            walk_expr(visitor, &cond.alternate);
        }
        Expr::Arrow(arrow) => match &arrow.body {
            ArrowBody::Expr(body) => walk_expr(visitor, body),
            ArrowBody::Block(block) => walk_block(visitor, block),
        },
        Expr::Function(function) => walk_block(visitor, &function.body),
        Expr::Spread(spread) => walk_expr(visitor, &spread.argument),
        Expr::Sequence(seq) => {
            for expression in &seq.expressions {
                walk_expr(visitor, expression);
            }
        }
    }
}
