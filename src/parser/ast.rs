//! Playground script AST (Abstract Syntax Tree)
//!
//! This module defines AST structures for the script subset used in MongoDB
//! playgrounds. Every node carries a char-offset [`Span`]; parser
//! coordinates are derived from it through [`Program::location`].

use super::position::{LineIndex, SourceLocation, Span};

/// A parsed script
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub body: Vec<Stmt>,
    pub span: Span,
    pub line_index: LineIndex,
}

impl Program {
    /// Parser coordinates (1-indexed line) of a span
    pub fn location(&self, span: &Span) -> SourceLocation {
        self.line_index.location(span)
    }
}

/// Statements
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Expression statement: `db.users.find();`
    Expr(ExprStmt),
    /// Variable declaration: `const x = 1, y;`
    Var(VarDecl),
    /// Function declaration: `function f(a) { ... }`
    Function(Box<Function>),
    /// Return statement
    Return(ReturnStmt),
    /// If statement with optional alternate
    If(Box<IfStmt>),
    /// Block statement: `{ ... }`
    Block(BlockStmt),
    /// While loop
    While(Box<WhileStmt>),
    /// Classic for loop: `for (init; test; update) body`
    For(Box<ForStmt>),
    /// `for (const x of xs)` / `for (const k in obj)`
    ForInOf(Box<ForInOfStmt>),
    /// Empty statement: `;`
    Empty(Span),
}

impl Stmt {
    pub fn span(&self) -> &Span {
        match self {
            Stmt::Expr(s) => &s.span,
            Stmt::Var(s) => &s.span,
            Stmt::Function(s) => &s.span,
            Stmt::Return(s) => &s.span,
            Stmt::If(s) => &s.span,
            Stmt::Block(s) => &s.span,
            Stmt::While(s) => &s.span,
            Stmt::For(s) => &s.span,
            Stmt::ForInOf(s) => &s.span,
            Stmt::Empty(span) => span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprStmt {
    pub expression: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Const,
    Let,
    Var,
}

impl VarKind {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "const" => Some(VarKind::Const),
            "let" => Some(VarKind::Let),
            "var" => Some(VarKind::Var),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub kind: VarKind,
    pub declarations: Vec<VarDeclarator>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDeclarator {
    pub id: Ident,
    pub init: Option<Expr>,
    pub span: Span,
}

/// Function declaration or expression
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub id: Option<Ident>,
    pub params: Vec<Ident>,
    pub body: BlockStmt,
    pub is_async: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub argument: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub test: Expr,
    pub consequent: Stmt,
    pub alternate: Option<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockStmt {
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub test: Expr,
    pub body: Stmt,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    pub init: Option<Stmt>,
    pub test: Option<Expr>,
    pub update: Option<Expr>,
    pub body: Stmt,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForInOfStmt {
    /// Declaration or assignment target on the left of `of` / `in`
    pub left: Stmt,
    pub right: Expr,
    pub body: Stmt,
    pub is_of: bool,
    pub span: Span,
}

/// Root expression type
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Identifier: variable name
    Ident(Ident),
    /// String literal: "hello" or 'world'
    String(StringLit),
    /// Number literal: 42 or 3.14
    Number(NumberLit),
    /// Boolean literal: true or false
    Boolean(bool, Span),
    /// Null literal
    Null(Span),
    /// `this`
    This(Span),
    /// Template literal: `a ${b} c`
    Template(TemplateLit),
    /// Regular expression literal: /ab+c/i
    Regex(RegexLit),
    /// Object literal: { key: value, ... }
    Object(ObjectExpr),
    /// Array literal: [1, 2, 3]
    Array(ArrayExpr),
    /// Member expression: obj.prop
    Member(Box<MemberExpr>),
    /// Call expression: fn(args)
    Call(Box<CallExpr>),
    /// New expression: new Ctor(args)
    New(Box<NewExpr>),
    /// Unary expression: -x, !x, typeof x
    Unary(Box<UnaryExpr>),
    /// Update expression: x++, --x
    Update(Box<UpdateExpr>),
    /// Binary and logical expressions: a + b, a && b
    Binary(Box<BinaryExpr>),
    /// Assignment: a = b, a += b
    Assign(Box<AssignExpr>),
    /// Conditional: a ? b : c
    Conditional(Box<ConditionalExpr>),
    /// Arrow function: (a) => a.b
    Arrow(Box<ArrowFunction>),
    /// Function expression: function (a) { ... }
    Function(Box<Function>),
    /// Spread element in arrays and arguments: ...xs
    Spread(Box<SpreadElement>),
    /// Comma sequence: (a, b)
    Sequence(SequenceExpr),
}

impl Expr {
    pub fn span(&self) -> &Span {
        match self {
            Expr::Ident(e) => &e.span,
            Expr::String(e) => &e.span,
            Expr::Number(e) => &e.span,
            Expr::Boolean(_, span) | Expr::Null(span) | Expr::This(span) => span,
            Expr::Template(e) => &e.span,
            Expr::Regex(e) => &e.span,
            Expr::Object(e) => &e.span,
            Expr::Array(e) => &e.span,
            Expr::Member(e) => &e.span,
            Expr::Call(e) => &e.span,
            Expr::New(e) => &e.span,
            Expr::Unary(e) => &e.span,
            Expr::Update(e) => &e.span,
            Expr::Binary(e) => &e.span,
            Expr::Assign(e) => &e.span,
            Expr::Conditional(e) => &e.span,
            Expr::Arrow(e) => &e.span,
            Expr::Function(e) => &e.span,
            Expr::Spread(e) => &e.span,
            Expr::Sequence(e) => &e.span,
        }
    }

    /// Identifier name if this is a bare identifier
    pub fn as_ident(&self) -> Option<&str> {
        match self {
            Expr::Ident(ident) => Some(&ident.name),
            _ => None,
        }
    }

    pub fn is_ident(&self, name: &str) -> bool {
        self.as_ident() == Some(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StringLit {
    pub value: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberLit {
    /// Source text of the literal
    pub raw: String,
    pub value: f64,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateLit {
    pub quasis: Vec<TemplateElement>,
    pub expressions: Vec<Expr>,
    pub span: Span,
}

impl TemplateLit {
    /// Raw text of a template without substitutions
    pub fn single_quasi(&self) -> Option<&str> {
        match self.quasis.as_slice() {
            [only] if self.expressions.is_empty() => Some(&only.raw),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateElement {
    pub raw: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegexLit {
    pub pattern: String,
    pub flags: String,
    pub span: Span,
}

/// Object expression: { key: value, ... }
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectExpr {
    pub properties: Vec<ObjectMember>,
    pub span: Span,
}

impl ObjectExpr {
    pub fn new(properties: Vec<ObjectMember>, span: Span) -> Self {
        Self { properties, span }
    }

    /// Plain `key: value` properties, skipping spreads
    pub fn props(&self) -> impl Iterator<Item = &Property> {
        self.properties.iter().filter_map(|member| match member {
            ObjectMember::Property(prop) => Some(prop),
            ObjectMember::Spread(_) => None,
        })
    }
}

/// Entry of an object literal
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectMember {
    Property(Property),
    Spread(SpreadElement),
}

/// Object property: key: value
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub key: PropertyKey,
    pub value: Expr,
    /// `{ name }` shorthand; `value` is then the same identifier as `key`
    pub shorthand: bool,
    pub span: Span,
}

impl Property {
    pub fn new(key: PropertyKey, value: Expr, span: Span) -> Self {
        Self {
            key,
            value,
            shorthand: false,
            span,
        }
    }
}

/// Property key (identifier, string, number or computed)
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKey {
    Ident(Ident),
    String(StringLit),
    Number(NumberLit),
    Computed(Box<Expr>),
}

impl PropertyKey {
    /// Identifier key name
    pub fn as_ident(&self) -> Option<&str> {
        match self {
            PropertyKey::Ident(ident) => Some(&ident.name),
            _ => None,
        }
    }

    /// Static key name: identifier, string or number text
    pub fn static_name(&self) -> Option<&str> {
        match self {
            PropertyKey::Ident(ident) => Some(&ident.name),
            PropertyKey::String(lit) => Some(&lit.value),
            PropertyKey::Number(lit) => Some(&lit.raw),
            PropertyKey::Computed(_) => None,
        }
    }

    pub fn span(&self) -> &Span {
        match self {
            PropertyKey::Ident(ident) => &ident.span,
            PropertyKey::String(lit) => &lit.span,
            PropertyKey::Number(lit) => &lit.span,
            PropertyKey::Computed(expr) => expr.span(),
        }
    }
}

/// Array expression: [1, 2, 3]
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayExpr {
    pub elements: Vec<Expr>,
    pub span: Span,
}

impl ArrayExpr {
    pub fn new(elements: Vec<Expr>, span: Span) -> Self {
        Self { elements, span }
    }
}

/// Member expression: obj.prop, obj[expr] or obj?.prop
#[derive(Debug, Clone, PartialEq)]
pub struct MemberExpr {
    pub object: Expr,
    pub property: MemberProperty,
    pub optional: bool,
    pub span: Span,
}

impl MemberExpr {
    pub fn new(object: Expr, property: MemberProperty, span: Span) -> Self {
        Self {
            object,
            property,
            optional: false,
            span,
        }
    }

    /// Name of a static property (`obj.name`)
    pub fn property_ident(&self) -> Option<&str> {
        match &self.property {
            MemberProperty::Ident(ident) => Some(&ident.name),
            MemberProperty::Computed(_) => None,
        }
    }

    /// Name of a static property or a string-literal computed one (`obj['name']`)
    pub fn property_name(&self) -> Option<&str> {
        match &self.property {
            MemberProperty::Ident(ident) => Some(&ident.name),
            MemberProperty::Computed(Expr::String(lit)) => Some(&lit.value),
            MemberProperty::Computed(_) => None,
        }
    }
}

/// Member property (static or computed)
#[derive(Debug, Clone, PartialEq)]
pub enum MemberProperty {
    /// Static: obj.prop
    Ident(Ident),
    /// Computed: obj[expr]
    Computed(Expr),
}

/// Call expression: fn(arg1, arg2, ...)
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub callee: Expr,
    pub arguments: Vec<Expr>,
    pub optional: bool,
    pub span: Span,
}

impl CallExpr {
    pub fn new(callee: Expr, arguments: Vec<Expr>, span: Span) -> Self {
        Self {
            callee,
            arguments,
            optional: false,
            span,
        }
    }

    /// The only argument of a one-argument call
    pub fn single_argument(&self) -> Option<&Expr> {
        match self.arguments.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }
}

/// New expression: new Ctor(arg1, arg2, ...)
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpr {
    pub callee: Expr,
    pub arguments: Vec<Expr>,
    pub span: Span,
}

impl NewExpr {
    pub fn new(callee: Expr, arguments: Vec<Expr>, span: Span) -> Self {
        Self {
            callee,
            arguments,
            span,
        }
    }
}

/// Unary expression: -x, +x, !x
#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub operator: UnaryOperator,
    pub argument: Expr,
    pub span: Span,
}

impl UnaryExpr {
    pub fn new(operator: UnaryOperator, argument: Expr, span: Span) -> Self {
        Self {
            operator,
            argument,
            span,
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    /// Negation: -x
    Minus,
    /// Plus: +x
    Plus,
    /// Logical NOT: !x
    Not,
    /// Bitwise NOT: ~x
    BitNot,
    Typeof,
    Void,
    Delete,
    Await,
}

impl UnaryOperator {
    pub fn from_token(text: &str) -> Option<Self> {
        match text {
            "-" => Some(UnaryOperator::Minus),
            "+" => Some(UnaryOperator::Plus),
            "!" => Some(UnaryOperator::Not),
            "~" => Some(UnaryOperator::BitNot),
            "typeof" => Some(UnaryOperator::Typeof),
            "void" => Some(UnaryOperator::Void),
            "delete" => Some(UnaryOperator::Delete),
            "await" => Some(UnaryOperator::Await),
            _ => None,
        }
    }
}

/// Update expression: x++ or --x
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateExpr {
    /// `"++"` or `"--"`
    pub operator: &'static str,
    pub prefix: bool,
    pub argument: Expr,
    pub span: Span,
}

/// Binary or logical expression
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    /// Operator text, e.g. `"+"`, `"==="`, `"&&"`, `"instanceof"`
    pub operator: String,
    pub left: Expr,
    pub right: Expr,
    pub span: Span,
}

/// Assignment expression
#[derive(Debug, Clone, PartialEq)]
pub struct AssignExpr {
    /// `"="`, `"+="`, ...
    pub operator: &'static str,
    pub target: Expr,
    pub value: Expr,
    pub span: Span,
}

/// Conditional expression: test ? consequent : alternate
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalExpr {
    pub test: Expr,
    pub consequent: Expr,
    pub alternate: Expr,
    pub span: Span,
}

/// Arrow function: (params) => body
#[derive(Debug, Clone, PartialEq)]
pub struct ArrowFunction {
    pub params: Vec<Ident>,
    pub body: ArrowBody,
    pub is_async: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrowBody {
    Expr(Expr),
    Block(BlockStmt),
}

/// Spread element: ...expr
#[derive(Debug, Clone, PartialEq)]
pub struct SpreadElement {
    pub argument: Expr,
    pub span: Span,
}

/// Comma sequence: a, b
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceExpr {
    pub expressions: Vec<Expr>,
    pub span: Span,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str, span: Span) -> Expr {
        Expr::Ident(Ident::new(name, span))
    }

    #[test]
    fn test_expr_span_and_ident() {
        let expr = ident("db", 0..2);
        assert_eq!(expr.span(), &(0..2));
        assert!(expr.is_ident("db"));
        assert_eq!(Expr::Null(3..7).as_ident(), None);
    }

    #[test]
    fn test_property_key_names() {
        let key = PropertyKey::Ident(Ident::new("name", 0..4));
        assert_eq!(key.as_ident(), Some("name"));
        assert_eq!(key.static_name(), Some("name"));

        let key = PropertyKey::String(StringLit {
            value: "$match".to_string(),
            span: 0..8,
        });
        assert_eq!(key.as_ident(), None);
        assert_eq!(key.static_name(), Some("$match"));

        let key = PropertyKey::Computed(Box::new(ident("k", 1..2)));
        assert_eq!(key.static_name(), None);
    }

    #[test]
    fn test_member_property_name() {
        let member = MemberExpr::new(
            ident("db", 0..2),
            MemberProperty::Computed(Expr::String(StringLit {
                value: "users".to_string(),
                span: 3..10,
            })),
            0..11,
        );
        assert_eq!(member.property_ident(), None);
        assert_eq!(member.property_name(), Some("users"));
    }

    #[test]
    fn test_call_single_argument() {
        let call = CallExpr::new(ident("use", 0..3), vec![ident("x", 4..5)], 0..6);
        assert!(call.single_argument().is_some());

        let call = CallExpr::new(ident("use", 0..3), vec![], 0..5);
        assert!(call.single_argument().is_none());
    }

    #[test]
    fn test_template_single_quasi() {
        let template = TemplateLit {
            quasis: vec![TemplateElement {
                raw: "test".to_string(),
                span: 1..5,
            }],
            expressions: vec![],
            span: 0..6,
        };
        assert_eq!(template.single_quasi(), Some("test"));
    }

    #[test]
    fn test_object_props_skip_spread() {
        let obj = ObjectExpr::new(
            vec![
                ObjectMember::Spread(SpreadElement {
                    argument: ident("base", 4..8),
                    span: 1..8,
                }),
                ObjectMember::Property(Property::new(
                    PropertyKey::Ident(Ident::new("a", 10..11)),
                    Expr::Number(NumberLit {
                        raw: "1".to_string(),
                        value: 1.0,
                        span: 13..14,
                    }),
                    10..14,
                )),
            ],
            0..15,
        );
        assert_eq!(obj.props().count(), 1);
    }
}
