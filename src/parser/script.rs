//! Playground script parser
//!
//! Recursive-descent parser for the script subset used in MongoDB
//! playgrounds. It parses a whole module-level script and either returns a
//! complete [`Program`] or fails with a [`ParseError`]; there are no partial
//! trees.
//!
//! Statement termination follows automatic semicolon insertion: a statement
//! ends at `;`, before `}`, at end of input, or before a token that starts a
//! new line.
//!
//! Nesting depth and chain length are bounded; input past either bound fails
//! with a syntax error.

use super::ast::*;
use super::lexer::{Lexer, MAX_NESTING_DEPTH, TemplateToken, Token, TokenKind};

/// Longest run of member, call and binary links open at once
const MAX_CHAIN_LINKS: usize = 512;
use super::position::{LineIndex, Span};
use crate::error::{ParseError, Result};

/// Words that cannot start an expression or be used as a binding
const RESERVED: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "do", "else",
    "export", "extends", "finally", "for", "if", "import", "return", "switch", "throw", "try",
    "var", "while", "with",
];

const ASSIGNMENT_OPERATORS: &[&str] = &[
    "=", "+=", "-=", "*=", "/=", "%=", "**=", "<<=", ">>=", ">>>=", "&=", "|=", "^=", "&&=",
    "||=", "??=",
];

/// Playground script parser
pub struct ScriptParser<'a> {
    source: &'a [char],
    tokens: Vec<Token>,
    pos: usize,
    /// Open statements and expressions on the recursion stack
    depth: usize,
    /// Open member, call and binary links; each one deepens the tree
    links: usize,
}

impl<'a> ScriptParser<'a> {
    /// Create a parser over already tokenized input
    fn from_tokens(source: &'a [char], tokens: Vec<Token>) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
            depth: 0,
            links: 0,
        }
    }

    /// Parse the input as a module-level script
    pub fn parse(input: &str) -> Result<Program> {
        let source: Vec<char> = input.chars().collect();
        let tokens = Lexer::tokenize(&source);
        let mut parser = ScriptParser::from_tokens(&source, tokens);

        let mut body = Vec::new();
        while !parser.at_eof() {
            body.push(parser.parse_statement()?);
        }

        Ok(Program {
            body,
            span: 0..source.len(),
            line_index: LineIndex::new(input),
        })
    }

    /* ========================= Statements ========================= */

    fn parse_statement(&mut self) -> Result<Stmt> {
        self.nested(Self::parse_statement_kind)
    }

    fn parse_statement_kind(&mut self) -> Result<Stmt> {
        let start = self.current_pos();

        if self.match_token(&TokenKind::Semicolon) {
            return Ok(Stmt::Empty(start..self.previous_pos()));
        }
        if self.check(&TokenKind::LBrace) {
            return Ok(Stmt::Block(self.parse_block()?));
        }

        let keyword = self.current().and_then(Token::ident).map(str::to_string);
        match keyword.as_deref() {
            Some(word) => match word {
                "const" | "let" | "var" => {
                    let decl = self.parse_var_decl()?;
                    self.consume_semicolon()?;
                    Ok(Stmt::Var(VarDecl {
                        span: start..self.previous_pos(),
                        ..decl
                    }))
                }
                "function" => {
                    self.advance();
                    Ok(Stmt::Function(Box::new(self.parse_function(start, false)?)))
                }
                "async" if self.peek_is_ident("function") => {
                    self.pos += 2;
                    Ok(Stmt::Function(Box::new(self.parse_function(start, true)?)))
                }
                "return" => self.parse_return(start),
                "if" => self.parse_if(start),
                "while" => self.parse_while(start),
                "for" => self.parse_for(start),
                _ => self.parse_expression_statement(start),
            },
            None => self.parse_expression_statement(start),
        }
    }

    fn parse_expression_statement(&mut self, start: usize) -> Result<Stmt> {
        let expression = self.parse_expression()?;
        self.consume_semicolon()?;
        Ok(Stmt::Expr(ExprStmt {
            expression,
            span: start..self.previous_pos(),
        }))
    }

    /// Parse `const|let|var` declarators, without the terminating semicolon
    fn parse_var_decl(&mut self) -> Result<VarDecl> {
        let start = self.current_pos();
        let keyword = self.expect_identifier("Expected declaration keyword")?;
        let kind = VarKind::from_keyword(&keyword)
            .ok_or_else(|| ParseError::SyntaxError(format!("Unknown declaration: {keyword}")))?;

        let mut declarations = Vec::new();
        loop {
            let decl_start = self.current_pos();
            let id = self.expect_binding()?;
            let init = if self.match_operator("=") {
                Some(self.parse_assignment()?)
            } else {
                None
            };
            declarations.push(VarDeclarator {
                id,
                init,
                span: decl_start..self.previous_pos(),
            });

            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }

        Ok(VarDecl {
            kind,
            declarations,
            span: start..self.previous_pos(),
        })
    }

    /// Parse a function after the `function` keyword
    fn parse_function(&mut self, start: usize, is_async: bool) -> Result<Function> {
        // Generators are parsed like plain functions
        self.match_operator("*");

        let id = if self.check(&TokenKind::LParen) {
            None
        } else {
            Some(self.expect_binding()?)
        };

        self.expect_token(&TokenKind::LParen, "(")?;
        let params = self.parse_params()?;
        let body = self.parse_block()?;

        Ok(Function {
            id,
            params,
            body,
            is_async,
            span: start..self.previous_pos(),
        })
    }

    /// Parse a parameter list up to and including `)`
    fn parse_params(&mut self) -> Result<Vec<Ident>> {
        let mut params = Vec::new();

        while !self.check(&TokenKind::RParen) {
            // Rest parameter
            self.match_token(&TokenKind::Ellipsis);
            params.push(self.expect_binding()?);

            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }

        self.expect_token(&TokenKind::RParen, ")")?;
        Ok(params)
    }

    fn parse_block(&mut self) -> Result<BlockStmt> {
        let start = self.current_pos();
        self.expect_token(&TokenKind::LBrace, "{")?;

        let mut body = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            if self.at_eof() {
                return Err(ParseError::UnexpectedEof.into());
            }
            body.push(self.parse_statement()?);
        }

        self.expect_token(&TokenKind::RBrace, "}")?;
        Ok(BlockStmt {
            body,
            span: start..self.previous_pos(),
        })
    }

    fn parse_return(&mut self, start: usize) -> Result<Stmt> {
        self.advance();

        let argument = if self.at_statement_end() {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume_semicolon()?;

        Ok(Stmt::Return(ReturnStmt {
            argument,
            span: start..self.previous_pos(),
        }))
    }

    fn parse_if(&mut self, start: usize) -> Result<Stmt> {
        self.advance();
        let test = self.parse_parenthesized()?;
        let consequent = self.parse_statement()?;

        let alternate = if self.current().is_some_and(|t| t.is_ident("else")) {
            self.advance();
            Some(self.parse_statement()?)
        } else {
            None
        };

        Ok(Stmt::If(Box::new(IfStmt {
            test,
            consequent,
            alternate,
            span: start..self.previous_pos(),
        })))
    }

    fn parse_while(&mut self, start: usize) -> Result<Stmt> {
        self.advance();
        let test = self.parse_parenthesized()?;
        let body = self.parse_statement()?;

        Ok(Stmt::While(Box::new(WhileStmt {
            test,
            body,
            span: start..self.previous_pos(),
        })))
    }

    fn parse_for(&mut self, start: usize) -> Result<Stmt> {
        self.advance();
        self.expect_token(&TokenKind::LParen, "(")?;

        let init = if self.check(&TokenKind::Semicolon) {
            None
        } else if self
            .current()
            .and_then(Token::ident)
            .is_some_and(|w| VarKind::from_keyword(w).is_some())
        {
            Some(Stmt::Var(self.parse_var_decl()?))
        } else if self.current().and_then(Token::ident).is_some()
            && self.peek().is_some_and(|t| t.is_ident("of") || t.is_ident("in"))
        {
            let ident = self.expect_binding()?;
            let span = ident.span.clone();
            Some(Stmt::Expr(ExprStmt {
                expression: Expr::Ident(ident),
                span,
            }))
        } else {
            let expr_start = self.current_pos();
            let expression = self.parse_expression()?;
            Some(Stmt::Expr(ExprStmt {
                expression,
                span: expr_start..self.previous_pos(),
            }))
        };

        if let Some(left) = &init {
            let is_of = self.current().is_some_and(|t| t.is_ident("of"));
            let is_in = self.current().is_some_and(|t| t.is_ident("in"));
            if is_of || is_in {
                self.advance();
                let right = self.parse_assignment()?;
                self.expect_token(&TokenKind::RParen, ")")?;
                let body = self.parse_statement()?;
                return Ok(Stmt::ForInOf(Box::new(ForInOfStmt {
                    left: left.clone(),
                    right,
                    body,
                    is_of,
                    span: start..self.previous_pos(),
                })));
            }
        }

        self.expect_token(&TokenKind::Semicolon, ";")?;
        let test = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_token(&TokenKind::Semicolon, ";")?;
        let update = if self.check(&TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_token(&TokenKind::RParen, ")")?;
        let body = self.parse_statement()?;

        Ok(Stmt::For(Box::new(ForStmt {
            init,
            test,
            update,
            body,
            span: start..self.previous_pos(),
        })))
    }

    fn parse_parenthesized(&mut self) -> Result<Expr> {
        self.expect_token(&TokenKind::LParen, "(")?;
        let expr = self.parse_expression()?;
        self.expect_token(&TokenKind::RParen, ")")?;
        Ok(expr)
    }

    /// Accept an explicit or automatically inserted semicolon
    fn consume_semicolon(&mut self) -> Result<()> {
        if self.match_token(&TokenKind::Semicolon) || self.at_statement_end() {
            Ok(())
        } else {
            Err(self.unexpected(";"))
        }
    }

    fn at_statement_end(&self) -> bool {
        match self.current() {
            Some(token) => {
                token.newline_before
                    || matches!(
                        token.kind,
                        TokenKind::Semicolon | TokenKind::RBrace | TokenKind::EOF
                    )
            }
            None => true,
        }
    }

    /* ========================= Expressions ========================= */

    /// Parse an expression, including comma sequences
    fn parse_expression(&mut self) -> Result<Expr> {
        let start = self.current_pos();
        let first = self.parse_assignment()?;

        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }

        let mut expressions = vec![first];
        while self.match_token(&TokenKind::Comma) {
            expressions.push(self.parse_assignment()?);
        }

        Ok(Expr::Sequence(SequenceExpr {
            expressions,
            span: start..self.previous_pos(),
        }))
    }

    /// Parse assignment expression, arrow function or conditional
    fn parse_assignment(&mut self) -> Result<Expr> {
        self.nested(Self::parse_assignment_kind)
    }

    fn parse_assignment_kind(&mut self) -> Result<Expr> {
        let start = self.current_pos();

        if let Some(arrow) = self.try_parse_arrow(start)? {
            return Ok(arrow);
        }

        let target = self.parse_conditional()?;

        if let Some(operator) = self.current_assignment_operator() {
            if !matches!(target, Expr::Ident(_) | Expr::Member(_)) {
                return Err(
                    ParseError::SyntaxError("Invalid assignment target".to_string()).into(),
                );
            }
            self.advance();
            let value = self.parse_assignment()?;
            return Ok(Expr::Assign(Box::new(AssignExpr {
                operator,
                target,
                value,
                span: start..self.previous_pos(),
            })));
        }

        Ok(target)
    }

    /// Parse an arrow function if one starts at the current token
    fn try_parse_arrow(&mut self, start: usize) -> Result<Option<Expr>> {
        let is_async = self.current().is_some_and(|t| t.is_ident("async"))
            && self.peek().is_some_and(|t| !t.newline_before)
            && self.arrow_starts_at(self.pos + 1);

        if !is_async && !self.arrow_starts_at(self.pos) {
            return Ok(None);
        }
        if is_async {
            self.advance();
        }

        let params = if self.match_token(&TokenKind::LParen) {
            self.parse_params()?
        } else {
            vec![self.expect_binding()?]
        };

        self.expect_token(&TokenKind::Arrow, "=>")?;

        let body = if self.check(&TokenKind::LBrace) {
            ArrowBody::Block(self.parse_block()?)
        } else {
            ArrowBody::Expr(self.parse_assignment()?)
        };

        Ok(Some(Expr::Arrow(Box::new(ArrowFunction {
            params,
            body,
            is_async,
            span: start..self.previous_pos(),
        }))))
    }

    /// Whether the tokens at `index` are `ident =>` or `( ... ) =>`
    fn arrow_starts_at(&self, index: usize) -> bool {
        let Some(token) = self.tokens.get(index) else {
            return false;
        };

        let after = match &token.kind {
            TokenKind::Ident(name) if !RESERVED.contains(&name.as_str()) => index + 1,
            TokenKind::LParen => match self.matching_paren(index) {
                Some(close) => close + 1,
                None => return false,
            },
            _ => return false,
        };

        self.tokens
            .get(after)
            .is_some_and(|t| matches!(t.kind, TokenKind::Arrow) && !t.newline_before)
    }

    /// Index of the `)` matching the `(` at `open`
    fn matching_paren(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (index, token) in self.tokens.iter().enumerate().skip(open) {
            match token.kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(index);
                    }
                }
                TokenKind::EOF => return None,
                _ => {}
            }
        }
        None
    }

    fn parse_conditional(&mut self) -> Result<Expr> {
        let start = self.current_pos();
        let test = self.parse_binary(0)?;

        if !self.match_token(&TokenKind::Question) {
            return Ok(test);
        }

        let consequent = self.parse_assignment()?;
        self.expect_token(&TokenKind::Colon, ":")?;
        let alternate = self.parse_assignment()?;

        Ok(Expr::Conditional(Box::new(ConditionalExpr {
            test,
            consequent,
            alternate,
            span: start..self.previous_pos(),
        })))
    }

    /// Precedence climbing over binary and logical operators
    fn parse_binary(&mut self, min_precedence: u8) -> Result<Expr> {
        let start = self.current_pos();
        let mut left = self.parse_unary()?;
        let links = self.links;

        while let Some((precedence, operator)) = self.current_binary_operator() {
            if precedence < min_precedence {
                break;
            }
            self.advance();
            self.link()?;

            // Exponentiation is right-associative
            let next_min = if operator == "**" {
                precedence
            } else {
                precedence + 1
            };
            let right = self.nested(|parser| parser.parse_binary(next_min))?;

            left = Expr::Binary(Box::new(BinaryExpr {
                operator,
                left,
                right,
                span: start..self.previous_pos(),
            }));
        }

        self.links = links;
        Ok(left)
    }

    fn current_binary_operator(&self) -> Option<(u8, String)> {
        let token = self.current()?;
        let op = match &token.kind {
            TokenKind::Operator(op) => *op,
            TokenKind::Ident(word) if word == "instanceof" || word == "in" => word.as_str(),
            _ => return None,
        };

        let precedence = match op {
            "??" => 1,
            "||" => 2,
            "&&" => 3,
            "|" => 4,
            "^" => 5,
            "&" => 6,
            "==" | "!=" | "===" | "!==" => 7,
            "<" | ">" | "<=" | ">=" | "instanceof" | "in" => 8,
            "<<" | ">>" | ">>>" => 9,
            "+" | "-" => 10,
            "*" | "/" | "%" => 11,
            "**" => 12,
            _ => return None,
        };

        Some((precedence, op.to_string()))
    }

    fn current_assignment_operator(&self) -> Option<&'static str> {
        match self.current()?.kind {
            TokenKind::Operator(op) if ASSIGNMENT_OPERATORS.contains(&op) => Some(op),
            _ => None,
        }
    }

    /// Parse unary expression: -x, +x, !x, typeof x, ++x, x++
    fn parse_unary(&mut self) -> Result<Expr> {
        let start = self.current_pos();

        let operator = match self.current().map(|t| &t.kind) {
            Some(TokenKind::Operator(op)) => UnaryOperator::from_token(op),
            Some(TokenKind::Ident(word)) if word != "await" || !self.peek_ends_operand() => {
                match word.as_str() {
                    "typeof" | "void" | "delete" | "await" => UnaryOperator::from_token(word),
                    _ => None,
                }
            }
            _ => None,
        };

        if let Some(operator) = operator {
            self.advance();
            let argument = self.nested(Self::parse_unary)?;
            let end = self.previous_pos();
            return Ok(Expr::Unary(Box::new(UnaryExpr::new(
                operator,
                argument,
                start..end,
            ))));
        }

        if let Some(op) = self.match_update_operator() {
            let argument = self.nested(Self::parse_unary)?;
            return Ok(Expr::Update(Box::new(UpdateExpr {
                operator: op,
                prefix: true,
                argument,
                span: start..self.previous_pos(),
            })));
        }

        let expr = self.parse_member_or_call()?;

        if self.current().is_some_and(|t| !t.newline_before) {
            if let Some(op) = self.match_update_operator() {
                return Ok(Expr::Update(Box::new(UpdateExpr {
                    operator: op,
                    prefix: false,
                    argument: expr,
                    span: start..self.previous_pos(),
                })));
            }
        }

        Ok(expr)
    }

    /// `await` used as a plain identifier (`await;`, `await)`)
    fn peek_ends_operand(&self) -> bool {
        self.peek().is_none_or(|t| {
            matches!(
                t.kind,
                TokenKind::Semicolon
                    | TokenKind::RParen
                    | TokenKind::RBracket
                    | TokenKind::RBrace
                    | TokenKind::Comma
                    | TokenKind::Dot
                    | TokenKind::EOF
            )
        })
    }

    fn match_update_operator(&mut self) -> Option<&'static str> {
        match self.current()?.kind {
            TokenKind::Operator(op @ ("++" | "--")) => {
                self.advance();
                Some(op)
            }
            _ => None,
        }
    }

    /// Parse member expression, call expression, or new expression
    fn parse_member_or_call(&mut self) -> Result<Expr> {
        let start = self.current_pos();

        // Check for 'new' keyword
        let mut expr = if self.current().is_some_and(|t| t.is_ident("new")) {
            self.advance();
            self.parse_new_expression(start)?
        } else {
            self.parse_primary()?
        };

        // Handle member access and function calls
        let links = self.links;
        loop {
            if self.match_token(&TokenKind::Dot) {
                // Member access: obj.prop
                self.link()?;
                let property = self.expect_property_name()?;
                let end = self.previous_pos();
                expr = Expr::Member(Box::new(MemberExpr::new(
                    expr,
                    MemberProperty::Ident(property),
                    start..end,
                )));
            } else if self.match_token(&TokenKind::QuestionDot) {
                // Optional chaining: obj?.prop, obj?.[expr], fn?.(args)
                self.link()?;
                if self.match_token(&TokenKind::LParen) {
                    let arguments = self.parse_arguments()?;
                    let end = self.previous_pos();
                    let mut call = CallExpr::new(expr, arguments, start..end);
                    call.optional = true;
                    expr = Expr::Call(Box::new(call));
                } else {
                    let property = if self.match_token(&TokenKind::LBracket) {
                        let property = self.parse_expression()?;
                        self.expect_token(&TokenKind::RBracket, "]")?;
                        MemberProperty::Computed(property)
                    } else {
                        MemberProperty::Ident(self.expect_property_name()?)
                    };
                    let end = self.previous_pos();
                    let mut member = MemberExpr::new(expr, property, start..end);
                    member.optional = true;
                    expr = Expr::Member(Box::new(member));
                }
            } else if self.match_token(&TokenKind::LBracket) {
                // Computed member access: obj[expr]
                self.link()?;
                let property = self.parse_expression()?;
                self.expect_token(&TokenKind::RBracket, "]")?;
                let end = self.previous_pos();
                expr = Expr::Member(Box::new(MemberExpr::new(
                    expr,
                    MemberProperty::Computed(property),
                    start..end,
                )));
            } else if self.match_token(&TokenKind::LParen) {
                // Function call: fn(args)
                self.link()?;
                let arguments = self.parse_arguments()?;
                let end = self.previous_pos();
                expr = Expr::Call(Box::new(CallExpr::new(expr, arguments, start..end)));
            } else {
                break;
            }
        }

        self.links = links;
        Ok(expr)
    }

    /// Parse new expression: new Ctor(args)
    fn parse_new_expression(&mut self, start: usize) -> Result<Expr> {
        let callee_start = self.current_pos();
        let mut callee = if self.current().is_some_and(|t| t.is_ident("new")) {
            self.advance();
            self.nested(|parser| parser.parse_new_expression(callee_start))?
        } else {
            self.parse_primary()?
        };

        // Member chain of the constructor: new a.b.C()
        let links = self.links;
        loop {
            if self.match_token(&TokenKind::Dot) {
                self.link()?;
                let property = self.expect_property_name()?;
                let end = self.previous_pos();
                callee = Expr::Member(Box::new(MemberExpr::new(
                    callee,
                    MemberProperty::Ident(property),
                    callee_start..end,
                )));
            } else if self.match_token(&TokenKind::LBracket) {
                self.link()?;
                let property = self.parse_expression()?;
                self.expect_token(&TokenKind::RBracket, "]")?;
                let end = self.previous_pos();
                callee = Expr::Member(Box::new(MemberExpr::new(
                    callee,
                    MemberProperty::Computed(property),
                    callee_start..end,
                )));
            } else {
                break;
            }
        }
        self.links = links;

        // Parse arguments if present
        let arguments = if self.match_token(&TokenKind::LParen) {
            self.parse_arguments()?
        } else {
            vec![]
        };

        let end = self.previous_pos();
        Ok(Expr::New(Box::new(NewExpr::new(
            callee,
            arguments,
            start..end,
        ))))
    }

    /// Parse function arguments up to and including `)`
    fn parse_arguments(&mut self) -> Result<Vec<Expr>> {
        let mut arguments = Vec::new();

        while !self.check(&TokenKind::RParen) {
            arguments.push(self.parse_element()?);

            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }

        self.expect_token(&TokenKind::RParen, ")")?;
        Ok(arguments)
    }

    /// Argument or array element, possibly spread
    fn parse_element(&mut self) -> Result<Expr> {
        let start = self.current_pos();
        if self.match_token(&TokenKind::Ellipsis) {
            let argument = self.parse_assignment()?;
            return Ok(Expr::Spread(Box::new(SpreadElement {
                argument,
                span: start..self.previous_pos(),
            })));
        }
        self.parse_assignment()
    }

    /// Parse primary expression (literals, identifiers, objects, arrays)
    fn parse_primary(&mut self) -> Result<Expr> {
        let start = self.current_pos();

        let Some(token) = self.current() else {
            return Err(ParseError::UnexpectedEof.into());
        };

        match &token.kind {
            // String literal
            TokenKind::String(value) => {
                let value = value.clone();
                self.advance();
                Ok(Expr::String(StringLit {
                    value,
                    span: start..self.previous_pos(),
                }))
            }
            // Number literal
            TokenKind::Number(raw) => {
                let raw = raw.clone();
                let value = parse_number_value(&raw)?;
                self.advance();
                Ok(Expr::Number(NumberLit {
                    raw,
                    value,
                    span: start..self.previous_pos(),
                }))
            }
            TokenKind::Template(template) => {
                let template = template.clone();
                self.advance();
                let span = start..self.previous_pos();
                self.parse_template(template, span)
            }
            TokenKind::Regex { pattern, flags } => {
                let (pattern, flags) = (pattern.clone(), flags.clone());
                self.advance();
                Ok(Expr::Regex(RegexLit {
                    pattern,
                    flags,
                    span: start..self.previous_pos(),
                }))
            }
            // Identifier or keyword
            TokenKind::Ident(name) => {
                let name = name.clone();

                match name.as_str() {
                    "function" => {
                        self.advance();
                        let function = self.parse_function(start, false)?;
                        return Ok(Expr::Function(Box::new(function)));
                    }
                    "async" if self.peek_is_ident("function") => {
                        self.pos += 2;
                        let function = self.parse_function(start, true)?;
                        return Ok(Expr::Function(Box::new(function)));
                    }
                    word if RESERVED.contains(&word) => return Err(self.unexpected("expression")),
                    _ => {}
                }

                self.advance();
                let span = start..self.previous_pos();

                // Check for special identifiers
                Ok(match name.as_str() {
                    "true" => Expr::Boolean(true, span),
                    "false" => Expr::Boolean(false, span),
                    "null" => Expr::Null(span),
                    "this" => Expr::This(span),
                    _ => Expr::Ident(Ident::new(name, span)),
                })
            }
            // Object literal: { ... }
            TokenKind::LBrace => self.parse_object(start),
            // Array literal: [ ... ]
            TokenKind::LBracket => self.parse_array(start),
            // Parenthesized expression: ( expr )
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect_token(&TokenKind::RParen, ")")?;
                Ok(expr)
            }
            TokenKind::Invalid(message) => Err(ParseError::SyntaxError(message.clone()).into()),
            TokenKind::EOF => Err(ParseError::UnexpectedEof.into()),
            _ => Err(self.unexpected("expression")),
        }
    }

    /// Parse the substitutions of a template literal
    fn parse_template(&mut self, template: TemplateToken, span: Span) -> Result<Expr> {
        let mut expressions = Vec::with_capacity(template.expressions.len());

        for range in template.expressions {
            let tokens = Lexer::tokenize_range(self.source, range);
            let mut parser = ScriptParser::from_tokens(self.source, tokens);
            parser.depth = self.depth;
            parser.links = self.links;
            let expr = parser.parse_expression()?;
            if !parser.at_eof() {
                return Err(parser.unexpected("}"));
            }
            expressions.push(expr);
        }

        let quasis = template
            .quasis
            .into_iter()
            .map(|quasi| TemplateElement {
                raw: quasi.raw,
                span: quasi.span,
            })
            .collect();

        Ok(Expr::Template(TemplateLit {
            quasis,
            expressions,
            span,
        }))
    }

    /// Parse object literal: { key: value, ... }
    fn parse_object(&mut self, start: usize) -> Result<Expr> {
        self.expect_token(&TokenKind::LBrace, "{")?;

        let mut properties = Vec::new();

        while !self.check(&TokenKind::RBrace) {
            properties.push(self.parse_object_member()?);

            // Check for comma or end of object
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }

        self.expect_token(&TokenKind::RBrace, "}")?;
        let end = self.previous_pos();

        Ok(Expr::Object(ObjectExpr::new(properties, start..end)))
    }

    fn parse_object_member(&mut self) -> Result<ObjectMember> {
        let prop_start = self.current_pos();

        if self.match_token(&TokenKind::Ellipsis) {
            let argument = self.parse_assignment()?;
            return Ok(ObjectMember::Spread(SpreadElement {
                argument,
                span: prop_start..self.previous_pos(),
            }));
        }

        // Parse property key
        let key = self.parse_property_key()?;

        // Method shorthand: { name() { ... } }
        if self.match_token(&TokenKind::LParen) {
            let params = self.parse_params()?;
            let body = self.parse_block()?;
            let value = Expr::Function(Box::new(Function {
                id: None,
                params,
                body,
                is_async: false,
                span: key.span().start..self.previous_pos(),
            }));
            return Ok(ObjectMember::Property(Property::new(
                key,
                value,
                prop_start..self.previous_pos(),
            )));
        }

        // Shorthand: { name }
        if self.check(&TokenKind::Comma) || self.check(&TokenKind::RBrace) {
            let PropertyKey::Ident(ident) = &key else {
                return Err(self.unexpected(":"));
            };
            if RESERVED.contains(&ident.name.as_str()) {
                return Err(ParseError::SyntaxError(format!(
                    "Unexpected keyword in shorthand property: {}",
                    ident.name
                ))
                .into());
            }
            let value = Expr::Ident(ident.clone());
            let mut prop = Property::new(key, value, prop_start..self.previous_pos());
            prop.shorthand = true;
            return Ok(ObjectMember::Property(prop));
        }

        self.expect_token(&TokenKind::Colon, ":")?;

        // Parse property value
        let value = self.parse_assignment()?;

        Ok(ObjectMember::Property(Property::new(
            key,
            value,
            prop_start..self.previous_pos(),
        )))
    }

    /// Parse property key (identifier, string, number or computed)
    fn parse_property_key(&mut self) -> Result<PropertyKey> {
        let start = self.current_pos();

        let Some(token) = self.current() else {
            return Err(ParseError::UnexpectedEof.into());
        };

        let key = match &token.kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                PropertyKey::Ident(Ident::new(name, start..self.previous_pos()))
            }
            TokenKind::String(value) => {
                let value = value.clone();
                self.advance();
                PropertyKey::String(StringLit {
                    value,
                    span: start..self.previous_pos(),
                })
            }
            TokenKind::Number(raw) => {
                let raw = raw.clone();
                let value = parse_number_value(&raw)?;
                self.advance();
                PropertyKey::Number(NumberLit {
                    raw,
                    value,
                    span: start..self.previous_pos(),
                })
            }
            TokenKind::LBracket => {
                self.advance();
                let expr = self.parse_assignment()?;
                self.expect_token(&TokenKind::RBracket, "]")?;
                PropertyKey::Computed(Box::new(expr))
            }
            TokenKind::EOF => return Err(ParseError::UnexpectedEof.into()),
            _ => return Err(self.unexpected("property key")),
        };

        Ok(key)
    }

    /// Parse array literal: [elem1, elem2, ...]
    fn parse_array(&mut self, start: usize) -> Result<Expr> {
        self.expect_token(&TokenKind::LBracket, "[")?;

        let mut elements = Vec::new();

        while !self.check(&TokenKind::RBracket) {
            elements.push(self.parse_element()?);

            // Check for comma or end of array
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }

        self.expect_token(&TokenKind::RBracket, "]")?;
        let end = self.previous_pos();

        Ok(Expr::Array(ArrayExpr::new(elements, start..end)))
    }

    /// Run a nested parse, failing once nesting exceeds [`MAX_NESTING_DEPTH`]
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ParseError::SyntaxError("Nesting too deep".to_string()).into());
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Account for one more link in the current chain
    fn link(&mut self) -> Result<()> {
        if self.links >= MAX_CHAIN_LINKS {
            return Err(ParseError::SyntaxError("Expression chain too long".to_string()).into());
        }
        self.links += 1;
        Ok(())
    }

    /* ========================= Token helpers ========================= */

    /// Get current token
    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    /// Token after the current one
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos + 1)
    }

    fn peek_is_ident(&self, name: &str) -> bool {
        self.peek().is_some_and(|t| t.is_ident(name))
    }

    fn at_eof(&self) -> bool {
        self.current()
            .is_none_or(|t| matches!(t.kind, TokenKind::EOF))
    }

    /// Check if current token matches the given kind
    fn check(&self, kind: &TokenKind) -> bool {
        if let Some(token) = self.current() {
            std::mem::discriminant(&token.kind) == std::mem::discriminant(kind)
        } else {
            false
        }
    }

    /// Match and consume token if it matches the given kind
    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_operator(&mut self, op: &str) -> bool {
        if matches!(self.current().map(|t| &t.kind), Some(TokenKind::Operator(o)) if *o == op) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Advance to next token
    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    /// Expect a specific token kind
    fn expect_token(&mut self, kind: &TokenKind, expected: &str) -> Result<()> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    /// Expect an identifier and return its name
    fn expect_identifier(&mut self, message: &str) -> Result<String> {
        match self.current() {
            Some(Token {
                kind: TokenKind::Ident(name),
                ..
            }) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(ParseError::SyntaxError(message.to_string()).into()),
        }
    }

    /// Expect a binding identifier (not a reserved word)
    fn expect_binding(&mut self) -> Result<Ident> {
        let start = self.current_pos();
        match self.current().and_then(Token::ident) {
            Some(name) if !RESERVED.contains(&name) => {
                let name = name.to_string();
                self.advance();
                Ok(Ident::new(name, start..self.previous_pos()))
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    /// Property name after `.`; keywords are allowed here
    fn expect_property_name(&mut self) -> Result<Ident> {
        let start = self.current_pos();
        match self.current().and_then(Token::ident) {
            Some(name) => {
                let name = name.to_string();
                self.advance();
                Ok(Ident::new(name, start..self.previous_pos()))
            }
            None => Err(self.unexpected("property name")),
        }
    }

    /// Build an error describing the current token
    fn unexpected(&self, expected: &str) -> crate::error::LangError {
        match self.current().map(|t| &t.kind) {
            None | Some(TokenKind::EOF) => ParseError::UnexpectedEof.into(),
            Some(TokenKind::Invalid(message)) => ParseError::SyntaxError(message.clone()).into(),
            Some(kind) => ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: describe(kind),
            }
            .into(),
        }
    }

    /// Get current position
    fn current_pos(&self) -> usize {
        if let Some(token) = self.current() {
            token.span.start
        } else if let Some(last) = self.tokens.last() {
            last.span.end
        } else {
            0
        }
    }

    /// Get previous position
    fn previous_pos(&self) -> usize {
        if self.pos > 0 {
            if let Some(token) = self.tokens.get(self.pos - 1) {
                return token.span.end;
            }
        }
        0
    }
}

/// Short human-readable form of a token for error messages
fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Ident(name) => name.clone(),
        TokenKind::String(value) => format!("'{value}'"),
        TokenKind::Number(raw) => raw.clone(),
        TokenKind::Template(_) => "template literal".to_string(),
        TokenKind::Regex { pattern, flags } => format!("/{pattern}/{flags}"),
        TokenKind::Dot => ".".to_string(),
        TokenKind::QuestionDot => "?.".to_string(),
        TokenKind::Ellipsis => "...".to_string(),
        TokenKind::LParen => "(".to_string(),
        TokenKind::RParen => ")".to_string(),
        TokenKind::LBrace => "{".to_string(),
        TokenKind::RBrace => "}".to_string(),
        TokenKind::LBracket => "[".to_string(),
        TokenKind::RBracket => "]".to_string(),
        TokenKind::Comma => ",".to_string(),
        TokenKind::Colon => ":".to_string(),
        TokenKind::Semicolon => ";".to_string(),
        TokenKind::Question => "?".to_string(),
        TokenKind::Arrow => "=>".to_string(),
        TokenKind::Operator(op) => op.to_string(),
        TokenKind::Invalid(message) => message.clone(),
        TokenKind::EOF => "end of input".to_string(),
        TokenKind::Unknown(ch) => ch.to_string(),
    }
}

/// Numeric value of a number literal as written in source
fn parse_number_value(raw: &str) -> Result<f64> {
    let cleaned = raw.replace('_', "");
    let cleaned = cleaned.strip_suffix('n').unwrap_or(&cleaned);

    let radix = match cleaned.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };

    let value = match radix {
        Some(radix) => u64::from_str_radix(&cleaned[2..], radix).map(|v| v as f64).ok(),
        None => cleaned.parse::<f64>().ok(),
    };

    value.ok_or_else(|| ParseError::InvalidNumber(raw.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LangError;

    fn parse(input: &str) -> Program {
        ScriptParser::parse(input).unwrap()
    }

    fn first_expr(input: &str) -> Expr {
        match parse(input).body.into_iter().next() {
            Some(Stmt::Expr(stmt)) => stmt.expression,
            other => panic!("Expected expression statement, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_empty_program() {
        assert!(parse("").body.is_empty());
        assert!(parse("  // only a comment\n").body.is_empty());
    }

    #[test]
    fn test_parse_use_call() {
        match first_expr("use('test');") {
            Expr::Call(call) => {
                assert!(call.callee.is_ident("use"));
                assert!(matches!(call.single_argument(), Some(Expr::String(s)) if s.value == "test"));
            }
            other => panic!("Expected call expression, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_chained_call() {
        match first_expr("db.users.find().limit(10)") {
            Expr::Call(outer_call) => match &outer_call.callee {
                Expr::Member(member) => {
                    assert_eq!(member.property_ident(), Some("limit"));
                    assert!(matches!(member.object, Expr::Call(_)));
                }
                other => panic!("Expected member expression in callee, got {other:?}"),
            },
            other => panic!("Expected call expression, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_statements_without_semicolons() {
        let program = parse("use('a')\ndb.users.find()\nconst x = 1");
        assert_eq!(program.body.len(), 3);
        assert!(matches!(program.body[2], Stmt::Var(_)));
    }

    #[test]
    fn test_missing_separator_on_same_line_fails() {
        assert!(ScriptParser::parse("use('a') db.users.find()").is_err());
    }

    #[test]
    fn test_parse_aggregation_pipeline() {
        let expr = first_expr("db.orders.aggregate([{ $match: { status: 'A' } }, { $group: { _id: '$cust' } }])");
        let Expr::Call(call) = expr else {
            panic!("Expected call expression");
        };
        let Some(Expr::Array(pipeline)) = call.single_argument() else {
            panic!("Expected pipeline array");
        };
        assert_eq!(pipeline.elements.len(), 2);
        let Expr::Object(stage) = &pipeline.elements[0] else {
            panic!("Expected stage object");
        };
        let prop = stage.props().next().unwrap();
        assert_eq!(prop.key.as_ident(), Some("$match"));
        assert!(matches!(prop.value, Expr::Object(_)));
    }

    #[test]
    fn test_parse_shorthand_property() {
        let Expr::Object(obj) = first_expr("({ name, 'quoted': 1, [key]: 2, ...rest })") else {
            panic!("Expected object expression");
        };
        assert_eq!(obj.properties.len(), 4);
        let first = obj.props().next().unwrap();
        assert!(first.shorthand);
        assert!(first.value.is_ident("name"));
    }

    #[test]
    fn test_block_versus_object_at_statement_start() {
        let program = parse("{ const a = 1 }");
        assert!(matches!(program.body[0], Stmt::Block(_)));
    }

    #[test]
    fn test_parse_arrow_functions() {
        let program = parse("db.users.find().forEach(doc => printjson(doc));\nconst f = async (a, b) => { return a + b };");
        assert_eq!(program.body.len(), 2);

        let Stmt::Var(decl) = &program.body[1] else {
            panic!("Expected declaration");
        };
        match &decl.declarations[0].init {
            Some(Expr::Arrow(arrow)) => {
                assert!(arrow.is_async);
                assert_eq!(arrow.params.len(), 2);
                assert!(matches!(arrow.body, ArrowBody::Block(_)));
            }
            other => panic!("Expected arrow, got {other:?}"),
        }
    }

    #[test]
    fn test_parenthesized_expression_is_not_arrow() {
        assert!(matches!(first_expr("(a + b) * c"), Expr::Binary(_)));
    }

    #[test]
    fn test_binary_precedence() {
        let Expr::Binary(bin) = first_expr("a + b * c") else {
            panic!("Expected binary expression");
        };
        assert_eq!(bin.operator, "+");
        assert!(matches!(&bin.right, Expr::Binary(r) if r.operator == "*"));
    }

    #[test]
    fn test_parse_template_literal() {
        let Expr::Template(template) = first_expr("`hello ${user.name}!`") else {
            panic!("Expected template");
        };
        assert_eq!(template.quasis.len(), 2);
        assert_eq!(template.expressions.len(), 1);
        assert!(matches!(template.expressions[0], Expr::Member(_)));
        assert_eq!(template.span, 0..21);
    }

    #[test]
    fn test_parse_control_flow() {
        let program = parse(
            "for (let i = 0; i < 3; i++) { print(i) }\n\
             for (const doc of docs) printjson(doc)\n\
             while (cursor.hasNext()) { cursor.next() }\n\
             if (x) { y() } else z()\n\
             function f(a, ...rest) { return a }",
        );
        assert!(matches!(program.body[0], Stmt::For(_)));
        assert!(matches!(&program.body[1], Stmt::ForInOf(f) if f.is_of));
        assert!(matches!(program.body[2], Stmt::While(_)));
        assert!(matches!(&program.body[3], Stmt::If(s) if s.alternate.is_some()));
        assert!(matches!(program.body[4], Stmt::Function(_)));
    }

    #[test]
    fn test_parse_new_and_regex() {
        let program = parse("db.c.find({ at: new Date('2024-01-01'), name: /^a/i });");
        assert_eq!(program.body.len(), 1);
    }

    #[test]
    fn test_keywords_as_property_names() {
        match first_expr("db.coll.delete.new") {
            Expr::Member(member) => assert_eq!(member.property_ident(), Some("new")),
            other => panic!("Expected member, got {other:?}"),
        }
    }

    #[test]
    fn test_incomplete_input_fails() {
        assert!(ScriptParser::parse("db.").is_err());
        assert!(ScriptParser::parse("db.users.find({").is_err());
        assert!(ScriptParser::parse("use('test").is_err());
        assert!(ScriptParser::parse("const = 5").is_err());
    }

    #[test]
    fn test_unexpected_token_error() {
        let err = ScriptParser::parse("db.users.find(})").unwrap_err();
        assert!(matches!(
            err,
            LangError::Parse(ParseError::UnexpectedToken { ref found, .. }) if found == "}"
        ));
    }

    #[test]
    fn test_spans_cover_source() {
        let program = parse("use('a');\ndb.users.find()");
        assert_eq!(program.body[0].span(), &(0..9));
        assert_eq!(program.body[1].span(), &(10..25));
        let loc = program.location(program.body[1].span());
        assert_eq!((loc.start.line, loc.start.column), (2, 0));
        assert_eq!((loc.end.line, loc.end.column), (2, 15));
    }

    #[test]
    fn test_number_values() {
        assert_eq!(parse_number_value("0xff").unwrap(), 255.0);
        assert_eq!(parse_number_value("1_000").unwrap(), 1000.0);
        assert_eq!(parse_number_value("10n").unwrap(), 10.0);
        assert_eq!(parse_number_value(".5").unwrap(), 0.5);
        assert!(parse_number_value("0x").is_err());
    }

    fn syntax_error(input: &str) -> String {
        match ScriptParser::parse(input) {
            Err(LangError::Parse(ParseError::SyntaxError(message))) => message,
            other => panic!("Expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn test_deep_nesting_fails_without_overflow() {
        let depth = 10_000;
        let inputs = [
            format!("db.c.find({}{})", "[".repeat(depth), "]".repeat(depth)),
            format!("x = {}1{}", "{ a: ".repeat(depth), " }".repeat(depth)),
            format!("{}1{}", "(".repeat(depth), ")".repeat(depth)),
            format!("{}{}", "{".repeat(depth), "}".repeat(depth)),
            format!("{}x", "!".repeat(depth)),
            format!("f = {}1", "() => ".repeat(depth)),
            format!("x = 2{}", " ** 2".repeat(depth)),
        ];
        for input in &inputs {
            assert_eq!(syntax_error(input), "Nesting too deep");
        }
    }

    #[test]
    fn test_long_chains_fail_without_overflow() {
        let depth = 10_000;
        assert_eq!(
            syntax_error(&format!("db{}", ".c".repeat(depth))),
            "Expression chain too long"
        );
        assert_eq!(
            syntax_error(&format!("x = 1{}", " + 1".repeat(depth))),
            "Expression chain too long"
        );
    }

    #[test]
    fn test_moderate_nesting_parses() {
        let nested = format!("db.c.find({}{})", "[".repeat(30), "]".repeat(30));
        assert!(ScriptParser::parse(&nested).is_ok());

        let sum = format!("x = 1{}", " + 1".repeat(200));
        assert!(ScriptParser::parse(&sum).is_ok());

        let chain = format!("db.c.find(){}", ".limit(1)".repeat(100));
        assert!(ScriptParser::parse(&chain).is_ok());
    }
}
