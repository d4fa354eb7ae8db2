//! Error-tolerant lexer for playground scripts
//!
//! Handles the JavaScript subset written in MongoDB playgrounds:
//! `use('db')`, `db.collection.find({...})`, aggregation pipelines, variable
//! declarations and arrow callbacks.
//!
//! # Design Principles
//!
//! - **Never panic** - always return a valid token stream
//! - **Never reject input** - malformed literals become `Invalid` tokens and
//!   stray characters become `Unknown` tokens; the parser decides what fails
//! - **Marker aware** - the trigger marker is identifier material wherever it
//!   is spliced in
//! - **Absolute spans** - every span is a char offset into the full source,
//!   also for tokens inside template substitutions

use super::position::Span;
use crate::trigger::TRIGGER_CHARACTER;

/// Token types for playground scripts
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Identifier or keyword (`db`, `use`, `const`, `$match`, ...)
    Ident(String),
    /// String literal with escapes resolved
    String(String),
    /// Number literal as written
    Number(String),
    /// Template literal
    Template(TemplateToken),
    /// Regular expression literal: /pattern/flags
    Regex { pattern: String, flags: String },
    /// Dot separator
    Dot,
    /// Optional chaining: ?.
    QuestionDot,
    /// Spread: ...
    Ellipsis,
    /// Left parenthesis
    LParen,
    /// Right parenthesis
    RParen,
    /// Left brace
    LBrace,
    /// Right brace
    RBrace,
    /// Left bracket
    LBracket,
    /// Right bracket
    RBracket,
    /// Comma
    Comma,
    /// Colon
    Colon,
    /// Semicolon
    Semicolon,
    /// Conditional operator: ?
    Question,
    /// Arrow: =>
    Arrow,
    /// Operators, including assignment operators
    Operator(&'static str),
    /// Malformed literal (unterminated string, template, comment, ...)
    Invalid(String),
    /// End of file
    EOF,
    /// Unknown character
    Unknown(char),
}

/// Raw pieces of a template literal
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateToken {
    /// Raw text between substitutions
    pub quasis: Vec<TemplateQuasi>,
    /// Source spans of the `${...}` expressions (without the delimiters)
    pub expressions: Vec<Span>,
}

/// One raw text chunk of a template literal
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateQuasi {
    pub raw: String,
    pub span: Span,
}

/// Token with position information
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// A line break occurs between the previous token and this one
    pub newline_before: bool,
}

impl Token {
    /// Create a new token
    pub fn new(kind: TokenKind, span: Span, newline_before: bool) -> Self {
        Self {
            kind,
            span,
            newline_before,
        }
    }

    /// Identifier text, if this is an identifier token
    pub fn ident(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_ident(&self, name: &str) -> bool {
        self.ident() == Some(name)
    }
}

// Longest operators first so that maximal munch holds
const OPERATORS: &[&str] = &[
    ">>>=", "===", "!==", "**=", "<<=", ">>=", ">>>", "&&=", "||=", "??=", "==", "!=", "<=",
    ">=", "&&", "||", "??", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "++", "--", "**",
    "<<", ">>", "=", "<", ">", "+", "-", "*", "/", "%", "!", "~", "&", "|", "^",
];

// Keywords after which a `/` starts a regular expression
const REGEX_PRECEDING_KEYWORDS: &[&str] = &[
    "return",
    "typeof",
    "instanceof",
    "in",
    "of",
    "new",
    "delete",
    "void",
    "throw",
    "case",
    "do",
    "else",
    "await",
    "yield",
];

/// Deepest nesting of statements, expressions or template literals accepted
pub const MAX_NESTING_DEPTH: usize = 48;

/// Playground script lexer - error-tolerant tokenizer
pub struct Lexer<'a> {
    input: &'a [char],
    pos: usize,
    end: usize,
    marker: Vec<char>,
    /// Whether a `/` at the current point would start a regex
    regex_allowed: bool,
    /// Templates currently open inside substitutions
    template_depth: usize,
}

impl<'a> Lexer<'a> {
    /// Create a lexer over `input[range]`; spans stay absolute
    pub fn new(input: &'a [char], range: Span) -> Self {
        let end = range.end.min(input.len());
        Self {
            input,
            pos: range.start.min(end),
            end,
            marker: TRIGGER_CHARACTER.chars().collect(),
            regex_allowed: true,
            template_depth: 0,
        }
    }

    /// Tokenize the whole input
    pub fn tokenize(input: &'a [char]) -> Vec<Token> {
        Self::tokenize_range(input, 0..input.len())
    }

    /// Tokenize a sub-range of the input, e.g. a template substitution
    pub fn tokenize_range(input: &'a [char], range: Span) -> Vec<Token> {
        let mut lexer = Self::new(input, range);
        let mut tokens = Vec::new();

        loop {
            let token = lexer.next_token();
            let is_eof = matches!(token.kind, TokenKind::EOF);
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        tokens
    }

    /// Get the next token
    fn next_token(&mut self) -> Token {
        let newline_before = match self.skip_trivia() {
            Ok(newline) => newline,
            Err(start) => {
                return Token::new(
                    TokenKind::Invalid("Unterminated comment".to_string()),
                    start..self.pos,
                    false,
                );
            }
        };

        let start = self.pos;

        if self.is_at_end() {
            return Token::new(TokenKind::EOF, start..start, newline_before);
        }

        let kind = self.scan_kind(start);
        self.regex_allowed = Self::allows_regex_after(&kind);
        Token::new(kind, start..self.pos, newline_before)
    }

    fn scan_kind(&mut self, start: usize) -> TokenKind {
        if self.at_marker() {
            return self.scan_identifier();
        }

        let ch = self.current_char();
        match ch {
            '.' if self.peek_char().is_ascii_digit() => self.scan_number(),
            '.' if self.peek_char() == '.' && self.char_at(self.pos + 2) == '.' => {
                self.pos += 3;
                TokenKind::Ellipsis
            }
            '.' => self.single(TokenKind::Dot),
            '?' if self.peek_char() == '.' && !self.char_at(self.pos + 2).is_ascii_digit() => {
                self.pos += 2;
                TokenKind::QuestionDot
            }
            '?' if self.peek_char() == '?' => self.scan_operator(),
            '?' => self.single(TokenKind::Question),
            '=' if self.peek_char() == '>' => {
                self.pos += 2;
                TokenKind::Arrow
            }
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            '{' => self.single(TokenKind::LBrace),
            '}' => self.single(TokenKind::RBrace),
            '[' => self.single(TokenKind::LBracket),
            ']' => self.single(TokenKind::RBracket),
            ',' => self.single(TokenKind::Comma),
            ':' => self.single(TokenKind::Colon),
            ';' => self.single(TokenKind::Semicolon),
            '\'' | '"' => self.scan_string(ch),
            '`' => self.scan_template(start),
            '/' if self.regex_allowed => self.scan_regex(),
            '0'..='9' => self.scan_number(),
            c if Self::is_ident_start(c) => self.scan_identifier(),
            _ => match self.scan_operator() {
                TokenKind::Unknown(_) => self.single(TokenKind::Unknown(ch)),
                op => op,
            },
        }
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    /// Scan a string literal
    fn scan_string(&mut self, quote: char) -> TokenKind {
        self.advance(); // Skip opening quote

        let mut value = String::new();

        loop {
            if self.is_at_end() || self.current_char() == '\n' {
                return TokenKind::Invalid("Unterminated string literal".to_string());
            }
            let ch = self.current_char();
            if ch == quote {
                self.advance();
                return TokenKind::String(value);
            }
            if ch == '\\' {
                self.advance();
                if self.is_at_end() {
                    return TokenKind::Invalid("Unterminated string literal".to_string());
                }
                // Handle escape sequences
                match self.current_char() {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    'r' => value.push('\r'),
                    '0' => value.push('\0'),
                    '\\' => value.push('\\'),
                    '\'' => value.push('\''),
                    '"' => value.push('"'),
                    '\n' => {}
                    ch => value.push(ch),
                }
            } else {
                value.push(ch);
            }
            self.advance();
        }
    }

    /// Scan a template literal, recording substitution spans
    fn scan_template(&mut self, start: usize) -> TokenKind {
        self.advance(); // Skip opening backtick

        let mut quasis = Vec::new();
        let mut expressions = Vec::new();
        let mut raw = String::new();
        let mut quasi_start = self.pos;

        loop {
            if self.is_at_end() {
                return TokenKind::Invalid(format!(
                    "Unterminated template literal at offset {start}"
                ));
            }
            match self.current_char() {
                '`' => {
                    quasis.push(TemplateQuasi {
                        raw,
                        span: quasi_start..self.pos,
                    });
                    self.advance();
                    return TokenKind::Template(TemplateToken {
                        quasis,
                        expressions,
                    });
                }
                '\\' => {
                    raw.push('\\');
                    self.advance();
                    if !self.is_at_end() {
                        raw.push(self.current_char());
                        self.advance();
                    }
                }
                '$' if self.peek_char() == '{' => {
                    quasis.push(TemplateQuasi {
                        raw: std::mem::take(&mut raw),
                        span: quasi_start..self.pos,
                    });
                    self.pos += 2;
                    let expr_start = self.pos;
                    if !self.skip_balanced_braces() {
                        return TokenKind::Invalid("Unterminated template substitution".to_string());
                    }
                    // skip_balanced_braces stops on the closing brace
                    expressions.push(expr_start..self.pos);
                    self.advance();
                    quasi_start = self.pos;
                }
                ch => {
                    raw.push(ch);
                    self.advance();
                }
            }
        }
    }

    /// Advance to the `}` closing the current substitution
    fn skip_balanced_braces(&mut self) -> bool {
        let mut depth = 1usize;
        while !self.is_at_end() {
            match self.current_char() {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return true;
                    }
                }
                quote @ ('\'' | '"') => {
                    if matches!(self.scan_string(quote), TokenKind::Invalid(_)) {
                        return false;
                    }
                    continue;
                }
                '`' => {
                    if self.template_depth >= MAX_NESTING_DEPTH {
                        return false;
                    }
                    let start = self.pos;
                    self.template_depth += 1;
                    let nested = self.scan_template(start);
                    self.template_depth -= 1;
                    if matches!(nested, TokenKind::Invalid(_)) {
                        return false;
                    }
                    continue;
                }
                _ => {}
            }
            self.advance();
        }
        false
    }

    /// Scan a regular expression literal
    fn scan_regex(&mut self) -> TokenKind {
        self.advance(); // Skip opening slash

        let mut pattern = String::new();
        let mut in_class = false;

        loop {
            if self.is_at_end() || self.current_char() == '\n' {
                return TokenKind::Invalid("Unterminated regular expression".to_string());
            }
            let ch = self.current_char();
            match ch {
                '\\' => {
                    pattern.push(ch);
                    self.advance();
                    if !self.is_at_end() {
                        pattern.push(self.current_char());
                    }
                }
                '[' => {
                    in_class = true;
                    pattern.push(ch);
                }
                ']' => {
                    in_class = false;
                    pattern.push(ch);
                }
                '/' if !in_class => {
                    self.advance();
                    break;
                }
                _ => pattern.push(ch),
            }
            self.advance();
        }

        let mut flags = String::new();
        while !self.is_at_end() && self.current_char().is_ascii_alphabetic() {
            flags.push(self.current_char());
            self.advance();
        }

        TokenKind::Regex { pattern, flags }
    }

    /// Scan a number (decimal, exponent, hex/octal/binary, bigint)
    fn scan_number(&mut self) -> TokenKind {
        let mut value = String::new();

        if self.current_char() == '0' && matches!(self.peek_char(), 'x' | 'X' | 'o' | 'O' | 'b' | 'B')
        {
            value.push(self.current_char());
            self.advance();
            value.push(self.current_char());
            self.advance();
            while !self.is_at_end()
                && (self.current_char().is_ascii_hexdigit() || self.current_char() == '_')
            {
                value.push(self.current_char());
                self.advance();
            }
        } else {
            self.push_digits(&mut value);

            // Handle decimal point
            if self.current_char() == '.' {
                value.push('.');
                self.advance();
                self.push_digits(&mut value);
            }

            // Handle exponent
            if matches!(self.current_char(), 'e' | 'E') {
                let next = self.peek_char();
                let signed = matches!(next, '+' | '-') && self.char_at(self.pos + 2).is_ascii_digit();
                if next.is_ascii_digit() || signed {
                    value.push(self.current_char());
                    self.advance();
                    if signed {
                        value.push(self.current_char());
                        self.advance();
                    }
                    self.push_digits(&mut value);
                }
            }
        }

        // BigInt suffix
        if self.current_char() == 'n' {
            value.push('n');
            self.advance();
        }

        if !self.is_at_end() && Self::is_ident_start(self.current_char()) {
            let start = self.pos;
            while !self.is_at_end() && Self::is_ident_part(self.current_char()) {
                self.advance();
            }
            let suffix: String = self.input[start..self.pos].iter().collect();
            return TokenKind::Invalid(format!("Identifier directly after number: {value}{suffix}"));
        }

        TokenKind::Number(value)
    }

    fn push_digits(&mut self, value: &mut String) {
        while !self.is_at_end()
            && (self.current_char().is_ascii_digit() || self.current_char() == '_')
        {
            value.push(self.current_char());
            self.advance();
        }
    }

    /// Scan an identifier or keyword, absorbing any trigger marker
    fn scan_identifier(&mut self) -> TokenKind {
        let mut value = String::new();

        while !self.is_at_end() {
            if self.at_marker() {
                value.push_str(TRIGGER_CHARACTER);
                self.pos += self.marker.len();
                continue;
            }
            let ch = self.current_char();
            if Self::is_ident_part(ch) {
                value.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        TokenKind::Ident(value)
    }

    /// Scan the longest operator at the current position
    fn scan_operator(&mut self) -> TokenKind {
        for op in OPERATORS {
            let len = op.chars().count();
            if self.pos + len <= self.end
                && op
                    .chars()
                    .zip(&self.input[self.pos..self.pos + len])
                    .all(|(a, b)| a == *b)
            {
                self.pos += len;
                return TokenKind::Operator(op);
            }
        }
        TokenKind::Unknown(self.current_char())
    }

    /// Skip whitespace and comments; reports whether a newline was crossed
    ///
    /// Returns the comment start on an unterminated block comment.
    fn skip_trivia(&mut self) -> std::result::Result<bool, usize> {
        let mut newline = false;
        while !self.is_at_end() {
            let ch = self.current_char();
            if ch == '\n' {
                newline = true;
                self.advance();
            } else if ch.is_whitespace() {
                self.advance();
            } else if ch == '/' && self.peek_char() == '/' {
                while !self.is_at_end() && self.current_char() != '\n' {
                    self.advance();
                }
            } else if ch == '/' && self.peek_char() == '*' {
                let start = self.pos;
                self.pos += 2;
                loop {
                    if self.is_at_end() {
                        return Err(start);
                    }
                    if self.current_char() == '*' && self.peek_char() == '/' {
                        self.pos += 2;
                        break;
                    }
                    if self.current_char() == '\n' {
                        newline = true;
                    }
                    self.advance();
                }
            } else {
                break;
            }
        }
        Ok(newline)
    }

    fn allows_regex_after(kind: &TokenKind) -> bool {
        match kind {
            TokenKind::Ident(name) => REGEX_PRECEDING_KEYWORDS.contains(&name.as_str()),
            TokenKind::String(_)
            | TokenKind::Number(_)
            | TokenKind::Template(_)
            | TokenKind::Regex { .. }
            | TokenKind::RParen
            | TokenKind::RBracket
            | TokenKind::RBrace => false,
            TokenKind::Operator(op) => !matches!(*op, "++" | "--"),
            _ => true,
        }
    }

    fn is_ident_start(ch: char) -> bool {
        ch.is_alphabetic() || ch == '_' || ch == '$'
    }

    fn is_ident_part(ch: char) -> bool {
        ch.is_alphanumeric() || ch == '_' || ch == '$'
    }

    fn at_marker(&self) -> bool {
        let len = self.marker.len();
        self.pos + len <= self.end && self.input[self.pos..self.pos + len] == self.marker[..]
    }

    /// Get current character
    fn current_char(&self) -> char {
        self.char_at(self.pos)
    }

    /// Peek at next character
    fn peek_char(&self) -> char {
        self.char_at(self.pos + 1)
    }

    fn char_at(&self, index: usize) -> char {
        if index >= self.end {
            '\0'
        } else {
            self.input[index]
        }
    }

    /// Advance position
    fn advance(&mut self) {
        if !self.is_at_end() {
            self.pos += 1;
        }
    }

    /// Check if at end of input
    fn is_at_end(&self) -> bool {
        self.pos >= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        let chars: Vec<char> = input.chars().collect();
        Lexer::tokenize(&chars).into_iter().map(|t| t.kind).collect()
    }

    fn tokens(input: &str) -> Vec<Token> {
        let chars: Vec<char> = input.chars().collect();
        Lexer::tokenize(&chars)
    }

    #[test]
    fn test_tokenize_db_collection() {
        let kinds = kinds("db.users");
        assert_eq!(kinds.len(), 4); // db, ., users, EOF
        assert!(matches!(kinds[0], TokenKind::Ident(ref s) if s == "db"));
        assert!(matches!(kinds[1], TokenKind::Dot));
        assert!(matches!(kinds[2], TokenKind::Ident(ref s) if s == "users"));
        assert!(matches!(kinds[3], TokenKind::EOF));
    }

    #[test]
    fn test_tokenize_empty_input() {
        let kinds = kinds("");
        assert_eq!(kinds, vec![TokenKind::EOF]);
    }

    #[test]
    fn test_tokenize_with_dollar_sign() {
        let kinds = kinds("db.users.aggregate([{$match: {}}])");
        assert!(
            kinds
                .iter()
                .any(|k| matches!(k, TokenKind::Ident(s) if s == "$match"))
        );
    }

    #[test]
    fn test_marker_is_identifier_material() {
        let input = format!("db.us{TRIGGER_CHARACTER}ers");
        let kinds = kinds(&input);
        assert!(matches!(
            &kinds[2],
            TokenKind::Ident(s) if *s == format!("us{TRIGGER_CHARACTER}ers")
        ));
        assert_eq!(kinds.len(), 4);
    }

    #[test]
    fn test_marker_alone_is_identifier() {
        let input = format!("db.{TRIGGER_CHARACTER}");
        let tokens = tokens(&input);
        assert!(matches!(&tokens[2].kind, TokenKind::Ident(s) if s == TRIGGER_CHARACTER));
        assert_eq!(tokens[2].span, 3..3 + TRIGGER_CHARACTER.chars().count());
    }

    #[test]
    fn test_tokenize_strings_and_escapes() {
        let kinds = kinds(r#"'it\'s' "a\nb""#);
        assert_eq!(kinds[0], TokenKind::String("it's".to_string()));
        assert_eq!(kinds[1], TokenKind::String("a\nb".to_string()));
    }

    #[test]
    fn test_unterminated_string_is_invalid() {
        let kinds = kinds("use('test");
        assert!(kinds.iter().any(|k| matches!(k, TokenKind::Invalid(_))));
    }

    #[test]
    fn test_tokenize_numbers() {
        let kinds = kinds("42 3.14 .5 1e3 0xff 10n");
        assert_eq!(kinds[0], TokenKind::Number("42".to_string()));
        assert_eq!(kinds[1], TokenKind::Number("3.14".to_string()));
        assert_eq!(kinds[2], TokenKind::Number(".5".to_string()));
        assert_eq!(kinds[3], TokenKind::Number("1e3".to_string()));
        assert_eq!(kinds[4], TokenKind::Number("0xff".to_string()));
        assert_eq!(kinds[5], TokenKind::Number("10n".to_string()));
    }

    #[test]
    fn test_tokenize_template_literal() {
        let input = "`a${x}b`";
        let kinds = kinds(input);
        match &kinds[0] {
            TokenKind::Template(template) => {
                assert_eq!(template.quasis.len(), 2);
                assert_eq!(template.quasis[0].raw, "a");
                assert_eq!(template.quasis[1].raw, "b");
                assert_eq!(template.expressions, vec![4..5]);
            }
            other => panic!("Expected template, got {other:?}"),
        }
    }

    #[test]
    fn test_template_with_nested_braces() {
        let kinds = kinds("`${ {a: '}'}.a }`");
        match &kinds[0] {
            TokenKind::Template(template) => assert_eq!(template.expressions.len(), 1),
            other => panic!("Expected template, got {other:?}"),
        }
        assert_eq!(kinds[1], TokenKind::EOF);
    }

    #[test]
    fn test_regex_versus_division() {
        let kinds = kinds("x = /^ab[/]c/i; y = a / b");
        assert!(kinds.iter().any(|k| matches!(
            k,
            TokenKind::Regex { pattern, flags } if pattern == "^ab[/]c" && flags == "i"
        )));
        assert!(kinds.iter().any(|k| matches!(k, TokenKind::Operator("/"))));
    }

    #[test]
    fn test_operators_maximal_munch() {
        let kinds = kinds("a === b !== c && d ?? e?.f => ...g");
        assert!(kinds.contains(&TokenKind::Operator("===")));
        assert!(kinds.contains(&TokenKind::Operator("!==")));
        assert!(kinds.contains(&TokenKind::Operator("&&")));
        assert!(kinds.contains(&TokenKind::Operator("??")));
        assert!(kinds.contains(&TokenKind::QuestionDot));
        assert!(kinds.contains(&TokenKind::Arrow));
        assert!(kinds.contains(&TokenKind::Ellipsis));
    }

    #[test]
    fn test_comments_and_newlines() {
        let tokens = tokens("a // comment\n/* block\n */ b");
        assert!(tokens[0].is_ident("a"));
        assert!(tokens[1].is_ident("b"));
        assert!(tokens[1].newline_before);
        assert!(!tokens[0].newline_before);
    }

    #[test]
    fn test_unterminated_comment_is_invalid() {
        let kinds = kinds("a /* never closed");
        assert!(kinds.iter().any(|k| matches!(k, TokenKind::Invalid(_))));
    }

    #[test]
    fn test_tokenize_unknown_chars() {
        let kinds = kinds("db.users@");
        assert!(kinds.contains(&TokenKind::Unknown('@')));
    }

    #[test]
    fn test_tokenize_range_keeps_absolute_spans() {
        let chars: Vec<char> = "`${ab}`".chars().collect();
        let tokens = Lexer::tokenize_range(&chars, 3..5);
        assert!(tokens[0].is_ident("ab"));
        assert_eq!(tokens[0].span, 3..5);
    }

    #[test]
    fn test_deeply_nested_template_is_invalid() {
        let depth = 10_000;
        let input = format!("{}x{}", "`${".repeat(depth), "}`".repeat(depth));
        assert!(kinds(&input).iter().any(|k| matches!(k, TokenKind::Invalid(_))));

        let shallow = format!("{}x{}", "`${".repeat(5), "}`".repeat(5));
        assert!(!kinds(&shallow).iter().any(|k| matches!(k, TokenKind::Invalid(_))));
    }
}
