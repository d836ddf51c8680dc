use crate::error::Span;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Keywords
    Let,
    If,
    Else,
    While,
    And,
    Or,
    Not,
    Func,
    Return,
    Export,

    // Literals
    Ident,
    Number,
    String,

    // Operators
    Equal,
    NotEq,
    Lt,
    Gt,
    Lte,
    Gte,
    Arrow,
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    Plus,
    Minus,
    Star,
    Slash,

    // Punctuation
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Dot,
    Semicolon,

    Comment,
    Eof,
}

impl TokenKind {
    pub fn is_assign_op(self) -> bool {
        matches!(
            self,
            TokenKind::Assign
                | TokenKind::PlusAssign
                | TokenKind::MinusAssign
                | TokenKind::StarAssign
                | TokenKind::SlashAssign
        )
    }
}

/// Pre-parsed payload of NUMBER and STRING tokens.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    Str(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub literal: Option<Literal>,
    pub span: Span,
    pub line: usize,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: String, span: Span, line: usize) -> Self {
        Self {
            kind,
            lexeme,
            literal: None,
            span,
            line,
        }
    }
}

/// Scans source text into tokens. Scanning is total: characters that start
/// no token are dropped, and unterminated strings or comments simply run to
/// the end of input.
pub struct Lexer {
    source: Vec<char>,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: usize,
    keywords: HashMap<&'static str, TokenKind>,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        let mut keywords = HashMap::new();
        keywords.insert("let", TokenKind::Let);
        keywords.insert("if", TokenKind::If);
        keywords.insert("else", TokenKind::Else);
        keywords.insert("while", TokenKind::While);
        keywords.insert("and", TokenKind::And);
        keywords.insert("or", TokenKind::Or);
        keywords.insert("not", TokenKind::Not);
        keywords.insert("func", TokenKind::Func);
        keywords.insert("return", TokenKind::Return);
        keywords.insert("export", TokenKind::Export);

        Self {
            source: source.chars().collect(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
            keywords,
        }
    }

    pub fn scan_tokens(mut self) -> Vec<Token> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token();
        }

        self.tokens.push(Token::new(
            TokenKind::Eof,
            String::new(),
            Span::single(self.current),
            self.line,
        ));

        tracing::debug!(tokens = self.tokens.len(), lines = self.line, "lexed source");
        self.tokens
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn scan_token(&mut self) {
        let c = self.advance();

        match c {
            '(' => self.add_token(TokenKind::LeftParen),
            ')' => self.add_token(TokenKind::RightParen),
            '{' => self.add_token(TokenKind::LeftBrace),
            '}' => self.add_token(TokenKind::RightBrace),
            '[' => self.add_token(TokenKind::LeftBracket),
            ']' => self.add_token(TokenKind::RightBracket),
            ',' => self.add_token(TokenKind::Comma),
            '.' => self.add_token(TokenKind::Dot),
            ';' => self.add_token(TokenKind::Semicolon),
            '=' => {
                let kind = if self.match_char('=') {
                    TokenKind::Equal
                } else if self.match_char('>') {
                    TokenKind::Arrow
                } else {
                    TokenKind::Assign
                };
                self.add_token(kind);
            }
            '!' => {
                if self.match_char('=') {
                    self.add_token(TokenKind::NotEq);
                } else {
                    tracing::trace!(line = self.line, "dropping lone '!'");
                }
            }
            '<' => {
                let kind = if self.match_char('=') { TokenKind::Lte } else { TokenKind::Lt };
                self.add_token(kind);
            }
            '>' => {
                let kind = if self.match_char('=') { TokenKind::Gte } else { TokenKind::Gt };
                self.add_token(kind);
            }
            '+' => {
                let kind = if self.match_char('=') { TokenKind::PlusAssign } else { TokenKind::Plus };
                self.add_token(kind);
            }
            '-' => {
                let kind = if self.match_char('=') { TokenKind::MinusAssign } else { TokenKind::Minus };
                self.add_token(kind);
            }
            '*' => {
                let kind = if self.match_char('=') { TokenKind::StarAssign } else { TokenKind::Star };
                self.add_token(kind);
            }
            '/' => {
                let kind = if self.match_char('=') { TokenKind::SlashAssign } else { TokenKind::Slash };
                self.add_token(kind);
            }
            '#' => self.comment(),
            ' ' | '\r' | '\t' | '\n' => {}
            '"' | '\'' => self.string(c),
            c if c.is_ascii_digit() => self.number(),
            c if c.is_ascii_alphabetic() => self.identifier(),
            c => {
                tracing::trace!(line = self.line, character = ?c, "skipping unrecognized character");
            }
        }
    }

    fn advance(&mut self) -> char {
        let c = self.source.get(self.current).copied().unwrap_or('\0');
        self.current += 1;
        if c == '\n' {
            self.line += 1;
        }
        c
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.peek() != expected {
            false
        } else {
            self.advance();
            true
        }
    }

    fn peek(&self) -> char {
        self.source.get(self.current).copied().unwrap_or('\0')
    }

    fn peek_next(&self) -> char {
        self.source.get(self.current + 1).copied().unwrap_or('\0')
    }

    /// `# ... #`. The text between the markers becomes the lexeme.
    fn comment(&mut self) {
        let line = self.line;
        let mut text = String::new();
        while !self.is_at_end() {
            let c = self.advance();
            if c == '#' {
                break;
            }
            text.push(c);
        }
        self.tokens.push(Token::new(
            TokenKind::Comment,
            text,
            Span::new(self.start, self.current),
            line,
        ));
    }

    fn string(&mut self, quote: char) {
        let line = self.line;
        let mut raw = String::new();
        let mut value = String::new();

        while !self.is_at_end() && self.peek() != quote {
            let c = self.advance();
            if c == '\\' && !self.is_at_end() {
                let escaped = self.advance();
                raw.push(c);
                raw.push(escaped);
                match escaped {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    '"' | '\'' | '\\' => value.push(escaped),
                    other => {
                        value.push('\\');
                        value.push(other);
                    }
                }
                continue;
            }
            raw.push(c);
            value.push(c);
        }

        // Closing quote, if there is one.
        if !self.is_at_end() {
            self.advance();
        }

        let mut token = Token::new(TokenKind::String, raw, Span::new(self.start, self.current), line);
        token.literal = Some(Literal::Str(value));
        self.tokens.push(token);
    }

    fn number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        // A dot only belongs to the number when a digit follows it.
        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let text: String = self.source[self.start..self.current].iter().collect();
        // A run of ASCII digits with at most one inner dot always parses.
        let value = text.parse::<f64>().unwrap_or(f64::NAN);

        let mut token = Token::new(
            TokenKind::Number,
            text,
            Span::new(self.start, self.current),
            self.line,
        );
        token.literal = Some(Literal::Number(value));
        self.tokens.push(token);
    }

    fn identifier(&mut self) {
        while self.peek().is_ascii_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let text: String = self.source[self.start..self.current].iter().collect();
        let kind = self
            .keywords
            .get(text.as_str())
            .copied()
            .unwrap_or(TokenKind::Ident);

        self.tokens.push(Token::new(
            kind,
            text,
            Span::new(self.start, self.current),
            self.line,
        ));
    }

    fn add_token(&mut self, kind: TokenKind) {
        let text: String = self.source[self.start..self.current].iter().collect();
        self.tokens.push(Token::new(
            kind,
            text,
            Span::new(self.start, self.current),
            self.line,
        ));
    }
}

/// Convenience entry point: scan `source` into a token vector.
pub fn lex(source: &str) -> Vec<Token> {
    Lexer::new(source).scan_tokens()
}
