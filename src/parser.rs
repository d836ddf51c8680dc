use crate::ast::{AssignOp, BinaryOp, Expr, FunctionDecl, Program, Stmt, UnaryOp};
use crate::error::{ParseError, Span};
use crate::lexer::{Literal, Token, TokenKind};
use std::rc::Rc;

type ParseResult<T> = Result<T, ParseError>;

/// Recursive-descent parser with per-declaration error recovery.
///
/// A syntax error inside a declaration is recorded and the parser skips
/// ahead to the next statement boundary, so one pass can report every
/// independent mistake in a file.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    errors: Vec<ParseError>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        let mut tokens: Vec<Token> = tokens
            .into_iter()
            .filter(|t| t.kind != TokenKind::Comment)
            .collect();

        // Every cursor operation relies on a trailing EOF.
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let (end, line) = tokens
                .last()
                .map(|t| (t.span.end, t.line))
                .unwrap_or((0, 1));
            tokens.push(Token::new(TokenKind::Eof, String::new(), Span::single(end), line));
        }

        Self {
            tokens,
            current: 0,
            errors: Vec::new(),
        }
    }

    pub fn parse_program(mut self) -> (Program, Vec<ParseError>) {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        tracing::debug!(
            statements = statements.len(),
            errors = self.errors.len(),
            "parsed program"
        );
        (Program { statements }, self.errors)
    }

    fn declaration(&mut self) -> Option<Stmt> {
        let result = if self.match_kind(TokenKind::Func) {
            self.function_declaration()
        } else if self.match_kind(TokenKind::Let) {
            self.let_declaration()
        } else if self.match_kind(TokenKind::Export) {
            self.export_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) => Some(stmt),
            Err(error) => {
                tracing::debug!(message = %error.message, line = error.token.line, "syntax error");
                self.errors.push(error);
                self.synchronize();
                None
            }
        }
    }

    fn statement(&mut self) -> ParseResult<Stmt> {
        if self.check(TokenKind::RightBrace) {
            return Err(self
                .error_at_current("Unexpected '}' (unmatched closing brace).")
                .with_help("Found '}' without matching '{'. Check for unbalanced braces."));
        }

        if self.match_kind(TokenKind::If) {
            self.if_statement()
        } else if self.match_kind(TokenKind::While) {
            self.while_statement()
        } else if self.match_kind(TokenKind::Return) {
            self.return_statement()
        } else if self.match_kind(TokenKind::LeftBrace) {
            let start = self.previous().span;
            let statements = self.block()?;
            Ok(Stmt::Block {
                statements,
                span: start.to(self.previous().span),
            })
        } else {
            self.expression_or_assignment()
        }
    }

    fn let_declaration(&mut self) -> ParseResult<Stmt> {
        let start = self.previous().span;
        let name = self
            .consume(TokenKind::Ident, "Expected identifier after 'let'.")?
            .lexeme
            .clone();

        let initializer = if self.match_kind(TokenKind::Assign) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenKind::Semicolon, "Expected ';' after let declaration.")?;
        Ok(Stmt::Let {
            name,
            initializer,
            span: start.to(self.previous().span),
        })
    }

    fn function_declaration(&mut self) -> ParseResult<Stmt> {
        let start = self.previous().span;
        let name = self
            .consume(TokenKind::Ident, "Expected function name after 'func'.")?
            .lexeme
            .clone();

        self.consume(TokenKind::LeftParen, "Expected '(' after function name.")?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                params.push(
                    self.consume(TokenKind::Ident, "Expected parameter name.")?
                        .lexeme
                        .clone(),
                );
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expected ')' after parameters.")?;

        self.consume_with_help(
            TokenKind::LeftBrace,
            "Expected '{' before function body.",
            "Function bodies are blocks: func name(a, b) { ... }",
        )?;
        let body = self.block()?;

        Ok(Stmt::Function(Rc::new(FunctionDecl {
            name,
            params,
            body,
            span: start.to(self.previous().span),
        })))
    }

    fn export_declaration(&mut self) -> ParseResult<Stmt> {
        let start = self.previous().span;
        let name = self
            .consume(TokenKind::Ident, "Expected name after 'export'.")?
            .lexeme
            .clone();
        self.consume(TokenKind::Semicolon, "Expected ';' after export.")?;
        Ok(Stmt::Export {
            name,
            span: start.to(self.previous().span),
        })
    }

    fn return_statement(&mut self) -> ParseResult<Stmt> {
        let start = self.previous().span;
        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };

        self.consume(TokenKind::Semicolon, "Expected ';' after return.")?;
        Ok(Stmt::Return {
            value,
            span: start.to(self.previous().span),
        })
    }

    fn if_statement(&mut self) -> ParseResult<Stmt> {
        let start = self.previous().span;

        self.consume_with_help(
            TokenKind::LeftParen,
            "Expected '(' after 'if'.",
            "If statements require parentheses around the condition: if (condition) { ... }",
        )?;
        let condition = self.expression()?;
        self.consume_with_help(
            TokenKind::RightParen,
            "Expected ')' after condition.",
            "If conditions must be enclosed in parentheses: if (condition) { ... }",
        )?;

        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.match_kind(TokenKind::Else) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        let end = else_branch
            .as_ref()
            .map(|stmt| stmt.span())
            .unwrap_or_else(|| then_branch.span());

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
            span: start.to(end),
        })
    }

    fn while_statement(&mut self) -> ParseResult<Stmt> {
        let start = self.previous().span;

        self.consume(TokenKind::LeftParen, "Expected '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "Expected ')' after condition.")?;

        let body = Box::new(self.statement()?);
        let end = body.span();

        Ok(Stmt::While {
            condition,
            body,
            span: start.to(end),
        })
    }

    /// Parses declarations up to the closing brace. The opening brace has
    /// already been consumed.
    fn block(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut statements = Vec::new();

        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        self.consume_with_help(
            TokenKind::RightBrace,
            "Expected '}' after block.",
            "Block statements must be closed with '}' after the opening '{'.",
        )?;
        Ok(statements)
    }

    fn expression_or_assignment(&mut self) -> ParseResult<Stmt> {
        let start = self.peek().span;

        if self.check(TokenKind::Ident) && self.peek_next().kind.is_assign_op() {
            let name = self.advance().lexeme.clone();
            let op = match self.advance().kind {
                TokenKind::PlusAssign => AssignOp::PlusAssign,
                TokenKind::MinusAssign => AssignOp::MinusAssign,
                TokenKind::StarAssign => AssignOp::StarAssign,
                TokenKind::SlashAssign => AssignOp::SlashAssign,
                _ => AssignOp::Assign,
            };

            let value = self.expression()?;
            self.consume(TokenKind::Semicolon, "Expected ';' after assignment.")?;
            return Ok(Stmt::Assign {
                name,
                op,
                value,
                span: start.to(self.previous().span),
            });
        }

        let expr = self.expression()?;

        if self.check(TokenKind::LeftBrace) {
            if let Expr::Call { callee, .. } = &expr {
                if let Expr::Ident { name, .. } = callee.as_ref() {
                    return Err(self.error_at_current(format!(
                        "'{}' is not a valid keyword. Blocks only follow 'if', 'while', or 'func'.",
                        name
                    )));
                }
            }
            return Err(self.error_at_current("Unexpected '{' after expression."));
        }

        self.consume(TokenKind::Semicolon, "Expected ';' after expression.")?;
        Ok(Stmt::Expression {
            expr,
            span: start.to(self.previous().span),
        })
    }

    fn expression(&mut self) -> ParseResult<Expr> {
        self.or()
    }

    fn or(&mut self) -> ParseResult<Expr> {
        let mut expr = self.and()?;

        while self.match_kind(TokenKind::Or) {
            let right = self.and()?;
            expr = binary(expr, BinaryOp::Or, right);
        }

        Ok(expr)
    }

    fn and(&mut self) -> ParseResult<Expr> {
        let mut expr = self.equality()?;

        while self.match_kind(TokenKind::And) {
            let right = self.equality()?;
            expr = binary(expr, BinaryOp::And, right);
        }

        Ok(expr)
    }

    fn equality(&mut self) -> ParseResult<Expr> {
        let mut expr = self.comparison()?;

        while self.match_any(&[TokenKind::Equal, TokenKind::NotEq]) {
            let operator = match self.previous().kind {
                TokenKind::Equal => BinaryOp::Equal,
                _ => BinaryOp::NotEq,
            };
            let right = self.comparison()?;
            expr = binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        let mut expr = self.term()?;

        while self.match_any(&[TokenKind::Lt, TokenKind::Lte, TokenKind::Gt, TokenKind::Gte]) {
            let operator = match self.previous().kind {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::Lte => BinaryOp::Lte,
                TokenKind::Gt => BinaryOp::Gt,
                _ => BinaryOp::Gte,
            };
            let right = self.term()?;
            expr = binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn term(&mut self) -> ParseResult<Expr> {
        let mut expr = self.factor()?;

        while self.match_any(&[TokenKind::Plus, TokenKind::Minus]) {
            let operator = match self.previous().kind {
                TokenKind::Plus => BinaryOp::Plus,
                _ => BinaryOp::Minus,
            };
            let right = self.factor()?;
            expr = binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn factor(&mut self) -> ParseResult<Expr> {
        let mut expr = self.unary()?;

        while self.match_any(&[TokenKind::Star, TokenKind::Slash]) {
            let operator = match self.previous().kind {
                TokenKind::Star => BinaryOp::Star,
                _ => BinaryOp::Slash,
            };
            let right = self.unary()?;
            expr = binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        if self.match_any(&[TokenKind::Not, TokenKind::Minus]) {
            let operator = match self.previous().kind {
                TokenKind::Not => UnaryOp::Not,
                _ => UnaryOp::Minus,
            };
            let start = self.previous().span;
            let operand = self.unary()?;
            let span = start.to(operand.span());

            return Ok(Expr::Unary {
                operator,
                operand: Box::new(operand),
                span,
            });
        }

        self.call()
    }

    /// Primary followed by any chain of `(args)` and `[index]` suffixes.
    fn call(&mut self) -> ParseResult<Expr> {
        let mut expr = self.primary()?;

        loop {
            if self.match_kind(TokenKind::LeftParen) {
                let mut args = Vec::new();
                if !self.check(TokenKind::RightParen) {
                    loop {
                        args.push(self.expression()?);
                        if !self.match_kind(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                let paren = self
                    .consume_with_help(
                        TokenKind::RightParen,
                        "Expected ')' after arguments.",
                        "Function calls must be closed with ')' after the arguments. Example: f(a, b)",
                    )?
                    .span;
                let span = expr.span().to(paren);
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                    span,
                };
            } else if self.match_kind(TokenKind::LeftBracket) {
                let index = self.expression()?;
                let bracket = self.consume(TokenKind::RightBracket, "Expected ']' after index.")?.span;
                let span = expr.span().to(bracket);
                expr = Expr::Index {
                    target: Box::new(expr),
                    index: Box::new(index),
                    span,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        let token = self.peek().clone();

        match token.kind {
            TokenKind::Number => {
                self.advance();
                let value = match token.literal {
                    Some(Literal::Number(n)) => n,
                    _ => token.lexeme.parse::<f64>().map_err(|_| {
                        ParseError::new(token.clone(), "Invalid number literal.")
                    })?,
                };
                Ok(Expr::Number {
                    value,
                    span: token.span,
                })
            }
            TokenKind::String => {
                self.advance();
                let value = match token.literal {
                    Some(Literal::Str(s)) => s,
                    _ => token.lexeme,
                };
                Ok(Expr::Str {
                    value,
                    span: token.span,
                })
            }
            TokenKind::Ident => {
                self.advance();
                Ok(Expr::Ident {
                    name: token.lexeme,
                    span: token.span,
                })
            }
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.expression()?;
                let end = self
                    .consume_with_help(
                        TokenKind::RightParen,
                        "Expected ')' after expression.",
                        "Every opening parenthesis '(' must have a matching closing parenthesis ')'.",
                    )?
                    .span;
                Ok(Expr::Grouping {
                    expr: Box::new(expr),
                    span: token.span.to(end),
                })
            }
            TokenKind::LeftBracket => {
                self.advance();
                let mut elements = Vec::new();
                if !self.check(TokenKind::RightBracket) {
                    loop {
                        elements.push(self.expression()?);
                        if !self.match_kind(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                let end = self
                    .consume_with_help(
                        TokenKind::RightBracket,
                        "Expected ']' after array elements.",
                        "Array literals must be closed with ']'. Example: [1, 2, 3]",
                    )?
                    .span;
                Ok(Expr::Array {
                    elements,
                    span: token.span.to(end),
                })
            }
            _ => {
                let help = match token.kind {
                    TokenKind::RightParen => "Found ')' without matching '('. Check for unbalanced parentheses.",
                    TokenKind::RightBracket => "Found ']' without matching '['. Check for unbalanced brackets.",
                    TokenKind::Eof => "Reached end of input while expecting an expression.",
                    _ => "Expected a literal value, variable, array or parenthesized expression here.",
                };
                let message = if token.kind == TokenKind::Eof {
                    "Expected expression, found end of input.".to_string()
                } else {
                    format!("Expected expression, found '{}'.", token.lexeme)
                };
                Err(ParseError::new(token, message).with_help(help))
            }
        }
    }

    /// Discards tokens until just after a `;` or just before a token that
    /// starts a new declaration.
    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous().kind == TokenKind::Semicolon {
                return;
            }

            match self.peek().kind {
                TokenKind::Let | TokenKind::Func | TokenKind::If | TokenKind::While => return,
                _ => {}
            }

            self.advance();
        }
    }

    fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_any(&mut self, kinds: &[TokenKind]) -> bool {
        kinds.iter().any(|kind| self.match_kind(*kind))
    }

    fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end() && self.peek().kind == kind
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn peek_next(&self) -> &Token {
        let index = (self.current + 1).min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn error_at_current(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(self.peek().clone(), message)
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> ParseResult<&Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_at_current(message))
        }
    }

    fn consume_with_help(&mut self, kind: TokenKind, message: &str, help: &str) -> ParseResult<&Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_at_current(message).with_help(help))
        }
    }
}

fn binary(left: Expr, operator: BinaryOp, right: Expr) -> Expr {
    let span = left.span().to(right.span());
    Expr::Binary {
        left: Box::new(left),
        operator,
        right: Box::new(right),
        span,
    }
}

/// Parses a token stream into a program plus every syntax error found.
pub fn parse_program(tokens: Vec<Token>) -> (Program, Vec<ParseError>) {
    Parser::new(tokens).parse_program()
}
