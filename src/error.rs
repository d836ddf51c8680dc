use ariadne::{Color, Config, Fmt, Label, Report, ReportKind, Source};
use std::fmt;
use thiserror::Error;

use crate::lexer::Token;

/// Character range into the source text, used only for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn single(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos + 1,
        }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

/// A syntax error: the offending token plus a message.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ParseError {
    pub token: Token,
    pub message: String,
    pub help: Option<String>,
}

impl ParseError {
    pub fn new(token: Token, message: impl Into<String>) -> Self {
        Self {
            token,
            message: message.into(),
            help: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// One-line summary naming the token kind and lexeme it tripped on.
    pub fn summary(&self) -> String {
        format!(
            "{} at line {}, token {:?} '{}'",
            self.message, self.token.line, self.token.kind, self.token.lexeme
        )
    }
}

/// A fatal evaluation error. The first one raised aborts the run.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RuntimeError {
    #[error("Undefined variable '{name}'")]
    UndefinedVariable { name: String, span: Span },

    #[error("{message}")]
    TypeMismatch { message: String, span: Span },

    #[error("{callee} expects {expected} argument(s) but got {got}")]
    ArityMismatch {
        callee: String,
        expected: usize,
        got: usize,
        span: Span,
    },

    #[error("Cannot index into a value of type {type_name}")]
    NotIndexable { type_name: &'static str, span: Span },

    #[error("Array index must be a number, got {type_name}")]
    InvalidIndex { type_name: &'static str, span: Span },

    #[error("Value of type {type_name} is not callable")]
    NotCallable { type_name: &'static str, span: Span },

    #[error("Maximum call depth of {depth} exceeded")]
    StackOverflow { depth: usize, span: Span },

    #[error("I/O error: {message}")]
    Io { message: String, span: Span },
}

impl RuntimeError {
    pub fn type_mismatch(message: impl Into<String>) -> Self {
        RuntimeError::TypeMismatch {
            message: message.into(),
            span: Span::default(),
        }
    }

    pub fn span(&self) -> Span {
        match self {
            RuntimeError::UndefinedVariable { span, .. }
            | RuntimeError::TypeMismatch { span, .. }
            | RuntimeError::ArityMismatch { span, .. }
            | RuntimeError::NotIndexable { span, .. }
            | RuntimeError::InvalidIndex { span, .. }
            | RuntimeError::NotCallable { span, .. }
            | RuntimeError::StackOverflow { span, .. }
            | RuntimeError::Io { span, .. } => *span,
        }
    }

    /// Re-anchors the error at `at`. Natives raise errors without a
    /// location; the evaluator pins them to the call site.
    pub fn at(mut self, at: Span) -> Self {
        match &mut self {
            RuntimeError::UndefinedVariable { span, .. }
            | RuntimeError::TypeMismatch { span, .. }
            | RuntimeError::ArityMismatch { span, .. }
            | RuntimeError::NotIndexable { span, .. }
            | RuntimeError::InvalidIndex { span, .. }
            | RuntimeError::NotCallable { span, .. }
            | RuntimeError::StackOverflow { span, .. }
            | RuntimeError::Io { span, .. } => *span = at,
        }
        self
    }

    fn help(&self) -> Option<&'static str> {
        match self {
            RuntimeError::UndefinedVariable { .. } => {
                Some("Declare the variable with 'let' before using or assigning it.")
            }
            RuntimeError::ArityMismatch { .. } => {
                Some("Functions take exactly as many arguments as they declare parameters.")
            }
            RuntimeError::NotIndexable { .. } => Some("Only arrays can be indexed: items[0]"),
            RuntimeError::NotCallable { .. } => {
                Some("Only functions declared with 'func' and builtins can be called.")
            }
            RuntimeError::StackOverflow { .. } => {
                Some("Check that every recursive function reaches a case that returns without calling itself.")
            }
            _ => None,
        }
    }
}

impl From<std::io::Error> for RuntimeError {
    fn from(error: std::io::Error) -> Self {
        RuntimeError::Io {
            message: error.to_string(),
            span: Span::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ParseError,
    RuntimeError,
}

/// A renderable diagnostic, built from either error type.
#[derive(Debug, Clone)]
pub struct SlimError {
    pub kind: ErrorKind,
    pub span: Span,
    pub message: String,
    pub help: Option<String>,
}

impl SlimError {
    pub fn new(kind: ErrorKind, span: Span, message: String) -> Self {
        Self {
            kind,
            span,
            message,
            help: None,
        }
    }

    pub fn new_with_help(kind: ErrorKind, span: Span, message: String, help: String) -> Self {
        Self {
            kind,
            span,
            message,
            help: Some(help),
        }
    }

    fn build_report<'a>(&self, filename: &'a str, color: bool) -> Report<'a, (&'a str, std::ops::Range<usize>)> {
        let paint = match self.kind {
            ErrorKind::ParseError => Color::Yellow,
            ErrorKind::RuntimeError => Color::Magenta,
        };

        let kind_str = match self.kind {
            ErrorKind::ParseError => "Parse Error",
            ErrorKind::RuntimeError => "Runtime Error",
        };

        let headline = if color {
            format!("{}: {}", kind_str.fg(paint), self.message)
        } else {
            format!("{}: {}", kind_str, self.message)
        };

        let mut label = Label::new((filename, self.span.start..self.span.end)).with_message(&self.message);
        if color {
            label = label.with_color(paint);
        }

        let mut report_builder = Report::build(ReportKind::Error, filename, self.span.start)
            .with_config(Config::default().with_color(color))
            .with_message(headline)
            .with_label(label);

        if let Some(ref help_text) = self.help {
            let note = if color {
                format!("{}: {}", "help".fg(Color::Cyan), help_text)
            } else {
                format!("help: {}", help_text)
            };
            report_builder = report_builder.with_note(note);
        }

        report_builder.finish()
    }

    /// Writes the annotated report to stderr.
    pub fn report(&self, source: &str, filename: Option<&str>, color: bool) -> std::io::Result<()> {
        let filename = filename.unwrap_or("<input>");
        self.build_report(filename, color)
            .eprint((filename, Source::from(source)))
    }

    /// Renders the annotated report into a string, without colour codes.
    pub fn render(&self, source: &str, filename: Option<&str>) -> String {
        let filename = filename.unwrap_or("<input>");
        let mut buffer = Vec::new();
        if self
            .build_report(filename, false)
            .write((filename, Source::from(source)), &mut buffer)
            .is_err()
        {
            return self.message.clone();
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

impl From<&ParseError> for SlimError {
    fn from(error: &ParseError) -> Self {
        match &error.help {
            Some(help) => SlimError::new_with_help(
                ErrorKind::ParseError,
                error.token.span,
                error.message.clone(),
                help.clone(),
            ),
            None => SlimError::new(ErrorKind::ParseError, error.token.span, error.message.clone()),
        }
    }
}

impl From<&RuntimeError> for SlimError {
    fn from(error: &RuntimeError) -> Self {
        match error.help() {
            Some(help) => SlimError::new_with_help(
                ErrorKind::RuntimeError,
                error.span(),
                error.to_string(),
                help.to_string(),
            ),
            None => SlimError::new(ErrorKind::RuntimeError, error.span(), error.to_string()),
        }
    }
}

impl fmt::Display for SlimError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for SlimError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::TokenKind;

    #[test]
    fn runtime_errors_are_reanchored_at_call_site() {
        let error = RuntimeError::type_mismatch("len() expects a string or array").at(Span::new(4, 9));
        assert_eq!(error.span(), Span::new(4, 9));
    }

    #[test]
    fn diagnostics_keep_help_text() {
        let token = Token::new(TokenKind::RightBrace, "}".to_string(), Span::new(3, 4), 1);
        let parse = ParseError::new(token, "Unexpected '}'").with_help("Check for unbalanced braces.");
        let diagnostic = SlimError::from(&parse);
        assert_eq!(diagnostic.kind, ErrorKind::ParseError);
        assert_eq!(diagnostic.span, Span::new(3, 4));
        assert_eq!(diagnostic.help.as_deref(), Some("Check for unbalanced braces."));

        let runtime = SlimError::from(&RuntimeError::type_mismatch("Cannot add number and string"));
        assert_eq!(runtime.kind, ErrorKind::RuntimeError);
        assert_eq!(runtime.help, None);
    }

    #[test]
    fn rendered_report_mentions_kind_and_message() {
        let error = RuntimeError::UndefinedVariable {
            name: "ghost".to_string(),
            span: Span::new(6, 11),
        };
        let rendered = SlimError::from(&error).render("print(ghost);", Some("test.slim"));
        assert!(rendered.contains("Runtime Error"));
        assert!(rendered.contains("Undefined variable 'ghost'"));
    }
}
