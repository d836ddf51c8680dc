// slim language library
//
// Lexer, recursive-descent parser and tree-walking evaluator for a small
// dynamically-typed scripting language with closures and host builtins.

// Public modules
pub mod ast;
pub mod config;
pub mod console;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod natives;
pub mod parser;
pub mod runner;
pub mod value;

// Re-export commonly used items
pub use ast::{Expr, Program, Stmt};
pub use config::Config;
pub use console::{BufferConsole, Console, StdConsole};
pub use error::{ParseError, RuntimeError, SlimError, Span};
pub use evaluator::{Evaluator, Flow, Module};
pub use lexer::{lex, Lexer, Literal, Token, TokenKind};
pub use natives::Natives;
pub use parser::{parse_program, Parser};
pub use value::Value;

// Re-export main functions
pub use runner::{run, run_source, RunOutcome};
