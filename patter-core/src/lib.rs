//! Patter Core - script pipeline
//!
//! source → [`tokenizer`] → [`syntax`] → [`compiler`] → [`runner`] → [`Sink`]
//!
//! The built-in operations in [`builtins`] feed back from executed
//! expressions into the runner that evaluates them.

pub mod builtins;
pub mod compiler;
pub mod position;
pub mod runner;
pub mod sink;
pub mod syntax;
pub mod tokenizer;

pub use builtins::{builtin_registry, register_builtins, BUILTIN_NAMES};
pub use compiler::{compile, CompileError, CompileReport, Programme};
pub use position::SourcePosition;
pub use runner::{Runner, RunnerError, State};
pub use sink::{BufferSink, Sink};
pub use syntax::{parse_source, ParserError, Script, SyntaxError, MAIN_SCENE};
pub use tokenizer::{tokenize, LexerError, LexerErrorKind, Token, TokenKind};

pub use patter_config::{Phase, RunnerConfig};
pub use patter_expr::{Registry, Scope, Value};
