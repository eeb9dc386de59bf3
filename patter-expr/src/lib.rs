//! Patter expression language
//!
//! The small language embedded in script braces (`{...}`, `%{...}`, `#{...}`, `@{...}`):
//! - [`parse`]: text -> [`Ast`], never fails, syntax problems are recorded in the tree
//! - [`validate`]: [`Ast`] -> [`Expr`] or a list of [`Diagnostic`]s
//! - [`Expr::eval`]: evaluation against a [`Context`] and a [`Registry`] of named operations

pub mod ast;
pub mod error;
pub mod escape;
pub mod expr;
pub mod lexer;
pub mod parser;
pub mod registry;
pub mod validate;
pub mod value;

pub use ast::{Ast, AstKind, AstNode, BinaryOp, SyntaxIssue, UnaryOp};
pub use error::{Diagnostic, EvalError};
pub use expr::Expr;
pub use parser::parse;
pub use registry::{Context, Operation, Registry, Scope};
pub use validate::validate;
pub use value::Value;

/// Parse and validate in one step
pub fn compile(source: &str) -> Result<Expr, Vec<Diagnostic>> {
    validate(&parse(source))
}
