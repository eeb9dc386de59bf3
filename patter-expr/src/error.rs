//! 表达式错误类型

use std::fmt;

use thiserror::Error;

/// A static problem found while validating an expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 1-based column in the expression text, 0 when the problem has no single location
    pub column: usize,
    pub message: String,
}

impl Diagnostic {
    pub fn new(column: usize, message: impl Into<String>) -> Self {
        Self {
            column,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.column == 0 {
            write!(f, "{}", self.message)
        } else {
            write!(f, "column {}: {}", self.column, self.message)
        }
    }
}

/// 运行时求值错误
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("undefined variable '{0}'")]
    UndefinedVariable(String),

    #[error("unknown operation '{0}'")]
    UnknownOperation(String),

    #[error("{name}: {message}")]
    OperationFailed { name: String, message: String },

    #[error("cannot apply '{op}' to {left} and {right}")]
    TypeMismatch {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },

    #[error("cannot apply '{op}' to {operand}")]
    UnaryTypeMismatch {
        op: &'static str,
        operand: &'static str,
    },

    #[error("integer overflow in '{0}'")]
    Overflow(&'static str),

    #[error("division by zero")]
    DivisionByZero,
}
