//! Unvalidated syntax tree for one embedded expression

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AstNode {
    pub kind: AstKind,
    /// 1-based column inside the expression text
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AstKind {
    /// Raw integer literal text, underscores included
    Int(String),
    Float(String),
    /// Raw string literal content, escapes unresolved
    Str(String),
    Bool(bool),
    Null,
    Identifier(String),
    List(Vec<AstNode>),
    Unary {
        op: UnaryOp,
        operand: Box<AstNode>,
    },
    Binary {
        op: BinaryOp,
        left: Box<AstNode>,
        right: Box<AstNode>,
    },
    Assign {
        target: Box<AstNode>,
        value: Box<AstNode>,
    },
    Call {
        callee: Box<AstNode>,
        args: Vec<AstNode>,
    },
    Sequence(Vec<AstNode>),
}

impl AstNode {
    pub fn new(kind: AstKind, column: usize) -> Self {
        Self { kind, column }
    }
}

/// A syntax problem found while parsing
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxIssue {
    pub column: usize,
    pub message: String,
}

/// Parsed expression.
///
/// Parsing never fails outright: problems are recorded in `issues` and
/// reported by validation, so they can be aggregated with every other
/// diagnostic of the surrounding script.
#[derive(Debug, Clone, PartialEq)]
pub struct Ast {
    source: String,
    root: Option<AstNode>,
    issues: Vec<SyntaxIssue>,
}

impl Ast {
    pub(crate) fn new(source: String, root: Option<AstNode>, issues: Vec<SyntaxIssue>) -> Self {
        Self {
            source,
            root,
            issues,
        }
    }

    /// The expression text this tree was parsed from
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> Option<&AstNode> {
        self.root.as_ref()
    }

    pub fn issues(&self) -> &[SyntaxIssue] {
        &self.issues
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}
