//! Static validation: [`Ast`] -> [`Expr`]

use crate::ast::{Ast, AstKind, AstNode};
use crate::error::Diagnostic;
use crate::escape::unescape;
use crate::expr::Expr;
use crate::value::Value;

/// Validate a parsed expression.
///
/// Collects every problem instead of stopping at the first one.
pub fn validate(ast: &Ast) -> Result<Expr, Vec<Diagnostic>> {
    if ast.has_issues() {
        return Err(ast
            .issues()
            .iter()
            .map(|issue| Diagnostic::new(issue.column, issue.message.clone()))
            .collect());
    }

    let Some(root) = ast.root() else {
        return Err(vec![Diagnostic::new(0, "empty expression")]);
    };

    let mut diagnostics = Vec::new();
    let expr = lower(root, &mut diagnostics);
    if diagnostics.is_empty() {
        Ok(expr)
    } else {
        Err(diagnostics)
    }
}

/// Lower one node; on error a diagnostic is pushed and a null literal stands in
fn lower(node: &AstNode, diagnostics: &mut Vec<Diagnostic>) -> Expr {
    match &node.kind {
        AstKind::Int(text) => {
            let digits: String = text.chars().filter(|c| *c != '_').collect();
            match digits.parse::<i64>() {
                Ok(i) => Expr::Literal(Value::Int(i)),
                Err(_) => {
                    diagnostics.push(Diagnostic::new(
                        node.column,
                        format!("integer literal '{text}' is out of range"),
                    ));
                    Expr::Literal(Value::Null)
                }
            }
        }
        AstKind::Float(text) => {
            let digits: String = text.chars().filter(|c| *c != '_').collect();
            match digits.parse::<f64>() {
                Ok(f) => Expr::Literal(Value::Float(f)),
                Err(_) => {
                    diagnostics.push(Diagnostic::new(
                        node.column,
                        format!("invalid float literal '{text}'"),
                    ));
                    Expr::Literal(Value::Null)
                }
            }
        }
        AstKind::Str(raw) => match unescape(raw) {
            Ok(s) => Expr::Literal(Value::Str(s)),
            Err(messages) => {
                diagnostics.extend(
                    messages
                        .into_iter()
                        .map(|message| Diagnostic::new(node.column, message)),
                );
                Expr::Literal(Value::Null)
            }
        },
        AstKind::Bool(b) => Expr::Literal(Value::Bool(*b)),
        AstKind::Null => Expr::Literal(Value::Null),
        AstKind::Identifier(name) => Expr::Variable(name.clone()),
        AstKind::List(items) => Expr::List(lower_all(items, diagnostics)),
        AstKind::Unary { op, operand } => Expr::Unary {
            op: *op,
            operand: Box::new(lower(operand, diagnostics)),
        },
        AstKind::Binary { op, left, right } => Expr::Binary {
            op: *op,
            left: Box::new(lower(left, diagnostics)),
            right: Box::new(lower(right, diagnostics)),
        },
        AstKind::Assign { target, value } => {
            let value = Box::new(lower(value, diagnostics));
            match &target.kind {
                AstKind::Identifier(name) => Expr::Assign {
                    name: name.clone(),
                    value,
                },
                _ => {
                    diagnostics.push(Diagnostic::new(
                        target.column,
                        "invalid assignment target, expected a variable name",
                    ));
                    Expr::Literal(Value::Null)
                }
            }
        }
        AstKind::Call { callee, args } => {
            let args = lower_all(args, diagnostics);
            match &callee.kind {
                AstKind::Identifier(name) => Expr::Call {
                    name: name.clone(),
                    args,
                },
                _ => {
                    diagnostics.push(Diagnostic::new(
                        callee.column,
                        "only named operations can be called",
                    ));
                    Expr::Literal(Value::Null)
                }
            }
        }
        AstKind::Sequence(items) => Expr::Sequence(lower_all(items, diagnostics)),
    }
}

fn lower_all(nodes: &[AstNode], diagnostics: &mut Vec<Diagnostic>) -> Vec<Expr> {
    nodes.iter().map(|node| lower(node, diagnostics)).collect()
}
