//! Validated expressions and their evaluation

use std::cmp::Ordering;

use crate::ast::{BinaryOp, UnaryOp};
use crate::error::EvalError;
use crate::registry::{Context, Registry};
use crate::value::Value;

/// A validated, directly evaluable expression.
///
/// Owns all of its data; nothing borrows from the text it was parsed from.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Variable(String),
    List(Vec<Expr>),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Assign {
        name: String,
        value: Box<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
    Sequence(Vec<Expr>),
}

impl Expr {
    /// Evaluate against `ctx`, dispatching calls through `registry`
    pub fn eval<C: Context>(&self, ctx: &mut C, registry: &Registry<C>) -> Result<Value, EvalError> {
        match self {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Variable(name) => ctx
                .scope()
                .get(name)
                .cloned()
                .ok_or_else(|| EvalError::UndefinedVariable(name.clone())),
            Expr::List(items) => items
                .iter()
                .map(|item| item.eval(ctx, registry))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            Expr::Unary { op, operand } => {
                let value = operand.eval(ctx, registry)?;
                eval_unary(*op, value)
            }
            Expr::Binary {
                op: BinaryOp::And,
                left,
                right,
            } => {
                if !left.eval(ctx, registry)?.is_truthy() {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(right.eval(ctx, registry)?.is_truthy()))
            }
            Expr::Binary {
                op: BinaryOp::Or,
                left,
                right,
            } => {
                if left.eval(ctx, registry)?.is_truthy() {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(right.eval(ctx, registry)?.is_truthy()))
            }
            Expr::Binary { op, left, right } => {
                let left = left.eval(ctx, registry)?;
                let right = right.eval(ctx, registry)?;
                eval_binary(*op, left, right)
            }
            Expr::Assign { name, value } => {
                let value = value.eval(ctx, registry)?;
                ctx.scope().set(name.clone(), value.clone());
                Ok(value)
            }
            Expr::Call { name, args } => {
                let args = args
                    .iter()
                    .map(|arg| arg.eval(ctx, registry))
                    .collect::<Result<Vec<_>, _>>()?;
                let operation = registry
                    .get(name)
                    .ok_or_else(|| EvalError::UnknownOperation(name.clone()))?;
                operation(ctx, &args).map_err(|message| EvalError::OperationFailed {
                    name: name.clone(),
                    message,
                })
            }
            Expr::Sequence(items) => {
                let mut last = Value::Null;
                for item in items {
                    last = item.eval(ctx, registry)?;
                }
                Ok(last)
            }
        }
    }
}

fn eval_unary(op: UnaryOp, value: Value) -> Result<Value, EvalError> {
    match (op, value) {
        (UnaryOp::Not, value) => Ok(Value::Bool(!value.is_truthy())),
        (UnaryOp::Neg, Value::Int(i)) => i.checked_neg().map(Value::Int).ok_or(EvalError::Overflow("-")),
        (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
        (UnaryOp::Neg, other) => Err(EvalError::UnaryTypeMismatch {
            op: "-",
            operand: other.type_name(),
        }),
    }
}

fn eval_binary(op: BinaryOp, left: Value, right: Value) -> Result<Value, EvalError> {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(values_equal(&left, &right))),
        BinaryOp::Ne => Ok(Value::Bool(!values_equal(&left, &right))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = compare(op, &left, &right)?;
            let result = match op {
                BinaryOp::Lt => ordering == Ordering::Less,
                BinaryOp::Le => ordering != Ordering::Greater,
                BinaryOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            };
            Ok(Value::Bool(result))
        }
        BinaryOp::Add => match (left, right) {
            (Value::Str(mut a), Value::Str(b)) => {
                a.push_str(&b);
                Ok(Value::Str(a))
            }
            (Value::List(mut a), Value::List(b)) => {
                a.extend(b);
                Ok(Value::List(a))
            }
            (left, right) => arithmetic(op, left, right),
        },
        _ => arithmetic(op, left, right),
    }
}

fn arithmetic(op: BinaryOp, left: Value, right: Value) -> Result<Value, EvalError> {
    match (&left, &right) {
        (Value::Int(a), Value::Int(b)) => int_arithmetic(op, *a, *b),
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => float_arithmetic(op, a, b),
            _ => Err(mismatch(op, &left, &right)),
        },
    }
}

fn int_arithmetic(op: BinaryOp, a: i64, b: i64) -> Result<Value, EvalError> {
    if matches!(op, BinaryOp::Div | BinaryOp::Mod) && b == 0 {
        return Err(EvalError::DivisionByZero);
    }
    let result = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div => a.checked_div(b),
        BinaryOp::Mod => a.checked_rem(b),
        _ => return Err(mismatch(op, &Value::Int(a), &Value::Int(b))),
    };
    result.map(Value::Int).ok_or(EvalError::Overflow(op.symbol()))
}

fn float_arithmetic(op: BinaryOp, a: f64, b: f64) -> Result<Value, EvalError> {
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div | BinaryOp::Mod if b == 0.0 => return Err(EvalError::DivisionByZero),
        BinaryOp::Div => a / b,
        BinaryOp::Mod => a % b,
        _ => return Err(mismatch(op, &Value::Float(a), &Value::Float(b))),
    };
    Ok(Value::Float(result))
}

/// Numbers compare by value across int/float
fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Int(_), Value::Float(_)) | (Value::Float(_), Value::Int(_)) => {
            left.as_f64() == right.as_f64()
        }
        _ => left == right,
    }
}

fn compare(op: BinaryOp, left: &Value, right: &Value) -> Result<Ordering, EvalError> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b).ok_or_else(|| mismatch(op, left, right)),
            _ => Err(mismatch(op, left, right)),
        },
    }
}

fn mismatch(op: BinaryOp, left: &Value, right: &Value) -> EvalError {
    EvalError::TypeMismatch {
        op: op.symbol(),
        left: left.type_name(),
        right: right.type_name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Scope;
    use crate::{parse, validate};

    fn eval_in(src: &str, scope: &mut Scope, registry: &Registry<Scope>) -> Result<Value, EvalError> {
        let expr = validate(&parse(src)).expect("expression should validate");
        expr.eval(scope, registry)
    }

    fn eval(src: &str) -> Result<Value, EvalError> {
        eval_in(src, &mut Scope::new(), &Registry::new())
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval("1 + 2 * 3"), Ok(Value::Int(7)));
        assert_eq!(eval("(1 + 2) * 3"), Ok(Value::Int(9)));
        assert_eq!(eval("7 % 4 - -1"), Ok(Value::Int(4)));
        assert_eq!(eval("1 + 0.5"), Ok(Value::Float(1.5)));
        assert_eq!(eval("7 / 2"), Ok(Value::Int(3)));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(eval("1 / 0"), Err(EvalError::DivisionByZero));
        assert_eq!(eval("1.5 % 0"), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn test_overflow_is_an_error() {
        assert_eq!(eval("9223372036854775807 + 1"), Err(EvalError::Overflow("+")));
    }

    #[test]
    fn test_string_concat_and_compare() {
        assert_eq!(eval("'ab' + \"cd\""), Ok(Value::from("abcd")));
        assert_eq!(eval("'a' < 'b'"), Ok(Value::Bool(true)));
        assert!(matches!(eval("'a' + 1"), Err(EvalError::TypeMismatch { .. })));
    }

    #[test]
    fn test_equality_across_numbers() {
        assert_eq!(eval("1 == 1.0"), Ok(Value::Bool(true)));
        assert_eq!(eval("null != false"), Ok(Value::Bool(true)));
        assert_eq!(eval("[1, 'a'] == [1, 'a']"), Ok(Value::Bool(true)));
    }

    #[test]
    fn test_logic_short_circuits() {
        let mut registry: Registry<Scope> = Registry::new();
        registry.register("boom", |_, _| Err("should not run".to_string()));
        let mut scope = Scope::new();
        assert_eq!(eval_in("false && boom()", &mut scope, &registry), Ok(Value::Bool(false)));
        assert_eq!(eval_in("0 || boom()", &mut scope, &registry), Ok(Value::Bool(true)));
        assert!(eval_in("true && boom()", &mut scope, &registry).is_err());
    }

    #[test]
    fn test_assignment_and_sequence() {
        let mut scope = Scope::new();
        let registry = Registry::new();
        assert_eq!(eval_in("x = 2; y = x * 10; y + 1", &mut scope, &registry), Ok(Value::Int(21)));
        assert_eq!(scope.get("y"), Some(&Value::Int(20)));
    }

    #[test]
    fn test_undefined_variable() {
        assert_eq!(eval("nope"), Err(EvalError::UndefinedVariable("nope".into())));
    }

    #[test]
    fn test_call_dispatch_and_failure() {
        let mut registry: Registry<Scope> = Registry::new();
        registry.register("sum", |_, args: &[Value]| {
            let mut total = 0;
            for arg in args {
                match arg {
                    Value::Int(i) => total += i,
                    other => return Err(format!("expected int, got {}", other.type_name())),
                }
            }
            Ok(Value::Int(total))
        });
        let mut scope = Scope::new();
        assert_eq!(eval_in("sum(1, 2, 3)", &mut scope, &registry), Ok(Value::Int(6)));

        let err = eval_in("sum(1, 'x')", &mut scope, &registry).unwrap_err();
        assert_eq!(err.to_string(), "sum: expected int, got string");

        let err = eval_in("missing()", &mut scope, &registry).unwrap_err();
        assert_eq!(err, EvalError::UnknownOperation("missing".into()));
    }

    #[test]
    fn test_list_literal() {
        assert_eq!(
            eval("[1, 'two', null]"),
            Ok(Value::List(vec![Value::Int(1), Value::from("two"), Value::Null]))
        );
    }

    #[test]
    fn test_not() {
        assert_eq!(eval("!0"), Ok(Value::Bool(false)));
        assert_eq!(eval("!null"), Ok(Value::Bool(true)));
    }
}
