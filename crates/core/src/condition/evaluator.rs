//! AST interpreter. Pure logic over the bound context.

use super::parser::{ArithOp, CompareOp, Expr};
use super::{ConditionError, Context, Value};

pub(super) fn eval(expr: &Expr, ctx: &Context) -> Result<Value, ConditionError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Variable(name) => ctx
            .get(name)
            .cloned()
            .ok_or_else(|| ConditionError::UnboundVariable(name.clone())),
        Expr::Neg(inner) => match eval(inner, ctx)? {
            Value::Integer(v) => v
                .checked_neg()
                .map(Value::Integer)
                .ok_or_else(|| ConditionError::Arithmetic("integer overflow".to_string())),
            Value::Float(v) => Ok(Value::Float(-v)),
            other => Err(ConditionError::TypeMismatch(format!(
                "cannot negate a {}",
                other.value_type()
            ))),
        },
        Expr::Not(inner) => Ok(Value::Boolean(!eval_bool("not", inner, ctx)?)),
        Expr::And(lhs, rhs) => {
            let result = eval_bool("and", lhs, ctx)? && eval_bool("and", rhs, ctx)?;
            Ok(Value::Boolean(result))
        }
        Expr::Or(lhs, rhs) => {
            let result = eval_bool("or", lhs, ctx)? || eval_bool("or", rhs, ctx)?;
            Ok(Value::Boolean(result))
        }
        Expr::Arith { op, lhs, rhs } => {
            let l = eval(lhs, ctx)?;
            let r = eval(rhs, ctx)?;
            arith(*op, l, r)
        }
        Expr::Compare { first, rest } => {
            let mut left = eval(first, ctx)?;
            for (op, operand) in rest {
                let right = eval(operand, ctx)?;
                if !compare(*op, &left, &right)? {
                    return Ok(Value::Boolean(false));
                }
                left = right;
            }
            Ok(Value::Boolean(true))
        }
    }
}

fn eval_bool(keyword: &str, expr: &Expr, ctx: &Context) -> Result<bool, ConditionError> {
    match eval(expr, ctx)? {
        Value::Boolean(b) => Ok(b),
        other => Err(ConditionError::TypeMismatch(format!(
            "`{keyword}` requires boolean operands, found {}",
            other.value_type()
        ))),
    }
}

fn arith(op: ArithOp, l: Value, r: Value) -> Result<Value, ConditionError> {
    let overflow = || ConditionError::Arithmetic("integer overflow".to_string());

    match (op, l, r) {
        (ArithOp::Add, Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
        (ArithOp::Div, l, r) => {
            let (a, b) = as_floats(op, &l, &r)?;
            if b == 0.0 {
                return Err(ConditionError::Arithmetic("division by zero".to_string()));
            }
            Ok(Value::Float(a / b))
        }
        (ArithOp::Add, Value::Integer(a), Value::Integer(b)) => {
            a.checked_add(b).map(Value::Integer).ok_or_else(overflow)
        }
        (ArithOp::Sub, Value::Integer(a), Value::Integer(b)) => {
            a.checked_sub(b).map(Value::Integer).ok_or_else(overflow)
        }
        (ArithOp::Mul, Value::Integer(a), Value::Integer(b)) => {
            a.checked_mul(b).map(Value::Integer).ok_or_else(overflow)
        }
        (op, l, r) => {
            let (a, b) = as_floats(op, &l, &r)?;
            let result = match op {
                ArithOp::Add => a + b,
                ArithOp::Sub => a - b,
                ArithOp::Mul => a * b,
                ArithOp::Div => a / b,
            };
            Ok(Value::Float(result))
        }
    }
}

fn as_floats(op: ArithOp, l: &Value, r: &Value) -> Result<(f64, f64), ConditionError> {
    match (as_float(l), as_float(r)) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(ConditionError::TypeMismatch(format!(
            "unsupported operand types for `{op}`: {} and {}",
            l.value_type(),
            r.value_type()
        ))),
    }
}

fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(v) => Some(*v as f64),
        Value::Float(v) => Some(*v),
        _ => None,
    }
}

fn compare(op: CompareOp, l: &Value, r: &Value) -> Result<bool, ConditionError> {
    match (l, r) {
        (Value::Integer(a), Value::Integer(b)) => Ok(apply_ord(op, a, b)),
        (Value::String(a), Value::String(b)) => Ok(apply_ord(op, a, b)),
        (Value::Boolean(a), Value::Boolean(b)) if op.is_equality() => Ok(apply_ord(op, a, b)),
        _ => match (as_float(l), as_float(r)) {
            (Some(a), Some(b)) => Ok(apply_ord(op, &a, &b)),
            _ => Err(ConditionError::TypeMismatch(format!(
                "cannot compare {} {op} {}",
                l.value_type(),
                r.value_type()
            ))),
        },
    }
}

fn apply_ord<T: PartialOrd>(op: CompareOp, a: &T, b: &T) -> bool {
    match op {
        CompareOp::Lt => a < b,
        CompareOp::Le => a <= b,
        CompareOp::Gt => a > b,
        CompareOp::Ge => a >= b,
        CompareOp::Eq => a == b,
        CompareOp::Ne => a != b,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
