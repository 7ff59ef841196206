//! Static type inference run once at compile time.

use super::parser::{ArithOp, CompareOp, Expr};
use super::ValueType;

/// Infer the result type of `expr`, rejecting undeclared identifiers and
/// operations that cannot succeed for the declared variable types.
pub(super) fn infer(expr: &Expr, variables: &[(&str, ValueType)]) -> Result<ValueType, String> {
    match expr {
        Expr::Literal(value) => Ok(value.value_type()),
        Expr::Variable(name) => variables
            .iter()
            .find(|(declared, _)| *declared == name.as_str())
            .map(|(_, ty)| *ty)
            .ok_or_else(|| format!("unknown identifier `{name}`")),
        Expr::Neg(inner) => {
            let ty = infer(inner, variables)?;
            if ty.is_numeric() {
                Ok(ty)
            } else {
                Err(format!("cannot negate a {ty}"))
            }
        }
        Expr::Not(inner) => {
            expect_boolean("not", infer(inner, variables)?)?;
            Ok(ValueType::Boolean)
        }
        Expr::And(lhs, rhs) | Expr::Or(lhs, rhs) => {
            let keyword = if matches!(expr, Expr::And(..)) { "and" } else { "or" };
            expect_boolean(keyword, infer(lhs, variables)?)?;
            expect_boolean(keyword, infer(rhs, variables)?)?;
            Ok(ValueType::Boolean)
        }
        Expr::Arith { op, lhs, rhs } => {
            let l = infer(lhs, variables)?;
            let r = infer(rhs, variables)?;
            arith_type(*op, l, r)
                .ok_or_else(|| format!("unsupported operand types for `{op}`: {l} and {r}"))
        }
        Expr::Compare { first, rest } => {
            let mut left = infer(first, variables)?;
            for (op, operand) in rest {
                let right = infer(operand, variables)?;
                if !comparable(*op, left, right) {
                    return Err(format!("cannot compare {left} {op} {right}"));
                }
                left = right;
            }
            Ok(ValueType::Boolean)
        }
    }
}

fn expect_boolean(keyword: &str, ty: ValueType) -> Result<(), String> {
    if ty == ValueType::Boolean {
        Ok(())
    } else {
        Err(format!("`{keyword}` requires boolean operands, found {ty}"))
    }
}

fn arith_type(op: ArithOp, l: ValueType, r: ValueType) -> Option<ValueType> {
    use ValueType::*;
    match (op, l, r) {
        (ArithOp::Add, String, String) => Some(String),
        (ArithOp::Div, l, r) if l.is_numeric() && r.is_numeric() => Some(Float),
        (_, Integer, Integer) => Some(Integer),
        (_, l, r) if l.is_numeric() && r.is_numeric() => Some(Float),
        _ => None,
    }
}

fn comparable(op: CompareOp, l: ValueType, r: ValueType) -> bool {
    use ValueType::*;
    match (l, r) {
        (l, r) if l.is_numeric() && r.is_numeric() => true,
        (String, String) => true,
        (Boolean, Boolean) => op.is_equality(),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::lexer::tokenize;
    use crate::condition::parser::parse;

    const VARS: &[(&str, ValueType)] = &[
        ("count", ValueType::Integer),
        ("ratio", ValueType::Float),
        ("name", ValueType::String),
        ("up", ValueType::Boolean),
    ];

    fn infer_str(src: &str) -> Result<ValueType, String> {
        infer(&parse(&tokenize(src).unwrap()).unwrap(), VARS)
    }

    #[test]
    fn integer_arithmetic_stays_integer() {
        assert_eq!(infer_str("count * 2 - 1"), Ok(ValueType::Integer));
    }

    #[test]
    fn mixed_arithmetic_promotes_to_float() {
        assert_eq!(infer_str("count + ratio"), Ok(ValueType::Float));
        assert_eq!(infer_str("count / 2"), Ok(ValueType::Float));
    }

    #[test]
    fn string_concatenation() {
        assert_eq!(infer_str("name + '!'"), Ok(ValueType::String));
        assert!(infer_str("name - '!'").is_err());
        assert!(infer_str("name * 2").is_err());
    }

    #[test]
    fn boolean_ordering_is_rejected() {
        assert_eq!(infer_str("up == true"), Ok(ValueType::Boolean));
        assert_eq!(
            infer_str("up < true"),
            Err("cannot compare boolean < boolean".to_string())
        );
    }

    #[test]
    fn logical_operators_need_booleans() {
        assert_eq!(infer_str("up and count > 1"), Ok(ValueType::Boolean));
        assert_eq!(
            infer_str("not count"),
            Err("`not` requires boolean operands, found integer".to_string())
        );
    }

    #[test]
    fn negating_a_string_is_rejected() {
        assert_eq!(infer_str("-name == 'x'"), Err("cannot negate a string".to_string()));
    }

    #[test]
    fn unknown_identifier() {
        assert_eq!(infer_str("missing > 1"), Err("unknown identifier `missing`".to_string()));
    }
}
