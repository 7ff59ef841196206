//! Recursive-descent parser producing the condition AST.
//!
//! Precedence, loosest first: `or`, `and`, `not`, comparisons (chainable),
//! `+ -`, `* /`, unary `-`.

use std::fmt;

use super::lexer::{Spanned, Token};
use super::Value;

/// Deepest allowed nesting of parentheses, `not` and unary `-`.
pub(super) const MAX_DEPTH: usize = 64;

/// Longest accepted expression, in tokens. Together with [`MAX_DEPTH`] this
/// bounds the recursion of type checking and evaluation.
pub(super) const MAX_TOKENS: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl fmt::Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl CompareOp {
    pub fn is_equality(self) -> bool {
        matches!(self, Self::Eq | Self::Ne)
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Eq => "==",
            Self::Ne => "!=",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(super) enum Expr {
    Literal(Value),
    Variable(String),
    Neg(Box<Expr>),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Arith {
        op: ArithOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// `first op0 e0 op1 e1 ...`, true when every adjacent pair holds.
    Compare {
        first: Box<Expr>,
        rest: Vec<(CompareOp, Expr)>,
    },
}

pub(super) fn parse(tokens: &[Spanned]) -> Result<Expr, String> {
    if tokens.is_empty() {
        return Err("empty expression".to_string());
    }
    if tokens.len() > MAX_TOKENS {
        return Err(format!("expression too long, limit is {MAX_TOKENS} tokens"));
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.or()?;
    match parser.peek() {
        None => Ok(expr),
        Some(extra) => Err(format!(
            "unexpected {} at offset {}",
            describe(&extra.token),
            extra.offset
        )),
    }
}

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Spanned> {
        self.tokens.get(self.pos)
    }

    fn peek_token(&self) -> Option<&'a Token> {
        self.peek().map(|s| &s.token)
    }

    fn advance(&mut self) -> Option<&'a Spanned> {
        let next = self.tokens.get(self.pos);
        if next.is_some() {
            self.pos += 1;
        }
        next
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek_token() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Run `rule` one nesting level deeper.
    fn nested(&mut self, rule: fn(&mut Self) -> Result<Expr, String>) -> Result<Expr, String> {
        if self.depth >= MAX_DEPTH {
            return Err("expression nested too deeply".to_string());
        }
        self.depth += 1;
        let result = rule(self);
        self.depth -= 1;
        result
    }

    fn or(&mut self) -> Result<Expr, String> {
        let mut lhs = self.and()?;
        while self.eat(&Token::Or) {
            let rhs = self.and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<Expr, String> {
        let mut lhs = self.not()?;
        while self.eat(&Token::And) {
            let rhs = self.not()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn not(&mut self) -> Result<Expr, String> {
        if self.eat(&Token::Not) {
            return Ok(Expr::Not(Box::new(self.nested(Self::not)?)));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr, String> {
        let first = self.additive()?;
        let mut rest = Vec::new();

        while let Some(op) = self.peek_token().and_then(compare_op) {
            self.pos += 1;
            rest.push((op, self.additive()?));
        }

        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Compare {
                first: Box::new(first),
                rest,
            })
        }
    }

    fn additive(&mut self) -> Result<Expr, String> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek_token() {
                Some(Token::Plus) => ArithOp::Add,
                Some(Token::Minus) => ArithOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Expr::Arith {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn term(&mut self) -> Result<Expr, String> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek_token() {
                Some(Token::Star) => ArithOp::Mul,
                Some(Token::Slash) => ArithOp::Div,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::Arith {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn unary(&mut self) -> Result<Expr, String> {
        if self.eat(&Token::Minus) {
            return Ok(Expr::Neg(Box::new(self.nested(Self::unary)?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, String> {
        let Some(spanned) = self.advance() else {
            return Err("unexpected end of expression".to_string());
        };

        match &spanned.token {
            Token::Integer(v) => Ok(Expr::Literal(Value::Integer(*v))),
            Token::Float(v) => Ok(Expr::Literal(Value::Float(*v))),
            Token::Str(s) => Ok(Expr::Literal(Value::String(s.clone()))),
            Token::True => Ok(Expr::Literal(Value::Boolean(true))),
            Token::False => Ok(Expr::Literal(Value::Boolean(false))),
            Token::Ident(name) => Ok(Expr::Variable(name.clone())),
            Token::LParen => {
                let inner = self.nested(Self::or)?;
                if self.eat(&Token::RParen) {
                    Ok(inner)
                } else {
                    Err(format!("unclosed `(` at offset {}", spanned.offset))
                }
            }
            other => Err(format!(
                "unexpected {} at offset {}",
                describe(other),
                spanned.offset
            )),
        }
    }
}

fn compare_op(token: &Token) -> Option<CompareOp> {
    match token {
        Token::Lt => Some(CompareOp::Lt),
        Token::Le => Some(CompareOp::Le),
        Token::Gt => Some(CompareOp::Gt),
        Token::Ge => Some(CompareOp::Ge),
        Token::Eq => Some(CompareOp::Eq),
        Token::Ne => Some(CompareOp::Ne),
        _ => None,
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Integer(v) => format!("number `{v}`"),
        Token::Float(v) => format!("number `{v}`"),
        Token::Str(s) => format!("string {s:?}"),
        Token::Ident(name) => format!("identifier `{name}`"),
        Token::True => "`true`".to_string(),
        Token::False => "`false`".to_string(),
        Token::And => "`and`".to_string(),
        Token::Or => "`or`".to_string(),
        Token::Not => "`not`".to_string(),
        Token::Lt => "`<`".to_string(),
        Token::Le => "`<=`".to_string(),
        Token::Gt => "`>`".to_string(),
        Token::Ge => "`>=`".to_string(),
        Token::Eq => "`==`".to_string(),
        Token::Ne => "`!=`".to_string(),
        Token::Plus => "`+`".to_string(),
        Token::Minus => "`-`".to_string(),
        Token::Star => "`*`".to_string(),
        Token::Slash => "`/`".to_string(),
        Token::LParen => "`(`".to_string(),
        Token::RParen => "`)`".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::lexer::tokenize;

    fn parse_str(src: &str) -> Result<Expr, String> {
        parse(&tokenize(src).unwrap())
    }

    fn var(name: &str) -> Box<Expr> {
        Box::new(Expr::Variable(name.to_string()))
    }

    fn int(v: i64) -> Box<Expr> {
        Box::new(Expr::Literal(Value::Integer(v)))
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let expr = parse_str("a + b * 2").unwrap();
        assert_eq!(
            expr,
            Expr::Arith {
                op: ArithOp::Add,
                lhs: var("a"),
                rhs: Box::new(Expr::Arith {
                    op: ArithOp::Mul,
                    lhs: var("b"),
                    rhs: int(2),
                }),
            }
        );
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let expr = parse_str("a or b and c").unwrap();
        assert_eq!(
            expr,
            Expr::Or(var("a"), Box::new(Expr::And(var("b"), var("c"))))
        );
    }

    #[test]
    fn not_applies_to_whole_comparison() {
        let expr = parse_str("not a > 1").unwrap();
        assert_eq!(
            expr,
            Expr::Not(Box::new(Expr::Compare {
                first: var("a"),
                rest: vec![(CompareOp::Gt, *int(1))],
            }))
        );
    }

    #[test]
    fn comparisons_chain() {
        let expr = parse_str("1 < a <= 3").unwrap();
        assert_eq!(
            expr,
            Expr::Compare {
                first: int(1),
                rest: vec![(CompareOp::Lt, *var("a")), (CompareOp::Le, *int(3))],
            }
        );
    }

    #[test]
    fn subtraction_is_left_associative() {
        let expr = parse_str("a - 1 - 2").unwrap();
        assert_eq!(
            expr,
            Expr::Arith {
                op: ArithOp::Sub,
                lhs: Box::new(Expr::Arith {
                    op: ArithOp::Sub,
                    lhs: var("a"),
                    rhs: int(1),
                }),
                rhs: int(2),
            }
        );
    }

    #[test]
    fn reports_trailing_tokens() {
        let err = parse_str("a > 1 )").unwrap_err();
        assert_eq!(err, "unexpected `)` at offset 6");
    }

    #[test]
    fn reports_unclosed_paren() {
        assert_eq!(parse_str("(a > 1").unwrap_err(), "unclosed `(` at offset 0");
    }

    #[test]
    fn reports_missing_operand() {
        assert_eq!(parse_str("a >").unwrap_err(), "unexpected end of expression");
        assert!(parse(&[]).is_err());
    }

    #[test]
    fn nesting_up_to_the_limit_is_accepted() {
        let src = format!("{}a{}", "(".repeat(MAX_DEPTH), ")".repeat(MAX_DEPTH));
        assert_eq!(parse_str(&src).unwrap(), *var("a"));
        assert!(parse_str(&format!("{}a", "-".repeat(MAX_DEPTH))).is_ok());
    }

    #[test]
    fn nesting_past_the_limit_is_rejected() {
        let depth = MAX_DEPTH + 1;
        let src = format!("{}a{}", "(".repeat(depth), ")".repeat(depth));
        assert_eq!(parse_str(&src).unwrap_err(), "expression nested too deeply");
        assert_eq!(
            parse_str(&format!("{}a", "not ".repeat(depth))).unwrap_err(),
            "expression nested too deeply"
        );
        assert_eq!(
            parse_str(&format!("{}a", "- ".repeat(depth))).unwrap_err(),
            "expression nested too deeply"
        );
    }

    #[test]
    fn overlong_expression_is_rejected() {
        let src = vec!["a"; MAX_TOKENS].join(" + ");
        assert_eq!(
            parse_str(&src).unwrap_err(),
            format!("expression too long, limit is {MAX_TOKENS} tokens")
        );
    }
}
