//! Sandboxed condition language for deriving a status from observed values.
//!
//! A [`Condition`] is compiled once from a short expression such as
//! `value > 50 and value != 77` against a declared set of typed variables,
//! then evaluated any number of times against a [`Context`]. Expressions are
//! parsed into an AST and interpreted directly: there is no access to ambient
//! state, functions, or I/O.
//!
//! Supported syntax: integer, float, string (`'..'` or `".."`) and boolean
//! literals, declared variables, `+ - * /`, unary `-`, the comparisons
//! `< <= > >= == !=` (chainable, `1 < value <= 10`), `and`, `or`, `not`, and
//! parentheses.

mod evaluator;
mod lexer;
mod parser;
mod typecheck;

use std::collections::HashMap;
use std::fmt;

/// Static type of a value in the condition language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Integer,
    Float,
    String,
    Boolean,
}

impl ValueType {
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

/// A runtime value bound into, or produced by, a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Integer(_) => ValueType::Integer,
            Self::Float(_) => ValueType::Float,
            Self::String(_) => ValueType::String,
            Self::Boolean(_) => ValueType::Boolean,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

/// Errors from compiling or evaluating a condition.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConditionError {
    /// The expression could not be parsed or fails static checks.
    #[error("Invalid expression `{expression}`: {message}")]
    InvalidExpression { expression: String, message: String },

    /// A bound value has a type the expression cannot operate on, or the
    /// result is not a boolean.
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// The expression references a variable absent from the context.
    #[error("Unbound variable: {0}")]
    UnboundVariable(String),

    /// Division by zero or integer overflow.
    #[error("Arithmetic error: {0}")]
    Arithmetic(String),
}

/// Variable bindings for one evaluation.
#[derive(Debug, Clone, Default)]
pub struct Context {
    values: HashMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style bind.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }
}

/// A compiled, reusable boolean expression.
///
/// Compiled state is never mutated by evaluation, so a condition can be
/// shared across threads and evaluated concurrently.
#[derive(Debug, Clone)]
pub struct Condition {
    source: String,
    root: parser::Expr,
}

impl Condition {
    /// Parse and type-check `expression` against the declared `variables`.
    ///
    /// Fails with [`ConditionError::InvalidExpression`] on syntax errors,
    /// undeclared identifiers, statically detectable type mismatches, or an
    /// expression whose result is not boolean.
    pub fn compile(
        expression: &str,
        variables: &[(&str, ValueType)],
    ) -> Result<Self, ConditionError> {
        let invalid = |message: String| ConditionError::InvalidExpression {
            expression: expression.to_string(),
            message,
        };

        let tokens = lexer::tokenize(expression).map_err(invalid)?;
        let root = parser::parse(&tokens).map_err(invalid)?;
        let result = typecheck::infer(&root, variables).map_err(invalid)?;
        if result != ValueType::Boolean {
            return Err(invalid(format!(
                "condition must evaluate to a boolean, found {result}"
            )));
        }

        Ok(Self {
            source: expression.to_string(),
            root,
        })
    }

    /// Evaluate against `context`, requiring a boolean result.
    pub fn evaluate(&self, context: &Context) -> Result<bool, ConditionError> {
        match evaluator::eval(&self.root, context)? {
            Value::Boolean(b) => Ok(b),
            other => Err(ConditionError::TypeMismatch(format!(
                "condition `{}` evaluated to {} instead of a boolean",
                self.source,
                other.value_type()
            ))),
        }
    }

    /// The expression text this condition was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
