//! Composable filter expressions.
//!
//! `Expr` is the structured alternative to closure predicates. Unlike a
//! closure it can be inspected, validated up front and combined with
//! `and`/`or`/`negate` without losing that structure.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::cmp::Ordering;
use stowage_core::pattern_match::like;
use stowage_core::{Error, Record, Result, Value};

/// Comparison operators for field/value expressions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Filter expression AST node.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Field compared to a literal.
    Compare {
        field: String,
        op: CompareOp,
        value: Value,
    },
    /// Field equals one of the listed values.
    In { field: String, values: Vec<Value> },
    /// List field contains the value, or string field contains the substring.
    Contains { field: String, value: Value },
    /// String field matches a LIKE pattern.
    Like { field: String, pattern: String },
    /// Field is missing or null.
    IsNull { field: String },
    /// All children hold. An empty conjunction is true.
    And(Vec<Expr>),
    /// Any child holds. An empty disjunction is false.
    Or(Vec<Expr>),
    /// Child does not hold.
    Not(Box<Expr>),
}

impl Expr {
    fn compare(field: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Expr::Compare {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Eq, value)
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Ne, value)
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Lt, value)
    }

    pub fn le(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Le, value)
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Gt, value)
    }

    pub fn ge(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Ge, value)
    }

    pub fn is_in(field: impl Into<String>, values: impl IntoIterator<Item = Value>) -> Self {
        Expr::In {
            field: field.into(),
            values: values.into_iter().collect(),
        }
    }

    pub fn contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Expr::Contains {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Expr::Like {
            field: field.into(),
            pattern: pattern.into(),
        }
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        Expr::IsNull {
            field: field.into(),
        }
    }

    /// Conjunction, flattening nested `And` nodes.
    pub fn and(self, other: Expr) -> Self {
        match (self, other) {
            (Expr::And(mut left), Expr::And(right)) => {
                left.extend(right);
                Expr::And(left)
            }
            (Expr::And(mut left), right) => {
                left.push(right);
                Expr::And(left)
            }
            (left, right) => Expr::And(alloc::vec![left, right]),
        }
    }

    /// Disjunction, flattening nested `Or` nodes.
    pub fn or(self, other: Expr) -> Self {
        match (self, other) {
            (Expr::Or(mut left), Expr::Or(right)) => {
                left.extend(right);
                Expr::Or(left)
            }
            (Expr::Or(mut left), right) => {
                left.push(right);
                Expr::Or(left)
            }
            (left, right) => Expr::Or(alloc::vec![left, right]),
        }
    }

    /// Negation; double negation collapses.
    pub fn negate(self) -> Self {
        match self {
            Expr::Not(inner) => *inner,
            other => Expr::Not(Box::new(other)),
        }
    }

    /// Checks that every field reference is non-empty.
    pub fn validate(&self) -> Result<()> {
        match self {
            Expr::Compare { field, .. }
            | Expr::In { field, .. }
            | Expr::Contains { field, .. }
            | Expr::Like { field, .. }
            | Expr::IsNull { field } => {
                if field.is_empty() {
                    Err(Error::invalid_filter("expression references an empty field name"))
                } else {
                    Ok(())
                }
            }
            Expr::And(children) | Expr::Or(children) => {
                children.iter().try_for_each(Expr::validate)
            }
            Expr::Not(inner) => inner.validate(),
        }
    }

    /// Evaluates the expression against a record.
    pub fn eval(&self, record: &Record) -> bool {
        match self {
            Expr::Compare { field, op, value } => {
                let actual = record.get(field).unwrap_or(&Value::Null);
                eval_compare(actual, *op, value)
            }
            Expr::In { field, values } => {
                let actual = record.get(field).unwrap_or(&Value::Null);
                values.iter().any(|v| v == actual)
            }
            Expr::Contains { field, value } => match record.get(field) {
                Some(Value::List(items)) => items.contains(value),
                Some(Value::String(s)) => value.as_str().map(|sub| s.contains(sub)).unwrap_or(false),
                _ => false,
            },
            Expr::Like { field, pattern } => record
                .get(field)
                .and_then(Value::as_str)
                .map(|s| like(s, pattern))
                .unwrap_or(false),
            Expr::IsNull { field } => record.get(field).map(Value::is_null).unwrap_or(true),
            Expr::And(children) => children.iter().all(|c| c.eval(record)),
            Expr::Or(children) => children.iter().any(|c| c.eval(record)),
            Expr::Not(inner) => !inner.eval(record),
        }
    }
}

/// Ordering operators only hold between values of comparable kinds; a
/// missing field never satisfies `<` and friends.
fn eval_compare(actual: &Value, op: CompareOp, expected: &Value) -> bool {
    match op {
        CompareOp::Eq => actual == expected,
        CompareOp::Ne => actual != expected,
        _ => {
            let comparable = !actual.is_null()
                && ((actual.is_numeric() && expected.is_numeric())
                    || actual.kind() == expected.kind());
            if !comparable {
                return false;
            }
            let ord = actual.cmp(expected);
            match op {
                CompareOp::Lt => ord == Ordering::Less,
                CompareOp::Le => ord != Ordering::Greater,
                CompareOp::Gt => ord == Ordering::Greater,
                CompareOp::Ge => ord != Ordering::Less,
                CompareOp::Eq | CompareOp::Ne => unreachable!(),
            }
        }
    }
}
