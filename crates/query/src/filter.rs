//! Filter descriptors.
//!
//! A filter is one of three shapes: a structural match over named fields, a
//! callable predicate, or a composable [`Expr`]. Filters accumulated on a
//! collection are AND-composed.

use crate::expr::Expr;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use stowage_core::{Error, Record, Result, Value};

/// Callable record predicate.
pub type RecordPredicate = Rc<dyn Fn(&Record) -> bool>;

/// Callable field predicate.
pub type ValuePredicate = Rc<dyn Fn(&Value) -> bool>;

/// How a single field of a structural match is tested.
#[derive(Clone)]
pub enum Matcher {
    /// Field must equal the value. A missing field equals `Null`.
    Equals(Value),
    /// Field value must satisfy the predicate. Missing fields are passed as `Null`.
    Test(ValuePredicate),
}

impl Matcher {
    pub fn test<F>(f: F) -> Self
    where
        F: Fn(&Value) -> bool + 'static,
    {
        Matcher::Test(Rc::new(f))
    }

    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Matcher::Equals(expected) => expected == value,
            Matcher::Test(f) => f(value),
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Equals(v) => f.debug_tuple("Equals").field(v).finish(),
            Matcher::Test(_) => f.write_str("Test(<fn>)"),
        }
    }
}

macro_rules! matcher_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Matcher {
                fn from(v: $t) -> Self {
                    Matcher::Equals(Value::from(v))
                }
            }
        )*
    };
}

matcher_from!(Value, bool, i32, i64, u64, f64, String, &str);

/// A filter descriptor.
#[derive(Clone)]
pub enum Filter {
    /// Every listed field must match.
    Match(Vec<(String, Matcher)>),
    /// Arbitrary predicate over the whole record.
    Predicate(RecordPredicate),
    /// Structured expression.
    Expr(Expr),
}

impl Filter {
    /// Builds a structural match from `(field, matcher)` pairs.
    ///
    /// ```
    /// use stowage_query::{Filter, Matcher};
    ///
    /// let filter = Filter::fields([
    ///     ("kind", Matcher::from("task")),
    ///     ("p", Matcher::test(|v| v.as_i64().map_or(false, |p| p > 4))),
    /// ]);
    /// ```
    pub fn fields<K, M, I>(fields: I) -> Self
    where
        K: Into<String>,
        M: Into<Matcher>,
        I: IntoIterator<Item = (K, M)>,
    {
        Filter::Match(
            fields
                .into_iter()
                .map(|(k, m)| (k.into(), m.into()))
                .collect(),
        )
    }

    /// Single-field structural match.
    pub fn field(field: impl Into<String>, matcher: impl Into<Matcher>) -> Self {
        Filter::Match(alloc::vec![(field.into(), matcher.into())])
    }

    /// Builds a predicate filter.
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Record) -> bool + 'static,
    {
        Filter::Predicate(Rc::new(f))
    }

    /// Rejects descriptors that can never be evaluated.
    pub fn validate(&self) -> Result<()> {
        match self {
            Filter::Match(fields) => {
                if fields.iter().any(|(name, _)| name.is_empty()) {
                    Err(Error::invalid_filter("structural match with an empty field name"))
                } else {
                    Ok(())
                }
            }
            Filter::Predicate(_) => Ok(()),
            Filter::Expr(expr) => expr.validate(),
        }
    }

    /// Tests a record against this filter.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Filter::Match(fields) => fields.iter().all(|(name, matcher)| {
                matcher.matches(record.get(name).unwrap_or(&Value::Null))
            }),
            Filter::Predicate(f) => f(record),
            Filter::Expr(expr) => expr.eval(record),
        }
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Match(fields) => f.debug_tuple("Match").field(fields).finish(),
            Filter::Predicate(_) => f.write_str("Predicate(<fn>)"),
            Filter::Expr(expr) => f.debug_tuple("Expr").field(expr).finish(),
        }
    }
}

impl From<Expr> for Filter {
    fn from(expr: Expr) -> Self {
        Filter::Expr(expr)
    }
}
