//! Sort descriptors.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt;
use stowage_core::{Error, Record, Result, Value};

/// Callable record comparator.
pub type Comparator = Rc<dyn Fn(&Record, &Record) -> Ordering>;

/// One field of a multi-key sort.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortKey {
    pub property: String,
    pub descending: bool,
}

impl SortKey {
    pub fn asc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            descending: false,
        }
    }

    pub fn desc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            descending: true,
        }
    }
}

/// Sort descriptor: either ordered field keys or a comparator.
#[derive(Clone)]
pub enum SortCriteria {
    /// Compare by each key in turn; later keys break ties.
    Fields(Vec<SortKey>),
    /// Caller supplied comparison.
    Comparator(Comparator),
}

impl SortCriteria {
    /// Single-field sort.
    pub fn by(property: impl Into<String>, descending: bool) -> Self {
        SortCriteria::Fields(alloc::vec![SortKey {
            property: property.into(),
            descending,
        }])
    }

    pub fn comparator<F>(f: F) -> Self
    where
        F: Fn(&Record, &Record) -> Ordering + 'static,
    {
        SortCriteria::Comparator(Rc::new(f))
    }

    /// Appends a tie-breaking key. Has no effect on comparator sorts.
    pub fn then_by(self, property: impl Into<String>, descending: bool) -> Self {
        match self {
            SortCriteria::Fields(mut keys) => {
                keys.push(SortKey {
                    property: property.into(),
                    descending,
                });
                SortCriteria::Fields(keys)
            }
            other => other,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            SortCriteria::Fields(keys) if keys.is_empty() => {
                Err(Error::invalid_sort("no sort keys given"))
            }
            SortCriteria::Fields(keys) if keys.iter().any(|k| k.property.is_empty()) => {
                Err(Error::invalid_sort("sort key with an empty property name"))
            }
            _ => Ok(()),
        }
    }

    /// Compares two records. Missing fields sort as `Null`, i.e. first.
    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        match self {
            SortCriteria::Comparator(f) => f(a, b),
            SortCriteria::Fields(keys) => {
                for key in keys {
                    let left = a.get(&key.property).unwrap_or(&Value::Null);
                    let right = b.get(&key.property).unwrap_or(&Value::Null);
                    let ord = if key.descending {
                        right.cmp(left)
                    } else {
                        left.cmp(right)
                    };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            }
        }
    }
}

impl fmt::Debug for SortCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortCriteria::Fields(keys) => f.debug_tuple("Fields").field(keys).finish(),
            SortCriteria::Comparator(_) => f.write_str("Comparator(<fn>)"),
        }
    }
}

impl From<&str> for SortCriteria {
    fn from(property: &str) -> Self {
        SortCriteria::by(property, false)
    }
}

impl From<(&str, bool)> for SortCriteria {
    fn from((property, descending): (&str, bool)) -> Self {
        SortCriteria::by(property, descending)
    }
}

impl From<SortKey> for SortCriteria {
    fn from(key: SortKey) -> Self {
        SortCriteria::Fields(alloc::vec![key])
    }
}

impl From<Vec<SortKey>> for SortCriteria {
    fn from(keys: Vec<SortKey>) -> Self {
        SortCriteria::Fields(keys)
    }
}
