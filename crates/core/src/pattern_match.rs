//! LIKE-style wildcard matching used by `Like` filter expressions.
//!
//! Two wildcards are recognised:
//! - `%` matches zero or more characters
//! - `_` matches exactly one character
//!
//! Matching is case-sensitive and operates on Unicode scalar values.

use alloc::vec::Vec;

/// Matches `value` against a LIKE `pattern`.
///
/// ```
/// use stowage_core::pattern_match::like;
/// assert!(like("child1.2", "child1.%"));
/// assert!(like("root3", "root_"));
/// assert!(!like("root3", "child%"));
/// ```
pub fn like(value: &str, pattern: &str) -> bool {
    let v: Vec<char> = value.chars().collect();
    let p: Vec<char> = pattern.chars().collect();

    // Greedy scan with a single backtrack point at the last `%`.
    let (mut vi, mut pi) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;

    while vi < v.len() {
        if pi < p.len() && (p[pi] == '_' || p[pi] == v[vi]) {
            vi += 1;
            pi += 1;
        } else if pi < p.len() && p[pi] == '%' {
            star = Some((pi, vi));
            pi += 1;
        } else if let Some((sp, sv)) = star {
            pi = sp + 1;
            vi = sv + 1;
            star = Some((sp, sv + 1));
        } else {
            return false;
        }
    }

    while pi < p.len() && p[pi] == '%' {
        pi += 1;
    }
    pi == p.len()
}
