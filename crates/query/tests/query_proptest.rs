//! Property-based tests for query descriptors and execution.

use proptest::prelude::*;
use stowage_core::{Record, Value};
use stowage_query::{
    execute, Expr, Pushdown, Query, Range, SimpleQueryEngine, SortCriteria, SortKey,
};

/// Strategy for records with an `id` in source order and two small keys.
fn records_strategy(max_rows: usize) -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec((-20i64..20, 0i64..4), 0..max_rows).prop_map(|values| {
        values
            .into_iter()
            .enumerate()
            .map(|(i, (p, g))| Record::new().with("id", i as i64).with("p", p).with("g", g))
            .collect()
    })
}

fn expr_strategy() -> impl Strategy<Value = Expr> {
    let leaf = prop_oneof![
        (-20i64..20).prop_map(|v| Expr::gt("p", v)),
        (-20i64..20).prop_map(|v| Expr::le("p", v)),
        (0i64..4).prop_map(|v| Expr::eq("g", v)),
        Just(Expr::is_null("missing")),
    ];
    leaf.prop_recursive(3, 16, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a.and(b)),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a.or(b)),
            inner.prop_map(Expr::negate),
        ]
    })
}

fn ids(records: &[Record]) -> Vec<i64> {
    records
        .iter()
        .filter_map(|r| r.get("id").and_then(Value::as_i64))
        .collect()
}

proptest! {
    /// Negation flips every evaluation.
    #[test]
    fn negate_flips_eval(expr in expr_strategy(), records in records_strategy(30)) {
        let negated = expr.clone().negate();
        for record in &records {
            prop_assert_eq!(negated.eval(record), !expr.eval(record));
        }
    }

    /// `and`/`or` agree with boolean logic on their operands.
    #[test]
    fn combinators_match_boolean_logic(
        a in expr_strategy(),
        b in expr_strategy(),
        records in records_strategy(30),
    ) {
        let both = a.clone().and(b.clone());
        let either = a.clone().or(b.clone());
        for record in &records {
            prop_assert_eq!(both.eval(record), a.eval(record) && b.eval(record));
            prop_assert_eq!(either.eval(record), a.eval(record) || b.eval(record));
        }
    }

    /// Multi-key sorts are stable: ties keep source order.
    #[test]
    fn multi_key_sort_is_stable(records in records_strategy(50)) {
        let query = Query::new()
            .with_sort(SortCriteria::Fields(vec![SortKey::asc("g"), SortKey::desc("p")]))
            .unwrap();
        let sorted = execute(&SimpleQueryEngine, &query, records, Pushdown::NONE).records;

        for pair in sorted.windows(2) {
            let ord = query.compare(&pair[0], &pair[1]);
            prop_assert!(ord != std::cmp::Ordering::Greater);
            if ord == std::cmp::Ordering::Equal {
                prop_assert!(ids(&pair[..1])[0] < ids(&pair[1..])[0]);
            }
        }
    }

    /// Executing with a range equals slicing the unranged execution.
    #[test]
    fn range_matches_slice(
        records in records_strategy(40),
        start in 0usize..50,
        len in 0usize..50,
    ) {
        let base = Query::new()
            .with_filter(Expr::gt("p", -10i64).into())
            .unwrap()
            .with_sort("p".into())
            .unwrap();
        let full = execute(&SimpleQueryEngine, &base, records.clone(), Pushdown::NONE);
        let ranged_query = base.with_range(Range::new(start, Some(start + len)).unwrap());
        let ranged = execute(&SimpleQueryEngine, &ranged_query, records, Pushdown::NONE);

        let lo = start.min(full.records.len());
        let hi = (start + len).min(full.records.len());
        prop_assert_eq!(&ranged.records[..], &full.records[lo..hi]);
        prop_assert_eq!(ranged.total_length, Some(full.records.len()));
    }
}
