//! Library-level pipeline tests: datasets in, result tables out, no CLI.

use proptest::prelude::*;

use shop_metrics::{
    aggregate::{self, GroupBy},
    analyze::analyze,
    compare::{DEFAULT_GROWTH_THRESHOLD, Trend, compare_tables},
    dataset::Dataset,
    record::Record,
};

fn dataset(headers: &[&str], rows: &[&[&str]]) -> Dataset {
    Dataset::new(
        headers.iter().map(|h| h.to_string()).collect(),
        rows.iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect(),
    )
}

#[test]
fn analysis_and_comparison_compose() {
    let prior = analyze(&dataset(
        &["产品", "数量", "金额"],
        &[&["A", "10", "100"], &["B", "20", "200"]],
    ))
    .expect("prior analysis");
    let current = analyze(&dataset(
        &["产品", "数量", "金额"],
        &[&["A", "12", "120"], &["C", "5", "50"]],
    ))
    .expect("current analysis");

    let rows = compare_tables(&prior.products, &current.products, DEFAULT_GROWTH_THRESHOLD);
    assert_eq!(rows.len(), 3);

    let by_product = |name: &str| {
        rows.iter()
            .find(|row| row.product == name)
            .unwrap_or_else(|| panic!("missing {name}"))
    };
    assert_eq!(by_product("A").trend, Trend::Growing);
    assert_eq!(by_product("B").trend, Trend::Discontinued);
    assert_eq!(by_product("C").trend, Trend::New);
    assert_eq!(by_product("A").amount_delta, 20.0);
}

#[test]
fn mixed_header_languages_resolve_to_the_same_tables() {
    let chinese = analyze(&dataset(
        &["产品", "数量", "金额"],
        &[&["A", "2", "40"], &["B", "1", "60"]],
    ))
    .expect("chinese headers");
    let english = analyze(&dataset(
        &["Item", "Qty", "Sales"],
        &[&["A", "2", "40"], &["B", "1", "60"]],
    ))
    .expect("english headers");
    assert_eq!(chinese.products, english.products);
}

fn arbitrary_records() -> impl Strategy<Value = Vec<Record>> {
    proptest::collection::vec(
        (0usize..5, 0.0f64..100.0, 0.01f64..1000.0).prop_map(|(product, quantity, amount)| {
            Record {
                product: format!("P{product}"),
                size: None,
                quantity,
                amount,
                shipping: 0.0,
                date: None,
            }
        }),
        1..50,
    )
}

proptest! {
    #[test]
    fn amount_shares_sum_to_one(records in arbitrary_records()) {
        let rows = aggregate::aggregate(&records, GroupBy::Product);
        let total: f64 = rows.iter().map(|row| row.amount_share).sum();
        prop_assert!((total - 1.0).abs() < 1e-9, "shares summed to {total}");
    }

    #[test]
    fn group_totals_match_record_totals(records in arbitrary_records()) {
        let rows = aggregate::aggregate(&records, GroupBy::Product);
        let grouped: f64 = rows.iter().map(|row| row.amount).sum();
        let direct: f64 = records.iter().map(|record| record.amount).sum();
        prop_assert!((grouped - direct).abs() < 1e-6);
    }
}
