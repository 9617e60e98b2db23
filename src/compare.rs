//! Month-over-month comparison of two per-product aggregate tables.
//!
//! Products are aligned on the union of both tables' keys; a product absent
//! from one side contributes 0 there. The growth rate is only defined when
//! the prior amount is positive, so a brand-new product reports no rate
//! instead of leaking infinity into the output.

use std::collections::HashMap;
use std::fmt;

use anyhow::{Context, Result, anyhow};
use itertools::Itertools;
use log::info;
use serde::Serialize;

use crate::{
    aggregate::AggregateRow,
    analyze::{self, AnalysisReport},
    cli::CompareArgs,
    dataset, io_utils, report,
};

/// Default growth/decline classification threshold, as a fraction.
pub const DEFAULT_GROWTH_THRESHOLD: f64 = 0.05;

/// Trend classification for one product across the two periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    New,
    Growing,
    Declining,
    Discontinued,
    Flat,
}

impl Trend {
    pub fn label(&self) -> &'static str {
        match self {
            Trend::New => "new",
            Trend::Growing => "growing",
            Trend::Declining => "declining",
            Trend::Discontinued => "discontinued",
            Trend::Flat => "flat",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One product's cross-period rollup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub product: String,
    pub prior_amount: f64,
    pub current_amount: f64,
    pub amount_delta: f64,
    /// `None` when the prior amount is 0 and no rate is defined.
    pub growth_rate: Option<f64>,
    pub prior_quantity: f64,
    pub current_quantity: f64,
    pub trend: Trend,
}

/// Full comparison output: the diff table plus both source tables.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub threshold: f64,
    pub rows: Vec<ComparisonRow>,
    pub prior: Vec<AggregateRow>,
    pub current: Vec<AggregateRow>,
}

/// Aligns two per-product tables and classifies each product's trend.
///
/// `threshold` is a fraction (0.05 = 5%); rates must exceed it strictly, so
/// a product at exactly +5% stays `flat`. Output is sorted descending by
/// absolute amount delta, ties broken by ascending product name.
pub fn compare_tables(
    prior: &[AggregateRow],
    current: &[AggregateRow],
    threshold: f64,
) -> Vec<ComparisonRow> {
    let prior_by_product: HashMap<&str, &AggregateRow> =
        prior.iter().map(|row| (row.product.as_str(), row)).collect();
    let current_by_product: HashMap<&str, &AggregateRow> = current
        .iter()
        .map(|row| (row.product.as_str(), row))
        .collect();

    let products = prior
        .iter()
        .chain(current.iter())
        .map(|row| row.product.as_str())
        .unique();

    let mut rows: Vec<ComparisonRow> = products
        .map(|product| {
            let before = prior_by_product.get(product).copied();
            let after = current_by_product.get(product).copied();
            let prior_amount = before.map_or(0.0, |row| row.amount);
            let current_amount = after.map_or(0.0, |row| row.amount);
            let amount_delta = current_amount - prior_amount;
            let growth_rate = (prior_amount > 0.0).then(|| amount_delta / prior_amount);
            ComparisonRow {
                product: product.to_string(),
                prior_amount,
                current_amount,
                amount_delta,
                growth_rate,
                prior_quantity: before.map_or(0.0, |row| row.quantity),
                current_quantity: after.map_or(0.0, |row| row.quantity),
                trend: classify(prior_amount, current_amount, growth_rate, threshold),
            }
        })
        .collect();
    rows.sort_by(|a, b| {
        b.amount_delta
            .abs()
            .total_cmp(&a.amount_delta.abs())
            .then_with(|| a.product.cmp(&b.product))
    });
    rows
}

fn classify(prior: f64, current: f64, growth_rate: Option<f64>, threshold: f64) -> Trend {
    if prior == 0.0 && current > 0.0 {
        return Trend::New;
    }
    if current == 0.0 && prior > 0.0 {
        return Trend::Discontinued;
    }
    match growth_rate {
        Some(rate) if rate > threshold => Trend::Growing,
        Some(rate) if rate < -threshold => Trend::Declining,
        _ => Trend::Flat,
    }
}

pub fn execute(args: &CompareArgs) -> Result<()> {
    if !args.threshold.is_finite() || args.threshold < 0.0 {
        return Err(anyhow!(
            "--threshold must be a non-negative percentage, got {}",
            args.threshold
        ));
    }
    let threshold = args.threshold / 100.0;

    let prior = load_period(args, &args.prior)?;
    let current = load_period(args, &args.current)?;
    let rows = compare_tables(&prior.products, &current.products, threshold);
    info!(
        "Compared {} product(s) across {:?} and {:?}",
        rows.len(),
        args.prior,
        args.current
    );

    let comparison = ComparisonReport {
        threshold,
        rows,
        prior: prior.products,
        current: current.products,
    };

    if args.json {
        report::write_comparison_json(args.output.as_deref(), &comparison)?;
    } else if let Some(path) = &args.output {
        report::write_comparison_csv(path, &comparison.rows)
            .with_context(|| format!("Writing comparison to {path:?}"))?;
        info!("Comparison table written to {path:?}");
    } else {
        report::print_comparison(&comparison, args.limit);
    }
    Ok(())
}

fn load_period(args: &CompareArgs, path: &std::path::Path) -> Result<AnalysisReport> {
    let delimiter = io_utils::resolve_input_delimiter(path, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let dataset = dataset::read_dataset(path, delimiter, encoding, args.max_rows)
        .with_context(|| format!("Reading {path:?}"))?;
    analyze::analyze(&dataset).with_context(|| format!("Analyzing {path:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(&str, f64, f64)]) -> Vec<AggregateRow> {
        entries
            .iter()
            .map(|(product, quantity, amount)| AggregateRow {
                product: product.to_string(),
                size: None,
                quantity: *quantity,
                amount: *amount,
                shipping: 0.0,
                quantity_share: 0.0,
                amount_share: 0.0,
            })
            .collect()
    }

    fn find<'a>(rows: &'a [ComparisonRow], product: &str) -> &'a ComparisonRow {
        rows.iter()
            .find(|row| row.product == product)
            .unwrap_or_else(|| panic!("missing product {product}"))
    }

    #[test]
    fn classifies_new_growing_and_discontinued() {
        let prior = table(&[("A", 10.0, 100.0), ("B", 20.0, 200.0)]);
        let current = table(&[("A", 12.0, 120.0), ("B", 0.0, 0.0), ("C", 5.0, 50.0)]);
        let rows = compare_tables(&prior, &current, DEFAULT_GROWTH_THRESHOLD);

        let a = find(&rows, "A");
        assert_eq!(a.trend, Trend::Growing);
        assert!((a.growth_rate.expect("rate") - 0.2).abs() < 1e-9);

        let b = find(&rows, "B");
        assert_eq!(b.trend, Trend::Discontinued);
        assert_eq!(b.amount_delta, -200.0);

        let c = find(&rows, "C");
        assert_eq!(c.trend, Trend::New);
        assert_eq!(c.growth_rate, None);
    }

    #[test]
    fn delta_is_exact_for_products_on_both_sides() {
        let prior = table(&[("A", 1.0, 123.45)]);
        let current = table(&[("A", 1.0, 150.00)]);
        let rows = compare_tables(&prior, &current, DEFAULT_GROWTH_THRESHOLD);
        assert_eq!(rows[0].amount_delta, 150.00 - 123.45);
    }

    #[test]
    fn threshold_boundary_is_strict() {
        let prior = table(&[("低", 0.0, 100_000.0), ("平", 0.0, 100_000.0), ("高", 0.0, 100_000.0)]);
        let current = table(&[
            ("低", 0.0, 104_999.0),
            ("平", 0.0, 105_000.0),
            ("高", 0.0, 105_001.0),
        ]);
        let rows = compare_tables(&prior, &current, DEFAULT_GROWTH_THRESHOLD);
        assert_eq!(find(&rows, "低").trend, Trend::Flat, "+4.999% stays flat");
        assert_eq!(find(&rows, "平").trend, Trend::Flat, "exactly +5% stays flat");
        assert_eq!(find(&rows, "高").trend, Trend::Growing, "+5.001% grows");
    }

    #[test]
    fn decline_mirror_of_threshold() {
        let prior = table(&[("A", 0.0, 100_000.0), ("B", 0.0, 100_000.0)]);
        let current = table(&[("A", 0.0, 95_000.0), ("B", 0.0, 94_999.0)]);
        let rows = compare_tables(&prior, &current, DEFAULT_GROWTH_THRESHOLD);
        assert_eq!(find(&rows, "A").trend, Trend::Flat, "exactly -5% stays flat");
        assert_eq!(find(&rows, "B").trend, Trend::Declining);
    }

    #[test]
    fn sorts_by_absolute_delta_descending() {
        let prior = table(&[("A", 0.0, 100.0), ("B", 0.0, 500.0), ("C", 0.0, 50.0)]);
        let current = table(&[("A", 0.0, 110.0), ("B", 0.0, 100.0), ("C", 0.0, 300.0)]);
        let rows = compare_tables(&prior, &current, DEFAULT_GROWTH_THRESHOLD);
        let order: Vec<&str> = rows.iter().map(|row| row.product.as_str()).collect();
        // |B| = 400, |C| = 250, |A| = 10.
        assert_eq!(order, vec!["B", "C", "A"]);
    }

    #[test]
    fn empty_sides_use_union_semantics() {
        let current = table(&[("A", 1.0, 10.0)]);
        let rows = compare_tables(&[], &current, DEFAULT_GROWTH_THRESHOLD);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].trend, Trend::New);
        assert_eq!(rows[0].prior_amount, 0.0);

        assert!(compare_tables(&[], &[], DEFAULT_GROWTH_THRESHOLD).is_empty());
    }

    #[test]
    fn zero_on_both_sides_is_flat() {
        let prior = table(&[("A", 0.0, 0.0)]);
        let current = table(&[("A", 0.0, 0.0)]);
        let rows = compare_tables(&prior, &current, DEFAULT_GROWTH_THRESHOLD);
        assert_eq!(rows[0].trend, Trend::Flat);
        assert_eq!(rows[0].growth_rate, None);
    }
}
