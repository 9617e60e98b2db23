//! Grouping and percentage-of-total computation.
//!
//! A single pass over the normalized records accumulates per-group sums for
//! quantity, amount, and shipping; shares are derived from the grand totals
//! afterwards. The fold owns all of its state, so repeated analyses never
//! see each other.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::record::{Record, UNSPECIFIED_SIZE};

/// Grouping key selector for one aggregation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Product,
    ProductSize,
}

/// One group's rollup with its share of the grand totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub product: String,
    /// Present only when grouping by product+size.
    pub size: Option<String>,
    pub quantity: f64,
    pub amount: f64,
    pub shipping: f64,
    pub quantity_share: f64,
    pub amount_share: f64,
}

impl AggregateRow {
    pub fn label(&self) -> String {
        match &self.size {
            Some(size) => format!("{} / {}", self.product, size),
            None => self.product.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct RunningTotals {
    quantity: f64,
    amount: f64,
    shipping: f64,
}

/// Dataset-level totals reported alongside the breakdown tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub rows: usize,
    pub total_quantity: f64,
    pub total_amount: f64,
    pub total_shipping: f64,
    pub net_amount: f64,
    pub shipping_share: f64,
    pub product_count: usize,
    pub average_unit_price: f64,
}

/// Groups records by the selected key and computes totals and shares.
///
/// Output is sorted descending by amount, ties broken by descending quantity
/// and then ascending key, so equal inputs always render identically. A zero
/// grand total yields share 0 for every row.
pub fn aggregate(records: &[Record], group_by: GroupBy) -> Vec<AggregateRow> {
    let mut groups: HashMap<(String, Option<String>), RunningTotals> = HashMap::new();
    for record in records {
        let key = match group_by {
            GroupBy::Product => (record.product.clone(), None),
            GroupBy::ProductSize => (
                record.product.clone(),
                Some(
                    record
                        .size
                        .clone()
                        .unwrap_or_else(|| UNSPECIFIED_SIZE.to_string()),
                ),
            ),
        };
        let totals = groups.entry(key).or_default();
        totals.quantity += record.quantity;
        totals.amount += record.amount;
        totals.shipping += record.shipping;
    }

    let grand_quantity: f64 = groups.values().map(|t| t.quantity).sum();
    let grand_amount: f64 = groups.values().map(|t| t.amount).sum();

    let mut rows: Vec<AggregateRow> = groups
        .into_iter()
        .map(|((product, size), totals)| AggregateRow {
            product,
            size,
            quantity: totals.quantity,
            amount: totals.amount,
            shipping: totals.shipping,
            quantity_share: share(totals.quantity, grand_quantity),
            amount_share: share(totals.amount, grand_amount),
        })
        .collect();
    rows.sort_by(|a, b| {
        b.amount
            .total_cmp(&a.amount)
            .then_with(|| b.quantity.total_cmp(&a.quantity))
            .then_with(|| a.product.cmp(&b.product))
            .then_with(|| a.size.cmp(&b.size))
    });
    rows
}

fn share(part: f64, total: f64) -> f64 {
    if total == 0.0 { 0.0 } else { part / total }
}

/// Computes the dataset summary in one pass over the records.
pub fn summarize(records: &[Record]) -> Summary {
    let mut summary = Summary {
        rows: records.len(),
        ..Summary::default()
    };
    let mut products: HashSet<&str> = HashSet::new();
    for record in records {
        summary.total_quantity += record.quantity;
        summary.total_amount += record.amount;
        summary.total_shipping += record.shipping;
        products.insert(record.product.as_str());
    }
    summary.net_amount = summary.total_amount - summary.total_shipping;
    summary.shipping_share = share(summary.total_shipping, summary.total_amount);
    summary.product_count = products.len();
    summary.average_unit_price = share(summary.total_amount, summary.total_quantity);
    summary
}
