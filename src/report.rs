//! Rendering of result tables: aligned text output, CSV export, JSON export.
//!
//! Everything here consumes finished tables; no analysis happens in this
//! module.

use std::{fs::File, io::Write, path::Path};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::{
    aggregate::{AggregateRow, Summary},
    analyze::AnalysisReport,
    compare::{ComparisonReport, ComparisonRow},
    io_utils,
    record::Diagnostics,
    table,
};

pub fn print_analysis(report: &AnalysisReport, limit: usize) {
    print_summary(&report.summary);
    print_aggregate_section("Per-product breakdown", &report.products, false, limit);
    print_aggregate_section(
        "Per-product/size breakdown",
        &report.product_sizes,
        true,
        limit,
    );
    print_diagnostics(&report.diagnostics);
}

pub fn print_comparison(comparison: &ComparisonReport, limit: usize) {
    print_section("Period comparison", comparison.rows.len(), limit);
    let headers = vec![
        "product".to_string(),
        "prior_amount".to_string(),
        "current_amount".to_string(),
        "delta".to_string(),
        "growth".to_string(),
        "prior_qty".to_string(),
        "current_qty".to_string(),
        "trend".to_string(),
    ];
    let rows = limited(&comparison.rows, limit)
        .iter()
        .map(|row| {
            vec![
                row.product.clone(),
                format_amount(row.prior_amount),
                format_amount(row.current_amount),
                format_amount(row.amount_delta),
                format_growth(row.growth_rate),
                format_quantity(row.prior_quantity),
                format_quantity(row.current_quantity),
                row.trend.label().to_string(),
            ]
        })
        .collect::<Vec<_>>();
    table::print_table(&headers, &rows);

    print_aggregate_section("Prior period, per product", &comparison.prior, false, limit);
    print_aggregate_section("Current period, per product", &comparison.current, false, limit);
}

fn print_aggregate_section(title: &str, rows: &[AggregateRow], with_size: bool, limit: usize) {
    print_section(title, rows.len(), limit);
    let headers = aggregate_headers(with_size);
    let cells = limited(rows, limit)
        .iter()
        .map(|row| aggregate_cells(row, with_size))
        .collect::<Vec<_>>();
    table::print_table(&headers, &cells);
}

fn print_summary(summary: &Summary) {
    println!("Summary");
    let headers = vec!["metric".to_string(), "value".to_string()];
    let rows = vec![
        vec!["rows".to_string(), summary.rows.to_string()],
        vec!["total_quantity".to_string(), format_quantity(summary.total_quantity)],
        vec!["total_amount".to_string(), format_amount(summary.total_amount)],
        vec!["total_shipping".to_string(), format_amount(summary.total_shipping)],
        vec!["net_amount".to_string(), format_amount(summary.net_amount)],
        vec!["shipping_share".to_string(), format_share(summary.shipping_share)],
        vec!["products".to_string(), summary.product_count.to_string()],
        vec![
            "average_unit_price".to_string(),
            format_amount(summary.average_unit_price),
        ],
    ];
    table::print_table(&headers, &rows);
}

fn print_diagnostics(diagnostics: &Diagnostics) {
    if diagnostics.is_clean() {
        return;
    }
    println!();
    if diagnostics.coerced_cells > 0 {
        println!(
            "{} numeric cell(s) could not be parsed and were treated as 0",
            diagnostics.coerced_cells
        );
    }
    if !diagnostics.rejected.is_empty() {
        println!("{} row(s) rejected:", diagnostics.rejected.len());
        let headers = vec!["line".to_string(), "reason".to_string()];
        let rows = diagnostics
            .rejected
            .iter()
            .take(20)
            .map(|rejection| vec![rejection.line.to_string(), rejection.reason.clone()])
            .collect::<Vec<_>>();
        table::print_table(&headers, &rows);
        if diagnostics.rejected.len() > 20 {
            println!("... and {} more", diagnostics.rejected.len() - 20);
        }
    }
}

fn print_section(title: &str, total: usize, limit: usize) {
    println!();
    if limit > 0 && total > limit {
        println!("{title} (showing first {limit} of {total})");
    } else {
        println!("{title}");
    }
}

fn limited<T>(rows: &[T], limit: usize) -> &[T] {
    if limit > 0 && rows.len() > limit {
        &rows[..limit]
    } else {
        rows
    }
}

fn aggregate_headers(with_size: bool) -> Vec<String> {
    let mut headers = vec!["product".to_string()];
    if with_size {
        headers.push("size".to_string());
    }
    headers.extend(
        ["quantity", "amount", "shipping", "qty_share", "amount_share"]
            .iter()
            .map(|h| h.to_string()),
    );
    headers
}

fn aggregate_cells(row: &AggregateRow, with_size: bool) -> Vec<String> {
    let mut cells = vec![row.product.clone()];
    if with_size {
        cells.push(row.size.clone().unwrap_or_default());
    }
    cells.push(format_quantity(row.quantity));
    cells.push(format_amount(row.amount));
    cells.push(format_amount(row.shipping));
    cells.push(format_share(row.quantity_share));
    cells.push(format_share(row.amount_share));
    cells
}

/// Writes one aggregate table as CSV; shares are written as raw fractions.
pub fn write_aggregate_csv(path: &Path, rows: &[AggregateRow], with_size: bool) -> Result<()> {
    let delimiter = io_utils::resolve_output_delimiter(Some(path), None, b',');
    let mut writer = io_utils::open_csv_writer(Some(path), delimiter)?;
    writer.write_record(aggregate_headers(with_size))?;
    for row in rows {
        let mut record = vec![row.product.clone()];
        if with_size {
            record.push(row.size.clone().unwrap_or_default());
        }
        record.push(row.quantity.to_string());
        record.push(row.amount.to_string());
        record.push(row.shipping.to_string());
        record.push(row.quantity_share.to_string());
        record.push(row.amount_share.to_string());
        writer.write_record(record)?;
    }
    writer.flush().context("Flushing CSV output")?;
    Ok(())
}

pub fn write_comparison_csv(path: &Path, rows: &[ComparisonRow]) -> Result<()> {
    let delimiter = io_utils::resolve_output_delimiter(Some(path), None, b',');
    let mut writer = io_utils::open_csv_writer(Some(path), delimiter)?;
    writer.write_record([
        "product",
        "prior_amount",
        "current_amount",
        "amount_delta",
        "growth_rate",
        "prior_quantity",
        "current_quantity",
        "trend",
    ])?;
    for row in rows {
        writer.write_record([
            row.product.clone(),
            row.prior_amount.to_string(),
            row.current_amount.to_string(),
            row.amount_delta.to_string(),
            row.growth_rate.map(|r| r.to_string()).unwrap_or_default(),
            row.prior_quantity.to_string(),
            row.current_quantity.to_string(),
            row.trend.label().to_string(),
        ])?;
    }
    writer.flush().context("Flushing CSV output")?;
    Ok(())
}

pub fn write_analysis_json(path: Option<&Path>, report: &AnalysisReport) -> Result<()> {
    write_json(path, report)
}

pub fn write_comparison_json(path: Option<&Path>, comparison: &ComparisonReport) -> Result<()> {
    write_json(path, comparison)
}

fn write_json<T: Serialize>(path: Option<&Path>, value: &T) -> Result<()> {
    match path {
        Some(path) if !io_utils::is_dash(path) => {
            let file =
                File::create(path).with_context(|| format!("Creating JSON output {path:?}"))?;
            serde_json::to_writer_pretty(file, value).context("Writing JSON output")?;
        }
        _ => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            serde_json::to_writer_pretty(&mut handle, value).context("Writing JSON output")?;
            let _ = handle.write_all(b"\n");
        }
    }
    Ok(())
}

fn format_amount(value: f64) -> String {
    format!("{value:.2}")
}

fn format_quantity(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

fn format_share(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

fn format_growth(rate: Option<f64>) -> String {
    match rate {
        Some(rate) => format!("{:+.2}%", rate * 100.0),
        None => "n/a".to_string(),
    }
}
