//! Single-file analysis: resolve roles, normalize rows, aggregate both ways.

use anyhow::{Context, Result};
use log::{info, warn};
use serde::Serialize;

use crate::{
    aggregate::{self, AggregateRow, GroupBy, Summary},
    cli::AnalyzeArgs,
    dataset::{self, Dataset},
    error::AnalyzeError,
    io_utils,
    record::{self, Diagnostics},
    report,
    roles::{self, RoleMap},
};

/// Complete result of one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub roles: RoleMap,
    pub summary: Summary,
    pub products: Vec<AggregateRow>,
    pub product_sizes: Vec<AggregateRow>,
    pub diagnostics: Diagnostics,
}

/// Runs the full pipeline over an in-memory dataset.
///
/// A dataset whose rows all fail normalization is unanalyzable and returns
/// [`AnalyzeError::NoUsableData`]; a dataset with no rows at all produces
/// empty tables instead, matching the aggregator's empty-input contract.
pub fn analyze(dataset: &Dataset) -> Result<AnalysisReport, AnalyzeError> {
    let roles = roles::resolve(&dataset.headers)?;
    let (records, diagnostics) = record::normalize_rows(&dataset.rows, &roles);
    if records.is_empty() && !dataset.rows.is_empty() {
        return Err(AnalyzeError::NoUsableData);
    }
    Ok(AnalysisReport {
        roles,
        summary: aggregate::summarize(&records),
        products: aggregate::aggregate(&records, GroupBy::Product),
        product_sizes: aggregate::aggregate(&records, GroupBy::ProductSize),
        diagnostics,
    })
}

pub fn execute(args: &AnalyzeArgs) -> Result<()> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let dataset = dataset::read_dataset(&args.input, delimiter, encoding, args.max_rows)
        .with_context(|| format!("Reading {:?}", args.input))?;
    let report = analyze(&dataset).with_context(|| format!("Analyzing {:?}", args.input))?;

    info!(
        "Analyzed {} row(s): {} product(s), {} size bucket(s)",
        report.summary.rows,
        report.products.len(),
        report.product_sizes.len()
    );
    if !report.diagnostics.rejected.is_empty() {
        warn!(
            "{} row(s) rejected during normalization",
            report.diagnostics.rejected.len()
        );
    }

    if args.json {
        report::write_analysis_json(args.output.as_deref(), &report)?;
    } else if let Some(path) = &args.output {
        report::write_aggregate_csv(path, &report.products, false)
            .with_context(|| format!("Writing product table to {path:?}"))?;
        info!("Product table written to {path:?}");
        if let Some(size_path) = &args.size_output {
            report::write_aggregate_csv(size_path, &report.product_sizes, true)
                .with_context(|| format!("Writing product/size table to {size_path:?}"))?;
            info!("Product/size table written to {size_path:?}");
        }
    } else {
        report::print_analysis(&report, args.limit);
    }
    Ok(())
}
