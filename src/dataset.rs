//! In-memory tabular dataset and its CSV reader.
//!
//! The analysis pipeline works on plain decoded cells; whatever produced the
//! table (a CSV file here, an upload handler elsewhere) stays outside the
//! core. `read_dataset` enforces the row cap so a malformed export cannot
//! grow the table without bound.

use std::path::Path;

use anyhow::{Context, Result};
use encoding_rs::Encoding;

use crate::{error::AnalyzeError, io_utils};

/// Ordered headers plus rows of decoded cell values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Dataset {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }
}

/// Reads a delimited file (or stdin via `-`) into a [`Dataset`], failing
/// with [`AnalyzeError::DatasetTooLarge`] past `max_rows` data rows.
pub fn read_dataset(
    path: &Path,
    delimiter: u8,
    encoding: &'static Encoding,
    max_rows: usize,
) -> Result<Dataset> {
    let mut reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
    let headers = io_utils::reader_headers(&mut reader, encoding)?;
    let mut rows = Vec::new();
    for (index, record) in reader.byte_records().enumerate() {
        if rows.len() >= max_rows {
            return Err(AnalyzeError::DatasetTooLarge { limit: max_rows }.into());
        }
        let record = record.with_context(|| format!("Reading row {}", index + 2))?;
        rows.push(io_utils::decode_record(&record, encoding)?);
    }
    Ok(Dataset { headers, rows })
}
