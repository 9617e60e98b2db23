//! Row normalization: raw spreadsheet rows into typed [`Record`] values.
//!
//! Normalization never aborts a run. Unparseable numeric cells coerce to 0
//! and are counted as soft diagnostics; a row is only dropped when its
//! product cell is blank, and dropped rows are reported per row with the
//! spreadsheet line number.

use chrono::{NaiveDate, NaiveDateTime};
use log::warn;
use serde::Serialize;

use crate::roles::{Role, RoleMap};

/// Bucket used when the size column is absent or the cell is empty.
pub const UNSPECIFIED_SIZE: &str = "unspecified";

/// One normalized order line.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub product: String,
    pub size: Option<String>,
    pub quantity: f64,
    pub amount: f64,
    pub shipping: f64,
    pub date: Option<NaiveDate>,
}

/// A dropped input row: spreadsheet line number (header = line 1) and reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub line: usize,
    pub reason: String,
}

/// Soft, non-fatal problems collected while normalizing a dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    pub rejected: Vec<Rejection>,
    pub coerced_cells: usize,
}

impl Diagnostics {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty() && self.coerced_cells == 0
    }
}

/// Converts raw rows into records using the resolved column roles.
pub fn normalize_rows(rows: &[Vec<String>], roles: &RoleMap) -> (Vec<Record>, Diagnostics) {
    let mut records = Vec::with_capacity(rows.len());
    let mut diagnostics = Diagnostics::default();
    for (index, row) in rows.iter().enumerate() {
        // Line numbers are 1-based and account for the header row.
        let line = index + 2;
        match normalize_row(row, roles, line, &mut diagnostics) {
            Some(record) => records.push(record),
            None => {}
        }
    }
    (records, diagnostics)
}

fn normalize_row(
    row: &[String],
    roles: &RoleMap,
    line: usize,
    diagnostics: &mut Diagnostics,
) -> Option<Record> {
    let product = cell(row, roles.get(Role::Product)).trim().to_string();
    if product.is_empty() {
        diagnostics.rejected.push(Rejection {
            line,
            reason: "blank product".to_string(),
        });
        return None;
    }

    let mut quantity = numeric_cell(row, roles.get(Role::Quantity), "quantity", line, diagnostics);
    if quantity < 0.0 {
        warn!("Row {line}: negative quantity {quantity}, clamping to 0");
        diagnostics.coerced_cells += 1;
        quantity = 0.0;
    }
    let amount = numeric_cell(row, roles.get(Role::Amount), "amount", line, diagnostics);
    let shipping = numeric_cell(row, roles.get(Role::Shipping), "shipping", line, diagnostics);

    let size = canonical_size(cell(row, roles.get(Role::Size)));
    let date = parse_record_date(cell(row, roles.get(Role::Date)));

    Some(Record {
        product,
        size,
        quantity,
        amount,
        shipping,
        date,
    })
}

fn cell(row: &[String], index: Option<usize>) -> &str {
    index
        .and_then(|i| row.get(i))
        .map(String::as_str)
        .unwrap_or("")
}

/// Parses a numeric cell, tolerating thousands separators. Empty cells (and
/// unmapped columns) default to 0 silently; non-numeric text coerces to 0
/// with a warning and a diagnostics count.
fn numeric_cell(
    row: &[String],
    index: Option<usize>,
    label: &str,
    line: usize,
    diagnostics: &mut Diagnostics,
) -> f64 {
    let raw = cell(row, index).trim();
    if raw.is_empty() {
        return 0.0;
    }
    match raw.replace(',', "").parse::<f64>() {
        Ok(value) => value,
        Err(_) => {
            warn!("Row {line}: cannot parse {label} cell '{raw}', treating as 0");
            diagnostics.coerced_cells += 1;
            0.0
        }
    }
}

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M:%S"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%m/%d/%Y", "%Y年%m月%d日"];
// Month-granular exports resolve to the first day of the month.
const MONTH_FORMATS: &[(&str, &str)] = &[
    ("%Y-%m-%d", "-01"),
    ("%Y/%m/%d", "/01"),
    ("%Y年%m月%d日", "01日"),
];

/// Parses a date cell against the accepted formats, returning `None` for
/// empty or unrecognized values.
pub fn parse_record_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(parsed.date());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(parsed);
        }
    }
    for (format, day_suffix) in MONTH_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(&format!("{trimmed}{day_suffix}"), format) {
            return Some(parsed);
        }
    }
    None
}

/// Letter sizes in their common export spellings, longest first so that
/// "XXL" is not read as "XL".
const LETTER_SIZES: &[(&str, &str)] = &[
    ("XXXL", "3XL"),
    ("XXL", "2XL"),
    ("XXS", "2XS"),
    ("XL", "XL"),
    ("XS", "XS"),
    ("L", "L"),
    ("M", "M"),
    ("S", "S"),
];

/// Canonicalizes a raw size cell: letter sizes normalize to a single spelling
/// ("xxl" → "2XL"), anything else is kept trimmed verbatim, and an empty cell
/// stays absent so missing sizes aggregate under one bucket.
pub fn canonical_size(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let upper = trimmed.to_uppercase();
    for (spelling, canonical) in LETTER_SIZES {
        if upper == *spelling {
            return Some((*canonical).to_string());
        }
    }
    Some(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn sample_roles() -> RoleMap {
        let headers = row(&["产品", "尺寸", "数量", "金额", "运费", "日期"]);
        roles::resolve(&headers).expect("resolve sample headers")
    }

    #[test]
    fn normalizes_a_complete_row() {
        let roles = sample_roles();
        let (records, diagnostics) = normalize_rows(
            &[row(&["连衣裙", "XXL", "3", "299.50", "12", "2024-07-15"])],
            &roles,
        );
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.product, "连衣裙");
        assert_eq!(record.size.as_deref(), Some("2XL"));
        assert_eq!(record.quantity, 3.0);
        assert_eq!(record.amount, 299.5);
        assert_eq!(record.shipping, 12.0);
        assert_eq!(
            record.date,
            NaiveDate::from_ymd_opt(2024, 7, 15),
        );
        assert!(diagnostics.is_clean());
    }

    #[test]
    fn blank_product_rejects_the_row() {
        let roles = sample_roles();
        let (records, diagnostics) = normalize_rows(
            &[
                row(&["  ", "M", "1", "50", "5", ""]),
                row(&["T恤", "M", "1", "50", "5", ""]),
            ],
            &roles,
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].product, "T恤");
        assert_eq!(diagnostics.rejected.len(), 1);
        assert_eq!(diagnostics.rejected[0].line, 2);
        assert_eq!(diagnostics.rejected[0].reason, "blank product");
    }

    #[test]
    fn non_numeric_cells_coerce_to_zero_with_diagnostics() {
        let roles = sample_roles();
        let (records, diagnostics) =
            normalize_rows(&[row(&["T恤", "", "abc", "1,299.00", "n/a", ""])], &roles);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].quantity, 0.0);
        assert_eq!(records[0].amount, 1299.0);
        assert_eq!(records[0].shipping, 0.0);
        assert_eq!(diagnostics.coerced_cells, 2);
    }

    #[test]
    fn negative_quantity_clamps_to_zero() {
        let roles = sample_roles();
        let (records, diagnostics) =
            normalize_rows(&[row(&["T恤", "", "-2", "50", "0", ""])], &roles);
        assert_eq!(records[0].quantity, 0.0);
        assert_eq!(diagnostics.coerced_cells, 1);
    }

    #[test]
    fn empty_cells_default_silently() {
        let roles = sample_roles();
        let (records, diagnostics) = normalize_rows(&[row(&["T恤", "", "", "", "", ""])], &roles);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].quantity, 0.0);
        assert_eq!(records[0].amount, 0.0);
        assert_eq!(records[0].size, None);
        assert_eq!(records[0].date, None);
        assert!(diagnostics.is_clean());
    }

    #[test]
    fn parse_record_date_accepts_common_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 7, 15);
        assert_eq!(parse_record_date("2024-07-15"), expected);
        assert_eq!(parse_record_date("2024/07/15"), expected);
        assert_eq!(parse_record_date("15/07/2024"), expected);
        assert_eq!(parse_record_date("2024年7月15日"), expected);
        assert_eq!(parse_record_date("2024-07-15 09:30:00"), expected);
    }

    #[test]
    fn parse_record_date_accepts_month_granularity() {
        let first = NaiveDate::from_ymd_opt(2024, 7, 1);
        assert_eq!(parse_record_date("2024-07"), first);
        assert_eq!(parse_record_date("2024/07"), first);
        assert_eq!(parse_record_date("2024年7月"), first);
    }

    #[test]
    fn parse_record_date_leaves_garbage_absent() {
        assert_eq!(parse_record_date("sometime in july"), None);
        assert_eq!(parse_record_date(""), None);
    }

    #[test]
    fn canonical_size_normalizes_letter_spellings() {
        assert_eq!(canonical_size("XXL").as_deref(), Some("2XL"));
        assert_eq!(canonical_size("xxl").as_deref(), Some("2XL"));
        assert_eq!(canonical_size("XXXL").as_deref(), Some("3XL"));
        assert_eq!(canonical_size("m").as_deref(), Some("M"));
        assert_eq!(canonical_size(" 38 ").as_deref(), Some("38"));
        assert_eq!(canonical_size("标准").as_deref(), Some("标准"));
        assert_eq!(canonical_size("   "), None);
    }
}
