use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Default cap on data rows read from one export.
pub const DEFAULT_MAX_ROWS: usize = 500_000;

#[derive(Debug, Parser)]
#[command(author, version, about = "Analyze shop order exports", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show how spreadsheet headers map to semantic column roles
    Roles(RolesArgs),
    /// Analyze one order export: summary, per-product and per-product/size breakdowns
    Analyze(AnalyzeArgs),
    /// Compare two monthly order exports and classify product trends
    Compare(CompareArgs),
}

#[derive(Debug, Args)]
pub struct RolesArgs {
    /// Input CSV/TSV file to inspect (use '-' for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Delimiter character (supports ',', 'tab', ';', '|'; inferred from extension otherwise)
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Input CSV/TSV file to analyze (use '-' for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Write the per-product table to this CSV file instead of printing tables
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Also write the per-product/size table to this CSV file (requires --output)
    #[arg(long = "size-output", requires = "output")]
    pub size_output: Option<PathBuf>,
    /// Emit the full report as JSON (to --output if given, stdout otherwise)
    #[arg(long)]
    pub json: bool,
    /// Maximum rows to display per table (0 = all)
    #[arg(long, default_value_t = 0)]
    pub limit: usize,
    /// Delimiter character (supports ',', 'tab', ';', '|'; inferred from extension otherwise)
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Abort when the export holds more data rows than this
    #[arg(long = "max-rows", default_value_t = DEFAULT_MAX_ROWS)]
    pub max_rows: usize,
}

#[derive(Debug, Args)]
pub struct CompareArgs {
    /// Export for the earlier period
    #[arg(long)]
    pub prior: PathBuf,
    /// Export for the later period
    #[arg(long)]
    pub current: PathBuf,
    /// Write the comparison table to this CSV file instead of printing tables
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Emit the full comparison report as JSON (to --output if given, stdout otherwise)
    #[arg(long)]
    pub json: bool,
    /// Growth/decline classification threshold in percent
    #[arg(long, default_value_t = 5.0, allow_hyphen_values = true)]
    pub threshold: f64,
    /// Maximum rows to display per table (0 = all)
    #[arg(long, default_value_t = 0)]
    pub limit: usize,
    /// Delimiter character applied to both inputs (inferred per file otherwise)
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of both input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Abort when either export holds more data rows than this
    #[arg(long = "max-rows", default_value_t = DEFAULT_MAX_ROWS)]
    pub max_rows: usize,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
