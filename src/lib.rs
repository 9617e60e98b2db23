pub mod aggregate;
pub mod analyze;
pub mod cli;
pub mod compare;
pub mod dataset;
pub mod error;
pub mod io_utils;
pub mod record;
pub mod report;
pub mod roles;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info, warn};

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("shop_metrics", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Roles(args) => handle_roles(&args),
        Commands::Analyze(args) => analyze::execute(&args),
        Commands::Compare(args) => compare::execute(&args),
    }
}

fn handle_roles(args: &cli::RolesArgs) -> Result<()> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let mut reader = io_utils::open_csv_reader_from_path(&args.input, delimiter)?;
    let headers = io_utils::reader_headers(&mut reader, encoding)
        .with_context(|| format!("Reading headers from {:?}", args.input))?;

    let mapping = roles::resolve_partial(&headers);
    let table_headers = vec![
        "role".to_string(),
        "column".to_string(),
        "header".to_string(),
    ];
    let rows = roles::Role::ALL
        .iter()
        .map(|role| match mapping.get(*role) {
            Some(index) => vec![
                role.name().to_string(),
                (index + 1).to_string(),
                headers[index].clone(),
            ],
            None => vec![role.name().to_string(), "-".to_string(), "-".to_string()],
        })
        .collect::<Vec<_>>();
    table::print_table(&table_headers, &rows);

    let missing = mapping.missing_required();
    if missing.is_empty() {
        info!("Headers are analyzable");
    } else {
        for role in &missing {
            warn!("Required role '{role}' did not resolve");
        }
    }
    Ok(())
}
