//! Schema bootstrap entry point.
//!
//! # Responsibility
//! - Bind to the configured catalog database and materialize its tables.
//! - Exit non-zero with a one-line reason when bootstrap fails.
//!
//! Usage: `dataset-catalog-init [CONFIG_JSON]` (default `dataset_catalog.json`).

use dataset_catalog_core::db::migrations::latest_version;
use dataset_catalog_core::db::open_db;
use dataset_catalog_core::{core_version, init_logging, CatalogConfig};
use log::info;
use std::process::ExitCode;

const DEFAULT_CONFIG_PATH: &str = "dataset_catalog.json";

fn main() -> ExitCode {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    match run(&config_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("dataset-catalog-init: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(config_path: &str) -> Result<(), String> {
    let config = CatalogConfig::load(config_path).map_err(|err| err.to_string())?;
    if let Some(log_dir) = config.log_dir.as_ref() {
        init_logging(&config.log_level, log_dir).map_err(|err| err.to_string())?;
    }

    let _conn = open_db(&config.database_path).map_err(|err| err.to_string())?;
    info!(
        "event=schema_bootstrap module=cli status=ok schema_version={}",
        latest_version()
    );

    println!("dataset_catalog version={}", core_version());
    println!(
        "dataset_catalog database={} schema_version={}",
        config.database_path.display(),
        latest_version()
    );
    Ok(())
}
