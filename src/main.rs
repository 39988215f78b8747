// Copyright 2026 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use clap::Parser;
use csv_bq_loader::config::{AppConfig, CliArgs};
use csv_bq_loader::infrastructure::bigquery::bq_cli_adapter::BqCliAdapter;
use csv_bq_loader::infrastructure::local_storage::payload_reader::read_payloads;
use csv_bq_loader::{BatchLoader, FailureReport, Result};
use log::{error, info, warn};
use std::path::Path;
use std::process;
use std::sync::Arc;

fn main() {
    // 1. Initialize Logging
    env_logger::init();

    // 2. Parse Arguments
    let args = CliArgs::parse();

    // 3. Load Config
    let mut config = if let Some(config_path) = &args.config {
        match AppConfig::from_file(config_path) {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to load config: {}", e);
                process::exit(1);
            }
        }
    } else {
        AppConfig::from_cli(&args)
    };

    // Merge CLI overrides
    config.merge_cli(&args);

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        process::exit(1);
    }

    match run(&config) {
        Ok(None) => info!("All files loaded."),
        Ok(Some(report)) => {
            error!(
                "{} file(s) failed to load: {}",
                report.failed_files.len(),
                report.failed_files.join(", ")
            );
            process::exit(2);
        }
        Err(e) => {
            error!("Load failed: {}", e);
            process::exit(1);
        }
    }
}

fn run(config: &AppConfig) -> Result<Option<FailureReport>> {
    let location = config.dataset_location()?;
    let budget = config.retry_budget()?;

    let warehouse = BqCliAdapter::new(config.bigquery.location.clone());
    if !warehouse.check_availability() {
        warn!("`bq` CLI not found on PATH; every load attempt will fail.");
    }

    let files = read_payloads(Path::new(&config.load.input_dir))?;

    info!(
        "Loading into {} with up to {} attempts per file...",
        location,
        budget.max_attempts()
    );
    let loader = BatchLoader::new(Arc::new(warehouse), budget);
    let report = loader.run(&location, files)?;

    if let (Some(report), Some(path)) = (&report, &config.load.report_path) {
        let file = std::fs::File::create(path)?;
        report.write_csv(file)?;
        info!("Failure report written to {}", path);
    }

    Ok(report)
}
