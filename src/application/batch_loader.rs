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

//! # Batch Loader
//!
//! Loads a named collection of CSV payloads into a dataset, one file at a
//! time. Each file gets its own retry budget; a file that runs out of
//! attempts ends up in the failure report and the batch moves on.
//!
//! The warehouse is injected as a [`WarehousePort`], so tests can count
//! every call the loader makes.

use crate::domain::entities::{
    BatchSummary, DatasetLocation, FailureReport, FileOutcome, LoadJobOptions, LoadOutcome,
    LoadRequest, RetryBudget, TableRef, DEFAULT_MAX_RETRIES,
};
use crate::domain::errors::Result;
use crate::ports::warehouse_port::WarehousePort;
use log::{debug, error, info, warn};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Instant;

/// Runs load jobs for a batch of files with bounded per-file retry.
pub struct BatchLoader {
    warehouse: Arc<dyn WarehousePort>,
    budget: RetryBudget,
    options: LoadJobOptions,
}

impl BatchLoader {
    pub fn new(warehouse: Arc<dyn WarehousePort>, budget: RetryBudget) -> Self {
        Self {
            warehouse,
            budget,
            options: LoadJobOptions::csv_autodetect(),
        }
    }

    /// Loads every `.csv` entry of `files` and returns the files that failed.
    ///
    /// Returns `Ok(None)` when nothing failed, including for an empty batch.
    /// Only fatal errors (see [`crate::domain::errors::LoadError::is_retryable`])
    /// come back as `Err`.
    pub fn run<I>(&self, location: &DatasetLocation, files: I) -> Result<Option<FailureReport>>
    where
        I: IntoIterator<Item = (String, Vec<u8>)>,
    {
        Ok(self.load_batch(location, files)?.failure_report())
    }

    /// Same as [`BatchLoader::run`] but keeps every per-file outcome.
    pub fn load_batch<I>(&self, location: &DatasetLocation, files: I) -> Result<BatchSummary>
    where
        I: IntoIterator<Item = (String, Vec<u8>)>,
    {
        let start_time = Instant::now();
        let mut summary = BatchSummary::default();

        for (file_name, payload) in files {
            let request = LoadRequest::new(location.clone(), file_name, payload);
            if let Some(outcome) = self.load_file(request)? {
                summary.outcomes.push(outcome);
            }
        }

        info!(
            "Batch finished in {:.2}s: {}/{} files loaded, {} rows total.",
            start_time.elapsed().as_secs_f64(),
            summary.succeeded(),
            summary.outcomes.len(),
            summary.rows_loaded()
        );

        Ok(summary)
    }

    /// Runs the retry loop for a single file.
    ///
    /// Returns `Ok(None)` if the file is not a CSV file and was skipped.
    pub fn load_file(&self, request: LoadRequest) -> Result<Option<FileOutcome>> {
        let Some(table) = request.table_ref() else {
            debug!("Skipping {}: not a CSV file", request.file_name());
            return Ok(None);
        };

        let file_name = request.file_name().to_string();
        let max_attempts = self.budget.max_attempts();
        let mut payload = Cursor::new(request.into_payload());
        let mut attempt = 1;

        loop {
            match self.attempt_load(&table, &mut payload) {
                Ok(rows_loaded) => {
                    info!("Successfully loaded {} rows into {}", rows_loaded, table);
                    return Ok(Some(FileOutcome {
                        file_name,
                        table: table.table.to_string(),
                        attempts: attempt,
                        outcome: LoadOutcome::Succeeded { rows_loaded },
                    }));
                }
                Err(e) if !e.is_retryable() => {
                    error!("Aborting batch while loading {}: {}", file_name, e);
                    return Err(e);
                }
                Err(e) => {
                    warn!("Failed to upload {}: {}", file_name, e);
                    if attempt >= max_attempts {
                        error!("Max retries reached for {}. Adding to failed list.", file_name);
                        return Ok(Some(FileOutcome {
                            file_name,
                            table: table.table.to_string(),
                            attempts: attempt,
                            outcome: LoadOutcome::Failed {
                                last_error: e.to_string(),
                            },
                        }));
                    }
                    attempt += 1;
                    info!("Retrying {}... Attempt {}/{}", file_name, attempt, max_attempts);
                }
            }
        }
    }

    fn attempt_load(&self, table: &TableRef, payload: &mut Cursor<Vec<u8>>) -> Result<u64> {
        // Log only: the load job creates the table when it is missing.
        if self.warehouse.table_exists(table)? {
            info!("Table '{}' already exists.", table.table);
        } else {
            info!("Table '{}' not found. Creating and uploading data...", table.table);
        }

        // A failed attempt may have consumed part of the payload.
        payload.set_position(0);
        let job = self.warehouse.submit_load_job(payload, table, &self.options)?;
        debug!("Submitted load job {} for {}", job.job_id, table);

        self.warehouse.await_completion(&job)
    }
}

/// Uploads `files` into `project:dataset`, trying each CSV file up to
/// `max_retries` times (3 when `None`).
pub fn upload_csv_files<I>(
    warehouse: Arc<dyn WarehousePort>,
    project: &str,
    dataset: &str,
    files: I,
    max_retries: Option<u32>,
) -> Result<Option<FailureReport>>
where
    I: IntoIterator<Item = (String, Vec<u8>)>,
{
    let location = DatasetLocation::new(project, dataset)?;
    let budget = RetryBudget::new(max_retries.unwrap_or(DEFAULT_MAX_RETRIES))?;
    BatchLoader::new(warehouse, budget).run(&location, files)
}
