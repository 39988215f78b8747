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

//! # Domain Entities
//!
//! The nouns of the loader: where data goes (`DatasetLocation`, `TableRef`),
//! what is loaded (`LoadRequest`), how hard we try (`RetryBudget`) and what
//! happened (`LoadOutcome`, `FileOutcome`, `BatchSummary`, `FailureReport`).

use crate::domain::errors::{LoadError, Result};
use serde::Serialize;
use std::fmt;
use std::io::Write;

/// The only file suffix the loader picks up. Matching is case-sensitive.
pub const CSV_SUFFIX: &str = ".csv";

/// Column header of the failure report.
pub const FAILED_FILES_COLUMN: &str = "Failed Files";

/// Attempts per file when the caller does not say otherwise.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// A project + dataset pair addressing a group of tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetLocation {
    pub project: String,
    pub dataset: String,
}

impl DatasetLocation {
    /// Builds a location, rejecting blank identifiers.
    pub fn new(project: impl Into<String>, dataset: impl Into<String>) -> Result<Self> {
        let project = project.into();
        let dataset = dataset.into();
        if project.trim().is_empty() {
            return Err(LoadError::InvalidInput("project id is empty".into()));
        }
        if dataset.trim().is_empty() {
            return Err(LoadError::InvalidInput("dataset id is empty".into()));
        }
        Ok(Self { project, dataset })
    }

    pub fn table(&self, target: TableTarget) -> TableRef {
        TableRef {
            location: self.clone(),
            table: target,
        }
    }
}

impl fmt::Display for DatasetLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.project, self.dataset)
    }
}

/// Destination table name inside a dataset, derived from a file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableTarget(String);

impl TableTarget {
    /// Strips the rightmost `.csv` from `file_name`.
    ///
    /// Returns `None` for names that do not end in `.csv`; those files are
    /// not loaded at all.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        file_name
            .strip_suffix(CSV_SUFFIX)
            .map(|stem| TableTarget(stem.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fully qualified table reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub location: DatasetLocation,
    pub table: TableTarget,
}

impl TableRef {
    /// `dataset.table`, the form `bq` accepts once the project is set.
    pub fn dataset_qualified(&self) -> String {
        format!("{}.{}", self.location.dataset, self.table)
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.location, self.table)
    }
}

/// One input file bound for the warehouse.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    location: DatasetLocation,
    file_name: String,
    payload: Vec<u8>,
}

impl LoadRequest {
    pub fn new(location: DatasetLocation, file_name: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            location,
            file_name: file_name.into(),
            payload,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// The table this request loads into, or `None` if it is not a CSV file.
    pub fn table_ref(&self) -> Option<TableRef> {
        TableTarget::from_file_name(&self.file_name).map(|t| self.location.table(t))
    }

    pub(crate) fn into_payload(self) -> Vec<u8> {
        self.payload
    }
}

/// Maximum number of attempts per file. `3` means up to three tries in total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget(u32);

impl RetryBudget {
    /// Rejects a budget of zero rather than clamping it.
    pub fn new(max_attempts: u32) -> Result<Self> {
        if max_attempts == 0 {
            return Err(LoadError::InvalidInput(
                "retry budget must allow at least one attempt".into(),
            ));
        }
        Ok(Self(max_attempts))
    }

    pub fn max_attempts(&self) -> u32 {
        self.0
    }
}

impl Default for RetryBudget {
    fn default() -> Self {
        Self(DEFAULT_MAX_RETRIES)
    }
}

/// Source format of a load job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFormat::Csv => write!(f, "CSV"),
        }
    }
}

/// Options handed to the warehouse with every load job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadJobOptions {
    pub source_format: SourceFormat,
    /// Let the warehouse infer column names and types from the payload.
    pub autodetect: bool,
}

impl LoadJobOptions {
    pub fn csv_autodetect() -> Self {
        Self {
            source_format: SourceFormat::Csv,
            autodetect: true,
        }
    }
}

/// Handle to a submitted load job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub job_id: String,
    pub table: TableRef,
}

/// Terminal state of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Succeeded { rows_loaded: u64 },
    Failed { last_error: String },
}

impl LoadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, LoadOutcome::Succeeded { .. })
    }
}

/// Outcome of one file together with how many attempts it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub file_name: String,
    pub table: String,
    pub attempts: u32,
    pub outcome: LoadOutcome,
}

/// Per-file outcomes of a batch, in input order. Skipped files are absent.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub outcomes: Vec<FileOutcome>,
}

impl BatchSummary {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.outcome.is_success()).count()
    }

    pub fn rows_loaded(&self) -> u64 {
        self.outcomes
            .iter()
            .map(|o| match o.outcome {
                LoadOutcome::Succeeded { rows_loaded } => rows_loaded,
                LoadOutcome::Failed { .. } => 0,
            })
            .sum()
    }

    /// Names of the files that never loaded, or `None` if all of them did.
    pub fn failure_report(&self) -> Option<FailureReport> {
        let failed_files: Vec<String> = self
            .outcomes
            .iter()
            .filter(|o| !o.outcome.is_success())
            .map(|o| o.file_name.clone())
            .collect();

        if failed_files.is_empty() {
            None
        } else {
            Some(FailureReport { failed_files })
        }
    }
}

/// Single-column table listing the files that exhausted their retry budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureReport {
    #[serde(rename = "Failed Files")]
    pub failed_files: Vec<String>,
}

impl FailureReport {
    pub fn contains(&self, file_name: &str) -> bool {
        self.failed_files.iter().any(|f| f == file_name)
    }

    /// Writes the report as CSV with a `Failed Files` header row.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record([FAILED_FILES_COLUMN])
            .map_err(|e| LoadError::Unknown(e.to_string()))?;
        for file in &self.failed_files {
            wtr.write_record([file.as_str()])
                .map_err(|e| LoadError::Unknown(e.to_string()))?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| LoadError::Unknown(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location() -> DatasetLocation {
        DatasetLocation::new("my-project", "staging").unwrap()
    }

    #[test]
    fn test_table_target_strips_rightmost_csv() {
        let t = TableTarget::from_file_name("report.final.csv").unwrap();
        assert_eq!(t.as_str(), "report.final");

        let t = TableTarget::from_file_name("a.csv.csv").unwrap();
        assert_eq!(t.as_str(), "a.csv");
    }

    #[test]
    fn test_table_target_rejects_other_extensions() {
        assert!(TableTarget::from_file_name("b.txt").is_none());
        assert!(TableTarget::from_file_name("upper.CSV").is_none());
        assert!(TableTarget::from_file_name("csv").is_none());
    }

    #[test]
    fn test_dataset_location_validation() {
        assert!(DatasetLocation::new("", "d").is_err());
        assert!(DatasetLocation::new("p", "  ").is_err());
        assert_eq!(location().to_string(), "my-project:staging");
    }

    #[test]
    fn test_table_ref_formats() {
        let req = LoadRequest::new(location(), "orders.csv", b"id\n1\n".to_vec());
        let table = req.table_ref().unwrap();
        assert_eq!(table.to_string(), "my-project:staging.orders");
        assert_eq!(table.dataset_qualified(), "staging.orders");
    }

    #[test]
    fn test_retry_budget_rejects_zero() {
        assert!(matches!(RetryBudget::new(0), Err(LoadError::InvalidInput(_))));
        assert_eq!(RetryBudget::new(1).unwrap().max_attempts(), 1);
        assert_eq!(RetryBudget::default().max_attempts(), 3);
    }

    #[test]
    fn test_failure_report_absent_when_all_succeed() {
        let summary = BatchSummary {
            outcomes: vec![FileOutcome {
                file_name: "a.csv".into(),
                table: "a".into(),
                attempts: 1,
                outcome: LoadOutcome::Succeeded { rows_loaded: 10 },
            }],
        };
        assert!(summary.failure_report().is_none());
        assert_eq!(summary.rows_loaded(), 10);
        assert!(BatchSummary::default().failure_report().is_none());
    }

    #[test]
    fn test_failure_report_csv() {
        let report = FailureReport {
            failed_files: vec!["a.csv".into(), "b,c.csv".into()],
        };
        let mut buf = Vec::new();
        report.write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "Failed Files\na.csv\n\"b,c.csv\"\n");
    }

    #[test]
    fn test_failure_report_json_column_name() {
        let report = FailureReport {
            failed_files: vec!["a.csv".into()],
        };
        let v: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(v["Failed Files"][0], "a.csv");
    }
}
