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

//! # CSV to BigQuery Loader
//!
//! Loads a batch of CSV payloads into BigQuery, one table per file, creating
//! tables implicitly and retrying each file independently.
//!
//! The crate follows the **Hexagonal Architecture** (Ports and Adapters): the
//! retry logic in [`application::batch_loader`] only talks to the
//! [`ports::warehouse_port::WarehousePort`] trait, and
//! [`infrastructure::bigquery::bq_cli_adapter`] plugs the real warehouse in.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::batch_loader::{upload_csv_files, BatchLoader};
pub use domain::entities::{DatasetLocation, FailureReport, RetryBudget};
pub use domain::errors::{LoadError, Result};
