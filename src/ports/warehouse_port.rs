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

//! # Warehouse Port
//!
//! The contract the batch loader needs from a data warehouse. It does not
//! care whether the other side is BigQuery, a mock or an in-memory fake:
//! anything that can check for a table, accept a load job and wait for it
//! can be plugged in.

use crate::domain::entities::{JobHandle, LoadJobOptions, TableRef};
use crate::domain::errors::Result;
use std::io::Read;

/// `WarehousePort` is the tri-operation collaborator behind every load.
pub trait WarehousePort: Send + Sync {
    /// Returns `Ok(false)` when the table does not exist yet.
    fn table_exists(&self, table: &TableRef) -> Result<bool>;

    /// Submits `payload` as a load job into `table`.
    ///
    /// The destination table is created by the job if it is missing.
    fn submit_load_job(
        &self,
        payload: &mut dyn Read,
        table: &TableRef,
        options: &LoadJobOptions,
    ) -> Result<JobHandle>;

    /// Blocks until the job is done and returns the number of rows it loaded.
    fn await_completion(&self, job: &JobHandle) -> Result<u64>;
}
