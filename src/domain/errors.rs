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

//! Core error definitions for the CSV loader.
//!
//! This module provides a centralized `LoadError` enum and a `Result` type
//! used throughout the application. The batch loader branches on
//! [`LoadError::is_retryable`] to decide whether a failed attempt is retried
//! or aborts the whole batch.

use thiserror::Error;

/// Error types encountered while loading files into the warehouse.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Table lookup failed for {table}: {reason}")]
    TableLookup { table: String, reason: String },

    #[error("Load job submission failed for {table}: {reason}")]
    JobSubmission { table: String, reason: String },

    #[error("Load job {job_id} failed: {reason}")]
    JobExecution { job_id: String, reason: String },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl LoadError {
    /// Whether a failed attempt with this error should be retried.
    ///
    /// Collaborator failures are not told apart by cause: anything the
    /// warehouse returns for a single table or job is retried until the
    /// budget runs out. Only broken credentials abort the batch.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, LoadError::Authentication(_))
    }
}

/// A specialized Result type for the CSV loader.
pub type Result<T> = std::result::Result<T, LoadError>;
