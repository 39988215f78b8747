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

//! Reads input payloads from a local directory.

use crate::domain::errors::{LoadError, Result};
use log::{debug, info};
use std::fs;
use std::path::Path;

/// Reads every regular file directly inside `dir` into `(file name, bytes)`
/// pairs, sorted by file name.
///
/// No extension filtering happens here; the loader skips non-CSV entries.
pub fn read_payloads(dir: &Path) -> Result<Vec<(String, Vec<u8>)>> {
    if !dir.is_dir() {
        return Err(LoadError::ConfigError(format!(
            "input directory {} does not exist",
            dir.display()
        )));
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            debug!("Skipping non UTF-8 file name {:?}", entry.file_name());
            continue;
        };
        let content = fs::read(entry.path())?;
        files.push((name, content));
    }

    files.sort_by(|a, b| a.0.cmp(&b.0));
    info!("Read {} files from {}", files.len(), dir.display());
    Ok(files)
}
