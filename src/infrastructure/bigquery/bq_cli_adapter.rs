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

//! BigQuery adapter that drives the `bq` command-line tool.
//!
//! Existence checks use `bq show`, loads are started with `bq load --nosync`
//! under a job id we choose, and completion is awaited with `bq wait`
//! followed by `bq show -j` to read the job statistics.

use crate::domain::entities::{JobHandle, LoadJobOptions, TableRef};
use crate::domain::errors::{LoadError, Result};
use crate::ports::warehouse_port::WarehousePort;
use log::{debug, info};
use serde_json::Value;
use std::io::{Read, Write};
use std::process::{Command, Output};
use tempfile::NamedTempFile;

/// Substrings `bq` prints when credentials are missing or expired.
const AUTH_FAILURE_MARKERS: &[&str] = &[
    "Anonymous caller",
    "invalid authentication credentials",
    "You do not currently have an active account",
    "Reauthentication required",
    "invalid_grant",
];

/// `WarehousePort` over the `bq` CLI.
pub struct BqCliAdapter {
    bq_binary: String,
    location: Option<String>,
}

impl BqCliAdapter {
    /// `location` is the processing location passed as `--location` (e.g. `US`).
    pub fn new(location: Option<String>) -> Self {
        Self {
            bq_binary: "bq".to_string(),
            location,
        }
    }

    /// Uses a different `bq` executable.
    pub fn with_binary(mut self, bq_binary: impl Into<String>) -> Self {
        self.bq_binary = bq_binary.into();
        self
    }

    /// Checks if the `bq` CLI is installed and runnable.
    pub fn check_availability(&self) -> bool {
        Command::new(&self.bq_binary)
            .arg("version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn base_command(&self, project: &str) -> Command {
        let mut cmd = Command::new(&self.bq_binary);
        cmd.arg(format!("--project_id={}", project));
        if let Some(location) = &self.location {
            cmd.arg(format!("--location={}", location));
        }
        cmd
    }
}

impl WarehousePort for BqCliAdapter {
    fn table_exists(&self, table: &TableRef) -> Result<bool> {
        let output = self
            .base_command(&table.location.project)
            .args(["--format=none", "show"])
            .arg(table.dataset_qualified())
            .output()?;

        if output.status.success() {
            return Ok(true);
        }

        let message = cli_message(&output);
        if message.contains("Not found") {
            return Ok(false);
        }
        Err(classify_failure(message, |reason| LoadError::TableLookup {
            table: table.to_string(),
            reason,
        }))
    }

    fn submit_load_job(
        &self,
        payload: &mut dyn Read,
        table: &TableRef,
        options: &LoadJobOptions,
    ) -> Result<JobHandle> {
        // bq uploads local files only from disk.
        let mut temp = NamedTempFile::new()?;
        let bytes = std::io::copy(payload, &mut temp)?;
        temp.flush()?;

        let job_id = job_id_for(table);
        info!("Submitting load job {} ({} bytes) into {}", job_id, bytes, table);

        let mut cmd = self.base_command(&table.location.project);
        cmd.arg(format!("--job_id={}", job_id))
            .arg("--nosync")
            .arg("load")
            .arg(format!("--source_format={}", options.source_format));
        if options.autodetect {
            cmd.arg("--autodetect");
        }
        let output = cmd.arg(table.dataset_qualified()).arg(temp.path()).output()?;

        if !output.status.success() {
            return Err(classify_failure(cli_message(&output), |reason| {
                LoadError::JobSubmission {
                    table: table.to_string(),
                    reason,
                }
            }));
        }

        Ok(JobHandle {
            job_id,
            table: table.clone(),
        })
    }

    fn await_completion(&self, job: &JobHandle) -> Result<u64> {
        let project = &job.table.location.project;

        let wait = self
            .base_command(project)
            .args(["wait", "--fail_on_error"])
            .arg(&job.job_id)
            .output()?;
        if !wait.status.success() {
            let message = cli_message(&wait);
            if is_auth_failure(&message) {
                return Err(LoadError::Authentication(message));
            }
            // The job status below carries the real reason.
            debug!("bq wait {} exited with {}: {}", job.job_id, wait.status, message);
        }

        let show = self
            .base_command(project)
            .args(["--format=json", "show", "-j"])
            .arg(&job.job_id)
            .output()?;
        if !show.status.success() {
            return Err(classify_failure(cli_message(&show), |reason| {
                LoadError::JobExecution {
                    job_id: job.job_id.clone(),
                    reason,
                }
            }));
        }

        let json: Value =
            serde_json::from_slice(&show.stdout).map_err(|e| LoadError::JobExecution {
                job_id: job.job_id.clone(),
                reason: format!("unreadable job status: {}", e),
            })?;
        parse_job_result(&job.job_id, &json)
    }
}

/// Job ids may only hold letters, digits, `_` and `-`.
fn job_id_for(table: &TableRef) -> String {
    let sanitized: String = table
        .table
        .as_str()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!(
        "csv_load_{}_{}",
        sanitized,
        chrono::Utc::now().format("%Y%m%d%H%M%S%f")
    )
}

fn cli_message(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    format!("{} {}", stderr.trim(), stdout.trim()).trim().to_string()
}

fn is_auth_failure(message: &str) -> bool {
    AUTH_FAILURE_MARKERS.iter().any(|m| message.contains(m))
}

fn classify_failure(message: String, otherwise: impl FnOnce(String) -> LoadError) -> LoadError {
    if is_auth_failure(&message) {
        LoadError::Authentication(message)
    } else {
        otherwise(message)
    }
}

/// Reads rows loaded out of a `bq show -j` job resource.
fn parse_job_result(job_id: &str, job: &Value) -> Result<u64> {
    let status = &job["status"];
    if let Some(err) = status.get("errorResult") {
        let reason = err["message"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| err.to_string());
        return Err(LoadError::JobExecution {
            job_id: job_id.to_string(),
            reason,
        });
    }

    let state = status["state"].as_str().unwrap_or("UNKNOWN");
    if state != "DONE" {
        return Err(LoadError::JobExecution {
            job_id: job_id.to_string(),
            reason: format!("job is still {}", state),
        });
    }

    // The REST API encodes int64 counters as strings.
    let rows = &job["statistics"]["load"]["outputRows"];
    match rows {
        Value::String(s) => s.parse::<u64>().map_err(|e| LoadError::JobExecution {
            job_id: job_id.to_string(),
            reason: format!("bad outputRows '{}': {}", s, e),
        }),
        Value::Number(n) => n.as_u64().ok_or_else(|| LoadError::JobExecution {
            job_id: job_id.to_string(),
            reason: format!("bad outputRows {}", n),
        }),
        _ => Err(LoadError::JobExecution {
            job_id: job_id.to_string(),
            reason: "job status has no statistics.load.outputRows".into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{DatasetLocation, TableTarget};
    use serde_json::json;

    fn table(name: &str) -> TableRef {
        DatasetLocation::new("proj", "ds")
            .unwrap()
            .table(TableTarget::from_file_name(&format!("{}.csv", name)).unwrap())
    }

    #[test]
    fn test_job_id_is_sanitized() {
        let id = job_id_for(&table("report.final v2"));
        assert!(id.starts_with("csv_load_report_final_v2_"));
        assert!(id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'));
    }

    #[test]
    fn test_parse_job_result_rows() {
        let job = json!({
            "status": { "state": "DONE" },
            "statistics": { "load": { "outputRows": "1250" } }
        });
        assert_eq!(parse_job_result("j", &job).unwrap(), 1250);
    }

    #[test]
    fn test_parse_job_result_error() {
        let job = json!({
            "status": {
                "state": "DONE",
                "errorResult": { "reason": "invalid", "message": "Error while reading data" }
            }
        });
        match parse_job_result("j1", &job) {
            Err(LoadError::JobExecution { job_id, reason }) => {
                assert_eq!(job_id, "j1");
                assert_eq!(reason, "Error while reading data");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_job_result_missing_row_count() {
        let job = json!({
            "status": { "state": "DONE" },
            "statistics": { "load": {} }
        });
        match parse_job_result("j2", &job) {
            Err(LoadError::JobExecution { job_id, reason }) => {
                assert_eq!(job_id, "j2");
                assert!(reason.contains("outputRows"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_job_result_not_done() {
        let job = json!({ "status": { "state": "RUNNING" } });
        assert!(parse_job_result("j", &job).is_err());
    }

    #[test]
    fn test_classify_failure() {
        let auth = classify_failure(
            "Anonymous caller does not have bigquery.tables.get access".into(),
            LoadError::Unknown,
        );
        assert!(matches!(auth, LoadError::Authentication(_)));

        let other = classify_failure("Backend error".into(), LoadError::Unknown);
        assert!(matches!(other, LoadError::Unknown(_)));
    }

    #[cfg(unix)]
    fn fake_bq(dir: &std::path::Path, name: &str, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_str().unwrap().to_string()
    }

    // Single test so the fake scripts are never written while another test spawns.
    #[cfg(unix)]
    #[test]
    fn test_cli_adapter_with_fake_bq() {
        let dir = tempfile::tempdir().unwrap();
        let ok = fake_bq(
            dir.path(),
            "bq_ok",
            r#"case "$*" in
  *"show -j"*) echo '{"status":{"state":"DONE"},"statistics":{"load":{"outputRows":"42"}}}' ;;
esac
exit 0"#,
        );
        let missing = fake_bq(
            dir.path(),
            "bq_missing",
            "echo 'BigQuery error in show operation: Not found: Table proj:ds.t'\nexit 2",
        );
        let anonymous = fake_bq(
            dir.path(),
            "bq_anon",
            "echo 'Anonymous caller does not have bigquery.tables.get' >&2\nexit 1",
        );
        let t = table("t");

        let adapter = BqCliAdapter::new(Some("US".into())).with_binary(ok);
        assert!(adapter.check_availability());
        assert!(adapter.table_exists(&t).unwrap());
        let mut payload = std::io::Cursor::new(b"id\n1\n".to_vec());
        let job = adapter
            .submit_load_job(&mut payload, &t, &LoadJobOptions::csv_autodetect())
            .unwrap();
        assert!(job.job_id.starts_with("csv_load_t_"));
        assert_eq!(adapter.await_completion(&job).unwrap(), 42);

        let adapter = BqCliAdapter::new(None).with_binary(missing);
        assert!(!adapter.table_exists(&t).unwrap());

        let adapter = BqCliAdapter::new(None).with_binary(anonymous);
        assert!(matches!(
            adapter.table_exists(&t),
            Err(LoadError::Authentication(_))
        ));
    }
}
