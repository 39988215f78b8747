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

//! Configuration for the loader: a YAML or JSON file, overridable from the
//! command line.

use crate::domain::entities::{DatasetLocation, RetryBudget, DEFAULT_MAX_RETRIES};
use crate::domain::errors::{LoadError, Result};
use clap::Parser;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub bigquery: BigQueryConfig,
    pub load: LoadConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BigQueryConfig {
    pub project: String,
    pub dataset: String,
    /// Processing location, e.g. `US` or `europe-west2`.
    pub location: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoadConfig {
    /// Directory whose files are loaded; only `*.csv` entries become tables.
    pub input_dir: String,
    /// Attempts per file, not retries.
    pub max_retries: Option<u32>,
    /// Where to write the `Failed Files` CSV report.
    pub report_path: Option<String>,
}

#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file (YAML or JSON)
    #[arg(short, long)]
    pub config: Option<String>,

    #[arg(long)]
    pub project: Option<String>,
    #[arg(long)]
    pub dataset: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    /// Directory holding the CSV files
    #[arg(short, long)]
    pub input: Option<String>,
    #[arg(long)]
    pub max_retries: Option<u32>,
    /// Write the failed file names to this CSV file
    #[arg(long)]
    pub report: Option<String>,
}

impl AppConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config: AppConfig = if path.ends_with(".json") {
            serde_json::from_str(&contents).map_err(|e| LoadError::ConfigError(e.to_string()))?
        } else {
            serde_yaml::from_str(&contents).map_err(|e| LoadError::ConfigError(e.to_string()))?
        };

        Ok(config)
    }

    /// Builds a config purely from CLI flags when no file is given.
    pub fn from_cli(args: &CliArgs) -> Self {
        Self {
            bigquery: BigQueryConfig {
                project: args.project.clone().unwrap_or_default(),
                dataset: args.dataset.clone().unwrap_or_default(),
                location: args.location.clone(),
            },
            load: LoadConfig {
                input_dir: args.input.clone().unwrap_or_else(|| ".".to_string()),
                max_retries: args.max_retries,
                report_path: args.report.clone(),
            },
        }
    }

    pub fn merge_cli(&mut self, args: &CliArgs) {
        if let Some(p) = &args.project { self.bigquery.project = p.clone(); }
        if let Some(d) = &args.dataset { self.bigquery.dataset = d.clone(); }
        if let Some(l) = &args.location { self.bigquery.location = Some(l.clone()); }
        if let Some(i) = &args.input { self.load.input_dir = i.clone(); }
        if let Some(r) = args.max_retries { self.load.max_retries = Some(r); }
        if let Some(r) = &args.report { self.load.report_path = Some(r.clone()); }
    }

    pub fn validate(&self) -> Result<()> {
        if self.bigquery.project.trim().is_empty() {
            return Err(LoadError::ConfigError("bigquery.project is required".into()));
        }
        if self.bigquery.dataset.trim().is_empty() {
            return Err(LoadError::ConfigError("bigquery.dataset is required".into()));
        }
        if self.load.input_dir.trim().is_empty() {
            return Err(LoadError::ConfigError("load.input_dir is required".into()));
        }
        if self.load.max_retries == Some(0) {
            return Err(LoadError::ConfigError(
                "load.max_retries must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn dataset_location(&self) -> Result<DatasetLocation> {
        DatasetLocation::new(&self.bigquery.project, &self.bigquery.dataset)
    }

    pub fn retry_budget(&self) -> Result<RetryBudget> {
        RetryBudget::new(self.load.max_retries.unwrap_or(DEFAULT_MAX_RETRIES))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_yaml_config() {
        let yaml = r#"
bigquery:
  project: "my-project"
  dataset: "staging"
  location: "US"
load:
  input_dir: "./csv"
  max_retries: 5
"#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", yaml).unwrap();
        let path = file.path().to_str().unwrap();

        let config = AppConfig::from_file(path).expect("Failed to parse config");

        assert_eq!(config.bigquery.project, "my-project");
        assert_eq!(config.bigquery.location.as_deref(), Some("US"));
        assert_eq!(config.load.max_retries, Some(5));
        assert_eq!(config.retry_budget().unwrap().max_attempts(), 5);
        assert!(config.load.report_path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_json_config() {
        let json = r#"{
  "bigquery": { "project": "p", "dataset": "d" },
  "load": { "input_dir": "in", "report_path": "failed.csv" }
}"#;
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "{}", json).unwrap();
        let path = file.path().to_str().unwrap();

        let config = AppConfig::from_file(path).unwrap();
        assert_eq!(config.dataset_location().unwrap().to_string(), "p:d");
        assert_eq!(config.retry_budget().unwrap().max_attempts(), 3);
        assert_eq!(config.load.report_path.as_deref(), Some("failed.csv"));
    }

    #[test]
    fn test_merge_cli_overrides() {
        let args = CliArgs {
            project: Some("p".into()),
            dataset: Some("d".into()),
            input: Some("data".into()),
            ..Default::default()
        };
        let mut config = AppConfig::from_cli(&args);
        assert!(config.validate().is_ok());

        let override_args = CliArgs {
            dataset: Some("other".into()),
            max_retries: Some(1),
            ..Default::default()
        };
        config.merge_cli(&override_args);
        assert_eq!(config.bigquery.dataset, "other");
        assert_eq!(config.bigquery.project, "p");
        assert_eq!(config.load.max_retries, Some(1));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::from_cli(&CliArgs::default());
        assert!(matches!(config.validate(), Err(LoadError::ConfigError(_))));

        config.bigquery.project = "p".into();
        config.bigquery.dataset = "d".into();
        config.load.max_retries = Some(0);
        assert!(matches!(config.validate(), Err(LoadError::ConfigError(_))));
    }
}
