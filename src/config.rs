//! Runtime configuration loaded from `nrvna.toml` in the workspace root.
//!
//! Missing keys fall back to defaults. `NRVNA_ENDPOINT` takes precedence over
//! the file for the inference endpoint; CLI flags are applied on top by the
//! binary.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{NrvnaError, Result};
use crate::inference::LlamaOptions;

pub const CONFIG_FILE: &str = "nrvna.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct NrvnaConfig {
    /// Number of parallel workers, each with its own runner.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Pause between two scans of `input/ready`.
    #[serde(default = "default_scan_interval_ms")]
    pub scan_interval_ms: u64,

    /// Base URL of the completion server.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Maximum tokens generated per job.
    #[serde(default = "default_n_predict")]
    pub n_predict: u32,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Program invoked to deliver results to a job's email target.
    #[serde(default = "default_mail_command")]
    pub mail_command: String,

    #[serde(default = "default_true")]
    pub notifications: bool,

    /// Release jobs left in `processing/` when `serve` starts. Only safe when
    /// no other scheduler shares the workspace.
    #[serde(default)]
    pub recover_claimed: bool,
}

fn default_workers() -> usize {
    4
}

fn default_scan_interval_ms() -> u64 {
    100
}

fn default_endpoint() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_n_predict() -> u32 {
    1500
}

fn default_request_timeout_secs() -> u64 {
    600
}

fn default_mail_command() -> String {
    "mail".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for NrvnaConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            scan_interval_ms: default_scan_interval_ms(),
            endpoint: default_endpoint(),
            n_predict: default_n_predict(),
            request_timeout_secs: default_request_timeout_secs(),
            mail_command: default_mail_command(),
            notifications: true,
            recover_claimed: false,
        }
    }
}

impl NrvnaConfig {
    /// Loads `nrvna.toml` from `workspace`, or defaults if it does not exist.
    pub fn load(workspace: &Path) -> Result<Self> {
        let path = workspace.join(CONFIG_FILE);
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(|e| NrvnaError::io(&path, e))?;
            toml::from_str::<NrvnaConfig>(&contents)?
        } else {
            Self::default()
        };

        if let Some(endpoint) = std::env::var("NRVNA_ENDPOINT").ok().filter(|e| !e.is_empty()) {
            config.endpoint = endpoint;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(NrvnaError::Config("workers must be at least 1".into()));
        }
        if self.scan_interval_ms == 0 {
            return Err(NrvnaError::Config("scan_interval_ms must be at least 1".into()));
        }
        Ok(())
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.scan_interval_ms)
    }

    pub fn llama_options(&self) -> LlamaOptions {
        LlamaOptions {
            endpoint: self.endpoint.clone(),
            n_predict: self.n_predict,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = NrvnaConfig::default();
        assert_eq!(config.workers, 4);
        assert_eq!(config.scan_interval(), Duration::from_millis(100));
        assert_eq!(config.n_predict, 1500);
        assert_eq!(config.mail_command, "mail");
        assert!(config.notifications);
        assert!(!config.recover_claimed);
    }

    #[test]
    fn deserialize_partial_toml() {
        let toml_str = r#"
            workers = 2
            mail_command = "mailx"
        "#;
        let config: NrvnaConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.workers, 2);
        assert_eq!(config.mail_command, "mailx");
        assert_eq!(config.scan_interval_ms, 100);
        assert_eq!(config.endpoint, "http://127.0.0.1:8080");
    }

    #[test]
    fn load_falls_back_to_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = NrvnaConfig::load(tmp.path()).unwrap();
        assert_eq!(config.workers, 4);
    }

    #[test]
    fn recovery_is_opt_in() {
        let config: NrvnaConfig = toml::from_str("workers = 1\n").unwrap();
        assert!(!config.recover_claimed);
        let config: NrvnaConfig = toml::from_str("recover_claimed = true\n").unwrap();
        assert!(config.recover_claimed);
    }

    #[test]
    fn load_reads_workspace_file() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE), "workers = 8\nnotifications = false\n").unwrap();
        let config = NrvnaConfig::load(tmp.path()).unwrap();
        assert_eq!(config.workers, 8);
        assert!(!config.notifications);
    }

    #[test]
    fn zero_workers_is_rejected() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE), "workers = 0\n").unwrap();
        let err = NrvnaConfig::load(tmp.path()).unwrap_err();
        assert!(matches!(err, NrvnaError::Config(_)));
    }

    #[test]
    fn malformed_file_is_a_toml_error() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE), "workers = \"many\"\n").unwrap();
        assert!(matches!(
            NrvnaConfig::load(tmp.path()),
            Err(NrvnaError::Toml(_))
        ));
    }
}
