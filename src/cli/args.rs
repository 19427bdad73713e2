//! Command-line argument definitions and helpers.

use std::path::PathBuf;

use clap::Args;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

use crate::app::{AppContext, AppCreateRepoContext};
use crate::config::ConfigSource;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during argument processing.
#[derive(Debug, Error)]
pub enum ArgsError {
    /// I/O error reading or writing.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid argument combination.
    #[error("{0}")]
    InvalidArgs(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for argument operations.
pub type Result<T> = std::result::Result<T, ArgsError>;

// =============================================================================
// Global Arguments
// =============================================================================

/// Global arguments that apply to all commands.
#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    /// Path to the main configuration file.
    #[arg(long = "config-file", global = true)]
    pub config_file: Option<PathBuf>,

    /// Path to the configuration overrides file.
    #[arg(long = "config-file-overrides", global = true)]
    pub config_file_overrides: Option<PathBuf>,

    /// Configuration overrides in the form name=value.
    #[arg(long = "config", value_parser = parse_config_override, global = true)]
    pub config_overrides: Vec<(String, String)>,

    /// Format output as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Repository specification: a Fedora URL, `memory:`, or a named
    /// repository. Defaults to the `[fedora]` section of the config.
    #[arg(long = "repository", global = true)]
    pub repository: Option<String>,
}

impl GlobalArgs {
    /// Convert to a ConfigSource for reading configuration.
    pub fn to_config_source(&self) -> ConfigSource {
        ConfigSource {
            config_file: self.config_file.clone(),
            override_file: self.config_file_overrides.clone(),
            overrides: self.config_overrides.clone(),
        }
    }

    /// Convert to an AppContext for creating an App.
    pub fn to_app_context(&self) -> AppContext {
        AppContext {
            config_source: self.to_config_source(),
        }
    }

    /// Context for opening the repository named by `--repository`.
    pub fn to_create_repo_context(&self) -> AppCreateRepoContext {
        AppCreateRepoContext {
            spec: self.repository.clone(),
        }
    }
}

/// Parse a config override from "name=value" format.
fn parse_config_override(s: &str) -> std::result::Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid config override '{}': expected name=value", s))?;
    Ok((name.to_string(), value.to_string()))
}

// =============================================================================
// Output Helpers
// =============================================================================

/// Helper for commands that write output to a file or stdout.
#[derive(Args, Debug, Default)]
pub struct OutputSink {
    /// Write output to this file instead of stdout.
    #[arg(id = "output_file", short = 'o', long = "output-file")]
    pub file: Option<PathBuf>,
}

impl OutputSink {
    /// Write a string value to the output.
    pub async fn write_str(&self, value: &str) -> Result<()> {
        match &self.file {
            Some(path) => {
                tokio::fs::write(path, value).await?;
            }
            None => {
                let mut stdout = tokio::io::stdout();
                stdout.write_all(value.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
        }
        Ok(())
    }

    /// Write a value as pretty-printed JSON.
    pub async fn write_json<T: serde::Serialize>(&self, value: &T) -> Result<()> {
        let output = serde_json::to_string_pretty(value)?;
        self.write_str(&output).await
    }

    /// Write a value as JSON, or as the given text when `json` is false.
    pub async fn write<T: serde::Serialize>(&self, value: &T, json: bool, text: &str) -> Result<()> {
        if json {
            self.write_json(value).await
        } else {
            self.write_str(text).await
        }
    }

    /// Write raw bytes to the output.
    pub async fn write_bytes(&self, data: &[u8]) -> Result<()> {
        match &self.file {
            Some(path) => {
                tokio::fs::write(path, data).await?;
            }
            None => {
                let mut stdout = tokio::io::stdout();
                stdout.write_all(data).await?;
                stdout.flush().await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_override() {
        assert_eq!(
            parse_config_override("fedora.root_url=http://x/fedora?a=b").unwrap(),
            (
                "fedora.root_url".to_string(),
                "http://x/fedora?a=b".to_string()
            )
        );
        assert!(parse_config_override("no-equals").is_err());
    }

    #[tokio::test]
    async fn test_output_sink_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let sink = OutputSink {
            file: Some(path.clone()),
        };
        sink.write(&vec!["a", "b"], true, "a b").await.unwrap();
        let written: Vec<String> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, vec!["a", "b"]);

        sink.write_bytes(b"\x00\x01").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), vec![0, 1]);
    }
}
