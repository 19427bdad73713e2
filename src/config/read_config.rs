//! Configuration file reading and parsing.
//!
//! This module handles locating, reading, and parsing INI-format configuration files,
//! with support for layered overrides.

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use configparser::ini::Ini;
use thiserror::Error;

use super::{Config, ConnectionSettings, FedoraConfig, LoggingConfig, RepositoryConfig, SiteConfig};

// =============================================================================
// Constants - Default Values
// =============================================================================

const DEFAULT_LOGGING_LEVEL: &str = "info";
const DEFAULT_OAI_PREFIX: &str = "oai:";

const ENV_CONFIG_FILE: &str = "GENREPO_CONFIG_FILE";
const DEFAULT_CONFIG_FILENAME: &str = ".genrepoconfig";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid integer '{value}' for key '{key}': {source}")]
    InvalidInteger {
        key: String,
        value: String,
        source: std::num::ParseIntError,
    },

    #[error("invalid override key '{key}': {message}")]
    InvalidOverrideKey { key: String, message: String },

    #[error("missing required field '{field}' in section '{section}'")]
    MissingRequiredField { section: String, field: String },
}

/// Result type for config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

// =============================================================================
// ConfigSource
// =============================================================================

/// Specifies how to locate and layer configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigSource {
    /// Explicit config file path from CLI. If specified and doesn't exist, error.
    /// If None, fall back to GENREPO_CONFIG_FILE env var, then ~/.genrepoconfig.
    pub config_file: Option<PathBuf>,

    /// Additional override config file (layered on top of base config).
    pub override_file: Option<PathBuf>,

    /// Individual key=value overrides (applied last).
    /// Keys use dot-notation: "fedora.root_url", "repository.archive.username"
    pub overrides: Vec<(String, String)>,
}

// =============================================================================
// Value Parsing
// =============================================================================

fn parse_u64(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|e| ConfigError::InvalidInteger {
            key: key.to_string(),
            value: value.to_string(),
            source: e,
        })
}

/// Parse connection settings from an INI section. Missing keys stay `None`.
fn parse_connection_settings(ini: &Ini, section: &str) -> Result<ConnectionSettings> {
    let timeout_secs = match ini.get(section, "timeout_secs") {
        Some(v) => Some(parse_u64(&format!("{}.timeout_secs", section), &v)?),
        None => None,
    };
    Ok(ConnectionSettings {
        username: ini.get(section, "username"),
        password: ini.get(section, "password"),
        pidspace: ini.get(section, "pidspace"),
        timeout_secs,
    })
}

/// Copy values from `from` to `to`, but only those that are set.
fn apply_settings_if_set(to: &mut ConnectionSettings, from: ConnectionSettings) {
    if from.username.is_some() {
        to.username = from.username;
    }
    if from.password.is_some() {
        to.password = from.password;
    }
    if from.pidspace.is_some() {
        to.pidspace = from.pidspace;
    }
    if from.timeout_secs.is_some() {
        to.timeout_secs = from.timeout_secs;
    }
}

// =============================================================================
// Config File Resolution
// =============================================================================

/// Information about how the config file was resolved.
#[derive(Debug)]
pub struct ResolvedConfigFile {
    /// The path to the config file, if one was found.
    pub path: Option<PathBuf>,
    /// Warning message if env var pointed to nonexistent file.
    pub warning: Option<String>,
}

/// Resolve which config file to use based on the ConfigSource and environment.
fn resolve_config_file(source: &ConfigSource) -> Result<ResolvedConfigFile> {
    // If explicit path provided, it must exist
    if let Some(ref path) = source.config_file {
        if path.exists() {
            return Ok(ResolvedConfigFile {
                path: Some(path.clone()),
                warning: None,
            });
        } else {
            return Err(ConfigError::FileNotFound(path.clone()));
        }
    }

    if let Ok(env_path) = env::var(ENV_CONFIG_FILE) {
        let path = PathBuf::from(&env_path);
        if path.exists() {
            return Ok(ResolvedConfigFile {
                path: Some(path),
                warning: None,
            });
        } else {
            // Warn but continue with defaults
            return Ok(ResolvedConfigFile {
                path: None,
                warning: Some(format!(
                    "config file specified by {} does not exist: {}",
                    ENV_CONFIG_FILE, env_path
                )),
            });
        }
    }

    if let Some(home) = home_dir() {
        let default_path = home.join(DEFAULT_CONFIG_FILENAME);
        if default_path.exists() {
            return Ok(ResolvedConfigFile {
                path: Some(default_path),
                warning: None,
            });
        }
    }

    Ok(ResolvedConfigFile {
        path: None,
        warning: None,
    })
}

/// Get the user's home directory.
fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME").map(PathBuf::from)
}

// =============================================================================
// Default Config
// =============================================================================

/// Create a Config with all default values.
fn default_config() -> Config {
    Config {
        fedora: FedoraConfig::default(),
        repositories: HashMap::new(),
        logging: LoggingConfig {
            level: DEFAULT_LOGGING_LEVEL.to_string(),
        },
        site: SiteConfig {
            oai_prefix: DEFAULT_OAI_PREFIX.to_string(),
        },
    }
}

// =============================================================================
// INI Parsing
// =============================================================================

/// Apply an INI file's contents to a Config, layering on top of existing values.
fn apply_ini_to_config(config: &mut Config, ini: &Ini) -> Result<()> {
    // [fedora] section
    if let Some(root_url) = ini.get("fedora", "root_url") {
        config.fedora.root_url = Some(root_url);
    }
    let fedora_settings = parse_connection_settings(ini, "fedora")?;
    apply_settings_if_set(&mut config.fedora.settings, fedora_settings);

    // [logging] section
    if let Some(level) = ini.get("logging", "level") {
        config.logging.level = level;
    }

    // [site] section
    if let Some(prefix) = ini.get("site", "oai_prefix") {
        config.site.oai_prefix = prefix;
    }

    // [repository.*] sections
    for section_name in ini.sections() {
        if let Some(repo_name) = section_name.strip_prefix("repository.") {
            let root_url = ini.get(&section_name, "root_url").ok_or_else(|| {
                ConfigError::MissingRequiredField {
                    section: section_name.clone(),
                    field: "root_url".to_string(),
                }
            })?;

            let repo_config = RepositoryConfig {
                root_url,
                settings: parse_connection_settings(ini, &section_name)?,
            };

            config
                .repositories
                .insert(repo_name.to_string(), repo_config);
        }
    }

    Ok(())
}

/// Load and parse an INI file.
fn load_ini(path: &Path) -> Result<Ini> {
    let mut ini = Ini::new();
    ini.load(path).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e,
    })?;
    Ok(ini)
}

// =============================================================================
// Override Application
// =============================================================================

/// Apply a single key=value override to the config.
fn apply_override(config: &mut Config, key: &str, value: &str) -> Result<()> {
    let parts: Vec<&str> = key.splitn(3, '.').collect();

    match parts.as_slice() {
        // fedora.root_url, fedora.username, ...
        ["fedora", "root_url"] => {
            config.fedora.root_url = Some(value.to_string());
            Ok(())
        }
        ["fedora", param] => {
            apply_connection_override(&mut config.fedora.settings, key, param, value)
        }

        ["logging", "level"] => {
            config.logging.level = value.to_string();
            Ok(())
        }

        ["site", "oai_prefix"] => {
            config.site.oai_prefix = value.to_string();
            Ok(())
        }

        // repository.name.param
        ["repository", name, param] => apply_repository_override(config, name, key, param, value),

        _ => Err(ConfigError::InvalidOverrideKey {
            key: key.to_string(),
            message: "unrecognized key format".to_string(),
        }),
    }
}

fn apply_repository_override(
    config: &mut Config,
    name: &str,
    key: &str,
    param: &str,
    value: &str,
) -> Result<()> {
    let repo = config
        .repositories
        .entry(name.to_string())
        .or_insert_with(|| RepositoryConfig {
            root_url: String::new(),
            settings: ConnectionSettings::default(),
        });

    match param {
        "root_url" => {
            repo.root_url = value.to_string();
            Ok(())
        }
        _ => apply_connection_override(&mut repo.settings, key, param, value),
    }
}

fn apply_connection_override(
    settings: &mut ConnectionSettings,
    key: &str,
    param: &str,
    value: &str,
) -> Result<()> {
    match param {
        "username" => settings.username = Some(value.to_string()),
        "password" => settings.password = Some(value.to_string()),
        "pidspace" => settings.pidspace = Some(value.to_string()),
        "timeout_secs" => settings.timeout_secs = Some(parse_u64(key, value)?),
        _ => {
            return Err(ConfigError::InvalidOverrideKey {
                key: key.to_string(),
                message: format!("unknown parameter '{}'", param),
            })
        }
    }
    Ok(())
}

// =============================================================================
// Main Entry Point
// =============================================================================

/// Result of reading configuration, including any warnings.
#[derive(Debug)]
pub struct ConfigResult {
    /// The parsed configuration.
    pub config: Config,
    /// Any warnings generated during config loading.
    pub warnings: Vec<String>,
}

/// Read and parse configuration from the specified sources.
///
/// Configuration is layered in this order:
/// 1. Built-in defaults
/// 2. Base config file (from CLI, env var, or ~/.genrepoconfig)
/// 3. Override config file (if specified)
/// 4. Individual overrides (applied last)
pub fn read_config(source: &ConfigSource) -> Result<ConfigResult> {
    let mut warnings = Vec::new();

    let mut config = default_config();

    let resolved = resolve_config_file(source)?;
    if let Some(warning) = resolved.warning {
        warnings.push(warning);
    }
    if let Some(ref path) = resolved.path {
        let ini = load_ini(path)?;
        apply_ini_to_config(&mut config, &ini)?;
    }

    if let Some(ref override_path) = source.override_file {
        if !override_path.exists() {
            return Err(ConfigError::FileNotFound(override_path.clone()));
        }
        let ini = load_ini(override_path)?;
        apply_ini_to_config(&mut config, &ini)?;
    }

    for (key, value) in &source.overrides {
        apply_override(&mut config, key, value)?;
    }

    Ok(ConfigResult { config, warnings })
}

// =============================================================================
// Tests
// =============================================================================
