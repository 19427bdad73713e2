//! Configuration types for genrepo-rs.
//!
//! This module defines the structures used to represent application configuration
//! as parsed from an INI-format config file.

use std::collections::HashMap;

// =============================================================================
// Connection Settings (shared across fedora and repository sections)
// =============================================================================

/// Settings for talking to a Fedora repository. Unset values in a
/// `[repository.{name}]` section are inherited from `[fedora]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub username: Option<String>,
    pub password: Option<String>,
    /// Namespace for newly minted pids.
    pub pidspace: Option<String>,
    pub timeout_secs: Option<u64>,
}

// =============================================================================
// Config Sections
// =============================================================================

/// [fedora] section - the default repository.
#[derive(Debug, Clone, Default)]
pub struct FedoraConfig {
    pub root_url: Option<String>,
    pub settings: ConnectionSettings,
}

/// [repository.{name}] section - named repository configuration.
#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    pub root_url: String,
    pub settings: ConnectionSettings,
}

/// [logging] section.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Default log filter when `RUST_LOG` is not set.
    pub level: String,
}

/// [site] section - values used when building object metadata.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Prefix for OAI item identifiers, followed by the object URI.
    pub oai_prefix: String,
}

// =============================================================================
// Top-Level Config
// =============================================================================

/// Complete application configuration as parsed from config file.
#[derive(Debug, Clone)]
pub struct Config {
    pub fedora: FedoraConfig,
    pub repositories: HashMap<String, RepositoryConfig>,
    pub logging: LoggingConfig,
    pub site: SiteConfig,
}
