//! Configuration helper for interpreting config values.
//!
//! The `ConfigHelper` wraps a `Config` and provides methods for interpreting
//! configuration values, such as resolving settings a named repository
//! inherits from `[fedora]`.

use std::time::Duration;

use super::{Config, ConnectionSettings, RepositoryConfig};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings with inheritance and defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConnection {
    pub root_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub pidspace: Option<String>,
    pub timeout: Duration,
}

/// Helper for interpreting configuration values.
#[derive(Debug, Clone)]
pub struct ConfigHelper {
    config: Config,
}

impl ConfigHelper {
    /// Create a new ConfigHelper wrapping the given config.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Get a reference to the underlying config.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consume the helper and return the underlying config.
    pub fn into_config(self) -> Config {
        self.config
    }

    pub fn get_repository(&self, name: &str) -> Option<&RepositoryConfig> {
        self.config.repositories.get(name)
    }

    /// Prefix for OAI item identifiers.
    pub fn oai_prefix(&self) -> &str {
        &self.config.site.oai_prefix
    }

    /// Connection for the `[fedora]` default repository, if it names a root URL.
    pub fn resolve_default_connection(&self) -> Option<ResolvedConnection> {
        let root_url = self.config.fedora.root_url.clone()?;
        Some(self.resolve(root_url, &ConnectionSettings::default()))
    }

    /// Connection for a `[repository.{name}]` section, inheriting unset
    /// values from `[fedora]`.
    pub fn resolve_repository_connection(&self, name: &str) -> Option<ResolvedConnection> {
        let repo = self.get_repository(name)?;
        Some(self.resolve(repo.root_url.clone(), &repo.settings))
    }

    /// Connection to an explicit URL using the `[fedora]` credentials.
    pub fn resolve_url_connection(&self, root_url: &str) -> ResolvedConnection {
        self.resolve(root_url.to_string(), &ConnectionSettings::default())
    }

    fn resolve(&self, root_url: String, settings: &ConnectionSettings) -> ResolvedConnection {
        let fedora = &self.config.fedora.settings;
        ResolvedConnection {
            root_url,
            username: settings.username.clone().or_else(|| fedora.username.clone()),
            password: settings.password.clone().or_else(|| fedora.password.clone()),
            pidspace: settings.pidspace.clone().or_else(|| fedora.pidspace.clone()),
            timeout: Duration::from_secs(
                settings
                    .timeout_secs
                    .or(fedora.timeout_secs)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
        }
    }
}

impl From<Config> for ConfigHelper {
    fn from(config: Config) -> Self {
        Self::new(config)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::config::{FedoraConfig, LoggingConfig, SiteConfig};

    fn config() -> Config {
        let mut repositories = HashMap::new();
        repositories.insert(
            "archive".to_string(),
            RepositoryConfig {
                root_url: "https://archive/fedora".to_string(),
                settings: ConnectionSettings {
                    username: Some("archivist".to_string()),
                    timeout_secs: Some(5),
                    ..Default::default()
                },
            },
        );
        Config {
            fedora: FedoraConfig {
                root_url: Some("http://localhost:8080/fedora".to_string()),
                settings: ConnectionSettings {
                    username: Some("fedoraAdmin".to_string()),
                    password: Some("secret".to_string()),
                    pidspace: Some("demo".to_string()),
                    timeout_secs: None,
                },
            },
            repositories,
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            site: SiteConfig {
                oai_prefix: "oai:".to_string(),
            },
        }
    }

    #[test]
    fn test_default_connection() {
        let helper = ConfigHelper::new(config());
        let conn = helper.resolve_default_connection().unwrap();
        assert_eq!(conn.root_url, "http://localhost:8080/fedora");
        assert_eq!(conn.username.as_deref(), Some("fedoraAdmin"));
        assert_eq!(conn.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_repository_inherits_from_fedora() {
        let helper = ConfigHelper::new(config());
        let conn = helper.resolve_repository_connection("archive").unwrap();
        assert_eq!(conn.root_url, "https://archive/fedora");
        assert_eq!(conn.username.as_deref(), Some("archivist"));
        assert_eq!(conn.password.as_deref(), Some("secret"));
        assert_eq!(conn.pidspace.as_deref(), Some("demo"));
        assert_eq!(conn.timeout, Duration::from_secs(5));

        assert!(helper.resolve_repository_connection("missing").is_none());
    }

    #[test]
    fn test_no_default_root_url() {
        let mut config = config();
        config.fedora.root_url = None;
        assert!(ConfigHelper::new(config).resolve_default_connection().is_none());
    }
}
