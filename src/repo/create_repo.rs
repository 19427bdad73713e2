//! Repository creation utilities.
//!
//! This module parses repository specifications and builds the backend and
//! [`Repo`] they describe.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::backend::{
    HttpBackend, HttpBackendConfig, MemoryBackend, RepoBackend, DEFAULT_NAMESPACE,
};
use crate::config::{ConfigHelper, ResolvedConnection};

use super::Repo;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during repository creation.
#[derive(Debug, Error)]
pub enum CreateRepoError {
    /// The repository specification is invalid.
    #[error("invalid repo spec: {0}")]
    InvalidRepoSpec(String),

    /// A named repository was not found in the configuration.
    #[error("repository not found: {0}")]
    RepositoryNotFound(String),

    /// No repository was named and `[fedora]` has no `root_url`.
    #[error("no repository specified and [fedora] root_url is not configured")]
    NoDefaultRepository,

    /// Backend creation failed.
    #[error("failed to create backend: {0}")]
    BackendError(String),
}

/// Result type for repository creation.
pub type Result<T> = std::result::Result<T, CreateRepoError>;

// =============================================================================
// Parsed Repository Specification
// =============================================================================

const MEMORY_SCHEME: &str = "memory:";

/// The type of backend indicated by a repository specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendType {
    /// Fedora REST API (http:// or https:// URL).
    Http,
    /// Process-local store (`memory:`), empty at start.
    Memory,
}

/// A parsed repository specification.
#[derive(Debug, Clone)]
pub struct ParsedRepoSpec {
    pub backend_type: BackendType,
    /// Where and how to connect, with config inheritance applied.
    pub connection: ResolvedConnection,
}

impl ParsedRepoSpec {
    /// Parse a repository specification string.
    ///
    /// Accepts:
    /// - `http://host/fedora` or `https://host/fedora`
    /// - `memory:`
    /// - A bare name (looked up as `[repository.{name}]`)
    /// - Nothing, meaning the `[fedora]` default
    pub fn parse(spec: Option<&str>, config: &ConfigHelper) -> Result<Self> {
        let Some(spec) = spec.map(str::trim) else {
            let connection = config
                .resolve_default_connection()
                .ok_or(CreateRepoError::NoDefaultRepository)?;
            return Ok(Self::http(connection));
        };

        if spec.is_empty() {
            return Err(CreateRepoError::InvalidRepoSpec(
                "empty repository spec".to_string(),
            ));
        }
        if spec.starts_with("http://") || spec.starts_with("https://") {
            return Ok(Self::http(config.resolve_url_connection(spec)));
        }
        if spec == MEMORY_SCHEME {
            return Ok(Self {
                backend_type: BackendType::Memory,
                connection: config.resolve_url_connection(spec),
            });
        }
        if spec.contains(':') {
            return Err(CreateRepoError::InvalidRepoSpec(format!(
                "unsupported repository spec '{}'",
                spec
            )));
        }

        let connection = config
            .resolve_repository_connection(spec)
            .ok_or_else(|| CreateRepoError::RepositoryNotFound(spec.to_string()))?;
        Ok(Self::http(connection))
    }

    fn http(connection: ResolvedConnection) -> Self {
        Self {
            backend_type: BackendType::Http,
            connection,
        }
    }
}

// =============================================================================
// CreateRepoContext
// =============================================================================

/// Context for creating repositories.
pub struct CreateRepoContext {
    config: Arc<ConfigHelper>,
}

impl CreateRepoContext {
    /// Create a new context.
    pub fn new(config: ConfigHelper) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Get the configuration helper.
    pub fn config(&self) -> &ConfigHelper {
        &self.config
    }

    /// Parse a repository specification.
    pub fn parse_repo_spec(&self, spec: Option<&str>) -> Result<ParsedRepoSpec> {
        ParsedRepoSpec::parse(spec, &self.config)
    }

    /// Create a repository from a specification string.
    pub async fn create_repo(&self, spec: Option<&str>) -> Result<Repo> {
        let parsed = self.parse_repo_spec(spec)?;
        self.create_repo_from_spec(&parsed).await
    }

    /// Create a repository from a parsed specification.
    pub async fn create_repo_from_spec(&self, spec: &ParsedRepoSpec) -> Result<Repo> {
        let conn = &spec.connection;
        debug!(
            backend = ?spec.backend_type,
            root_url = %conn.root_url,
            user = conn.username.as_deref().unwrap_or("anonymous"),
            "creating repository"
        );

        let backend: Arc<dyn RepoBackend> = match spec.backend_type {
            BackendType::Http => {
                let mut http_config =
                    HttpBackendConfig::new(&conn.root_url).with_timeout(conn.timeout);
                if let Some(ref username) = conn.username {
                    http_config = http_config
                        .with_credentials(username, conn.password.clone().unwrap_or_default());
                }
                let backend = HttpBackend::new(http_config)
                    .map_err(|e| CreateRepoError::BackendError(e.to_string()))?;
                Arc::new(backend)
            }

            BackendType::Memory => Arc::new(MemoryBackend::with_namespace(
                conn.pidspace.as_deref().unwrap_or(DEFAULT_NAMESPACE),
            )),
        };

        Ok(Repo::from_dyn(backend).with_pidspace(conn.pidspace.clone()))
    }
}

// =============================================================================
// Convenience Function
// =============================================================================

/// Create a repository from a specification string.
///
/// This is a convenience function that delegates to [`CreateRepoContext::create_repo`].
pub async fn create_repo(spec: Option<&str>, ctx: &CreateRepoContext) -> Result<Repo> {
    ctx.create_repo(spec).await
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::config::{read_config, ConfigSource};

    fn config(overrides: &[(&str, &str)]) -> ConfigHelper {
        // An explicit empty file keeps the environment's config out of the way.
        let empty = NamedTempFile::new().unwrap();
        let source = ConfigSource {
            config_file: Some(empty.path().to_path_buf()),
            override_file: None,
            overrides: overrides
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        };
        ConfigHelper::new(read_config(&source).unwrap().config)
    }

    #[test]
    fn test_parse_http_url() {
        let config = config(&[("fedora.username", "fedoraAdmin")]);
        let parsed =
            ParsedRepoSpec::parse(Some("http://localhost:8080/fedora"), &config).unwrap();
        assert_eq!(parsed.backend_type, BackendType::Http);
        assert_eq!(parsed.connection.root_url, "http://localhost:8080/fedora");
        assert_eq!(parsed.connection.username.as_deref(), Some("fedoraAdmin"));
    }

    #[test]
    fn test_parse_memory() {
        let config = config(&[("fedora.pidspace", "demo")]);
        let parsed = ParsedRepoSpec::parse(Some("memory:"), &config).unwrap();
        assert_eq!(parsed.backend_type, BackendType::Memory);
        assert_eq!(parsed.connection.pidspace.as_deref(), Some("demo"));
    }

    #[test]
    fn test_parse_named() {
        let config = config(&[
            ("repository.archive.root_url", "https://archive/fedora"),
            ("repository.archive.timeout_secs", "9"),
        ]);
        let parsed = ParsedRepoSpec::parse(Some("archive"), &config).unwrap();
        assert_eq!(parsed.connection.root_url, "https://archive/fedora");
        assert_eq!(parsed.connection.timeout, Duration::from_secs(9));

        assert!(matches!(
            ParsedRepoSpec::parse(Some("missing"), &config),
            Err(CreateRepoError::RepositoryNotFound(_))
        ));
    }

    #[test]
    fn test_parse_default() {
        assert!(matches!(
            ParsedRepoSpec::parse(None, &config(&[])),
            Err(CreateRepoError::NoDefaultRepository)
        ));

        let config = config(&[("fedora.root_url", "http://default/fedora")]);
        let parsed = ParsedRepoSpec::parse(None, &config).unwrap();
        assert_eq!(parsed.connection.root_url, "http://default/fedora");
    }

    #[test]
    fn test_parse_invalid() {
        let config = config(&[]);
        assert!(ParsedRepoSpec::parse(Some(""), &config).is_err());
        assert!(ParsedRepoSpec::parse(Some("s3://bucket"), &config).is_err());
        assert!(ParsedRepoSpec::parse(Some("memory:extra"), &config).is_err());
    }

    #[tokio::test]
    async fn test_create_memory_repo() {
        let ctx = CreateRepoContext::new(config(&[("fedora.pidspace", "demo")]));
        let repo = create_repo(Some("memory:"), &ctx).await.unwrap();
        assert_eq!(repo.pidspace(), Some("demo"));
        assert!(repo.all_collections().await.unwrap().is_empty());
    }
}
