//! Top-level application component.
//!
//! The [`App`] owns the configuration and is the root for the application's
//! functionality: it opens repositories and carries site settings that the
//! collection and file operations need.

use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

use crate::app::FormErrors;
use crate::config::{read_config, ConfigHelper, ConfigSource};
use crate::repo::{create_repo, CreateRepoContext, CreateRepoError, Repo, RepoError};
use crate::repository::Pid;

// =============================================================================
// Error Types
// =============================================================================

const CONTACT_ADMIN: &str = "Please contact a site administrator.";

/// A save rejected by the repository, with the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SaveFailure {
    pub message: String,
    /// Status code reported by Fedora, when known.
    pub status: Option<u16>,
}

impl SaveFailure {
    /// Describe a failed request. `action` completes "You don't have permission to ...".
    pub fn from_request_failure(err: &RepoError, action: &str) -> Self {
        let message = match err {
            RepoError::PermissionDenied(_) => {
                format!("You don't have permission to {}. {}", action, CONTACT_ADMIN)
            }
            _ => format!(
                "There was an error communicating with the repository. {}",
                CONTACT_ADMIN
            ),
        };
        Self {
            message,
            status: err.status(),
        }
    }
}

/// Errors that can occur during App operations.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Repository creation error.
    #[error("failed to create repository: {0}")]
    CreateRepo(#[from] CreateRepoError),

    /// Submitted form data did not validate.
    #[error("invalid input: {0}")]
    Invalid(#[from] FormErrors),

    /// The object does not exist, or the current credentials cannot see it.
    #[error("not found: {0}")]
    NotFound(Pid),

    /// The repository refused or failed a save.
    #[error("{0}")]
    Save(SaveFailure),

    /// Any other repository error.
    #[error("repository error: {0}")]
    Repo(#[from] RepoError),
}

impl AppError {
    /// Map a save error: request failures become a [`SaveFailure`], anything
    /// else stays a repository error.
    pub(crate) fn from_save(err: RepoError, action: &str) -> Self {
        if err.is_request_failure() {
            warn!(error = %err, "save failed");
            AppError::Save(SaveFailure::from_request_failure(&err, action))
        } else {
            AppError::Repo(err)
        }
    }

    /// HTTP-style status code for this error.
    pub fn status(&self) -> u16 {
        match self {
            AppError::Invalid(_) => 400,
            AppError::NotFound(_) => 404,
            AppError::Save(failure) => failure.status.unwrap_or(500),
            AppError::Repo(e) => e.status().unwrap_or(500),
            AppError::Config(_) | AppError::CreateRepo(_) => 500,
        }
    }
}

/// Result type for App operations.
pub type Result<T> = std::result::Result<T, AppError>;

// =============================================================================
// Context Types
// =============================================================================

/// Context for creating an App.
#[derive(Default)]
pub struct AppContext {
    /// Source for configuration files.
    pub config_source: ConfigSource,
}

/// Context for opening a repository via the App.
#[derive(Debug, Default)]
pub struct AppCreateRepoContext {
    /// Repository specification (URL, `memory:`, or named repository).
    /// `None` selects the `[fedora]` default.
    pub spec: Option<String>,
}

impl AppCreateRepoContext {
    /// Create a new context for the given spec.
    pub fn new(spec: Option<impl Into<String>>) -> Self {
        Self {
            spec: spec.map(Into::into),
        }
    }
}

// =============================================================================
// App
// =============================================================================

/// The top-level application component.
pub struct App {
    config: ConfigHelper,
    config_warnings: Vec<String>,
}

impl App {
    /// Create a new App, reading configuration as described by the context.
    ///
    /// Configuration warnings are kept for the caller to report once logging
    /// is set up.
    pub fn new(ctx: AppContext) -> Result<Self> {
        let config_result =
            read_config(&ctx.config_source).map_err(|e| AppError::Config(e.to_string()))?;

        Ok(Self {
            config: ConfigHelper::new(config_result.config),
            config_warnings: config_result.warnings,
        })
    }

    /// Get the configuration helper.
    pub fn config(&self) -> &ConfigHelper {
        &self.config
    }

    /// Problems noticed while reading configuration, such as a missing
    /// `GENREPO_CONFIG_FILE`.
    pub fn config_warnings(&self) -> &[String] {
        &self.config_warnings
    }

    /// Prefix for minted OAI item identifiers.
    pub fn oai_prefix(&self) -> &str {
        self.config.oai_prefix()
    }

    /// Open a repository from a specification.
    pub async fn create_repo(&self, ctx: AppCreateRepoContext) -> Result<Arc<Repo>> {
        let repo_ctx = CreateRepoContext::new(self.config.clone());
        let repo = create_repo(ctx.spec.as_deref(), &repo_ctx).await?;
        Ok(Arc::new(repo))
    }
}
