use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::kinds::ContentModelSet;
use crate::repository::Pid;

/// Error type for backend operations.
#[derive(Debug)]
pub enum BackendError {
    /// The object or datastream was not found.
    NotFound,
    /// The repository refused the request for the current credentials.
    PermissionDenied(String),
    /// The request could not be completed: a transport failure or an
    /// unexpected status code from the repository.
    RequestFailed {
        status: Option<u16>,
        message: String,
    },
    /// An I/O error occurred.
    Io(std::io::Error),
    /// A custom error message.
    Other(String),
}

impl BackendError {
    /// True for failures of a request to the repository, including permission
    /// denials. These are the faults the accessibility filter treats as absence.
    pub fn is_request_failure(&self) -> bool {
        matches!(
            self,
            BackendError::PermissionDenied(_) | BackendError::RequestFailed { .. }
        )
    }

    /// HTTP status code reported by the repository, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::NotFound => Some(404),
            BackendError::PermissionDenied(_) => Some(401),
            BackendError::RequestFailed { status, .. } => *status,
            _ => None,
        }
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::NotFound => write!(f, "not found"),
            BackendError::PermissionDenied(msg) => write!(f, "permission denied: {}", msg),
            BackendError::RequestFailed {
                status: Some(status),
                message,
            } => write!(f, "request failed ({}): {}", status, message),
            BackendError::RequestFailed {
                status: None,
                message,
            } => write!(f, "request failed: {}", message),
            BackendError::Io(e) => write!(f, "I/O error: {}", e),
            BackendError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for BackendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BackendError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for BackendError {
    fn from(e: std::io::Error) -> Self {
        BackendError::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, BackendError>;

// =============================================================================
// Object and Datastream Types
// =============================================================================

/// Object-level properties reported by the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectProfile {
    pub pid: Pid,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Object state: `A` (active), `I` (inactive) or `D` (deleted).
    pub state: String,
    pub content_models: ContentModelSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
}

/// How the repository stores a datastream's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlGroup {
    /// Inline XML, stored in the object's FOXML.
    #[serde(rename = "X")]
    InlineXml,
    /// Managed content, stored by the repository.
    #[serde(rename = "M")]
    Managed,
}

impl ControlGroup {
    pub fn code(&self) -> &'static str {
        match self {
            ControlGroup::InlineXml => "X",
            ControlGroup::Managed => "M",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "X" => Some(ControlGroup::InlineXml),
            "M" => Some(ControlGroup::Managed),
            _ => None,
        }
    }
}

/// Datastream properties reported by the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatastreamProfile {
    pub dsid: String,
    pub label: String,
    pub mimetype: String,
    pub control_group: ControlGroup,
    pub versionable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    pub size: u64,
}

/// A datastream's profile together with its content.
#[derive(Debug, Clone)]
pub struct Datastream {
    pub profile: DatastreamProfile,
    pub content: Bytes,
}

/// Request to create a new object.
#[derive(Debug, Clone, Default)]
pub struct NewObject {
    /// Explicit pid to use. If `None`, the repository mints one.
    pub pid: Option<Pid>,
    /// Namespace for a minted pid. The repository default is used if `None`.
    pub namespace: Option<String>,
    pub label: String,
    /// Audit trail message.
    pub log_message: String,
}

/// Content to store in a datastream, creating it if needed.
#[derive(Debug, Clone)]
pub struct DatastreamWrite {
    pub dsid: String,
    pub label: String,
    pub mimetype: String,
    pub control_group: ControlGroup,
    pub versionable: bool,
    /// Expected SHA-256 checksum (lowercase hex), verified by the repository.
    pub checksum: Option<String>,
    /// New content. `None` updates only the properties of an existing datastream.
    pub content: Option<Bytes>,
    /// Audit trail message.
    pub log_message: String,
}

/// Output of a dissemination (service method) request.
#[derive(Debug, Clone)]
pub struct Dissemination {
    pub mimetype: String,
    pub content: Bytes,
}

// =============================================================================
// RepoBackend
// =============================================================================

/// The interface to a Fedora-style object repository.
///
/// Every call is made with the credentials the backend was created with, so
/// the same object may be visible to one backend and refused to another.
#[async_trait]
pub trait RepoBackend: Send + Sync {
    /// Check if an object exists and is visible.
    ///
    /// Returns `Ok(false)` when the repository reports the object missing.
    /// Permission problems surface as `BackendError::PermissionDenied`.
    async fn object_exists(&self, pid: &Pid) -> Result<bool>;

    /// Read object-level properties.
    async fn get_object_profile(&self, pid: &Pid) -> Result<ObjectProfile>;

    /// Create a new, empty object and return its pid.
    async fn ingest_object(&self, object: &NewObject) -> Result<Pid>;

    /// Update an object's label.
    async fn modify_object(&self, pid: &Pid, label: &str, log_message: &str) -> Result<()>;

    /// Remove an object and all of its datastreams.
    async fn purge_object(&self, pid: &Pid, log_message: &str) -> Result<()>;

    /// Store content in a datastream, adding the datastream if it does not exist.
    async fn put_datastream(&self, pid: &Pid, datastream: &DatastreamWrite) -> Result<()>;

    /// Read a datastream's properties without its content.
    async fn get_datastream_profile(&self, pid: &Pid, dsid: &str) -> Result<DatastreamProfile>;

    /// Read a datastream's profile and content.
    ///
    /// Returns `BackendError::NotFound` if the object or datastream does not exist.
    async fn get_datastream(&self, pid: &Pid, dsid: &str) -> Result<Datastream>;

    /// Find all objects asserting the given content model.
    async fn find_by_content_model(&self, cmodel: &str) -> Result<Vec<Pid>>;

    /// Find all subjects of statements `(?s, predicate, object)`.
    async fn find_subjects(&self, predicate: &str, object: &str) -> Result<Vec<Pid>>;

    /// Invoke a service method on an object.
    async fn get_dissemination(
        &self,
        pid: &Pid,
        sdef: &str,
        method: &str,
        params: &[(String, String)],
    ) -> Result<Dissemination>;
}
