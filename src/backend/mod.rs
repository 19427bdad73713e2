//! Storage backends for repository objects.
//!
//! [`RepoBackend`] is the interface the rest of the crate talks to. [`HttpBackend`]
//! speaks the Fedora REST API; [`MemoryBackend`] keeps everything in process.

mod http_backend;
mod memory_backend;
mod repo_backend;

pub use http_backend::{HttpBackend, HttpBackendConfig};
pub use memory_backend::{InjectedFault, MemoryBackend, DEFAULT_NAMESPACE};
pub use repo_backend::{
    BackendError, ControlGroup, Datastream, DatastreamProfile, DatastreamWrite, Dissemination,
    NewObject, ObjectProfile, RepoBackend, Result,
};
