//! Repository interface over a Fedora backend.
//!
//! The [`Repo`] struct wraps a [`RepoBackend`] and adds:
//! - Loading and saving whole objects (profile, `DC`, `RELS-EXT`, content datastreams)
//! - Kind resolution from an object's content models
//! - Collection and membership queries

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::backend::{
    BackendError, ControlGroup, Datastream, DatastreamProfile, DatastreamWrite, Dissemination,
    NewObject, ObjectProfile, RepoBackend,
};
use crate::kinds::{ContentModelSet, KindTable};
use crate::repo_model::{DigitalObject, ObjectHandle};
use crate::repository::{
    DublinCore, Pid, PidError, RelsExt, XmlError, COLLECTION_CMODEL, DC_DSID,
    IS_MEMBER_OF_COLLECTION, RELS_EXT_DSID,
};
use crate::util::RequestFault;

// =============================================================================
// Error Types
// =============================================================================

/// Error type for repository operations.
#[derive(Debug, Error)]
pub enum RepoError {
    /// The object or datastream was not found.
    #[error("not found")]
    NotFound,

    /// The repository refused the request for the current credentials.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// A request to the repository failed.
    #[error("request failed: {message}")]
    RequestFailed {
        status: Option<u16>,
        message: String,
    },

    /// Stored metadata could not be parsed.
    #[error("invalid {dsid} for {pid}: {source}")]
    InvalidMetadata {
        pid: Pid,
        dsid: &'static str,
        source: XmlError,
    },

    #[error(transparent)]
    InvalidPid(#[from] PidError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A custom error message.
    #[error("{0}")]
    Other(String),
}

impl RepoError {
    /// True for failed requests to the repository, including permission denials.
    pub fn is_request_failure(&self) -> bool {
        matches!(
            self,
            RepoError::PermissionDenied(_) | RepoError::RequestFailed { .. }
        )
    }

    /// HTTP status code reported by the repository, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            RepoError::NotFound => Some(404),
            RepoError::PermissionDenied(_) => Some(401),
            RepoError::RequestFailed { status, .. } => *status,
            _ => None,
        }
    }
}

impl RequestFault for RepoError {
    fn is_request_failure(&self) -> bool {
        RepoError::is_request_failure(self)
    }
}

impl From<BackendError> for RepoError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::NotFound => RepoError::NotFound,
            BackendError::PermissionDenied(msg) => RepoError::PermissionDenied(msg),
            BackendError::RequestFailed { status, message } => {
                RepoError::RequestFailed { status, message }
            }
            BackendError::Io(io_err) => RepoError::Io(io_err),
            BackendError::Other(msg) => RepoError::Other(msg),
        }
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepoError>;

// =============================================================================
// Constants
// =============================================================================

const DC_LABEL: &str = "Dublin Core Record for this object";
const RELS_EXT_LABEL: &str = "Relationships to other objects";

// =============================================================================
// Repo
// =============================================================================

/// A Fedora repository as seen through one set of credentials.
pub struct Repo {
    backend: Arc<dyn RepoBackend>,
    pidspace: Option<String>,
}

impl Repo {
    /// Create a new Repo with the given backend.
    pub fn new<B: RepoBackend + 'static>(backend: B) -> Self {
        Self::from_dyn(Arc::new(backend))
    }

    /// Create a new Repo from an already-Arc'd backend.
    pub fn from_dyn(backend: Arc<dyn RepoBackend>) -> Self {
        Self {
            backend,
            pidspace: None,
        }
    }

    /// Set the namespace used when minting pids for new objects.
    pub fn with_pidspace(mut self, pidspace: Option<String>) -> Self {
        self.pidspace = pidspace;
        self
    }

    pub fn backend(&self) -> &Arc<dyn RepoBackend> {
        &self.backend
    }

    pub fn pidspace(&self) -> Option<&str> {
        self.pidspace.as_deref()
    }

    // =========================================================================
    // Object Queries
    // =========================================================================

    /// A handle to the object with this pid. Nothing is fetched yet.
    pub fn object(self: &Arc<Self>, pid: Pid) -> ObjectHandle {
        ObjectHandle::new(Arc::clone(self), pid)
    }

    /// Check whether an object exists and is visible.
    pub async fn exists(&self, pid: &Pid) -> Result<bool> {
        Ok(self.backend.object_exists(pid).await?)
    }

    pub async fn profile(&self, pid: &Pid) -> Result<ObjectProfile> {
        Ok(self.backend.get_object_profile(pid).await?)
    }

    /// Content models the object currently asserts.
    pub async fn content_models(&self, pid: &Pid) -> Result<ContentModelSet> {
        Ok(self.profile(pid).await?.content_models)
    }

    /// Pick the kind for an existing object from its content models.
    pub async fn resolve_kind<K: Copy>(&self, pid: &Pid, table: &KindTable<'_, K>) -> Result<K> {
        let models = self.content_models(pid).await?;
        Ok(table.resolve_by_content_models(&models))
    }

    /// Pids of every object asserting the collection content model.
    pub async fn all_collections(&self) -> Result<Vec<Pid>> {
        Ok(self.backend.find_by_content_model(COLLECTION_CMODEL).await?)
    }

    /// Pids of every object that is a member of the collection.
    pub async fn members(&self, collection: &Pid) -> Result<Vec<Pid>> {
        Ok(self
            .backend
            .find_subjects(IS_MEMBER_OF_COLLECTION, &collection.uri())
            .await?)
    }

    // =========================================================================
    // Datastreams
    // =========================================================================

    pub async fn read_datastream(&self, pid: &Pid, dsid: &str) -> Result<Datastream> {
        Ok(self.backend.get_datastream(pid, dsid).await?)
    }

    pub async fn datastream_profile(&self, pid: &Pid, dsid: &str) -> Result<DatastreamProfile> {
        Ok(self.backend.get_datastream_profile(pid, dsid).await?)
    }

    /// Invoke a service method on an object.
    pub async fn dissemination(
        &self,
        pid: &Pid,
        sdef: &str,
        method: &str,
        params: &[(String, String)],
    ) -> Result<Dissemination> {
        debug!(pid = %pid, sdef, method, "requesting dissemination");
        Ok(self
            .backend
            .get_dissemination(pid, sdef, method, params)
            .await?)
    }

    // =========================================================================
    // Load / Save
    // =========================================================================

    /// Read an existing object's profile and metadata.
    ///
    /// A missing `DC` or `RELS-EXT` datastream loads as empty metadata.
    pub async fn load_object(&self, pid: &Pid) -> Result<DigitalObject> {
        let profile = self.profile(pid).await?;

        let dc = match self.optional_xml(pid, DC_DSID).await? {
            Some(xml) => DublinCore::from_xml(&xml).map_err(|source| {
                RepoError::InvalidMetadata {
                    pid: pid.clone(),
                    dsid: DC_DSID,
                    source,
                }
            })?,
            None => DublinCore::default(),
        };
        let rels_ext = match self.optional_xml(pid, RELS_EXT_DSID).await? {
            Some(xml) => RelsExt::from_xml(&xml).map_err(|source| RepoError::InvalidMetadata {
                pid: pid.clone(),
                dsid: RELS_EXT_DSID,
                source,
            })?,
            None => RelsExt::new(pid.uri()),
        };

        Ok(DigitalObject::from_parts(profile, dc, rels_ext))
    }

    async fn optional_xml(&self, pid: &Pid, dsid: &str) -> Result<Option<String>> {
        match self.backend.get_datastream(pid, dsid).await {
            Ok(ds) => Ok(Some(String::from_utf8_lossy(&ds.content).into_owned())),
            Err(BackendError::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Save an object, ingesting it if it does not exist yet.
    ///
    /// Every request carries `log_message` so the repository records it in the
    /// object's audit trail. Returns the object's pid.
    ///
    /// Queued datastream writes stay queued until the whole save succeeds. If
    /// a write fails after a new object was ingested, the object is purged
    /// again; when the purge also fails the object is left in place and the
    /// next save updates it.
    pub async fn save_object(&self, object: &mut DigitalObject, log_message: &str) -> Result<Pid> {
        if object.exists() {
            let pid = object
                .pid()
                .cloned()
                .ok_or_else(|| RepoError::Other("existing object has no pid".to_string()))?;
            self.backend
                .modify_object(&pid, object.label(), log_message)
                .await?;
            debug!(pid = %pid, "updated object properties");
            self.write_contents(&pid, object, log_message).await?;
            object.mark_saved();
            return Ok(pid);
        }

        let requested = object.pid().cloned();
        let new_object = NewObject {
            pid: requested.clone(),
            namespace: self.pidspace.clone(),
            label: object.label().to_string(),
            log_message: log_message.to_string(),
        };
        let pid = self.backend.ingest_object(&new_object).await?;
        info!(pid = %pid, label = object.label(), "ingested object");
        object.assign_pid(pid.clone());

        if let Err(err) = self.write_contents(&pid, object, log_message).await {
            match self.backend.purge_object(&pid, log_message).await {
                Ok(()) => {
                    warn!(pid = %pid, error = %err, "save failed, purged new object");
                    object.revert_pid(requested);
                }
                Err(purge_err) => {
                    warn!(
                        pid = %pid,
                        error = %err,
                        purge_error = %purge_err,
                        "save failed, new object left incomplete"
                    );
                    object.mark_ingested();
                }
            }
            return Err(err);
        }

        object.mark_saved();
        Ok(pid)
    }

    /// Write `DC`, `RELS-EXT` and every queued datastream.
    async fn write_contents(
        &self,
        pid: &Pid,
        object: &mut DigitalObject,
        log_message: &str,
    ) -> Result<()> {
        object.prepare_for_save();

        let dc_write = DatastreamWrite {
            dsid: DC_DSID.to_string(),
            label: DC_LABEL.to_string(),
            mimetype: "text/xml".to_string(),
            control_group: ControlGroup::InlineXml,
            versionable: true,
            checksum: None,
            content: Some(Bytes::from(object.dc().to_xml())),
            log_message: log_message.to_string(),
        };
        self.backend.put_datastream(pid, &dc_write).await?;

        let rels_write = DatastreamWrite {
            dsid: RELS_EXT_DSID.to_string(),
            label: RELS_EXT_LABEL.to_string(),
            mimetype: "application/rdf+xml".to_string(),
            control_group: ControlGroup::InlineXml,
            versionable: true,
            checksum: None,
            content: Some(Bytes::from(object.rels_ext().to_xml())),
            log_message: log_message.to_string(),
        };
        self.backend.put_datastream(pid, &rels_write).await?;

        for pending in object.pending_datastreams() {
            let write = DatastreamWrite {
                log_message: log_message.to_string(),
                ..pending.clone()
            };
            debug!(pid = %pid, dsid = %write.dsid, "saving datastream");
            self.backend.put_datastream(pid, &write).await?;
        }
        Ok(())
    }
}

impl fmt::Debug for Repo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repo")
            .field("pidspace", &self.pidspace)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::backend::{InjectedFault, MemoryBackend};
    use crate::kinds::{ObjectKind, DIGITAL_OBJECT_KINDS};
    use crate::repo_model::FileModel;
    use crate::repository::{IMAGE_CMODEL, PUBLIC_ACCESS_CMODEL};

    type BackendResult<T> = std::result::Result<T, BackendError>;

    /// A memory backend whose writes can be made to fail once.
    struct FlakyBackend {
        inner: MemoryBackend,
        fail_datastream: Mutex<Option<String>>,
        fail_modify: AtomicBool,
        fail_purge: AtomicBool,
    }

    impl FlakyBackend {
        fn fail_next_write(&self, dsid: &str) {
            *self.fail_datastream.lock().unwrap() = Some(dsid.to_string());
        }

        fn unavailable() -> BackendError {
            BackendError::RequestFailed {
                status: Some(503),
                message: "service unavailable".to_string(),
            }
        }
    }

    #[async_trait]
    impl RepoBackend for FlakyBackend {
        async fn object_exists(&self, pid: &Pid) -> BackendResult<bool> {
            self.inner.object_exists(pid).await
        }

        async fn get_object_profile(&self, pid: &Pid) -> BackendResult<ObjectProfile> {
            self.inner.get_object_profile(pid).await
        }

        async fn ingest_object(&self, object: &NewObject) -> BackendResult<Pid> {
            self.inner.ingest_object(object).await
        }

        async fn modify_object(&self, pid: &Pid, label: &str, log: &str) -> BackendResult<()> {
            if self.fail_modify.swap(false, Ordering::SeqCst) {
                return Err(Self::unavailable());
            }
            self.inner.modify_object(pid, label, log).await
        }

        async fn purge_object(&self, pid: &Pid, log: &str) -> BackendResult<()> {
            if self.fail_purge.load(Ordering::SeqCst) {
                return Err(Self::unavailable());
            }
            self.inner.purge_object(pid, log).await
        }

        async fn put_datastream(&self, pid: &Pid, ds: &DatastreamWrite) -> BackendResult<()> {
            let failing = {
                let mut fail = self.fail_datastream.lock().unwrap();
                fail.as_deref() == Some(ds.dsid.as_str()) && fail.take().is_some()
            };
            if failing {
                return Err(Self::unavailable());
            }
            self.inner.put_datastream(pid, ds).await
        }

        async fn get_datastream_profile(
            &self,
            pid: &Pid,
            dsid: &str,
        ) -> BackendResult<DatastreamProfile> {
            self.inner.get_datastream_profile(pid, dsid).await
        }

        async fn get_datastream(&self, pid: &Pid, dsid: &str) -> BackendResult<Datastream> {
            self.inner.get_datastream(pid, dsid).await
        }

        async fn find_by_content_model(&self, cmodel: &str) -> BackendResult<Vec<Pid>> {
            self.inner.find_by_content_model(cmodel).await
        }

        async fn find_subjects(&self, predicate: &str, object: &str) -> BackendResult<Vec<Pid>> {
            self.inner.find_subjects(predicate, object).await
        }

        async fn get_dissemination(
            &self,
            pid: &Pid,
            sdef: &str,
            method: &str,
            params: &[(String, String)],
        ) -> BackendResult<Dissemination> {
            self.inner.get_dissemination(pid, sdef, method, params).await
        }
    }

    fn flaky_repo() -> (Arc<FlakyBackend>, Repo) {
        let backend = Arc::new(FlakyBackend {
            inner: MemoryBackend::with_namespace("demo"),
            fail_datastream: Mutex::new(None),
            fail_modify: AtomicBool::new(false),
            fail_purge: AtomicBool::new(false),
        });
        let repo = Repo::from_dyn(backend.clone());
        (backend, repo)
    }

    fn text_file() -> FileModel {
        let mut file = FileModel::for_mimetype("text/plain");
        file.set_label("notes.txt");
        file.set_master_content(Bytes::from_static(b"some notes"), "text/plain", "notes.txt");
        file
    }

    fn repo() -> (Arc<MemoryBackend>, Repo) {
        let backend = Arc::new(MemoryBackend::with_namespace("test"));
        let repo = Repo::from_dyn(backend.clone()).with_pidspace(Some("demo".to_string()));
        (backend, repo)
    }

    fn new_object(title: &str, models: &[&str]) -> DigitalObject {
        let mut obj = DigitalObject::new(models);
        obj.set_label(title);
        obj.dc_mut().title = Some(title.to_string());
        obj
    }

    #[tokio::test]
    async fn test_save_new_object_mints_pid_in_pidspace() {
        let (backend, repo) = repo();
        let mut obj = new_object("First", &[PUBLIC_ACCESS_CMODEL]);
        assert!(!obj.exists());

        let pid = repo.save_object(&mut obj, "ingested via test").await.unwrap();
        assert_eq!(pid.namespace(), "demo");
        assert!(obj.exists());
        assert_eq!(obj.pid(), Some(&pid));
        assert!(repo.exists(&pid).await.unwrap());
        assert!(backend
            .audit_trail(&pid)
            .iter()
            .all(|m| m == "ingested via test"));
    }

    #[tokio::test]
    async fn test_load_roundtrip() {
        let (_, repo) = repo();
        let mut obj = new_object("Roundtrip", &[IMAGE_CMODEL, PUBLIC_ACCESS_CMODEL]);
        obj.dc_mut().subjects = vec!["maps".to_string()];
        let pid = repo.save_object(&mut obj, "save").await.unwrap();

        let loaded = repo.load_object(&pid).await.unwrap();
        assert!(loaded.exists());
        assert_eq!(loaded.label(), "Roundtrip");
        assert_eq!(loaded.dc().title.as_deref(), Some("Roundtrip"));
        assert_eq!(loaded.dc().subjects, vec!["maps".to_string()]);
        assert!(loaded.content_models().contains(IMAGE_CMODEL));
        assert_eq!(loaded.rels_ext().subject, pid.uri());
    }

    #[tokio::test]
    async fn test_update_existing_object() {
        let (backend, repo) = repo();
        let mut obj = new_object("Before", &[PUBLIC_ACCESS_CMODEL]);
        let pid = repo.save_object(&mut obj, "create").await.unwrap();

        let mut loaded = repo.load_object(&pid).await.unwrap();
        loaded.set_label("After");
        let saved = repo.save_object(&mut loaded, "update").await.unwrap();
        assert_eq!(saved, pid);
        assert_eq!(repo.profile(&pid).await.unwrap().label, "After");
        assert_eq!(backend.audit_trail(&pid).last().map(String::as_str), Some("update"));
    }

    #[tokio::test]
    async fn test_resolve_kind() {
        let (_, repo) = repo();
        let mut image = new_object("img", ObjectKind::Image.content_models());
        let image_pid = repo.save_object(&mut image, "save").await.unwrap();
        let mut file = new_object("file", ObjectKind::File.content_models());
        let file_pid = repo.save_object(&mut file, "save").await.unwrap();

        assert_eq!(
            repo.resolve_kind(&image_pid, &DIGITAL_OBJECT_KINDS).await.unwrap(),
            ObjectKind::Image
        );
        assert_eq!(
            repo.resolve_kind(&file_pid, &DIGITAL_OBJECT_KINDS).await.unwrap(),
            ObjectKind::File
        );
    }

    #[tokio::test]
    async fn test_collections_and_members() {
        let (_, repo) = repo();
        let mut coll = new_object("Coll", &[COLLECTION_CMODEL, PUBLIC_ACCESS_CMODEL]);
        let coll_pid = repo.save_object(&mut coll, "save").await.unwrap();

        let mut member = new_object("Member", &[PUBLIC_ACCESS_CMODEL]);
        member
            .rels_ext_mut()
            .add(IS_MEMBER_OF_COLLECTION, crate::repository::RelObject::Resource(coll_pid.uri()));
        let member_pid = repo.save_object(&mut member, "save").await.unwrap();

        assert_eq!(repo.all_collections().await.unwrap(), vec![coll_pid.clone()]);
        assert_eq!(repo.members(&coll_pid).await.unwrap(), vec![member_pid]);
    }

    #[tokio::test]
    async fn test_missing_object() {
        let (_, repo) = repo();
        let pid = Pid::parse("demo:nope").unwrap();
        assert!(!repo.exists(&pid).await.unwrap());
        assert!(matches!(repo.load_object(&pid).await, Err(RepoError::NotFound)));
    }

    #[tokio::test]
    async fn test_errors_map_from_backend() {
        let (backend, repo) = repo();
        let mut obj = new_object("Secret", &[PUBLIC_ACCESS_CMODEL]);
        let pid = repo.save_object(&mut obj, "save").await.unwrap();

        backend.inject_fault(&pid, InjectedFault::Denied);
        let err = repo.load_object(&pid).await.unwrap_err();
        assert!(matches!(err, RepoError::PermissionDenied(_)));
        assert!(err.is_request_failure());
        assert_eq!(err.status(), Some(401));

        backend.inject_fault(&pid, InjectedFault::Unreachable);
        let err = repo.exists(&pid).await.unwrap_err();
        assert!(err.is_request_failure());
        assert_eq!(err.status(), Some(503));
    }

    #[test]
    fn test_debug_shows_pidspace() {
        let (_, repo) = repo();
        let text = format!("{:?}", Arc::new(repo));
        assert!(text.starts_with("Repo"));
        assert!(text.contains("demo"));
    }

    #[tokio::test]
    async fn test_failed_ingest_is_rolled_back_and_retried() {
        let (backend, repo) = flaky_repo();
        let mut file = text_file();

        backend.fail_next_write("master");
        let err = file.save(&repo, "ingesting user content").await.unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert!(file.pid().is_none());
        assert!(!file.object().exists());
        assert_eq!(file.master_label(), Some("notes.txt"));
        let purged = Pid::parse("demo:1").unwrap();
        assert!(!repo.exists(&purged).await.unwrap());

        let pid = file.save(&repo, "ingesting user content").await.unwrap();
        assert!(file.object().exists());
        assert!(file.object().pending_datastreams().is_empty());
        let master = file.master_content(&repo).await.unwrap();
        assert_eq!(master.content, Bytes::from_static(b"some notes"));
        assert!(repo
            .content_models(&pid)
            .await
            .unwrap()
            .contains(PUBLIC_ACCESS_CMODEL));
    }

    #[tokio::test]
    async fn test_failed_ingest_without_purge_retries_as_update() {
        let (backend, repo) = flaky_repo();
        backend.fail_purge.store(true, Ordering::SeqCst);
        let mut file = text_file();

        backend.fail_next_write("master");
        assert!(file.save(&repo, "ingest").await.is_err());
        let pid = file.pid().cloned().unwrap();
        assert!(file.object().exists());
        assert!(repo.exists(&pid).await.unwrap());
        assert!(file.master_content(&repo).await.is_err());

        let saved = file.save(&repo, "ingest").await.unwrap();
        assert_eq!(saved, pid);
        let master = file.master_content(&repo).await.unwrap();
        assert_eq!(master.content, Bytes::from_static(b"some notes"));
        assert_eq!(
            backend.inner.audit_trail(&pid).last().map(String::as_str),
            Some("ingest")
        );
    }

    #[tokio::test]
    async fn test_failed_update_keeps_pending_writes() {
        let (backend, repo) = flaky_repo();
        let mut file = text_file();
        let pid = file.save(&repo, "ingest").await.unwrap();

        let mut loaded = FileModel::load(&repo, &pid).await.unwrap();
        loaded.set_label("renamed");
        assert!(loaded.set_master_label("renamed.txt"));

        backend.fail_modify.store(true, Ordering::SeqCst);
        let err = loaded.save(&repo, "update").await.unwrap_err();
        assert!(err.is_request_failure());
        assert!(loaded.object().exists());
        assert!(loaded.object().pending_datastream("master").is_some());
        assert_eq!(repo.profile(&pid).await.unwrap().label, "notes.txt");

        loaded.save(&repo, "update").await.unwrap();
        assert_eq!(repo.profile(&pid).await.unwrap().label, "renamed");
        let master = loaded.master_content(&repo).await.unwrap();
        assert_eq!(master.profile.label, "renamed.txt");
    }
}
