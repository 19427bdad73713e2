//! Handle to a repository object that may or may not be visible.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;

use crate::backend::ObjectProfile;
use crate::repo::{Repo, RepoError};
use crate::repository::Pid;
use crate::util::ExistenceCheck;

use super::{CollectionModel, FileModel};

/// A reference to an object by pid.
///
/// Nothing is fetched until asked for; the object profile is cached after
/// the first successful read.
pub struct ObjectHandle {
    repo: Arc<Repo>,
    pid: Pid,
    profile: OnceCell<ObjectProfile>,
}

impl ObjectHandle {
    pub fn new(repo: Arc<Repo>, pid: Pid) -> Self {
        Self {
            repo,
            pid,
            profile: OnceCell::new(),
        }
    }

    /// Handles for a list of pids, in the same order.
    pub fn for_pids(repo: &Arc<Repo>, pids: Vec<Pid>) -> Vec<ObjectHandle> {
        pids.into_iter()
            .map(|pid| ObjectHandle::new(Arc::clone(repo), pid))
            .collect()
    }

    pub fn pid(&self) -> &Pid {
        &self.pid
    }

    pub fn repo(&self) -> &Arc<Repo> {
        &self.repo
    }

    /// Get or fetch the object profile.
    pub async fn profile(&self) -> Result<&ObjectProfile, RepoError> {
        self.profile
            .get_or_try_init(|| self.repo.profile(&self.pid))
            .await
    }

    /// The object label, falling back to the pid when the label is empty.
    pub async fn label(&self) -> Result<String, RepoError> {
        let profile = self.profile().await?;
        Ok(if profile.label.is_empty() {
            self.pid.to_string()
        } else {
            profile.label.clone()
        })
    }
}

impl ObjectHandle {
    /// Load the object as a collection.
    pub async fn load_collection(&self) -> Result<CollectionModel, RepoError> {
        CollectionModel::load(&self.repo, &self.pid).await
    }

    /// Load the object as a reposited file, resolving its kind.
    pub async fn load_file(&self) -> Result<FileModel, RepoError> {
        FileModel::load(&self.repo, &self.pid).await
    }
}

impl fmt::Debug for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectHandle")
            .field("pid", &self.pid)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ExistenceCheck for ObjectHandle {
    type Error = RepoError;

    async fn exists(&self) -> Result<bool, RepoError> {
        self.repo.exists(&self.pid).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{InjectedFault, MemoryBackend, NewObject, RepoBackend};
    use crate::util::collect_accessible;

    async fn setup() -> (Arc<MemoryBackend>, Arc<Repo>, Vec<Pid>) {
        let backend = Arc::new(MemoryBackend::with_namespace("demo"));
        let mut pids = Vec::new();
        for label in ["one", "", "three"] {
            let pid = backend
                .ingest_object(&NewObject {
                    label: label.to_string(),
                    log_message: "test".to_string(),
                    ..Default::default()
                })
                .await
                .unwrap();
            pids.push(pid);
        }
        let repo = Arc::new(Repo::from_dyn(backend.clone()));
        (backend, repo, pids)
    }

    #[tokio::test]
    async fn test_label_falls_back_to_pid() {
        let (_, repo, pids) = setup().await;
        let handles = ObjectHandle::for_pids(&repo, pids);
        assert_eq!(handles[0].label().await.unwrap(), "one");
        assert_eq!(handles[1].label().await.unwrap(), "demo:2");
    }

    #[tokio::test]
    async fn test_accessible_handles() {
        let (backend, repo, mut pids) = setup().await;
        backend.inject_fault(&pids[0], InjectedFault::Denied);
        pids.push(Pid::parse("demo:missing").unwrap());

        let visible = collect_accessible(ObjectHandle::for_pids(&repo, pids))
            .await
            .unwrap();
        let visible: Vec<&str> = visible.iter().map(|h| h.pid().as_str()).collect();
        assert_eq!(visible, vec!["demo:2", "demo:3"]);
    }

    #[tokio::test]
    async fn test_load_typed_model() {
        let repo = Arc::new(Repo::new(MemoryBackend::with_namespace("demo")));
        let mut file = FileModel::for_mimetype("image/png");
        file.set_label("photo.png");
        let pid = file.save(&repo, "save").await.unwrap();

        let loaded = repo.object(pid).load_file().await.unwrap();
        assert_eq!(loaded.kind(), crate::kinds::ObjectKind::Image);
        assert_eq!(loaded.label(), "photo.png");
    }
}
