//! Collection operations: create, edit, view, list and browse members.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::app::{AppError, CollectionForm, Result};
use crate::repo::Repo;
use crate::repo_model::{CollectionModel, ObjectHandle};
use crate::repository::{DublinCore, Pid};
use crate::util::{classify, collect_accessible, Visibility};

const CREATE_LOG: &str = "ingested via genrepo";
const UPDATE_LOG: &str = "updated via genrepo";

/// An object listed by pid and label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectSummary {
    pub pid: Pid,
    pub label: String,
}

impl ObjectSummary {
    async fn from_handle(handle: &ObjectHandle) -> Result<Self> {
        Ok(Self {
            pid: handle.pid().clone(),
            label: handle.label().await?,
        })
    }
}

/// A collection as presented to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionInfo {
    pub pid: Pid,
    pub label: String,
    pub dc: DublinCore,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oai_set: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oai_set_name: Option<String>,
}

impl CollectionInfo {
    /// Summarize a saved collection. Returns `None` for one without a pid.
    pub fn from_model(collection: &CollectionModel) -> Option<Self> {
        Some(Self {
            pid: collection.pid()?.clone(),
            label: collection.label().to_string(),
            dc: collection.dc().clone(),
            oai_set: collection.oai_set().map(str::to_string),
            oai_set_name: collection.oai_set_name().map(str::to_string),
        })
    }
}

/// Fail with [`AppError::NotFound`] unless the object is visible.
pub(crate) async fn require_visible(repo: &Repo, pid: &Pid) -> Result<()> {
    match classify(repo.exists(pid).await)? {
        Visibility::Visible => Ok(()),
        Visibility::Hidden => Err(AppError::NotFound(pid.clone())),
    }
}

// =============================================================================
// Create / Edit
// =============================================================================

/// Create a new collection from a validated form.
pub async fn create_collection(repo: &Repo, form: &CollectionForm) -> Result<CollectionModel> {
    form.validate()?;
    let mut collection = CollectionModel::new();
    save_collection(repo, &mut collection, form, "create a collection in the repository").await?;
    Ok(collection)
}

/// Update an existing collection from a validated form.
pub async fn edit_collection(
    repo: &Repo,
    pid: &Pid,
    form: &CollectionForm,
) -> Result<CollectionModel> {
    form.validate()?;
    let mut collection = view_collection(repo, pid).await?;
    save_collection(repo, &mut collection, form, "modify this collection in the repository")
        .await?;
    Ok(collection)
}

async fn save_collection(
    repo: &Repo,
    collection: &mut CollectionModel,
    form: &CollectionForm,
    action: &str,
) -> Result<Pid> {
    form.apply(collection);
    let (verb, log_message) = if collection.exists() {
        ("updated", UPDATE_LOG)
    } else {
        ("created new", CREATE_LOG)
    };

    let pid = collection
        .save(repo, log_message)
        .await
        .map_err(|e| AppError::from_save(e, action))?;
    info!(pid = %pid, label = collection.label(), "{} collection", verb);
    Ok(pid)
}

// =============================================================================
// View / List
// =============================================================================

/// Load a collection, as long as the current credentials can see it.
pub async fn view_collection(repo: &Repo, pid: &Pid) -> Result<CollectionModel> {
    require_visible(repo, pid).await?;
    Ok(CollectionModel::load(repo, pid).await?)
}

/// Every visible collection, sorted by label without regard to case.
pub async fn list_collections(repo: &Arc<Repo>) -> Result<Vec<ObjectSummary>> {
    let pids = repo.all_collections().await?;
    let visible = collect_accessible(ObjectHandle::for_pids(repo, pids)).await?;

    let mut collections = Vec::with_capacity(visible.len());
    for handle in &visible {
        collections.push(ObjectSummary::from_handle(handle).await?);
    }
    collections.sort_by_cached_key(|c| c.label.to_uppercase());
    Ok(collections)
}

/// Visible members of a visible collection, in repository order.
pub async fn collection_members(repo: &Arc<Repo>, pid: &Pid) -> Result<Vec<ObjectSummary>> {
    require_visible(repo, pid).await?;
    let pids = repo.members(pid).await?;
    let visible = collect_accessible(ObjectHandle::for_pids(repo, pids)).await?;

    let mut members = Vec::with_capacity(visible.len());
    for handle in &visible {
        members.push(ObjectSummary::from_handle(handle).await?);
    }
    Ok(members)
}
