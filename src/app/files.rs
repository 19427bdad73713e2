//! File operations: ingest, edit metadata, view, download and preview.

use bytes::Bytes;
use serde::Serialize;
use tracing::info;

use crate::app::collections::require_visible;
use crate::app::{AppError, CollectionChoice, FileMetadataForm, IngestForm, Result};
use crate::backend::Dissemination;
use crate::kinds::ObjectKind;
use crate::repo::Repo;
use crate::repo_model::FileModel;
use crate::repository::{DublinCore, Pid};

const INGEST_LOG: &str = "ingesting user content";
const EDIT_LOG: &str = "updated metadata";

/// A reposited file as presented to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    pub pid: Pid,
    pub kind: ObjectKind,
    pub label: String,
    pub dc: DublinCore,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection: Option<Pid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oai_id: Option<String>,
    pub has_preview: bool,
}

impl FileInfo {
    /// Summarize a saved file. Returns `None` for one without a pid.
    pub fn from_model(file: &FileModel) -> Option<Self> {
        let master = file.master_profile();
        Some(Self {
            pid: file.pid()?.clone(),
            kind: file.kind(),
            label: file.label().to_string(),
            dc: file.dc().clone(),
            collection: file.collection(),
            file_name: file.master_label().map(str::to_string),
            mimetype: file.master_mimetype().map(str::to_string),
            size: master.map(|m| m.size),
            checksum: master.and_then(|m| m.checksum.clone()),
            oai_id: file.oai_id().map(str::to_string),
            has_preview: file.has_preview(),
        })
    }
}

/// Master content ready to be handed to a downloader.
#[derive(Debug, Clone)]
pub struct Download {
    pub filename: String,
    pub mimetype: String,
    pub content: Bytes,
}

impl Download {
    /// Value for a `Content-Disposition` header.
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename={}", self.filename)
    }
}

// =============================================================================
// Ingest / Edit
// =============================================================================

/// Reposit an uploaded file as a new object in the chosen collection.
///
/// The kind is picked from the upload's MIME type. The file name becomes the
/// object label, the DC title and the master datastream label.
pub async fn ingest_file(
    repo: &Repo,
    form: &IngestForm,
    choices: &[CollectionChoice],
) -> Result<FileModel> {
    let (collection, upload) = form.validate(choices)?;

    let mut file = FileModel::for_mimetype(&upload.mimetype);
    file.set_collection(&collection);
    file.set_label(upload.name.clone());
    let dc = file.dc_mut();
    dc.title = Some(upload.name.clone());
    dc.format = Some(upload.mimetype.clone());
    file.set_master_content(upload.content.clone(), upload.mimetype.clone(), upload.name.clone());

    let pid = file
        .save(repo, INGEST_LOG)
        .await
        .map_err(|e| AppError::from_save(e, "ingest content into the repository"))?;
    info!(
        pid = %pid,
        kind = %file.kind(),
        collection = %collection,
        size = upload.content.len(),
        "ingested file"
    );
    Ok(file)
}

/// Update a file's metadata from a validated form.
///
/// With OAI enabled the file gets the item id `<oai_prefix>info:fedora/<pid>`;
/// with it disabled any existing item id is removed.
pub async fn edit_file_metadata(
    repo: &Repo,
    pid: &Pid,
    form: &FileMetadataForm,
    oai_prefix: &str,
) -> Result<FileModel> {
    form.validate()?;
    let mut file = view_file(repo, pid).await?;
    form.apply(&mut file, oai_prefix);

    file.save(repo, EDIT_LOG)
        .await
        .map_err(|e| AppError::from_save(e, "modify this object in the repository"))?;
    info!(pid = %pid, oai = file.oai_id().is_some(), "updated file metadata");
    Ok(file)
}

// =============================================================================
// View / Download / Preview
// =============================================================================

/// Load a file, as long as the current credentials can see it.
pub async fn view_file(repo: &Repo, pid: &Pid) -> Result<FileModel> {
    require_visible(repo, pid).await?;
    Ok(FileModel::load(repo, pid).await?)
}

/// The master content, named after the master datastream's label.
pub async fn download_file(repo: &Repo, pid: &Pid) -> Result<Download> {
    let file = view_file(repo, pid).await?;
    let master = file.master_content(repo).await?;
    let filename = if master.profile.label.is_empty() {
        pid.to_string()
    } else {
        master.profile.label.clone()
    };
    Ok(Download {
        filename,
        mimetype: master.profile.mimetype,
        content: master.content,
    })
}

/// A small rendition of an image. Files without previews are not found.
pub async fn preview_file(repo: &Repo, pid: &Pid) -> Result<Dissemination> {
    let file = view_file(repo, pid).await?;
    if !file.has_preview() {
        return Err(AppError::NotFound(pid.clone()));
    }
    Ok(file.preview(repo).await?)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::app::{collection_choices, create_collection, CollectionForm, UploadedFile};
    use crate::backend::{InjectedFault, MemoryBackend};
    use crate::repo_model::PREVIEW_METHOD;
    use crate::repository::IMAGE_SERVICE;
    use crate::util::sha256_hex;

    async fn setup() -> (Arc<MemoryBackend>, Arc<Repo>, Vec<CollectionChoice>) {
        let backend = Arc::new(MemoryBackend::with_namespace("demo"));
        backend.add_service(
            IMAGE_SERVICE,
            PREVIEW_METHOD,
            Dissemination {
                mimetype: "image/jpeg".to_string(),
                content: Bytes::from_static(b"thumbnail"),
            },
        );
        let repo = Arc::new(Repo::from_dyn(backend.clone()));
        let form = CollectionForm {
            title: Some("Uploads".to_string()),
            ..Default::default()
        };
        create_collection(&repo, &form).await.unwrap();
        let choices = collection_choices(&repo).await.unwrap();
        (backend, repo, choices)
    }

    fn ingest_form(choices: &[CollectionChoice], name: &str, mimetype: &str) -> IngestForm {
        IngestForm {
            collection: Some(choices[0].value.clone()),
            file: Some(UploadedFile {
                name: name.to_string(),
                mimetype: mimetype.to_string(),
                content: Bytes::from_static(b"file content"),
            }),
        }
    }

    #[tokio::test]
    async fn test_ingest_sets_metadata() {
        let (backend, repo, choices) = setup().await;
        let form = ingest_form(&choices, "report.pdf", "application/pdf");
        let file = ingest_file(&repo, &form, &choices).await.unwrap();

        let info = FileInfo::from_model(&file).unwrap();
        assert_eq!(info.kind, ObjectKind::File);
        assert_eq!(info.label, "report.pdf");
        assert_eq!(info.dc.title.as_deref(), Some("report.pdf"));
        assert_eq!(info.dc.format.as_deref(), Some("application/pdf"));
        assert_eq!(info.file_name.as_deref(), Some("report.pdf"));
        assert_eq!(info.checksum, Some(sha256_hex(b"file content")));
        assert_eq!(
            info.collection.as_ref().map(|p| p.uri()),
            Some(choices[0].value.clone())
        );
        assert_eq!(
            backend.audit_trail(&info.pid).last().map(String::as_str),
            Some(INGEST_LOG)
        );

        let collection = info.collection.clone().unwrap();
        let members = crate::app::collection_members(&repo, &collection).await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].pid, info.pid);
    }

    #[tokio::test]
    async fn test_ingest_image_and_preview() {
        let (_, repo, choices) = setup().await;
        let image = ingest_file(&repo, &ingest_form(&choices, "photo.jpg", "image/jpeg"), &choices)
            .await
            .unwrap();
        let pid = image.pid().cloned().unwrap();
        assert_eq!(image.kind(), ObjectKind::Image);
        assert_eq!(image.master_dsid(), "source-image");

        let preview = preview_file(&repo, &pid).await.unwrap();
        assert_eq!(preview.content, Bytes::from_static(b"thumbnail"));

        let text = ingest_file(&repo, &ingest_form(&choices, "a.txt", "text/plain"), &choices)
            .await
            .unwrap();
        let err = preview_file(&repo, text.pid().unwrap()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_edit_metadata_and_oai() {
        let (backend, repo, choices) = setup().await;
        let file = ingest_file(&repo, &ingest_form(&choices, "a.txt", "text/plain"), &choices)
            .await
            .unwrap();
        let pid = file.pid().cloned().unwrap();

        let mut form = FileMetadataForm::from_file(&file);
        form.dc.title = Some("Annual notes".to_string());
        form.dc.dc_type = Some("Text".to_string());
        form.file_name = Some("notes-2011.txt".to_string());
        form.enable_oai = true;
        let edited = edit_file_metadata(&repo, &pid, &form, "oai:").await.unwrap();
        assert_eq!(edited.label(), "Annual notes");
        let expected_oai = format!("oai:info:fedora/{}", pid);
        assert_eq!(edited.oai_id(), Some(expected_oai.as_str()));
        assert_eq!(
            backend.audit_trail(&pid).last().map(String::as_str),
            Some(EDIT_LOG)
        );

        let download = download_file(&repo, &pid).await.unwrap();
        assert_eq!(download.filename, "notes-2011.txt");
        assert_eq!(
            download.content_disposition(),
            "attachment; filename=notes-2011.txt"
        );
        assert_eq!(download.mimetype, "text/plain");
        assert_eq!(download.content, Bytes::from_static(b"file content"));

        form.enable_oai = false;
        let edited = edit_file_metadata(&repo, &pid, &form, "oai:").await.unwrap();
        assert!(edited.oai_id().is_none());
        assert!(view_file(&repo, &pid).await.unwrap().oai_id().is_none());
    }

    #[tokio::test]
    async fn test_edit_unreachable_file() {
        let (backend, repo, choices) = setup().await;
        let file = ingest_file(&repo, &ingest_form(&choices, "a.txt", "text/plain"), &choices)
            .await
            .unwrap();
        let pid = file.pid().cloned().unwrap();
        let form = FileMetadataForm::from_file(&file);

        backend.inject_fault(&pid, InjectedFault::Unreachable);
        // A fault on the existence check hides the object.
        let err = edit_file_metadata(&repo, &pid, &form, "oai:")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_hidden_file_not_downloadable() {
        let (backend, repo, choices) = setup().await;
        let file = ingest_file(&repo, &ingest_form(&choices, "a.txt", "text/plain"), &choices)
            .await
            .unwrap();
        let pid = file.pid().cloned().unwrap();

        backend.inject_fault(&pid, InjectedFault::Denied);
        assert!(matches!(
            download_file(&repo, &pid).await,
            Err(AppError::NotFound(_))
        ));
    }
}
