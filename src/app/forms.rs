//! Input forms for creating and editing repository objects.
//!
//! Each form carries the submitted values, validates them, and applies them
//! to the model being saved.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;

use crate::repo::{Repo, RepoError};
use crate::repo_model::{CollectionModel, FileModel, ObjectHandle};
use crate::repository::{is_dcmi_type, DublinCore, Pid, FEDORA_URI_PREFIX};
use crate::util::collect_accessible;

// =============================================================================
// Validation Errors
// =============================================================================

/// One validation problem, tied to a field or to the form as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// `None` for errors that concern several fields.
    pub field: Option<&'static str>,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.field {
            Some(field) => write!(f, "{}: {}", field, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// All validation problems found in a submitted form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
pub struct FormErrors(Vec<FieldError>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field: Some(field),
            message: message.into(),
        });
    }

    pub fn form(&mut self, message: impl Into<String>) {
        self.0.push(FieldError {
            field: None,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// Errors for one field.
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FieldError> {
        self.0.iter().filter(move |e| e.field == Some(field))
    }

    fn into_result(self) -> Result<(), FormErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

const REQUIRED: &str = "This field is required.";

/// The trimmed value, or `None` if it is missing or blank.
fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

// =============================================================================
// Collection Form
// =============================================================================

/// Metadata for creating or editing a collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionForm {
    pub title: Option<String>,
    pub description: Option<String>,
    /// OAI set identifier (`setSpec`).
    pub oai_set: Option<String>,
    /// One-line description of the OAI set.
    pub oai_set_name: Option<String>,
}

impl CollectionForm {
    /// Initial values taken from an existing collection.
    pub fn from_collection(collection: &CollectionModel) -> Self {
        Self {
            title: collection.dc().title.clone(),
            description: collection.dc().description.clone(),
            oai_set: collection.oai_set().map(str::to_string),
            oai_set_name: collection.oai_set_name().map(str::to_string),
        }
    }

    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();
        if non_blank(&self.title).is_none() {
            errors.field("title", REQUIRED);
        }
        match (non_blank(&self.oai_set), non_blank(&self.oai_set_name)) {
            (Some(_), None) => errors
                .form("OAI set name is required when an OAI set identifier is specified."),
            (None, Some(_)) => errors
                .form("OAI set identifier is required when OAI set name is specified."),
            _ => {}
        }
        errors.into_result()
    }

    /// Copy the form onto the collection. The title doubles as the object label.
    pub(crate) fn apply(&self, collection: &mut CollectionModel) {
        let title = non_blank(&self.title).unwrap_or_default().to_string();
        collection.object_mut().set_label(title.clone());

        let dc = collection.dc_mut();
        dc.title = Some(title);
        dc.description = non_blank(&self.description).map(str::to_string);

        collection.set_oai_set(non_blank(&self.oai_set).map(str::to_string));
        collection.set_oai_set_name(non_blank(&self.oai_set_name).map(str::to_string));
    }
}

// =============================================================================
// Ingest Form
// =============================================================================

/// A collection offered as an ingest target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionChoice {
    /// `info:fedora/<pid>`
    pub value: String,
    /// The collection label, or its pid when the label is empty.
    pub label: String,
}

/// Collections the current credentials can see, in repository order.
pub async fn collection_choices(repo: &Arc<Repo>) -> Result<Vec<CollectionChoice>, RepoError> {
    let pids = repo.all_collections().await?;
    let visible = collect_accessible(ObjectHandle::for_pids(repo, pids)).await?;

    let mut choices = Vec::with_capacity(visible.len());
    for handle in &visible {
        choices.push(CollectionChoice {
            value: handle.pid().uri(),
            label: handle.label().await?,
        });
    }
    Ok(choices)
}

/// A file submitted for ingest.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Original file name.
    pub name: String,
    pub mimetype: String,
    pub content: Bytes,
}

/// A new file and the collection it goes into.
#[derive(Debug, Clone, Default)]
pub struct IngestForm {
    /// Target collection as `info:fedora/<pid>`. A bare pid is also accepted.
    pub collection: Option<String>,
    pub file: Option<UploadedFile>,
}

impl IngestForm {
    /// Check the form against the collections offered to the user and
    /// return the chosen collection with the uploaded file.
    pub fn validate<'a>(
        &'a self,
        choices: &[CollectionChoice],
    ) -> Result<(Pid, &'a UploadedFile), FormErrors> {
        let mut errors = FormErrors::new();

        let collection = match non_blank(&self.collection) {
            None => {
                errors.field("collection", REQUIRED);
                None
            }
            Some(value) => {
                let uri = if value.starts_with(FEDORA_URI_PREFIX) {
                    value.to_string()
                } else {
                    format!("{}{}", FEDORA_URI_PREFIX, value)
                };
                let chosen = choices
                    .iter()
                    .find(|c| c.value == uri)
                    .and_then(|c| Pid::from_uri(&c.value).ok());
                if chosen.is_none() {
                    errors.field(
                        "collection",
                        format!(
                            "Select a valid choice. {} is not one of the available choices.",
                            value
                        ),
                    );
                }
                chosen
            }
        };

        let file = self.file.as_ref().filter(|f| !f.name.is_empty());
        if file.is_none() {
            errors.field("file", REQUIRED);
        }

        match (collection, file) {
            (Some(collection), Some(file)) => Ok((collection, file)),
            _ => Err(errors),
        }
    }
}

// =============================================================================
// File Metadata Form
// =============================================================================

/// Dublin Core metadata and publication settings for a reposited file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileMetadataForm {
    /// Descriptive metadata. `format` and `identifier` are read-only and are
    /// not copied back to the object.
    pub dc: DublinCore,
    /// Publish the file through the OAI provider.
    pub enable_oai: bool,
    /// File name offered to anyone downloading the file.
    pub file_name: Option<String>,
}

impl FileMetadataForm {
    /// Initial values taken from an existing file.
    pub fn from_file(file: &FileModel) -> Self {
        Self {
            dc: file.dc().clone(),
            enable_oai: file.oai_id().is_some(),
            file_name: file.master_label().map(str::to_string),
        }
    }

    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();
        if non_blank(&self.dc.title).is_none() {
            errors.field("title", REQUIRED);
        }
        if let Some(dc_type) = non_blank(&self.dc.dc_type) {
            if !is_dcmi_type(dc_type) {
                errors.field(
                    "type",
                    format!(
                        "Select a valid choice. {} is not one of the available choices.",
                        dc_type
                    ),
                );
            }
        }
        if non_blank(&self.file_name).is_none() {
            errors.field("file_name", REQUIRED);
        }
        errors.into_result()
    }

    /// Copy the form onto the file: DC fields, label, master label and OAI id.
    pub(crate) fn apply(&self, file: &mut FileModel, oai_prefix: &str) {
        let format = file.dc().format.clone();
        let identifier = file.dc().identifier.clone();
        let mut dc = self.dc.clone();
        dc.format = format;
        dc.identifier = identifier;
        dc.dc_type = non_blank(&dc.dc_type).map(str::to_string);

        let title = non_blank(&dc.title).unwrap_or_default().to_string();
        dc.title = Some(title.clone());
        *file.dc_mut() = dc;
        file.set_label(title);

        if let Some(file_name) = non_blank(&self.file_name) {
            file.set_master_label(file_name);
        }

        let oai_id = match (self.enable_oai, file.pid()) {
            (true, Some(pid)) => Some(format!("{}{}", oai_prefix, pid.uri())),
            _ => None,
        };
        file.set_oai_id(oai_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::ObjectKind;

    fn choices() -> Vec<CollectionChoice> {
        vec![CollectionChoice {
            value: "info:fedora/demo:coll".to_string(),
            label: "Maps".to_string(),
        }]
    }

    fn upload() -> UploadedFile {
        UploadedFile {
            name: "notes.txt".to_string(),
            mimetype: "text/plain".to_string(),
            content: Bytes::from_static(b"notes"),
        }
    }

    #[test]
    fn test_collection_form_requires_title() {
        let form = CollectionForm {
            title: Some("  ".to_string()),
            ..Default::default()
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.for_field("title").count(), 1);
    }

    #[test]
    fn test_collection_form_oai_pairing() {
        let mut form = CollectionForm {
            title: Some("Maps".to_string()),
            oai_set: Some("maps".to_string()),
            ..Default::default()
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.to_string().contains("OAI set name is required"));

        form.oai_set = None;
        form.oai_set_name = Some("Maps".to_string());
        let errors = form.validate().unwrap_err();
        assert!(errors.to_string().contains("OAI set identifier is required"));

        form.oai_set = Some("maps".to_string());
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_collection_form_apply() {
        let form = CollectionForm {
            title: Some("Maps".to_string()),
            description: Some("Old maps".to_string()),
            oai_set: Some("maps".to_string()),
            oai_set_name: Some("Maps".to_string()),
        };
        let mut coll = CollectionModel::new();
        form.apply(&mut coll);
        assert_eq!(coll.label(), "Maps");
        assert_eq!(coll.dc().description.as_deref(), Some("Old maps"));
        assert_eq!(coll.oai_set(), Some("maps"));
        assert_eq!(CollectionForm::from_collection(&coll), form);
    }

    #[test]
    fn test_ingest_form_collection_must_be_offered() {
        let form = IngestForm {
            collection: Some("info:fedora/demo:other".to_string()),
            file: Some(upload()),
        };
        let errors = form.validate(&choices()).unwrap_err();
        assert_eq!(errors.for_field("collection").count(), 1);

        let form = IngestForm {
            collection: Some("demo:coll".to_string()),
            file: Some(upload()),
        };
        let (pid, file) = form.validate(&choices()).unwrap();
        assert_eq!(pid.as_str(), "demo:coll");
        assert_eq!(file.name, "notes.txt");
    }

    #[test]
    fn test_ingest_form_requires_both_fields() {
        let errors = IngestForm::default().validate(&choices()).unwrap_err();
        assert_eq!(errors.for_field("collection").count(), 1);
        assert_eq!(errors.for_field("file").count(), 1);
    }

    #[test]
    fn test_file_metadata_form_validation() {
        let mut form = FileMetadataForm {
            dc: DublinCore {
                title: Some("Notes".to_string()),
                dc_type: Some("Spreadsheet".to_string()),
                ..Default::default()
            },
            enable_oai: false,
            file_name: None,
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.for_field("type").count(), 1);
        assert_eq!(errors.for_field("file_name").count(), 1);

        form.dc.dc_type = Some("Text".to_string());
        form.file_name = Some("notes.txt".to_string());
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_file_metadata_form_keeps_read_only_fields() {
        let mut file = FileModel::new(ObjectKind::File);
        file.dc_mut().format = Some("text/plain".to_string());
        file.set_master_content(Bytes::from_static(b"x"), "text/plain", "a.txt");

        let form = FileMetadataForm {
            dc: DublinCore {
                title: Some("Notes".to_string()),
                format: Some("image/png".to_string()),
                creators: vec!["Me".to_string()],
                ..Default::default()
            },
            enable_oai: true,
            file_name: Some("notes.txt".to_string()),
        };
        form.apply(&mut file, "oai:");
        assert_eq!(file.label(), "Notes");
        assert_eq!(file.dc().format.as_deref(), Some("text/plain"));
        assert_eq!(file.dc().creators, vec!["Me".to_string()]);
        assert_eq!(file.master_label(), Some("notes.txt"));
        // No pid yet, so nothing to publish.
        assert!(file.oai_id().is_none());
    }
}
