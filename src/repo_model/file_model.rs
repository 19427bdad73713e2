//! File model types.

use bytes::Bytes;

use crate::backend::{ControlGroup, Datastream, DatastreamProfile, DatastreamWrite, Dissemination};
use crate::kinds::{ObjectKind, DIGITAL_OBJECT_KINDS};
use crate::repo::{Repo, RepoError};
use crate::repository::{
    DublinCore, Pid, RelObject, IMAGE_SERVICE, IS_MEMBER_OF_COLLECTION, OAI_ITEM_ID,
};
use crate::util::sha256_hex;

use super::DigitalObject;

/// Service method returning a region of an image.
pub const PREVIEW_METHOD: &str = "getRegion";

/// A reposited file: metadata plus a master datastream holding the content.
///
/// What the master datastream is called, and whether a preview is available,
/// depends on the object's [`ObjectKind`].
#[derive(Debug, Clone)]
pub struct FileModel {
    object: DigitalObject,
    kind: ObjectKind,
    /// Properties of the stored master datastream, if any.
    master: Option<DatastreamProfile>,
}

impl FileModel {
    /// A new, unsaved file object of the given kind.
    pub fn new(kind: ObjectKind) -> Self {
        Self {
            object: DigitalObject::new(kind.content_models()),
            kind,
            master: None,
        }
    }

    /// A new file object whose kind is chosen from the content's MIME type.
    pub fn for_mimetype(mimetype: &str) -> Self {
        Self::new(DIGITAL_OBJECT_KINDS.resolve_by_mimetype(mimetype))
    }

    /// Load an existing file object, choosing its kind from its content models.
    pub async fn load(repo: &Repo, pid: &Pid) -> Result<Self, RepoError> {
        let kind = repo.resolve_kind(pid, &DIGITAL_OBJECT_KINDS).await?;
        let object = repo.load_object(pid).await?;

        let master = match repo.datastream_profile(pid, kind.master_dsid()).await {
            Ok(profile) => Some(profile),
            Err(RepoError::NotFound) => None,
            Err(e) => return Err(e),
        };

        Ok(Self {
            object,
            kind,
            master,
        })
    }

    pub fn object(&self) -> &DigitalObject {
        &self.object
    }

    pub fn object_mut(&mut self) -> &mut DigitalObject {
        &mut self.object
    }

    pub fn pid(&self) -> Option<&Pid> {
        self.object.pid()
    }

    pub fn exists(&self) -> bool {
        self.object.exists()
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn label(&self) -> &str {
        self.object.label()
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.object.set_label(label);
    }

    pub fn dc(&self) -> &DublinCore {
        self.object.dc()
    }

    pub fn dc_mut(&mut self) -> &mut DublinCore {
        self.object.dc_mut()
    }

    // =========================================================================
    // Master Datastream
    // =========================================================================

    pub fn master_dsid(&self) -> &'static str {
        self.kind.master_dsid()
    }

    /// Label of the master datastream, normally the original file name.
    pub fn master_label(&self) -> Option<&str> {
        match self.object.pending_datastream(self.master_dsid()) {
            Some(write) => Some(&write.label),
            None => self.master.as_ref().map(|p| p.label.as_str()),
        }
    }

    pub fn master_mimetype(&self) -> Option<&str> {
        match self.object.pending_datastream(self.master_dsid()) {
            Some(write) => Some(&write.mimetype),
            None => self.master.as_ref().map(|p| p.mimetype.as_str()),
        }
    }

    pub fn master_profile(&self) -> Option<&DatastreamProfile> {
        self.master.as_ref()
    }

    /// Set the master content, to be written with a SHA-256 checksum on save.
    ///
    /// A blank label or MIME type falls back to the kind's default.
    pub fn set_master_content(
        &mut self,
        content: Bytes,
        mimetype: impl Into<String>,
        label: impl Into<String>,
    ) {
        let checksum = sha256_hex(&content);
        let label = Some(label.into())
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| self.kind.master_description().to_string());
        let mimetype = Some(mimetype.into())
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| self.kind.master_default_mimetype().to_string());
        self.object.add_datastream(DatastreamWrite {
            dsid: self.master_dsid().to_string(),
            label,
            mimetype,
            control_group: ControlGroup::Managed,
            versionable: true,
            checksum: Some(checksum),
            content: Some(content),
            log_message: String::new(),
        });
    }

    /// Rename the master datastream. Returns false if there is no master yet.
    pub fn set_master_label(&mut self, label: impl Into<String>) -> bool {
        let label = label.into();
        let dsid = self.master_dsid();
        if let Some(write) = self.object.pending_datastream_mut(dsid) {
            write.label = label;
            return true;
        }
        let Some(profile) = &self.master else {
            return false;
        };
        let write = DatastreamWrite {
            dsid: dsid.to_string(),
            label,
            mimetype: profile.mimetype.clone(),
            control_group: profile.control_group,
            versionable: profile.versionable,
            checksum: None,
            content: None,
            log_message: String::new(),
        };
        self.object.add_datastream(write);
        true
    }

    /// Read the stored master datastream.
    pub async fn master_content(&self, repo: &Repo) -> Result<Datastream, RepoError> {
        let pid = self.pid().ok_or(RepoError::NotFound)?;
        repo.read_datastream(pid, self.master_dsid()).await
    }

    // =========================================================================
    // Relationships
    // =========================================================================

    /// OAI item identifier; present only when the file is published via OAI.
    pub fn oai_id(&self) -> Option<&str> {
        self.object.rels_ext().first_value(OAI_ITEM_ID)
    }

    /// Set or, with `None`, remove the OAI item identifier.
    pub fn set_oai_id(&mut self, oai_id: Option<String>) {
        self.object
            .rels_ext_mut()
            .set_single(OAI_ITEM_ID, oai_id.map(RelObject::Literal));
    }

    /// The collection this file belongs to.
    pub fn collection(&self) -> Option<Pid> {
        self.object
            .rels_ext()
            .resources(IS_MEMBER_OF_COLLECTION)
            .into_iter()
            .find_map(|uri| Pid::from_uri(uri).ok())
    }

    pub fn set_collection(&mut self, collection: &Pid) {
        self.object.rels_ext_mut().set_single(
            IS_MEMBER_OF_COLLECTION,
            Some(RelObject::Resource(collection.uri())),
        );
    }

    // =========================================================================
    // Preview
    // =========================================================================

    pub fn has_preview(&self) -> bool {
        self.kind.has_preview()
    }

    /// A small rendition of the image from the image service.
    pub async fn preview(&self, repo: &Repo) -> Result<Dissemination, RepoError> {
        let pid = self.pid().ok_or(RepoError::NotFound)?;
        if !self.has_preview() {
            return Err(RepoError::NotFound);
        }
        repo.dissemination(
            pid,
            IMAGE_SERVICE,
            PREVIEW_METHOD,
            &[("level".to_string(), "1".to_string())],
        )
        .await
    }

    // =========================================================================
    // Save
    // =========================================================================

    /// Save, ingesting the file object if it is new.
    pub async fn save(&mut self, repo: &Repo, log_message: &str) -> Result<Pid, RepoError> {
        let written = self
            .object
            .pending_datastream(self.master_dsid())
            .map(|write| DatastreamProfile {
                dsid: write.dsid.clone(),
                label: write.label.clone(),
                mimetype: write.mimetype.clone(),
                control_group: write.control_group,
                versionable: write.versionable,
                checksum: write
                    .checksum
                    .clone()
                    .or_else(|| self.master.as_ref().and_then(|p| p.checksum.clone())),
                size: match &write.content {
                    Some(content) => content.len() as u64,
                    None => self.master.as_ref().map(|p| p.size).unwrap_or(0),
                },
            });

        let pid = repo.save_object(&mut self.object, log_message).await?;
        if written.is_some() {
            self.master = written;
        }
        Ok(pid)
    }
}
