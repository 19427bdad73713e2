//! In-memory state of one repository object between load and save.

use chrono::{DateTime, Utc};

use crate::backend::{DatastreamWrite, ObjectProfile};
use crate::kinds::ContentModelSet;
use crate::repository::{DublinCore, Pid, RelObject, RelsExt, HAS_MODEL};

/// A repository object's properties and metadata, plus datastream content
/// waiting to be written.
///
/// New objects have no pid until their first save, unless one is assigned up
/// front. `RELS-EXT` always carries the content models the object was created
/// with.
#[derive(Debug, Clone)]
pub struct DigitalObject {
    pid: Option<Pid>,
    label: String,
    owner: Option<String>,
    created: Option<DateTime<Utc>>,
    dc: DublinCore,
    rels_ext: RelsExt,
    required_models: Vec<String>,
    pending: Vec<DatastreamWrite>,
    exists: bool,
}

impl DigitalObject {
    /// A new, unsaved object asserting the given content models.
    pub fn new(content_models: &[&str]) -> Self {
        let mut object = Self {
            pid: None,
            label: String::new(),
            owner: None,
            created: None,
            dc: DublinCore::default(),
            rels_ext: RelsExt::default(),
            required_models: Vec::new(),
            pending: Vec::new(),
            exists: false,
        };
        object.require_content_models(content_models);
        object
    }

    /// An object loaded from the repository.
    pub(crate) fn from_parts(profile: ObjectProfile, dc: DublinCore, mut rels_ext: RelsExt) -> Self {
        rels_ext.subject = profile.pid.uri();
        Self {
            pid: Some(profile.pid),
            label: profile.label,
            owner: profile.owner,
            created: profile.created,
            dc,
            rels_ext,
            required_models: Vec::new(),
            pending: Vec::new(),
            exists: true,
        }
    }

    pub fn pid(&self) -> Option<&Pid> {
        self.pid.as_ref()
    }

    /// Use a specific pid for a new object instead of having one minted.
    pub fn set_pid(&mut self, pid: Pid) {
        if !self.exists {
            self.rels_ext.subject = pid.uri();
            self.pid = Some(pid);
        }
    }

    /// Whether the object has been saved to (or loaded from) the repository.
    pub fn exists(&self) -> bool {
        self.exists
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.created
    }

    pub fn dc(&self) -> &DublinCore {
        &self.dc
    }

    pub fn dc_mut(&mut self) -> &mut DublinCore {
        &mut self.dc
    }

    pub fn rels_ext(&self) -> &RelsExt {
        &self.rels_ext
    }

    pub fn rels_ext_mut(&mut self) -> &mut RelsExt {
        &mut self.rels_ext
    }

    /// Content models currently asserted in `RELS-EXT`.
    pub fn content_models(&self) -> ContentModelSet {
        self.rels_ext.content_models()
    }

    /// Make sure the object asserts these content models when saved.
    pub fn require_content_models(&mut self, models: &[&str]) {
        for model in models {
            if !self.required_models.iter().any(|m| m == model) {
                self.required_models.push(model.to_string());
            }
            self.rels_ext
                .add(HAS_MODEL, RelObject::Resource(model.to_string()));
        }
    }

    /// Queue a datastream to be written on the next save, replacing any
    /// queued write to the same datastream.
    pub fn add_datastream(&mut self, write: DatastreamWrite) {
        self.pending.retain(|w| w.dsid != write.dsid);
        self.pending.push(write);
    }

    pub fn pending_datastream(&self, dsid: &str) -> Option<&DatastreamWrite> {
        self.pending.iter().find(|w| w.dsid == dsid)
    }

    pub fn pending_datastream_mut(&mut self, dsid: &str) -> Option<&mut DatastreamWrite> {
        self.pending.iter_mut().find(|w| w.dsid == dsid)
    }

    pub(crate) fn assign_pid(&mut self, pid: Pid) {
        self.rels_ext.subject = pid.uri();
        self.pid = Some(pid);
    }

    /// Fill in values that depend on the pid before metadata is written.
    pub(crate) fn prepare_for_save(&mut self) {
        if let Some(pid) = &self.pid {
            self.rels_ext.subject = pid.uri();
            if self.dc.identifier.is_none() {
                self.dc.identifier = Some(pid.to_string());
            }
        }
        for model in &self.required_models {
            self.rels_ext
                .add(HAS_MODEL, RelObject::Resource(model.clone()));
        }
    }

    /// Datastream writes queued for the next save.
    pub fn pending_datastreams(&self) -> &[DatastreamWrite] {
        &self.pending
    }

    /// Record a completed save. Queued writes are dropped only here, so a
    /// failed save can be retried.
    pub(crate) fn mark_saved(&mut self) {
        self.pending.clear();
        self.exists = true;
    }

    /// The object was ingested but a later write failed. It now exists in
    /// the repository, so the next save updates it.
    pub(crate) fn mark_ingested(&mut self) {
        self.exists = true;
    }

    /// Forget a pid assigned by an ingest that was rolled back.
    pub(crate) fn revert_pid(&mut self, previous: Option<Pid>) {
        if let Some(pid) = &self.pid {
            if self.dc.identifier.as_deref() == Some(pid.as_str()) {
                self.dc.identifier = None;
            }
        }
        self.rels_ext.subject = previous.as_ref().map(Pid::uri).unwrap_or_default();
        self.pid = previous;
        self.exists = false;
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::backend::ControlGroup;
    use crate::repository::{COLLECTION_CMODEL, PUBLIC_ACCESS_CMODEL};

    fn write(dsid: &str, label: &str) -> DatastreamWrite {
        DatastreamWrite {
            dsid: dsid.to_string(),
            label: label.to_string(),
            mimetype: "text/plain".to_string(),
            control_group: ControlGroup::Managed,
            versionable: true,
            checksum: None,
            content: Some(Bytes::from_static(b"x")),
            log_message: String::new(),
        }
    }

    #[test]
    fn test_new_object_asserts_models() {
        let obj = DigitalObject::new(&[COLLECTION_CMODEL, PUBLIC_ACCESS_CMODEL]);
        assert!(!obj.exists());
        assert!(obj.pid().is_none());
        let models = obj.content_models();
        assert!(models.contains_all(&[COLLECTION_CMODEL, PUBLIC_ACCESS_CMODEL]));
    }

    #[test]
    fn test_required_models_restored_on_save() {
        let mut obj = DigitalObject::new(&[PUBLIC_ACCESS_CMODEL]);
        obj.rels_ext_mut().remove_all(HAS_MODEL);
        assert!(obj.content_models().is_empty());

        obj.assign_pid(Pid::parse("demo:1").unwrap());
        obj.prepare_for_save();
        assert!(obj.content_models().contains(PUBLIC_ACCESS_CMODEL));
        assert_eq!(obj.rels_ext().subject, "info:fedora/demo:1");
        assert_eq!(obj.dc().identifier.as_deref(), Some("demo:1"));
    }

    #[test]
    fn test_pending_datastreams_replace_by_dsid() {
        let mut obj = DigitalObject::new(&[]);
        obj.add_datastream(write("master", "one"));
        obj.add_datastream(write("other", "two"));
        obj.add_datastream(write("master", "three"));

        assert_eq!(obj.pending_datastream("master").unwrap().label, "three");
        assert_eq!(obj.pending_datastreams().len(), 2);

        obj.mark_saved();
        assert!(obj.pending_datastreams().is_empty());
        assert!(obj.pending_datastream("master").is_none());
    }

    #[test]
    fn test_revert_pid_after_rollback() {
        let mut obj = DigitalObject::new(&[PUBLIC_ACCESS_CMODEL]);
        obj.add_datastream(write("master", "one"));
        obj.assign_pid(Pid::parse("demo:7").unwrap());
        obj.prepare_for_save();

        obj.revert_pid(None);
        assert!(obj.pid().is_none());
        assert!(!obj.exists());
        assert!(obj.dc().identifier.is_none());
        assert_eq!(obj.rels_ext().subject, "");
        assert_eq!(obj.pending_datastreams().len(), 1);
        assert!(obj.content_models().contains(PUBLIC_ACCESS_CMODEL));
    }

    #[test]
    fn test_set_pid_only_before_save() {
        let mut obj = DigitalObject::new(&[]);
        obj.set_pid(Pid::parse("demo:chosen").unwrap());
        assert_eq!(obj.pid().map(Pid::as_str), Some("demo:chosen"));

        obj.mark_saved();
        obj.set_pid(Pid::parse("demo:other").unwrap());
        assert_eq!(obj.pid().map(Pid::as_str), Some("demo:chosen"));
    }
}
