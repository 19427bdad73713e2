use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use crate::kinds::ContentModelSet;
use crate::repository::{Pid, RelObject, RelsExt, RELS_EXT_DSID};
use crate::util::sha256_hex;

use super::repo_backend::{
    BackendError, Datastream, DatastreamProfile, DatastreamWrite, Dissemination, NewObject,
    ObjectProfile, RepoBackend, Result,
};

/// Default namespace for minted pids, matching Fedora's stock configuration.
pub const DEFAULT_NAMESPACE: &str = "changeme";

/// A fault to report for a particular object instead of its contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectedFault {
    /// Respond as if the credentials may not access the object.
    Denied,
    /// Respond as if the repository could not be reached.
    Unreachable,
}

struct StoredObject {
    profile: ObjectProfile,
    datastreams: BTreeMap<String, Datastream>,
    audit_trail: Vec<String>,
}

impl StoredObject {
    /// Relationships from the stored RELS-EXT, if any.
    fn rels_ext(&self) -> Option<RelsExt> {
        let ds = self.datastreams.get(RELS_EXT_DSID)?;
        let xml = String::from_utf8_lossy(&ds.content);
        RelsExt::from_xml(&xml).ok()
    }
}

/// An in-memory implementation of `RepoBackend`, intended primarily for testing.
///
/// Content models and relationships are derived from each object's stored
/// RELS-EXT, the way Fedora's resource index does.
pub struct MemoryBackend {
    namespace: String,
    objects: RwLock<BTreeMap<Pid, StoredObject>>,
    next_ids: RwLock<HashMap<String, u64>>,
    faults: RwLock<HashMap<Pid, InjectedFault>>,
    services: RwLock<HashMap<(String, String), Dissemination>>,
}

impl MemoryBackend {
    /// Create a new empty in-memory backend.
    pub fn new() -> Self {
        Self::with_namespace(DEFAULT_NAMESPACE)
    }

    /// Create a backend that mints pids in `namespace` by default.
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            objects: RwLock::new(BTreeMap::new()),
            next_ids: RwLock::new(HashMap::new()),
            faults: RwLock::new(HashMap::new()),
            services: RwLock::new(HashMap::new()),
        }
    }

    /// Make every request about `pid` fail with the given fault.
    pub fn inject_fault(&self, pid: &Pid, fault: InjectedFault) {
        self.faults.write().unwrap().insert(pid.clone(), fault);
    }

    pub fn clear_fault(&self, pid: &Pid) {
        self.faults.write().unwrap().remove(pid);
    }

    /// Register the output of a service method, returned for any existing object.
    pub fn add_service(&self, sdef: &str, method: &str, output: Dissemination) {
        self.services
            .write()
            .unwrap()
            .insert((sdef.to_string(), method.to_string()), output);
    }

    /// Log messages recorded for an object, oldest first.
    pub fn audit_trail(&self, pid: &Pid) -> Vec<String> {
        self.objects
            .read()
            .unwrap()
            .get(pid)
            .map(|o| o.audit_trail.clone())
            .unwrap_or_default()
    }

    fn check_fault(&self, pid: &Pid) -> Result<()> {
        match self.faults.read().unwrap().get(pid) {
            None => Ok(()),
            Some(InjectedFault::Denied) => Err(BackendError::PermissionDenied(format!(
                "access to {} denied",
                pid
            ))),
            Some(InjectedFault::Unreachable) => Err(BackendError::RequestFailed {
                status: Some(503),
                message: "service unavailable".to_string(),
            }),
        }
    }

    fn mint_pid(&self, namespace: Option<&str>) -> Result<Pid> {
        let namespace = namespace.unwrap_or(&self.namespace);
        let mut next_ids = self.next_ids.write().unwrap();
        let counter = next_ids.entry(namespace.to_string()).or_insert(0);
        *counter += 1;
        Pid::parse(&format!("{}:{}", namespace, counter))
            .map_err(|e| BackendError::Other(e.to_string()))
    }

    fn matching_subjects(&self, predicate: &str, object: &RelObject) -> Vec<Pid> {
        self.objects
            .read()
            .unwrap()
            .iter()
            .filter(|(_, stored)| {
                stored
                    .rels_ext()
                    .map(|rels| rels.contains(predicate, object))
                    .unwrap_or(false)
            })
            .map(|(pid, _)| pid.clone())
            .collect()
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RepoBackend for MemoryBackend {
    async fn object_exists(&self, pid: &Pid) -> Result<bool> {
        self.check_fault(pid)?;
        Ok(self.objects.read().unwrap().contains_key(pid))
    }

    async fn get_object_profile(&self, pid: &Pid) -> Result<ObjectProfile> {
        self.check_fault(pid)?;
        let objects = self.objects.read().unwrap();
        let stored = objects.get(pid).ok_or(BackendError::NotFound)?;
        let mut profile = stored.profile.clone();
        profile.content_models = stored
            .rels_ext()
            .map(|rels| rels.content_models())
            .unwrap_or_else(ContentModelSet::new);
        Ok(profile)
    }

    async fn ingest_object(&self, object: &NewObject) -> Result<Pid> {
        let pid = match &object.pid {
            Some(pid) => {
                self.check_fault(pid)?;
                pid.clone()
            }
            None => self.mint_pid(object.namespace.as_deref())?,
        };

        let mut objects = self.objects.write().unwrap();
        if objects.contains_key(&pid) {
            return Err(BackendError::RequestFailed {
                status: Some(500),
                message: format!("object {} already exists", pid),
            });
        }
        objects.insert(
            pid.clone(),
            StoredObject {
                profile: ObjectProfile {
                    pid: pid.clone(),
                    label: object.label.clone(),
                    owner: None,
                    state: "A".to_string(),
                    content_models: ContentModelSet::new(),
                    created: Some(Utc::now()),
                },
                datastreams: BTreeMap::new(),
                audit_trail: vec![object.log_message.clone()],
            },
        );
        Ok(pid)
    }

    async fn modify_object(&self, pid: &Pid, label: &str, log_message: &str) -> Result<()> {
        self.check_fault(pid)?;
        let mut objects = self.objects.write().unwrap();
        let stored = objects.get_mut(pid).ok_or(BackendError::NotFound)?;
        stored.profile.label = label.to_string();
        stored.audit_trail.push(log_message.to_string());
        Ok(())
    }

    async fn purge_object(&self, pid: &Pid, _log_message: &str) -> Result<()> {
        self.check_fault(pid)?;
        self.objects
            .write()
            .unwrap()
            .remove(pid)
            .map(|_| ())
            .ok_or(BackendError::NotFound)
    }

    async fn put_datastream(&self, pid: &Pid, datastream: &DatastreamWrite) -> Result<()> {
        self.check_fault(pid)?;

        let mut objects = self.objects.write().unwrap();
        let stored = objects.get_mut(pid).ok_or(BackendError::NotFound)?;

        let Some(content) = &datastream.content else {
            // Properties only; the datastream must already exist.
            let existing = stored
                .datastreams
                .get_mut(&datastream.dsid)
                .ok_or(BackendError::NotFound)?;
            existing.profile.label = datastream.label.clone();
            existing.profile.mimetype = datastream.mimetype.clone();
            existing.profile.versionable = datastream.versionable;
            stored.audit_trail.push(datastream.log_message.clone());
            return Ok(());
        };

        let digest = sha256_hex(content);
        if let Some(expected) = &datastream.checksum {
            if !expected.eq_ignore_ascii_case(&digest) {
                return Err(BackendError::RequestFailed {
                    status: Some(400),
                    message: format!("checksum mismatch for {}/{}", pid, datastream.dsid),
                });
            }
        }

        stored.datastreams.insert(
            datastream.dsid.clone(),
            Datastream {
                profile: DatastreamProfile {
                    dsid: datastream.dsid.clone(),
                    label: datastream.label.clone(),
                    mimetype: datastream.mimetype.clone(),
                    control_group: datastream.control_group,
                    versionable: datastream.versionable,
                    checksum: datastream.checksum.as_ref().map(|_| digest),
                    size: content.len() as u64,
                },
                content: content.clone(),
            },
        );
        stored.audit_trail.push(datastream.log_message.clone());
        Ok(())
    }

    async fn get_datastream_profile(&self, pid: &Pid, dsid: &str) -> Result<DatastreamProfile> {
        Ok(self.get_datastream(pid, dsid).await?.profile)
    }

    async fn get_datastream(&self, pid: &Pid, dsid: &str) -> Result<Datastream> {
        self.check_fault(pid)?;
        let objects = self.objects.read().unwrap();
        objects
            .get(pid)
            .and_then(|o| o.datastreams.get(dsid))
            .cloned()
            .ok_or(BackendError::NotFound)
    }

    async fn find_by_content_model(&self, cmodel: &str) -> Result<Vec<Pid>> {
        Ok(self.matching_subjects(
            crate::repository::HAS_MODEL,
            &RelObject::Resource(cmodel.to_string()),
        ))
    }

    async fn find_subjects(&self, predicate: &str, object: &str) -> Result<Vec<Pid>> {
        Ok(self.matching_subjects(predicate, &RelObject::Resource(object.to_string())))
    }

    async fn get_dissemination(
        &self,
        pid: &Pid,
        sdef: &str,
        method: &str,
        _params: &[(String, String)],
    ) -> Result<Dissemination> {
        self.check_fault(pid)?;
        if !self.objects.read().unwrap().contains_key(pid) {
            return Err(BackendError::NotFound);
        }
        self.services
            .read()
            .unwrap()
            .get(&(sdef.to_string(), method.to_string()))
            .cloned()
            .ok_or_else(|| BackendError::RequestFailed {
                status: Some(500),
                message: format!("no service method {}/{}", sdef, method),
            })
    }
}
