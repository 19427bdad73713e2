//! Collection model.

use crate::repo::{Repo, RepoError};
use crate::repository::{
    DublinCore, Pid, RelObject, COLLECTION_CMODEL, OAI_SET_NAME, OAI_SET_SPEC,
    PUBLIC_ACCESS_CMODEL,
};

use super::DigitalObject;

/// Content models every collection asserts.
pub const COLLECTION_CMODELS: &[&str] = &[COLLECTION_CMODEL, PUBLIC_ACCESS_CMODEL];

/// A collection object: Dublin Core metadata plus an optional OAI set.
#[derive(Debug, Clone)]
pub struct CollectionModel {
    object: DigitalObject,
}

impl CollectionModel {
    /// A new, unsaved collection.
    pub fn new() -> Self {
        Self {
            object: DigitalObject::new(COLLECTION_CMODELS),
        }
    }

    /// Load an existing collection.
    pub async fn load(repo: &Repo, pid: &Pid) -> Result<Self, RepoError> {
        let object = repo.load_object(pid).await?;
        Ok(Self { object })
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

    pub fn label(&self) -> &str {
        self.object.label()
    }

    pub fn dc(&self) -> &DublinCore {
        self.object.dc()
    }

    pub fn dc_mut(&mut self) -> &mut DublinCore {
        self.object.dc_mut()
    }

    /// OAI set spec (`oai:setSpec`).
    pub fn oai_set(&self) -> Option<&str> {
        self.object.rels_ext().first_value(OAI_SET_SPEC)
    }

    pub fn set_oai_set(&mut self, set_spec: Option<String>) {
        self.object
            .rels_ext_mut()
            .set_single(OAI_SET_SPEC, set_spec.map(RelObject::Literal));
    }

    /// OAI set display name (`oai:setName`).
    pub fn oai_set_name(&self) -> Option<&str> {
        self.object.rels_ext().first_value(OAI_SET_NAME)
    }

    pub fn set_oai_set_name(&mut self, name: Option<String>) {
        self.object
            .rels_ext_mut()
            .set_single(OAI_SET_NAME, name.map(RelObject::Literal));
    }

    /// Save, ingesting the collection if it is new.
    pub async fn save(&mut self, repo: &Repo, log_message: &str) -> Result<Pid, RepoError> {
        repo.save_object(&mut self.object, log_message).await
    }
}

impl Default for CollectionModel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;

    #[test]
    fn test_oai_set_single_valued() {
        let mut coll = CollectionModel::new();
        assert!(coll.oai_set().is_none());

        coll.set_oai_set(Some("maps".to_string()));
        coll.set_oai_set(Some("atlases".to_string()));
        coll.set_oai_set_name(Some("Atlases".to_string()));
        assert_eq!(coll.oai_set(), Some("atlases"));
        assert_eq!(coll.oai_set_name(), Some("Atlases"));
        assert_eq!(coll.object().rels_ext().objects(OAI_SET_SPEC).len(), 1);

        coll.set_oai_set(None);
        assert!(coll.oai_set().is_none());
        assert_eq!(coll.oai_set_name(), Some("Atlases"));
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let repo = Repo::new(MemoryBackend::new());
        let mut coll = CollectionModel::new();
        coll.object_mut().set_label("Maps");
        coll.dc_mut().title = Some("Maps".to_string());
        coll.set_oai_set(Some("maps".to_string()));
        let pid = coll.save(&repo, "ingested").await.unwrap();

        let loaded = CollectionModel::load(&repo, &pid).await.unwrap();
        assert!(loaded.exists());
        assert_eq!(loaded.label(), "Maps");
        assert_eq!(loaded.oai_set(), Some("maps"));
        assert!(loaded
            .object()
            .content_models()
            .contains_all(COLLECTION_CMODELS));
        assert_eq!(repo.all_collections().await.unwrap(), vec![pid]);
    }
}
