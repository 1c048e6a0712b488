// src/file/store.rs
use std::fs;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{
    field_matches, new_document_id, to_pretty_ron, Document, DocumentStore, FileHandler,
    RonFileHandler, StoreError,
};

/// Insertion-ordered ids of one collection, kept in `<collection>/index.ron`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionIndex {
    pub version: String,
    pub ids: Vec<String>,
}

impl CollectionIndex {
    pub fn new() -> Self {
        Self {
            version: "1.0.0".to_string(),
            ids: Vec::new(),
        }
    }
}

/// Document store backed by one RON file per document:
/// `<root>/<collection>/<id>.ron`.
#[derive(Debug)]
pub struct RonDocumentStore {
    root: PathBuf,
    handler: RonFileHandler,
}

impl RonDocumentStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| StoreError::Io {
            path: root.clone(),
            source,
        })?;
        debug!(root = %root.display(), "opened document store");
        Ok(Self {
            root,
            handler: RonFileHandler,
        })
    }

    fn collection_dir(&self, collection: &str) -> Result<PathBuf, StoreError> {
        let dir = self.root.join(collection);
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(dir)
    }

    fn index_path(&self, collection: &str) -> PathBuf {
        self.root.join(collection).join(format!("{INDEX_STEM}.ron"))
    }

    fn load_index(&self, collection: &str) -> Result<CollectionIndex, StoreError> {
        let path = self.index_path(collection);
        if !path.exists() {
            return Ok(CollectionIndex::new());
        }
        self.handler
            .load(&path)
            .map_err(|e| StoreError::Unavailable(format!("{e:#}")))
    }

    fn save_index(&self, collection: &str, index: &CollectionIndex) -> Result<(), StoreError> {
        self.collection_dir(collection)?;
        self.handler
            .save(index, &self.index_path(collection))
            .map_err(|e| StoreError::Unavailable(format!("{e:#}")))
    }

    fn read_document(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        if !is_valid_id(id) {
            return Ok(None);
        }
        let path = self.root.join(collection).join(format!("{id}.ron"));
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        ron::from_str(&content)
            .map(Some)
            .map_err(|e| StoreError::Decode {
                collection: collection.to_string(),
                id: id.to_string(),
                reason: e.to_string(),
            })
    }

    fn write_document(&self, collection: &str, id: &str, doc: &Document) -> Result<(), StoreError> {
        let dir = self.collection_dir(collection)?;
        let content = to_pretty_ron(doc).map_err(|e| StoreError::Encode(e.to_string()))?;
        let path = dir.join(format!("{id}.ron"));
        let tmp = dir.join(format!("{id}.ron.tmp"));
        fs::write(&tmp, content).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| StoreError::Io { path, source })
    }
}

impl DocumentStore for RonDocumentStore {
    fn create(&mut self, collection: &str, doc: Document) -> Result<String, StoreError> {
        let id = new_document_id();
        self.write_document(collection, &id, &doc)?;

        let mut index = self.load_index(collection)?;
        index.ids.push(id.clone());
        self.save_index(collection, &index)?;

        debug!(collection, id = %id, "created document");
        Ok(id)
    }

    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.read_document(collection, id)
    }

    fn update(&mut self, collection: &str, id: &str, fields: Document) -> Result<(), StoreError> {
        let mut doc = self
            .read_document(collection, id)?
            .ok_or_else(|| StoreError::DocumentNotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        doc.extend(fields);
        self.write_document(collection, id, &doc)?;
        debug!(collection, id, "updated document");
        Ok(())
    }

    fn query(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<(String, Document)>, StoreError> {
        let index = self.load_index(collection)?;
        let mut found = Vec::new();
        for id in index.ids {
            match self.read_document(collection, &id) {
                Ok(Some(doc)) if field_matches(&doc, field, value) => found.push((id, doc)),
                Ok(_) => {}
                Err(StoreError::Decode { reason, .. }) => {
                    warn!(collection, id = %id, %reason, "skipping unreadable document");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(found)
    }
}

const INDEX_STEM: &str = "index";

/// Ids become file names, so only accept what `new_document_id` produces.
/// `index` is taken by the collection index.
fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id != INDEX_STEM
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
