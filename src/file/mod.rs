// src/file/mod.rs
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

pub mod analysis;
pub mod export;
pub mod memory;
pub mod store;

pub use analysis::AnalysisRepository;
pub use memory::MemoryDocumentStore;
pub use store::RonDocumentStore;

/// A stored document: a JSON-shaped field map.
pub type Document = serde_json::Map<String, serde_json::Value>;

// Core trait for file operations
pub trait FileHandler<T> {
    fn load(&self, path: &Path) -> Result<T>;
    fn save(&self, data: &T, path: &Path) -> Result<()>;
}

/// Reads and writes any serde type as pretty RON.
#[derive(Debug, Default)]
pub struct RonFileHandler;

impl<T: Serialize + DeserializeOwned> FileHandler<T> for RonFileHandler {
    fn load(&self, path: &Path) -> Result<T> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        ron::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    fn save(&self, data: &T, path: &Path) -> Result<()> {
        let content = to_pretty_ron(data)?;
        // Write beside the target then rename so readers never see half a file.
        let tmp = path.with_extension("ron.tmp");
        fs::write(&tmp, content).with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, path).with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }
}

pub fn to_pretty_ron<T: Serialize>(data: &T) -> Result<String> {
    Ok(ron::ser::to_string_pretty(
        data,
        ron::ser::PrettyConfig::new()
            .new_line("\n".to_string())
            .depth_limit(4)
            .separate_tuple_members(true),
    )?)
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Unavailable(String),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not encode document: {0}")]
    Encode(String),

    #[error("could not decode {collection}/{id}: {reason}")]
    Decode {
        collection: String,
        id: String,
        reason: String,
    },

    #[error("no document {collection}/{id}")]
    DocumentNotFound { collection: String, id: String },
}

/// The document database seam. Single-document reads and writes are atomic;
/// nothing spans documents.
pub trait DocumentStore {
    fn create(&mut self, collection: &str, doc: Document) -> Result<String, StoreError>;

    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Overwrites the given fields, keeping the rest. Fails if the document is absent.
    fn update(&mut self, collection: &str, id: &str, fields: Document) -> Result<(), StoreError>;

    /// Documents whose `field` equals `value`, in insertion order.
    fn query(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<(String, Document)>, StoreError>;
}

pub(crate) fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

pub(crate) fn field_matches(doc: &Document, field: &str, value: &str) -> bool {
    doc.get(field).and_then(|v| v.as_str()) == Some(value)
}
