// src/file/memory.rs
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::{field_matches, new_document_id, Document, DocumentStore, StoreError};

#[derive(Debug, Default)]
struct Collections {
    docs: HashMap<String, Vec<(String, Document)>>,
    offline: bool,
}

/// In-process document store. Clones share the same contents, so a test can keep
/// a handle and flip the store offline after handing a clone to the repository.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentStore {
    inner: Rc<RefCell<Collections>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline every call fails with `StoreError::Unavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.inner.borrow_mut().offline = offline;
    }

    /// Replaces a stored document wholesale.
    #[cfg(test)]
    pub fn put_raw(&self, collection: &str, id: &str, doc: Document) {
        let mut inner = self.inner.borrow_mut();
        let docs = inner.docs.entry(collection.to_string()).or_default();
        match docs.iter_mut().find(|(existing, _)| existing == id) {
            Some(slot) => slot.1 = doc,
            None => docs.push((id.to_string(), doc)),
        }
    }

    #[cfg(test)]
    pub fn len(&self, collection: &str) -> usize {
        self.inner
            .borrow()
            .docs
            .get(collection)
            .map_or(0, Vec::len)
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.inner.borrow().offline {
            Err(StoreError::Unavailable("document store is offline".to_string()))
        } else {
            Ok(())
        }
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn create(&mut self, collection: &str, doc: Document) -> Result<String, StoreError> {
        self.check_online()?;
        let id = new_document_id();
        self.inner
            .borrow_mut()
            .docs
            .entry(collection.to_string())
            .or_default()
            .push((id.clone(), doc));
        Ok(id)
    }

    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.check_online()?;
        Ok(self
            .inner
            .borrow()
            .docs
            .get(collection)
            .and_then(|docs| docs.iter().find(|(existing, _)| existing == id))
            .map(|(_, doc)| doc.clone()))
    }

    fn update(&mut self, collection: &str, id: &str, fields: Document) -> Result<(), StoreError> {
        self.check_online()?;
        let mut inner = self.inner.borrow_mut();
        let doc = inner
            .docs
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|(existing, _)| existing == id))
            .map(|(_, doc)| doc)
            .ok_or_else(|| StoreError::DocumentNotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        doc.extend(fields);
        Ok(())
    }

    fn query(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<(String, Document)>, StoreError> {
        self.check_online()?;
        Ok(self
            .inner
            .borrow()
            .docs
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, doc)| field_matches(doc, field, value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
