// src/file/analysis.rs

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use super::{Document, DocumentStore, StoreError};
use crate::config::{
    validate_name, Analysis, AnalysisDocument, AnalysisPatch, PlTable, UNTITLED_NAME,
};
use crate::error::AppError;

pub const ANALYSES_COLLECTION: &str = "analyses";
const OWNER_FIELD: &str = "userId";

/// Typed access to the `analyses` collection.
///
/// No authorization happens here: callers compare `owner_id` with the signed-in
/// user before showing a record.
pub struct AnalysisRepository {
    store: Box<dyn DocumentStore>,
}

impl std::fmt::Debug for AnalysisRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisRepository").finish_non_exhaustive()
    }
}

impl AnalysisRepository {
    pub fn new(store: Box<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn create_analysis(
        &mut self,
        owner_id: &str,
        name: &str,
        rows: PlTable,
    ) -> Result<String, AppError> {
        self.insert_analysis(owner_id, name, rows).map(|analysis| analysis.id)
    }

    /// Like `create_analysis`, but hands back the stored record built from what
    /// was written, so no read-back is needed.
    pub fn insert_analysis(
        &mut self,
        owner_id: &str,
        name: &str,
        rows: PlTable,
    ) -> Result<Analysis, AppError> {
        let doc = AnalysisDocument {
            user_id: owner_id.to_string(),
            name: validate_name(name)?,
            pl_rows: rows,
            created_at: Utc::now(),
        };
        let id = self.store.create(ANALYSES_COLLECTION, to_document(&doc)?)?;
        info!(id = %id, owner = owner_id, "created analysis");
        Ok(Analysis::from_document(id, doc))
    }

    /// The "new analysis" button: a blank table named "Untitled".
    pub fn create_untitled(&mut self, owner_id: &str) -> Result<String, AppError> {
        self.create_analysis(owner_id, UNTITLED_NAME, PlTable::empty())
    }

    pub fn get_analysis_by_id(&self, id: &str) -> Result<Analysis, AppError> {
        let doc = match self.store.get(ANALYSES_COLLECTION, id) {
            Ok(Some(doc)) => doc,
            Ok(None) => return Err(AppError::NotFound { id: id.to_string() }),
            Err(StoreError::Decode { reason, .. }) => {
                return Err(AppError::MalformedDocument {
                    id: id.to_string(),
                    reason,
                })
            }
            Err(e) => return Err(e.into()),
        };
        decode(id, doc)
    }

    /// Every well-formed analysis owned by `owner_id`, oldest first.
    /// Documents that fail schema checks are logged and left out.
    pub fn list_analyses_for_owner(&self, owner_id: &str) -> Result<Vec<Analysis>, AppError> {
        let docs = self
            .store
            .query(ANALYSES_COLLECTION, OWNER_FIELD, owner_id)?;

        Ok(docs
            .into_iter()
            .filter_map(|(id, doc)| match decode(&id, doc) {
                Ok(analysis) => Some(analysis),
                Err(e) => {
                    warn!(id = %id, error = %e, "quarantined malformed analysis");
                    None
                }
            })
            .collect())
    }

    /// Overwrites the patched fields. No version check: the last writer wins.
    pub fn update_analysis(&mut self, id: &str, patch: &AnalysisPatch) -> Result<(), AppError> {
        let mut patch = patch.clone();
        if let Some(name) = &patch.name {
            patch.name = Some(validate_name(name)?);
        }
        if patch.is_empty() {
            return Ok(());
        }
        self.store
            .update(ANALYSES_COLLECTION, id, to_document(&patch)?)?;
        info!(id, "updated analysis");
        Ok(())
    }
}

fn to_document<T: Serialize>(value: &T) -> Result<Document, AppError> {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(other) => Err(StoreError::Encode(format!("expected an object, got {other}")).into()),
        Err(e) => Err(StoreError::Encode(e.to_string()).into()),
    }
}

fn decode(id: &str, doc: Document) -> Result<Analysis, AppError> {
    serde_json::from_value::<AnalysisDocument>(serde_json::Value::Object(doc))
        .map(|doc| Analysis::from_document(id.to_string(), doc))
        .map_err(|e| AppError::MalformedDocument {
            id: id.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlLine;
    use crate::error::ValidationError;
    use crate::file::MemoryDocumentStore;
    use serde_json::json;

    fn repository() -> (AnalysisRepository, MemoryDocumentStore) {
        let store = MemoryDocumentStore::new();
        (AnalysisRepository::new(Box::new(store.clone())), store)
    }

    #[test]
    fn new_analysis_is_untitled_and_blank() {
        let (mut repo, _) = repository();
        let id = repo.create_untitled("u1").unwrap();

        let analysis = repo.get_analysis_by_id(&id).unwrap();
        assert_eq!(analysis.id, id);
        assert_eq!(analysis.owner_id, "u1");
        assert_eq!(analysis.name, "Untitled");
        assert_eq!(analysis.rows, PlTable::empty());
    }

    #[test]
    fn save_then_reload_round_trips() {
        let (mut repo, _) = repository();
        let id = repo.create_untitled("u1").unwrap();

        let rows = PlTable::from_values("1000", "300", "200");
        repo.update_analysis(&id, &AnalysisPatch::name("FY24")).unwrap();
        repo.update_analysis(&id, &AnalysisPatch::rows(rows.clone())).unwrap();
        repo.update_analysis(&id, &AnalysisPatch::rows(rows.clone())).unwrap();

        let analysis = repo.get_analysis_by_id(&id).unwrap();
        assert_eq!(analysis.name, "FY24");
        assert_eq!(analysis.rows, rows);
        assert_eq!(analysis.rows.value(PlLine::NetProfit), "500");
    }

    #[test]
    fn inserted_record_matches_what_was_stored() {
        let (mut repo, _) = repository();
        let inserted = repo
            .insert_analysis("u1", " Q2 ", PlTable::from_values("10", "2", "3"))
            .unwrap();
        assert_eq!(inserted.name, "Q2");
        assert_eq!(repo.get_analysis_by_id(&inserted.id).unwrap(), inserted);
    }

    #[test]
    fn unknown_id_is_not_found() {
        let (repo, _) = repository();
        assert!(matches!(
            repo.get_analysis_by_id("missing"),
            Err(AppError::NotFound { .. })
        ));
    }

    #[test]
    fn updating_unknown_id_is_not_found() {
        let (mut repo, _) = repository();
        assert!(matches!(
            repo.update_analysis("missing", &AnalysisPatch::name("x")),
            Err(AppError::NotFound { .. })
        ));
    }

    #[test]
    fn lists_only_the_owners_analyses() {
        let (mut repo, _) = repository();
        let first = repo.create_analysis("u1", "First", PlTable::empty()).unwrap();
        repo.create_analysis("u2", "Theirs", PlTable::empty()).unwrap();
        let second = repo.create_analysis("u1", "Second", PlTable::empty()).unwrap();

        let ids: Vec<String> = repo
            .list_analyses_for_owner("u1")
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[test]
    fn malformed_documents_are_rejected_and_quarantined() {
        let (mut repo, store) = repository();
        let good = repo.create_untitled("u1").unwrap();
        let bad = json!({ "userId": "u1", "name": "Broken", "plRows": [] });
        store.put_raw(ANALYSES_COLLECTION, "bad", bad.as_object().cloned().unwrap());

        assert!(matches!(
            repo.get_analysis_by_id("bad"),
            Err(AppError::MalformedDocument { .. })
        ));
        let listed = repo.list_analyses_for_owner("u1").unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, good);
    }

    #[test]
    fn store_outage_surfaces_as_unavailable() {
        let (mut repo, store) = repository();
        store.set_offline(true);
        assert!(matches!(
            repo.create_untitled("u1"),
            Err(AppError::StoreUnavailable(_))
        ));
        assert!(matches!(
            repo.list_analyses_for_owner("u1"),
            Err(AppError::StoreUnavailable(_))
        ));
    }

    #[test]
    fn names_are_validated_on_write() {
        let (mut repo, store) = repository();
        assert!(matches!(
            repo.create_analysis("u1", "  ", PlTable::empty()),
            Err(AppError::Validation(ValidationError::EmptyName))
        ));
        assert_eq!(store.len(ANALYSES_COLLECTION), 0);

        let id = repo.create_analysis("u1", "  Padded  ", PlTable::empty()).unwrap();
        assert_eq!(repo.get_analysis_by_id(&id).unwrap().name, "Padded");
    }

    #[test]
    fn ron_index_is_never_an_analysis() {
        let dir = tempfile::tempdir().unwrap();
        let store = crate::file::RonDocumentStore::open(dir.path()).unwrap();
        let mut repo = AnalysisRepository::new(Box::new(store));
        repo.create_untitled("u1").unwrap();

        assert!(matches!(
            repo.get_analysis_by_id("index"),
            Err(AppError::NotFound { .. })
        ));
    }

    #[test]
    fn ron_backed_repository_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = crate::file::RonDocumentStore::open(dir.path()).unwrap();
        let mut repo = AnalysisRepository::new(Box::new(store));

        let id = repo
            .create_analysis("u1", "On disk", PlTable::from_values("10", "2", "3"))
            .unwrap();
        let analysis = repo.get_analysis_by_id(&id).unwrap();
        assert_eq!(analysis.name, "On disk");
        assert_eq!(analysis.rows.value(PlLine::NetProfit), "5");
    }
}
