// src/state/editor.rs
//! Edit/save/cancel lifecycle for one analysis.
//!
//! Name and table are edited independently; each has its own toggle and its
//! own save path. `saving` is advisory: it drives button state in the UI and
//! does not block a second save at this layer.

use tracing::{debug, warn};

use crate::analysis::{derive_flows, FlowGraph};
use crate::config::{validate_name, Analysis, AnalysisPatch, PlLine, PlTable};
use crate::error::{AppError, ValidationError};
use crate::file::AnalysisRepository;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditScope {
    Name,
    Table,
}

#[derive(Debug, Clone, PartialEq)]
enum SaveTarget {
    Create { name: String, rows: PlTable },
    Update { id: String, patch: AnalysisPatch },
}

/// A validated save waiting on the store.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSave {
    scope: EditScope,
    target: SaveTarget,
}

#[derive(Debug, Clone)]
pub struct AnalysisEditor {
    owner_id: String,
    baseline: Option<Analysis>,
    name: String,
    rows: PlTable,
    editing_name: bool,
    editing_table: bool,
    saving: bool,
    name_error: Option<ValidationError>,
    table_error: Option<ValidationError>,
    save_error: Option<String>,
}

impl AnalysisEditor {
    /// Shows a persisted analysis, nothing in edit mode.
    pub fn open(analysis: Analysis) -> Self {
        Self {
            owner_id: analysis.owner_id.clone(),
            name: analysis.name.clone(),
            rows: analysis.rows.clone(),
            baseline: Some(analysis),
            editing_name: false,
            editing_table: false,
            saving: false,
            name_error: None,
            table_error: None,
            save_error: None,
        }
    }

    /// An unsaved analysis; saving creates it.
    pub fn draft(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            baseline: None,
            name: String::new(),
            rows: PlTable::empty(),
            editing_name: true,
            editing_table: true,
            saving: false,
            name_error: None,
            table_error: None,
            save_error: None,
        }
    }

    pub fn analysis(&self) -> Option<&Analysis> {
        self.baseline.as_ref()
    }

    pub fn id(&self) -> Option<&str> {
        self.baseline.as_ref().map(|a| a.id.as_str())
    }

    pub fn is_new(&self) -> bool {
        self.baseline.is_none()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rows(&self) -> &PlTable {
        &self.rows
    }

    /// Recomputed from the current rows every call.
    pub fn flows(&self) -> FlowGraph {
        derive_flows(&self.rows)
    }

    pub fn editing_name(&self) -> bool {
        self.editing_name
    }

    pub fn editing_table(&self) -> bool {
        self.editing_table
    }

    pub fn saving(&self) -> bool {
        self.saving
    }

    pub fn name_error(&self) -> Option<&ValidationError> {
        self.name_error.as_ref()
    }

    pub fn table_error(&self) -> Option<&ValidationError> {
        self.table_error.as_ref()
    }

    pub fn save_error(&self) -> Option<&str> {
        self.save_error.as_deref()
    }

    pub fn begin_edit_name(&mut self) {
        if self.editing_name {
            return;
        }
        if let Some(baseline) = &self.baseline {
            self.name = baseline.name.clone();
        }
        self.editing_name = true;
        self.name_error = None;
    }

    pub fn begin_edit_table(&mut self) {
        if self.editing_table {
            return;
        }
        if let Some(baseline) = &self.baseline {
            self.rows = baseline.rows.clone();
        }
        self.editing_table = true;
        self.table_error = None;
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> bool {
        if !self.editing_name {
            return false;
        }
        self.name = name.into();
        true
    }

    /// Edits an input row; Net Profit is re-derived. Returns false when nothing
    /// changed: the table is not in edit mode, or the row is Net Profit.
    pub fn set_row_value(&mut self, line: PlLine, value: impl Into<String>) -> bool {
        if !self.editing_table {
            return false;
        }
        self.rows.set_value(line, value)
    }

    pub fn cancel_name(&mut self) {
        match &self.baseline {
            Some(baseline) => {
                self.name = baseline.name.clone();
                self.editing_name = false;
            }
            None => self.name.clear(),
        }
        self.name_error = None;
        self.save_error = None;
    }

    pub fn cancel_table(&mut self) {
        match &self.baseline {
            Some(baseline) => {
                self.rows = baseline.rows.clone();
                self.editing_table = false;
            }
            None => self.rows = PlTable::empty(),
        }
        self.table_error = None;
        self.save_error = None;
    }

    /// Validates, freezes the values to write and marks the editor as saving.
    pub fn prepare_save(&mut self, scope: EditScope) -> Result<PendingSave, ValidationError> {
        self.name_error = None;
        self.table_error = None;
        self.save_error = None;

        let candidate = match (&self.baseline, self.editing_name) {
            (Some(baseline), false) => baseline.name.as_str(),
            _ => self.name.as_str(),
        };
        let name = validate_name(candidate).map_err(|e| {
            self.name_error = Some(e.clone());
            e
        })?;

        if scope == EditScope::Table || self.is_new() {
            if let Err(e) = self.rows.validate() {
                self.table_error = Some(e.clone());
                return Err(e);
            }
            self.rows.recompute_net_profit();
        }

        let target = match &self.baseline {
            None => SaveTarget::Create {
                name,
                rows: self.rows.clone(),
            },
            Some(baseline) => SaveTarget::Update {
                id: baseline.id.clone(),
                patch: match scope {
                    EditScope::Name => AnalysisPatch::name(name),
                    EditScope::Table => AnalysisPatch::rows(self.rows.clone()),
                },
            },
        };

        self.saving = true;
        Ok(PendingSave { scope, target })
    }

    /// Adopts the saved values, or keeps the edits and records the failure.
    /// `created` carries the stored record when the save created it.
    pub fn complete_save(
        &mut self,
        pending: PendingSave,
        outcome: Result<Option<Analysis>, AppError>,
    ) -> Result<(), AppError> {
        self.saving = false;

        let created = match outcome {
            Ok(created) => created,
            Err(e) => {
                warn!(error = %e, "save failed, keeping local edits");
                self.save_error = Some("Failed to save analysis.".to_string());
                return Err(e);
            }
        };

        match (pending.target, created) {
            (SaveTarget::Create { .. }, Some(analysis)) => {
                debug!(id = %analysis.id, "draft saved");
                self.name = analysis.name.clone();
                self.rows = analysis.rows.clone();
                self.baseline = Some(analysis);
                self.editing_name = false;
                self.editing_table = false;
            }
            (SaveTarget::Update { patch, .. }, _) => {
                if let Some(baseline) = &mut self.baseline {
                    baseline.apply(&patch);
                    if let Some(name) = patch.name {
                        self.name = name;
                    }
                }
                match pending.scope {
                    EditScope::Name => self.editing_name = false,
                    EditScope::Table => self.editing_table = false,
                }
            }
            (SaveTarget::Create { name, rows }, None) => {
                // Nothing came back to adopt; keep the draft as typed.
                self.name = name;
                self.rows = rows;
            }
        }
        Ok(())
    }

    pub fn save(
        &mut self,
        scope: EditScope,
        repository: &mut AnalysisRepository,
    ) -> Result<(), AppError> {
        let pending = self.prepare_save(scope)?;
        let outcome = match &pending.target {
            // No read-back: once the create lands the editor must hold the id,
            // or a retried save would store a second copy.
            SaveTarget::Create { name, rows } => repository
                .insert_analysis(&self.owner_id, name, rows.clone())
                .map(Some),
            SaveTarget::Update { id, patch } => {
                repository.update_analysis(id, patch).map(|()| None)
            }
        };
        self.complete_save(pending, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::{Document, DocumentStore, MemoryDocumentStore, StoreError};

    fn setup() -> (AnalysisRepository, MemoryDocumentStore, AnalysisEditor) {
        let store = MemoryDocumentStore::new();
        let mut repo = AnalysisRepository::new(Box::new(store.clone()));
        let id = repo.create_untitled("u1").unwrap();
        let editor = AnalysisEditor::open(repo.get_analysis_by_id(&id).unwrap());
        (repo, store, editor)
    }

    #[test]
    fn opens_in_view_mode() {
        let (_, _, editor) = setup();
        assert!(!editor.editing_name());
        assert!(!editor.editing_table());
        assert!(!editor.saving());
        assert_eq!(editor.name(), "Untitled");
    }

    #[test]
    fn edits_are_ignored_outside_edit_mode() {
        let (_, _, mut editor) = setup();
        assert!(!editor.set_name("Sneaky"));
        assert!(!editor.set_row_value(PlLine::Revenue, "10"));
        assert_eq!(editor.name(), "Untitled");
        assert_eq!(editor.rows().value(PlLine::Revenue), "");
    }

    #[test]
    fn table_save_round_trips() {
        let (mut repo, _, mut editor) = setup();
        editor.begin_edit_table();
        editor.set_row_value(PlLine::Revenue, "1000");
        editor.set_row_value(PlLine::Cogs, "300");
        editor.set_row_value(PlLine::OperatingExpenses, "200");
        assert_eq!(editor.rows().value(PlLine::NetProfit), "500");

        editor.save(EditScope::Table, &mut repo).unwrap();
        assert!(!editor.editing_table());
        assert!(!editor.saving());

        let id = editor.id().unwrap().to_string();
        let stored = repo.get_analysis_by_id(&id).unwrap();
        assert_eq!(&stored.rows, editor.rows());
        assert_eq!(stored.name, "Untitled");
        assert_eq!(editor.analysis().map(|a| &a.rows), Some(&stored.rows));
    }

    #[test]
    fn name_save_only_touches_the_name() {
        let (mut repo, _, mut editor) = setup();
        editor.begin_edit_table();
        editor.set_row_value(PlLine::Revenue, "42");
        editor.begin_edit_name();
        editor.set_name("  Budget  ");

        editor.save(EditScope::Name, &mut repo).unwrap();
        assert!(!editor.editing_name());
        assert!(editor.editing_table());
        assert_eq!(editor.name(), "Budget");
        assert_eq!(editor.rows().value(PlLine::Revenue), "42");

        let stored = repo.get_analysis_by_id(editor.id().unwrap()).unwrap();
        assert_eq!(stored.name, "Budget");
        assert_eq!(stored.rows, PlTable::empty());
    }

    #[test]
    fn net_profit_cannot_be_typed_into() {
        let (_, _, mut editor) = setup();
        editor.begin_edit_table();
        editor.set_row_value(PlLine::Revenue, "10");
        assert!(!editor.set_row_value(PlLine::NetProfit, "1000000"));
        assert_eq!(editor.rows().value(PlLine::NetProfit), "10");
    }

    #[test]
    fn empty_name_fails_validation_and_keeps_editing() {
        let (mut repo, _, mut editor) = setup();
        editor.begin_edit_name();
        editor.set_name("   ");

        let err = editor.save(EditScope::Name, &mut repo).unwrap_err();
        assert!(matches!(err, AppError::Validation(ValidationError::EmptyName)));
        assert_eq!(editor.name_error(), Some(&ValidationError::EmptyName));
        assert!(editor.editing_name());
        assert!(!editor.saving());
        assert_eq!(editor.name(), "   ");
    }

    #[test]
    fn blank_rows_fail_validation_at_save() {
        let (mut repo, _, mut editor) = setup();
        editor.begin_edit_table();
        assert_eq!(editor.flows().edges.iter().map(|e| e.value).sum::<f64>(), 0.0);

        let err = editor.save(EditScope::Table, &mut repo).unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(ValidationError::InvalidNumber { line: PlLine::Revenue, .. })
        ));
        assert!(editor.table_error().is_some());
        assert!(editor.editing_table());
    }

    #[test]
    fn non_numeric_row_fails_validation() {
        let (mut repo, _, mut editor) = setup();
        editor.begin_edit_table();
        editor.set_row_value(PlLine::Revenue, "100");
        editor.set_row_value(PlLine::Cogs, "ten");
        editor.set_row_value(PlLine::OperatingExpenses, "5");
        assert!(matches!(
            editor.save(EditScope::Table, &mut repo),
            Err(AppError::Validation(ValidationError::InvalidNumber { line: PlLine::Cogs, .. }))
        ));
    }

    #[test]
    fn store_failure_keeps_edits() {
        let (mut repo, store, mut editor) = setup();
        editor.begin_edit_table();
        editor.set_row_value(PlLine::Revenue, "100");
        editor.set_row_value(PlLine::Cogs, "20");
        editor.set_row_value(PlLine::OperatingExpenses, "30");

        store.set_offline(true);
        let err = editor.save(EditScope::Table, &mut repo).unwrap_err();
        assert!(matches!(err, AppError::StoreUnavailable(_)));
        assert!(editor.editing_table());
        assert!(!editor.saving());
        assert_eq!(editor.save_error(), Some("Failed to save analysis."));
        assert_eq!(editor.rows().value(PlLine::NetProfit), "50");
        assert_eq!(editor.analysis().unwrap().rows, PlTable::empty());

        store.set_offline(false);
        editor.save(EditScope::Table, &mut repo).unwrap();
        assert!(!editor.editing_table());
        assert!(editor.save_error().is_none());
    }

    #[test]
    fn cancel_reverts_to_baseline() {
        let (_, _, mut editor) = setup();
        editor.begin_edit_name();
        editor.set_name("Scratch");
        editor.begin_edit_table();
        editor.set_row_value(PlLine::Revenue, "999");

        editor.cancel_name();
        editor.cancel_table();
        assert!(!editor.editing_name());
        assert!(!editor.editing_table());
        assert_eq!(editor.name(), "Untitled");
        assert_eq!(editor.rows(), &PlTable::empty());
    }

    #[test]
    fn saving_flag_spans_the_store_call() {
        let (mut repo, _, mut editor) = setup();
        editor.begin_edit_name();
        editor.set_name("Pending");

        let pending = editor.prepare_save(EditScope::Name).unwrap();
        assert!(editor.saving());

        let outcome = match &pending.target {
            SaveTarget::Update { id, patch } => repo.update_analysis(id, patch).map(|()| None),
            SaveTarget::Create { .. } => unreachable!("editor has a baseline"),
        };
        editor.complete_save(pending, outcome).unwrap();
        assert!(!editor.saving());
        assert_eq!(editor.analysis().unwrap().name, "Pending");
    }

    #[test]
    fn draft_save_creates_the_record() {
        let store = MemoryDocumentStore::new();
        let mut repo = AnalysisRepository::new(Box::new(store.clone()));
        let mut editor = AnalysisEditor::draft("u1");
        assert!(editor.is_new());
        assert!(editor.editing_name() && editor.editing_table());

        editor.set_name("Quick entry");
        editor.set_row_value(PlLine::Revenue, "1000");
        editor.set_row_value(PlLine::Cogs, "300");
        editor.set_row_value(PlLine::OperatingExpenses, "200");
        editor.save(EditScope::Table, &mut repo).unwrap();

        assert!(!editor.is_new());
        assert!(!editor.editing_name() && !editor.editing_table());
        let stored = repo.get_analysis_by_id(editor.id().unwrap()).unwrap();
        assert_eq!(stored.owner_id, "u1");
        assert_eq!(stored.name, "Quick entry");
        assert_eq!(stored.rows.value(PlLine::NetProfit), "500");
    }

    /// Writes go through; every read fails.
    struct WriteOnly(MemoryDocumentStore);

    impl DocumentStore for WriteOnly {
        fn create(&mut self, collection: &str, doc: Document) -> Result<String, StoreError> {
            self.0.create(collection, doc)
        }

        fn get(&self, _: &str, _: &str) -> Result<Option<Document>, StoreError> {
            Err(StoreError::Unavailable("reads are down".to_string()))
        }

        fn update(
            &mut self,
            collection: &str,
            id: &str,
            fields: Document,
        ) -> Result<(), StoreError> {
            self.0.update(collection, id, fields)
        }

        fn query(
            &self,
            _: &str,
            _: &str,
            _: &str,
        ) -> Result<Vec<(String, Document)>, StoreError> {
            Err(StoreError::Unavailable("reads are down".to_string()))
        }
    }

    #[test]
    fn draft_save_needs_no_read_back() {
        let store = MemoryDocumentStore::new();
        let mut repo = AnalysisRepository::new(Box::new(WriteOnly(store.clone())));
        let mut editor = AnalysisEditor::draft("u1");
        editor.set_name("Quick entry");
        editor.set_row_value(PlLine::Revenue, "1000");
        editor.set_row_value(PlLine::Cogs, "300");
        editor.set_row_value(PlLine::OperatingExpenses, "200");

        editor.save(EditScope::Table, &mut repo).unwrap();
        assert!(!editor.is_new());
        assert!(editor.save_error().is_none());
        assert_eq!(editor.analysis().unwrap().name, "Quick entry");

        editor.begin_edit_table();
        editor.set_row_value(PlLine::Revenue, "2000");
        editor.save(EditScope::Table, &mut repo).unwrap();
        assert_eq!(store.len("analyses"), 1);
    }

    #[test]
    fn draft_cancel_clears_but_stays_editing() {
        let mut editor = AnalysisEditor::draft("u1");
        editor.set_name("Half done");
        editor.set_row_value(PlLine::Revenue, "5");
        editor.cancel_name();
        editor.cancel_table();
        assert!(editor.editing_name() && editor.editing_table());
        assert_eq!(editor.name(), "");
        assert_eq!(editor.rows(), &PlTable::empty());
    }

    #[test]
    fn draft_needs_every_row() {
        let store = MemoryDocumentStore::new();
        let mut repo = AnalysisRepository::new(Box::new(store.clone()));
        let mut editor = AnalysisEditor::draft("u1");
        editor.set_name("Partial");
        editor.set_row_value(PlLine::Revenue, "5");

        assert!(matches!(
            editor.save(EditScope::Name, &mut repo),
            Err(AppError::Validation(ValidationError::InvalidNumber { .. }))
        ));
        assert_eq!(store.len("analyses"), 0);
    }
}
