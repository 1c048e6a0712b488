// src/state/mod.rs
use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::analysis::SankeyOptions;
use crate::config::{Analysis, Settings, StorageBackend};
use crate::error::AppError;
use crate::file::{AnalysisRepository, DocumentStore, MemoryDocumentStore, RonDocumentStore};

pub mod editor;
pub mod session;

pub use editor::{AnalysisEditor, EditScope};
pub use session::{Identity, IdentityProvider, LocalIdentityProvider};

// Screen/page tracking
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Screen {
    SignIn,
    Analyses,
    Editor,
}

// Core application state
pub struct AppState {
    pub settings: Settings,
    pub identity: Box<dyn IdentityProvider>,
    pub repository: AnalysisRepository,

    pub current_screen: Screen,
    pub analyses: Vec<Analysis>,
    pub editor: Option<AnalysisEditor>,

    /// Replaces the editor page (not found, not yours, unreadable).
    pub page_error: Option<AppError>,
    /// Transient alert shown in the error modal.
    pub error_message: Option<String>,
}

impl AppState {
    pub fn new(
        settings: Settings,
        identity: Box<dyn IdentityProvider>,
        repository: AnalysisRepository,
    ) -> Self {
        Self {
            settings,
            identity,
            repository,
            current_screen: Screen::SignIn,
            analyses: Vec::new(),
            editor: None,
            page_error: None,
            error_message: None,
        }
    }

    /// Wires the store and identity provider the settings ask for.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let store: Box<dyn DocumentStore> = match settings.storage {
            StorageBackend::File => {
                let dir = settings.resolved_data_dir();
                let store = RonDocumentStore::open(&dir).with_context(|| {
                    format!("Failed to open data directory {}", dir.display())
                })?;
                Box::new(store)
            }
            StorageBackend::Memory => {
                warn!("using in-memory storage; analyses will not survive a restart");
                Box::new(MemoryDocumentStore::new())
            }
        };
        let identity = LocalIdentityProvider::new(Identity::from(&settings.user));
        Ok(Self::new(
            settings,
            Box::new(identity),
            AnalysisRepository::new(store),
        ))
    }

    pub fn current_user(&self) -> Option<&Identity> {
        self.identity.current_user()
    }

    pub fn diagram_options(&self) -> SankeyOptions {
        SankeyOptions::with_size(self.settings.diagram.width, self.settings.diagram.height)
    }

    fn require_user(&self) -> Result<Identity, AppError> {
        self.current_user().cloned().ok_or(AppError::NotSignedIn)
    }

    pub fn sign_in(&mut self) {
        if self.identity.sign_in().is_some() {
            self.show_analyses();
        }
    }

    pub fn sign_out(&mut self) {
        self.identity.sign_out();
        self.analyses.clear();
        self.editor = None;
        self.page_error = None;
        self.current_screen = Screen::SignIn;
    }

    pub fn show_analyses(&mut self) {
        self.editor = None;
        self.page_error = None;
        self.current_screen = Screen::Analyses;
        let refreshed = self.refresh_analyses();
        self.report(refreshed);
    }

    pub fn refresh_analyses(&mut self) -> Result<(), AppError> {
        let user = self.require_user()?;
        self.analyses = self.repository.list_analyses_for_owner(&user.uid)?;
        Ok(())
    }

    /// Persists an "Untitled" analysis right away and opens it.
    pub fn create_new_analysis(&mut self) {
        let result = self
            .require_user()
            .and_then(|user| self.repository.create_untitled(&user.uid));
        match result {
            Ok(id) => self.open_analysis(&id),
            Err(e) => self.error_message = Some(format!("Failed to create analysis. {e}")),
        }
    }

    /// Starts an unsaved analysis in the editor (quick entry).
    pub fn start_draft(&mut self) {
        match self.require_user() {
            Ok(user) => {
                self.editor = Some(AnalysisEditor::draft(user.uid));
                self.page_error = None;
                self.current_screen = Screen::Editor;
            }
            Err(e) => self.report::<()>(Err(e)),
        }
    }

    pub fn open_analysis(&mut self, id: &str) {
        self.current_screen = Screen::Editor;
        match self.load_authorized(id) {
            Ok(analysis) => {
                self.editor = Some(AnalysisEditor::open(analysis));
                self.page_error = None;
            }
            Err(e) if e.is_page_level() => {
                warn!(id, error = %e, "cannot open analysis");
                self.editor = None;
                self.page_error = Some(e);
            }
            Err(e) => {
                self.current_screen = Screen::Analyses;
                self.report::<()>(Err(e));
            }
        }
    }

    /// Fetches a record and checks it belongs to the signed-in user.
    pub fn load_authorized(&self, id: &str) -> Result<Analysis, AppError> {
        let user = self.require_user()?;
        let analysis = self.repository.get_analysis_by_id(id)?;
        authorize(analysis, &user)
    }

    pub fn save_editor(&mut self, scope: EditScope) {
        let Some(editor) = self.editor.as_mut() else {
            return;
        };
        match editor.save(scope, &mut self.repository) {
            Ok(()) => info!(id = ?editor.id(), ?scope, "saved analysis"),
            // Shown inline next to the field.
            Err(AppError::Validation(_)) => {}
            Err(e) => self.error_message = Some(e.to_string()),
        }
    }

    fn report<T>(&mut self, result: Result<T, AppError>) {
        if let Err(e) = result {
            self.error_message = Some(e.to_string());
        }
    }
}

/// Only the owner ever sees a record.
pub fn authorize(analysis: Analysis, user: &Identity) -> Result<Analysis, AppError> {
    if analysis.is_owned_by(&user.uid) {
        Ok(analysis)
    } else {
        Err(AppError::Unauthorized { id: analysis.id })
    }
}
