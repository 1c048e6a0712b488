// src/config/mod.rs
pub mod pl;
pub mod analysis;
pub mod settings;

// Re-export commonly used types
pub use pl::{PlLine, PlTable};
pub use analysis::{Analysis, AnalysisDocument, AnalysisPatch, validate_name, UNTITLED_NAME};
pub use settings::{Settings, StorageBackend};
