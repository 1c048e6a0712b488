// src/config/analysis.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::PlTable;
use crate::error::ValidationError;

pub const UNTITLED_NAME: &str = "Untitled";
pub const NAME_MAX_LEN: usize = 64;

/// A named, persisted P&L table owned by a single user.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub rows: PlTable,
    pub created_at: DateTime<Utc>,
}

impl Analysis {
    pub fn from_document(id: String, doc: AnalysisDocument) -> Self {
        Self {
            id,
            owner_id: doc.user_id,
            name: doc.name,
            rows: doc.pl_rows,
            created_at: doc.created_at,
        }
    }

    pub fn is_owned_by(&self, uid: &str) -> bool {
        self.owner_id == uid
    }

    /// Applies the fields a successful update wrote.
    pub fn apply(&mut self, patch: &AnalysisPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(rows) = &patch.pl_rows {
            self.rows = rows.clone();
        }
    }
}

/// Stored shape of an analysis in the `analyses` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisDocument {
    pub user_id: String,
    pub name: String,
    pub pl_rows: PlTable,
    pub created_at: DateTime<Utc>,
}

/// Fields to overwrite on an existing analysis; `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pl_rows: Option<PlTable>,
}

impl AnalysisPatch {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn rows(rows: PlTable) -> Self {
        Self {
            pl_rows: Some(rows),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.pl_rows.is_none()
    }
}

/// Trims and checks a user-entered analysis name.
pub fn validate_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if trimmed.chars().count() > NAME_MAX_LEN {
        return Err(ValidationError::NameTooLong { max: NAME_MAX_LEN });
    }
    Ok(trimmed.to_string())
}
