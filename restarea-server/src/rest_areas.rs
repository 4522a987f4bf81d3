//! Rest-area candidate catalog loaded from disk.

use std::collections::HashSet;
use std::path::Path;

use thiserror::Error;
use tracing::{info, warn};

use crate::domain::RestAreaCandidate;

#[derive(Debug, Error)]
pub enum RestAreaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {message}")]
    Json { message: String },
}

/// Read-only list of rest-area candidates.
#[derive(Debug, Clone, Default)]
pub struct RestAreaCatalog {
    candidates: Vec<RestAreaCandidate>,
}

impl RestAreaCatalog {
    /// Build from records, keeping the first record for each id.
    pub fn new(records: Vec<RestAreaCandidate>) -> Self {
        let mut seen = HashSet::new();
        let total = records.len();
        let candidates: Vec<RestAreaCandidate> = records
            .into_iter()
            .filter(|c| seen.insert(c.id.clone()))
            .collect();
        if candidates.len() < total {
            warn!(duplicates = total - candidates.len(), "dropped duplicate rest-area ids");
        }
        Self { candidates }
    }

    /// Load a JSON array of candidates.
    pub fn load(path: &Path) -> Result<Self, RestAreaError> {
        let contents = std::fs::read_to_string(path)?;
        let records: Vec<RestAreaCandidate> =
            serde_json::from_str(&contents).map_err(|e| RestAreaError::Json {
                message: format!("{}: {}", path.display(), e),
            })?;
        let catalog = Self::new(records);
        info!(path = %path.display(), count = catalog.len(), "loaded rest areas");
        Ok(catalog)
    }

    pub fn candidates(&self) -> &[RestAreaCandidate] {
        &self.candidates
    }

    pub fn get(&self, id: &str) -> Option<&RestAreaCandidate> {
        self.candidates.iter().find(|c| c.id == id)
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}
