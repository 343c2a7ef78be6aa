//! Relational storage for documents and their lookup tables.

mod seed;
mod sqlite;

use chrono::NaiveDate;

use crate::documents::domain::{
    AlertParameters, Branch, BranchId, DocumentId, DocumentRecord, DocumentStatus, DocumentType,
    DocumentTypeId, NewDocument,
};

pub use seed::{seed_reference_data, SeedReport};
pub use sqlite::{open_database, open_memory_database, run_migrations, SqliteDocumentStore};

/// Error enumeration for storage failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("migration {version} failed: {reason}")]
    MigrationFailed { version: i64, reason: String },
    #[error("invalid stored value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Equality/range filters pushed down to storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentQuery {
    /// Case-insensitive substring match on the title.
    pub title_contains: Option<String>,
    pub category: Option<String>,
    pub expires_from: Option<NaiveDate>,
    pub expires_until: Option<NaiveDate>,
}

/// A freshly classified status that differs from the stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub id: DocumentId,
    pub previous: DocumentStatus,
    pub status: DocumentStatus,
}

/// Storage abstraction so the service module can be exercised in isolation.
pub trait DocumentStore: Send + Sync {
    fn documents(&self, query: &DocumentQuery) -> Result<Vec<DocumentRecord>, StoreError>;
    fn insert_document(
        &self,
        document: &NewDocument,
        status: DocumentStatus,
    ) -> Result<DocumentId, StoreError>;
    /// Persists every change in one transaction; nothing is written if any update fails.
    fn update_statuses(&self, changes: &[StatusChange]) -> Result<usize, StoreError>;
    fn branches(&self) -> Result<Vec<Branch>, StoreError>;
    fn branch(&self, id: BranchId) -> Result<Option<Branch>, StoreError>;
    fn document_types(&self) -> Result<Vec<DocumentType>, StoreError>;
    fn document_type(&self, id: DocumentTypeId) -> Result<Option<DocumentType>, StoreError>;
    /// First row of the parameters table, if any.
    fn alert_parameters(&self) -> Result<Option<AlertParameters>, StoreError>;
}
