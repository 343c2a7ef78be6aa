use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::documents::domain::{
    AlertParameters, Branch, BranchId, Document, DocumentId, DocumentRecord, DocumentStatus,
    DocumentType, DocumentTypeId, NewDocument, DEFAULT_VERSION,
};
use crate::documents::registration::RegistrationPayload;
use crate::documents::service::{Clock, DocumentService};
use crate::store::{DocumentQuery, DocumentStore, StatusChange, StoreError};

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 14).expect("valid date")
}

pub(super) fn days_from_today(days: i64) -> NaiveDate {
    today() + chrono::Duration::days(days)
}

pub(super) fn payload(title: &str, expires_on: Option<NaiveDate>) -> RegistrationPayload {
    RegistrationPayload {
        title: Some(title.to_string()),
        responsible: Some("João da Silva".to_string()),
        branch_id: Some(1),
        type_id: Some(2),
        expires_on: expires_on.map(|date| date.to_string()),
        ..RegistrationPayload::default()
    }
}

pub(super) fn build_service(store: MemoryStore) -> (DocumentService<MemoryStore>, Arc<MemoryStore>) {
    let store = Arc::new(store);
    let service = DocumentService::with_clock(store.clone(), Clock::Fixed(today()));
    (service, store)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) async fn read_text_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf-8 body")
}

#[derive(Default)]
struct MemoryState {
    branches: Vec<Branch>,
    document_types: Vec<DocumentType>,
    documents: Vec<Document>,
    alert_parameters: Option<AlertParameters>,
}

/// In-memory store that counts every status row it writes.
#[derive(Default)]
pub(super) struct MemoryStore {
    state: Mutex<MemoryState>,
    status_writes: AtomicUsize,
}

impl MemoryStore {
    /// One branch, two document types, horizons `[15, 30]`.
    pub(super) fn with_reference_data() -> Self {
        let store = Self::default();
        {
            let mut state = store.state.lock().expect("store mutex poisoned");
            state.branches.push(Branch {
                id: BranchId(1),
                name: "Matriz São Paulo".to_string(),
                code: "SP01".to_string(),
            });
            state.document_types.push(DocumentType {
                id: DocumentTypeId(1),
                category: "Regulatórios".to_string(),
                name: "CNPJ".to_string(),
                mandatory: true,
                default_validity_days: None,
            });
            state.document_types.push(DocumentType {
                id: DocumentTypeId(2),
                category: "Veículos".to_string(),
                name: "ANTT".to_string(),
                mandatory: true,
                default_validity_days: Some(365),
            });
        }
        store.set_alert_days(Some("[15, 30]"));
        store
    }

    pub(super) fn set_alert_days(&self, raw: Option<&str>) {
        let mut state = self.state.lock().expect("store mutex poisoned");
        state.alert_parameters = raw.map(|raw| AlertParameters {
            id: 1,
            alert_days_json: raw.to_string(),
            notify_at: None,
        });
    }

    /// Insert a row with an arbitrary stored status, as an older process would have left it.
    pub(super) fn seed_document(
        &self,
        title: &str,
        type_id: i64,
        expires_on: Option<NaiveDate>,
        status: DocumentStatus,
    ) -> DocumentId {
        let mut state = self.state.lock().expect("store mutex poisoned");
        let id = DocumentId(state.documents.len() as i64 + 1);
        state.documents.push(Document {
            id,
            branch_id: BranchId(1),
            type_id: DocumentTypeId(type_id),
            title: title.to_string(),
            number: None,
            responsible: "Qualidade".to_string(),
            issued_on: None,
            expires_on,
            no_expiration: false,
            issuing_authority: None,
            notes: None,
            file_path: None,
            version: DEFAULT_VERSION.to_string(),
            status,
        });
        id
    }

    pub(super) fn stored_status(&self, id: DocumentId) -> Option<DocumentStatus> {
        let state = self.state.lock().expect("store mutex poisoned");
        state
            .documents
            .iter()
            .find(|document| document.id == id)
            .map(|document| document.status)
    }

    pub(super) fn status_writes(&self) -> usize {
        self.status_writes.load(Ordering::SeqCst)
    }

    fn record(state: &MemoryState, document: &Document) -> DocumentRecord {
        let branch = state
            .branches
            .iter()
            .find(|branch| branch.id == document.branch_id);
        let document_type = state
            .document_types
            .iter()
            .find(|document_type| document_type.id == document.type_id);

        DocumentRecord {
            document: document.clone(),
            branch_name: branch.map(|branch| branch.name.clone()),
            type_name: document_type.map(|document_type| document_type.name.clone()),
            category: document_type.map(|document_type| document_type.category.clone()),
        }
    }
}

impl DocumentStore for MemoryStore {
    fn documents(&self, query: &DocumentQuery) -> Result<Vec<DocumentRecord>, StoreError> {
        let state = self.state.lock().expect("store mutex poisoned");
        let title = query.title_contains.as_deref().map(str::to_lowercase);

        Ok(state
            .documents
            .iter()
            .map(|document| Self::record(&state, document))
            .filter(|record| {
                title
                    .as_deref()
                    .map_or(true, |needle| record.document.title.to_lowercase().contains(needle))
            })
            .filter(|record| {
                query
                    .category
                    .as_deref()
                    .map_or(true, |category| record.category.as_deref() == Some(category))
            })
            .filter(|record| {
                let expires_on = record.document.effective_expiration();
                let after_start = query
                    .expires_from
                    .map_or(true, |from| expires_on.is_some_and(|date| date >= from));
                let before_end = query
                    .expires_until
                    .map_or(true, |until| expires_on.is_some_and(|date| date <= until));
                after_start && before_end
            })
            .collect())
    }

    fn insert_document(
        &self,
        document: &NewDocument,
        status: DocumentStatus,
    ) -> Result<DocumentId, StoreError> {
        let mut state = self.state.lock().expect("store mutex poisoned");
        let id = DocumentId(state.documents.len() as i64 + 1);
        state.documents.push(Document {
            id,
            branch_id: document.branch_id,
            type_id: document.type_id,
            title: document.title.clone(),
            number: document.number.clone(),
            responsible: document.responsible.clone(),
            issued_on: document.issued_on,
            expires_on: document.expires_on,
            no_expiration: document.no_expiration,
            issuing_authority: document.issuing_authority.clone(),
            notes: document.notes.clone(),
            file_path: document.file_path.clone(),
            version: DEFAULT_VERSION.to_string(),
            status,
        });
        Ok(id)
    }

    fn update_statuses(&self, changes: &[StatusChange]) -> Result<usize, StoreError> {
        let mut state = self.state.lock().expect("store mutex poisoned");
        let mut written = 0;
        for change in changes {
            if let Some(document) = state
                .documents
                .iter_mut()
                .find(|document| document.id == change.id)
            {
                document.status = change.status;
                written += 1;
            }
        }
        self.status_writes.fetch_add(written, Ordering::SeqCst);
        Ok(written)
    }

    fn branches(&self) -> Result<Vec<Branch>, StoreError> {
        Ok(self.state.lock().expect("store mutex poisoned").branches.clone())
    }

    fn branch(&self, id: BranchId) -> Result<Option<Branch>, StoreError> {
        let state = self.state.lock().expect("store mutex poisoned");
        Ok(state.branches.iter().find(|branch| branch.id == id).cloned())
    }

    fn document_types(&self) -> Result<Vec<DocumentType>, StoreError> {
        Ok(self
            .state
            .lock()
            .expect("store mutex poisoned")
            .document_types
            .clone())
    }

    fn document_type(&self, id: DocumentTypeId) -> Result<Option<DocumentType>, StoreError> {
        let state = self.state.lock().expect("store mutex poisoned");
        Ok(state
            .document_types
            .iter()
            .find(|document_type| document_type.id == id)
            .cloned())
    }

    fn alert_parameters(&self) -> Result<Option<AlertParameters>, StoreError> {
        Ok(self
            .state
            .lock()
            .expect("store mutex poisoned")
            .alert_parameters
            .clone())
    }
}

/// Store whose every call fails, as when the database file is unreachable.
pub(super) struct UnavailableStore;

fn unavailable<T>() -> Result<T, StoreError> {
    Err(StoreError::Unavailable("database is locked".to_string()))
}

impl DocumentStore for UnavailableStore {
    fn documents(&self, _query: &DocumentQuery) -> Result<Vec<DocumentRecord>, StoreError> {
        unavailable()
    }

    fn insert_document(
        &self,
        _document: &NewDocument,
        _status: DocumentStatus,
    ) -> Result<DocumentId, StoreError> {
        unavailable()
    }

    fn update_statuses(&self, _changes: &[StatusChange]) -> Result<usize, StoreError> {
        unavailable()
    }

    fn branches(&self) -> Result<Vec<Branch>, StoreError> {
        unavailable()
    }

    fn branch(&self, _id: BranchId) -> Result<Option<Branch>, StoreError> {
        unavailable()
    }

    fn document_types(&self) -> Result<Vec<DocumentType>, StoreError> {
        unavailable()
    }

    fn document_type(&self, _id: DocumentTypeId) -> Result<Option<DocumentType>, StoreError> {
        unavailable()
    }

    fn alert_parameters(&self) -> Result<Option<AlertParameters>, StoreError> {
        unavailable()
    }
}

/// Reads succeed but the status refresh commit fails.
pub(super) struct FailingCommitStore {
    pub(super) inner: MemoryStore,
}

impl DocumentStore for FailingCommitStore {
    fn documents(&self, query: &DocumentQuery) -> Result<Vec<DocumentRecord>, StoreError> {
        self.inner.documents(query)
    }

    fn insert_document(
        &self,
        document: &NewDocument,
        status: DocumentStatus,
    ) -> Result<DocumentId, StoreError> {
        self.inner.insert_document(document, status)
    }

    fn update_statuses(&self, _changes: &[StatusChange]) -> Result<usize, StoreError> {
        Err(StoreError::Unavailable("commit rejected".to_string()))
    }

    fn branches(&self) -> Result<Vec<Branch>, StoreError> {
        self.inner.branches()
    }

    fn branch(&self, id: BranchId) -> Result<Option<Branch>, StoreError> {
        self.inner.branch(id)
    }

    fn document_types(&self) -> Result<Vec<DocumentType>, StoreError> {
        self.inner.document_types()
    }

    fn document_type(&self, id: DocumentTypeId) -> Result<Option<DocumentType>, StoreError> {
        self.inner.document_type(id)
    }

    fn alert_parameters(&self) -> Result<Option<AlertParameters>, StoreError> {
        self.inner.alert_parameters()
    }
}
