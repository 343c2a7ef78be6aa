use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::{debug, error, info};

use super::classifier::AlertConfiguration;
use super::domain::{
    Branch, DocumentId, DocumentRecord, DocumentStatus, DocumentType, NewDocument,
};
use super::export::render_alert_report;
use super::filters::{AlertFilter, DocumentFilter};
use super::registration::{RegistrationPayload, ValidationError};
use super::views::{AlertsView, DocumentView, RegistrationReceipt};
use crate::store::{DocumentStore, StatusChange, StoreError};

/// Source of "today" for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clock {
    System,
    Fixed(NaiveDate),
}

impl Clock {
    pub fn today(self) -> NaiveDate {
        match self {
            Clock::System => Local::now().date_naive(),
            Clock::Fixed(date) => date,
        }
    }
}

/// Service composing the store, the classifier, and the recompute-on-read cycle.
pub struct DocumentService<S> {
    store: Arc<S>,
    clock: Clock,
}

impl<S> DocumentService<S>
where
    S: DocumentStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self::with_clock(store, Clock::System)
    }

    pub fn with_clock(store: Arc<S>, clock: Clock) -> Self {
        Self { store, clock }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn alert_configuration(&self) -> AlertConfiguration {
        AlertConfiguration::resolve(self.store.as_ref())
    }

    /// List documents, refreshing stale statuses before the status filter is applied.
    pub fn list_documents(
        &self,
        filter: &DocumentFilter,
        today: NaiveDate,
    ) -> Result<Vec<DocumentView>, DocumentServiceError> {
        let mut records = self.store.documents(&filter.to_query())?;
        self.refresh_statuses(&mut records, today)?;

        Ok(records
            .iter()
            .filter(|record| filter.matches(record.document.status))
            .map(DocumentView::from_record)
            .collect())
    }

    /// Validate and persist a new document with its initial status.
    pub fn register_document(
        &self,
        payload: RegistrationPayload,
        today: NaiveDate,
    ) -> Result<RegistrationReceipt, DocumentServiceError> {
        let document = payload.validate()?;
        self.ensure_references(&document)?;

        let status = self
            .alert_configuration()
            .classify(document.effective_expiration(), today);
        let id = self.store.insert_document(&document, status)?;

        info!(id = id.0, status = status.code(), "document registered");
        Ok(RegistrationReceipt {
            id,
            status,
            status_label: status.label(),
        })
    }

    /// Documents in the requested window plus the subset needing renewal attention.
    ///
    /// `upcoming` lists expired documents first, then by expiration date.
    pub fn list_alerts(
        &self,
        filter: &AlertFilter,
        today: NaiveDate,
    ) -> Result<AlertsView, DocumentServiceError> {
        let mut records = self.store.documents(&filter.to_query())?;
        self.refresh_statuses(&mut records, today)?;

        let related = records.iter().map(DocumentView::from_record).collect();

        let mut attention: Vec<&DocumentRecord> = records
            .iter()
            .filter(|record| record.document.status.needs_attention())
            .collect();
        attention.sort_by_key(|record| {
            (
                record.document.status != DocumentStatus::Expired,
                record.document.effective_expiration(),
                record.document.id,
            )
        });
        let upcoming = attention
            .into_iter()
            .map(DocumentView::from_record)
            .collect();

        Ok(AlertsView { related, upcoming })
    }

    /// CSV rendering of the `upcoming` alerts.
    pub fn alert_report_csv(
        &self,
        filter: &AlertFilter,
        today: NaiveDate,
    ) -> Result<String, DocumentServiceError> {
        let alerts = self.list_alerts(filter, today)?;
        render_alert_report(&alerts.upcoming)
            .map_err(|err| DocumentServiceError::Export(err.to_string()))
    }

    pub fn list_branches(&self) -> Result<Vec<Branch>, DocumentServiceError> {
        Ok(self.store.branches()?)
    }

    pub fn list_document_types(&self) -> Result<Vec<DocumentType>, DocumentServiceError> {
        Ok(self.store.document_types()?)
    }

    /// Reclassify `records` in place and persist every change in one commit.
    ///
    /// Returns the number of rows written; 0 when every stored status was already current.
    pub fn refresh_statuses(
        &self,
        records: &mut [DocumentRecord],
        today: NaiveDate,
    ) -> Result<usize, DocumentServiceError> {
        let config = self.alert_configuration();
        let changes = pending_status_changes(records, &config, today);
        if changes.is_empty() {
            return Ok(0);
        }

        for change in &changes {
            debug!(
                id = change.id.0,
                previous = change.previous.code(),
                status = change.status.code(),
                "document status changed"
            );
        }

        let written = self.store.update_statuses(&changes).map_err(|err| {
            error!(error = %err, changes = changes.len(), "status refresh commit failed");
            err
        })?;

        let fresh: HashMap<DocumentId, DocumentStatus> = changes
            .iter()
            .map(|change| (change.id, change.status))
            .collect();
        for record in records.iter_mut() {
            if let Some(status) = fresh.get(&record.document.id) {
                record.document.status = *status;
            }
        }

        info!(written, horizon_days = config.horizon_days(), "document statuses refreshed");
        Ok(written)
    }

    fn ensure_references(&self, document: &NewDocument) -> Result<(), DocumentServiceError> {
        if self.store.branch(document.branch_id)?.is_none() {
            return Err(ValidationError::UnknownReference {
                entity: "branch",
                id: document.branch_id.0,
            }
            .into());
        }
        if self.store.document_type(document.type_id)?.is_none() {
            return Err(ValidationError::UnknownReference {
                entity: "document type",
                id: document.type_id.0,
            }
            .into());
        }
        Ok(())
    }
}

/// Changes needed to bring `records` in line with `config` as of `today`.
pub fn pending_status_changes(
    records: &[DocumentRecord],
    config: &AlertConfiguration,
    today: NaiveDate,
) -> Vec<StatusChange> {
    records
        .iter()
        .filter_map(|record| {
            let document = &record.document;
            let status = config.classify(document.effective_expiration(), today);
            (status != document.status).then_some(StatusChange {
                id: document.id,
                previous: document.status,
                status,
            })
        })
        .collect()
}

/// Error raised by the document service.
#[derive(Debug, thiserror::Error)]
pub enum DocumentServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] StoreError),
    #[error("report export failed: {0}")]
    Export(String),
}

impl DocumentServiceError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(err) => err.code(),
            Self::Storage(_) => "storage_error",
            Self::Export(_) => "export_error",
        }
    }
}
