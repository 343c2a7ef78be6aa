use serde::Serialize;

use super::classifier::{AlertConfiguration, HorizonSource};
use super::domain::{DocumentId, DocumentRecord, DocumentStatus};

/// Shown in place of an expiration date for documents that never expire.
pub const NO_EXPIRATION_SENTINEL: &str = "Sem Validade";

/// Row handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentView {
    pub id: DocumentId,
    pub title: String,
    pub responsible: String,
    pub branch: String,
    pub document_type: String,
    pub expiration: String,
    pub status: DocumentStatus,
    pub status_label: &'static str,
}

impl DocumentView {
    pub fn from_record(record: &DocumentRecord) -> Self {
        let document = &record.document;
        let expiration = document
            .effective_expiration()
            .map(|date| date.to_string())
            .unwrap_or_else(|| NO_EXPIRATION_SENTINEL.to_string());

        Self {
            id: document.id,
            title: document.title.clone(),
            responsible: document.responsible.clone(),
            branch: record.branch_name.clone().unwrap_or_default(),
            document_type: record.type_name.clone().unwrap_or_default(),
            expiration,
            status: document.status,
            status_label: document.status.label(),
        }
    }
}

/// Alerts dashboard payload; `upcoming` is the subset of `related` needing attention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertsView {
    pub related: Vec<DocumentView>,
    pub upcoming: Vec<DocumentView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationReceipt {
    pub id: DocumentId,
    pub status: DocumentStatus,
    pub status_label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertConfigurationView {
    pub horizons: Vec<i64>,
    pub horizon_days: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify_at: Option<String>,
    pub source: HorizonSource,
}

impl From<&AlertConfiguration> for AlertConfigurationView {
    fn from(config: &AlertConfiguration) -> Self {
        Self {
            horizons: config.horizons().to_vec(),
            horizon_days: config.horizon_days(),
            notify_at: config.notify_at().map(|time| time.format("%H:%M").to_string()),
            source: config.source(),
        }
    }
}
