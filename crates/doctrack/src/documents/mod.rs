//! Document registration, expiration classification, and renewal alerts.
//!
//! Stored statuses are a cache of [`classifier::classify`]. Every listing recomputes them
//! against today's date and writes back only the rows whose classification moved.

pub mod classifier;
pub mod domain;
pub mod export;
pub mod filters;
pub mod registration;
pub mod router;
pub mod service;
pub mod views;

#[cfg(test)]
mod tests;

pub use classifier::{
    classify, AlertConfiguration, ConfigurationLookupError, HorizonSource, DEFAULT_HORIZON_DAYS,
};
pub use domain::{
    AlertParameters, Branch, BranchId, Document, DocumentId, DocumentRecord, DocumentStatus,
    DocumentType, DocumentTypeId, NewDocument, UnknownStatus, DEFAULT_VERSION,
};
pub use export::{render_alert_report, write_alert_report};
pub use filters::{parse_month, AlertFilter, DocumentFilter};
pub use registration::{RegistrationPayload, ValidationError, DATE_FORMAT};
pub use router::document_router;
pub use service::{pending_status_changes, Clock, DocumentService, DocumentServiceError};
pub use views::{
    AlertConfigurationView, AlertsView, DocumentView, RegistrationReceipt, NO_EXPIRATION_SENTINEL,
};
