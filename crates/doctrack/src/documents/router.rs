use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::filters::{AlertFilter, DocumentFilter};
use super::registration::{RegistrationPayload, ValidationError};
use super::service::{DocumentService, DocumentServiceError};
use super::views::AlertConfigurationView;
use crate::store::{DocumentStore, StoreError};

/// Router builder exposing the listing, registration, and alert endpoints.
///
/// `/documentos` and `/home` accept the legacy paths and Portuguese request keys. Responses
/// always use the current field names (`title`, `related`, `upcoming`, `error`).
pub fn document_router<S>(service: Arc<DocumentService<S>>) -> Router
where
    S: DocumentStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/documents",
            get(list_handler::<S>).post(register_handler::<S>),
        )
        .route(
            "/documentos",
            get(list_handler::<S>).post(register_handler::<S>),
        )
        .route("/api/v1/alerts", get(alerts_handler::<S>))
        .route("/home", get(alerts_handler::<S>))
        .route("/api/v1/alerts/report.csv", get(report_handler::<S>))
        .route("/api/v1/branches", get(branches_handler::<S>))
        .route("/api/v1/document-types", get(document_types_handler::<S>))
        .route(
            "/api/v1/alert-parameters",
            get(alert_parameters_handler::<S>),
        )
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub struct DocumentListParams {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, alias = "titulo")]
    pub title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AlertListParams {
    #[serde(default, alias = "categoria")]
    pub category: Option<String>,
    #[serde(default, alias = "inicio")]
    pub start: Option<String>,
    #[serde(default, alias = "fim")]
    pub end: Option<String>,
    #[serde(default)]
    pub month: Option<String>,
}

impl AlertListParams {
    fn to_filter(&self) -> Result<AlertFilter, ValidationError> {
        AlertFilter::parse(
            self.category.as_deref(),
            self.start.as_deref(),
            self.end.as_deref(),
            self.month.as_deref(),
        )
    }
}

pub(crate) fn error_response(err: DocumentServiceError) -> Response {
    let status = match &err {
        DocumentServiceError::Validation(_) => StatusCode::BAD_REQUEST,
        DocumentServiceError::Storage(_) | DocumentServiceError::Export(_) => {
            error!(error = %err, "document request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = json!({
        "error": err.to_string(),
        "code": err.code(),
    });
    (status, Json(payload)).into_response()
}

// Store calls block on the SQLite connection, so they run on the blocking pool.
async fn run_blocking<S, T, F>(
    service: Arc<DocumentService<S>>,
    work: F,
) -> Result<T, DocumentServiceError>
where
    S: DocumentStore + 'static,
    T: Send + 'static,
    F: FnOnce(&DocumentService<S>) -> Result<T, DocumentServiceError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || work(&service))
        .await
        .map_err(|err| {
            DocumentServiceError::Storage(StoreError::Unavailable(format!(
                "storage task failed: {err}"
            )))
        })?
}

pub(crate) async fn list_handler<S>(
    State(service): State<Arc<DocumentService<S>>>,
    Query(params): Query<DocumentListParams>,
) -> Response
where
    S: DocumentStore + 'static,
{
    let filter = match DocumentFilter::parse(params.status.as_deref(), params.title.as_deref()) {
        Ok(filter) => filter,
        Err(err) => return error_response(err.into()),
    };

    let result = run_blocking(service, move |service| {
        service.list_documents(&filter, service.today())
    })
    .await;
    match result {
        Ok(documents) => (StatusCode::OK, Json(documents)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn register_handler<S>(
    State(service): State<Arc<DocumentService<S>>>,
    payload: Result<Json<RegistrationPayload>, JsonRejection>,
) -> Response
where
    S: DocumentStore + 'static,
{
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return error_response(ValidationError::MalformedPayload(rejection.body_text()).into())
        }
    };

    let result = run_blocking(service, move |service| {
        service.register_document(payload, service.today())
    })
    .await;
    match result {
        Ok(receipt) => (StatusCode::CREATED, Json(receipt)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn alerts_handler<S>(
    State(service): State<Arc<DocumentService<S>>>,
    Query(params): Query<AlertListParams>,
) -> Response
where
    S: DocumentStore + 'static,
{
    let filter = match params.to_filter() {
        Ok(filter) => filter,
        Err(err) => return error_response(err.into()),
    };

    let result = run_blocking(service, move |service| {
        service.list_alerts(&filter, service.today())
    })
    .await;
    match result {
        Ok(alerts) => (StatusCode::OK, Json(alerts)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn report_handler<S>(
    State(service): State<Arc<DocumentService<S>>>,
    Query(params): Query<AlertListParams>,
) -> Response
where
    S: DocumentStore + 'static,
{
    let filter = match params.to_filter() {
        Ok(filter) => filter,
        Err(err) => return error_response(err.into()),
    };

    let today = service.today();
    let reference = filter.start.unwrap_or(today);
    let result = run_blocking(service, move |service| service.alert_report_csv(&filter, today)).await;
    match result {
        Ok(csv) => {
            let disposition = format!(
                "attachment; filename=\"alert_report_{}.csv\"",
                reference.format("%Y_%m")
            );
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                csv,
            )
                .into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn branches_handler<S>(State(service): State<Arc<DocumentService<S>>>) -> Response
where
    S: DocumentStore + 'static,
{
    match run_blocking(service, |service| service.list_branches()).await {
        Ok(branches) => (StatusCode::OK, Json(branches)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn document_types_handler<S>(
    State(service): State<Arc<DocumentService<S>>>,
) -> Response
where
    S: DocumentStore + 'static,
{
    match run_blocking(service, |service| service.list_document_types()).await {
        Ok(types) => (StatusCode::OK, Json(types)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn alert_parameters_handler<S>(
    State(service): State<Arc<DocumentService<S>>>,
) -> Response
where
    S: DocumentStore + 'static,
{
    let view = run_blocking(service, |service| {
        Ok(AlertConfigurationView::from(&service.alert_configuration()))
    })
    .await;
    match view {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}
