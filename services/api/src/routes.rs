use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use doctrack::documents::{document_router, DocumentService};
use doctrack::store::DocumentStore;
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_document_routes<S>(service: Arc<DocumentService<S>>) -> axum::Router
where
    S: DocumentStore + 'static,
{
    document_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::NaiveDate;
    use doctrack::documents::Clock;
    use doctrack::store::{seed_reference_data, SqliteDocumentStore};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    fn app(ready: bool) -> (axum::Router, Arc<AtomicBool>) {
        let store = SqliteDocumentStore::open_in_memory().expect("store opens");
        seed_reference_data(&store).expect("seed succeeds");
        let today = NaiveDate::from_ymd_opt(2026, 10, 14).expect("valid date");
        let service = Arc::new(DocumentService::with_clock(
            Arc::new(store),
            Clock::Fixed(today),
        ));

        let readiness = Arc::new(AtomicBool::new(ready));
        let state = AppState {
            readiness: readiness.clone(),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        let router = with_document_routes(service).layer(Extension(state));
        (router, readiness)
    }

    async fn status_of(router: axum::Router, uri: &str) -> StatusCode {
        router
            .oneshot(Request::get(uri).body(Body::empty()).expect("request builds"))
            .await
            .expect("route executes")
            .status()
    }

    #[tokio::test]
    async fn readiness_follows_the_startup_flag() {
        let (router, readiness) = app(false);
        assert_eq!(
            status_of(router.clone(), "/ready").await,
            StatusCode::SERVICE_UNAVAILABLE
        );

        readiness.store(true, Ordering::Release);
        assert_eq!(status_of(router, "/ready").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn operational_and_document_routes_share_one_router() {
        let (router, _) = app(true);
        assert_eq!(status_of(router.clone(), "/health").await, StatusCode::OK);
        assert_eq!(status_of(router.clone(), "/metrics").await, StatusCode::OK);
        assert_eq!(
            status_of(router.clone(), "/api/v1/branches").await,
            StatusCode::OK
        );
        assert_eq!(status_of(router, "/home?month=2026-10").await, StatusCode::OK);
    }
}
