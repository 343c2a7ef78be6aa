use crate::cli::ServeArgs;
use crate::infra::{open_store, AppState};
use crate::routes::with_document_routes;
use axum::http::HeaderValue;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use doctrack::config::{AppConfig, ConfigError, CorsConfig, DatabaseConfig};
use doctrack::documents::DocumentService;
use doctrack::error::AppError;
use doctrack::store::seed_reference_data;
use doctrack::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(path) = args.database.take() {
        config.database = DatabaseConfig::new(path)?;
    }

    telemetry::init(config.environment, &config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = open_store(&config.database)?;
    if config.database.is_in_memory() {
        seed_reference_data(&store)?;
    }
    let document_service = Arc::new(DocumentService::new(Arc::new(store)));

    let app = with_document_routes(document_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer)
        .layer(cors_layer(&config.cors)?);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        database = %config.database.path.display(),
        "document tracking service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

fn cors_layer(config: &CorsConfig) -> Result<CorsLayer, ConfigError> {
    if config.allows_any() {
        return Ok(CorsLayer::permissive());
    }

    let origins = config
        .allowed_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|_| ConfigError::InvalidCorsOrigin {
                origin: origin.clone(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any))
}
