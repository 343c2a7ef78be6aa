use chrono::NaiveDate;
use doctrack::config::{AppConfig, DatabaseConfig};
use doctrack::documents::{parse_month, AlertFilter};
use doctrack::error::AppError;
use doctrack::store::{SqliteDocumentStore, StoreError};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// `YYYY-MM` month accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ReferenceMonth {
    pub(crate) year: i32,
    pub(crate) month: u32,
}

impl ReferenceMonth {
    pub(crate) fn window(self) -> Option<AlertFilter> {
        AlertFilter::for_month(self.year, self.month)
    }
}

pub(crate) fn parse_reference_month(raw: &str) -> Result<ReferenceMonth, String> {
    parse_month(raw)
        .map(|(year, month)| ReferenceMonth { year, month })
        .map_err(|err| err.to_string())
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

/// Configured database location, with an optional command-line override.
pub(crate) fn database_config(path: Option<PathBuf>) -> Result<DatabaseConfig, AppError> {
    match path {
        Some(path) => Ok(DatabaseConfig::new(path)?),
        None => Ok(AppConfig::load()?.database),
    }
}

pub(crate) fn open_store(config: &DatabaseConfig) -> Result<SqliteDocumentStore, StoreError> {
    let store = if config.is_in_memory() {
        SqliteDocumentStore::open_in_memory()?
    } else {
        SqliteDocumentStore::open(&config.path)?
    };
    info!(path = %config.path.display(), "document store opened");
    Ok(store)
}
