use chrono::NaiveTime;
use serde::Serialize;
use tracing::info;

use super::{DocumentStore, SqliteDocumentStore, StoreError};

/// Lookup rows the registration form and dashboard expect on a fresh install.
const REFERENCE_BRANCHES: [(&str, &str); 1] = [("Matriz São Paulo", "SP01")];

const REFERENCE_DOCUMENT_TYPES: [(&str, &str, bool, Option<i64>); 3] = [
    ("Regulatórios", "CNPJ", true, None),
    ("Veículos", "ANTT", true, Some(365)),
    ("Pessoas", "CNH", true, Some(1825)),
];

const REFERENCE_HORIZONS: [i64; 3] = [15, 30, 60];

/// Rows inserted by [`seed_reference_data`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub branches: usize,
    pub document_types: usize,
    pub alert_parameters: bool,
}

/// Fill each empty lookup table; tables that already hold rows are left alone.
pub fn seed_reference_data(store: &SqliteDocumentStore) -> Result<SeedReport, StoreError> {
    let mut report = SeedReport::default();

    if store.branches()?.is_empty() {
        for (name, code) in REFERENCE_BRANCHES {
            store.insert_branch(name, code)?;
            report.branches += 1;
        }
    }

    if store.document_types()?.is_empty() {
        for (category, name, mandatory, validity) in REFERENCE_DOCUMENT_TYPES {
            store.insert_document_type(category, name, mandatory, validity)?;
            report.document_types += 1;
        }
    }

    if store.alert_parameters()?.is_none() {
        store.set_alert_horizons(&REFERENCE_HORIZONS, NaiveTime::from_hms_opt(8, 0, 0))?;
        report.alert_parameters = true;
    }

    info!(
        branches = report.branches,
        document_types = report.document_types,
        alert_parameters = report.alert_parameters,
        "reference data seeded"
    );
    Ok(report)
}
