use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{NaiveDate, NaiveTime};
use rusqlite::functions::FunctionFlags;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use tracing::info;

use super::{DocumentQuery, DocumentStore, StatusChange, StoreError};
use crate::documents::domain::{
    AlertParameters, Branch, BranchId, Document, DocumentId, DocumentRecord, DocumentStatus,
    DocumentType, DocumentTypeId, NewDocument, DEFAULT_VERSION,
};

const MIGRATIONS: &[(i64, &str)] = &[(
    1,
    include_str!("../../resources/migrations/001_initial.sql"),
)];

/// Open (or create) the database file and bring its schema up to date.
pub fn open_database(path: &Path) -> Result<Connection, StoreError> {
    let conn = Connection::open(path)?;
    configure_pragmas(&conn)?;
    run_migrations(&conn)?;
    Ok(conn)
}

/// Open an in-memory database (tests and `:memory:` deployments).
pub fn open_memory_database() -> Result<Connection, StoreError> {
    let conn = Connection::open_in_memory()?;
    configure_pragmas(&conn)?;
    run_migrations(&conn)?;
    Ok(conn)
}

fn configure_pragmas(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;
    register_functions(conn)?;
    Ok(())
}

/// `fold_case(text)`: Unicode lowercase. SQLite's built-in `lower` only folds ASCII.
fn register_functions(conn: &Connection) -> Result<(), StoreError> {
    conn.create_scalar_function(
        "fold_case",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|text| text.to_lowercase()))
        },
    )?;
    Ok(())
}

/// Apply pending migrations, returning how many ran.
pub fn run_migrations(conn: &Connection) -> Result<usize, StoreError> {
    apply_migrations(conn, MIGRATIONS)
}

// Each migration commits on its own; a failing one leaves the earlier ones in place.
fn apply_migrations(conn: &Connection, migrations: &[(i64, &str)]) -> Result<usize, StoreError> {
    let current_version = current_version(conn)?;
    let mut applied = 0;

    for (version, sql) in migrations {
        if *version <= current_version {
            continue;
        }

        info!(version, "applying schema migration");
        let failed = |err: rusqlite::Error| StoreError::MigrationFailed {
            version: *version,
            reason: err.to_string(),
        };
        let tx = conn.unchecked_transaction().map_err(failed)?;
        tx.execute_batch(sql).map_err(failed)?;
        tx.commit().map_err(failed)?;
        applied += 1;
    }

    Ok(applied)
}

// 0 only when the schema_version table does not exist yet.
fn current_version(conn: &Connection) -> Result<i64, StoreError> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_version')",
        [],
        |row| row.get(0),
    )?;
    if !exists {
        return Ok(0);
    }

    let version: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(version.unwrap_or(0))
}

/// [`DocumentStore`] over a single SQLite connection.
pub struct SqliteDocumentStore {
    conn: Mutex<Connection>,
}

impl SqliteDocumentStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    pub fn open(path: &Path) -> Result<Self, StoreError> {
        open_database(path).map(Self::new)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        open_memory_database().map(Self::new)
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("connection mutex poisoned".to_string()))
    }

    pub fn insert_branch(&self, name: &str, code: &str) -> Result<BranchId, StoreError> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO branch (name, code) VALUES (?1, ?2)",
            params![name, code],
        )?;
        Ok(BranchId(conn.last_insert_rowid()))
    }

    pub fn insert_document_type(
        &self,
        category: &str,
        name: &str,
        mandatory: bool,
        default_validity_days: Option<i64>,
    ) -> Result<DocumentTypeId, StoreError> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO document_type (category, name, mandatory, default_validity_days)
             VALUES (?1, ?2, ?3, ?4)",
            params![category, name, mandatory, default_validity_days],
        )?;
        Ok(DocumentTypeId(conn.last_insert_rowid()))
    }

    /// Replace the first parameters row, storing `alert_days_json` verbatim.
    pub fn save_alert_parameters(
        &self,
        alert_days_json: &str,
        notify_at: Option<NaiveTime>,
    ) -> Result<(), StoreError> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM alert_parameters ORDER BY id LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        match existing {
            Some(id) => {
                tx.execute(
                    "UPDATE alert_parameters SET alert_days_json = ?1, notify_at = ?2 WHERE id = ?3",
                    params![alert_days_json, notify_at, id],
                )?;
            }
            None => {
                tx.execute(
                    "INSERT INTO alert_parameters (alert_days_json, notify_at) VALUES (?1, ?2)",
                    params![alert_days_json, notify_at],
                )?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    pub fn set_alert_horizons(
        &self,
        horizons: &[i64],
        notify_at: Option<NaiveTime>,
    ) -> Result<(), StoreError> {
        let json = serde_json::to_string(horizons).map_err(|err| StoreError::InvalidValue {
            field: "alert_days_json",
            value: err.to_string(),
        })?;
        self.save_alert_parameters(&json, notify_at)
    }
}

const DOCUMENT_SELECT: &str = "SELECT d.id, d.branch_id, d.type_id, d.title, d.number,
        d.responsible, d.issued_on, d.expires_on, d.no_expiration, d.issuing_authority,
        d.notes, d.file_path, d.version, d.status, b.name, t.name, t.category
     FROM document d
     LEFT JOIN branch b ON b.id = d.branch_id
     LEFT JOIN document_type t ON t.id = d.type_id";

/// Column values as read, before the status code is validated.
struct DocumentRow {
    id: i64,
    branch_id: i64,
    type_id: i64,
    title: String,
    number: Option<String>,
    responsible: String,
    issued_on: Option<NaiveDate>,
    expires_on: Option<NaiveDate>,
    no_expiration: bool,
    issuing_authority: Option<String>,
    notes: Option<String>,
    file_path: Option<String>,
    version: String,
    status: String,
    branch_name: Option<String>,
    type_name: Option<String>,
    category: Option<String>,
}

impl DocumentRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            branch_id: row.get(1)?,
            type_id: row.get(2)?,
            title: row.get(3)?,
            number: row.get(4)?,
            responsible: row.get(5)?,
            issued_on: row.get(6)?,
            expires_on: row.get(7)?,
            no_expiration: row.get(8)?,
            issuing_authority: row.get(9)?,
            notes: row.get(10)?,
            file_path: row.get(11)?,
            version: row.get(12)?,
            status: row.get(13)?,
            branch_name: row.get(14)?,
            type_name: row.get(15)?,
            category: row.get(16)?,
        })
    }

    fn into_record(self) -> Result<DocumentRecord, StoreError> {
        let status = self
            .status
            .parse::<DocumentStatus>()
            .map_err(|_| StoreError::InvalidValue {
                field: "document.status",
                value: self.status.clone(),
            })?;

        Ok(DocumentRecord {
            document: Document {
                id: DocumentId(self.id),
                branch_id: BranchId(self.branch_id),
                type_id: DocumentTypeId(self.type_id),
                title: self.title,
                number: self.number,
                responsible: self.responsible,
                issued_on: self.issued_on,
                expires_on: self.expires_on,
                no_expiration: self.no_expiration,
                issuing_authority: self.issuing_authority,
                notes: self.notes,
                file_path: self.file_path,
                version: self.version,
                status,
            },
            branch_name: self.branch_name,
            type_name: self.type_name,
            category: self.category,
        })
    }
}

fn branch_from_row(row: &Row<'_>) -> rusqlite::Result<Branch> {
    Ok(Branch {
        id: BranchId(row.get(0)?),
        name: row.get(1)?,
        code: row.get(2)?,
    })
}

fn document_type_from_row(row: &Row<'_>) -> rusqlite::Result<DocumentType> {
    Ok(DocumentType {
        id: DocumentTypeId(row.get(0)?),
        category: row.get(1)?,
        name: row.get(2)?,
        mandatory: row.get(3)?,
        default_validity_days: row.get(4)?,
    })
}

impl DocumentStore for SqliteDocumentStore {
    fn documents(&self, query: &DocumentQuery) -> Result<Vec<DocumentRecord>, StoreError> {
        let mut clauses: Vec<&'static str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(title) = query.title_contains.as_deref().filter(|t| !t.is_empty()) {
            clauses.push("instr(fold_case(d.title), fold_case(?)) > 0");
            values.push(Value::Text(title.to_string()));
        }
        if let Some(category) = query.category.as_deref() {
            clauses.push("t.category = ?");
            values.push(Value::Text(category.to_string()));
        }
        if let Some(from) = query.expires_from {
            clauses.push("d.no_expiration = 0 AND d.expires_on >= ?");
            values.push(Value::Text(from.to_string()));
        }
        if let Some(until) = query.expires_until {
            clauses.push("d.no_expiration = 0 AND d.expires_on <= ?");
            values.push(Value::Text(until.to_string()));
        }

        let mut sql = DOCUMENT_SELECT.to_string();
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY d.id");

        let conn = self.connection()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), DocumentRow::from_row)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?.into_record()?);
        }
        Ok(records)
    }

    fn insert_document(
        &self,
        document: &NewDocument,
        status: DocumentStatus,
    ) -> Result<DocumentId, StoreError> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO document (branch_id, type_id, title, number, responsible, issued_on,
             expires_on, no_expiration, issuing_authority, notes, file_path, version, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                document.branch_id.0,
                document.type_id.0,
                document.title,
                document.number,
                document.responsible,
                document.issued_on,
                document.expires_on,
                document.no_expiration,
                document.issuing_authority,
                document.notes,
                document.file_path,
                DEFAULT_VERSION,
                status.code(),
            ],
        )?;
        Ok(DocumentId(conn.last_insert_rowid()))
    }

    fn update_statuses(&self, changes: &[StatusChange]) -> Result<usize, StoreError> {
        if changes.is_empty() {
            return Ok(0);
        }

        let mut conn = self.connection()?;
        // Dropping the transaction on an early return rolls it back.
        let tx = conn.transaction()?;
        let mut written = 0;
        {
            let mut stmt = tx.prepare("UPDATE document SET status = ?1 WHERE id = ?2")?;
            for change in changes {
                written += stmt.execute(params![change.status.code(), change.id.0])?;
            }
        }
        tx.commit()?;
        Ok(written)
    }

    fn branches(&self) -> Result<Vec<Branch>, StoreError> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare("SELECT id, name, code FROM branch ORDER BY id")?;
        let rows = stmt.query_map([], branch_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }

    fn branch(&self, id: BranchId) -> Result<Option<Branch>, StoreError> {
        let conn = self.connection()?;
        conn.query_row(
            "SELECT id, name, code FROM branch WHERE id = ?1",
            params![id.0],
            branch_from_row,
        )
        .optional()
        .map_err(StoreError::from)
    }

    fn document_types(&self) -> Result<Vec<DocumentType>, StoreError> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT id, category, name, mandatory, default_validity_days
             FROM document_type ORDER BY id",
        )?;
        let rows = stmt.query_map([], document_type_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }

    fn document_type(&self, id: DocumentTypeId) -> Result<Option<DocumentType>, StoreError> {
        let conn = self.connection()?;
        conn.query_row(
            "SELECT id, category, name, mandatory, default_validity_days
             FROM document_type WHERE id = ?1",
            params![id.0],
            document_type_from_row,
        )
        .optional()
        .map_err(StoreError::from)
    }

    fn alert_parameters(&self) -> Result<Option<AlertParameters>, StoreError> {
        let conn = self.connection()?;
        conn.query_row(
            "SELECT id, alert_days_json, notify_at FROM alert_parameters ORDER BY id LIMIT 1",
            [],
            |row| {
                Ok(AlertParameters {
                    id: row.get(0)?,
                    alert_days_json: row.get(1)?,
                    notify_at: row.get(2)?,
                })
            },
        )
        .optional()
        .map_err(StoreError::from)
    }
}
