use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{BranchId, DocumentTypeId, NewDocument};

/// Boundary date format for every date exchanged with callers.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Registration request as received. Legacy Portuguese keys are accepted as aliases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationPayload {
    #[serde(default, alias = "titulo")]
    pub title: Option<String>,
    #[serde(default, alias = "responsavel")]
    pub responsible: Option<String>,
    #[serde(default, alias = "filial_id")]
    pub branch_id: Option<i64>,
    #[serde(default, alias = "tipo_id")]
    pub type_id: Option<i64>,
    #[serde(default, alias = "numero")]
    pub number: Option<String>,
    #[serde(default, alias = "emissao")]
    pub issued_on: Option<String>,
    #[serde(default, alias = "validade")]
    pub expires_on: Option<String>,
    #[serde(default, alias = "sem_validade")]
    pub no_expiration: bool,
    #[serde(default, alias = "orgao_emissor")]
    pub issuing_authority: Option<String>,
    #[serde(default, alias = "observacoes")]
    pub notes: Option<String>,
    #[serde(default, alias = "caminho_atual")]
    pub file_path: Option<String>,
}

impl RegistrationPayload {
    /// Check required fields and date formats, producing the record to persist.
    ///
    /// Blank strings count as absent, both for required text and optional fields.
    pub fn validate(self) -> Result<NewDocument, ValidationError> {
        let title = non_blank(self.title);
        let responsible = non_blank(self.responsible);

        let mut missing = Vec::new();
        if title.is_none() {
            missing.push("title");
        }
        if responsible.is_none() {
            missing.push("responsible");
        }
        if self.branch_id.is_none() {
            missing.push("branch_id");
        }
        if self.type_id.is_none() {
            missing.push("type_id");
        }

        let (Some(title), Some(responsible), Some(branch_id), Some(type_id)) =
            (title, responsible, self.branch_id, self.type_id)
        else {
            return Err(ValidationError::MissingFields { fields: missing });
        };

        let issued_on = parse_optional_date("issued_on", self.issued_on.as_deref())?;
        let expires_on = parse_optional_date("expires_on", self.expires_on.as_deref())?;

        Ok(NewDocument {
            branch_id: BranchId(branch_id),
            type_id: DocumentTypeId(type_id),
            title,
            number: non_blank(self.number),
            responsible,
            issued_on,
            expires_on,
            no_expiration: self.no_expiration,
            issuing_authority: non_blank(self.issuing_authority),
            notes: non_blank(self.notes),
            file_path: non_blank(self.file_path),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

pub fn parse_date(field: &'static str, raw: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| ValidationError::InvalidDate {
        field,
        value: raw.to_string(),
    })
}

pub fn parse_optional_date(
    field: &'static str,
    raw: Option<&str>,
) -> Result<Option<NaiveDate>, ValidationError> {
    raw.filter(|value| !value.trim().is_empty())
        .map(|value| parse_date(field, value))
        .transpose()
}

/// Input rejected at the boundary. Each variant carries a stable [`ValidationError::code`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("required fields missing: {}", fields.join(", "))]
    MissingFields { fields: Vec<&'static str> },
    #[error("invalid date '{value}' for {field}; use YYYY-MM-DD")]
    InvalidDate { field: &'static str, value: String },
    #[error("{entity} {id} does not exist")]
    UnknownReference { entity: &'static str, id: i64 },
    #[error("unknown status filter '{0}'")]
    InvalidStatus(String),
    #[error("malformed request payload: {0}")]
    MalformedPayload(String),
}

impl ValidationError {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingFields { .. } => "missing_field",
            Self::InvalidDate { .. } => "invalid_date",
            Self::UnknownReference { .. } => "unknown_reference",
            Self::InvalidStatus(_) => "invalid_status",
            Self::MalformedPayload(_) => "malformed_payload",
        }
    }
}
