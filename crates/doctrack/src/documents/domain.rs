use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Version assigned to a freshly registered document.
pub const DEFAULT_VERSION: &str = "1.0.0";

/// Identifier wrapper for stored documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BranchId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentTypeId(pub i64);

/// Derived expiration state of a document.
///
/// The persisted and wire representation is [`DocumentStatus::code`], which matches the codes
/// already stored by existing databases and dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentStatus {
    NoExpiration,
    Current,
    ApproachingExpiration,
    Expired,
}

impl DocumentStatus {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::NoExpiration,
            Self::Current,
            Self::ApproachingExpiration,
            Self::Expired,
        ]
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::NoExpiration => "SEM_VALIDADE",
            Self::Current => "VIGENTE",
            Self::ApproachingExpiration => "A_VENCER",
            Self::Expired => "VENCIDO",
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::NoExpiration => "NO_EXPIRATION",
            Self::Current => "CURRENT",
            Self::ApproachingExpiration => "APPROACHING_EXPIRATION",
            Self::Expired => "EXPIRED",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::NoExpiration => "No expiration",
            Self::Current => "Current",
            Self::ApproachingExpiration => "Approaching expiration",
            Self::Expired => "Expired",
        }
    }

    /// Statuses surfaced on the renewal dashboard.
    pub const fn needs_attention(self) -> bool {
        matches!(self, Self::ApproachingExpiration | Self::Expired)
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown document status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for DocumentStatus {
    type Err = UnknownStatus;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        Self::ordered()
            .into_iter()
            .find(|status| {
                trimmed.eq_ignore_ascii_case(status.code())
                    || trimmed.eq_ignore_ascii_case(status.name())
            })
            .ok_or_else(|| UnknownStatus(raw.to_string()))
    }
}

impl Serialize for DocumentStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for DocumentStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub id: BranchId,
    pub name: String,
    pub code: String,
}

/// Document category and its renewal rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentType {
    pub id: DocumentTypeId,
    pub category: String,
    pub name: String,
    pub mandatory: bool,
    pub default_validity_days: Option<i64>,
}

/// Raw global alert settings as stored; see `AlertConfiguration` for the resolved form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertParameters {
    pub id: i64,
    pub alert_days_json: String,
    pub notify_at: Option<NaiveTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub branch_id: BranchId,
    pub type_id: DocumentTypeId,
    pub title: String,
    pub number: Option<String>,
    pub responsible: String,
    pub issued_on: Option<NaiveDate>,
    pub expires_on: Option<NaiveDate>,
    pub no_expiration: bool,
    pub issuing_authority: Option<String>,
    pub notes: Option<String>,
    pub file_path: Option<String>,
    pub version: String,
    pub status: DocumentStatus,
}

impl Document {
    /// Expiration date as seen by the classifier; the no-expiration flag masks any stored date.
    pub fn effective_expiration(&self) -> Option<NaiveDate> {
        effective_expiration(self.no_expiration, self.expires_on)
    }
}

/// Validated registration input, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDocument {
    pub branch_id: BranchId,
    pub type_id: DocumentTypeId,
    pub title: String,
    pub number: Option<String>,
    pub responsible: String,
    pub issued_on: Option<NaiveDate>,
    pub expires_on: Option<NaiveDate>,
    pub no_expiration: bool,
    pub issuing_authority: Option<String>,
    pub notes: Option<String>,
    pub file_path: Option<String>,
}

impl NewDocument {
    pub fn effective_expiration(&self) -> Option<NaiveDate> {
        effective_expiration(self.no_expiration, self.expires_on)
    }
}

fn effective_expiration(no_expiration: bool, expires_on: Option<NaiveDate>) -> Option<NaiveDate> {
    if no_expiration {
        None
    } else {
        expires_on
    }
}

/// Stored document joined with the display names of its lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRecord {
    pub document: Document,
    pub branch_name: Option<String>,
    pub type_name: Option<String>,
    pub category: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_codes_and_names_case_insensitively() {
        assert_eq!(
            "vencido".parse::<DocumentStatus>(),
            Ok(DocumentStatus::Expired)
        );
        assert_eq!(
            "APPROACHING_EXPIRATION".parse::<DocumentStatus>(),
            Ok(DocumentStatus::ApproachingExpiration)
        );
        assert_eq!(
            " SEM_VALIDADE ".parse::<DocumentStatus>(),
            Ok(DocumentStatus::NoExpiration)
        );
        assert!("RENEWED".parse::<DocumentStatus>().is_err());
    }

    #[test]
    fn serializes_as_persisted_code() {
        let json = serde_json::to_string(&DocumentStatus::ApproachingExpiration).expect("json");
        assert_eq!(json, "\"A_VENCER\"");
    }

    #[test]
    fn no_expiration_flag_masks_stored_date() {
        let new_document = NewDocument {
            branch_id: BranchId(1),
            type_id: DocumentTypeId(1),
            title: "Alvará".to_string(),
            number: None,
            responsible: "RH".to_string(),
            issued_on: None,
            expires_on: NaiveDate::from_ymd_opt(2025, 1, 1),
            no_expiration: true,
            issuing_authority: None,
            notes: None,
            file_path: None,
        };
        assert_eq!(new_document.effective_expiration(), None);
    }
}
