use chrono::{Datelike, NaiveDate};

use super::domain::DocumentStatus;
use super::registration::{parse_optional_date, ValidationError};
use crate::store::DocumentQuery;

/// Category values meaning "no category filter".
const ALL_CATEGORIES: [&str; 2] = ["todas", "all"];

/// Filters for the document listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentFilter {
    /// Applied after statuses are refreshed, so it always sees the current classification.
    pub status: Option<DocumentStatus>,
    pub title: Option<String>,
}

impl DocumentFilter {
    /// Build from raw query values; blank values are ignored.
    pub fn parse(status: Option<&str>, title: Option<&str>) -> Result<Self, ValidationError> {
        let status = status
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(|raw| {
                raw.parse::<DocumentStatus>()
                    .map_err(|_| ValidationError::InvalidStatus(raw.to_string()))
            })
            .transpose()?;

        let title = title
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(str::to_string);

        Ok(Self { status, title })
    }

    pub(crate) fn to_query(&self) -> DocumentQuery {
        DocumentQuery {
            title_contains: self.title.clone(),
            ..DocumentQuery::default()
        }
    }

    pub(crate) fn matches(&self, status: DocumentStatus) -> bool {
        self.status.map_or(true, |wanted| wanted == status)
    }
}

/// Filters for the alerts dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertFilter {
    pub category: Option<String>,
    /// Inclusive lower bound on the expiration date.
    pub start: Option<NaiveDate>,
    /// Inclusive upper bound on the expiration date.
    pub end: Option<NaiveDate>,
}

impl AlertFilter {
    /// Window covering every day of the given month.
    pub fn for_month(year: i32, month: u32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)?;
        let (next_year, next_month) = if month == 12 {
            (year + 1, 1)
        } else {
            (year, month + 1)
        };
        let end = NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()?;

        Some(Self {
            category: None,
            start: Some(start),
            end: Some(end),
        })
    }

    /// `todas`/`all` (any case) and blank values clear the category filter.
    pub fn with_category(mut self, category: Option<&str>) -> Self {
        self.category = category
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .filter(|raw| {
                !ALL_CATEGORIES
                    .iter()
                    .any(|all| raw.eq_ignore_ascii_case(all))
            })
            .map(str::to_string);
        self
    }

    /// Build from raw query values. `month` (`YYYY-MM`) supplies bounds not given explicitly.
    pub fn parse(
        category: Option<&str>,
        start: Option<&str>,
        end: Option<&str>,
        month: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let window = match month.map(str::trim).filter(|raw| !raw.is_empty()) {
            Some(raw) => {
                let (year, month) = parse_month(raw)?;
                Self::for_month(year, month).ok_or_else(|| ValidationError::InvalidDate {
                    field: "month",
                    value: raw.to_string(),
                })?
            }
            None => Self::default(),
        };

        let start = parse_optional_date("start", start)?.or(window.start);
        let end = parse_optional_date("end", end)?.or(window.end);

        Ok(Self {
            category: None,
            start,
            end,
        }
        .with_category(category))
    }

    pub(crate) fn to_query(&self) -> DocumentQuery {
        DocumentQuery {
            title_contains: None,
            category: self.category.clone(),
            expires_from: self.start,
            expires_until: self.end,
        }
    }
}

/// Parse a `YYYY-MM` reference month.
pub fn parse_month(raw: &str) -> Result<(i32, u32), ValidationError> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(&format!("{trimmed}-01"), "%Y-%m-%d")
        .map(|date| (date.year(), date.month()))
        .map_err(|_| ValidationError::InvalidDate {
            field: "month",
            value: raw.to_string(),
        })
}
