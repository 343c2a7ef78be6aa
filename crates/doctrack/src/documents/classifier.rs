//! Expiration status classification.
//!
//! [`classify`] is a pure decision table over the days remaining until expiration. The alert
//! horizon feeding it comes from the global alert parameters; [`AlertConfiguration::resolve`]
//! turns every lookup failure into the default horizon so listing and registration never fail
//! because the parameters row is missing or malformed.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use tracing::warn;

use super::domain::{AlertParameters, DocumentStatus};
use crate::store::{DocumentStore, StoreError};

/// Horizon used when no alert parameters can be resolved.
pub const DEFAULT_HORIZON_DAYS: i64 = 30;

/// Classify an expiration date relative to `today`.
///
/// The horizon is the largest entry of `alert_horizons`, or [`DEFAULT_HORIZON_DAYS`] when the
/// list is empty. A document exactly `horizon` days out is already approaching expiration.
pub fn classify(
    expires_on: Option<NaiveDate>,
    today: NaiveDate,
    alert_horizons: &[i64],
) -> DocumentStatus {
    let Some(expires_on) = expires_on else {
        return DocumentStatus::NoExpiration;
    };

    let days_remaining = (expires_on - today).num_days();
    let horizon = horizon_days(alert_horizons);

    if days_remaining < 0 {
        DocumentStatus::Expired
    } else if days_remaining <= horizon {
        DocumentStatus::ApproachingExpiration
    } else {
        DocumentStatus::Current
    }
}

fn horizon_days(alert_horizons: &[i64]) -> i64 {
    alert_horizons
        .iter()
        .copied()
        .max()
        .unwrap_or(DEFAULT_HORIZON_DAYS)
}

/// Where the active horizon came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HorizonSource {
    Configured,
    Fallback,
}

/// Resolved alert settings used by the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertConfiguration {
    horizons: Vec<i64>,
    horizon_days: i64,
    notify_at: Option<NaiveTime>,
    source: HorizonSource,
}

impl Default for AlertConfiguration {
    fn default() -> Self {
        Self {
            horizons: Vec::new(),
            horizon_days: DEFAULT_HORIZON_DAYS,
            notify_at: None,
            source: HorizonSource::Fallback,
        }
    }
}

impl AlertConfiguration {
    pub fn from_horizons(horizons: Vec<i64>) -> Self {
        let horizon_days = horizon_days(&horizons);
        let source = if horizons.is_empty() {
            HorizonSource::Fallback
        } else {
            HorizonSource::Configured
        };

        Self {
            horizons,
            horizon_days,
            notify_at: None,
            source,
        }
    }

    /// Parse the stored JSON list; an empty list is an error so callers see the fallback.
    pub fn from_parameters(params: &AlertParameters) -> Result<Self, ConfigurationLookupError> {
        let horizons: Vec<i64> = serde_json::from_str(&params.alert_days_json).map_err(|source| {
            ConfigurationLookupError::Malformed {
                raw: params.alert_days_json.clone(),
                source,
            }
        })?;

        if horizons.is_empty() {
            return Err(ConfigurationLookupError::Empty);
        }

        Ok(Self {
            notify_at: params.notify_at,
            ..Self::from_horizons(horizons)
        })
    }

    pub fn lookup<S>(store: &S) -> Result<Self, ConfigurationLookupError>
    where
        S: DocumentStore + ?Sized,
    {
        let params = store
            .alert_parameters()?
            .ok_or(ConfigurationLookupError::Missing)?;
        Self::from_parameters(&params)
    }

    /// Like [`AlertConfiguration::lookup`], degrading to the default horizon on any failure.
    pub fn resolve<S>(store: &S) -> Self
    where
        S: DocumentStore + ?Sized,
    {
        Self::lookup(store).unwrap_or_else(|err| {
            warn!(
                error = %err,
                horizon_days = DEFAULT_HORIZON_DAYS,
                "alert parameters unavailable, using default horizon"
            );
            Self::default()
        })
    }

    pub fn horizons(&self) -> &[i64] {
        &self.horizons
    }

    pub fn horizon_days(&self) -> i64 {
        self.horizon_days
    }

    pub fn notify_at(&self) -> Option<NaiveTime> {
        self.notify_at
    }

    pub fn source(&self) -> HorizonSource {
        self.source
    }

    pub fn classify(&self, expires_on: Option<NaiveDate>, today: NaiveDate) -> DocumentStatus {
        classify(expires_on, today, &self.horizons)
    }
}

/// Reasons the alert parameters could not be used. Recovered by [`AlertConfiguration::resolve`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationLookupError {
    #[error("no alert parameters configured")]
    Missing,
    #[error("alert horizons '{raw}' are not a JSON list of integers: {source}")]
    Malformed {
        raw: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("alert horizon list is empty")]
    Empty,
    #[error("alert parameters could not be read: {0}")]
    Storage(#[from] StoreError),
}
