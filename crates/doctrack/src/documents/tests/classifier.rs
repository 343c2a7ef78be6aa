use super::common::*;
use crate::documents::classifier::{
    classify, AlertConfiguration, ConfigurationLookupError, HorizonSource, DEFAULT_HORIZON_DAYS,
};
use crate::documents::domain::{AlertParameters, DocumentStatus};

#[test]
fn absent_expiration_never_expires() {
    assert_eq!(classify(None, today(), &[15, 30]), DocumentStatus::NoExpiration);
    assert_eq!(classify(None, today(), &[]), DocumentStatus::NoExpiration);
}

#[test]
fn horizon_boundaries_use_the_largest_entry() {
    let horizons = [15, 30];

    assert_eq!(
        classify(Some(days_from_today(30)), today(), &horizons),
        DocumentStatus::ApproachingExpiration
    );
    assert_eq!(
        classify(Some(days_from_today(31)), today(), &horizons),
        DocumentStatus::Current
    );
    assert_eq!(
        classify(Some(days_from_today(0)), today(), &horizons),
        DocumentStatus::ApproachingExpiration
    );
    assert_eq!(
        classify(Some(days_from_today(-1)), today(), &horizons),
        DocumentStatus::Expired
    );
}

#[test]
fn horizon_order_does_not_matter() {
    assert_eq!(
        classify(Some(days_from_today(45)), today(), &[60, 15, 30]),
        DocumentStatus::ApproachingExpiration
    );
}

#[test]
fn empty_horizons_default_to_thirty_days() {
    assert_eq!(DEFAULT_HORIZON_DAYS, 30);
    assert_eq!(
        classify(Some(days_from_today(30)), today(), &[]),
        DocumentStatus::ApproachingExpiration
    );
    assert_eq!(
        classify(Some(days_from_today(31)), today(), &[]),
        DocumentStatus::Current
    );
}

#[test]
fn configured_parameters_are_reported_as_configured() {
    let store = MemoryStore::with_reference_data();
    let config = AlertConfiguration::resolve(&store);

    assert_eq!(config.source(), HorizonSource::Configured);
    assert_eq!(config.horizons(), &[15, 30]);
    assert_eq!(config.horizon_days(), 30);
}

#[test]
fn missing_parameters_fall_back_to_default() {
    let store = MemoryStore::with_reference_data();
    store.set_alert_days(None);

    assert!(matches!(
        AlertConfiguration::lookup(&store),
        Err(ConfigurationLookupError::Missing)
    ));
    let config = AlertConfiguration::resolve(&store);
    assert_eq!(config.source(), HorizonSource::Fallback);
    assert_eq!(config.horizon_days(), DEFAULT_HORIZON_DAYS);
}

#[test]
fn malformed_parameters_fall_back_to_default() {
    let store = MemoryStore::with_reference_data();
    store.set_alert_days(Some("15,30"));

    match AlertConfiguration::lookup(&store) {
        Err(ConfigurationLookupError::Malformed { raw, .. }) => assert_eq!(raw, "15,30"),
        other => panic!("expected malformed horizons, got {other:?}"),
    }
    let config = AlertConfiguration::resolve(&store);
    assert_eq!(config, AlertConfiguration::default());
    assert_eq!(
        config.classify(Some(days_from_today(31)), today()),
        DocumentStatus::Current
    );
}

#[test]
fn empty_list_is_rejected_then_defaulted() {
    let params = AlertParameters {
        id: 1,
        alert_days_json: "[]".to_string(),
        notify_at: None,
    };
    assert!(matches!(
        AlertConfiguration::from_parameters(&params),
        Err(ConfigurationLookupError::Empty)
    ));
}

#[test]
fn storage_failure_does_not_fail_classification() {
    assert!(matches!(
        AlertConfiguration::lookup(&UnavailableStore),
        Err(ConfigurationLookupError::Storage(_))
    ));
    let config = AlertConfiguration::resolve(&UnavailableStore);
    assert_eq!(config.source(), HorizonSource::Fallback);
    assert_eq!(
        config.classify(Some(days_from_today(-5)), today()),
        DocumentStatus::Expired
    );
}
