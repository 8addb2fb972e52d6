//! Tests for configuration validation and loading

use std::collections::HashMap;
use std::time::Duration;

use poll_service::config::PollServiceConfig;

#[test]
fn test_service_config_validation() {
    let valid = PollServiceConfig::new()
        .with_worker_count(4)
        .with_poll_timeout(Duration::from_secs(25));
    assert!(valid.validate().is_ok());
}

#[test]
fn test_service_config_invalid_worker_count() {
    let invalid = PollServiceConfig::new().with_worker_count(0);
    let err = invalid.validate().unwrap_err();
    assert!(err.contains("worker_count"));
}

#[test]
fn test_service_config_invalid_queue_depth() {
    let invalid = PollServiceConfig::new().with_max_queue_depth(0);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_service_config_from_json() {
    let cfg = PollServiceConfig::from_json_str(
        r#"{"worker_count": 3, "poll_timeout_ms": 5000, "max_queue_depth": 128}"#,
    )
    .unwrap();
    assert_eq!(cfg.worker_count, 3);
    assert_eq!(cfg.poll_timeout(), Duration::from_secs(5));
    assert_eq!(cfg.max_queue_depth, Some(128));
    // Unspecified fields keep their defaults.
    assert_eq!(cfg.dispatch_interval_ms, 100);
    assert_eq!(cfg.thread_name_prefix, "poll");
}

#[test]
fn test_service_config_from_json_rejects_invalid() {
    assert!(PollServiceConfig::from_json_str(r#"{"worker_count": 0}"#).is_err());
    assert!(PollServiceConfig::from_json_str("not json").is_err());
}

#[test]
fn test_service_config_from_lookup() {
    let vars: HashMap<&str, &str> = [
        ("WORKER_COUNT", "6"),
        ("DISPATCH_INTERVAL_MS", " 250 "),
        ("THREAD_NAME_PREFIX", "lp"),
    ]
    .into_iter()
    .collect();

    let cfg = PollServiceConfig::from_lookup(|key| vars.get(key).map(ToString::to_string)).unwrap();
    assert_eq!(cfg.worker_count, 6);
    assert_eq!(cfg.dispatch_interval(), Duration::from_millis(250));
    assert_eq!(cfg.thread_name_prefix, "lp");
}

#[test]
fn test_service_config_from_lookup_bad_value() {
    let err = PollServiceConfig::from_lookup(|key| (key == "POLL_TIMEOUT_MS").then(|| "soon".to_string()))
        .unwrap_err();
    assert!(err.starts_with("POLL_SERVICE_POLL_TIMEOUT_MS"));
}
