//! Unit tests for configuration parsing
//!
//! Tests TOML parsing, environment overrides and default fallback.
//!
//! Note: These tests modify global environment variables and must run serially.

use howtank_notifier::config::Config;
use howtank_notifier::error::AppError;
use howtank_notifier::models::{NotificationSettings, Trigger, TriggerPolicy};
use howtank_notifier::services::{CredentialResolver, QueryMode};
use pretty_assertions::assert_eq;
use serial_test::serial;
use std::io::Write;

const ENV_KEYS: [&str; 6] = [
    "HOWTANK_API_URL",
    "HOWTANK_TIMEOUT_SECS",
    "HOWTANK_EXPERT_MODE",
    "HOWTANK_STREAM_ID",
    "HOWTANK_MESSAGE",
    "HOWTANK_ACCESS_TOKEN",
];

fn clear_env() {
    for key in ENV_KEYS {
        std::env::remove_var(key);
    }
}

const FULL_CONFIG: &str = r#"
[api]
base_url = "http://localhost:9000/api/v4"
timeout_secs = 2
expert_mode = true

[defaults]
stream_id = "global-stream"
message = "global message"
access_token = "id:howtank"

[notification]
message = "${JOB_NAME}: ${BUILD_STATUS}"
notify_failure = true
notify_back_to_normal = true

[credentials]
howtank = "s3cret"
"#;

// =============================================================================
// File Parsing
// =============================================================================

#[test]
#[serial]
fn test_config_from_file() {
    clear_env();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(FULL_CONFIG.as_bytes()).unwrap();

    let config = Config::load(Some(file.path())).unwrap();

    assert_eq!(config.api.base_url, "http://localhost:9000/api/v4");
    assert_eq!(config.api.timeout_secs, 2);
    assert_eq!(config.api.query_mode(), QueryMode::Expert);

    let notification = config.resolve_notification().unwrap();
    assert_eq!(notification.stream_id, "global-stream");
    assert_eq!(notification.message_template, "${JOB_NAME}: ${BUILD_STATUS}");
    assert_eq!(notification.access_token, "id:howtank");
    assert_eq!(
        notification.triggers,
        TriggerPolicy::from_triggers([Trigger::Failure, Trigger::BackToNormal])
    );

    assert_eq!(
        config.credential_resolver().lookup("howtank").as_deref(),
        Some("s3cret")
    );
}

#[test]
#[serial]
fn test_missing_file_is_an_io_error() {
    clear_env();

    let dir = tempfile::tempdir().unwrap();
    let result = Config::load(Some(dir.path().join("missing.toml").as_path()));

    assert!(matches!(result, Err(AppError::Io(_))));
}

#[test]
fn test_invalid_toml_is_rejected() {
    let result = Config::from_toml("[api\nbase_url = 1");
    assert!(matches!(result, Err(AppError::Toml(_))));
}

#[test]
#[serial]
fn test_zero_timeout_in_file_is_a_configuration_error() {
    clear_env();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"[api]\ntimeout_secs = 0\n").unwrap();

    let result = Config::load(Some(file.path()));

    match result {
        Err(AppError::Configuration(msg)) => assert!(msg.contains("timeout_secs")),
        other => panic!("expected a configuration error, got {:?}", other.map(|c| c.api)),
    }
}

#[test]
fn test_api_defaults() {
    let config = Config::from_toml("").unwrap();

    assert_eq!(config.api.base_url, "https://www.howtank.com/api/v4");
    assert_eq!(config.api.timeout_secs, 5);
    assert_eq!(config.api.query_mode(), QueryMode::Standard);
}

// =============================================================================
// Environment Overrides
// =============================================================================

#[test]
#[serial]
fn test_env_overrides_api_settings() {
    clear_env();
    std::env::set_var("HOWTANK_API_URL", "http://127.0.0.1:1234/api");
    std::env::set_var("HOWTANK_TIMEOUT_SECS", "9");
    std::env::set_var("HOWTANK_EXPERT_MODE", "1");

    let config = Config::load(None).unwrap();

    assert_eq!(config.api.base_url, "http://127.0.0.1:1234/api");
    assert_eq!(config.api.timeout_secs, 9);
    assert!(config.api.expert_mode);

    clear_env();
}

#[test]
#[serial]
fn test_invalid_timeout_keeps_default() {
    clear_env();
    std::env::set_var("HOWTANK_TIMEOUT_SECS", "soon");

    let config = Config::load(None).unwrap();

    assert_eq!(config.api.timeout_secs, 5);

    clear_env();
}

#[test]
#[serial]
fn test_zero_timeout_from_env_keeps_file_value() {
    clear_env();
    std::env::set_var("HOWTANK_TIMEOUT_SECS", "0");

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"[api]\ntimeout_secs = 3\n").unwrap();

    let config = Config::load(Some(file.path())).unwrap();

    assert_eq!(config.api.timeout_secs, 3);
    assert!(!config.api.timeout().is_zero());

    clear_env();
}

#[test]
#[serial]
fn test_env_fills_empty_defaults_only() {
    clear_env();
    std::env::set_var("HOWTANK_STREAM_ID", "env-stream");
    std::env::set_var("HOWTANK_MESSAGE", "env message");
    std::env::set_var("HOWTANK_ACCESS_TOKEN", "env-token");

    let mut config = Config::from_toml("[defaults]\nstream_id = \"file-stream\"\n").unwrap();
    config.apply_env();

    assert_eq!(config.defaults.stream_id.as_deref(), Some("file-stream"));
    assert_eq!(config.defaults.message.as_deref(), Some("env message"));
    assert_eq!(config.defaults.access_token.as_deref(), Some("env-token"));

    clear_env();
}

// =============================================================================
// Settings Resolution
// =============================================================================

#[test]
fn test_empty_job_fields_fall_back_to_defaults() {
    let defaults = NotificationSettings {
        stream_id: Some("global".to_string()),
        message: Some("global message".to_string()),
        access_token: Some("global-token".to_string()),
        notify_success: true,
        ..Default::default()
    };
    let job = NotificationSettings {
        stream_id: Some(String::new()),
        message: Some("job message".to_string()),
        ..Default::default()
    };

    let config = job.resolve(&defaults).unwrap();

    assert_eq!(config.stream_id, "global");
    assert_eq!(config.message_template, "job message");
    assert_eq!(config.access_token, "global-token");
    // Trigger flags are not inherited from the defaults
    assert_eq!(config.triggers, TriggerPolicy::AlwaysSend);
}

#[test]
fn test_missing_stream_id_is_a_configuration_error() {
    let job = NotificationSettings {
        message: Some("m".to_string()),
        access_token: Some("t".to_string()),
        ..Default::default()
    };

    let err = job.resolve(&NotificationSettings::default()).unwrap_err();

    assert!(matches!(err, AppError::Configuration(_)));
    assert!(err.to_string().contains("Please add at least one Howtank Stream ID"));
}

#[test]
fn test_missing_message_is_a_configuration_error() {
    let job = NotificationSettings {
        stream_id: Some("s".to_string()),
        access_token: Some("t".to_string()),
        ..Default::default()
    };

    let err = job.resolve(&NotificationSettings::default()).unwrap_err();

    assert!(err.to_string().contains("Please add message"));
}

#[test]
fn test_missing_access_token_is_a_configuration_error() {
    let job = NotificationSettings {
        stream_id: Some("s".to_string()),
        message: Some("m".to_string()),
        ..Default::default()
    };

    assert!(matches!(
        job.resolve(&NotificationSettings::default()),
        Err(AppError::Configuration(_))
    ));
}

#[test]
fn test_merge_prefers_set_fields_and_enables_flags() {
    let file = NotificationSettings {
        stream_id: Some("file".to_string()),
        message: Some("file message".to_string()),
        notify_failure: true,
        ..Default::default()
    };
    let cli = NotificationSettings {
        stream_id: Some("cli".to_string()),
        notify_success: true,
        ..Default::default()
    };

    let merged = file.merge(cli);

    assert_eq!(merged.stream_id.as_deref(), Some("cli"));
    assert_eq!(merged.message.as_deref(), Some("file message"));
    assert!(merged.notify_failure);
    assert!(merged.notify_success);
}
