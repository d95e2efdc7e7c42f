// SPDX-FileCopyrightText: 2026 Elevq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the elevq configuration system.

use elevq_config::diagnostic::ConfigError;
use elevq_config::model::ElevqConfig;
use elevq_config::{load_and_validate, load_and_validate_str, load_config_from_str};
use serial_test::serial;

#[test]
fn full_toml_deserializes() {
    let toml = r#"
[queue]
timezone = "Asia/Almaty"
slot_duration_minutes = 45
reminder_offsets_minutes = [120, 15]
poll_interval_secs = 10

[telegram]
driver_bot_token = "111:AAA"
dispatcher_bot_token = "222:BBB"
allowed_dispatchers = ["alice", "42"]

[storage]
database_path = "/tmp/elevq-test.db"
wal_mode = false

[logging]
level = "debug"
json = true

[metrics]
enabled = true
listen_address = "0.0.0.0:9000"
"#;

    let config = load_and_validate_str(toml).expect("valid TOML should load");
    assert_eq!(config.queue.timezone, "Asia/Almaty");
    assert_eq!(config.queue.slot_duration_minutes, 45);
    assert_eq!(config.queue.reminder_offsets_minutes, vec![120, 15]);
    assert_eq!(config.queue.poll_interval_secs, 10);
    assert_eq!(config.telegram.driver_bot_token.as_deref(), Some("111:AAA"));
    assert_eq!(config.telegram.dispatcher_bot_token.as_deref(), Some("222:BBB"));
    assert_eq!(config.telegram.allowed_dispatchers, vec!["alice", "42"]);
    assert_eq!(config.storage.database_path, "/tmp/elevq-test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.logging.level, "debug");
    assert!(config.logging.json);
    assert!(config.metrics.enabled);
}

#[test]
fn empty_toml_uses_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");
    assert_eq!(config.queue.timezone, "Europe/Moscow");
    assert_eq!(config.queue.slot_duration_minutes, 60);
    assert_eq!(config.queue.reminder_offsets_minutes, vec![60, 30]);
    assert_eq!(config.queue.poll_interval_secs, 30);
    assert!(config.telegram.driver_bot_token.is_none());
    assert!(config.telegram.allowed_dispatchers.is_empty());
    assert_eq!(config.storage.database_path, "elevq.db");
    assert!(config.storage.wal_mode);
    assert_eq!(config.logging.level, "info");
    assert!(!config.metrics.enabled);
}

#[test]
fn unknown_key_gets_a_suggestion() {
    let toml = "[queue]\nslot_duraton_minutes = 30\n";
    let errors = load_and_validate_str(toml).expect_err("unknown key must be rejected");
    match &errors[0] {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => {
            assert_eq!(key, "slot_duraton_minutes");
            assert_eq!(suggestion.as_deref(), Some("slot_duration_minutes"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn unknown_section_is_rejected() {
    let err = load_config_from_str("[agent]\nname = \"x\"\n")
        .expect_err("unknown top-level section should be rejected");
    assert!(err.to_string().contains("agent"), "got: {err}");
}

#[test]
fn wrong_type_is_reported() {
    let errors = load_and_validate_str("[queue]\npoll_interval_secs = \"often\"\n")
        .expect_err("string for integer must fail");
    assert!(matches!(errors[0], ConfigError::InvalidType { .. }), "{errors:?}");
}

#[test]
fn bad_timezone_fails_validation() {
    let errors = load_and_validate_str("[queue]\ntimezone = \"Nowhere/City\"\n")
        .expect_err("unknown timezone must fail");
    assert!(matches!(errors[0], ConfigError::Validation { .. }));
}

#[test]
fn inline_override_wins_over_defaults() {
    use figment::{
        Figment,
        providers::{Format, Serialized, Toml},
    };

    let config: ElevqConfig = Figment::new()
        .merge(Serialized::defaults(ElevqConfig::default()))
        .merge(Toml::string("[queue]\nslot_duration_minutes = 30\n"))
        .merge(("queue.slot_duration_minutes", 20))
        .extract()
        .expect("should merge override");
    assert_eq!(config.queue.slot_duration_minutes, 20);
}

#[test]
#[serial]
fn explicit_file_and_env_are_layered() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.toml");
    std::fs::write(
        &path,
        "[queue]\nslot_duration_minutes = 30\n[storage]\ndatabase_path = \"from-file.db\"\n",
    )
    .unwrap();

    // SAFETY: serialized with other env-touching tests.
    unsafe { std::env::set_var("ELEVQ_STORAGE_DATABASE_PATH", "from-env.db") };
    let result = load_and_validate(Some(&path));
    unsafe { std::env::remove_var("ELEVQ_STORAGE_DATABASE_PATH") };

    let config = result.expect("layered config should load");
    assert_eq!(config.queue.slot_duration_minutes, 30);
    assert_eq!(config.storage.database_path, "from-env.db");
}

#[test]
#[serial]
fn env_token_maps_to_dotted_key() {
    // SAFETY: serialized with other env-touching tests.
    unsafe { std::env::set_var("ELEVQ_TELEGRAM_DRIVER_BOT_TOKEN", "999:ZZZ") };
    let result = load_and_validate(None);
    unsafe { std::env::remove_var("ELEVQ_TELEGRAM_DRIVER_BOT_TOKEN") };

    let config = result.expect("env override should load");
    assert_eq!(config.telegram.driver_bot_token.as_deref(), Some("999:ZZZ"));
}
