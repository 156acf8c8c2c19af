use super::*;
use serial_test::serial;

#[test]
fn test_parse_empty_config_uses_defaults() {
    let config: Config = serde_yaml::from_str("{}").unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.migrations_dir, "migrations");
    assert_eq!(config.ledger_table, "tidemark_migrations");
    assert_eq!(config.schema, "main");
    assert_eq!(config.failure_policy, FailurePolicy::Abort);
    assert_eq!(config.database_url_env, "TIDEMARK_DATABASE_URL");
}

#[test]
fn test_parse_full_config() {
    let yaml = r#"
migrations_dir: db/scripts
ledger_table: ops.applied_scripts
schema: public
failure_policy: continue
database_url_env: APP_DATABASE_URL
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.migrations_dir, "db/scripts");
    assert_eq!(config.ledger_table, "ops.applied_scripts");
    assert_eq!(config.schema, "public");
    assert_eq!(config.failure_policy, FailurePolicy::Continue);
    assert_eq!(config.database_url_env, "APP_DATABASE_URL");
}

#[test]
fn test_unknown_field_rejected() {
    let result: Result<Config, _> = serde_yaml::from_str("migration_dir: typo");
    assert!(result.is_err());
}

#[test]
fn test_unknown_failure_policy_rejected() {
    let result: Result<Config, _> = serde_yaml::from_str("failure_policy: retry");
    assert!(result.is_err());
}

#[test]
fn test_load_from_dir_without_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load_from_dir(dir.path()).unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(
        config.migrations_dir_absolute(dir.path()),
        dir.path().join("migrations")
    );
}

#[test]
fn test_load_from_dir_reads_yaml_variant() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("tidemark.yaml"), "schema: reporting\n").unwrap();
    let config = Config::load_from_dir(dir.path()).unwrap();
    assert_eq!(config.schema, "reporting");
}

#[test]
fn test_load_parse_error_names_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("tidemark.yml"), "schema: [unclosed\n").unwrap();
    let err = Config::load_from_dir(dir.path()).unwrap_err();
    assert!(err.is_configuration_error());
    assert!(err.to_string().contains("tidemark.yml"));
}

#[test]
fn test_validate_rejects_empty_ledger_table() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("tidemark.yml"), "ledger_table: \"\"\n").unwrap();
    let err = Config::load_from_dir(dir.path()).unwrap_err();
    assert!(matches!(err, CoreError::ConfigInvalid { .. }));
}

#[test]
fn test_validate_rejects_malformed_ledger_table() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("tidemark.yml"), "ledger_table: \"ops.\"\n").unwrap();
    assert!(Config::load_from_dir(dir.path()).is_err());
}

#[test]
fn test_failure_policy_display() {
    assert_eq!(FailurePolicy::Abort.to_string(), "abort");
    assert_eq!(FailurePolicy::Continue.to_string(), "continue");
}

#[test]
#[serial]
fn test_resolve_database_url_prefers_cli() {
    std::env::set_var("TM_TEST_URL_CLI", "from_env.duckdb");
    let config = Config {
        database_url_env: "TM_TEST_URL_CLI".to_string(),
        ..Config::default()
    };
    let url = config.resolve_database_url(Some("from_cli.duckdb")).unwrap();
    assert_eq!(url, "from_cli.duckdb");
    std::env::remove_var("TM_TEST_URL_CLI");
}

#[test]
#[serial]
fn test_resolve_database_url_from_env() {
    std::env::set_var("TM_TEST_URL_ENV", "warehouse.duckdb");
    let config = Config {
        database_url_env: "TM_TEST_URL_ENV".to_string(),
        ..Config::default()
    };
    assert_eq!(
        config.resolve_database_url(None).unwrap(),
        "warehouse.duckdb"
    );
    std::env::remove_var("TM_TEST_URL_ENV");
}

#[test]
#[serial]
fn test_resolve_database_url_missing_is_configuration_error() {
    std::env::remove_var("TM_TEST_URL_MISSING");
    let config = Config {
        database_url_env: "TM_TEST_URL_MISSING".to_string(),
        ..Config::default()
    };
    let err = config.resolve_database_url(None).unwrap_err();
    assert!(err.is_configuration_error());
    assert!(err.to_string().contains("TM_TEST_URL_MISSING"));
}

#[test]
#[serial]
fn test_resolve_database_url_blank_env_is_missing() {
    std::env::set_var("TM_TEST_URL_BLANK", "   ");
    let config = Config {
        database_url_env: "TM_TEST_URL_BLANK".to_string(),
        ..Config::default()
    };
    assert!(matches!(
        config.resolve_database_url(None),
        Err(CoreError::MissingDatabaseUrl { .. })
    ));
    std::env::remove_var("TM_TEST_URL_BLANK");
}
