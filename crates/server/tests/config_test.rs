//! # Configuration Tests
//!
//! Environment variables are process-global, so every test here runs under
//! `#[serial]`.

use drivespot::prompts::tasks::{ROUTE_PLANNING_USER_PROMPT, SPOT_RECOMMENDATION_MAX_TOKENS};
use drivespot_server::config::{
    get_config, ConfigError, DEFAULT_PROVIDER_NAME, ROUTE_PLANNING_TASK, SPOT_RECOMMENDATION_TASK,
};
use serial_test::serial;
use std::{env, fs};
use tempfile::{tempdir, TempDir};

const ENV_VARS: &[&str] = &[
    "PORT",
    "DB_URL",
    "DRIVESPOT_ROUTE__RANDOM_SEED",
    "DRIVESPOT_RECOMMENDATION__CANDIDATE_LIMIT",
    "TEST_DRIVESPOT_API_KEY",
];

fn clear_env_vars() {
    for var in ENV_VARS {
        env::remove_var(var);
    }
}

fn write_config(content: &str) -> (TempDir, String) {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("config.yml");
    fs::write(&path, content).expect("write config");
    let path = path.to_str().unwrap().to_string();
    (dir, path)
}

const MINIMAL: &str = r#"
providers:
  llm_default:
    provider: "local"
    api_url: "http://localhost:1234/v1/chat/completions"
    model_name: "test-model"
"#;

#[test]
#[serial]
fn test_defaults_fill_unset_keys() {
    clear_env_vars();
    let (_dir, path) = write_config(MINIMAL);

    let config = get_config(Some(&path)).expect("config should load");

    assert_eq!(config.port, 8000);
    assert_eq!(config.db_url, "db/drivespot.db");
    assert!(config.templates_dir.ends_with("/templates"));
    assert!(config.static_dir.ends_with("/static"));
    assert_eq!(config.providers["llm_default"].timeout_secs, 30);
    assert_eq!(config.recommendation.default_max_distance_km, 100.0);
    assert_eq!(config.recommendation.candidate_limit, 30);
    assert_eq!(config.route.random_seed, None);
    assert_eq!(config.route.recent_route_limit, 20);
    assert_eq!(config.overpass.timeout_secs, 60);

    let recommendation = &config.tasks[SPOT_RECOMMENDATION_TASK];
    assert_eq!(recommendation.provider.as_deref(), Some(DEFAULT_PROVIDER_NAME));
    assert_eq!(recommendation.max_tokens, Some(SPOT_RECOMMENDATION_MAX_TOKENS));
    let route = &config.tasks[ROUTE_PLANNING_TASK];
    assert_eq!(route.user_prompt.as_deref(), Some(ROUTE_PLANNING_USER_PROMPT));
    assert_eq!(route.max_tokens, Some(600));
}

#[test]
#[serial]
fn test_placeholders_are_substituted() {
    clear_env_vars();
    env::set_var("TEST_DRIVESPOT_API_KEY", "sk-test-123");
    let (_dir, path) = write_config(
        r#"
providers:
  llm_default:
    provider: "anthropic"
    api_url: "https://api.anthropic.com/v1/messages"
    api_key: "${TEST_DRIVESPOT_API_KEY}"
    model_name: "test-model"
"#,
    );

    let config = get_config(Some(&path)).expect("config should load");
    assert_eq!(
        config.providers["llm_default"].api_key.as_deref(),
        Some("sk-test-123")
    );
    clear_env_vars();
}

#[test]
#[serial]
fn test_environment_overrides_files() {
    clear_env_vars();
    env::set_var("PORT", "9999");
    env::set_var("DB_URL", "/tmp/override.db");
    env::set_var("DRIVESPOT_ROUTE__RANDOM_SEED", "7");
    env::set_var("DRIVESPOT_RECOMMENDATION__CANDIDATE_LIMIT", "10");
    let (_dir, path) = write_config(&format!("port: 1234\n{MINIMAL}"));

    let config = get_config(Some(&path)).expect("config should load");
    assert_eq!(config.port, 9999);
    assert_eq!(config.db_url, "/tmp/override.db");
    assert_eq!(config.route.random_seed, Some(7));
    assert_eq!(config.recommendation.candidate_limit, 10);
    clear_env_vars();
}

#[test]
#[serial]
fn test_partial_task_override_keeps_defaults() {
    clear_env_vars();
    let (_dir, path) = write_config(&format!(
        "{MINIMAL}\ntasks:\n  route_planning:\n    max_tokens: 900\n"
    ));

    let config = get_config(Some(&path)).expect("config should load");
    let route = &config.tasks[ROUTE_PLANNING_TASK];
    assert_eq!(route.max_tokens, Some(900));
    assert_eq!(route.user_prompt.as_deref(), Some(ROUTE_PLANNING_USER_PROMPT));
    assert_eq!(route.provider.as_deref(), Some(DEFAULT_PROVIDER_NAME));
}

#[test]
#[serial]
fn test_missing_main_config_is_reported() {
    clear_env_vars();
    let result = get_config(Some("/definitely/not/here/config.yml"));
    assert!(matches!(result, Err(ConfigError::NotFound(_))));
}
