//! # Application Configuration
//!
//! This module defines the configuration structure for the `drivespot-server` and
//! provides the logic for loading it from layered YAML files and environment
//! variables.

use config::{
    Config as ConfigBuilder, Environment, File, FileFormat, Value as ConfigValue,
    ValueKind as ConfigValueKind,
};
use drivespot::{
    constants::DEFAULT_DB_FILE, prompts::TaskPrompt, providers::factory::ProviderConfig,
    RecommendSettings, RouteSettings,
};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::fs;
use tracing::info;

/// The task key for the spot recommendation prompt.
pub const SPOT_RECOMMENDATION_TASK: &str = "spot_recommendation";
/// The task key for the route planning prompt.
pub const ROUTE_PLANNING_TASK: &str = "route_planning";
/// The provider every default task points at.
pub const DEFAULT_PROVIDER_NAME: &str = "llm_default";

/// A custom error type for configuration issues.
#[derive(Debug)]
pub enum ConfigError {
    /// Indicates an error from the underlying `config` crate.
    General(String),
    /// Indicates a required configuration file was not found.
    NotFound(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::General(msg) => write!(f, "Configuration error: {msg}"),
            ConfigError::NotFound(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::General(err.to_string())
    }
}

/// The root configuration structure, mapping directly to `config.yml`.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// The port for the server to listen on. Loaded from `PORT` env var.
    #[serde(default = "default_port")]
    pub port: u16,
    /// The path to the SQLite database file. Loaded from `DB_URL` env var.
    #[serde(default = "default_db_url")]
    pub db_url: String,
    /// Directory served under `/static`.
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    /// Directory holding `index.html`.
    #[serde(default = "default_templates_dir")]
    pub templates_dir: String,

    /// A map of named, reusable AI provider configurations.
    pub providers: HashMap<String, ProviderConfig>,
    /// A map of tasks, each specifying a provider and prompts.
    pub tasks: HashMap<String, TaskConfig>,

    #[serde(default)]
    pub recommendation: RecommendSettings,
    #[serde(default)]
    pub route: RouteSettings,
    #[serde(default)]
    pub overpass: OverpassConfig,
}

fn default_port() -> u16 {
    8000
}

fn default_db_url() -> String {
    DEFAULT_DB_FILE.to_string()
}

fn default_static_dir() -> String {
    format!("{}/static", env!("CARGO_MANIFEST_DIR"))
}

fn default_templates_dir() -> String {
    format!("{}/templates", env!("CARGO_MANIFEST_DIR"))
}

/// Where POI imports are fetched from.
#[derive(Debug, Deserialize, Clone)]
pub struct OverpassConfig {
    #[serde(default = "default_overpass_url")]
    pub api_url: String,
    #[serde(default = "default_overpass_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OverpassConfig {
    fn default() -> Self {
        Self {
            api_url: default_overpass_url(),
            timeout_secs: default_overpass_timeout_secs(),
        }
    }
}

fn default_overpass_url() -> String {
    "https://overpass-api.de/api/interpreter".to_string()
}

fn default_overpass_timeout_secs() -> u64 {
    60
}

/// Defines the prompts and provider for a specific application task.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct TaskConfig {
    /// The key of the provider to use from the `providers` map.
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub user_prompt: Option<String>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

/// Constructs a `config::Value` map of the default tasks from the library.
/// This serves as the base layer of configuration.
fn build_default_tasks() -> HashMap<String, ConfigValue> {
    let tasks = [
        (SPOT_RECOMMENDATION_TASK, TaskPrompt::spot_recommendation()),
        (ROUTE_PLANNING_TASK, TaskPrompt::route_planning()),
    ];

    tasks
        .into_iter()
        .map(|(name, prompt)| {
            let mut table = HashMap::new();
            table.insert(
                "provider".to_string(),
                ConfigValue::from(DEFAULT_PROVIDER_NAME),
            );
            table.insert(
                "system_prompt".to_string(),
                ConfigValue::from(prompt.system_prompt),
            );
            table.insert(
                "user_prompt".to_string(),
                ConfigValue::from(prompt.user_prompt),
            );
            table.insert(
                "max_tokens".to_string(),
                ConfigValue::from(i64::from(prompt.max_tokens)),
            );
            (
                name.to_string(),
                ConfigValue::new(None, ConfigValueKind::Table(table)),
            )
        })
        .collect()
}

// Reads a file and substitutes `${VAR}` placeholders from the environment.
// Returns Ok(None) if the file does not exist.
fn read_and_substitute(path: &str) -> Result<Option<String>, ConfigError> {
    if !std::path::Path::new(path).exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .map_err(|e| ConfigError::General(format!("Failed to read config file '{path}': {e}")))?;

    let re = Regex::new(r"\$\{(?P<var>[A-Z0-9_]+)\}")
        .map_err(|e| ConfigError::General(e.to_string()))?;
    let expanded_content = re.replace_all(&content, |caps: &regex::Captures| {
        env::var(&caps["var"]).unwrap_or_default()
    });

    Ok(Some(expanded_content.to_string()))
}

/// Loads the application configuration from files and environment variables.
///
/// - Top-level keys like `port` and `db_url` are overridden by `PORT` and `DB_URL`.
/// - Nested keys are overridden by `DRIVESPOT_...` variables
///   (e.g., `DRIVESPOT_ROUTE__RANDOM_SEED`).
pub fn get_config(config_path_override: Option<&str>) -> Result<AppConfig, ConfigError> {
    let base_path = env!("CARGO_MANIFEST_DIR");
    let mut builder = ConfigBuilder::builder()
        // Layer 1: Programmatic defaults from the library.
        .set_default("tasks", build_default_tasks())?;

    // Layer 2: Main config, with a provider-specific fallback.
    let main_config_path = if let Some(override_path) = config_path_override {
        override_path.to_string()
    } else {
        let user_config_path = format!("{base_path}/config.yml");
        if std::path::Path::new(&user_config_path).exists() {
            info!("Loading user-defined configuration from '{user_config_path}'.");
            user_config_path
        } else {
            let provider = env::var("AI_PROVIDER").unwrap_or_else(|_| "local".to_string());
            let fallback_path = format!("{base_path}/config.{provider}.yml");
            info!("'{user_config_path}' not found. Falling back to '{fallback_path}' based on AI_PROVIDER='{provider}'.");
            fallback_path
        }
    };

    let main_content = read_and_substitute(&main_config_path)?
        .ok_or_else(|| ConfigError::NotFound(format!("Main config file not found at '{main_config_path}'. Please ensure 'config.yml' exists or AI_PROVIDER names a valid template ('anthropic' or 'local').")))?;
    builder = builder.add_source(File::from_str(&main_content, FileFormat::Yaml));

    // Layer 3: Prompt overrides (optional).
    let user_prompt_path = format!("{base_path}/prompt.yml");
    if let Some(user_prompts_content) = read_and_substitute(&user_prompt_path)? {
        info!("Loading user prompt overrides from '{user_prompt_path}'.");
        builder = builder.add_source(File::from_str(&user_prompts_content, FileFormat::Yaml));
    }

    let settings = builder
        // Layer 4: Top-level keys like PORT and DB_URL.
        .add_source(Environment::default())
        // Layer 5: Prefixed variables for nested overrides.
        .add_source(
            Environment::with_prefix("DRIVESPOT")
                .prefix_separator("_")
                .try_parsing(true)
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
