//! # Application State
//!
//! This module defines the shared application state (`AppState`) and the logic
//! for building it at startup. The `AppState` holds the configuration, the
//! store, the instantiated AI provider clients and the POI import client.

use crate::{config::AppConfig, errors::AppError};
use drivespot::{
    ingest::OverpassClient,
    prompts::TaskPrompt,
    providers::{ai::AiProvider, db::sqlite::SqliteProvider, factory::create_provider},
};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tracing::info;

/// A fully resolved task configuration with non-optional fields.
#[derive(Clone, Debug)]
pub struct ResolvedTask {
    pub provider: String,
    pub prompt: TaskPrompt,
}

/// The shared application state, accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration.
    pub config: Arc<AppConfig>,
    /// A map of fully resolved tasks, ready for use by handlers.
    pub tasks: Arc<HashMap<String, ResolvedTask>>,
    /// Spots and per-user history.
    pub sqlite_provider: Arc<SqliteProvider>,
    /// A map of instantiated AI providers, keyed by their name from the config.
    pub ai_providers: Arc<HashMap<String, Box<dyn AiProvider>>>,
    /// Client for bulk POI imports.
    pub overpass: Arc<OverpassClient>,
}

impl AppState {
    /// Looks up a task together with the provider it is bound to.
    pub fn task(&self, name: &str) -> Result<(&TaskPrompt, &dyn AiProvider), AppError> {
        let task = self
            .tasks
            .get(name)
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Task '{name}' is not configured")))?;
        let provider = self.ai_providers.get(&task.provider).ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "Provider '{}' for task '{name}' is not configured",
                task.provider
            ))
        })?;
        Ok((&task.prompt, &**provider))
    }
}

/// Builds the shared application state from the configuration.
///
/// Instantiates every configured AI provider, resolves each task against
/// them, opens the store and ensures its schema exists.
pub async fn build_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let mut ai_providers = HashMap::new();
    for (name, provider_config) in &config.providers {
        let provider = create_provider(name, provider_config)?;
        ai_providers.insert(name.clone(), provider);
    }

    // Defaults guarantee every field of the built-in tasks; a missing one
    // means a malformed override.
    let mut resolved_tasks = HashMap::new();
    for (name, task_config) in &config.tasks {
        let provider = task_config.provider.clone().ok_or_else(|| {
            anyhow::anyhow!("Resolved task '{name}' is missing required 'provider' field")
        })?;
        if !ai_providers.contains_key(&provider) {
            return Err(anyhow::anyhow!(
                "Task '{name}' refers to unknown provider '{provider}'"
            ));
        }
        let system_prompt = task_config.system_prompt.clone().ok_or_else(|| {
            anyhow::anyhow!("Resolved task '{name}' is missing required 'system_prompt' field")
        })?;
        let user_prompt = task_config.user_prompt.clone().ok_or_else(|| {
            anyhow::anyhow!("Resolved task '{name}' is missing required 'user_prompt' field")
        })?;
        let max_tokens = task_config.max_tokens.ok_or_else(|| {
            anyhow::anyhow!("Resolved task '{name}' is missing required 'max_tokens' field")
        })?;

        resolved_tasks.insert(
            name.clone(),
            ResolvedTask {
                provider,
                prompt: TaskPrompt {
                    system_prompt,
                    user_prompt,
                    max_tokens,
                },
            },
        );
    }

    if let Some(parent) = std::path::Path::new(&config.db_url).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let sqlite_provider = SqliteProvider::new(&config.db_url).await?;
    sqlite_provider.initialize_schema().await?;
    info!(db_path = %config.db_url, "Initialized spot store (SQLite).");

    let overpass = OverpassClient::new(
        config.overpass.api_url.clone(),
        Duration::from_secs(config.overpass.timeout_secs),
    )?;

    Ok(AppState {
        config: Arc::new(config),
        tasks: Arc::new(resolved_tasks),
        sqlite_provider: Arc::new(sqlite_provider),
        ai_providers: Arc::new(ai_providers),
        overpass: Arc::new(overpass),
    })
}
