//! # Prompt Templates
//!
//! Default prompts for the two planner tasks. The server loads them as
//! configuration defaults, so `config.yml` or `prompt.yml` can override any
//! of them without a rebuild.

pub mod tasks;

use serde::Deserialize;

/// The prompt pair and token budget used for one planner call.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TaskPrompt {
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: u32,
}

impl TaskPrompt {
    pub fn spot_recommendation() -> Self {
        Self {
            system_prompt: tasks::SPOT_RECOMMENDATION_SYSTEM_PROMPT.to_string(),
            user_prompt: tasks::SPOT_RECOMMENDATION_USER_PROMPT.to_string(),
            max_tokens: tasks::SPOT_RECOMMENDATION_MAX_TOKENS,
        }
    }

    pub fn route_planning() -> Self {
        Self {
            system_prompt: tasks::ROUTE_PLANNING_SYSTEM_PROMPT.to_string(),
            user_prompt: tasks::ROUTE_PLANNING_USER_PROMPT.to_string(),
            max_tokens: tasks::ROUTE_PLANNING_MAX_TOKENS,
        }
    }
}
