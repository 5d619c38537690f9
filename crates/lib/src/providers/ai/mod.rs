pub mod anthropic;
pub mod local;

use crate::errors::SpotError;
use async_trait::async_trait;
use dyn_clone::DynClone;
use std::fmt::Debug;

/// A trait for interacting with a chat-completion AI provider.
///
/// Implementations send one system prompt and one user message and return
/// the model's free-text reply.
#[async_trait]
pub trait AiProvider: Send + Sync + Debug + DynClone {
    /// Generates a reply for the given prompts, limited to `max_tokens`.
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
    ) -> Result<String, SpotError>;
}

dyn_clone::clone_trait_object!(AiProvider);
