use anyhow::Result;
use async_trait::async_trait;
use drivespot::{
    categories::Category,
    errors::SpotError,
    providers::{ai::AiProvider, db::sqlite::SqliteProvider},
    types::{NewSpot, Spot},
};
use std::collections::VecDeque;
use std::fmt::Debug;
use std::sync::{Arc, Mutex};

// --- Test Setup ---

/// A helper struct to manage database creation for each test.
pub struct TestSetup {
    pub db: SqliteProvider,
}

impl TestSetup {
    /// Creates a new, isolated in-memory database and initializes the schema.
    pub async fn new() -> Result<Self> {
        let db = SqliteProvider::new(":memory:").await?;
        db.initialize_schema().await?;
        Ok(Self { db })
    }

    /// Inserts the given spots and returns them as stored, in order.
    pub async fn seed(&self, spots: Vec<NewSpot>) -> Result<Vec<Spot>> {
        let mut stored = Vec::with_capacity(spots.len());
        for spot in spots {
            stored.push(self.db.create_spot(spot).await?);
        }
        Ok(stored)
    }
}

// --- Fixtures ---

/// Tokyo Station, the origin most tests measure from.
pub const ORIGIN: (f64, f64) = (35.6812, 139.7671);

/// Degrees of latitude per kilometre, close enough for test fixtures.
const DEG_PER_KM: f64 = 1.0 / 111.19;

/// A spot `km_north` kilometres due north of [`ORIGIN`].
pub fn spot_north(name: &str, category: Category, km_north: f64) -> NewSpot {
    NewSpot {
        name: name.to_string(),
        description: Some(format!("{name}の説明")),
        category,
        latitude: ORIGIN.0 + km_north * DEG_PER_KM,
        longitude: ORIGIN.1,
        address: None,
        image_url: None,
        rating: 4.0,
        opening_time: None,
        closing_time: None,
        closed_days: None,
        created_by: Some("test".to_string()),
        source_ref: None,
    }
}

// --- Mock AI Provider ---

/// One recorded call to [`MockAiProvider`].
#[derive(Clone, Debug, PartialEq)]
pub struct MockCall {
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: u32,
}

/// A scripted AI provider.
///
/// Replies are returned in the order they were queued. Once the queue is
/// empty every call fails with `AiApi`, the same way an unreachable model
/// would.
#[derive(Clone, Debug, Default)]
pub struct MockAiProvider {
    responses: Arc<Mutex<VecDeque<Result<String, String>>>>,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

impl MockAiProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider that answers with `responses`, in order.
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mock = Self::new();
        for response in responses {
            mock.push_response(response);
        }
        mock
    }

    pub fn push_response(&self, response: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(response.into()));
    }

    /// Queues a failed call.
    pub fn push_error(&self, message: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(message.into()));
    }

    /// Retrieves the recorded calls for assertion.
    pub fn get_calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AiProvider for MockAiProvider {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
    ) -> Result<String, SpotError> {
        self.calls.lock().unwrap().push(MockCall {
            system_prompt: system_prompt.to_string(),
            user_prompt: user_prompt.to_string(),
            max_tokens,
        });

        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(SpotError::AiApi(message)),
            None => Err(SpotError::AiApi(
                "MockAiProvider: no response programmed".to_string(),
            )),
        }
    }
}
