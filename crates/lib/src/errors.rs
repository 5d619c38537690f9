use thiserror::Error;

/// Custom error types for the drive spot library.
#[derive(Error, Debug)]
pub enum SpotError {
    #[error("Failed to build Reqwest client: {0}")]
    ReqwestClientBuild(reqwest::Error),
    #[error("Failed to send request to AI provider: {0}")]
    AiRequest(reqwest::Error),
    #[error("Failed to deserialize AI provider response: {0}")]
    AiDeserialization(reqwest::Error),
    #[error("AI provider returned an error: {0}")]
    AiApi(String),
    #[error("Unsupported AI provider: {0}")]
    UnsupportedAiProvider(String),
    #[error("Failed to connect to storage: {0}")]
    StorageConnection(String),
    #[error("Storage operation failed: {0}")]
    StorageOperationFailed(String),
    #[error("POI source request failed: {0}")]
    PoiSource(String),
    #[error("JSON serialization/deserialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<turso::Error> for SpotError {
    fn from(err: turso::Error) -> Self {
        SpotError::StorageOperationFailed(err.to_string())
    }
}
