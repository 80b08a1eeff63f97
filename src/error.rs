use thiserror::Error;

/// Custom error type for Concierge operations.
#[derive(Debug, Error)]
pub enum ConciergeError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(String),

    /// Requested entity was not found.
    #[error("Not found: {entity_type} with id '{id}'")]
    NotFound { entity_type: String, id: String },

    /// Input validation failed.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration is missing or malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An external service is not configured; the feature is unavailable.
    #[error("Feature unavailable: {0}")]
    Unavailable(String),

    /// Text-completion service call failed.
    #[error("Completion service error: {0}")]
    Completion(String),

    /// Image-generation service call failed.
    #[error("Image service error: {0}")]
    Image(String),

    /// Messaging dispatcher call failed.
    #[error("Messaging error: {0}")]
    Messaging(String),
}

impl From<surrealdb::Error> for ConciergeError {
    fn from(err: surrealdb::Error) -> Self {
        ConciergeError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for ConciergeError {
    fn from(err: serde_json::Error) -> Self {
        ConciergeError::Database(format!("JSON serialization error: {}", err))
    }
}

impl From<std::io::Error> for ConciergeError {
    fn from(err: std::io::Error) -> Self {
        ConciergeError::Database(format!("I/O error: {}", err))
    }
}
