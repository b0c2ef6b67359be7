use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("API error: {0}")]
    Api(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("AI service error: {0}")]
    AiService(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Notification error: {0}")]
    Notify(String),

    #[error("Report error: {0}")]
    Report(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
