use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubtransError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Bad input or out-of-range configuration, detected before any service call.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A single completion call failed. The client retries these.
    #[error("Completion service error: {0}")]
    Provider(String),

    /// Every attempt for one batch failed; fatal for the whole run.
    #[error("Completion failed after {attempts} attempts: {message}")]
    Completion { attempts: u32, message: String },

    #[error("Translation cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),
}

impl SubtransError {
    /// Message suitable for a terminal `error` event sent to a remote client.
    pub fn client_message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::Completion { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SubtransError>;
