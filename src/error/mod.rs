use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Assistant service error: {0}")]
    Api(String),

    #[error("Run {run_id} ended as {status}: {message}")]
    RunFailed {
        run_id: String,
        status: String,
        message: String,
    },

    #[error("Run {run_id} did not complete within {seconds}s")]
    RunTimeout { run_id: String, seconds: u64 },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Secure storage error: {0}")]
    SecureStorage(#[from] keyring::Error),
}

impl Error {
    pub fn platform(msg: impl Into<String>) -> Self {
        Error::Platform(msg.into())
    }

    pub fn api(msg: impl Into<String>) -> Self {
        Error::Api(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub fn session(msg: impl Into<String>) -> Self {
        Error::Session(msg.into())
    }
}
