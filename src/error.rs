use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store responded with {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Store did not assign an id for the new entry in {0}")]
    MissingId(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Logger could not be installed: {0}")]
    Logger(#[from] log::SetLoggerError),

    #[error("Check your email and password. Please try again.")]
    InvalidCredentials,

    #[error("An account with this email already exists.")]
    EmailTaken,
}

pub type Result<T> = std::result::Result<T, Error>;
