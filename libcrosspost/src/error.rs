//! Error types for Crosspost

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CrosspostError>;

#[derive(Error, Debug)]
pub enum CrosspostError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Vault error: {0}")]
    Vault(#[from] VaultError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Schedule not found: {0}")]
    ScheduleNotFound(String),

    #[error("Publish already in flight for schedule: {0}")]
    PublishInFlight(String),
}

impl CrosspostError {
    /// HTTP status the API layer maps this error to.
    ///
    /// Adapter outcomes are not errors; they carry their own mapping on
    /// `PublishResult`. This covers the short-circuit paths that reject a
    /// dispatch before any adapter runs.
    pub fn http_status(&self) -> u16 {
        match self {
            CrosspostError::InvalidInput(_) => 400,
            CrosspostError::ScheduleNotFound(_) => 404,
            CrosspostError::PublishInFlight(_) => 409,
            CrosspostError::Config(_) | CrosspostError::Database(_) | CrosspostError::Vault(_) => {
                500
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database operation failed: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Corrupt row: {0}")]
    CorruptRow(String),
}

#[derive(Error, Debug, Clone)]
pub enum VaultError {
    #[error("Invalid vault key: {0}")]
    InvalidKey(String),

    #[error("Malformed secret material: {0}")]
    Malformed(String),

    #[error("Decryption failed for slug '{0}'")]
    DecryptFailed(String),
}
