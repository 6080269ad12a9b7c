use thiserror::Error;

#[derive(Debug, Error)]
pub enum WishboxError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Write attempted on a card that is locked until the birthday.
    #[error("Locked until the birthday: {0}")]
    Locked(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WishboxError {
    /// Short error code string sent to clients in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            WishboxError::Config(_) => "CONFIG_ERROR",
            WishboxError::AuthFailed(_) => "AUTH_FAILED",
            WishboxError::NotFound(_) => "NOT_FOUND",
            WishboxError::Forbidden(_) => "FORBIDDEN",
            WishboxError::AlreadyExists(_) => "ALREADY_EXISTS",
            WishboxError::InvalidInput(_) => "INVALID_INPUT",
            WishboxError::Locked(_) => "LOCKED",
            WishboxError::Database(_) => "DATABASE_ERROR",
            WishboxError::Serialization(_) => "SERIALIZATION_ERROR",
            WishboxError::Io(_) => "IO_ERROR",
            WishboxError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, WishboxError>;
