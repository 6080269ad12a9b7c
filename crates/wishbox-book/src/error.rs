use thiserror::Error;

/// Errors from the friends / templates / wishes / cards store.
#[derive(Debug, Error)]
pub enum BookError {
    /// The requested row does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// The row exists but belongs to another account.
    #[error("{kind} {id} belongs to another user")]
    Forbidden { kind: &'static str, id: String },

    /// The friend referenced by a wish or card is not one of the owner's.
    #[error("invalid friend selected: {0}")]
    InvalidFriend(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Contribution attempted while the card is locked until the birthday.
    #[error("card {slug} is locked until the birthday")]
    CardLocked { slug: String },

    /// A SQLite operation failed.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, BookError>;
