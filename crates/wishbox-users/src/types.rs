use serde::{Deserialize, Serialize};

/// An account that owns friends, templates, wishes and cards.
///
/// The password hash never leaves the users crate; it is read only inside
/// [`crate::accounts::AccountManager::login`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// UUIDv7: time-sortable, useful for log correlation.
    pub id: String,
    pub name: String,
    /// Stored trimmed and lowercased; unique.
    pub email: String,
    // Audit timestamps (ISO-8601)
    pub created_at: String,
    pub updated_at: String,
}
