pub mod accounts;
pub mod cards;
pub mod dashboard;
pub mod friends;
pub mod health;
pub mod public;
pub mod templates;
pub mod wishes;

use wishbox_core::WishboxError;
use wishbox_users::User;

use crate::app::AppState;
use crate::error::ApiResult;

/// Resolve the `{uid}` path segment to an account, 404 if unknown.
pub(crate) fn owner(state: &AppState, uid: &str) -> ApiResult<User> {
    state
        .accounts
        .get(uid)?
        .ok_or_else(|| WishboxError::NotFound(format!("user {uid}")).into())
}
