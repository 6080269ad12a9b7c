use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;
use wishbox_book::BookError;
use wishbox_core::WishboxError;
use wishbox_users::UserError;

/// Handler error: a [`WishboxError`] rendered as `{"error", "code"}` with
/// the matching status.
#[derive(Debug)]
pub struct ApiError(pub WishboxError);

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            WishboxError::NotFound(_) => StatusCode::NOT_FOUND,
            WishboxError::Forbidden(_) => StatusCode::FORBIDDEN,
            WishboxError::AlreadyExists(_) => StatusCode::CONFLICT,
            WishboxError::InvalidInput(_) | WishboxError::Serialization(_) => StatusCode::BAD_REQUEST,
            WishboxError::Locked(_) => StatusCode::LOCKED,
            WishboxError::AuthFailed(_) => StatusCode::UNAUTHORIZED,
            WishboxError::Config(_)
            | WishboxError::Database(_)
            | WishboxError::Io(_)
            | WishboxError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(code = self.0.code(), "request failed: {}", self.0);
        }
        let body = json!({
            "error": self.0.to_string(),
            "code": self.0.code(),
        });
        (status, Json(body)).into_response()
    }
}

impl From<WishboxError> for ApiError {
    fn from(e: WishboxError) -> Self {
        ApiError(e)
    }
}

impl From<BookError> for ApiError {
    fn from(e: BookError) -> Self {
        let mapped = match e {
            BookError::NotFound { .. } => WishboxError::NotFound(e.to_string()),
            BookError::Forbidden { .. } => WishboxError::Forbidden(e.to_string()),
            BookError::InvalidFriend(_) | BookError::InvalidInput(_) => WishboxError::InvalidInput(e.to_string()),
            BookError::CardLocked { .. } => WishboxError::Locked(e.to_string()),
            BookError::Database(_) => WishboxError::Database(e.to_string()),
        };
        ApiError(mapped)
    }
}

impl From<UserError> for ApiError {
    fn from(e: UserError) -> Self {
        let mapped = match e {
            UserError::NotFound(_) => WishboxError::NotFound(e.to_string()),
            UserError::AlreadyExists(_) => WishboxError::AlreadyExists(e.to_string()),
            UserError::InvalidCredentials => WishboxError::AuthFailed(e.to_string()),
            UserError::InvalidInput(_) => WishboxError::InvalidInput(e.to_string()),
            UserError::DatabaseError(_) => WishboxError::Database(e.to_string()),
            UserError::PasswordHash(_) => WishboxError::Internal(e.to_string()),
        };
        ApiError(mapped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn book_errors_map_to_statuses() {
        let locked = ApiError::from(BookError::CardLocked { slug: "abc".into() });
        assert_eq!(locked.status(), StatusCode::LOCKED);
        assert_eq!(locked.0.code(), "LOCKED");

        let forbidden = ApiError::from(BookError::Forbidden {
            kind: "wish",
            id: "w1".into(),
        });
        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

        let invalid = ApiError::from(BookError::InvalidFriend("f9".into()));
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn user_errors_map_to_statuses() {
        assert_eq!(ApiError::from(UserError::InvalidCredentials).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::from(UserError::AlreadyExists("a@b.c".into())).status(),
            StatusCode::CONFLICT
        );
    }
}
