//! Bearer-token guard for the owner-scoped API.
//!
//! `Authorization: Bearer <token>` must match `gateway.auth.token` when
//! `gateway.auth.mode = "token"`. Public reveal and share routes sit outside
//! this layer.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;
use wishbox_core::config::{AuthConfig, AuthMode};
use wishbox_core::WishboxError;

use crate::app::AppState;
use crate::error::ApiError;

pub async fn require_token(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Response {
    if check_auth(&state.config.gateway.auth, &headers) {
        return next.run(request).await;
    }
    warn!(path = %request.uri().path(), "rejected request without a valid bearer token");
    ApiError::from(WishboxError::AuthFailed(
        "Unauthorized. Set 'Authorization: Bearer <your-token>' header.".to_string(),
    ))
    .into_response()
}

/// Returns true if the request is authorised.
pub fn check_auth(auth: &AuthConfig, headers: &HeaderMap) -> bool {
    match auth.mode {
        AuthMode::None => true,
        AuthMode::Token => {
            let expected = match &auth.token {
                Some(t) => t.as_str(),
                // Token mode configured but no token value: deny.
                None => return false,
            };
            extract_bearer(headers).map(|t| t == expected).unwrap_or(false)
        }
    }
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn token_auth(token: Option<&str>) -> AuthConfig {
        AuthConfig {
            mode: AuthMode::Token,
            token: token.map(String::from),
        }
    }

    fn bearer(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn token_mode_requires_matching_bearer() {
        let auth = token_auth(Some("s3cret"));
        assert!(check_auth(&auth, &bearer("Bearer s3cret")));
        assert!(!check_auth(&auth, &bearer("Bearer nope")));
        assert!(!check_auth(&auth, &bearer("s3cret")));
        assert!(!check_auth(&auth, &HeaderMap::new()));
    }

    #[test]
    fn token_mode_without_token_denies_everything() {
        assert!(!check_auth(&token_auth(None), &bearer("Bearer anything")));
    }

    #[test]
    fn none_mode_allows_all() {
        let auth = AuthConfig {
            mode: AuthMode::None,
            token: None,
        };
        assert!(check_auth(&auth, &HeaderMap::new()));
    }
}
