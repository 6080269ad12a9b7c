//! POST /auth/register and POST /auth/login.
//!
//! Both answer with the account record; its `id` addresses the owner routes
//! under `/users/{uid}`.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use std::sync::Arc;
use wishbox_users::User;

use crate::app::AppState;
use crate::error::ApiResult;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = state.accounts.register(&req.name, &req.email, &req.password)?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(State(state): State<Arc<AppState>>, Json(req): Json<LoginRequest>) -> ApiResult<Json<User>> {
    Ok(Json(state.accounts.login(&req.email, &req.password)?))
}
