use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use wishbox_book::types::{TemplateInput, WishTemplate};

use crate::app::AppState;
use crate::error::ApiResult;
use crate::http::owner;

pub async fn list(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
) -> ApiResult<Json<Vec<WishTemplate>>> {
    owner(&state, &uid)?;
    Ok(Json(state.templates.list(&uid)?))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
    Json(input): Json<TemplateInput>,
) -> ApiResult<(StatusCode, Json<WishTemplate>)> {
    owner(&state, &uid)?;
    let template = state.templates.create(&uid, &input, state.now())?;
    Ok((StatusCode::CREATED, Json(template)))
}

pub async fn show(
    State(state): State<Arc<AppState>>,
    Path((uid, id)): Path<(String, String)>,
) -> ApiResult<Json<WishTemplate>> {
    Ok(Json(state.templates.get(&uid, &id)?))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Path((uid, id)): Path<(String, String)>,
    Json(input): Json<TemplateInput>,
) -> ApiResult<Json<WishTemplate>> {
    Ok(Json(state.templates.update(&uid, &id, &input, state.now())?))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path((uid, id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    state.templates.delete(&uid, &id)?;
    Ok(StatusCode::NO_CONTENT)
}
