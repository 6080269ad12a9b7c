//! Owner wish endpoints under `/users/{uid}/wishes`.
//!
//! Reads go through the visibility evaluator: a sealed time capsule comes
//! back with `"body": null` and `"hidden": true`, even to its author.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use wishbox_book::types::{Tone, Wish, WishInput, WishView};
use wishbox_book::MarkSent;
use wishbox_core::clock::parse_instant;
use wishbox_core::WishboxError;

use crate::app::AppState;
use crate::error::ApiResult;
use crate::http::owner;

/// Create/update payload. With `template_id`, any of `title`, `tone` and
/// `body` left out is taken from the template.
#[derive(Debug, Deserialize)]
pub struct WishRequest {
    pub friend_id: String,
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub tone: Option<Tone>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_time_capsule: bool,
    /// RFC 3339, or `YYYY-MM-DDTHH:MM[:SS]` read as UTC. Blank clears it.
    #[serde(default)]
    pub scheduled_for: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MarkSentReply {
    pub id: String,
    pub sent_at: DateTime<Utc>,
    pub already_sent: bool,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn resolve(state: &AppState, uid: &str, req: WishRequest) -> ApiResult<WishInput> {
    let template = match req.template_id.as_deref().filter(|t| !t.is_empty()) {
        Some(tid) => Some(state.templates.get(uid, tid)?),
        None => None,
    };

    let scheduled_for = match non_blank(req.scheduled_for) {
        None => None,
        Some(raw) => Some(
            parse_instant(&raw)
                .ok_or_else(|| WishboxError::InvalidInput(format!("scheduled_for is not a valid date-time: {raw}")))?,
        ),
    };

    let title = non_blank(req.title).or_else(|| template.as_ref().map(|t| t.title.clone()));
    let body = non_blank(req.body).or_else(|| template.as_ref().map(|t| t.body.clone()));
    let tone = req.tone.or_else(|| template.as_ref().map(|t| t.tone)).unwrap_or_default();

    Ok(WishInput {
        friend_id: req.friend_id,
        title: title.unwrap_or_default(),
        body: body.unwrap_or_default(),
        tone,
        image_url: req.image_url,
        is_time_capsule: req.is_time_capsule,
        scheduled_for,
    })
}

pub async fn list(State(state): State<Arc<AppState>>, Path(uid): Path<String>) -> ApiResult<Json<Vec<WishView>>> {
    owner(&state, &uid)?;
    Ok(Json(state.wishes.list(&uid, state.now())?))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
    Json(req): Json<WishRequest>,
) -> ApiResult<(StatusCode, Json<Wish>)> {
    owner(&state, &uid)?;
    let input = resolve(&state, &uid, req)?;
    let wish = state.wishes.create(&uid, &input, state.now())?;
    Ok((StatusCode::CREATED, Json(wish)))
}

pub async fn show(
    State(state): State<Arc<AppState>>,
    Path((uid, id)): Path<(String, String)>,
) -> ApiResult<Json<WishView>> {
    Ok(Json(state.wishes.view_for_owner(&uid, &id, state.now())?))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Path((uid, id)): Path<(String, String)>,
    Json(req): Json<WishRequest>,
) -> ApiResult<Json<Wish>> {
    let input = resolve(&state, &uid, req)?;
    Ok(Json(state.wishes.update(&uid, &id, &input, state.now())?))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path((uid, id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    state.wishes.delete(&uid, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /users/{uid}/wishes/{id}/mark-sent: idempotent; a second call
/// reports the original timestamp.
pub async fn mark_sent(
    State(state): State<Arc<AppState>>,
    Path((uid, id)): Path<(String, String)>,
) -> ApiResult<Json<MarkSentReply>> {
    let outcome = state.wishes.mark_sent(&uid, &id, state.now())?;
    Ok(Json(MarkSentReply {
        id,
        sent_at: outcome.sent_at(),
        already_sent: matches!(outcome, MarkSent::AlreadySent(_)),
    }))
}
