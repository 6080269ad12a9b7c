use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use wishbox_book::types::{CardInput, CardView, GroupCard};

use crate::app::AppState;
use crate::error::ApiResult;
use crate::http::owner;

/// Owner's card view plus the public link to hand out.
#[derive(Serialize)]
pub struct OwnerCard {
    #[serde(flatten)]
    pub view: CardView,
    pub share_path: String,
}

impl From<CardView> for OwnerCard {
    fn from(view: CardView) -> Self {
        let share_path = share_path(&view.card.slug);
        Self { view, share_path }
    }
}

pub fn share_path(slug: &str) -> String {
    format!("/cards/share/{slug}")
}

pub async fn list(State(state): State<Arc<AppState>>, Path(uid): Path<String>) -> ApiResult<Json<Vec<OwnerCard>>> {
    owner(&state, &uid)?;
    let cards = state.cards.list(&uid, state.now())?;
    Ok(Json(cards.into_iter().map(OwnerCard::from).collect()))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
    Json(input): Json<CardInput>,
) -> ApiResult<(StatusCode, Json<GroupCard>)> {
    owner(&state, &uid)?;
    let card = state.cards.create(&uid, &input, state.now())?;
    Ok((StatusCode::CREATED, Json(card)))
}

pub async fn show(
    State(state): State<Arc<AppState>>,
    Path((uid, id)): Path<(String, String)>,
) -> ApiResult<Json<OwnerCard>> {
    Ok(Json(state.cards.view_for_owner(&uid, &id, state.now())?.into()))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path((uid, id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    state.cards.delete(&uid, &id)?;
    Ok(StatusCode::NO_CONTENT)
}
