//! Unauthenticated routes. The reveal token or share slug in the path is
//! the only credential, and every read is time-gated.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use wishbox_book::types::{CardContribution, CardView, ContributionInput, WishView};

use crate::app::AppState;
use crate::error::ApiResult;

/// GET /reveal/{token}
pub async fn reveal(State(state): State<Arc<AppState>>, Path(token): Path<String>) -> ApiResult<Json<WishView>> {
    Ok(Json(state.wishes.reveal(&token, state.now())?))
}

/// GET /cards/share/{slug}
pub async fn shared_card(State(state): State<Arc<AppState>>, Path(slug): Path<String>) -> ApiResult<Json<CardView>> {
    Ok(Json(state.cards.view_by_slug(&slug, state.now())?))
}

/// POST /cards/share/{slug}/contributions: 423 while the card is locked.
pub async fn contribute(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Json(input): Json<ContributionInput>,
) -> ApiResult<(StatusCode, Json<CardContribution>)> {
    let contribution = state.cards.add_contribution(&slug, &input, state.now())?;
    Ok((StatusCode::CREATED, Json(contribution)))
}
