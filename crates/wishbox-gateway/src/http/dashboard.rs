use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use wishbox_book::Dashboard;

use crate::app::AppState;
use crate::error::ApiResult;
use crate::http::owner;

/// GET /users/{uid}/dashboard
pub async fn show(State(state): State<Arc<AppState>>, Path(uid): Path<String>) -> ApiResult<Json<Dashboard>> {
    owner(&state, &uid)?;
    let friends = state.friends.list(&uid)?;
    let wishes = state.wishes.count(&uid)?;
    let cards = state.cards.count(&uid)?;
    let today = state.now().date_naive();
    Ok(Json(Dashboard::build(friends, wishes, cards, today, state.leap_day())))
}
