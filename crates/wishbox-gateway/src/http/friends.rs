use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use wishbox_book::types::{CardView, Friend, FriendInput, WishView};
use wishbox_core::calendar::{age_on_next_birthday, days_until_birthday, next_birthday};

use crate::app::AppState;
use crate::error::ApiResult;
use crate::http::owner;

/// Friend page: the record, its birthday countdown, and everything made
/// for them.
#[derive(Serialize)]
pub struct FriendDetail {
    #[serde(flatten)]
    pub friend: Friend,
    pub next_birthday: Option<NaiveDate>,
    pub days_until_birthday: Option<i64>,
    pub turning: Option<i32>,
    pub wishes: Vec<WishView>,
    pub cards: Vec<CardView>,
}

pub async fn list(State(state): State<Arc<AppState>>, Path(uid): Path<String>) -> ApiResult<Json<Vec<Friend>>> {
    owner(&state, &uid)?;
    Ok(Json(state.friends.list(&uid)?))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
    Json(input): Json<FriendInput>,
) -> ApiResult<(StatusCode, Json<Friend>)> {
    owner(&state, &uid)?;
    let friend = state.friends.create(&uid, &input, state.now())?;
    Ok((StatusCode::CREATED, Json(friend)))
}

pub async fn show(
    State(state): State<Arc<AppState>>,
    Path((uid, id)): Path<(String, String)>,
) -> ApiResult<Json<FriendDetail>> {
    let now = state.now();
    let today = now.date_naive();
    let policy = state.leap_day();
    let friend = state.friends.get(&uid, &id)?;
    Ok(Json(FriendDetail {
        next_birthday: next_birthday(friend.birth_date, today, policy),
        days_until_birthday: days_until_birthday(friend.birth_date, today, policy),
        turning: age_on_next_birthday(friend.birth_date, today, policy),
        wishes: state.wishes.list_for_friend(&uid, &id, now)?,
        cards: state.cards.list_for_friend(&uid, &id, now)?,
        friend,
    }))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Path((uid, id)): Path<(String, String)>,
    Json(input): Json<FriendInput>,
) -> ApiResult<Json<Friend>> {
    Ok(Json(state.friends.update(&uid, &id, &input, state.now())?))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path((uid, id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    state.friends.delete(&uid, &id)?;
    Ok(StatusCode::NO_CONTENT)
}
