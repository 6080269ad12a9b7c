use std::sync::{Arc, Mutex};

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use wishbox_book::{CardManager, FriendManager, TemplateManager, WishManager};
use wishbox_core::{config::WishboxConfig, Clock, LeapDayPolicy};
use wishbox_scheduler::SchedulerEngine;
use wishbox_users::AccountManager;

use crate::http;

/// Central shared state: passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub config: WishboxConfig,
    pub clock: Arc<dyn Clock>,
    pub accounts: AccountManager,
    pub friends: FriendManager,
    pub templates: TemplateManager,
    pub wishes: WishManager,
    pub cards: CardManager,
    /// Background jobs. The sweeper runs on its own connection, not `db`.
    pub scheduler: SchedulerEngine,
}

impl AppState {
    /// Build the request-side managers over one shared connection.
    pub fn new(config: WishboxConfig, clock: Arc<dyn Clock>, db: Arc<Mutex<Connection>>) -> Self {
        let policy = config.calendar.leap_day;
        Self {
            accounts: AccountManager::new(db.clone()),
            friends: FriendManager::new(db.clone()),
            templates: TemplateManager::new(db.clone()),
            wishes: WishManager::new(db.clone(), policy),
            cards: CardManager::new(db, policy),
            scheduler: SchedulerEngine::new(clock.clone()),
            clock,
            config,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn leap_day(&self) -> LeapDayPolicy {
        self.config.calendar.leap_day
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let owner = Router::new()
        .route("/users/{uid}/dashboard", get(http::dashboard::show))
        .route("/users/{uid}/friends", get(http::friends::list).post(http::friends::create))
        .route(
            "/users/{uid}/friends/{id}",
            get(http::friends::show)
                .put(http::friends::update)
                .delete(http::friends::delete),
        )
        .route("/users/{uid}/templates", get(http::templates::list).post(http::templates::create))
        .route(
            "/users/{uid}/templates/{id}",
            get(http::templates::show)
                .put(http::templates::update)
                .delete(http::templates::delete),
        )
        .route("/users/{uid}/wishes", get(http::wishes::list).post(http::wishes::create))
        .route(
            "/users/{uid}/wishes/{id}",
            get(http::wishes::show)
                .put(http::wishes::update)
                .delete(http::wishes::delete),
        )
        .route("/users/{uid}/wishes/{id}/mark-sent", post(http::wishes::mark_sent))
        .route("/users/{uid}/cards", get(http::cards::list).post(http::cards::create))
        .route(
            "/users/{uid}/cards/{id}",
            get(http::cards::show).delete(http::cards::delete),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), crate::auth::require_token));

    Router::new()
        .route("/health", get(http::health::health_handler))
        .route("/auth/register", post(http::accounts::register))
        .route("/auth/login", post(http::accounts::login))
        .route("/reveal/{token}", get(http::public::reveal))
        .route("/cards/share/{slug}", get(http::public::shared_card))
        .route("/cards/share/{slug}/contributions", post(http::public::contribute))
        .merge(owner)
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
