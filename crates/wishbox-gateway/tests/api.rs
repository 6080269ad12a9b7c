use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use wishbox_core::config::{AuthConfig, AuthMode, WishboxConfig};
use wishbox_core::ManualClock;
use wishbox_gateway::app::{build_router, AppState};
use wishbox_gateway::seed::{seed_demo, SeedOutcome};
use wishbox_gateway::startup;

const TOKEN: &str = "test-token";

struct Harness {
    app: Router,
    state: Arc<AppState>,
    clock: Arc<ManualClock>,
}

fn harness() -> Harness {
    let mut config = WishboxConfig::default();
    config.gateway.auth = AuthConfig {
        mode: AuthMode::Token,
        token: Some(TOKEN.into()),
    };
    let conn = wishbox_book::db::open_in_memory().unwrap();
    startup::init_schema(&conn).unwrap();
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap()));
    let state = startup::build_state(config, clock.clone(), conn);
    Harness {
        app: build_router(state.clone()),
        state,
        clock,
    }
}

impl Harness {
    async fn call(&self, method: &str, uri: &str, body: Option<Value>, authed: bool) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if authed {
            req = req.header("authorization", format!("Bearer {TOKEN}"));
        }
        let req = match body {
            Some(b) => req
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        let resp = self.app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn register(&self, email: &str) -> String {
        let (status, user) = self
            .call(
                "POST",
                "/auth/register",
                Some(json!({"name": "Alice", "email": email, "password": "secret1"})),
                false,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        user["id"].as_str().unwrap().to_string()
    }

    async fn friend(&self, uid: &str, birth_date: &str) -> String {
        let (status, friend) = self
            .call(
                "POST",
                &format!("/users/{uid}/friends"),
                Some(json!({"full_name": "Aoife", "birth_date": birth_date})),
                true,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        friend["id"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn health_is_public() {
    let h = harness();
    let (status, body) = h.call("GET", "/health", None, false).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["leap_day"], "feb28");
    assert_eq!(body["commit"], wishbox_gateway::GIT_SHA);
}

#[tokio::test]
async fn owner_routes_need_the_bearer_token() {
    let h = harness();
    let uid = h.register("alice@example.com").await;
    let (status, body) = h.call("GET", &format!("/users/{uid}/friends"), None, false).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "AUTH_FAILED");
}

#[tokio::test]
async fn register_login_and_unknown_user() {
    let h = harness();
    let uid = h.register("alice@example.com").await;

    let (status, user) = h
        .call(
            "POST",
            "/auth/login",
            Some(json!({"email": "ALICE@example.com", "password": "secret1"})),
            false,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["id"], uid.as_str());

    let (status, _) = h
        .call(
            "POST",
            "/auth/login",
            Some(json!({"email": "alice@example.com", "password": "wrong-pass"})),
            false,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = h
        .call(
            "POST",
            "/auth/register",
            Some(json!({"name": "Again", "email": "alice@example.com", "password": "secret1"})),
            false,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = h.call("GET", "/users/nobody/friends", None, true).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn time_capsule_is_redacted_until_the_birthday() {
    let h = harness();
    let uid = h.register("alice@example.com").await;
    let fid = h.friend(&uid, "1999-12-10").await;

    let (status, wish) = h
        .call(
            "POST",
            &format!("/users/{uid}/wishes"),
            Some(json!({
                "friend_id": fid,
                "title": "Sealed",
                "body": "Open me on the day",
                "is_time_capsule": true
            })),
            true,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let wid = wish["id"].as_str().unwrap().to_string();
    let token = wish["reveal_token"].as_str().unwrap().to_string();

    let (_, view) = h.call("GET", &format!("/users/{uid}/wishes/{wid}"), None, true).await;
    assert_eq!(view["hidden"], true);
    assert_eq!(view["body"], Value::Null);

    let (status, public) = h.call("GET", &format!("/reveal/{token}"), None, false).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(public["hidden"], true);
    assert!(public.get("reveal_token").is_none());

    h.clock.set(Utc.with_ymd_and_hms(2026, 12, 10, 8, 0, 0).unwrap());
    let (_, public) = h.call("GET", &format!("/reveal/{token}"), None, false).await;
    assert_eq!(public["hidden"], false);
    assert_eq!(public["is_birthday_today"], true);
    assert_eq!(public["body"], "Open me on the day");

    let (status, _) = h.call("GET", "/reveal/not-a-token", None, false).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn mark_sent_twice_keeps_the_first_timestamp() {
    let h = harness();
    let uid = h.register("alice@example.com").await;
    let fid = h.friend(&uid, "1999-12-10").await;
    let (_, wish) = h
        .call(
            "POST",
            &format!("/users/{uid}/wishes"),
            Some(json!({"friend_id": fid, "title": "Hi", "body": "Hello"})),
            true,
        )
        .await;
    let wid = wish["id"].as_str().unwrap();

    let (status, first) = h
        .call("POST", &format!("/users/{uid}/wishes/{wid}/mark-sent"), None, true)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["already_sent"], false);

    h.clock.advance(chrono::Duration::minutes(5));
    let (_, second) = h
        .call("POST", &format!("/users/{uid}/wishes/{wid}/mark-sent"), None, true)
        .await;
    assert_eq!(second["already_sent"], true);
    assert_eq!(second["sent_at"], first["sent_at"]);
}

#[tokio::test]
async fn template_prefills_missing_fields() {
    let h = harness();
    let uid = h.register("alice@example.com").await;
    let fid = h.friend(&uid, "1999-12-10").await;
    let (_, template) = h
        .call(
            "POST",
            &format!("/users/{uid}/templates"),
            Some(json!({"title": "Office Friendly", "tone": "formal", "body": "Many happy returns."})),
            true,
        )
        .await;
    let tid = template["id"].as_str().unwrap();

    let (status, wish) = h
        .call(
            "POST",
            &format!("/users/{uid}/wishes"),
            Some(json!({"friend_id": fid, "template_id": tid, "title": "For Aoife"})),
            true,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(wish["title"], "For Aoife");
    assert_eq!(wish["tone"], "formal");
    assert_eq!(wish["body"], "Many happy returns.");
}

#[tokio::test]
async fn bad_schedule_and_foreign_friend_are_rejected() {
    let h = harness();
    let alice = h.register("alice@example.com").await;
    let bob = h.register("bob@example.com").await;
    let bobs_friend = h.friend(&bob, "1990-05-05").await;

    let (status, body) = h
        .call(
            "POST",
            &format!("/users/{alice}/wishes"),
            Some(json!({"friend_id": bobs_friend, "title": "x", "body": "y"})),
            true,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");

    let own = h.friend(&alice, "1990-05-05").await;
    let (status, _) = h
        .call(
            "POST",
            &format!("/users/{alice}/wishes"),
            Some(json!({"friend_id": own, "title": "x", "body": "y", "scheduled_for": "next tuesday"})),
            true,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = h
        .call("GET", &format!("/users/{alice}/friends/{bobs_friend}"), None, true)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn locked_card_answers_423_until_the_birthday() {
    let h = harness();
    let uid = h.register("alice@example.com").await;
    let fid = h.friend(&uid, "1999-12-10").await;
    let (status, card) = h
        .call(
            "POST",
            &format!("/users/{uid}/cards"),
            Some(json!({"friend_id": fid, "title": "Team card", "theme": "party", "is_locked_until_bday": true})),
            true,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let cid = card["id"].as_str().unwrap();
    let slug = card["slug"].as_str().unwrap().to_string();

    let (_, owner_view) = h.call("GET", &format!("/users/{uid}/cards/{cid}"), None, true).await;
    assert_eq!(owner_view["share_path"], format!("/cards/share/{slug}"));
    assert_eq!(owner_view["locked"], true);

    let note = json!({"author_name": "Niamh", "message": "See you there"});
    let (status, body) = h
        .call("POST", &format!("/cards/share/{slug}/contributions"), Some(note.clone()), false)
        .await;
    assert_eq!(status, StatusCode::LOCKED);
    assert_eq!(body["code"], "LOCKED");

    h.clock.set(Utc.with_ymd_and_hms(2026, 12, 10, 12, 0, 0).unwrap());
    let (status, _) = h
        .call("POST", &format!("/cards/share/{slug}/contributions"), Some(note), false)
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, shared) = h.call("GET", &format!("/cards/share/{slug}"), None, false).await;
    assert_eq!(shared["locked"], false);
    assert_eq!(shared["contributions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn friend_detail_and_dashboard() {
    let h = harness();
    let uid = h.register("alice@example.com").await;
    let today = h.friend(&uid, "1990-10-16").await;
    h.friend(&uid, "1990-10-20").await;

    let (status, detail) = h.call("GET", &format!("/users/{uid}/friends/{today}"), None, true).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["days_until_birthday"], 0);
    assert_eq!(detail["turning"], 36);
    assert!(detail["wishes"].as_array().unwrap().is_empty());

    let (status, dash) = h.call("GET", &format!("/users/{uid}/dashboard"), None, true).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dash["friends_count"], 2);
    assert_eq!(dash["todays_birthdays"].as_array().unwrap().len(), 1);
    assert_eq!(dash["upcoming"][1]["days_until"], 4);

    let (status, _) = h.call("DELETE", &format!("/users/{uid}/friends/{today}"), None, true).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = h.call("GET", &format!("/users/{uid}/friends/{today}"), None, true).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn seed_runs_once() {
    let h = harness();
    let first = seed_demo(&h.state).unwrap();
    let SeedOutcome::Created(user) = first else {
        panic!("expected a fresh seed");
    };
    assert!(matches!(seed_demo(&h.state).unwrap(), SeedOutcome::AlreadySeeded(ref u) if u.id == user.id));

    let (_, wishes) = h.call("GET", &format!("/users/{}/wishes", user.id), None, true).await;
    let wishes = wishes.as_array().unwrap();
    assert_eq!(wishes.len(), 3);
    let capsule = wishes.iter().find(|w| w["title"] == "Time Capsule Note").unwrap();
    assert_eq!(capsule["hidden"], true);
}
