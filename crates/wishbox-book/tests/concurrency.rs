// Two connections on one database file, the way the server runs: request
// handlers on one, the sweeper on its own.

use std::sync::{Arc, Barrier, Mutex};
use std::thread;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use wishbox_book::types::{FriendInput, Tone, WishInput};
use wishbox_book::{db, FriendManager, MarkSent, WishManager};
use wishbox_core::LeapDayPolicy;
use wishbox_scheduler::DueWishSweeper;
use wishbox_users::AccountManager;

#[test]
fn manual_mark_and_sweep_race_leaves_exactly_one_timestamp() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wishbox.db");

    let web = Arc::new(Mutex::new(db::open(&path).unwrap()));
    {
        let conn = web.lock().unwrap();
        wishbox_users::db::init_db(&conn).unwrap();
        db::init_db(&conn).unwrap();
    }
    let sweep_conn = Arc::new(Mutex::new(db::open(&path).unwrap()));

    let owner = AccountManager::new(web.clone())
        .register("Alice", "alice@example.com", "secret1")
        .unwrap()
        .id;
    let created = Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap();
    let friend = FriendManager::new(web.clone())
        .create(
            &owner,
            &FriendInput {
                full_name: "Aoife".into(),
                nickname: None,
                relationship: None,
                timezone: None,
                birth_date: NaiveDate::from_ymd_opt(1999, 12, 10).unwrap(),
                notes: None,
                photo_url: None,
            },
            created,
        )
        .unwrap();

    let web_wishes = Arc::new(WishManager::new(web, LeapDayPolicy::Feb28));
    let sweep_wishes = Arc::new(WishManager::new(sweep_conn, LeapDayPolicy::Feb28));

    let mut ids = Vec::new();
    for i in 0..20 {
        let wish = web_wishes
            .create(
                &owner,
                &WishInput {
                    friend_id: friend.id.clone(),
                    title: format!("wish {i}"),
                    body: "Happy birthday".into(),
                    tone: Tone::Warm,
                    image_url: None,
                    is_time_capsule: false,
                    scheduled_for: Some(created),
                },
                created,
            )
            .unwrap();
        ids.push(wish.id);
    }

    let manual_at = created + Duration::seconds(30);
    let sweep_at = created + Duration::seconds(60);
    let barrier = Arc::new(Barrier::new(2));

    let manual = {
        let wishes = web_wishes.clone();
        let barrier = barrier.clone();
        let owner = owner.clone();
        let ids = ids.clone();
        thread::spawn(move || {
            barrier.wait();
            ids.iter()
                .map(|id| wishes.mark_sent(&owner, id, manual_at).unwrap())
                .filter(|outcome| matches!(outcome, MarkSent::Marked(_)))
                .count()
        })
    };
    let sweep = {
        let barrier = barrier.clone();
        thread::spawn(move || {
            let sweeper = DueWishSweeper::new(sweep_wishes, None);
            barrier.wait();
            sweeper.sweep(sweep_at).unwrap().marked_count()
        })
    };

    let by_hand = manual.join().unwrap();
    let by_sweep = sweep.join().unwrap();
    assert_eq!(by_hand + by_sweep, ids.len());

    for id in &ids {
        let sent_at = web_wishes.get(&owner, id).unwrap().sent_at;
        assert!(sent_at == Some(manual_at) || sent_at == Some(sweep_at));
    }
}
