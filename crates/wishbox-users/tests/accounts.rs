use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use wishbox_users::{db::init_db, AccountManager, UserError};

fn accounts() -> AccountManager {
    let conn = Connection::open_in_memory().unwrap();
    init_db(&conn).unwrap();
    AccountManager::new(Arc::new(Mutex::new(conn)))
}

#[test]
fn register_then_login() {
    let accounts = accounts();
    let user = accounts
        .register("Demo User", " Demo@BWH.local", "password123")
        .unwrap();
    assert_eq!(user.email, "demo@bwh.local");
    assert_eq!(user.name, "Demo User");

    let logged_in = accounts.login("DEMO@bwh.local", "password123").unwrap();
    assert_eq!(logged_in.id, user.id);
    assert_eq!(accounts.get(&user.id).unwrap().unwrap().email, "demo@bwh.local");
}

#[test]
fn duplicate_email_is_rejected_case_insensitively() {
    let accounts = accounts();
    accounts.register("A", "ann@example.com", "secret1").unwrap();
    let err = accounts
        .register("B", "ANN@example.com", "secret2")
        .unwrap_err();
    assert!(matches!(err, UserError::AlreadyExists(ref e) if e == "ann@example.com"));
}

#[test]
fn wrong_password_and_unknown_email_look_the_same() {
    let accounts = accounts();
    accounts.register("A", "ann@example.com", "secret1").unwrap();
    assert!(matches!(
        accounts.login("ann@example.com", "nope-nope"),
        Err(UserError::InvalidCredentials)
    ));
    assert!(matches!(
        accounts.login("bob@example.com", "secret1"),
        Err(UserError::InvalidCredentials)
    ));
}

#[test]
fn required_fields_are_checked() {
    let accounts = accounts();
    assert!(matches!(
        accounts.register("  ", "a@b.c", "secret1"),
        Err(UserError::InvalidInput(_))
    ));
    assert!(matches!(
        accounts.register("A", "not-an-email", "secret1"),
        Err(UserError::InvalidInput(_))
    ));
    assert!(matches!(
        accounts.register("A", "a@b.c", "short"),
        Err(UserError::InvalidInput(_))
    ));
}

#[test]
fn delete_removes_the_account() {
    let accounts = accounts();
    let user = accounts.register("A", "a@b.c", "secret1").unwrap();
    accounts.delete(&user.id).unwrap();
    assert!(accounts.get(&user.id).unwrap().is_none());
    assert!(matches!(accounts.delete(&user.id), Err(UserError::NotFound(_))));
}
