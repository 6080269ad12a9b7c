//! Process wiring shared by the `serve`, `sweep` and `seed` commands.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rusqlite::Connection;
use tokio::sync::mpsc;
use tracing::info;
use wishbox_book::WishManager;
use wishbox_core::config::{WishboxConfig, DUE_WISHES_JOB_ID};
use wishbox_core::Clock;
use wishbox_scheduler::{DueWishSweeper, SentWish};

use crate::app::AppState;

/// Ensure the parent directory for a file path exists.
pub fn ensure_parent_dir(path: &str) {
    if let Some(parent) = Path::new(path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
}

/// Open the configured database and run all schema migrations (idempotent).
pub fn open_database(config: &WishboxConfig) -> anyhow::Result<Connection> {
    let db_path = &config.database.path;
    ensure_parent_dir(db_path);
    info!(path = %db_path, "opening SQLite database");

    let conn = wishbox_book::db::open(db_path)?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    wishbox_users::db::init_db(conn)?;
    wishbox_book::db::init_db(conn)?;
    info!("database migrations complete");
    Ok(())
}

/// Build the request-side state over `conn`.
pub fn build_state(config: WishboxConfig, clock: Arc<dyn Clock>, conn: Connection) -> Arc<AppState> {
    Arc::new(AppState::new(config, clock, Arc::new(Mutex::new(conn))))
}

/// Register the due-wish sweeper with the state's scheduler.
///
/// The sweeper gets its own connection so a sweep never waits on the
/// request-side mutex. Fails with `AlreadyRegistered` if called twice.
pub fn start_sweeper(state: &AppState, sweep_conn: Connection, delivery_tx: mpsc::Sender<SentWish>) -> anyhow::Result<()> {
    let store = WishManager::new(Arc::new(Mutex::new(sweep_conn)), state.leap_day());
    let sweeper = Arc::new(DueWishSweeper::new(store, Some(delivery_tx)));
    let interval = Duration::from_secs(state.config.scheduler.interval_secs);
    state.scheduler.register(DUE_WISHES_JOB_ID, interval, sweeper)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wishbox_core::SystemClock;
    use wishbox_scheduler::SchedulerError;

    #[tokio::test]
    async fn sweeper_registers_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = WishboxConfig::default();
        config.database.path = dir.path().join("wishbox.db").display().to_string();

        let conn = open_database(&config).unwrap();
        let state = build_state(config.clone(), Arc::new(SystemClock), conn);
        let (tx, _rx) = crate::delivery::channel();

        start_sweeper(&state, wishbox_book::db::open(&config.database.path).unwrap(), tx.clone()).unwrap();
        assert!(state.scheduler.is_registered(DUE_WISHES_JOB_ID));

        let again = start_sweeper(&state, wishbox_book::db::open(&config.database.path).unwrap(), tx);
        let err = again.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SchedulerError>(),
            Some(SchedulerError::AlreadyRegistered { .. })
        ));
        assert_eq!(state.scheduler.job_ids(), vec![DUE_WISHES_JOB_ID.to_string()]);
        state.scheduler.shutdown().await;
    }
}
