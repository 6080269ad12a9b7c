//! Notification stub for swept wishes.
//!
//! The sweeper hands every wish it marks sent to this task. Real delivery
//! (email, push) is not wired; the task records the event and moves on.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;
use wishbox_scheduler::SentWish;

/// Bound on undelivered notifications before the sweeper starts dropping.
pub const DELIVERY_BUFFER: usize = 256;

pub fn channel() -> (mpsc::Sender<SentWish>, mpsc::Receiver<SentWish>) {
    mpsc::channel(DELIVERY_BUFFER)
}

/// Drain `rx` until every sender is dropped.
pub fn spawn(mut rx: mpsc::Receiver<SentWish>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(sent) = rx.recv().await {
            info!(
                wish_id = %sent.wish_id,
                user_id = %sent.user_id,
                friend_id = %sent.friend_id,
                sent_at = %sent.sent_at,
                "wish delivered: {}",
                sent.title
            );
        }
    })
}
