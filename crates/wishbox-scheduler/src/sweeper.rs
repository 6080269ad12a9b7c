use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{
    engine::Job,
    error::Result,
    types::{DueWish, JobContext, SentWish, SweepReport},
};

/// Storage port for the due-wish sweep.
///
/// Implementations own the transaction boundary. `mark_batch_sent` must apply all
/// updates in one atomic commit and guard every row with
/// `sent_at IS NULL AND scheduled_for <= now`, so rows already sent (by a
/// previous sweep or a manual action) are left alone.
pub trait DueWishStore: Send + Sync {
    /// Wishes with `scheduled_for IS NOT NULL AND sent_at IS NULL AND
    /// scheduled_for <= now`, in no particular order.
    fn due_wishes(&self, now: DateTime<Utc>) -> Result<Vec<DueWish>>;

    /// Set `sent_at = now` on each still-eligible id in a single commit.
    /// Returns the ids that actually changed.
    fn mark_batch_sent(&self, wish_ids: &[String], now: DateTime<Utc>) -> Result<Vec<String>>;
}

impl<S: DueWishStore + ?Sized> DueWishStore for Arc<S> {
    fn due_wishes(&self, now: DateTime<Utc>) -> Result<Vec<DueWish>> {
        (**self).due_wishes(now)
    }

    fn mark_batch_sent(&self, wish_ids: &[String], now: DateTime<Utc>) -> Result<Vec<String>> {
        (**self).mark_batch_sent(wish_ids, now)
    }
}

/// Marks due scheduled wishes as sent.
pub struct DueWishSweeper<S> {
    store: S,
    /// If set, every wish this sweeper transitions is sent here for delivery.
    delivery_tx: Option<mpsc::Sender<SentWish>>,
}

impl<S: DueWishStore> DueWishSweeper<S> {
    /// Pass `Some(tx)` to receive a [`SentWish`] per transitioned row.
    /// The sender is non-blocking (`try_send`) so a slow consumer never
    /// stalls a sweep.
    pub fn new(store: S, delivery_tx: Option<mpsc::Sender<SentWish>>) -> Self {
        Self { store, delivery_tx }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run one sweep treating `now` as the current instant.
    ///
    /// `now` is used for both the due filter and every `sent_at` written.
    /// No commit is attempted when nothing is due. On error nothing from this
    /// sweep is durable and the same rows are picked up next time.
    pub fn sweep(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let due = self.store.due_wishes(now)?;
        if due.is_empty() {
            debug!(at = %now, "no due wishes");
            return Ok(SweepReport::idle(now));
        }

        let ids: Vec<String> = due.iter().map(|w| w.id.clone()).collect();
        let marked = self.store.mark_batch_sent(&ids, now)?;

        if marked.len() < ids.len() {
            debug!(
                due = ids.len(),
                marked = marked.len(),
                "some due wishes were already sent by another writer"
            );
        }
        info!(count = marked.len(), at = %now, "due wishes marked sent");

        if let Some(ref tx) = self.delivery_tx {
            let transitioned: HashSet<&str> = marked.iter().map(String::as_str).collect();
            for wish in due.iter().filter(|w| transitioned.contains(w.id.as_str())) {
                let sent = SentWish {
                    wish_id: wish.id.clone(),
                    user_id: wish.user_id.clone(),
                    friend_id: wish.friend_id.clone(),
                    title: wish.title.clone(),
                    sent_at: now,
                };
                if tx.try_send(sent).is_err() {
                    warn!(wish_id = %wish.id, "delivery channel full or closed: notification dropped");
                }
            }
        }

        Ok(SweepReport {
            at: now,
            due: due.len(),
            marked,
        })
    }
}

impl<S: DueWishStore + 'static> Job for DueWishSweeper<S> {
    fn run(&self, ctx: &JobContext) -> Result<()> {
        self.sweep(ctx.now).map(|_| ())
    }
}
