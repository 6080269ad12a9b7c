use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Passed to a job on every invocation.
///
/// Jobs run outside any request, so everything they need from the outside
/// world arrives here rather than being captured from ambient state.
#[derive(Debug, Clone)]
pub struct JobContext {
    /// Id the job was registered under.
    pub job_id: String,
    /// 1-based invocation counter for this registration.
    pub tick: u64,
    /// The instant this invocation treats as "now", read once per tick.
    pub now: DateTime<Utc>,
}

/// A wish whose scheduled time has arrived and that has not been sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueWish {
    pub id: String,
    pub user_id: String,
    pub friend_id: String,
    pub title: String,
    pub scheduled_for: DateTime<Utc>,
}

/// Emitted for every wish a sweep actually transitioned to sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentWish {
    pub wish_id: String,
    pub user_id: String,
    pub friend_id: String,
    pub title: String,
    pub sent_at: DateTime<Utc>,
}

/// Summary of a single sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// The sweep's captured "now"; every `sent_at` written equals this.
    pub at: DateTime<Utc>,
    /// Rows that matched the due filter.
    pub due: usize,
    /// Ids whose `sent_at` this sweep set. Can be shorter than `due` when
    /// another writer committed first.
    pub marked: Vec<String>,
}

impl SweepReport {
    pub fn idle(at: DateTime<Utc>) -> Self {
        Self {
            at,
            due: 0,
            marked: Vec::new(),
        }
    }

    pub fn marked_count(&self) -> usize {
        self.marked.len()
    }
}
