use thiserror::Error;

/// Errors that can occur within the scheduler subsystem.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The backing store failed to query or commit.
    #[error("Store error: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),

    /// A job with this id already drives a timer.
    #[error("Job already registered: {id}")]
    AlreadyRegistered { id: String },

    /// No job with the given id is registered.
    #[error("Job not registered: {id}")]
    NotRegistered { id: String },

    /// The requested interval cannot drive a timer (e.g. zero).
    #[error("Invalid interval: {0}")]
    InvalidInterval(String),

    /// `register` was called with no Tokio runtime to drive the loop.
    #[error("No Tokio runtime: {0}")]
    NoRuntime(String),

    /// A job body reported a failure of its own.
    #[error("Job failed: {0}")]
    JobFailed(String),
}

impl SchedulerError {
    pub fn store(err: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>) -> Self {
        SchedulerError::Store(err.into())
    }
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
