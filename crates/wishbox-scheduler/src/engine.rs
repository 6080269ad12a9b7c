use std::sync::Arc;
use std::time::Duration;

use dashmap::{mapref::entry::Entry, DashMap};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use wishbox_core::clock::Clock;

use crate::{
    error::{Result, SchedulerError},
    types::JobContext,
};

/// Work driven by the scheduler.
///
/// `run` is synchronous and may block on I/O; the engine executes it on
/// Tokio's blocking pool.
pub trait Job: Send + Sync + 'static {
    fn run(&self, ctx: &JobContext) -> Result<()>;
}

impl<F> Job for F
where
    F: Fn(&JobContext) -> Result<()> + Send + Sync + 'static,
{
    fn run(&self, ctx: &JobContext) -> Result<()> {
        self(ctx)
    }
}

/// A live registration: the loop task plus the switch that stops it.
struct Registration {
    interval: Duration,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Process-wide scheduling service.
///
/// Owns one timer loop per registered job id. Registration is keyed: the
/// same id can only drive one loop at a time, so a duplicate start-up path
/// gets an [`SchedulerError::AlreadyRegistered`] instead of a second timer.
pub struct SchedulerEngine {
    clock: Arc<dyn Clock>,
    jobs: DashMap<String, Registration>,
}

impl SchedulerEngine {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            jobs: DashMap::new(),
        }
    }

    /// Start running `job` every `interval`, first tick immediately.
    ///
    /// Outside a Tokio runtime this fails with [`SchedulerError::NoRuntime`]
    /// and nothing is registered.
    pub fn register(&self, job_id: &str, interval: Duration, job: Arc<dyn Job>) -> Result<()> {
        if interval.is_zero() {
            return Err(SchedulerError::InvalidInterval(format!(
                "job {job_id}: interval must be non-zero"
            )));
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| SchedulerError::NoRuntime(format!("job {job_id}: {e}")))?;

        match self.jobs.entry(job_id.to_string()) {
            Entry::Occupied(existing) => {
                warn!(
                    job_id,
                    interval_secs = existing.get().interval.as_secs(),
                    "job already registered; keeping the existing timer"
                );
                Err(SchedulerError::AlreadyRegistered {
                    id: job_id.to_string(),
                })
            }
            Entry::Vacant(slot) => {
                let (shutdown, shutdown_rx) = watch::channel(false);
                let task = runtime.spawn(run_loop(
                    job_id.to_string(),
                    interval,
                    job,
                    Arc::clone(&self.clock),
                    shutdown_rx,
                ));
                slot.insert(Registration {
                    interval,
                    shutdown,
                    task,
                });
                info!(job_id, interval_secs = interval.as_secs(), "job registered");
                Ok(())
            }
        }
    }

    pub fn is_registered(&self, job_id: &str) -> bool {
        self.jobs.contains_key(job_id)
    }

    pub fn job_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.jobs.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Stop one job. An in-flight invocation is allowed to finish.
    pub async fn unregister(&self, job_id: &str) -> Result<()> {
        let (_, registration) = self
            .jobs
            .remove(job_id)
            .ok_or_else(|| SchedulerError::NotRegistered {
                id: job_id.to_string(),
            })?;
        stop(job_id, registration).await;
        info!(job_id, "job unregistered");
        Ok(())
    }

    /// Stop every job and wait for their loops to exit.
    pub async fn shutdown(&self) {
        for job_id in self.job_ids() {
            if let Some((_, registration)) = self.jobs.remove(&job_id) {
                stop(&job_id, registration).await;
            }
        }
        info!("scheduler engine shut down");
    }
}

async fn stop(job_id: &str, registration: Registration) {
    let _ = registration.shutdown.send(true);
    if let Err(e) = registration.task.await {
        error!(job_id, "job loop ended abnormally: {e}");
    }
}

/// Tick loop for a single job until `shutdown` broadcasts `true`.
async fn run_loop(
    job_id: String,
    period: Duration,
    job: Arc<dyn Job>,
    clock: Arc<dyn Clock>,
    mut shutdown: watch::Receiver<bool>,
) {
    debug!(job_id = %job_id, "job loop started");

    let mut interval = tokio::time::interval(period);
    // A slow run pushes the schedule back instead of firing a burst.
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut tick: u64 = 0;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                tick += 1;
                let ctx = JobContext {
                    job_id: job_id.clone(),
                    tick,
                    now: clock.now(),
                };
                let job = Arc::clone(&job);
                // Awaited before the next tick: invocations never overlap.
                match tokio::task::spawn_blocking(move || job.run(&ctx)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => error!(job_id = %job_id, tick, "scheduled job failed: {e}"),
                    Err(e) => error!(job_id = %job_id, tick, "scheduled job panicked: {e}"),
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    debug!(job_id = %job_id, "job loop stopping");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use chrono::{TimeZone, Utc};
    use wishbox_core::clock::{ManualClock, SystemClock};

    fn engine() -> SchedulerEngine {
        SchedulerEngine::new(Arc::new(SystemClock))
    }

    fn counting_job(counter: Arc<AtomicUsize>) -> Arc<dyn Job> {
        Arc::new(move |_: &JobContext| -> Result<()> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    #[tokio::test]
    async fn second_registration_of_same_id_is_rejected() {
        let engine = engine();
        let runs = Arc::new(AtomicUsize::new(0));
        engine
            .register("sweep", Duration::from_secs(3600), counting_job(runs.clone()))
            .unwrap();
        let err = engine
            .register("sweep", Duration::from_secs(1), counting_job(runs.clone()))
            .unwrap_err();
        assert!(matches!(err, SchedulerError::AlreadyRegistered { ref id } if id == "sweep"));
        assert_eq!(engine.job_ids(), vec!["sweep".to_string()]);

        tokio::time::sleep(Duration::from_millis(50)).await;
        // Only the first timer exists, and it has fired exactly once so far.
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        engine.shutdown().await;
    }

    #[tokio::test]
    async fn zero_interval_is_rejected() {
        let engine = engine();
        let err = engine
            .register("bad", Duration::ZERO, counting_job(Arc::new(AtomicUsize::new(0))))
            .unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidInterval(_)));
        assert!(!engine.is_registered("bad"));
    }

    #[test]
    fn register_without_a_runtime_is_an_error() {
        let engine = engine();
        let err = engine
            .register("sweep", Duration::from_secs(60), counting_job(Arc::new(AtomicUsize::new(0))))
            .unwrap_err();
        assert!(matches!(err, SchedulerError::NoRuntime(_)));
        assert!(!engine.is_registered("sweep"));
    }

    #[tokio::test]
    async fn failing_and_panicking_jobs_keep_their_schedule() {
        let engine = engine();
        let failures = Arc::new(AtomicUsize::new(0));
        let panics = Arc::new(AtomicUsize::new(0));

        let f = failures.clone();
        engine
            .register(
                "fails",
                Duration::from_millis(10),
                Arc::new(move |_: &JobContext| -> Result<()> {
                    f.fetch_add(1, Ordering::SeqCst);
                    Err(SchedulerError::JobFailed("store offline".into()))
                }),
            )
            .unwrap();
        let p = panics.clone();
        engine
            .register(
                "panics",
                Duration::from_millis(10),
                Arc::new(move |_: &JobContext| -> Result<()> {
                    p.fetch_add(1, Ordering::SeqCst);
                    panic!("bad row");
                }),
            )
            .unwrap();

        tokio::time::sleep(Duration::from_millis(120)).await;
        engine.shutdown().await;
        assert!(failures.load(Ordering::SeqCst) >= 3);
        assert!(panics.load(Ordering::SeqCst) >= 3);
    }

    #[tokio::test]
    async fn unregister_stops_the_loop() {
        let engine = engine();
        let runs = Arc::new(AtomicUsize::new(0));
        engine
            .register("tick", Duration::from_millis(10), counting_job(runs.clone()))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        engine.unregister("tick").await.unwrap();
        let after_stop = runs.load(Ordering::SeqCst);
        assert!(after_stop >= 1);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(runs.load(Ordering::SeqCst), after_stop);
        assert!(matches!(
            engine.unregister("tick").await,
            Err(SchedulerError::NotRegistered { .. })
        ));
        // The id is free again once unregistered.
        engine
            .register("tick", Duration::from_secs(3600), counting_job(runs))
            .unwrap();
        engine.shutdown().await;
    }

    #[tokio::test]
    async fn invocations_never_overlap() {
        let engine = engine();
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let runs = Arc::new(AtomicUsize::new(0));

        let (a, pk, r) = (active.clone(), peak.clone(), runs.clone());
        engine
            .register(
                "slow",
                Duration::from_millis(2),
                Arc::new(move |_: &JobContext| -> Result<()> {
                    let now_active = a.fetch_add(1, Ordering::SeqCst) + 1;
                    pk.fetch_max(now_active, Ordering::SeqCst);
                    std::thread::sleep(std::time::Duration::from_millis(15));
                    a.fetch_sub(1, Ordering::SeqCst);
                    r.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }),
            )
            .unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        engine.shutdown().await;
        assert!(runs.load(Ordering::SeqCst) >= 2);
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn context_carries_the_engine_clock() {
        let at = Utc.with_ymd_and_hms(2026, 12, 10, 9, 0, 0).unwrap();
        let engine = SchedulerEngine::new(Arc::new(ManualClock::new(at)));
        let seen: Arc<Mutex<Vec<JobContext>>> = Arc::new(Mutex::new(Vec::new()));

        let s = seen.clone();
        engine
            .register(
                "ctx",
                Duration::from_secs(3600),
                Arc::new(move |ctx: &JobContext| -> Result<()> {
                    s.lock().unwrap().push(ctx.clone());
                    Ok(())
                }),
            )
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        engine.shutdown().await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].job_id, "ctx");
        assert_eq!(seen[0].tick, 1);
        assert_eq!(seen[0].now, at);
    }
}
