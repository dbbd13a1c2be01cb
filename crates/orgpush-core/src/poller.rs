//! Bounded job status polling
//!
//! One loop serves both job kinds. A [`StatusSource`] fetches the current
//! status; the status type itself says whether it is still pending, finished
//! successfully, or finished with a failure. Sleeping goes through a
//! [`Sleeper`] so tests can run the loop without real delays.
//!
//! The timeout is a local decision: when it fires the remote job may still be
//! running, we just stop waiting for it.

use crate::error::{CoreError, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Default pause between two status fetches
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 3;

/// Default total wait before giving up
pub const DEFAULT_POLL_MAX_WAIT_SECS: u64 = 300;

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    interval: Duration,
    max_wait: Duration,
}

impl PollConfig {
    /// A zero interval is rejected, it would never accumulate elapsed time
    pub fn new(interval: Duration, max_wait: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(CoreError::invalid_input(
                "poll interval must be greater than zero",
            ));
        }
        Ok(Self { interval, max_wait })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn max_wait(&self) -> Duration {
        self.max_wait
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            max_wait: Duration::from_secs(DEFAULT_POLL_MAX_WAIT_SECS),
        }
    }
}

// ============================================================================
// Seams
// ============================================================================

/// Where a job is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Pending,
    Succeeded,
    Failed,
}

impl Progress {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Progress::Pending)
    }
}

/// A status snapshot that can classify itself
pub trait JobStatus {
    fn progress(&self) -> Progress;

    /// Platform state string, for logs and error messages
    fn state(&self) -> &str;
}

/// Fetches the current status of a job
#[async_trait]
pub trait StatusSource: Send + Sync {
    type Status: JobStatus + Send;

    async fn fetch_status(&self, job_id: &str) -> Result<Self::Status>;
}

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

// ============================================================================
// Poller
// ============================================================================

/// Terminal status, split by outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<S> {
    Succeeded(S),
    Failed(S),
}

impl<S> PollOutcome<S> {
    pub fn is_success(&self) -> bool {
        matches!(self, PollOutcome::Succeeded(_))
    }

    pub fn status(&self) -> &S {
        match self {
            PollOutcome::Succeeded(status) | PollOutcome::Failed(status) => status,
        }
    }

    pub fn into_status(self) -> S {
        match self {
            PollOutcome::Succeeded(status) | PollOutcome::Failed(status) => status,
        }
    }
}

#[derive(Debug, Clone)]
pub struct JobPoller<Z = TokioSleeper> {
    config: PollConfig,
    sleeper: Z,
}

impl JobPoller<TokioSleeper> {
    pub fn new(config: PollConfig) -> Self {
        Self {
            config,
            sleeper: TokioSleeper,
        }
    }
}

impl<Z: Sleeper> JobPoller<Z> {
    pub fn with_sleeper(config: PollConfig, sleeper: Z) -> Self {
        Self { config, sleeper }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Fetch until the job is terminal or `max_wait` has elapsed.
    ///
    /// A failed fetch ends polling with that error. Running out of time yields
    /// [`CoreError::PollTimeout`].
    #[instrument(skip(self, source), fields(interval_secs = self.config.interval.as_secs()))]
    pub async fn poll_until_terminal<T>(
        &self,
        job_id: &str,
        source: &T,
    ) -> Result<PollOutcome<T::Status>>
    where
        T: StatusSource + ?Sized,
    {
        let mut elapsed = Duration::ZERO;
        let mut polls = 0u32;

        loop {
            let status = source.fetch_status(job_id).await?;
            polls += 1;

            match status.progress() {
                Progress::Succeeded => {
                    info!(job_id, state = status.state(), polls, "Job finished");
                    return Ok(PollOutcome::Succeeded(status));
                },
                Progress::Failed => {
                    warn!(job_id, state = status.state(), polls, "Job failed");
                    return Ok(PollOutcome::Failed(status));
                },
                Progress::Pending => {
                    debug!(
                        job_id,
                        state = status.state(),
                        elapsed_secs = elapsed.as_secs(),
                        "Job still running"
                    );
                },
            }

            self.sleeper.sleep(self.config.interval).await;
            elapsed += self.config.interval;

            if elapsed >= self.config.max_wait {
                warn!(
                    job_id,
                    elapsed_secs = elapsed.as_secs(),
                    polls,
                    "Gave up waiting for job"
                );
                return Err(CoreError::PollTimeout {
                    job_id: job_id.to_string(),
                    waited: elapsed,
                });
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSleeper {
        slept: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.slept.lock().unwrap().push(duration);
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct FakeStatus(&'static str);

    impl JobStatus for FakeStatus {
        fn progress(&self) -> Progress {
            match self.0 {
                "Done" => Progress::Succeeded,
                "Broken" => Progress::Failed,
                _ => Progress::Pending,
            }
        }

        fn state(&self) -> &str {
            self.0
        }
    }

    /// Replays a script of states, repeating the last one
    struct ScriptedSource {
        script: Vec<&'static str>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(script: Vec<&'static str>) -> Self {
            Self {
                script,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StatusSource for ScriptedSource {
        type Status = FakeStatus;

        async fn fetch_status(&self, _job_id: &str) -> Result<FakeStatus> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            let state = self.script[n.min(self.script.len() - 1)];
            if state == "error" {
                return Err(CoreError::Submission {
                    status: 503,
                    body: "unavailable".to_string(),
                });
            }
            Ok(FakeStatus(state))
        }
    }

    fn poller(interval: u64, max_wait: u64) -> JobPoller<RecordingSleeper> {
        let config =
            PollConfig::new(Duration::from_secs(interval), Duration::from_secs(max_wait)).unwrap();
        JobPoller::with_sleeper(config, RecordingSleeper::default())
    }

    #[tokio::test]
    async fn test_never_terminal_times_out_after_two_fetches() {
        let poller = poller(3, 6);
        let source = ScriptedSource::new(vec!["InProgress"]);

        let err = poller.poll_until_terminal("750x", &source).await.unwrap_err();

        match err {
            CoreError::PollTimeout { job_id, waited } => {
                assert_eq!(job_id, "750x");
                assert_eq!(waited, Duration::from_secs(6));
            },
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(source.calls(), 2);
        assert_eq!(poller.sleeper.slept.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failure_on_first_fetch_returns_without_sleeping() {
        let poller = poller(3, 6);
        let source = ScriptedSource::new(vec!["Broken"]);

        let outcome = poller.poll_until_terminal("750x", &source).await.unwrap();

        assert_eq!(outcome, PollOutcome::Failed(FakeStatus("Broken")));
        assert_eq!(source.calls(), 1);
        assert!(poller.sleeper.slept.lock().unwrap().is_empty());
    }

    #[test]
    fn test_outcome_yields_status_either_way() {
        let failed = PollOutcome::Failed(FakeStatus("Broken"));
        assert!(!failed.is_success());
        assert_eq!(failed.into_status(), FakeStatus("Broken"));

        let succeeded = PollOutcome::Succeeded(FakeStatus("Done"));
        assert!(succeeded.is_success());
        assert_eq!(succeeded.status().state(), "Done");
        assert_eq!(succeeded.into_status(), FakeStatus("Done"));
    }

    #[tokio::test]
    async fn test_unknown_states_keep_polling() {
        let poller = poller(3, 300);
        let source = ScriptedSource::new(vec!["Queued", "SomethingNew", "Done"]);

        let outcome = poller.poll_until_terminal("750x", &source).await.unwrap();

        assert!(outcome.is_success());
        assert_eq!(outcome.status().state(), "Done");
        assert_eq!(source.calls(), 3);
        assert_eq!(
            *poller.sleeper.slept.lock().unwrap(),
            vec![Duration::from_secs(3), Duration::from_secs(3)]
        );
    }

    #[tokio::test]
    async fn test_fetch_error_ends_polling() {
        let poller = poller(3, 300);
        let source = ScriptedSource::new(vec!["InProgress", "error"]);

        let err = poller.poll_until_terminal("750x", &source).await.unwrap_err();
        assert!(matches!(err, CoreError::Submission { status: 503, .. }));
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_sleeper_uses_timer() {
        let config = PollConfig::new(Duration::from_secs(3), Duration::from_secs(9)).unwrap();
        let poller = JobPoller::new(config);
        let source = ScriptedSource::new(vec!["InProgress"]);

        let started = tokio::time::Instant::now();
        let err = poller.poll_until_terminal("750x", &source).await.unwrap_err();

        assert!(matches!(err, CoreError::PollTimeout { .. }));
        assert_eq!(source.calls(), 3);
        assert!(started.elapsed() >= Duration::from_secs(9));
    }

    #[test]
    fn test_poll_config() {
        let config = PollConfig::default();
        assert_eq!(config.interval(), Duration::from_secs(3));
        assert_eq!(config.max_wait(), Duration::from_secs(300));
        assert!(PollConfig::new(Duration::ZERO, Duration::from_secs(5)).is_err());
        assert!(Progress::Failed.is_terminal());
        assert!(!Progress::Pending.is_terminal());
    }
}
