//! Poll-until-terminal-state waiter
//!
//! A long-running remote operation is started once by the caller, then handed
//! to [`AsyncOperationWaiter::wait`] which polls its status with exponential
//! backoff until the status lands in the success or failure set, an
//! undeclared status shows up, or the attempt budget runs out.

pub mod kind;
pub mod policy;
pub mod sleeper;
pub mod status;

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

pub use kind::OperationKind;
pub use policy::{BackoffPolicy, PollingPolicies};
pub use sleeper::{Sleeper, TokioSleeper};
pub use status::{StatusClass, StatusTable};

/// Reads the current status of a remote operation
#[async_trait]
pub trait StatusPoller: Send + Sync {
    type Error: Send;

    async fn poll_status(&self, handle: &str) -> Result<String, Self::Error>;
}

/// A started remote operation and the vocabulary needed to wait on it
pub struct Operation<'a, P: ?Sized> {
    pub kind: OperationKind,
    pub handle: String,
    pub poller: &'a P,
    pub statuses: StatusTable,
}

impl<'a, P: StatusPoller + ?Sized> Operation<'a, P> {
    pub fn new(
        kind: OperationKind,
        handle: impl Into<String>,
        poller: &'a P,
        statuses: StatusTable,
    ) -> Self {
        Self {
            kind,
            handle: handle.into(),
            poller,
            statuses,
        }
    }
}

/// Terminal outcome of a wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitResult {
    Succeeded,
    /// The remote system reported a status from the failure set
    Failed(String),
    /// Attempts ran out while still in progress. `None` only if no poll was made.
    TimedOut(Option<String>),
    /// A status outside every declared set
    UnexpectedState(String),
}

impl WaitResult {
    pub fn is_success(&self) -> bool {
        matches!(self, WaitResult::Succeeded)
    }
}

impl fmt::Display for WaitResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitResult::Succeeded => write!(f, "succeeded"),
            WaitResult::Failed(status) => write!(f, "failed with status {}", status),
            WaitResult::TimedOut(Some(status)) => {
                write!(f, "timed out, last status {}", status)
            }
            WaitResult::TimedOut(None) => write!(f, "timed out before any poll"),
            WaitResult::UnexpectedState(status) => write!(f, "unexpected status {}", status),
        }
    }
}

/// Result of a wait plus polling statistics
#[derive(Debug, Clone, PartialEq)]
pub struct WaitOutcome {
    pub result: WaitResult,

    /// Number of status polls made
    pub polls: u32,

    /// Total time spent sleeping between polls
    pub total_delay: Duration,
}

/// Polls a started operation until it reaches a terminal outcome
#[derive(Debug, Clone, Default)]
pub struct AsyncOperationWaiter<S = TokioSleeper> {
    sleeper: S,
}

impl AsyncOperationWaiter<TokioSleeper> {
    pub fn new() -> Self {
        Self {
            sleeper: TokioSleeper,
        }
    }
}

impl<S: Sleeper> AsyncOperationWaiter<S> {
    /// Create a waiter with a custom delay primitive
    pub fn with_sleeper(sleeper: S) -> Self {
        Self { sleeper }
    }

    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    /// Wait for `operation` to finish.
    ///
    /// Errors from the status call itself are returned as `Err` and end the
    /// wait; every other path ends in one of the [`WaitResult`] variants.
    pub async fn wait<P>(
        &self,
        operation: &Operation<'_, P>,
        policy: &BackoffPolicy,
    ) -> Result<WaitOutcome, P::Error>
    where
        P: StatusPoller + ?Sized,
    {
        let mut interval = policy.initial_interval.min(policy.max_interval);
        let mut polls = 0;
        let mut total_delay = Duration::ZERO;
        let mut last_status = None;

        let finish = |result: WaitResult, polls: u32, total_delay: Duration| WaitOutcome {
            result,
            polls,
            total_delay,
        };

        while polls < policy.max_attempts {
            polls += 1;
            let status = operation.poller.poll_status(&operation.handle).await?;

            match operation.statuses.classify(&status) {
                StatusClass::Success => {
                    tracing::info!(
                        operation = %operation.kind,
                        handle = %operation.handle,
                        status = %status,
                        attempt = polls,
                        "Operation completed successfully"
                    );
                    return Ok(finish(WaitResult::Succeeded, polls, total_delay));
                }
                StatusClass::Failure => {
                    tracing::error!(
                        operation = %operation.kind,
                        handle = %operation.handle,
                        status = %status,
                        attempt = polls,
                        "Operation reported failure"
                    );
                    return Ok(finish(WaitResult::Failed(status), polls, total_delay));
                }
                StatusClass::Unrecognized => {
                    tracing::error!(
                        operation = %operation.kind,
                        handle = %operation.handle,
                        status = %status,
                        attempt = polls,
                        "Unexpected operation status"
                    );
                    return Ok(finish(
                        WaitResult::UnexpectedState(status),
                        polls,
                        total_delay,
                    ));
                }
                StatusClass::InProgress => {
                    last_status = Some(status);
                    if polls == policy.max_attempts {
                        break;
                    }

                    tracing::info!(
                        operation = %operation.kind,
                        handle = %operation.handle,
                        status = last_status.as_deref().unwrap_or_default(),
                        attempt = polls,
                        delay_ms = interval.as_millis() as u64,
                        "Operation in progress, waiting"
                    );

                    self.sleeper.sleep(interval).await;
                    total_delay += interval;
                    interval = policy.next_interval(interval);
                }
            }
        }

        tracing::warn!(
            operation = %operation.kind,
            handle = %operation.handle,
            polls,
            total_delay_ms = total_delay.as_millis() as u64,
            "Operation did not finish within the polling budget"
        );

        Ok(finish(WaitResult::TimedOut(last_status), polls, total_delay))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingSleeper, ScriptedPoller};

    const CRAWLER: StatusTable = StatusTable::new(&["READY"], &["RUNNING", "STOPPING"], &[]);
    const WITH_FAILURE: StatusTable =
        StatusTable::new(&["PREPARED"], &["PREPARING"], &["FAILED"]);

    fn waiter() -> AsyncOperationWaiter<RecordingSleeper> {
        AsyncOperationWaiter::with_sleeper(RecordingSleeper::default())
    }

    fn secs(values: &[u64]) -> Vec<Duration> {
        values.iter().map(|s| Duration::from_secs(*s)).collect()
    }

    #[tokio::test]
    async fn test_crawler_scenario() {
        let poller = ScriptedPoller::new(&["RUNNING", "RUNNING", "READY"]);
        let waiter = waiter();
        let op = Operation::new(OperationKind::CrawlerRun, "crawler", &poller, CRAWLER);

        let outcome = waiter.wait(&op, &BackoffPolicy::default()).await.unwrap();

        assert_eq!(outcome.result, WaitResult::Succeeded);
        assert_eq!(outcome.polls, 3);
        assert_eq!(poller.calls(), 3);
        assert_eq!(waiter.sleeper().recorded(), secs(&[5, 10]));
        assert_eq!(outcome.total_delay, Duration::from_secs(15));
    }

    #[tokio::test]
    async fn test_failure_state_returns_immediately() {
        let poller = ScriptedPoller::new(&["FAILED"]);
        let waiter = waiter();
        let op = Operation::new(OperationKind::AgentPreparation, "agent", &poller, WITH_FAILURE);

        let outcome = waiter.wait(&op, &BackoffPolicy::default()).await.unwrap();

        assert_eq!(outcome.result, WaitResult::Failed("FAILED".to_string()));
        assert_eq!(outcome.polls, 1);
        assert!(waiter.sleeper().recorded().is_empty());
    }

    #[tokio::test]
    async fn test_unrecognized_state_fails_fast() {
        let poller = ScriptedPoller::new(&["BOGUS", "READY"]);
        let waiter = waiter();
        let op = Operation::new(OperationKind::CrawlerRun, "crawler", &poller, CRAWLER);

        let outcome = waiter.wait(&op, &BackoffPolicy::default()).await.unwrap();

        assert_eq!(outcome.result, WaitResult::UnexpectedState("BOGUS".to_string()));
        assert_eq!(outcome.polls, 1);
        assert_eq!(poller.calls(), 1);
        assert!(waiter.sleeper().recorded().is_empty());
    }

    #[tokio::test]
    async fn test_unrecognized_after_progress() {
        let poller = ScriptedPoller::new(&["RUNNING", "DELETING"]);
        let waiter = waiter();
        let op = Operation::new(OperationKind::CrawlerRun, "crawler", &poller, CRAWLER);

        let outcome = waiter.wait(&op, &BackoffPolicy::default()).await.unwrap();

        assert_eq!(
            outcome.result,
            WaitResult::UnexpectedState("DELETING".to_string())
        );
        assert_eq!(outcome.polls, 2);
        assert_eq!(waiter.sleeper().recorded(), secs(&[5]));
    }

    #[tokio::test]
    async fn test_always_in_progress_times_out() {
        let poller = ScriptedPoller::repeating("RUNNING");
        let waiter = waiter();
        let op = Operation::new(OperationKind::CrawlerRun, "crawler", &poller, CRAWLER);

        let outcome = waiter.wait(&op, &BackoffPolicy::default()).await.unwrap();

        assert_eq!(outcome.result, WaitResult::TimedOut(Some("RUNNING".to_string())));
        assert_eq!(outcome.polls, 10);
        assert_eq!(poller.calls(), 10);
        assert_eq!(
            waiter.sleeper().recorded(),
            secs(&[5, 10, 20, 40, 60, 60, 60, 60, 60])
        );
        assert_eq!(outcome.total_delay, Duration::from_secs(375));
    }

    #[tokio::test]
    async fn test_polls_equal_progress_plus_one() {
        for progress in 0..6 {
            let mut script = vec!["STOPPING"; progress];
            script.push("READY");
            let poller = ScriptedPoller::new(&script);
            let waiter = waiter();
            let op = Operation::new(OperationKind::CrawlerRun, "crawler", &poller, CRAWLER);

            let outcome = waiter.wait(&op, &BackoffPolicy::default()).await.unwrap();

            assert_eq!(outcome.result, WaitResult::Succeeded);
            assert_eq!(outcome.polls as usize, progress + 1);
            assert_eq!(waiter.sleeper().recorded().len(), progress);
        }
    }

    #[tokio::test]
    async fn test_success_on_last_attempt() {
        let poller = ScriptedPoller::new(&["RUNNING", "RUNNING", "READY"]);
        let waiter = waiter();
        let op = Operation::new(OperationKind::CrawlerRun, "crawler", &poller, CRAWLER);
        let policy = BackoffPolicy::new().with_max_attempts(3);

        let outcome = waiter.wait(&op, &policy).await.unwrap();

        assert_eq!(outcome.result, WaitResult::Succeeded);
        assert_eq!(outcome.polls, 3);
    }

    #[tokio::test]
    async fn test_terminal_wait_is_idempotent() {
        let poller = ScriptedPoller::repeating("READY");
        let waiter = waiter();
        let op = Operation::new(OperationKind::CrawlerRun, "crawler", &poller, CRAWLER);

        let first = waiter.wait(&op, &BackoffPolicy::default()).await.unwrap();
        let second = waiter.wait(&op, &BackoffPolicy::default()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.polls, 1);
        assert!(waiter.sleeper().recorded().is_empty());
    }

    #[tokio::test]
    async fn test_poll_error_is_propagated() {
        let poller = ScriptedPoller::new(&["RUNNING"]).failing_after(1);
        let waiter = waiter();
        let op = Operation::new(OperationKind::CrawlerRun, "crawler", &poller, CRAWLER);

        let err = waiter
            .wait(&op, &BackoffPolicy::default())
            .await
            .unwrap_err();

        assert!(err.contains("poll 2"));
        assert_eq!(waiter.sleeper().recorded(), secs(&[5]));
    }

    #[tokio::test]
    async fn test_zero_attempts_times_out_without_polling() {
        let poller = ScriptedPoller::repeating("READY");
        let waiter = waiter();
        let op = Operation::new(OperationKind::CrawlerRun, "crawler", &poller, CRAWLER);
        let policy = BackoffPolicy::new().with_max_attempts(0);

        let outcome = waiter.wait(&op, &policy).await.unwrap();

        assert_eq!(outcome.result, WaitResult::TimedOut(None));
        assert_eq!(poller.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_waiter_sleeps_real_time() {
        let poller = ScriptedPoller::new(&["RUNNING", "READY"]);
        let waiter = AsyncOperationWaiter::new();
        let op = Operation::new(OperationKind::CrawlerRun, "crawler", &poller, CRAWLER);
        let start = tokio::time::Instant::now();

        let outcome = waiter.wait(&op, &BackoffPolicy::default()).await.unwrap();

        assert!(outcome.result.is_success());
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[test]
    fn test_wait_result_display() {
        assert_eq!(WaitResult::Succeeded.to_string(), "succeeded");
        assert_eq!(
            WaitResult::TimedOut(Some("RUNNING".into())).to_string(),
            "timed out, last status RUNNING"
        );
        assert_eq!(
            WaitResult::UnexpectedState("BOGUS".into()).to_string(),
            "unexpected status BOGUS"
        );
    }
}
