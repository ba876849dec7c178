//! Fixed-interval status polling for a single job.
//!
//! Encoding.com only calls a notification URL on success or failure. These
//! helpers let a caller follow the states in between. Every iteration is one
//! GetStatus request, so keep the interval sensible: states that come and go
//! between two polls are never seen.
//!
//! There is no retry, backoff or timeout here. Any error from the status
//! query or from the callback ends the poll and is returned as is.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::errors::{EncodingError, Result};
use crate::models::{JobStatus, StatusReport};

const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// Anything that can report the current status of a job.
///
/// Implemented by [`Client`](crate::Client). Implementations must fail with
/// [`EncodingError::Service`] when the service reports an error, even if
/// the transport succeeded.
#[async_trait]
pub trait StatusClient: Send + Sync {
    async fn get_status(&self, job_id: &str) -> Result<StatusReport>;
}

/// Called with the job id, the observed status and the full report.
///
/// Returning an error stops the poll; the error is handed back to the caller.
pub type StatusCallback = Box<dyn Fn(&str, &JobStatus, &StatusReport) -> Result<()> + Send + Sync>;

/// Polling configuration.
pub struct PollOptions {
    /// Pause between two queries. Default: 5s. Zero polls back to back.
    pub interval: Duration,
    /// Extra exit status for [`poll_until_status`]. Default: Finished.
    pub target: JobStatus,
    pub on_status: Option<StatusCallback>,
}

impl PollOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn target(mut self, target: impl Into<JobStatus>) -> Self {
        self.target = target.into();
        self
    }

    pub fn on_status<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str, &JobStatus, &StatusReport) -> Result<()> + Send + Sync + 'static,
    {
        self.on_status = Some(Box::new(callback));
        self
    }

    fn notify(&self, job_id: &str, report: &StatusReport) -> Result<()> {
        match self.on_status {
            Some(ref cb) => cb(job_id, &report.status, report),
            None => Ok(()),
        }
    }
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            target: JobStatus::Finished,
            on_status: None,
        }
    }
}

impl fmt::Debug for PollOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollOptions")
            .field("interval", &self.interval)
            .field("target", &self.target)
            .field("on_status", &self.on_status.is_some())
            .finish()
    }
}

/// Poll until the job reaches `opts.target` or any terminal status.
///
/// A non-terminal target is added to the terminal set, not substituted for
/// it, so a job that fails before reaching the target still ends the poll.
/// The callback fires once, for the report that ended the poll, and that
/// report is returned.
///
/// # Errors
///
/// - [`EncodingError::InvalidArgument`] if `job_id` is blank. Nothing is queried.
/// - Whatever the status query or the callback returned.
pub async fn poll_until_status<C>(
    client: &C,
    job_id: &str,
    opts: &PollOptions,
) -> Result<StatusReport>
where
    C: StatusClient + ?Sized,
{
    check_job_id(job_id)?;
    let exit = exit_statuses(&opts.target);

    info!(job_id, target = %opts.target, interval = ?opts.interval, "polling until status");

    let mut polls: u64 = 0;
    loop {
        let report = client.get_status(job_id).await?;
        polls += 1;
        debug!(job_id, status = %report.status, polls, "polled status");

        if exit.contains(&report.status) {
            info!(job_id, status = %report.status, polls, "exit status reached");
            opts.notify(job_id, &report)?;
            return Ok(report);
        }

        tokio::time::sleep(opts.interval).await;
    }
}

/// Poll until the job is terminal, firing the callback on every status change.
///
/// The first observation always counts as a change. `opts.target` is not
/// used. Returns the terminal report.
///
/// # Errors
///
/// Same as [`poll_until_status`].
pub async fn poll_status_changes<C>(
    client: &C,
    job_id: &str,
    opts: &PollOptions,
) -> Result<StatusReport>
where
    C: StatusClient + ?Sized,
{
    check_job_id(job_id)?;

    info!(job_id, interval = ?opts.interval, "polling status changes");

    let mut last: Option<JobStatus> = None;
    let mut polls: u64 = 0;
    loop {
        let report = client.get_status(job_id).await?;
        polls += 1;
        debug!(job_id, status = %report.status, polls, "polled status");

        if last.as_ref() != Some(&report.status) {
            info!(
                job_id,
                from = last.as_ref().map(JobStatus::as_str).unwrap_or("-"),
                to = %report.status,
                "status changed"
            );
            last = Some(report.status.clone());
            opts.notify(job_id, &report)?;
        }

        if report.status.is_terminal() {
            return Ok(report);
        }

        tokio::time::sleep(opts.interval).await;
    }
}

fn check_job_id(job_id: &str) -> Result<()> {
    if job_id.trim().is_empty() {
        return Err(EncodingError::InvalidArgument(
            "job id must not be empty".into(),
        ));
    }
    Ok(())
}

fn exit_statuses(target: &JobStatus) -> Vec<JobStatus> {
    let mut exit = JobStatus::TERMINAL.to_vec();
    if !exit.contains(target) {
        exit.push(target.clone());
    }
    exit
}
