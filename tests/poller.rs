use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use encodingcom::{
    poll_status_changes, poll_until_status, EncodingError, JobStatus, PollOptions, StatusClient,
    StatusReport,
};
use serde_json::json;
use tokio::time::Instant;

const JOB: &str = "38415489";
const INTERVAL: Duration = Duration::from_secs(5);

/// Answers GetStatus from a fixed script, one entry per query.
struct ScriptedClient {
    script: Mutex<VecDeque<encodingcom::Result<String>>>,
    calls: AtomicUsize,
}

impl ScriptedClient {
    fn statuses(statuses: &[&str]) -> Self {
        Self::new(statuses.iter().map(|s| Ok(s.to_string())).collect())
    }

    fn new(script: Vec<encodingcom::Result<String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatusClient for ScriptedClient {
    async fn get_status(&self, job_id: &str) -> encodingcom::Result<StatusReport> {
        let query = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .expect("queried past the end of the script");
        let status = next?;
        StatusReport::from_response(
            200,
            json!({ "id": job_id, "status": status, "query": query }),
        )
    }
}

/// Records every callback as (job id, status, query number).
#[derive(Clone, Default)]
struct Recorder {
    seen: Arc<Mutex<Vec<(String, JobStatus, u64)>>>,
}

impl Recorder {
    fn options(&self) -> PollOptions {
        let seen = Arc::clone(&self.seen);
        PollOptions::new().interval(INTERVAL).on_status(move |id, status, report| {
            let query = report.raw["query"].as_u64().unwrap_or_default();
            seen.lock().unwrap().push((id.to_string(), status.clone(), query));
            Ok(())
        })
    }

    fn take(&self) -> Vec<(String, JobStatus, u64)> {
        self.seen.lock().unwrap().drain(..).collect()
    }
}

fn service_error() -> EncodingError {
    EncodingError::Service {
        errors: vec!["Media not found".into()],
    }
}

#[tokio::test(start_paused = true)]
async fn until_status_returns_report_of_first_exit_status() {
    let client = ScriptedClient::statuses(&["New", "Downloading", "Processing", "Finished", "New"]);
    let recorder = Recorder::default();
    let started = Instant::now();

    let report = poll_until_status(&client, JOB, &recorder.options()).await.unwrap();

    assert_eq!(client.calls(), 4);
    assert_eq!(report.status, JobStatus::Finished);
    assert_eq!(report.raw["query"], 4);
    let elapsed = started.elapsed();
    assert!(elapsed >= INTERVAL * 3 && elapsed < INTERVAL * 4, "slept {elapsed:?}");
    assert_eq!(
        recorder.take(),
        vec![(JOB.to_string(), JobStatus::Finished, 4)]
    );
}

#[tokio::test(start_paused = true)]
async fn until_status_stops_on_non_terminal_target() {
    let client = ScriptedClient::statuses(&["New", "Processing", "Finished"]);
    let recorder = Recorder::default();
    let opts = recorder.options().target("Processing");

    let report = poll_until_status(&client, JOB, &opts).await.unwrap();

    assert_eq!(client.calls(), 2);
    assert_eq!(report.status, JobStatus::Processing);
    assert_eq!(
        recorder.take(),
        vec![(JOB.to_string(), JobStatus::Processing, 2)]
    );
}

#[tokio::test(start_paused = true)]
async fn until_status_still_exits_on_terminal_when_target_is_never_seen() {
    let client = ScriptedClient::statuses(&["New", "Error"]);
    let opts = PollOptions::new().interval(INTERVAL).target("Saving");

    let report = poll_until_status(&client, JOB, &opts).await.unwrap();

    assert_eq!(client.calls(), 2);
    assert_eq!(report.status, JobStatus::Error);
}

#[tokio::test(start_paused = true)]
async fn terminal_target_behaves_like_default() {
    for opts in [
        PollOptions::new().interval(INTERVAL),
        PollOptions::new().interval(INTERVAL).target("Finished"),
        PollOptions::new().interval(INTERVAL).target(JobStatus::Error),
    ] {
        let client = ScriptedClient::statuses(&["New", "Saving", "Stopped", "Finished"]);
        let report = poll_until_status(&client, JOB, &opts).await.unwrap();
        assert_eq!(client.calls(), 3);
        assert_eq!(report.status, JobStatus::Stopped);
    }
}

#[tokio::test(start_paused = true)]
async fn until_status_propagates_service_error_without_callback() {
    let client = ScriptedClient::new(vec![
        Ok("New".into()),
        Err(service_error()),
        Ok("Finished".into()),
    ]);
    let recorder = Recorder::default();

    let err = poll_until_status(&client, JOB, &recorder.options())
        .await
        .unwrap_err();

    match err {
        EncodingError::Service { errors } => assert_eq!(errors, vec!["Media not found".to_string()]),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(client.calls(), 2);
    assert!(recorder.take().is_empty());
}

#[tokio::test(start_paused = true)]
async fn status_changes_fire_once_per_distinct_run() {
    let client = ScriptedClient::statuses(&["New", "New", "Processing", "Finished"]);
    let recorder = Recorder::default();

    let report = poll_status_changes(&client, JOB, &recorder.options())
        .await
        .unwrap();

    assert_eq!(client.calls(), 4);
    assert_eq!(report.status, JobStatus::Finished);
    assert_eq!(
        recorder.take(),
        vec![
            (JOB.to_string(), JobStatus::New, 1),
            (JOB.to_string(), JobStatus::Processing, 3),
            (JOB.to_string(), JobStatus::Finished, 4),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn status_changes_report_repeated_values_after_a_different_one() {
    let client = ScriptedClient::statuses(&[
        "Processing",
        "Saving",
        "Processing",
        "Processing",
        "Uploading to CDN",
        "Stopped",
    ]);
    let recorder = Recorder::default();

    poll_status_changes(&client, JOB, &recorder.options())
        .await
        .unwrap();

    let statuses: Vec<JobStatus> = recorder.take().into_iter().map(|(_, s, _)| s).collect();
    assert_eq!(
        statuses,
        vec![
            JobStatus::Processing,
            JobStatus::Saving,
            JobStatus::Processing,
            JobStatus::Other("Uploading to CDN".into()),
            JobStatus::Stopped,
        ]
    );
    assert_eq!(client.calls(), 6);
}

#[tokio::test(start_paused = true)]
async fn status_changes_with_terminal_first_reply_do_not_sleep() {
    let client = ScriptedClient::statuses(&["Finished"]);
    let recorder = Recorder::default();
    let started = Instant::now();

    let report = poll_status_changes(&client, JOB, &recorder.options())
        .await
        .unwrap();

    assert_eq!(client.calls(), 1);
    assert_eq!(report.status, JobStatus::Finished);
    assert_eq!(recorder.take().len(), 1);
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn status_changes_ignore_target() {
    let client = ScriptedClient::statuses(&["New", "Processing", "Error"]);
    let opts = PollOptions::new().interval(INTERVAL).target("Processing");

    let report = poll_status_changes(&client, JOB, &opts).await.unwrap();

    assert_eq!(client.calls(), 3);
    assert_eq!(report.status, JobStatus::Error);
}

#[tokio::test(start_paused = true)]
async fn zero_interval_queries_back_to_back() {
    let mut script = vec!["Processing"; 50];
    script.push("Finished");
    let client = ScriptedClient::statuses(&script);
    let opts = PollOptions::new().interval(Duration::ZERO);
    let started = Instant::now();

    let report = poll_until_status(&client, JOB, &opts).await.unwrap();

    assert_eq!(report.status, JobStatus::Finished);
    assert_eq!(client.calls(), 51);
    assert!(started.elapsed() < INTERVAL);
}

#[tokio::test(start_paused = true)]
async fn blank_job_id_fails_before_any_query() {
    let client = ScriptedClient::statuses(&["Finished"]);

    for id in ["", "  "] {
        let err = poll_until_status(&client, id, &PollOptions::new()).await.unwrap_err();
        assert!(matches!(err, EncodingError::InvalidArgument(_)));
        let err = poll_status_changes(&client, id, &PollOptions::new()).await.unwrap_err();
        assert!(matches!(err, EncodingError::InvalidArgument(_)));
    }
    assert_eq!(client.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn callback_error_aborts_the_poll() {
    let client = ScriptedClient::statuses(&["New", "Processing", "Finished"]);
    let opts = PollOptions::new().interval(INTERVAL).on_status(|_, status, _| {
        if *status == JobStatus::Processing {
            return Err(EncodingError::Aborted("operator gave up".into()));
        }
        Ok(())
    });

    let err = poll_status_changes(&client, JOB, &opts).await.unwrap_err();

    assert!(matches!(err, EncodingError::Aborted(ref msg) if msg == "operator gave up"));
    assert_eq!(client.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn missing_status_field_is_an_unexpected_response() {
    struct NoStatus;

    #[async_trait]
    impl StatusClient for NoStatus {
        async fn get_status(&self, _job_id: &str) -> encodingcom::Result<StatusReport> {
            StatusReport::from_response(200, json!({ "id": JOB }))
        }
    }

    let err = poll_until_status(&NoStatus, JOB, &PollOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, EncodingError::UnexpectedResponse(_)));
}

const NON_TERMINAL: [&str; 7] = [
    "New",
    "Downloading",
    "Downloaded",
    "Ready to process",
    "Waiting for encoder",
    "Processing",
    "Saving",
];
const TERMINAL: [&str; 3] = ["Finished", "Error", "Stopped"];

/// Deterministic status scripts: a run of non-terminal statuses followed by
/// one terminal status and some trailing noise the poller must never read.
fn generated_scripts() -> Vec<Vec<&'static str>> {
    let mut seed: u64 = 0x5eed_1234;
    let mut next = move |bound: usize| {
        seed = seed
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((seed >> 33) as usize) % bound
    };

    (0..200)
        .map(|_| {
            let len = next(12);
            let mut script: Vec<&str> = (0..len)
                .map(|_| NON_TERMINAL[next(NON_TERMINAL.len())])
                .collect();
            script.push(TERMINAL[next(TERMINAL.len())]);
            script.push("New");
            script
        })
        .collect()
}

fn terminal_index(script: &[&str]) -> usize {
    script
        .iter()
        .position(|s| JobStatus::from(*s).is_terminal())
        .expect("script has a terminal status")
}

#[tokio::test(start_paused = true)]
async fn until_status_over_generated_sequences() {
    for script in generated_scripts() {
        let n = terminal_index(&script);
        let client = ScriptedClient::statuses(&script);
        let recorder = Recorder::default();

        let report = poll_until_status(&client, JOB, &recorder.options()).await.unwrap();

        assert_eq!(client.calls(), n + 1, "script {script:?}");
        assert_eq!(report.status, JobStatus::from(script[n]));
        assert_eq!(report.raw["query"], (n + 1) as u64);
        assert_eq!(
            recorder.take(),
            vec![(JOB.to_string(), JobStatus::from(script[n]), (n + 1) as u64)]
        );
    }
}

#[tokio::test(start_paused = true)]
async fn status_changes_over_generated_sequences() {
    for script in generated_scripts() {
        let n = terminal_index(&script);
        let client = ScriptedClient::statuses(&script);
        let recorder = Recorder::default();

        let report = poll_status_changes(&client, JOB, &recorder.options())
            .await
            .unwrap();

        let mut expected = Vec::new();
        for (i, s) in script[..=n].iter().enumerate() {
            if i == 0 || script[i - 1] != *s {
                expected.push((JOB.to_string(), JobStatus::from(*s), (i + 1) as u64));
            }
        }

        assert_eq!(client.calls(), n + 1, "script {script:?}");
        assert_eq!(report.status, JobStatus::from(script[n]));
        assert_eq!(recorder.take(), expected, "script {script:?}");
    }
}
