use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{EncodingError, Result};

/// Status of a job as reported by GetStatus.
///
/// The terminal values are fixed. Non-terminal values are open-ended, so
/// anything unrecognized is kept verbatim in [`JobStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    New,
    Downloading,
    Downloaded,
    ReadyToProcess,
    WaitingForEncoder,
    Processing,
    Saving,
    Finished,
    Error,
    Stopped,
    Other(String),
}

impl JobStatus {
    /// Statuses after which the service will not change the job again.
    pub const TERMINAL: [JobStatus; 3] = [JobStatus::Finished, JobStatus::Error, JobStatus::Stopped];

    /// Finished, Error or Stopped.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Finished | JobStatus::Error | JobStatus::Stopped)
    }

    /// The exact string Encoding.com uses for this status.
    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::New => "New",
            JobStatus::Downloading => "Downloading",
            JobStatus::Downloaded => "Downloaded",
            JobStatus::ReadyToProcess => "Ready to process",
            JobStatus::WaitingForEncoder => "Waiting for encoder",
            JobStatus::Processing => "Processing",
            JobStatus::Saving => "Saving",
            JobStatus::Finished => "Finished",
            JobStatus::Error => "Error",
            JobStatus::Stopped => "Stopped",
            JobStatus::Other(s) => s,
        }
    }
}

impl From<&str> for JobStatus {
    fn from(s: &str) -> Self {
        match s {
            "New" => JobStatus::New,
            "Downloading" => JobStatus::Downloading,
            "Downloaded" => JobStatus::Downloaded,
            "Ready to process" => JobStatus::ReadyToProcess,
            "Waiting for encoder" => JobStatus::WaitingForEncoder,
            "Processing" => JobStatus::Processing,
            "Saving" => JobStatus::Saving,
            "Finished" => JobStatus::Finished,
            "Error" => JobStatus::Error,
            "Stopped" => JobStatus::Stopped,
            other => JobStatus::Other(other.to_string()),
        }
    }
}

impl From<String> for JobStatus {
    fn from(s: String) -> Self {
        JobStatus::from(s.as_str())
    }
}

impl From<JobStatus> for String {
    fn from(s: JobStatus) -> Self {
        s.as_str().to_string()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One GetStatus answer for a single job.
#[derive(Debug, Clone)]
pub struct StatusReport {
    /// Transport status. Says nothing about whether the action succeeded.
    pub http_status: u16,
    pub status: JobStatus,
    /// The unwrapped `response` object.
    pub raw: serde_json::Value,
}

impl StatusReport {
    /// Build a report from an unwrapped GetStatus `response` object.
    ///
    /// Fails with [`EncodingError::UnexpectedResponse`] if there is no `status` string.
    pub fn from_response(http_status: u16, raw: serde_json::Value) -> Result<Self> {
        let status = raw
            .get("status")
            .and_then(|v| v.as_str())
            .map(JobStatus::from)
            .ok_or_else(|| {
                EncodingError::UnexpectedResponse("GetStatus reply has no `status` field".into())
            })?;

        Ok(Self {
            http_status,
            status,
            raw,
        })
    }

    pub fn media_id(&self) -> String {
        json_str(&self.raw, "id")
    }

    /// Percent complete, when the service reports it.
    pub fn progress(&self) -> Option<f64> {
        match self.raw.get("progress")? {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// One entry of the media queue (GetMediaList).
#[derive(Debug, Clone)]
pub struct Media {
    pub id: String,
    /// Source file URL.
    pub file: String,
    pub status: JobStatus,
    pub created_at: String,
    pub started_at: String,
    pub finished_at: String,
    pub raw: serde_json::Value,
}

/// The media queue, oldest first.
#[derive(Debug, Clone, Default)]
pub struct MediaList {
    pub media: Vec<Media>,
}

impl MediaList {
    /// Parse the unwrapped GetMediaList `response` object.
    ///
    /// A queue holding one job comes back as a bare object rather than an
    /// array, and an empty queue omits `media` entirely.
    pub fn from_response(response: &serde_json::Value) -> Self {
        let media = match response.get("media") {
            Some(serde_json::Value::Array(items)) => {
                items.iter().cloned().map(media_from_value).collect()
            }
            Some(obj @ serde_json::Value::Object(_)) => vec![media_from_value(obj.clone())],
            _ => Vec::new(),
        };
        Self { media }
    }

    pub fn latest(&self) -> Option<&Media> {
        self.media.last()
    }

    pub fn oldest(&self) -> Option<&Media> {
        self.media.first()
    }

    pub fn is_empty(&self) -> bool {
        self.media.is_empty()
    }

    pub fn len(&self) -> usize {
        self.media.len()
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Pull a string out of a JSON value, or `""` if missing.
pub(crate) fn json_str(val: &serde_json::Value, key: &str) -> String {
    val.get(key)
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

pub(crate) fn media_from_value(val: serde_json::Value) -> Media {
    Media {
        id: json_str(&val, "mediaid"),
        file: json_str(&val, "mediafile"),
        status: JobStatus::from(json_str(&val, "mediastatus")),
        created_at: json_str(&val, "createdate"),
        started_at: json_str(&val, "startdate"),
        finished_at: json_str(&val, "finishdate"),
        raw: val,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn multi_word_statuses_keep_their_wire_spelling() {
        let status = JobStatus::from("Waiting for encoder");
        assert_eq!(status, JobStatus::WaitingForEncoder);
        assert_eq!(status.to_string(), "Waiting for encoder");
        assert_eq!(JobStatus::from("Ready to process"), JobStatus::ReadyToProcess);
    }

    #[test]
    fn unknown_status_is_preserved_and_not_terminal() {
        let status = JobStatus::from("Uploading to CDN");
        assert_eq!(status, JobStatus::Other("Uploading to CDN".into()));
        assert_eq!(status.as_str(), "Uploading to CDN");
        assert!(!status.is_terminal());
    }

    #[test]
    fn terminal_set_is_finished_error_stopped() {
        for s in JobStatus::TERMINAL {
            assert!(s.is_terminal());
        }
        assert!(!JobStatus::Processing.is_terminal());
        assert!(!JobStatus::New.is_terminal());
    }

    #[test]
    fn status_serializes_as_plain_string() {
        let v = serde_json::to_value(JobStatus::ReadyToProcess).unwrap();
        assert_eq!(v, json!("Ready to process"));
        let back: JobStatus = serde_json::from_value(json!("Stopped")).unwrap();
        assert_eq!(back, JobStatus::Stopped);
    }

    #[test]
    fn status_report_requires_status_field() {
        let err = StatusReport::from_response(200, json!({ "id": "1" })).unwrap_err();
        assert!(matches!(err, EncodingError::UnexpectedResponse(_)));

        let report =
            StatusReport::from_response(200, json!({ "id": "42", "status": "Saving", "progress": "87.5" }))
                .unwrap();
        assert_eq!(report.status, JobStatus::Saving);
        assert_eq!(report.media_id(), "42");
        assert_eq!(report.progress(), Some(87.5));
    }

    #[test]
    fn media_list_accepts_array_object_or_nothing() {
        let many = MediaList::from_response(&json!({
            "media": [
                { "mediaid": "1", "mediastatus": "Finished" },
                { "mediaid": "2", "mediastatus": "New" }
            ]
        }));
        assert_eq!(many.len(), 2);
        assert_eq!(many.oldest().unwrap().id, "1");
        assert_eq!(many.latest().unwrap().id, "2");
        assert_eq!(many.latest().unwrap().status, JobStatus::New);

        let one = MediaList::from_response(&json!({ "media": { "mediaid": "7" } }));
        assert_eq!(one.len(), 1);
        assert_eq!(one.latest().unwrap().id, "7");

        assert!(MediaList::from_response(&json!({})).is_empty());
    }
}
