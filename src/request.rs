use serde_json::{json, Map, Value};

use crate::errors::{EncodingError, Result};
use crate::format::{yes_no, Format};

/// Actions understood by the Encoding.com API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    GetMediaInfo,
    GetStatus,
    GetMediaList,
    AddMedia,
    /// Like AddMedia, but the media is only downloaded. Start it with ProcessMedia.
    AddMediaBenchmark,
    ProcessMedia,
    /// Replaces every format of an existing media. Running tasks are cancelled.
    UpdateMedia,
    CancelMedia,
}

/// A query field an action cannot be sent without.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    MediaId,
    Source,
    Format,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::MediaId => "mediaid",
            Field::Source => "source",
            Field::Format => "format",
        }
    }
}

impl Action {
    /// Vendor action name.
    pub fn name(self) -> &'static str {
        match self {
            Action::GetMediaInfo => "GetMediaInfo",
            Action::GetStatus => "GetStatus",
            Action::GetMediaList => "GetMediaList",
            Action::AddMedia => "AddMedia",
            Action::AddMediaBenchmark => "AddMediaBenchmark",
            Action::ProcessMedia => "ProcessMedia",
            Action::UpdateMedia => "UpdateMedia",
            Action::CancelMedia => "CancelMedia",
        }
    }

    pub fn required(self) -> &'static [Field] {
        match self {
            Action::GetMediaInfo | Action::GetStatus | Action::CancelMedia => &[Field::MediaId],
            Action::GetMediaList => &[],
            Action::AddMedia | Action::AddMediaBenchmark => &[Field::Source, Field::Format],
            Action::ProcessMedia | Action::UpdateMedia => &[Field::MediaId, Field::Format],
        }
    }
}

/// Fields of one request, minus the identity the client adds itself.
///
/// ```
/// use encodingcom::{Format, Query};
///
/// let query = Query::new()
///     .source("https://example.com/in.mov")
///     .format(Format::new("mp4").video_codec("libx264"))
///     .notify("https://example.com/hook")
///     .extra("region", "us-east-1");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Query {
    media_ids: Vec<String>,
    sources: Vec<String>,
    formats: Vec<Format>,
    notify: Option<String>,
    notify_encoding_errors: Option<String>,
    notify_upload: Option<String>,
    instant: Option<bool>,
    extended: Option<bool>,
    region: Option<String>,
    extra: Map<String, Value>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn media_id(mut self, id: impl Into<String>) -> Self {
        self.media_ids.push(id.into());
        self
    }

    /// Several media ids. They go on the wire comma-separated.
    pub fn media_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.media_ids.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Source URL (http, https, ftp or s3). Local paths are not accepted by the service.
    pub fn source(mut self, url: impl Into<String>) -> Self {
        self.sources.push(url.into());
        self
    }

    pub fn format(mut self, format: Format) -> Self {
        self.formats.push(format);
        self
    }

    /// URL called when the job finishes.
    pub fn notify(mut self, url: impl Into<String>) -> Self {
        self.notify = Some(url.into());
        self
    }

    /// URL called on encoding errors.
    pub fn notify_encoding_errors(mut self, url: impl Into<String>) -> Self {
        self.notify_encoding_errors = Some(url.into());
        self
    }

    pub fn notify_upload(mut self, url: impl Into<String>) -> Self {
        self.notify_upload = Some(url.into());
        self
    }

    /// Start processing while the source is still downloading.
    pub fn instant(mut self, instant: bool) -> Self {
        self.instant = Some(instant);
        self
    }

    pub fn extended(mut self, extended: bool) -> Self {
        self.extended = Some(extended);
        self
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Any vendor field this builder has no setter for.
    ///
    /// Extension fields never replace the identity, action, or a field set
    /// through a dedicated setter.
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    fn has(&self, field: Field) -> bool {
        match field {
            Field::MediaId => self.media_ids.iter().any(|id| !id.trim().is_empty()),
            Field::Source => self.sources.iter().any(|s| !s.trim().is_empty()),
            Field::Format => !self.formats.is_empty(),
        }
    }

    /// Fail fast if `action` needs a field this query lacks.
    pub fn check_required(&self, action: Action) -> Result<()> {
        match action.required().iter().find(|f| !self.has(**f)) {
            Some(field) => Err(EncodingError::InvalidArgument(format!(
                "{} requires `{}`",
                action.name(),
                field.name()
            ))),
            None => Ok(()),
        }
    }

    /// Build the `{"query": {...}}` envelope for `action`.
    pub(crate) fn into_envelope(self, action: Action, identity: &Identity) -> Result<Value> {
        self.check_required(action)?;

        let mut body = self.extra;

        let media_ids: Vec<&str> = self
            .media_ids
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();
        if !media_ids.is_empty() {
            body.insert("mediaid".into(), json!(media_ids.join(",")));
        }

        let extended = match (action, self.extended) {
            (_, Some(flag)) => Some(flag),
            (Action::GetStatus, None) if media_ids.len() > 1 => Some(true),
            _ => None,
        };
        if let Some(flag) = extended {
            body.insert("extended".into(), json!(yes_no(flag)));
        }

        if !self.sources.is_empty() {
            body.insert("source".into(), json!(self.sources));
        }

        match self.formats.len() {
            0 => {}
            1 => {
                body.insert("format".into(), json!(self.formats[0]));
            }
            _ => {
                body.insert("format".into(), json!(self.formats));
            }
        }

        let instant = match action {
            Action::AddMedia | Action::AddMediaBenchmark => {
                Some(self.instant.unwrap_or(identity.instant))
            }
            _ => self.instant,
        };
        if let Some(flag) = instant {
            body.insert("instant".into(), json!(yes_no(flag)));
        }

        let notify = self.notify.or_else(|| identity.notify.clone());
        let notify_errors = self
            .notify_encoding_errors
            .or_else(|| identity.notify_encoding_errors.clone());
        for (key, value) in [
            ("notify", notify),
            ("notify_encoding_errors", notify_errors),
            ("notify_upload", self.notify_upload),
            ("region", self.region),
        ] {
            if let Some(v) = value {
                body.insert(key.into(), json!(v));
            }
        }

        body.insert("userid".into(), json!(identity.user_id));
        body.insert("userkey".into(), json!(identity.user_key));
        body.insert("action".into(), json!(action.name()));
        body.insert("notify_format".into(), json!(identity.notify_format));

        Ok(json!({ "query": body }))
    }
}

/// Account identity and per-client defaults stamped on every request.
#[derive(Debug, Clone)]
pub(crate) struct Identity {
    pub user_id: String,
    pub user_key: String,
    pub notify_format: String,
    pub notify: Option<String>,
    pub notify_encoding_errors: Option<String>,
    pub instant: bool,
}
