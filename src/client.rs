use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::errors::{EncodingError, Result};
use crate::models::{Media, MediaList, StatusReport};
use crate::poller::StatusClient;
use crate::request::{Action, Identity, Query};
use crate::response::{inner_response, VendorReply};

const DEFAULT_HOST: &str = "manage.encoding.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
/// Encoding.com answers in XML unless told otherwise.
const NOTIFY_FORMAT: &str = "json";

/// Builder for constructing a [`Client`] with custom configuration.
///
/// # Example
///
/// ```no_run
/// use encodingcom::ClientBuilder;
/// use std::time::Duration;
///
/// # fn example() -> encodingcom::Result<()> {
/// let client = ClientBuilder::new()
///     .user_id("12345")
///     .user_key("abcdef")
///     .notify_url("https://example.com/encoding/done")
///     .timeout(Duration::from_secs(120))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ClientBuilder {
    user_id: Option<String>,
    user_key: Option<String>,
    base_url: Option<String>,
    https: bool,
    notify_url: Option<String>,
    error_url: Option<String>,
    instant: bool,
    timeout: Duration,
}

impl ClientBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            user_id: None,
            user_key: None,
            base_url: None,
            https: true,
            notify_url: None,
            error_url: None,
            instant: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn user_id(mut self, id: impl Into<String>) -> Self {
        self.user_id = Some(id.into());
        self
    }

    pub fn user_key(mut self, key: impl Into<String>) -> Self {
        self.user_key = Some(key.into());
        self
    }

    /// Override the endpoint entirely (defaults to `https://manage.encoding.com`).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Talk to the default host over https (port 443, the default) or plain http (port 80).
    pub fn https(mut self, https: bool) -> Self {
        self.https = https;
        self
    }

    /// Default `notify` URL for every request that does not set its own.
    pub fn notify_url(mut self, url: impl Into<String>) -> Self {
        self.notify_url = Some(url.into());
        self
    }

    /// Default `notify_encoding_errors` URL.
    pub fn error_url(mut self, url: impl Into<String>) -> Self {
        self.error_url = Some(url.into());
        self
    }

    /// Whether AddMedia starts processing before the source finished downloading (defaults to `false`).
    pub fn instant(mut self, instant: bool) -> Self {
        self.instant = instant;
        self
    }

    /// Set the HTTP request timeout (defaults to 60 seconds).
    pub fn timeout(mut self, d: Duration) -> Self {
        self.timeout = d;
        self
    }

    /// Build the [`Client`].
    ///
    /// Credentials not given to the builder are read from `ENCODING_USER_ID`
    /// and `ENCODING_USER_KEY`. Returns [`EncodingError::InvalidIdentity`] if
    /// either is still missing.
    pub fn build(self) -> Result<Client> {
        let user_id = non_empty(self.user_id, "ENCODING_USER_ID")?;
        let user_key = non_empty(self.user_key, "ENCODING_USER_KEY")?;

        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(EncodingError::Http)?;

        let base_url = match self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None if self.https => format!("https://{DEFAULT_HOST}"),
            None => format!("http://{DEFAULT_HOST}"),
        };

        Ok(Client {
            base_url,
            identity: Identity {
                user_id,
                user_key,
                notify_format: NOTIFY_FORMAT.to_string(),
                notify: self.notify_url,
                notify_encoding_errors: self.error_url,
                instant: self.instant,
            },
            http,
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn non_empty(explicit: Option<String>, env_var: &str) -> Result<String> {
    explicit
        .or_else(|| std::env::var(env_var).ok())
        .filter(|s| !s.trim().is_empty())
        .ok_or(EncodingError::InvalidIdentity)
}

/// A reply with its `response` object unwrapped.
#[derive(Debug, Clone)]
pub struct Reply {
    /// Transport status. A 200 may still carry an error, which is why
    /// replies with embedded errors never become a `Reply`.
    pub http_status: u16,
    pub response: serde_json::Value,
    /// Full body as sent by the service.
    pub raw: serde_json::Value,
}

/// The Encoding.com API client.
///
/// Configuration is fixed at construction. Use [`Client::new`] for quick
/// construction or [`ClientBuilder`] for full control.
///
/// # Example
///
/// ```no_run
/// use encodingcom::Client;
///
/// # async fn example() -> encodingcom::Result<()> {
/// let client = Client::new("12345", "abcdef")?;
///
/// let queue = client.media_list().await?;
/// println!("{} media in the queue", queue.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    base_url: String,
    identity: Identity,
    http: reqwest::Client,
}

impl Client {
    /// Create a new client with the given credentials and default settings.
    pub fn new(user_id: impl Into<String>, user_key: impl Into<String>) -> Result<Self> {
        ClientBuilder::new().user_id(user_id).user_key(user_key).build()
    }

    /// Create a client from `ENCODING_USER_ID` / `ENCODING_USER_KEY`.
    pub fn from_env() -> Result<Self> {
        ClientBuilder::new().build()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Media info for one or more media ids.
    ///
    /// `extended` is only sent when requested; otherwise the service default applies.
    pub async fn get_media_info<I, S>(&self, media_ids: I, extended: bool) -> Result<Reply>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut query = Query::new().media_ids(media_ids);
        if extended {
            query = query.extended(true);
        }
        self.send(Action::GetMediaInfo, query).await
    }

    /// Status of one or more media. With more than one id the extended form is requested.
    pub async fn get_status<I, S>(&self, media_ids: I) -> Result<Reply>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.send(Action::GetStatus, Query::new().media_ids(media_ids))
            .await
    }

    /// Status of a single media as a typed [`StatusReport`].
    pub async fn status(&self, media_id: &str) -> Result<StatusReport> {
        let reply = self.get_status([media_id]).await?;
        StatusReport::from_response(reply.http_status, reply.response)
    }

    pub async fn get_media_list(&self) -> Result<Reply> {
        self.send(Action::GetMediaList, Query::new()).await
    }

    /// The media queue, oldest first.
    pub async fn media_list(&self) -> Result<MediaList> {
        let reply = self.get_media_list().await?;
        Ok(MediaList::from_response(&reply.response))
    }

    /// Most recently added media. Fails with [`EncodingError::EmptyQueue`] if there is none.
    pub async fn latest_media(&self) -> Result<Media> {
        self.media_list()
            .await?
            .media
            .pop()
            .ok_or(EncodingError::EmptyQueue)
    }

    /// Oldest media still in the queue.
    pub async fn oldest_media(&self) -> Result<Media> {
        self.media_list()
            .await?
            .media
            .into_iter()
            .next()
            .ok_or(EncodingError::EmptyQueue)
    }

    /// Add new media to the queue. Needs `source` and `format`.
    pub async fn add_media(&self, query: Query) -> Result<Reply> {
        self.send(Action::AddMedia, query).await
    }

    /// Add media without processing it; follow up with [`process_media`](Self::process_media).
    pub async fn add_media_benchmark(&self, query: Query) -> Result<Reply> {
        self.send(Action::AddMediaBenchmark, query).await
    }

    /// Start encoding media added through AddMediaBenchmark. Needs `mediaid` and `format`.
    pub async fn process_media(&self, query: Query) -> Result<Reply> {
        self.send(Action::ProcessMedia, query).await
    }

    /// Replace all formats of an existing media. Tasks in progress are stopped.
    pub async fn update_media(&self, query: Query) -> Result<Reply> {
        self.send(Action::UpdateMedia, query).await
    }

    /// Cancel media along with all of its tasks.
    pub async fn cancel_media<I, S>(&self, media_ids: I) -> Result<Reply>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.send(Action::CancelMedia, Query::new().media_ids(media_ids))
            .await
    }

    /// Send any action.
    ///
    /// The request is rejected before it leaves the process if `query` lacks
    /// a field the action requires. The body is a form with a single `json`
    /// field holding the query envelope.
    pub async fn send(&self, action: Action, query: Query) -> Result<Reply> {
        let envelope = query.into_envelope(action, &self.identity)?;

        debug!(action = action.name(), url = %self.base_url, "sending request");

        let response = self
            .http
            .post(&self.base_url)
            .form(&[("json", envelope.to_string())])
            .send()
            .await
            .map_err(EncodingError::Http)?;

        let http_status = response.status().as_u16();
        let text = response.text().await.map_err(EncodingError::Http)?;

        let raw = match VendorReply::parse(&text)?.into_result() {
            Ok(raw) => raw,
            Err(err) => {
                warn!(action = action.name(), http_status, error = %err, "service rejected request");
                return Err(err);
            }
        };

        debug!(action = action.name(), http_status, "request succeeded");

        Ok(Reply {
            http_status,
            response: inner_response(&raw),
            raw,
        })
    }
}

#[async_trait]
impl StatusClient for Client {
    async fn get_status(&self, job_id: &str) -> Result<StatusReport> {
        self.status(job_id).await
    }
}
