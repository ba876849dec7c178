use thiserror::Error;

/// All errors that can occur when talking to Encoding.com.
#[derive(Error, Debug)]
pub enum EncodingError {
    /// The reply embedded one or more application-level errors.
    ///
    /// Encoding.com answers most failed actions with HTTP 200, so this is
    /// raised from the body alone, whatever the transport status was.
    #[error("Encoding.com error response: {}", .errors.join("; "))]
    Service { errors: Vec<String> },

    /// A required parameter was missing or empty. Raised before any request is sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No user id or user key was configured.
    #[error("client identity is required: set user_id/user_key or ENCODING_USER_ID/ENCODING_USER_KEY")]
    InvalidIdentity,

    /// The media queue has no entries.
    #[error("the media queue is empty")]
    EmptyQueue,

    /// The reply was valid JSON but lacked a field this client depends on.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// The reply body was not JSON.
    #[error("could not decode response: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
        body: String,
    },

    /// A transport-level HTTP error from reqwest.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A polling callback asked to stop.
    #[error("polling aborted: {0}")]
    Aborted(String),
}

impl EncodingError {
    /// `true` for errors the service itself reported.
    pub fn is_service(&self) -> bool {
        matches!(self, EncodingError::Service { .. })
    }
}

/// A convenience alias for `Result<T, EncodingError>`.
pub type Result<T> = std::result::Result<T, EncodingError>;
