//! # Encoding.com client for Rust
//!
//! Async client for the [Encoding.com](https://www.encoding.com) transcoding
//! API. Add media, inspect the queue, cancel jobs, and follow a job's status
//! until it finishes.
//!
//! Encoding.com reports most failures inside an HTTP 200 reply. Every call
//! decodes the body and turns embedded errors into
//! [`EncodingError::Service`], so a successful `Result` means the action
//! succeeded.
//!
//! ## Quick start
//!
//! ```no_run
//! use encodingcom::{poll_status_changes, Client, PollOptions};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> encodingcom::Result<()> {
//!     let client = Client::new("12345", "abcdef")?;
//!
//!     let latest = client.latest_media().await?;
//!     let opts = PollOptions::new()
//!         .interval(Duration::from_secs(10))
//!         .on_status(|id, status, _| {
//!             println!("{id}: {status}");
//!             Ok(())
//!         });
//!
//!     let done = poll_status_changes(&client, &latest.id, &opts).await?;
//!     println!("ended as {}", done.status);
//!     Ok(())
//! }
//! ```
//!
//! ## Adding media
//!
//! ```no_run
//! use encodingcom::{Client, Format, Query};
//!
//! # async fn example(client: &Client) -> encodingcom::Result<()> {
//! let reply = client
//!     .add_media(
//!         Query::new()
//!             .source("https://example.com/input.mov")
//!             .format(Format::new("mp4").video_codec("libx264"))
//!             .format(Format::thumbnail("s3://bucket/thumb.jpg").time("5%")),
//!     )
//!     .await?;
//! println!("media id {}", encodingcom::response::media_id(&reply.raw));
//! # Ok(())
//! # }
//! ```

mod client;
mod errors;
mod format;
mod models;
mod poller;
mod request;
pub mod response;

pub use client::{Client, ClientBuilder, Reply};
pub use errors::{EncodingError, Result};
pub use format::Format;
pub use models::{JobStatus, Media, MediaList, StatusReport};
pub use poller::{poll_status_changes, poll_until_status, PollOptions, StatusCallback, StatusClient};
pub use request::{Action, Field, Query};
