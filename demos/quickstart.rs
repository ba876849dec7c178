//! Quick-start examples for the Encoding.com Rust client.
//!
//! Run with:
//!   ENCODING_USER_ID=... ENCODING_USER_KEY=... ENCODING_TEST_SOURCE=https://... \
//!     cargo run --example quickstart
//!
//! The source must be a URL; local paths are not accepted by the service.

use encodingcom::{
    poll_status_changes, poll_until_status, Client, EncodingError, Format, PollOptions, Query,
};
use std::time::Duration;

#[tokio::main]
async fn main() -> encodingcom::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Create a client (reads ENCODING_USER_ID / ENCODING_USER_KEY)
    // -----------------------------------------------------------------------
    let client = Client::from_env()?;

    // -----------------------------------------------------------------------
    // 2. Inspect the queue
    // -----------------------------------------------------------------------
    let queue = client.media_list().await?;
    println!("{} media in the queue", queue.len());
    for media in &queue.media {
        println!("  {} | {} | {}", media.id, media.status, media.file);
    }
    println!();

    // -----------------------------------------------------------------------
    // 3. Add media with an mp4 output and a thumbnail
    // -----------------------------------------------------------------------
    let source = std::env::var("ENCODING_TEST_SOURCE")
        .map_err(|_| EncodingError::InvalidArgument("set ENCODING_TEST_SOURCE".into()))?;

    let reply = client
        .add_media(
            Query::new()
                .source(source)
                .format(Format::new("mp4").video_codec("libx264"))
                .format(Format::thumbnail("https://example.com/thumbs/out.jpg").time("5%")),
        )
        .await?;
    let media_id = encodingcom::response::media_id(&reply.raw);
    println!("Added media {media_id}");

    // -----------------------------------------------------------------------
    // 4. Follow every status change until the job ends
    // -----------------------------------------------------------------------
    let opts = PollOptions::new()
        .interval(Duration::from_secs(3))
        .on_status(|id, status, report| {
            print!("  {id}: {status}");
            if let Some(progress) = report.progress() {
                print!(" ({progress:.0}%)");
            }
            println!();
            Ok(())
        });
    let done = poll_status_changes(&client, &media_id, &opts).await?;
    println!("Media {media_id} ended as {}", done.status);
    println!();

    // -----------------------------------------------------------------------
    // 5. Or just wait for one status
    // -----------------------------------------------------------------------
    let latest = client.latest_media().await?;
    let report = poll_until_status(&client, &latest.id, &PollOptions::new().target("Processing")).await?;
    println!("Media {} reached {}", latest.id, report.status);

    // Service errors come back typed.
    match client.get_status(["0"]).await {
        Err(EncodingError::Service { errors }) => println!("Expected error: {}", errors.join("; ")),
        other => println!("Unexpected: {other:?}"),
    }

    Ok(())
}
