//! Subcommands and their handlers.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use encodingcom::{
    poll_status_changes, poll_until_status, Client, EncodingError, JobStatus, PollOptions,
    StatusReport,
};

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Cancel a media job and all of its tasks
    Cancel {
        /// Media id; defaults to the latest media in the queue
        #[arg(long)]
        mediaid: Option<String>,
    },
    /// Print every status change of a media job until it ends
    Monitor {
        /// Media id; defaults to the latest media in the queue
        #[arg(long)]
        mediaid: Option<String>,

        /// Seconds between two status queries
        #[arg(long, default_value_t = 5.0)]
        interval: f64,
    },
    /// Wait until a media job reaches a status (or ends)
    Wait {
        /// Media id; defaults to the latest media in the queue
        #[arg(long)]
        mediaid: Option<String>,

        /// Status to wait for
        #[arg(long, default_value = "Finished")]
        status: String,

        /// Seconds between two status queries
        #[arg(long, default_value_t = 5.0)]
        interval: f64,
    },
    /// List the media queue
    Queue {
        /// Also query status and extended media info for every media
        #[arg(short, long)]
        verbose: bool,
    },
}

/// Route a command to its handler.
pub async fn handle_command(command: Commands, client: &Client) -> Result<()> {
    match command {
        Commands::Cancel { mediaid } => cancel(client, mediaid).await,
        Commands::Monitor { mediaid, interval } => monitor(client, mediaid, interval).await,
        Commands::Wait {
            mediaid,
            status,
            interval,
        } => wait(client, mediaid, &status, interval).await,
        Commands::Queue { verbose } => queue(client, verbose).await,
    }
}

/// Use the given media id, or fall back to the newest media in the queue.
async fn resolve_media_id(client: &Client, mediaid: Option<String>, purpose: &str) -> Result<String> {
    match mediaid.filter(|id| !id.trim().is_empty()) {
        Some(id) => Ok(id),
        None => {
            let latest = client
                .latest_media()
                .await
                .context("Failed to look up the latest media")?;
            println!(
                "{}",
                format!("Media id not specified, {purpose} the latest media in the queue: {}", latest.id)
                    .yellow()
            );
            Ok(latest.id)
        }
    }
}

fn interval_from_secs(secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs).with_context(|| format!("Invalid interval: {secs}"))
}

async fn cancel(client: &Client, mediaid: Option<String>) -> Result<()> {
    let media_id = resolve_media_id(client, mediaid, "cancelling").await?;

    let reply = client
        .cancel_media([media_id.as_str()])
        .await
        .with_context(|| format!("Failed to cancel media {media_id}"))?;

    println!("{} {}", "Cancelled media".green(), media_id.bold());
    print_json(&reply.response);
    Ok(())
}

async fn monitor(client: &Client, mediaid: Option<String>, interval: f64) -> Result<()> {
    let media_id = resolve_media_id(client, mediaid, "monitoring").await?;

    let opts = PollOptions::new()
        .interval(interval_from_secs(interval)?)
        .on_status(|id, _, report| {
            print_report(id, report);
            Ok(())
        });

    poll_status_changes(client, &media_id, &opts)
        .await
        .with_context(|| format!("Failed to monitor media {media_id}"))?;
    Ok(())
}

async fn wait(client: &Client, mediaid: Option<String>, status: &str, interval: f64) -> Result<()> {
    let media_id = resolve_media_id(client, mediaid, "waiting on").await?;

    let opts = PollOptions::new()
        .interval(interval_from_secs(interval)?)
        .target(status);

    let report = poll_until_status(client, &media_id, &opts)
        .await
        .with_context(|| format!("Failed to wait on media {media_id}"))?;

    print_report(&media_id, &report);
    Ok(())
}

async fn queue(client: &Client, verbose: bool) -> Result<()> {
    let reply = client
        .get_media_list()
        .await
        .context("Failed to fetch the media queue")?;

    if !verbose {
        print_json(&reply.response);
        return Ok(());
    }

    let list = encodingcom::MediaList::from_response(&reply.response);
    if list.is_empty() {
        println!("{}", "The media queue is empty.".yellow());
        return Ok(());
    }

    println!(
        "{}",
        format!("Verbose mode: status and media info for {} media", list.len()).bold()
    );

    for media in &list.media {
        println!();
        println!("{} Media {}", "▸".cyan(), media.id.bold());
        print_json(&media.raw);

        match describe_media(client, &media.id).await {
            Ok(()) => {}
            Err(EncodingError::Service { errors }) => {
                println!("{} {}", "Encoding.com error:".red(), errors.join("; "));
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to describe media {}", media.id)),
        }
    }

    Ok(())
}

async fn describe_media(client: &Client, media_id: &str) -> encodingcom::Result<()> {
    let status = client.get_status([media_id]).await?;
    println!("  {}", "Status:".dimmed());
    print_json(&status.response);

    let info = client.get_media_info([media_id], true).await?;
    println!("  {}", "Media info (extended):".dimmed());
    print_json(&info.response);
    Ok(())
}

fn print_report(media_id: &str, report: &StatusReport) {
    println!();
    println!("Media ID: {}", media_id.bold());
    println!(" ==== Status: {} ====", colorize_status(&report.status));
    print_json(&report.raw);
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(_) => println!("{value}"),
    }
}

fn colorize_status(status: &JobStatus) -> ColoredString {
    match status {
        JobStatus::Finished => status.as_str().green(),
        JobStatus::Error => status.as_str().red(),
        JobStatus::Stopped => status.as_str().yellow(),
        _ => status.as_str().cyan(),
    }
}
