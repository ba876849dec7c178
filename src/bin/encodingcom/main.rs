//! encodingcom CLI
//!
//! Small operator tools on top of the client library: cancel a job, follow
//! its status, wait for a status, and list the queue.

mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use encodingcom::{Client, ClientBuilder};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use commands::{handle_command, Commands};

#[derive(Parser)]
#[command(name = "encodingcom")]
#[command(about = "Encoding.com job tools", long_about = None)]
struct Cli {
    /// Encoding.com user id
    #[arg(long, env = "ENCODING_USER_ID")]
    user: String,

    /// Encoding.com user key
    #[arg(long, env = "ENCODING_USER_KEY", hide_env_values = true)]
    key: String,

    /// API endpoint override
    #[arg(long, env = "ENCODING_BASE_URL")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn client(&self) -> Result<Client> {
        let mut builder = ClientBuilder::new().user_id(&self.user).user_key(&self.key);
        if let Some(url) = &self.base_url {
            builder = builder.base_url(url);
        }
        builder.build().context("Failed to build Encoding.com client")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "encodingcom=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let client = cli.client()?;

    handle_command(cli.command, &client).await
}
