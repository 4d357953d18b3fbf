pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;

pub use api::{AbortHandle, ApiClient, StreamExecutor};
pub use auth::{Credentials, OAuth1Signer, Signer};
pub use config::{CliArgs, Config};
pub use error::{ErrorEntry, TweetlineError, TweetlineResult};
pub use metrics::Metrics;

use anyhow::{Context, Result};
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A single operation requested from the command line.
#[derive(Debug, Clone)]
pub enum Command {
    Get {
        url: String,
    },
    Post {
        url: String,
    },
    Stream {
        url: String,
        /// Abort after this many lines
        max_lines: Option<usize>,
    },
    Upload {
        url: String,
        file: PathBuf,
        boundary: Option<String>,
    },
}

/// Random boundary used when none is given for an upload.
pub fn generate_boundary() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(24)
        .map(char::from)
        .collect();
    format!("tweetline-{}", suffix)
}

pub async fn run(config: Config, credentials: Credentials, command: Command) -> Result<()> {
    tracing::info!(operation = "startup", message = "tweetline starting");
    tracing::debug!(config = ?config, credentials = ?credentials, "Configuration loaded");

    let client = ApiClient::new(&config).context("Failed to create API client")?;

    let result = execute(&client, &credentials, command).await;

    // Log final metrics whether or not the command succeeded
    client.metrics().log_full_summary();

    result
}

/// Run a single command on an existing client.
pub async fn execute(
    client: &ApiClient,
    credentials: &Credentials,
    command: Command,
) -> Result<()> {
    match command {
        Command::Get { url } => {
            let text = client
                .execute_get(&url, credentials)
                .await
                .with_context(|| format!("GET {} failed", url))?;
            println!("{}", text);
        }
        Command::Post { url } => {
            let text = client
                .execute_post(&url, credentials)
                .await
                .with_context(|| format!("POST {} failed", url))?;
            println!("{}", text);
        }
        Command::Stream { url, max_lines } => {
            run_stream(client, &url, credentials, max_lines).await?;
        }
        Command::Upload {
            url,
            file,
            boundary,
        } => {
            let media = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let boundary = boundary.unwrap_or_else(generate_boundary);
            let media_id = client
                .execute_post_multipart(&url, credentials, &boundary, &media)
                .await
                .with_context(|| format!("Upload of {} failed", file.display()))?;
            println!("{}", media_id);
        }
    }

    Ok(())
}

async fn run_stream(
    client: &ApiClient,
    url: &str,
    credentials: &Credentials,
    max_lines: Option<usize>,
) -> Result<()> {
    let executor = client.stream_executor();
    let handle = executor.abort_handle();
    let delivered = AtomicUsize::new(0);

    let on_line = |line: &str| {
        println!("{}", line);
        let count = delivered.fetch_add(1, Ordering::Relaxed) + 1;
        if max_lines.is_some_and(|max| count >= max) {
            handle.abort();
        }
    };

    tokio::select! {
        result = executor.execute_get_stream(url, credentials, on_line) => {
            result.with_context(|| format!("Stream {} failed", url))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!(
                lines = delivered.load(Ordering::Relaxed),
                "Interrupted, closing stream"
            );
            executor.abort();
        }
    }

    Ok(())
}
