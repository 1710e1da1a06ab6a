use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::io::AsyncReadExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

use parley_client::config::ClientConfig;
use parley_client::gateway::dispatcher::GatewayDispatcher;

/// Replay a captured gateway session through the state cache.
///
/// Frames are newline-delimited JSON, one gateway frame per line, as
/// captured from a live connection.
#[derive(Parser)]
#[command(name = "parley-replay")]
struct Args {
    /// Path to the config file.
    #[arg(long, default_value = "parley.toml")]
    config: String,

    /// Frame capture to replay. Reads stdin when omitted.
    frames: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = ClientConfig::load(&args.config);
    info!(gateway = %config.gateway.url, "replaying captured session state");
    if config.gateway.token.is_empty() {
        info!("no gateway token configured; fine for replay, a live connection would not authenticate");
    }

    let input = match &args.frames {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read frame capture {}", path.display()))?,
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("failed to read frames from stdin")?;
            buf
        }
    };

    let mut dispatcher = GatewayDispatcher::new();
    let mut changes = dispatcher.subscribe();

    let mut frames = 0usize;
    for line in input.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        dispatcher.handle_frame(line);
        frames += 1;
    }

    let mut notifications = 0usize;
    while changes.try_recv().is_ok() {
        notifications += 1;
    }

    let cache = dispatcher.cache();
    info!(
        frames,
        notifications,
        guilds = cache.guilds().len(),
        dms = cache.dms().len(),
        users = cache.users().len(),
        current_user = cache
            .current_user()
            .map(|u| u.username.as_str())
            .unwrap_or("<none>"),
        "replay complete"
    );

    Ok(())
}
