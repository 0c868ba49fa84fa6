//! Meridian heartbeat agent.
//!
//! Runs alongside each simulated node and posts a heartbeat for its node id
//! on a fixed interval. Transport errors are logged and the loop carries
//! on; deciding node health is the scheduler's job, not this process's.

use clap::Parser;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(name = "meridian-agent")]
#[command(about = "Send heartbeats for a simulated cluster node")]
#[command(version)]
struct Cli {
    /// Node id to send heartbeats for
    node_id: String,

    /// Base URL of the cluster manager API
    #[arg(long, default_value = "http://127.0.0.1:5000")]
    endpoint: String,

    /// Seconds between heartbeats
    #[arg(long, default_value_t = 3)]
    interval: u64,
}

fn heartbeat_url(endpoint: &str, node_id: &str) -> String {
    format!(
        "{}/nodes/{}/heartbeat",
        endpoint.trim_end_matches('/'),
        node_id
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

    let url = heartbeat_url(&cli.endpoint, &cli.node_id);
    info!(
        node_id = %cli.node_id,
        url = %url,
        interval_secs = cli.interval,
        "heartbeat agent starting"
    );

    let mut ticker = tokio::time::interval(Duration::from_secs(cli.interval));

    loop {
        ticker.tick().await;

        match client.post(&url).send().await {
            Ok(response) if response.status() == StatusCode::NO_CONTENT => {
                debug!(node_id = %cli.node_id, "heartbeat sent");
            }
            Ok(response) => {
                warn!(
                    node_id = %cli.node_id,
                    status = %response.status(),
                    "heartbeat rejected"
                );
            }
            Err(e) => {
                warn!(node_id = %cli.node_id, error = %e, "heartbeat failed");
            }
        }
    }
}
