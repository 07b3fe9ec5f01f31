mod config;
mod error;
mod model;
mod source;
mod sync;
mod target;
mod util;

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::SyncConfig;
use source::gitlab::GitLabSource;
use sync::mapper::StoreSchema;
use sync::{SyncOptions, SyncSummary};
use target::notion::NotionStore;
use util::retry::RetryPolicy;

/// Run finished but the store rejected some writes.
const EXIT_PARTIAL: u8 = 2;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run().await {
        Ok(summary) => report(&summary),
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<SyncSummary> {
    // Fail on missing credentials before touching the network.
    let config = config::load_config()?;

    let timeout = Duration::from_secs(config.timeout_secs);
    let retry = RetryPolicy::new(config.max_attempts, 500, 8_000);
    let gitlab = GitLabSource::new(&config.gitlab, timeout, retry.clone())
        .context("failed to build GitLab client")?;
    let notion = NotionStore::new(&config.notion, timeout, retry)
        .context("failed to build Notion client")?;

    sync::run(&gitlab, &notion, &options(&config)).await
}

fn options(config: &SyncConfig) -> SyncOptions {
    SyncOptions {
        page_size: config.page_size,
        group_size: config.group_size,
        sync_taxonomy: config.sync_taxonomy,
        schema: StoreSchema::default(),
    }
}

fn report(summary: &SyncSummary) -> ExitCode {
    println!(
        "Indexed {} records ({} skipped, {} duplicated issues)",
        summary.indexed, summary.skipped, summary.duplicates
    );
    println!("Fetched {} issues", summary.fetched);
    println!("Created {}, updated {}", summary.created, summary.updated);

    if summary.failures.is_empty() {
        println!("Notion database is synced with GitLab.");
        return ExitCode::SUCCESS;
    }

    let iids: Vec<String> = summary
        .failed_iids()
        .iter()
        .map(|iid| format!("#{iid}"))
        .collect();
    println!(
        "{} writes failed: {}",
        summary.failures.len(),
        iids.join(", ")
    );
    for failure in &summary.failures {
        println!("  #{}: {}", failure.iid, failure.error);
    }
    ExitCode::from(EXIT_PARTIAL)
}
