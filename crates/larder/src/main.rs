use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use larder::config::Config;
use larder::events::{default_dispatcher, ChangeRecord};
use larder::storage::DynamoStore;

/// Larder stream worker - applies derived side effects for one delivered
/// batch of change records
#[derive(Parser, Debug)]
#[command(name = "larder")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a JSON batch of change records, or "-" for stdin
    #[arg(long, short, default_value = "-")]
    batch: PathBuf,

    /// Shared table name
    #[arg(long, short, env = "TABLE_NAME")]
    table: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "larder=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::from_env();
    if let Some(table) = cli.table {
        config.table_name = table;
    }

    let records = read_batch(&cli.batch)?;
    tracing::info!(
        records = records.len(),
        table = %config.table_name,
        "dispatching change batch"
    );

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let client = aws_sdk_dynamodb::Client::new(&aws_config);
    let store = Arc::new(DynamoStore::new(client, config.table_name.clone()));

    let dispatcher = default_dispatcher(store, &config);
    let failures = dispatcher.dispatch_batch(&records).await;
    if failures > 0 {
        // A non-zero exit lets the delivery mechanism redeliver the batch;
        // every handler tolerates the replay.
        bail!("{failures} change handler application(s) failed");
    }

    tracing::info!("batch complete");
    Ok(())
}

/// Read one delivered batch from a file, or stdin when the path is "-".
fn read_batch(path: &PathBuf) -> Result<Vec<ChangeRecord>> {
    let raw = if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read batch from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read batch from {}", path.display()))?
    };
    serde_json::from_str(&raw).context("batch is not a JSON array of change records")
}
