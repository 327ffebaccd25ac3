//! Search Keyword Performance: attributes e-commerce revenue to the search
//! engine and keyword that brought each visitor to the site.
//!
//! Runs one invocation against a hit-level export stored in a bucket and
//! writes the aggregated table back to the same bucket.

mod handler;

use anyhow::{bail, Context};
use clap::Parser;
use handler::KeywordPerformanceJob;
use keyword_core::config::AppConfig;
use keyword_storage::{LocalObjectStore, ObjectLocation, TriggerEvent};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "keyword-performance")]
#[command(about = "Aggregate revenue by search engine and keyword from hit-level data")]
#[command(version)]
struct Cli {
    /// Object-created event notification (JSON) naming the input object
    #[arg(long, conflicts_with_all = ["bucket", "key"])]
    event: Option<PathBuf>,

    /// Bucket holding the input object
    #[arg(long, requires = "key")]
    bucket: Option<String>,

    /// URL-encoded key of the input object
    #[arg(long, requires = "bucket")]
    key: Option<String>,

    /// Directory holding one sub-directory per bucket (overrides config)
    #[arg(long, env = "KEYWORD_PERFORMANCE__STORAGE__ROOT_DIR")]
    root_dir: Option<String>,

    /// Date stamp of the result file, YYYY-MM-DD (defaults to today)
    #[arg(long)]
    date: Option<chrono::NaiveDate>,

    /// Human-readable logs instead of JSON
    #[arg(long, default_value_t = false)]
    plain_logs: bool,
}

fn init_tracing(plain: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "keyword_performance=info,keyword_analytics=info,keyword_storage=info".into()
    });
    if plain {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.plain_logs);

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });
    if let Some(root_dir) = cli.root_dir {
        config.storage.root_dir = root_dir;
    }

    info!(
        root_dir = %config.storage.root_dir,
        purchase_event_code = config.pipeline.purchase_event_code,
        malformed_products = ?config.pipeline.malformed_products,
        "Configuration loaded"
    );

    let location = match (cli.event, cli.bucket, cli.key) {
        (Some(path), _, _) => {
            let body = tokio::fs::read(&path)
                .await
                .with_context(|| format!("reading event file {}", path.display()))?;
            TriggerEvent::from_json(&body)?.location()?
        }
        (None, Some(bucket), Some(key)) => ObjectLocation::from_encoded(&bucket, &key)?,
        _ => bail!("either --event or --bucket with --key is required"),
    };

    let date = cli
        .date
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let store = Arc::new(LocalObjectStore::new(&config.storage.root_dir));
    let job = KeywordPerformanceJob::new(&config, store);
    let status = job.run(&location, date).await?;

    info!(status = status.code(), "Invocation finished");
    Ok(match status {
        handler::InvocationStatus::Success => ExitCode::SUCCESS,
        handler::InvocationStatus::Failure => ExitCode::FAILURE,
    })
}
