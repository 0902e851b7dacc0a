mod config;

use clap::{Parser, Subcommand, ValueEnum};
use config::Config;
use phish_api::HttpApiClient;
use phish_classifier::PhishingDetector;
use phish_dataset::DatasetStore;
use phish_update::manager::UpdateManager;
use std::process::ExitCode;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
enum CliError {
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("api client error: {0}")]
    Api(#[from] phish_api::ApiError),
}

#[derive(Parser)]
#[command(name = "phish-detect", version, about = "Client-side phishing URL classifier")]
struct Args {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Copy, Clone, ValueEnum)]
enum DatasetKind {
    HashPrefixes,
    FilterSet,
}

#[derive(Subcommand)]
enum Command {
    /// Classify a single URL against the current dataset, falling back
    /// to a k-anonymous remote lookup on a local prefix hit.
    Classify {
        url: String,
    },
    /// Force an out-of-band refresh of one dataset stream.
    Update {
        #[arg(long, value_enum)]
        dataset: DatasetKind,
    },
    /// Print the current per-stream revisions and store location.
    Status,
    /// Verify the embedded baseline's integrity and exit.
    VerifyBaseline,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Ok(path) = std::env::var("PHISH_DOTENV_PATH") {
        let _ = dotenvy::from_path(path);
    } else {
        let _ = dotenvy::dotenv();
    }

    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), CliError> {
    let config = Config::from_env()?;

    match args.cmd {
        Command::Classify { url } => {
            let detector = build_detector(&config)?;
            detector.load_data_async().await;
            let malicious = detector.is_malicious(&url).await;
            println!("{}", if malicious { "malicious" } else { "safe" });
        }
        Command::Update { dataset } => {
            let store = Arc::new(DatasetStore::new(&config.store_dir));
            store.load();
            let api = build_api_client(&config)?;
            let manager = UpdateManager::new(api, store.clone());
            match dataset {
                DatasetKind::HashPrefixes => manager.update_hash_prefixes().await,
                DatasetKind::FilterSet => manager.update_filter_set().await,
            }
            println!(
                "filterSetRevision={} hashPrefixRevision={}",
                store.filter_set_revision(),
                store.hash_prefix_revision()
            );
        }
        Command::Status => {
            let store = Arc::new(DatasetStore::new(&config.store_dir));
            store.load();
            let snapshot = store.snapshot();
            println!("store: {}", config.store_dir.display());
            println!("filterSetRevision: {}", store.filter_set_revision());
            println!("hashPrefixRevision: {}", store.hash_prefix_revision());
            println!("filters: {}", snapshot.filter_set.len());
            println!("hashPrefixes: {}", snapshot.hash_prefixes.len());
        }
        Command::VerifyBaseline => {
            phish_dataset::embedded::verify();
            println!("embedded baseline ok (revision {})", phish_dataset::EMBEDDED_REVISION);
        }
    }

    Ok(())
}

fn build_api_client(config: &Config) -> Result<Arc<dyn phish_api::DatasetApi>, CliError> {
    Ok(Arc::new(HttpApiClient::new(config.base_url.clone(), config.request_timeout)?))
}

fn build_detector(config: &Config) -> Result<PhishingDetector, CliError> {
    let store = Arc::new(DatasetStore::new(&config.store_dir));
    let api = build_api_client(config)?;
    Ok(PhishingDetector::with_default_telemetry(api, store))
}
