use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use page_ingest::config::Settings;
use page_ingest::fetch::HttpFetcher;
use page_ingest::store::SqliteStore;
use page_ingest::{schedule, server, Runner};

#[derive(Parser)]
#[command(name = "page_ingest", about = "Fetch a page and store its text with a placeholder embedding")]
struct Cli {
    /// Use a local SQLite file instead of the remote store
    #[arg(long, global = true, env = "INGEST_SQLITE_PATH")]
    sqlite: Option<PathBuf>,

    /// Target collection (default: documents)
    #[arg(long, global = true)]
    table: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the schema, then fetch, extract and store one page (default)
    Run {
        /// Page to fetch (default: INGEST_TARGET_URL or https://example.com)
        #[arg(long)]
        url: Option<String>,
    },
    /// Only check that the collection exists with the required columns
    Validate,
    /// Serve the run as an HTTP handler
    Serve {
        /// Address to bind (host:port)
        #[arg(long)]
        bind: Option<String>,
    },
    /// Print the cron manifest for the external scheduler
    Schedule,
    /// Create the collection in the local SQLite store
    Init,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let mut settings = Settings::load().context("Failed to load settings")?;
    if let Some(path) = cli.sqlite {
        settings.sqlite_path = Some(path);
    }
    if let Some(table) = cli.table {
        settings.table = table;
    }

    match cli.command.unwrap_or(Commands::Run { url: None }) {
        Commands::Run { url } => {
            if let Some(url) = url {
                settings.target_url = url;
            }
            let runner = build_runner(&settings)?;
            match runner.run().await {
                Ok(report) => {
                    let id = report
                        .stored
                        .and_then(|s| s.id)
                        .map(|id| format!(" as #{}", id))
                        .unwrap_or_default();
                    println!(
                        "Stored {} chars from {}{} in {:.1}s",
                        report.content_chars,
                        report.url,
                        id,
                        t0.elapsed().as_secs_f64()
                    );
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    eprintln!("Scraping failed: {}", e);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Commands::Validate => {
            let runner = build_runner(&settings)?;
            match runner.validate().await {
                Ok(check) => {
                    println!("Schema OK ({:?})", check);
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    eprintln!("{}", e);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| settings.bind.clone());
            server::serve(build_runner(&settings)?, &bind).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Schedule => {
            println!("{}", serde_json::to_string_pretty(&schedule::manifest())?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Init => {
            let path = settings
                .sqlite_path
                .as_deref()
                .context("init only applies to the SQLite store; pass --sqlite <path>")?;
            let store = SqliteStore::open(path)?;
            store.init_schema(&settings.table)?;
            println!("Created {} in {:?}", settings.table, path);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn build_runner(settings: &Settings) -> anyhow::Result<Runner> {
    let store = settings.open_store()?;
    let fetcher = Arc::new(HttpFetcher::new(settings.timeout())?);
    Ok(Runner::new(store, fetcher, settings.run_options()))
}
