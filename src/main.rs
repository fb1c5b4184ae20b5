//! camwall - live camera wall: refresh the catalogue, serve the viewer, probe streams

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use camwall::catalog::CatalogManager;
use camwall::config::{Config, ConfigOptions};
use camwall::probe::{run_probe, HttpManifestEngine};
use camwall::viewer::{open_browser, ViewerServer};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Subcommand, Debug)]
enum Command {
    /// Download the device list if missing and resolve every stream URL
    Update,
    /// Serve the camera wall and open it in the browser
    Serve {
        /// Do not open the browser
        #[arg(long)]
        no_browser: bool,
    },
    /// Load every stream of one grid page headlessly and print its status
    Probe {
        /// Page to probe (1-based)
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Cameras per page
        #[arg(long)]
        page_size: Option<usize>,
    },
}

#[derive(Parser, Debug)]
#[command(name = "camwall")]
#[command(about = "Live IP camera wall with retrying HLS playback")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Camera catalogue JSON file
    #[arg(long, global = true)]
    data_file: Option<PathBuf>,

    /// Directory served by the viewer
    #[arg(long, global = true)]
    static_dir: Option<PathBuf>,

    /// Viewer server port
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Concurrent stream URL lookups during update
    #[arg(long, global = true)]
    workers: Option<usize>,

    /// Attempts per device lookup
    #[arg(long, global = true)]
    retries: Option<u32>,

    /// HTTP request timeout in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config = Config::new(ConfigOptions {
        data_file: args.data_file,
        static_dir: args.static_dir,
        port: args.port,
        workers: args.workers,
        retries: args.retries,
        request_timeout_secs: args.timeout_secs,
        ..ConfigOptions::default()
    })?;

    let result = match args.command {
        Command::Update => update(&config).await,
        Command::Serve { no_browser } => serve(&config, no_browser).await,
        Command::Probe { page, page_size } => probe(&config, page, page_size).await,
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

async fn update(config: &Arc<Config>) -> Result<()> {
    let manager = CatalogManager::new(config.clone())?;
    let stats = manager.update().await?;
    println!(
        "Cameras updated: {} total, {} resolved, {} failed",
        stats.total, stats.resolved, stats.failed
    );
    Ok(())
}

async fn serve(config: &Config, no_browser: bool) -> Result<()> {
    let server = ViewerServer::new(config);
    server.start().await?;
    let url = server.url().await;
    println!("Camera wall running at {}", url);

    if !no_browser {
        open_browser(&url);
    }

    println!("Press Ctrl+C to stop");
    tokio::signal::ctrl_c().await?;
    info!("Shutting down viewer");
    server.stop().await;
    Ok(())
}

async fn probe(config: &Arc<Config>, page: usize, page_size: Option<usize>) -> Result<()> {
    let manager = CatalogManager::new(config.clone())?;
    let records = manager.devices()?;
    let engine = HttpManifestEngine::new(config)?;
    let per_page = page_size.unwrap_or(config.page_size);

    let summary = run_probe(config, &engine, records, page, per_page).await?;

    println!("Page {}/{}", summary.page, summary.total_pages);
    for result in &summary.results {
        println!(
            "[{}] {} ({}): {}",
            if result.status.is_error { "FAIL" } else { " OK " },
            result.name,
            result.id_user,
            result.status.message
        );
    }
    println!(
        "{} of {} live, {} invalid records",
        summary.live_count(),
        summary.results.len(),
        summary.rejected
    );
    Ok(())
}
