pub mod config;
pub mod data;
pub mod derive;
pub mod health;
pub mod html;
pub mod metric_set;
pub mod normalize;
pub mod processing;
pub mod render;
pub mod server;
pub mod sources;
pub mod summary;
pub mod types;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve metrics, the summary document and the health check over HTTP
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Scrape every source once and print the metrics
    Scrape {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Run the health checks once; exits non-zero when unhealthy
    Check {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
}

fn load(config: &Path) -> Result<(config::AppConfig, data::MetadataTable)> {
    let app_config = config::AppConfig::load_from_file(config)?;
    let metadata = data::MetadataTable::load(&app_config.metadata.files)?;
    info!("Metadata table holds {} locations", metadata.len());
    Ok((app_config, metadata))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Serve { config } => {
            info!("Serving with config: {:?}", config);
            let (app_config, metadata) = load(config)?;
            server::start_server(app_config, metadata).await?;
        }
        Commands::Scrape { config } => {
            let (app_config, metadata) = load(config)?;
            let state = server::AppState::new(&app_config, metadata)?;

            print!("{}", server::render_all(&state).await);
        }
        Commands::Check { config } => {
            let (app_config, metadata) = load(config)?;
            let state = server::AppState::new(&app_config, metadata)?;

            let issues = processing::check_all(&state.sources, &state.client, &state.metadata).await;
            for issue in &issues {
                println!("{}", issue);
            }
            if !issues.is_empty() {
                bail!("{} health issues", issues.len());
            }
            println!("healthy");
        }
    }

    Ok(())
}
