use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use opphub_import::config;
use opphub_import::model::EntityKind;
use opphub_import::pipeline;
use opphub_import::store::sqlite::{init_pool, run_migrations};
use opphub_import::store::SqliteStore;
use opphub_import::template;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the CSV template for an entity kind.
    Template { entity: EntityKind },
    /// Validate a CSV file and report per-row results without persisting.
    Preview { entity: EntityKind, file: PathBuf },
    /// Validate and persist a CSV file row by row.
    Import { entity: EntityKind, file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;
    cfg.ensure_dirs()?;

    match args.command {
        Command::Template { entity } => {
            print!("{}", template::create_template_csv(entity));
        }
        Command::Preview { entity, file } => {
            let store = open_store(&cfg).await?;
            let text = tokio::fs::read_to_string(&file).await?;
            let report = pipeline::preview(entity, &text, &store, &cfg.import).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Import { entity, file } => {
            let store = open_store(&cfg).await?;
            let text = tokio::fs::read_to_string(&file).await?;
            let summary = pipeline::import(entity, &text, &store, &cfg.import).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}

async fn open_store(cfg: &config::Config) -> Result<SqliteStore> {
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| format!("sqlite://{}/opphub.db", cfg.app.data_dir));
    let pool = init_pool(&database_url).await?;
    run_migrations(&pool).await?;
    info!(%database_url, "document store ready");
    Ok(SqliteStore::new(pool))
}
