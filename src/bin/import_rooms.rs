use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use lonergarden::catalog::{import_room, validate_room};
use lonergarden::config;
use lonergarden::db::{self, NewRoom};

#[derive(Debug, Parser)]
#[command(author, version, about = "Import rooms from a YAML file into the catalog")]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// YAML list of rooms
    #[arg(long)]
    file: PathBuf,

    /// Validate the file without writing anything.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let content = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let rooms: Vec<NewRoom> = serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse {}", args.file.display()))?;

    // Reject the whole file before writing any row.
    for room in &rooms {
        validate_room(room)?;
    }
    if args.dry_run {
        println!("{} rooms valid", rooms.len());
        return Ok(());
    }

    let cfg = config::load(Some(&args.config))?;
    cfg.ensure_dirs()?;
    let pool = db::init_pool(&cfg.database_url()).await?;
    db::run_migrations(&pool).await?;

    let count = rooms.len();
    for room in rooms {
        let name = room.name.clone();
        let id = import_room(&pool, room)
            .await
            .with_context(|| format!("failed to import room {name}"))?;
        info!(id, %name, "room imported");
    }
    println!("imported {count} rooms ({} in catalog)", db::count_rooms(&pool).await?);
    Ok(())
}
