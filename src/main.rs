use anyhow::Result;
use clap::Parser;
use lonergarden::gateway::SnapClient;
use lonergarden::mailer::LogMailer;
use lonergarden::server::{self, AppState};
use lonergarden::{config, db};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
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

    let pool = db::init_pool(&cfg.database_url()).await?;
    db::run_migrations(&pool).await?;
    info!(rooms = db::count_rooms(&pool).await?, "catalog loaded");

    let gateway = Arc::new(SnapClient::from_config(&cfg)?);
    let state = Arc::new(AppState::new(&cfg, pool, gateway, Arc::new(LogMailer)));

    info!(production = cfg.gateway.is_production, "starting hotel site");
    server::serve(&cfg, state).await
}
