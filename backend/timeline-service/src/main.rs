use anyhow::{bail, Context, Result};
use std::path::Path;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use timeline_service::config::Config;
use timeline_service::services::{self, RelationalTimeline, Strategy};
use timeline_service::{jobs, loader};

const USAGE: &str = "usage: timeline-service <command>\n\
    \n\
    commands:\n\
    \x20 setup <follows.csv>    clear the store and load the follow graph\n\
    \x20 post <posts.csv>       insert posts through the configured strategy\n\
    \x20 retrieve <iterations>  retrieve that many random home timelines\n\
    \n\
    the strategy is selected with TIMELINE_STRATEGY (push|pull|relational)";

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let config = Config::from_env().context("failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.app.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        strategy = %config.strategy,
        version = env!("CARGO_PKG_VERSION"),
        "starting timeline-service"
    );

    let mut args = std::env::args().skip(1);
    let command = match args.next() {
        Some(command) => command,
        None => bail!("{}", USAGE),
    };

    match command.as_str() {
        "setup" => {
            let path = args.next().with_context(|| USAGE.to_string())?;
            run_setup(&config, Path::new(&path)).await
        }
        "post" => {
            let path = args.next().with_context(|| USAGE.to_string())?;
            run_post(&config, Path::new(&path)).await
        }
        "retrieve" => {
            let raw = args.next().with_context(|| USAGE.to_string())?;
            let iterations = raw
                .parse::<usize>()
                .with_context(|| format!("invalid iteration count: {}", raw))?;
            run_retrieve(&config, iterations).await
        }
        other => bail!("unknown command: {}\n{}", other, USAGE),
    }
}

async fn run_setup(config: &Config, path: &Path) -> Result<()> {
    let edges = loader::read_edge_file(path)?;

    match config.strategy {
        Strategy::Push | Strategy::Pull => {
            let store = services::connect_store(config)
                .await
                .context("failed to connect to the key-value store")?;
            loader::reset(&store).await?;
            loader::load_follows(&store, edges).await?;
        }
        Strategy::Relational => {
            let pool = services::connect_relational(config)
                .await
                .context("failed to connect to the relational store")?;
            let backend = RelationalTimeline::new(pool);
            backend.ensure_schema().await?;
            backend.clear().await?;
            backend.load_follows(&edges).await?;
        }
    }

    info!("setup complete");
    Ok(())
}

async fn run_post(config: &Config, path: &Path) -> Result<()> {
    let posts = loader::read_post_file(path)?;
    let backend = services::build_backend(config)
        .await
        .context("failed to construct the timeline backend")?;
    jobs::ingest::run(backend.as_ref(), &posts).await?;
    Ok(())
}

async fn run_retrieve(config: &Config, iterations: usize) -> Result<()> {
    let backend = services::build_backend(config)
        .await
        .context("failed to construct the timeline backend")?;
    jobs::retrieval::run(backend.as_ref(), iterations).await?;
    Ok(())
}
