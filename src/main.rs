mod cli;
mod diagram;
mod error;
mod kubernetes;
mod pipeline;
mod resolver;
mod types;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use cli::{Cli, DiagramConfig};
use kubernetes::ClusterClient;
use pipeline::Outcome;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli).await {
        error!("{:#}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config: DiagramConfig = cli.into_config()?;

    let client = ClusterClient::connect(&config.cluster)
        .await
        .context("Failed to initialize Kubernetes client")?;
    info!("Inspecting namespace: {}", config.namespace);

    match pipeline::run(&client, &config)
        .await
        .with_context(|| format!("Failed to diagram namespace '{}'", config.namespace))?
    {
        Outcome::Printed(yaml) => print!("{}", yaml),
        Outcome::Rendered(path) => info!("Done: {}", path.display()),
    }
    Ok(())
}
