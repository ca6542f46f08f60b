mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use dlqr_config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        cli::Commands::Preview {
            sample,
            rules,
            scope,
            key,
            diff,
            json,
        } => {
            let args = commands::preview::PreviewArgs {
                sample,
                rules,
                scope,
                key,
                diff,
                json,
            };
            commands::preview::handle(args, cli.db, &config).await
        }
        cli::Commands::Rules(rules_cmd) => {
            let store = commands::open_store(cli.db, &config).await?;
            commands::rules::handle(rules_cmd, &store, &config).await
        }
        cli::Commands::Validate { expression, sample } => {
            commands::validate::handle(expression, sample, &config).await
        }
        cli::Commands::Sample {
            topic,
            partition,
            offset,
            dir,
        } => commands::sample::handle(topic, partition, offset, dir, &config).await,
        cli::Commands::Completions { shell } => commands::completions::handle(shell),
    }
}
