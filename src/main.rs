use clap::Parser;
use lectern::cli::{Cli, Commands};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lectern=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Init { path, name }) => {
            lectern::cli::init::run(path, name).await?;
        }
        Some(Commands::Serve { host, port }) => {
            lectern::cli::serve::run(&cli.config, host, port).await?;
        }
        Some(Commands::Migrate { command }) => {
            lectern::cli::migrate::run(&cli.config, command).await?;
        }
        Some(Commands::User { command }) => {
            lectern::cli::user::run(&cli.config, command).await?;
        }
        Some(Commands::Stats { author }) => {
            lectern::cli::stats::run(&cli.config, author).await?;
        }
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
        }
    }

    Ok(())
}
