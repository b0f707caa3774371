use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod clients;
mod core;
mod engine;
mod output;
mod parsing;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on the quiet flag
    let filter = if cli.quiet {
        EnvFilter::new("spps_id=error")
    } else {
        EnvFilter::new("spps_id=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        cli::Commands::Identify(args) => {
            cli::identify::run(args, cli.quiet)?;
        }
        cli::Commands::Taxon(args) => {
            cli::taxon::run(args, cli.quiet)?;
        }
    }

    Ok(())
}
