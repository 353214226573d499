//! keygate CLI entrypoint.

use clap::Parser;
use console::style;
use keygate_core::Error;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod handlers;

use commands::Commands;

#[derive(Parser)]
#[command(name = "keygate")]
#[command(author, version, about = "Keygen license verification and validation", long_about = None)]
struct Cli {
    /// Print errors as JSON envelopes
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli.command).await {
        report(&err, cli.json);
        std::process::exit(1);
    }
}

async fn run(command: Commands) -> anyhow::Result<()> {
    let config = config::load()?;

    match command {
        Commands::Verify { signed_key, scheme } => handlers::verify(&config, &scheme, &signed_key)?,
        Commands::Validate {
            fingerprints,
            entitlements,
            machine,
        } => handlers::validate(config, fingerprints, entitlements, machine).await?,
        Commands::Machines => handlers::machines(config).await?,
    }

    Ok(())
}

fn report(err: &anyhow::Error, json: bool) {
    match err.downcast_ref::<Error>() {
        Some(err) if json => eprintln!("{}", err.to_envelope_string()),
        Some(err) => eprintln!("{} {}: {}", style("✗").red(), err.tag(), err),
        None if json => eprintln!(
            "{}",
            Error::UnexpectedError(format!("{:#}", err)).to_envelope_string()
        ),
        None => eprintln!("{} {:#}", style("✗").red(), err),
    }
}
