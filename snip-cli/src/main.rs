mod cli;
mod commands;
mod error;
mod output;
mod relay;

use crate::{
    cli::{Args, Commands, OutputFormat},
    commands::CommandExecutor,
    error::Result,
    output::OutputManager,
    relay::RelayClient,
};
use clap::Parser;
#[cfg(feature = "colored-output")]
use colored::*;
use snippet_relay::RelayConfig;
use std::process;
use tracing::{Level, error};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let output_format = args.output;
    let result = run(args).await;

    if let Err(e) = result {
        match output_format {
            OutputFormat::Json => {
                let error_json = serde_json::json!({
                    "status": "error",
                    "message": e.to_string(),
                });
                println!("{error_json}");
            }
            _ => {
                error!("Application error: {}", e);
                #[cfg(feature = "colored-output")]
                {
                    eprintln!("{} {}", "Error:".red().bold(), e);
                }
                #[cfg(not(feature = "colored-output"))]
                {
                    eprintln!("Error: {}", e);
                }
            }
        }
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    init_logging(args.verbose, args.quiet);

    if let Commands::Completions { shell } = args.command {
        use clap::CommandFactory;
        use clap_complete::generate;

        let mut cmd = Args::command();
        let bin_name = cmd.get_name().to_string();
        generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
        return Ok(());
    }

    let config = RelayConfig::load(args.config.as_deref())?;
    let relay_url = args
        .relay
        .unwrap_or_else(|| RelayClient::base_url_for(&config.bridge));
    let relay = RelayClient::new(&relay_url)?;
    let output = OutputManager::new(!args.no_color);
    let executor = CommandExecutor::new(config, relay, output, args.output);

    match args.command {
        Commands::Capture { text } => executor.capture(text).await?,
        Commands::Captured => executor.captured().await?,
        Commands::Save { text, category } => executor.save(text, &category).await?,
        Commands::List { page, search } => executor.list(page, &search).await?,
        Commands::Show { id } => executor.show(id).await?,
        Commands::Copy { id } => executor.copy(id).await?,
        Commands::Configure {
            url,
            username,
            secret,
        } => executor.configure(&url, &username, &secret).await?,
        Commands::Config { show } => {
            if show {
                executor.show_config().await?;
            } else {
                println!("Use --show to display current configuration");
            }
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}

/// Logs go to stderr so stdout stays clean for piping.
fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::WARN.as_str()))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(verbose),
        )
        .init();
}
