use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use snippet_relay::bridge::BridgeServer;
use snippet_relay::capture::CaptureHook;
use snippet_relay::config::RelayConfig;
use snippet_relay::coordinator::Coordinator;
use snippet_relay::credentials::{CredentialStore, needs_configuration};
use snippet_relay::logging;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use wp_snippets::SnippetClient;

/// Background relay for captured text.
#[derive(Debug, Parser)]
#[command(name = "snippet-relay", version, about)]
struct Args {
    /// Config file (defaults to <config_dir>/snippet-relay/config.toml)
    #[arg(short, long, env = "RELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Bridge bind address
    #[arg(long)]
    bind: Option<String>,

    /// Bridge port
    #[arg(short, long)]
    port: Option<u16>,

    /// Credentials file
    #[arg(long, env = "RELAY_CREDENTIALS")]
    credentials: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Treat each stdin line as a text selection
    #[arg(long)]
    capture_stdin: bool,
}

fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    let result = runtime.block_on(run(args));
    // A pending stdin read can never finish on its own.
    runtime.shutdown_timeout(Duration::from_secs(1));
    result
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = RelayConfig::load(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.bridge.bind_address = bind;
    }
    if let Some(port) = args.port {
        config.bridge.port = port;
    }
    if args.credentials.is_some() {
        config.credentials_path = args.credentials;
    }
    if args.verbose {
        config.log_filter = "snippet_relay=debug,wp_snippets=debug,tower_http=debug".to_string();
    }

    logging::init_logging(&config.log_filter, args.json_logs || config.json_logs)?;

    let store = Arc::new(config.credential_store()?);
    tracing::info!(path = %store.path().display(), "Using credentials file");
    if needs_configuration(store.as_ref()).await {
        tracing::warn!(
            "Extension settings are not configured yet; run `snip configure` to set the site URL, username and application password"
        );
    }

    let api = Arc::new(SnippetClient::new(config.client_config()));
    let store: Arc<dyn CredentialStore> = store;
    let (handle, coordinator_task) =
        Coordinator::spawn(store, api, config.coordinator_config());

    let capture_token = CancellationToken::new();
    if args.capture_stdin {
        let hook = CaptureHook::new(handle.clone());
        let token = capture_token.clone();
        tokio::spawn(async move {
            let stdin = BufReader::new(tokio::io::stdin());
            match hook.run(stdin, token).await {
                Ok(forwarded) => tracing::info!(forwarded, "Stdin capture stopped"),
                Err(e) => tracing::warn!(error = %e, "Stdin capture failed"),
            }
        });
    }

    let server = BridgeServer::new(config.bridge.clone(), handle.clone());
    let server_token = server.cancel_token();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
        }
        tracing::info!("Shutdown requested");
        server_token.cancel();
    });

    let served = server.run().await.context("Bridge server failed");

    capture_token.cancel();
    handle.cancel();
    coordinator_task.await.ok();

    tracing::info!("snippet-relay stopped");
    served
}
