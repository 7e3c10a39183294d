use std::io::Read;

use snippet_relay::RelayConfig;
use snippet_relay::credentials::CredentialStore;
use tracing::{debug, info};
use wp_snippets::{Credentials, SaveStatus, SnippetApi, SnippetClient};

use crate::cli::OutputFormat;
use crate::error::{CliError, Result};
use crate::output::{OutputManager, write_output};
use crate::relay::RelayClient;

/// Message shown after `configure` stores the settings.
pub const SETTINGS_SAVED_MESSAGE: &str = "Settings saved successfully!";

pub struct CommandExecutor {
    config: RelayConfig,
    relay: RelayClient,
    output: OutputManager,
    format: OutputFormat,
}

impl CommandExecutor {
    pub fn new(
        config: RelayConfig,
        relay: RelayClient,
        output: OutputManager,
        format: OutputFormat,
    ) -> Self {
        Self {
            config,
            relay,
            output,
            format,
        }
    }

    /// Same semantics as a page selection: trimmed, empty ignored.
    pub async fn capture(&self, text: Option<String>) -> Result<()> {
        let text = match text {
            Some(text) => text,
            None => read_stdin()?,
        };
        let text = text.trim();
        if text.is_empty() {
            debug!("Empty selection, nothing to capture");
            return Ok(());
        }

        let ack = self.relay.capture(text).await?;
        write_output(&self.output.format_status(ack.status, &ack.message, None, &self.format)?)
    }

    pub async fn captured(&self) -> Result<()> {
        let text = self.relay.captured_text().await?;
        write_output(&self.output.format_captured(&text, &self.format)?)
    }

    /// Save `text`, or the currently captured text when absent.
    ///
    /// A failed save is reported as an error so the exit status reflects it.
    pub async fn save(&self, text: Option<String>, category: &str) -> Result<()> {
        let text = match text {
            Some(text) => text,
            None => self.relay.captured_text().await?,
        };
        let text = text.trim();
        if text.is_empty() {
            return Err(CliError::EmptyText);
        }

        let result = self.relay.save(text, category).await?;
        if !result.is_success() {
            return Err(CliError::Relay(result.message));
        }

        info!(post_id = ?result.post_id, "Snippet saved");
        write_output(&self.output.format_status(
            result.status,
            &result.message,
            result.post_id,
            &self.format,
        )?)
    }

    pub async fn list(&self, page: u64, search: &str) -> Result<()> {
        let credentials = self.credentials().await?;
        let list = self.client().list(page, search, &credentials).await?;
        write_output(&self.output.format_list(&list, &self.format)?)
    }

    pub async fn show(&self, id: i64) -> Result<()> {
        let credentials = self.credentials().await?;
        let snippet = self.client().get_one(id, &credentials).await?;
        write_output(&self.output.format_snippet(&snippet, &self.format)?)
    }

    /// Raw content only, so it can be piped into a clipboard tool.
    pub async fn copy(&self, id: i64) -> Result<()> {
        let credentials = self.credentials().await?;
        let snippet = self.client().get_one(id, &credentials).await?;
        write_output(&snippet.content)
    }

    pub async fn configure(&self, url: &str, username: &str, secret: &str) -> Result<()> {
        let credentials = Credentials::from_form(url, username, secret)?;
        let store = self.config.credential_store()?;
        store.set(credentials).await?;
        info!(path = %store.path().display(), "Credentials stored");
        write_output(&self.output.format_status(
            SaveStatus::Success,
            SETTINGS_SAVED_MESSAGE,
            None,
            &self.format,
        )?)
    }

    pub async fn show_config(&self) -> Result<()> {
        let store = self.config.credential_store()?;
        let credentials = store.get().await;
        write_output(&self.output.format_config(&self.config, &credentials, &self.format)?)
    }

    /// Credentials from the relay, or straight from the store when the relay is not running.
    async fn credentials(&self) -> Result<Credentials> {
        match self.relay.credentials().await {
            Ok(credentials) => Ok(credentials),
            Err(CliError::RelayUnavailable { url, message }) => {
                debug!(%url, %message, "Relay unavailable, reading credentials store");
                Ok(self.config.credential_store()?.get().await)
            }
            Err(e) => Err(e),
        }
    }

    fn client(&self) -> SnippetClient {
        SnippetClient::new(self.config.client_config())
    }
}

fn read_stdin() -> Result<String> {
    let mut buffer = String::new();
    std::io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use snippet_relay::bridge::{BridgeConfig, BridgeServer};
    use snippet_relay::coordinator::{Coordinator, CoordinatorConfig, CoordinatorHandle};
    use snippet_relay::credentials::{FileCredentialStore, MemoryCredentialStore};

    async fn spawn_relay(credentials: Credentials) -> (String, CoordinatorHandle) {
        let store = Arc::new(MemoryCredentialStore::new(credentials));
        let api = Arc::new(SnippetClient::default());
        let (handle, _task) = Coordinator::spawn(store, api, CoordinatorConfig::default());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = BridgeServer::new(BridgeConfig::default(), handle.clone());
        tokio::spawn(async move { server.serve(listener).await });
        (format!("http://{addr}"), handle)
    }

    fn executor(relay_url: &str, config: RelayConfig) -> CommandExecutor {
        CommandExecutor::new(
            config,
            RelayClient::new(relay_url).unwrap(),
            OutputManager::new(false),
            OutputFormat::Pretty,
        )
    }

    #[tokio::test]
    async fn test_capture_trims_and_ignores_empty() {
        let (url, handle) = spawn_relay(Credentials::default()).await;
        let exec = executor(&url, RelayConfig::default());

        exec.capture(Some("  picked text \n".into())).await.unwrap();
        assert_eq!(handle.captured_text().await.unwrap(), "picked text");

        exec.capture(Some("   ".into())).await.unwrap();
        assert_eq!(handle.captured_text().await.unwrap(), "picked text");
    }

    #[tokio::test]
    async fn test_save_rejects_empty_text() {
        let (url, _handle) = spawn_relay(Credentials::default()).await;
        let exec = executor(&url, RelayConfig::default());

        // Nothing captured and no text given.
        assert!(matches!(exec.save(None, "").await, Err(CliError::EmptyText)));
        assert!(matches!(
            exec.save(Some(" \n ".into()), "").await,
            Err(CliError::EmptyText)
        ));
    }

    #[tokio::test]
    async fn test_failed_save_is_an_error() {
        let (url, _handle) = spawn_relay(Credentials::default()).await;
        let exec = executor(&url, RelayConfig::default());

        let err = exec.save(Some("text".into()), "").await.unwrap_err();
        assert!(err.to_string().starts_with("Please configure"));
    }

    #[tokio::test]
    async fn test_configure_writes_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        let config = RelayConfig {
            credentials_path: Some(path.clone()),
            ..Default::default()
        };
        let (url, _handle) = spawn_relay(Credentials::default()).await;
        let exec = executor(&url, config);

        exec.configure(" https://example.com/ ", " admin ", "pw")
            .await
            .unwrap();

        let stored = FileCredentialStore::new(&path).get().await;
        assert_eq!(
            stored,
            Credentials::new("https://example.com", "admin", "pw")
        );

        let err = exec.configure("https://example.com", "", "pw").await;
        assert!(matches!(err, Err(CliError::Snippet(_))));
    }

    #[tokio::test]
    async fn test_list_falls_back_to_store_without_relay() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let dead = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let dir = tempfile::tempdir().unwrap();
        let config = RelayConfig {
            credentials_path: Some(dir.path().join("missing.json")),
            ..Default::default()
        };
        let exec = executor(&dead, config);

        // Empty store: the configuration precondition fails before any request.
        let err = exec.list(1, "").await.unwrap_err();
        assert!(matches!(err, CliError::Snippet(e) if e.is_configuration()));
    }
}
