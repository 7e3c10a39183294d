use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Please enter some text to save.")]
    EmptyText,

    #[error("Cannot reach snippet-relay at {url}: {message} (is snippet-relay running?)")]
    RelayUnavailable { url: String, message: String },

    #[error("{0}")]
    Relay(String),

    #[error("Unexpected reply from snippet-relay: {0}")]
    UnexpectedReply(String),

    #[error("{0}")]
    Snippet(#[from] wp_snippets::SnippetError),

    #[error("Configuration error: {0}")]
    Config(#[from] snippet_relay::Error),

    #[error("Credential store error: {0}")]
    Credentials(#[from] snippet_relay::credentials::CredentialError),

    #[error("Invalid relay URL: {0}")]
    InvalidRelayUrl(#[from] url::ParseError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
