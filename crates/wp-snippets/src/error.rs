use thiserror::Error;

/// Prefix used for every failed save reported to the user.
pub const SAVE_FAILED_PREFIX: &str = "Failed to save text: ";

/// Prefix used for failures below the HTTP layer (DNS, refused connection, timeout).
pub const TRANSPORT_FAILED_PREFIX: &str = "Network or server error occurred: ";

/// Message returned when any credential field is still empty.
pub const NOT_CONFIGURED_MESSAGE: &str = "Please configure the extension settings first \
     (open the options and enter your site URL, username and application password)";

#[derive(Debug, Error)]
pub enum SnippetError {
    /// Credentials incomplete. Detected before any network call.
    #[error("{0}")]
    Configuration(String),
    /// The endpoint base URL does not parse as an absolute http(s) URL.
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),
    /// 401/403: credentials rejected or missing the edit-posts capability.
    #[error("authentication failed ({status}): {message}")]
    Authentication { status: u16, message: String },
    /// 400: the remote refused the payload (e.g. empty text).
    #[error("validation failed: {0}")]
    Validation(String),
    /// 404 on a single snippet lookup.
    #[error("snippet not found: {0}")]
    NotFound(String),
    /// Any other non-2xx, or a 2xx body with `success: false`.
    #[error("remote error ({status}): {message}")]
    Remote { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    /// 2xx body that does not match the documented shape.
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl SnippetError {
    /// Build the error for a non-2xx response from its status and extracted message.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            400 => Self::Validation(message),
            401 | 403 => Self::Authentication { status, message },
            404 => Self::NotFound(message),
            _ => Self::Remote { status, message },
        }
    }

    /// Whether the failure happened before an HTTP response was received.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Whether the failure was detected locally, without touching the network.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::InvalidUrl(_))
    }

    /// Short machine-friendly name of the failure class.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) | Self::InvalidUrl(_) => "configuration",
            Self::Authentication { .. } => "authentication",
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::Remote { .. } => "remote",
            Self::Transport(_) => "transport",
            Self::Decode(_) => "decode",
        }
    }

    /// The remote-provided (or locally produced) message without decoration.
    pub fn detail(&self) -> String {
        match self {
            Self::Configuration(m) => m.clone(),
            Self::InvalidUrl(_) => self.to_string(),
            Self::Authentication { message, .. } | Self::Remote { message, .. } => message.clone(),
            Self::Validation(m) | Self::NotFound(m) | Self::Transport(m) | Self::Decode(m) => {
                m.clone()
            }
        }
    }

    /// Message suitable for showing to the user after a failed save.
    pub fn save_message(&self) -> String {
        match self {
            Self::Configuration(_) | Self::InvalidUrl(_) => self.detail(),
            Self::Transport(_) => format!("{TRANSPORT_FAILED_PREFIX}{}", self.detail()),
            _ => format!("{SAVE_FAILED_PREFIX}{}", self.detail()),
        }
    }
}

impl From<reqwest::Error> for SnippetError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(describe_transport_error(&err))
        }
    }
}

impl From<serde_json::Error> for SnippetError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Flatten a reqwest error and its sources into one readable line.
fn describe_transport_error(err: &reqwest::Error) -> String {
    let mut description = if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        "could not connect to server".to_string()
    } else {
        "request failed".to_string()
    };

    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        description.push_str(": ");
        description.push_str(&cause.to_string());
        source = cause.source();
    }
    description
}
