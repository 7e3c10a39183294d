//! Site credentials used for every remote call.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{NOT_CONFIGURED_MESSAGE, SnippetError};

/// Path appended to the site base URL to reach the snippet collection.
pub const STRINGS_ROUTE: &str = "/wp-json/custom/v1/strings";

/// WordPress site URL plus an application password.
///
/// Field names on the wire match the settings store keys used by the
/// extension surfaces: `endpointBaseUrl`, `username`, `secret`.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Credentials {
    /// Absolute site URL without a trailing slash.
    pub endpoint_base_url: String,
    pub username: String,
    /// Application password. Never logged.
    pub secret: String,
}

impl Credentials {
    pub fn new(
        endpoint_base_url: impl Into<String>,
        username: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            endpoint_base_url: endpoint_base_url.into(),
            username: username.into(),
            secret: secret.into(),
        }
    }

    /// Build credentials from raw options-form input.
    ///
    /// URL and username are trimmed, the secret is kept verbatim (WordPress
    /// application passwords contain spaces), and trailing slashes are removed
    /// from the URL. Every field is required.
    pub fn from_form(url: &str, username: &str, secret: &str) -> Result<Self, SnippetError> {
        let url = url.trim();
        let username = username.trim();
        if url.is_empty() || username.is_empty() || secret.is_empty() {
            return Err(SnippetError::Configuration(
                "Please fill in all fields".to_string(),
            ));
        }

        Ok(Self::new(url.trim_end_matches('/'), username, secret))
    }

    /// True when all three fields are non-empty.
    pub fn is_complete(&self) -> bool {
        !self.endpoint_base_url.is_empty() && !self.username.is_empty() && !self.secret.is_empty()
    }

    /// Check the preconditions of every remote call and return the parsed base URL.
    pub fn validate(&self) -> Result<Url, SnippetError> {
        if !self.is_complete() {
            return Err(SnippetError::Configuration(
                NOT_CONFIGURED_MESSAGE.to_string(),
            ));
        }

        let invalid = || SnippetError::InvalidUrl(self.endpoint_base_url.clone());
        let url = Url::parse(&self.endpoint_base_url).map_err(|_| invalid())?;
        if !matches!(url.scheme(), "http" | "https") || !url.has_host() {
            return Err(invalid());
        }
        Ok(url)
    }

    /// Collection endpoint: `{endpointBaseUrl}/wp-json/custom/v1/strings`.
    pub fn strings_endpoint(&self) -> Result<Url, SnippetError> {
        self.validate()?;
        let base = self.endpoint_base_url.trim_end_matches('/');
        Url::parse(&format!("{base}{STRINGS_ROUTE}"))
            .map_err(|_| SnippetError::InvalidUrl(self.endpoint_base_url.clone()))
    }

    /// Single snippet endpoint: `{endpointBaseUrl}/wp-json/custom/v1/strings/{id}`.
    pub fn snippet_endpoint(&self, id: i64) -> Result<Url, SnippetError> {
        self.validate()?;
        let base = self.endpoint_base_url.trim_end_matches('/');
        Url::parse(&format!("{base}{STRINGS_ROUTE}/{id}"))
            .map_err(|_| SnippetError::InvalidUrl(self.endpoint_base_url.clone()))
    }

    /// `Basic base64(username:secret)`, with nothing around the colon.
    pub fn basic_auth_header(&self) -> String {
        let raw = format!("{}:{}", self.username, self.secret);
        format!("Basic {}", STANDARD.encode(raw))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("endpoint_base_url", &self.endpoint_base_url)
            .field("username", &self.username)
            .field("secret", &if self.secret.is_empty() { "" } else { "***" })
            .finish()
    }
}
