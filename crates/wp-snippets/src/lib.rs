//! Client library for the WordPress snippet endpoint.
//!
//! The remote side exposes three routes under `/wp-json/custom/v1/strings`:
//! create (POST), paginated list with search (GET) and single fetch
//! (GET `/{id}`), all behind HTTP Basic auth with an application password.
//!
//! - [`Credentials`]: site URL, username and application password
//! - [`SnippetClient`]: reqwest implementation of [`SnippetApi`]
//! - [`SaveResult`] / [`ListResult`]: normalized results handed to callers
//! - [`SnippetError`]: configuration, authentication, validation, remote
//!   and transport failures

pub mod client;
pub mod credentials;
pub mod error;
pub mod models;

pub use client::{ClientConfig, SnippetApi, SnippetClient};
pub use credentials::Credentials;
pub use error::SnippetError;
pub use models::{ListResult, SaveResult, SaveStatus, Snippet};

/// First `max` characters of `text`, with `...` appended when truncated.
///
/// Used wherever snippet text ends up in logs.
pub fn preview(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::preview;

    #[test]
    fn test_preview() {
        assert_eq!(preview("short", 50), "short");
        assert_eq!(preview("abcdef", 3), "abc...");
        assert_eq!(preview("héllo wörld", 4), "héll...");
    }
}
