//! Settings store holding the site URL, username and application password.
//!
//! - [`CredentialStore`]: async accessor used by the coordinator and the
//!   options surface
//! - [`FileCredentialStore`]: JSON file replaced atomically on write
//! - [`MemoryCredentialStore`]: in-process store for tests and embedding

mod error;
mod store;

pub use error::CredentialError;
pub use store::{
    CREDENTIALS_FILE_NAME, CredentialStore, FileCredentialStore, MemoryCredentialStore,
    needs_configuration,
};
pub use wp_snippets::Credentials;
