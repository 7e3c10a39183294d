//! Shared helpers for unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use wp_snippets::{Credentials, ListResult, SaveResult, Snippet, SnippetApi, SnippetError};

use crate::coordinator::{Coordinator, CoordinatorConfig, CoordinatorHandle};
use crate::credentials::MemoryCredentialStore;

/// Remote stand-in that counts saves and answers with a fixed post id.
#[derive(Debug, Default)]
pub struct CountingApi {
    pub saves: AtomicUsize,
}

impl CountingApi {
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnippetApi for CountingApi {
    async fn save(&self, _text: &str, _category: &str, creds: &Credentials) -> SaveResult {
        if let Err(e) = creds.validate() {
            return e.into();
        }
        let n = self.saves.fetch_add(1, Ordering::SeqCst) + 1;
        SaveResult::success(Some(n as i64))
    }

    async fn list(
        &self,
        page: u64,
        _search: &str,
        creds: &Credentials,
    ) -> Result<ListResult, SnippetError> {
        creds.validate()?;
        Ok(ListResult::from_page(Vec::new(), 0, 10, page))
    }

    async fn get_one(&self, id: i64, creds: &Credentials) -> Result<Snippet, SnippetError> {
        creds.validate()?;
        Err(SnippetError::NotFound(format!("snippet {id}")))
    }
}

pub fn configured() -> Credentials {
    Credentials::new("https://example.com", "admin", "app password")
}

/// Spawn a coordinator over an in-memory store and a [`CountingApi`].
pub fn spawn_coordinator(credentials: Credentials) -> (CoordinatorHandle, Arc<CountingApi>) {
    let api = Arc::new(CountingApi::default());
    let store = Arc::new(MemoryCredentialStore::new(credentials));
    let (handle, _task) = Coordinator::spawn(store, api.clone(), CoordinatorConfig::default());
    (handle, api)
}
