//! Coordinator behavior end to end, with a real `SnippetClient` against a
//! local mock of the WordPress route where the network matters.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response as HttpResponse};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::Notify;

use snippet_relay::coordinator::{CaptureEvent, Coordinator, CoordinatorConfig, CoordinatorHandle};
use snippet_relay::credentials::{CredentialStore, MemoryCredentialStore};
use wp_snippets::error::{NOT_CONFIGURED_MESSAGE, TRANSPORT_FAILED_PREFIX};
use wp_snippets::models::SAVE_SUCCESS_MESSAGE;
use wp_snippets::{
    ClientConfig, Credentials, ListResult, SaveResult, SaveStatus, Snippet, SnippetApi,
    SnippetClient, SnippetError,
};

#[derive(Clone)]
struct Remote {
    hits: Arc<AtomicUsize>,
    last_body: Arc<parking_lot::Mutex<Option<(Option<String>, Value)>>>,
    status: StatusCode,
    body: Value,
}

impl Remote {
    fn new(status: StatusCode, body: Value) -> Self {
        Self {
            hits: Arc::new(AtomicUsize::new(0)),
            last_body: Arc::default(),
            status,
            body,
        }
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn save_route(
    State(remote): State<Remote>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> HttpResponse {
    remote.hits.fetch_add(1, Ordering::SeqCst);
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    *remote.last_body.lock() = Some((auth, body));
    (remote.status, Json(remote.body.clone())).into_response()
}

async fn spawn_remote(remote: Remote) -> SocketAddr {
    let router = Router::new()
        .route("/wp-json/custom/v1/strings", post(save_route))
        .with_state(remote);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn creds_for(addr: SocketAddr) -> Credentials {
    Credentials::new(format!("http://{addr}"), "editor", "abcd 1234 efgh 5678")
}

fn start(credentials: Credentials, api: Arc<dyn SnippetApi>) -> CoordinatorHandle {
    let store = Arc::new(MemoryCredentialStore::new(credentials));
    let (handle, _task) = Coordinator::spawn(store, api, CoordinatorConfig::default());
    handle
}

fn real_client() -> Arc<dyn SnippetApi> {
    Arc::new(SnippetClient::new(ClientConfig {
        timeout: Duration::from_secs(5),
        ..ClientConfig::default()
    }))
}

/// Blocks saves of the text "slow" until released.
#[derive(Default)]
struct GatedApi {
    gate: Notify,
    started: AtomicUsize,
    completed: AtomicUsize,
}

impl GatedApi {
    async fn wait_started(&self, count: usize) {
        for _ in 0..200 {
            if self.started.load(Ordering::SeqCst) >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("save never started");
    }
}

#[async_trait]
impl SnippetApi for GatedApi {
    async fn save(&self, text: &str, _category: &str, _creds: &Credentials) -> SaveResult {
        self.started.fetch_add(1, Ordering::SeqCst);
        if text == "slow" {
            self.gate.notified().await;
        }
        let n = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        SaveResult::success(Some(n as i64))
    }

    async fn list(&self, page: u64, _: &str, _: &Credentials) -> Result<ListResult, SnippetError> {
        Ok(ListResult::from_page(Vec::new(), 0, 10, page))
    }

    async fn get_one(&self, id: i64, _: &Credentials) -> Result<Snippet, SnippetError> {
        Err(SnippetError::NotFound(format!("snippet {id}")))
    }
}

/// Panics on every save.
struct PanickingApi;

#[async_trait]
impl SnippetApi for PanickingApi {
    async fn save(&self, _: &str, _: &str, _: &Credentials) -> SaveResult {
        panic!("client bug");
    }

    async fn list(&self, page: u64, _: &str, _: &Credentials) -> Result<ListResult, SnippetError> {
        Ok(ListResult::from_page(Vec::new(), 0, 10, page))
    }

    async fn get_one(&self, id: i64, _: &Credentials) -> Result<Snippet, SnippetError> {
        Err(SnippetError::NotFound(format!("snippet {id}")))
    }
}

#[tokio::test]
async fn test_captured_text_read_is_idempotent() {
    let handle = start(Credentials::default(), real_client());
    handle.capture_text("hello world").await.unwrap();

    let first = handle.captured_text().await.unwrap();
    let second = handle.captured_text().await.unwrap();
    assert_eq!(first, "hello world");
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_last_capture_wins() {
    let handle = start(Credentials::default(), real_client());

    // Fire-and-forget captures are processed in arrival order.
    for text in ["a", "b", "c"] {
        handle
            .notify(snippet_relay::Request::CaptureText { text: text.into() })
            .unwrap();
    }
    assert_eq!(handle.captured_text().await.unwrap(), "c");

    handle.capture_text("d").await.unwrap();
    assert_eq!(handle.captured_text().await.unwrap(), "d");
}

#[tokio::test]
async fn test_missing_credentials_never_reach_network() {
    let remote = Remote::new(StatusCode::CREATED, json!({"success": true, "post_id": 1}));
    let addr = spawn_remote(remote.clone()).await;

    for creds in [
        Credentials::default(),
        Credentials::new(format!("http://{addr}"), "", "secret"),
        Credentials::new(format!("http://{addr}"), "editor", ""),
        Credentials::new("", "editor", "secret"),
    ] {
        let handle = start(creds, real_client());
        let result = handle.save_text("text", "notes").await.unwrap();
        assert_eq!(result.status, SaveStatus::Error);
        assert_eq!(result.message, NOT_CONFIGURED_MESSAGE);
    }

    assert_eq!(remote.hits(), 0);
}

#[tokio::test]
async fn test_invalid_url_never_reaches_network() {
    let handle = start(
        Credentials::new("not a url", "editor", "secret"),
        real_client(),
    );

    let result = handle.save_text("text", "").await.unwrap();
    assert_eq!(result.status, SaveStatus::Error);
    assert!(result.message.starts_with("Invalid API URL"));
    assert!(result.message.contains("not a url"));
}

#[tokio::test]
async fn test_successful_save_round_trip() {
    let remote = Remote::new(StatusCode::CREATED, json!({"success": true, "post_id": 42}));
    let addr = spawn_remote(remote.clone()).await;
    let handle = start(creds_for(addr), real_client());

    handle.capture_text("Saved words").await.unwrap();
    let result = handle.save_text("Saved words", "notes").await.unwrap();

    assert_eq!(result.status, SaveStatus::Success);
    assert_eq!(result.message, SAVE_SUCCESS_MESSAGE);
    assert_eq!(result.post_id, Some(42));
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({"status": "success", "message": "Text saved successfully!", "postId": 42})
    );

    let (auth, body) = remote.last_body.lock().clone().unwrap();
    assert_eq!(
        auth.as_deref(),
        Some("Basic ZWRpdG9yOmFiY2QgMTIzNCBlZmdoIDU2Nzg=")
    );
    assert_eq!(body, json!({"text_string": "Saved words", "category": "notes"}));

    // Saving does not clear the slot.
    assert_eq!(handle.captured_text().await.unwrap(), "Saved words");
}

#[tokio::test]
async fn test_http_failure_maps_to_message() {
    let remote = Remote::new(StatusCode::FORBIDDEN, json!({"message": "forbidden"}));
    let addr = spawn_remote(remote.clone()).await;
    let handle = start(creds_for(addr), real_client());

    let result = handle.save_text("text", "").await.unwrap();
    assert_eq!(result.status, SaveStatus::Error);
    assert_eq!(result.message, "Failed to save text: forbidden");
    assert_eq!(remote.hits(), 1);

    // A failure does not stop the coordinator.
    handle.capture_text("still here").await.unwrap();
    assert_eq!(handle.captured_text().await.unwrap(), "still here");
}

#[tokio::test]
async fn test_transport_failure_is_distinct() {
    // Bind then drop to get a port nothing listens on.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let handle = start(creds_for(addr), real_client());
    let result = handle.save_text("text", "").await.unwrap();

    assert_eq!(result.status, SaveStatus::Error);
    assert!(result.message.starts_with(TRANSPORT_FAILED_PREFIX));
    assert!(!result.message.starts_with("Failed to save text"));
}

#[tokio::test]
async fn test_credentials_are_read_per_save() {
    let remote = Remote::new(StatusCode::CREATED, json!({"success": true, "post_id": 7}));
    let addr = spawn_remote(remote.clone()).await;
    let store = Arc::new(MemoryCredentialStore::default());
    let (handle, _task) = Coordinator::spawn(
        store.clone(),
        real_client(),
        CoordinatorConfig::default(),
    );

    let before = handle.save_text("text", "").await.unwrap();
    assert_eq!(before.status, SaveStatus::Error);

    store.set(creds_for(addr)).await.unwrap();
    let after = handle.save_text("text", "").await.unwrap();
    assert!(after.is_success());
    assert_eq!(handle.credentials().await.unwrap(), creds_for(addr));
}

#[tokio::test]
async fn test_save_in_flight_does_not_block_other_messages() {
    let api = Arc::new(GatedApi::default());
    let handle = start(Credentials::default(), api.clone());

    let slow = tokio::spawn({
        let handle = handle.clone();
        async move { handle.save_text("slow", "").await }
    });

    // Served while the slow save is still waiting.
    handle.capture_text("meanwhile").await.unwrap();
    assert_eq!(handle.captured_text().await.unwrap(), "meanwhile");

    // A later save finishes first.
    let fast = handle.save_text("fast", "").await.unwrap();
    assert_eq!(fast.post_id, Some(1));
    assert!(!slow.is_finished());

    api.gate.notify_one();
    let slow = slow.await.unwrap().unwrap();
    assert_eq!(slow.post_id, Some(2));
}

#[tokio::test]
async fn test_dropped_caller_is_harmless() {
    let api = Arc::new(GatedApi::default());
    let handle = start(Credentials::default(), api.clone());

    let caller = tokio::spawn({
        let handle = handle.clone();
        async move { handle.save_text("slow", "").await }
    });
    // Make sure the request is queued before the caller goes away.
    handle.captured_text().await.unwrap();
    caller.abort();
    let _ = caller.await;

    api.gate.notify_one();
    for _ in 0..100 {
        if api.completed.load(Ordering::SeqCst) == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(api.completed.load(Ordering::SeqCst), 1);

    handle.capture_text("alive").await.unwrap();
    assert_eq!(handle.captured_text().await.unwrap(), "alive");
}

#[tokio::test]
async fn test_panicking_save_becomes_error_result() {
    let handle = start(Credentials::default(), Arc::new(PanickingApi));

    let result = handle.save_text("text", "").await.unwrap();
    assert_eq!(result.status, SaveStatus::Error);
    assert!(result.message.starts_with("Failed to save text"));

    handle.capture_text("after panic").await.unwrap();
    assert_eq!(handle.captured_text().await.unwrap(), "after panic");
}

#[tokio::test]
async fn test_capture_notifies_subscribers() {
    let handle = start(Credentials::default(), real_client());
    let mut first = handle.subscribe();
    let mut second = handle.subscribe();

    handle.capture_text("broadcast me").await.unwrap();

    let expected = CaptureEvent::TextCaptured {
        text: "broadcast me".into(),
    };
    assert_eq!(first.recv().await.unwrap(), expected);
    assert_eq!(second.recv().await.unwrap(), expected);
}

#[tokio::test]
async fn test_cancel_waits_for_in_flight_save() {
    let api = Arc::new(GatedApi::default());
    let store = Arc::new(MemoryCredentialStore::default());
    let (handle, task) = Coordinator::spawn(store, api.clone(), CoordinatorConfig::default());

    let pending = tokio::spawn({
        let handle = handle.clone();
        async move { handle.save_text("slow", "").await }
    });
    api.wait_started(1).await;

    handle.cancel();
    api.gate.notify_one();

    let result = pending.await.unwrap().unwrap();
    assert!(result.is_success());
    task.await.unwrap();
    assert!(handle.captured_text().await.is_err());
}
