//! Bridge server setup and configuration.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::{Router, middleware};
use axum::extract::{DefaultBodyLimit, Request};
use axum::http::{HeaderName, HeaderValue, Method, header};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::guard::{RequestGuard, guard_request};
use super::routes;
use crate::coordinator::CoordinatorHandle;
use crate::error::{Error, Result};

/// Default bridge port.
pub const DEFAULT_BRIDGE_PORT: u16 = 12580;

/// Bridge server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Server bind address
    pub bind_address: String,
    /// Server port
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Origins starting with one of these prefixes are echoed back.
    pub allowed_origin_prefixes: Vec<String>,
    /// Request body size limit in bytes
    pub body_limit: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: DEFAULT_BRIDGE_PORT,
            enable_cors: true,
            allowed_origin_prefixes: vec![
                "chrome-extension://".to_string(),
                "moz-extension://".to_string(),
            ],
            body_limit: 1024 * 1024, // 1MB
        }
    }
}

impl BridgeConfig {
    /// Load bridge config from environment variables, falling back to defaults.
    ///
    /// Supported env vars:
    /// - `RELAY_BIND_ADDRESS` (e.g. "127.0.0.1")
    /// - `RELAY_PORT` (e.g. "12580")
    pub fn from_env_or_default() -> Self {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Apply `RELAY_BIND_ADDRESS` / `RELAY_PORT` from `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(bind_address) = lookup("RELAY_BIND_ADDRESS")
            && !bind_address.trim().is_empty()
        {
            self.bind_address = bind_address.trim().to_string();
        }

        if let Some(port) = lookup("RELAY_PORT")
            && let Ok(parsed) = port.trim().parse::<u16>()
        {
            self.port = parsed;
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.bind_address, self.port)
            .parse()
            .map_err(|e| Error::Bridge(format!("Invalid address: {e}")))
    }

    pub(crate) fn is_allowed_origin(&self, origin: &str) -> bool {
        self.allowed_origin_prefixes
            .iter()
            .any(|prefix| origin.starts_with(prefix.as_str()))
    }
}

/// Shared state of the bridge routes.
#[derive(Debug, Clone)]
pub struct BridgeState {
    /// Server start time for uptime calculation
    pub start_time: Instant,
    pub coordinator: CoordinatorHandle,
}

impl BridgeState {
    pub fn new(coordinator: CoordinatorHandle) -> Self {
        Self {
            start_time: Instant::now(),
            coordinator,
        }
    }
}

/// Local HTTP bridge in front of the coordinator.
pub struct BridgeServer {
    config: BridgeConfig,
    state: BridgeState,
    cancel_token: CancellationToken,
}

impl BridgeServer {
    pub fn new(config: BridgeConfig, coordinator: CoordinatorHandle) -> Self {
        Self {
            config,
            state: BridgeState::new(coordinator),
            cancel_token: CancellationToken::new(),
        }
    }

    /// Get the cancellation token for graceful shutdown.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Build the router with all middleware and routes, for the configured port.
    pub fn build_router(&self) -> Router {
        self.router_for_port(self.config.port)
    }

    fn router_for_port(&self, port: u16) -> Router {
        let mut router = routes::create_router(self.state.clone())
            .layer(DefaultBodyLimit::max(self.config.body_limit));

        if self.config.enable_cors {
            router = router.layer(cors_layer(&self.config));
        }

        router
            .layer(middleware::from_fn_with_state(
                RequestGuard::new(&self.config, port),
                guard_request,
            ))
            .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request| {
                    if req.uri().path() == "/health" {
                        Span::none()
                    } else {
                        let mut make_span =
                            tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO);
                        use tower_http::trace::MakeSpan;
                        make_span.make_span(req)
                    }
                })
                .on_response(
                    |res: &axum::http::Response<_>, latency: Duration, span: &Span| {
                        if span.is_disabled() {
                            return;
                        }
                        let on_response =
                            tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO);
                        use tower_http::trace::OnResponse;
                        on_response.on_response(res, latency, span);
                    },
                ),
        )
    }

    /// Bind and serve until the cancellation token fires.
    pub async fn run(&self) -> Result<()> {
        let addr = self.config.socket_addr()?;
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let local_addr = listener.local_addr()?;
        let router = self.router_for_port(local_addr.port());
        tracing::info!("Bridge listening on http://{}", local_addr);

        let cancel_token = self.cancel_token.clone();

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                cancel_token.cancelled().await;
                tracing::info!("Bridge shutting down...");
            })
            .await
            .map_err(|e| Error::Bridge(format!("Server error: {e}")))?;

        Ok(())
    }

    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}

fn cors_layer(config: &BridgeConfig) -> CorsLayer {
    let config = config.clone();
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &axum::http::request::Parts| {
                origin
                    .to_str()
                    .map(|origin| config.is_allowed_origin(origin))
                    .unwrap_or(false)
            },
        ))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-requested-with"),
        ])
        .allow_credentials(true)
}
