//! Request guard for the bridge.
//!
//! The bridge hands out stored credentials, so it only answers requests
//! addressed to a loopback name on its own port, and browser requests
//! from an allowed extension origin. A page that rebinds its DNS name to
//! 127.0.0.1 still sends its own `Host` and `Origin`, and is refused here.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use super::error::BridgeError;
use super::server::BridgeConfig;

const LOOPBACK_HOSTS: [&str; 3] = ["127.0.0.1", "localhost", "[::1]"];

/// Host and origin allow-list for one listening port.
#[derive(Debug, Clone)]
pub struct RequestGuard {
    hosts: Arc<Vec<String>>,
    port: u16,
    config: Arc<BridgeConfig>,
}

impl RequestGuard {
    pub fn new(config: &BridgeConfig, port: u16) -> Self {
        let mut hosts: Vec<String> = LOOPBACK_HOSTS.iter().map(|h| h.to_string()).collect();

        // A specific non-loopback bind address is reachable by that name too.
        let bind = config.bind_address.trim();
        if !bind.is_empty() && bind != "0.0.0.0" && bind != "::" {
            let bind = if bind.contains(':') && !bind.starts_with('[') {
                format!("[{bind}]")
            } else {
                bind.to_ascii_lowercase()
            };
            if !hosts.contains(&bind) {
                hosts.push(bind);
            }
        }

        Self {
            hosts: Arc::new(hosts),
            port,
            config: Arc::new(config.clone()),
        }
    }

    /// Whether a `Host` value names this bridge.
    pub fn is_allowed_host(&self, host: &str) -> bool {
        let host = host.trim().to_ascii_lowercase();
        let (name, port) = split_host_port(&host);
        let port = match port {
            Some(port) => match port.parse::<u16>() {
                Ok(port) => port,
                Err(_) => return false,
            },
            None => 80,
        };
        port == self.port && self.hosts.iter().any(|allowed| allowed == name)
    }

    pub fn is_allowed_origin(&self, origin: &str) -> bool {
        self.config.is_allowed_origin(origin)
    }
}

/// `[::1]:80` → (`[::1]`, `80`), `localhost` → (`localhost`, none).
fn split_host_port(host: &str) -> (&str, Option<&str>) {
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => {
                let (name, rest) = host.split_at(end + 1);
                (name, rest.strip_prefix(':'))
            }
            None => (host, None),
        };
    }
    match host.rsplit_once(':') {
        Some((name, port)) => (name, Some(port)),
        None => (host, None),
    }
}

/// Middleware rejecting requests for a foreign host or from a foreign origin.
pub async fn guard_request(
    State(guard): State<RequestGuard>,
    request: Request,
    next: Next,
) -> Result<Response, BridgeError> {
    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| request.uri().authority().map(|a| a.to_string()));

    match host {
        Some(host) if guard.is_allowed_host(&host) => {}
        Some(host) => {
            warn!(%host, "Rejected request for foreign host");
            return Err(BridgeError::forbidden("Host not allowed"));
        }
        None => {
            warn!("Rejected request without host");
            return Err(BridgeError::forbidden("Host not allowed"));
        }
    }

    if let Some(origin) = request.headers().get(header::ORIGIN) {
        let allowed = origin
            .to_str()
            .map(|origin| guard.is_allowed_origin(origin))
            .unwrap_or(false);
        if !allowed {
            warn!(origin = ?origin, "Rejected request from foreign origin");
            return Err(BridgeError::forbidden("Origin not allowed"));
        }
    }

    Ok(next.run(request).await)
}
