//! Graph Mail Relay
//!
//! Single-binary web service that:
//! 1. Sends the browser to the Entra ID authorization endpoint
//! 2. Redeems the returned code for a user-delegated token, then acquires an
//!    application token with the client-credential grant
//! 3. Keeps both tokens in a server-side session
//! 4. Relays the signed-in user's `/me/messages` from Microsoft Graph

mod config;
mod error;
mod login;
mod mailbox;
mod metrics;
mod session;
#[cfg(test)]
mod test_support;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use axum::Router;
use axum::extract::{FromRef, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum_extra::extract::cookie::Key;
use entra_auth::{Authority, ConfidentialClientApplication, PublicClientApplication};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::session::SessionStore;

/// Maximum time in-flight requests get to finish after a shutdown signal.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared application state accessible from all handlers
#[derive(Clone)]
struct AppState {
    public_client: Arc<PublicClientApplication>,
    confidential_client: Arc<ConfidentialClientApplication>,
    http: reqwest::Client,
    graph_base_url: Arc<str>,
    redirect_uri: Arc<str>,
    sessions: SessionStore,
    cookie_name: Arc<str>,
    cookie_key: Key,
    started_at: Instant,
    prometheus: PrometheusHandle,
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

impl AppState {
    /// Wire every collaborator from the loaded configuration.
    fn from_config(config: &Config, prometheus: PrometheusHandle) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http.timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        let authority = Authority::new(&config.azure.authority_host, &config.azure.tenant_id)
            .context("invalid tenant authority")?;
        let client_secret = config
            .azure
            .client_secret
            .clone()
            .ok_or_else(|| anyhow!("client secret missing after validation"))?;

        let cookie_key = match &config.session.secret {
            Some(secret) => Key::derive_from(secret.expose().as_bytes()),
            None => {
                warn!("SESSION_SECRET not set, signing session cookies with a random per-process key");
                Key::generate()
            }
        };

        Ok(Self {
            public_client: Arc::new(PublicClientApplication::new(
                config.azure.client_id.clone(),
                authority.clone(),
                http.clone(),
            )),
            confidential_client: Arc::new(ConfidentialClientApplication::new(
                config.azure.client_id.clone(),
                client_secret,
                authority,
                http.clone(),
            )),
            http,
            graph_base_url: Arc::from(config.graph.base_url.as_str()),
            redirect_uri: Arc::from(config.server.redirect_uri.as_str()),
            sessions: SessionStore::new(Duration::from_secs(config.session.idle_ttl_secs)),
            cookie_name: Arc::from(config.session.cookie_name.as_str()),
            cookie_key,
            started_at: Instant::now(),
            prometheus,
        })
    }
}

/// `302 Found` to `location`, the status browsers and the identity platform expect.
fn found(location: &str) -> Response {
    (
        StatusCode::FOUND,
        [(axum::http::header::LOCATION, location.to_owned())],
    )
        .into_response()
}

/// Build the axum router with all routes and shared state.
fn build_router(state: AppState, max_connections: usize) -> Router {
    Router::new()
        .route("/", get(login::index))
        .route("/auth", get(login::start_authorization))
        .route("/azure-callback", get(login::azure_callback))
        .route("/emails", get(mailbox::list_emails))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(tower::limit::ConcurrencyLimitLayer::new(max_connections))
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    // JSON logs, filter from LOG_LEVEL, then RUST_LOG, else info
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("starting graph-mail-relay");

    let prometheus = metrics::install_recorder().context("failed to install Prometheus recorder")?;

    // CLI: simple --config flag parsing
    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    match Config::load_dotenv(None).context("failed to load .env file")? {
        Some(path) => info!(path = %path.display(), "loaded environment from .env file"),
        None => info!("no .env file found, using process environment"),
    }

    let config_path = Config::resolve_path(cli_config_path);
    match &config_path {
        Some(path) => info!(path = %path.display(), "loading configuration"),
        None => info!("no config file given, using defaults and environment"),
    }

    let config = Config::load(config_path.as_deref()).context("failed to load configuration")?;

    // Never log the client secret.
    info!(
        listen_addr = %config.server.listen_addr,
        client_id = %config.azure.client_id,
        tenant_id = %config.azure.tenant_id,
        authority_host = %config.azure.authority_host,
        redirect_uri = %config.server.redirect_uri,
        graph_base_url = %config.graph.base_url,
        "configuration loaded"
    );

    let state = AppState::from_config(&config, prometheus)?;
    let app = build_router(state, config.server.max_connections);

    let listen_addr = config.server.listen_addr;
    let listener = TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("failed to bind to {listen_addr}"))?;
    info!(addr = %listen_addr, "listening on http://{listen_addr}");

    // The drain timeout starts when the shutdown signal fires, not when the
    // server starts: signal the server to drain, then race it against the timer.
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    shutdown_signal().await;
    let _ = shutdown_tx.send(());

    match tokio::time::timeout(DRAIN_TIMEOUT, server_handle).await {
        Ok(Ok(Ok(()))) => info!("all in-flight requests drained"),
        Ok(Ok(Err(e))) => error!(error = %e, "server error during shutdown"),
        Ok(Err(e)) => error!(error = %e, "server task panicked"),
        Err(_) => warn!(
            drain_timeout_secs = DRAIN_TIMEOUT.as_secs(),
            "drain timeout exceeded, forcing shutdown"
        ),
    }

    info!("shutdown complete");
    Ok(())
}

/// Liveness with uptime and live session count.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let body = serde_json::json!({
        "status": "healthy",
        "uptime_seconds": state.started_at.elapsed().as_secs(),
        "sessions": state.sessions.len().await,
    });

    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
}

/// Prometheus metrics endpoint in text exposition format.
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        state.prometheus.render(),
    )
}

/// Wait for SIGTERM or SIGINT for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::login::INDEX_HTML;
    use crate::session::SessionId;
    use crate::test_support::{body_bytes, cookie_header_for, test_state};
    use axum::body::Body;
    use axum::http::Request;
    use common::Secret;
    use tower::ServiceExt;

    #[tokio::test]
    async fn index_is_static_regardless_of_session() {
        let state = test_state("http://127.0.0.1:1");
        let id = SessionId::new();
        state.sessions.set_user_token(&id, Secret::new("at_user".into())).await;
        let cookie = cookie_header_for(&state, id);
        let app = build_router(state, 100);

        let mut bodies = Vec::new();
        for cookie in [None, Some(cookie.clone()), Some(cookie)] {
            let mut request = Request::builder().uri("/");
            if let Some(cookie) = cookie {
                request = request.header("cookie", cookie);
            }
            let response = app
                .clone()
                .oneshot(request.body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert!(
                response.headers()["content-type"]
                    .to_str()
                    .unwrap()
                    .starts_with("text/html")
            );
            assert!(response.headers().get("set-cookie").is_none());
            bodies.push(body_bytes(response).await);
        }

        assert!(bodies.iter().all(|b| b.as_ref() == INDEX_HTML.as_bytes()));
    }

    #[tokio::test]
    async fn health_endpoint_reports_sessions() {
        let state = test_state("http://127.0.0.1:1");
        state
            .sessions
            .set_user_token(&SessionId::new(), Secret::new("at".into()))
            .await;
        let app = build_router(state, 100);

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["sessions"], 1);
        assert!(json["uptime_seconds"].is_u64());
    }

    #[tokio::test]
    async fn metrics_endpoint_returns_prometheus_format() {
        let app = build_router(test_state("http://127.0.0.1:1"), 100);
        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()["content-type"].to_str().unwrap();
        assert!(content_type.contains("text/plain"));
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let app = build_router(test_state("http://127.0.0.1:1"), 100);
        let response = app
            .oneshot(Request::builder().uri("/me/messages").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn found_is_a_302_with_location() {
        let response = found("/emails");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()["location"], "/emails");
    }

    #[test]
    fn app_state_builds_from_config() {
        let mut config = Config::default();
        config.azure.client_id = "client".into();
        config.azure.tenant_id = "tenant".into();
        config.azure.client_secret = Some(Secret::new("secret".into()));
        config.session.secret = Some(Secret::new("k".repeat(config::MIN_SESSION_SECRET_LEN)));

        let prometheus = metrics_exporter_prometheus::PrometheusBuilder::new()
            .build_recorder()
            .handle();
        let state = AppState::from_config(&config, prometheus).unwrap();
        assert_eq!(&*state.redirect_uri, config::DEFAULT_REDIRECT_URI);
        assert_eq!(state.public_client.authority().tenant_id(), "tenant");
        assert_eq!(&*state.cookie_name, "mail_relay.sid");
    }

    #[test]
    fn app_state_requires_client_secret() {
        let mut config = Config::default();
        config.azure.client_id = "client".into();
        config.azure.tenant_id = "tenant".into();

        let prometheus = metrics_exporter_prometheus::PrometheusBuilder::new()
            .build_recorder()
            .handle();
        assert!(AppState::from_config(&config, prometheus).is_err());
    }
}
