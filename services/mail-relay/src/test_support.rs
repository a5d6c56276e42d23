//! Shared fixtures for handler tests: a prebuilt `AppState` and a mock
//! upstream serving both the tenant token endpoint and Graph `/me/messages`.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::extract::{Form, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum_extra::extract::cookie::{Key, SignedCookieJar};
use common::Secret;
use entra_auth::{Authority, ConfidentialClientApplication, PublicClientApplication};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use crate::AppState;
use crate::config::DEFAULT_REDIRECT_URI;
use crate::session::{SessionId, SessionStore, session_cookie, session_id_from_jar};

pub const TENANT: &str = "tenant-xyz";
pub const CLIENT_ID: &str = "client-abc";
pub const CLIENT_SECRET: &str = "test-secret";
pub const COOKIE_NAME: &str = "mail_relay.sid";

/// The only authorization code the mock token endpoint accepts.
pub const USER_CODE: &str = "good-code";

/// Graph `/me/messages` body. The stray spacing does not survive a
/// decode/re-encode, so only a byte-for-byte relay matches it.
pub const FIXTURE: &str = r#"{"@odata.context":"https://graph.microsoft.com/v1.0/$metadata#users('me')/messages","value":[{"id":"AAMkAGI2","subject":"Quarterly report",  "from":{"emailAddress":{"name":"Ada","address":"ada@contoso.com"}},"isRead":false}]}"#;

pub fn test_state(upstream_url: &str) -> AppState {
    test_state_with_authority(upstream_url, upstream_url)
}

/// State whose token calls go to `authority_host` and Graph calls to
/// `{upstream_url}/v1.0`.
pub fn test_state_with_authority(authority_host: &str, upstream_url: &str) -> AppState {
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    let authority = Authority::new(authority_host, TENANT).unwrap();

    AppState {
        public_client: Arc::new(PublicClientApplication::new(
            CLIENT_ID,
            authority.clone(),
            http.clone(),
        )),
        confidential_client: Arc::new(ConfidentialClientApplication::new(
            CLIENT_ID,
            Secret::new(CLIENT_SECRET.to_string()),
            authority,
            http.clone(),
        )),
        http,
        graph_base_url: Arc::from(format!("{upstream_url}/v1.0").as_str()),
        redirect_uri: Arc::from(DEFAULT_REDIRECT_URI),
        sessions: SessionStore::new(Duration::from_secs(3600)),
        cookie_name: Arc::from(COOKIE_NAME),
        cookie_key: Key::generate(),
        started_at: Instant::now(),
        prometheus: metrics_exporter_prometheus::PrometheusBuilder::new()
            .build_recorder()
            .handle(),
    }
}

pub async fn body_bytes(response: Response) -> Bytes {
    axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap()
}

/// `name=value` of the first Set-Cookie header, ready to replay as `Cookie`.
pub fn cookie_from_response(response: &Response) -> Option<String> {
    let header = response.headers().get("set-cookie")?.to_str().ok()?;
    header.split(';').next().map(|pair| pair.trim().to_owned())
}

/// Signed `Cookie` header value carrying `id` for `state`'s key.
pub fn cookie_header_for(state: &AppState, id: SessionId) -> String {
    let response = SignedCookieJar::new(state.cookie_key.clone())
        .add(session_cookie(&state.cookie_name, id))
        .into_response();
    cookie_from_response(&response).unwrap()
}

/// Verify a replayed cookie pair against `key` and extract the session id.
pub fn session_id_from_cookie(cookie: &str, key: Key) -> Option<SessionId> {
    let mut headers = HeaderMap::new();
    headers.insert("cookie", cookie.parse().ok()?);
    let jar = SignedCookieJar::from_headers(&headers, key);
    session_id_from_jar(&jar, COOKIE_NAME)
}

/// Mock identity platform plus Graph, with request capture.
#[derive(Clone)]
pub struct MockUpstream {
    pub url: String,
    pub token_requests: Arc<Mutex<Vec<HashMap<String, String>>>>,
    pub graph_authorizations: Arc<Mutex<Vec<String>>>,
    graph_hits: Arc<AtomicUsize>,
    fail_app_token: bool,
}

impl MockUpstream {
    /// `grant_type` of every token request, in arrival order.
    pub async fn grant_types(&self) -> Vec<String> {
        self.token_requests
            .lock()
            .await
            .iter()
            .map(|form| form.get("grant_type").cloned().unwrap_or_default())
            .collect()
    }

    pub fn graph_hits(&self) -> usize {
        self.graph_hits.load(Ordering::SeqCst)
    }
}

/// Start the mock upstream. With `fail_app_token` set the client-credential
/// grant is rejected with `invalid_client`.
pub async fn start_mock_upstream(fail_app_token: bool) -> MockUpstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let mock = MockUpstream {
        url: format!("http://{addr}"),
        token_requests: Arc::new(Mutex::new(Vec::new())),
        graph_authorizations: Arc::new(Mutex::new(Vec::new())),
        graph_hits: Arc::new(AtomicUsize::new(0)),
        fail_app_token,
    };

    let app = axum::Router::new()
        .route(&format!("/{TENANT}/oauth2/v2.0/token"), post(mock_token))
        .route("/v1.0/me/messages", get(mock_messages))
        .with_state(mock.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    mock
}

async fn mock_token(
    State(mock): State<MockUpstream>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    mock.token_requests.lock().await.push(form.clone());

    let grant = form.get("grant_type").map(String::as_str);
    match grant {
        Some("authorization_code") if form.get("code").map(String::as_str) == Some(USER_CODE) => {
            token_ok("at_user")
        }
        Some("authorization_code") => (
            StatusCode::BAD_REQUEST,
            axum::Json(json!({
                "error": "invalid_grant",
                "error_description": "AADSTS54005: OAuth2 Authorization code was already redeemed.",
                "error_codes": [54005],
            })),
        )
            .into_response(),
        Some("client_credentials")
            if !mock.fail_app_token
                && form.get("client_secret").map(String::as_str) == Some(CLIENT_SECRET) =>
        {
            token_ok("at_app")
        }
        Some("client_credentials") => (
            StatusCode::UNAUTHORIZED,
            axum::Json(json!({
                "error": "invalid_client",
                "error_description": "AADSTS7000215: Invalid client secret provided.",
                "error_codes": [7000215],
            })),
        )
            .into_response(),
        _ => (
            StatusCode::BAD_REQUEST,
            axum::Json(json!({ "error": "unsupported_grant_type" })),
        )
            .into_response(),
    }
}

fn token_ok(access_token: &str) -> Response {
    axum::Json(json!({
        "token_type": "Bearer",
        "expires_in": 3599,
        "ext_expires_in": 3599,
        "access_token": access_token,
    }))
    .into_response()
}

async fn mock_messages(State(mock): State<MockUpstream>, headers: HeaderMap) -> Response {
    mock.graph_hits.fetch_add(1, Ordering::SeqCst);
    let authorization = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    mock.graph_authorizations
        .lock()
        .await
        .push(authorization.clone());

    if authorization == "Bearer at_user" {
        (
            StatusCode::OK,
            [("content-type", "application/json; odata.metadata=minimal")],
            FIXTURE,
        )
            .into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            axum::Json(json!({
                "error": {
                    "code": "InvalidAuthenticationToken",
                    "message": "Access token is empty.",
                }
            })),
        )
            .into_response()
    }
}
