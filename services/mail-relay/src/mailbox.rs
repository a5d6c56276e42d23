//! `GET /emails`: relay the signed-in user's messages from Graph.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::SignedCookieJar;
use graph_client::{BearerTokenProvider, GraphClient, MY_MESSAGES_PATH};
use tracing::{debug, error, info, instrument};

use crate::error::AppError;
use crate::metrics;
use crate::session::session_id_from_jar;
use crate::{AppState, found};

/// Sessions without both tokens are sent back to `/` without calling Graph.
/// The Graph body is returned byte-for-byte.
#[instrument(skip_all)]
pub(crate) async fn list_emails(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> Result<Response, AppError> {
    let Some(session_id) = session_id_from_jar(&jar, &state.cookie_name) else {
        debug!("no session cookie, redirecting to /");
        return Ok(found("/"));
    };
    let Some(tokens) = state
        .sessions
        .get(&session_id)
        .await
        .and_then(|s| s.ready_tokens())
    else {
        debug!(session = %session_id, "session not signed in, redirecting to /");
        return Ok(found("/"));
    };

    let client = GraphClient::new(
        state.http.clone(),
        state.graph_base_url.to_string(),
        Arc::new(BearerTokenProvider::new(tokens.user_access_token)),
    );

    let started = Instant::now();
    let result = client.api(MY_MESSAGES_PATH).get().await;
    let elapsed = started.elapsed().as_secs_f64();

    match result {
        Ok(response) => {
            metrics::record_graph_request("success", elapsed);
            info!(session = %session_id, bytes = response.body.len(), "relayed messages");
            Ok((StatusCode::OK, [(CONTENT_TYPE, "application/json")], response.body).into_response())
        }
        Err(e) => {
            let outcome = if e.status().is_some() {
                "api_error"
            } else {
                "transport_error"
            };
            metrics::record_graph_request(outcome, elapsed);
            error!(session = %session_id, error = %e, "failed to list messages");
            Err(AppError::Graph(e))
        }
    }
}
