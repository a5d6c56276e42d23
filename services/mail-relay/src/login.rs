//! Sign-in routes
//!
//! - `GET /`               static login link
//! - `GET /auth`           302 to the tenant's authorization endpoint
//! - `GET /azure-callback` redeem the code, then acquire the app token
//!
//! The callback runs its two exchanges strictly in order. The application
//! token is only requested once the user token is stored, and the browser is
//! only sent on to `/emails` when both succeeded. A failure in the second
//! exchange leaves the new user token in the session and no application
//! token, even when the session held one from an earlier sign-in.

use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse, Response};
use axum_extra::extract::cookie::SignedCookieJar;
use common::Secret;
use entra_auth::{
    AuthorizationCodeRequest, AuthorizationUrlRequest, ClientCredentialRequest,
    GRAPH_DEFAULT_SCOPE,
};
use serde::Deserialize;
use tracing::{error, info, instrument, warn};

use crate::error::AppError;
use crate::metrics::{self, Flow};
use crate::session::{SessionId, session_cookie, session_id_from_jar};
use crate::{AppState, found};

pub(crate) const INDEX_HTML: &str = r#"<a href="/auth">Login with Microsoft</a>"#;

fn graph_scopes() -> Vec<String> {
    vec![GRAPH_DEFAULT_SCOPE.to_string()]
}

pub(crate) async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /auth
#[instrument(skip_all)]
pub(crate) async fn start_authorization(State(state): State<AppState>) -> Result<Response, AppError> {
    let request = AuthorizationUrlRequest {
        scopes: graph_scopes(),
        redirect_uri: state.redirect_uri.to_string(),
    };

    let url = state
        .public_client
        .authorization_url(&request)
        .map_err(|e| {
            error!(error = %e, "failed to build authorization URL");
            AppError::AuthorizationUrl(e)
        })?;

    info!(tenant = %state.public_client.authority().tenant_id(), "redirecting to authorization endpoint");
    Ok(found(url.as_str()))
}

/// Query string the identity platform appends when redirecting back.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct CallbackQuery {
    code: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// GET /azure-callback
#[instrument(skip_all)]
pub(crate) async fn azure_callback(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let session_id = session_id_from_jar(&jar, &state.cookie_name).unwrap_or_default();
    let jar = jar.add(session_cookie(&state.cookie_name, session_id));

    match complete_sign_in(&state, session_id, query).await {
        Ok(()) => {
            info!(session = %session_id, "sign-in complete");
            (jar, found("/emails")).into_response()
        }
        Err(e) => {
            error!(session = %session_id, error = %e, "sign-in failed");
            (jar, e).into_response()
        }
    }
}

async fn complete_sign_in(
    state: &AppState,
    session_id: SessionId,
    query: CallbackQuery,
) -> Result<(), AppError> {
    if let Some(error) = query.error {
        warn!(error = %error, "identity platform returned an authorization error");
        return Err(AppError::AuthorizationDenied {
            error,
            error_description: query.error_description,
        });
    }
    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or(AppError::MissingCode)?;

    let user = state
        .public_client
        .acquire_token_by_code(&AuthorizationCodeRequest {
            code,
            scopes: graph_scopes(),
            redirect_uri: state.redirect_uri.to_string(),
        })
        .await;
    metrics::record_token_exchange(Flow::AuthorizationCode, user.is_ok());
    let user = user.map_err(AppError::UserTokenExchange)?;
    state
        .sessions
        .set_user_token(&session_id, Secret::new(user.access_token))
        .await;

    let app = state
        .confidential_client
        .acquire_token_by_client_credential(&ClientCredentialRequest {
            scopes: graph_scopes(),
        })
        .await;
    metrics::record_token_exchange(Flow::ClientCredentials, app.is_ok());
    let app = app.map_err(AppError::AppTokenExchange)?;
    state
        .sessions
        .set_app_token(&session_id, Secret::new(app.access_token))
        .await;

    Ok(())
}
