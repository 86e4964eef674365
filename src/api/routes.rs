use crate::api::api_error::APIError;
use crate::api::model::UpdateQuery;
use crate::api::server::AppState;
use crate::auth::{normalize_hostname, AuthFailure, Credentials, UserRecord};
use crate::config::{HEALTH_TIMEOUT, UPDATE_TIMEOUT};
use crate::error::Error;
use crate::zone::resolve_zone;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tokio::time::{timeout, timeout_at, Instant};
use tower_http::trace::TraceLayer;

pub(super) fn new(state: AppState) -> Router {
    Router::new()
        .route("/v3/update", get(update))
        .route("/health", get(health_check))
        .route("/ready", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Response {
    let err = match timeout(HEALTH_TIMEOUT, state.provider.list_zones()).await {
        Ok(Ok(_)) => return (StatusCode::OK, "ok").into_response(),
        Ok(Err(err)) => err,
        Err(_) => Error::Timeout(HEALTH_TIMEOUT),
    };
    tracing::warn!("health check failed: {err}");
    (StatusCode::SERVICE_UNAVAILABLE, format!("unhealthy: {err}")).into_response()
}

async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<String, APIError> {
    let deadline = Instant::now() + UPDATE_TIMEOUT;

    let credentials = Credentials::from_headers(&headers).ok_or(Error::MissingCredentials)?;
    let user = authenticate(&state, credentials).await?;

    let query = UpdateQuery::from_pairs(pairs);
    if query.hostname.is_empty() {
        return Err(Error::NotFqdn.into());
    }
    if !user.is_authorized(&query.hostname) {
        return Err(Error::HostForbidden {
            username: user.username.clone(),
            hostname: query.hostname,
        }
        .into());
    }
    let hostname = normalize_hostname(&query.hostname);

    let ips = query.addresses()?;

    let found = timeout_at(deadline, resolve_zone(state.provider.as_ref(), &hostname))
        .await
        .map_err(|_| Error::ZoneListing(Box::new(Error::Timeout(UPDATE_TIMEOUT))))??;

    let records = timeout_at(
        deadline,
        state
            .executor
            .apply(state.provider.as_ref(), &found.zone, &found.record_name, &ips),
    )
    .await
    .map_err(|_| Error::Timeout(UPDATE_TIMEOUT))??;

    tracing::info!(
        username = %user.username,
        %hostname,
        zone = %found.zone,
        record = %found.record_name,
        ips = ?ips,
        records = records.len(),
        "successful update"
    );
    Ok(format!("good {}", query.myip))
}

/// Run the password check on the blocking pool, it is deliberately expensive.
async fn authenticate(state: &AppState, credentials: Credentials) -> Result<Arc<UserRecord>, Error> {
    let authenticator = Arc::clone(&state.authenticator);
    let Credentials { username, password } = credentials;
    let user = username.clone();
    tokio::task::spawn_blocking(move || authenticator.authenticate(&user, &password))
        .await
        .unwrap_or_else(|err| Err(AuthFailure::Verification(err.to_string())))
        .map_err(|reason| Error::AuthFailed { username, reason })
}
