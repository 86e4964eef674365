use crate::api::routes;
use crate::auth::Authenticator;
use crate::provider::DynProvider;
use crate::update::UpdateExecutor;
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// Everything a request handler needs. Built once at startup and only read afterwards.
#[derive(Clone)]
pub struct AppState {
    pub authenticator: Arc<Authenticator>,
    pub provider: DynProvider,
    pub executor: UpdateExecutor,
}

impl AppState {
    #[must_use]
    pub fn new(authenticator: Authenticator, provider: DynProvider, ttl: Duration) -> Self {
        Self {
            authenticator: Arc::new(authenticator),
            provider,
            executor: UpdateExecutor::new(ttl),
        }
    }
}

/// The dyncrab HTTP routes, ready to be served or driven directly in tests.
pub fn router(state: AppState) -> Router {
    routes::new(state)
}

/// Bind `addr` and serve until `shutdown` resolves, then finish in-flight requests.
///
/// # Errors
///
/// Returns a [`hyper::Error`] if `addr` can't be bound.
pub fn new(
    addr: SocketAddr,
    state: AppState,
    shutdown: impl Future<Output = ()>,
) -> hyper::Result<impl Future<Output = hyper::Result<()>>> {
    Ok(axum::Server::try_bind(&addr)?
        .serve(routes::new(state).into_make_service())
        .with_graceful_shutdown(shutdown))
}
