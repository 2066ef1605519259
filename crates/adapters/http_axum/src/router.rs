//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use growhub_app::ports::AuditLog;

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// The API is mounted under `/api` and again at the root, where the
/// companion firmware expects it. Includes a [`TraceLayer`] that logs each
/// HTTP request/response at the `DEBUG` level using the `tracing` ecosystem.
pub fn build<L>(state: AppState<L>) -> Router
where
    L: AuditLog + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", crate::api::routes())
        .merge(crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
