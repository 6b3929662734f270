pub mod admin;
pub mod webhooks;

use axum::Router;

use crate::db::AppState;

/// Every route the service exposes, without the trace layer or state.
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(webhooks::router())
        .merge(admin::router(state))
}
