mod metaobjects;

pub use metaobjects::*;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::db::AppState;
use crate::middleware::require_admin_key;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/metaobjects", get(list_metaobjects))
        .route("/api/metaobjectDefinitions", get(list_metaobject_definitions))
        .route("/api/graphql", post(create_metaobject).patch(update_metaobject))
        .layer(middleware::from_fn_with_state(state, require_admin_key))
}
