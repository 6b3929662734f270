pub mod shopify;

pub use shopify::handle_shopify_webhook;

use axum::{Router, routing::post};

use crate::db::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/webhooks", post(handle_shopify_webhook))
}
