use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

use crate::db::AppState;
use crate::error::{AppError, Result};
use crate::util::extract_bearer_token;

/// Guard for the /api admin endpoints. They do not exist (404) unless an admin
/// key is configured; otherwise the bearer token must match it.
pub async fn require_admin_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response> {
    let Some(expected) = state.admin_api_key.as_deref() else {
        return Err(AppError::NotFound(request.uri().path().to_string()));
    };

    let token = extract_bearer_token(request.headers()).ok_or(AppError::Unauthorized)?;

    if !keys_match(expected, token) {
        tracing::warn!("Rejected admin request with invalid API key");
        return Err(AppError::Unauthorized);
    }

    Ok(next.run(request).await)
}

fn keys_match(expected: &str, provided: &str) -> bool {
    let expected = expected.as_bytes();
    let provided = provided.as_bytes();
    expected.len() == provided.len() && bool::from(expected.ct_eq(provided))
}
