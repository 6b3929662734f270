use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// User-facing error messages shared between handlers and the sync layer.
pub mod msg {
    pub const MISSING_TOPIC_HEADER: &str = "Missing X-Shopify-Topic header";
    pub const MISSING_SHOP_HEADER: &str = "Missing X-Shopify-Shop-Domain header";
    pub const MISSING_HMAC_HEADER: &str = "Missing X-Shopify-Hmac-Sha256 header";
    pub const MISSING_WEBHOOK_ID_HEADER: &str = "Missing X-Shopify-Webhook-Id header";
    pub const INVALID_HEADER_VALUE: &str = "Invalid header value";
    pub const INVALID_WEBHOOK_SECRET: &str = "Invalid webhook secret";
    pub const ORDER_WITHOUT_CUSTOMER: &str = "Order payload has no customer";
    pub const MISSING_SHOP_PARAM: &str = "Missing shop query parameter";
    pub const INVALID_SHOP_DOMAIN: &str = "Invalid shop domain";
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No offline session stored for shop {0}")]
    SessionNotFound(String),

    #[error("Salesforce credentials unavailable: {0}")]
    MissingCredentials(String),

    #[error("Shopify API error: {0}")]
    Shopify(String),

    #[error("Salesforce {object} request failed with status {status}: {body}")]
    Upstream {
        object: String,
        status: u16,
        body: String,
    },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// True for failures that a webhook redelivery cannot fix: the shop has no
    /// stored session or no usable Salesforce credentials.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            AppError::SessionNotFound(_) | AppError::MissingCredentials(_)
        )
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Http(e.to_string())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not found", Some(msg.clone())),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "Bad request", Some(msg.clone())),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized", None),
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
            AppError::Json(e) => {
                tracing::error!("JSON error: {}", e);
                (StatusCode::BAD_REQUEST, "Invalid JSON", Some(e.to_string()))
            }
            AppError::SessionNotFound(shop) => (
                StatusCode::NOT_FOUND,
                "Session not found",
                Some(shop.clone()),
            ),
            AppError::MissingCredentials(msg)
            | AppError::Shopify(msg)
            | AppError::Http(msg) => {
                tracing::error!("Upstream error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Upstream request failed", Some(msg.clone()))
            }
            AppError::Upstream { object, status, body } => {
                tracing::error!("Salesforce {} error ({}): {}", object, status, body);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Upstream request failed",
                    Some(body.clone()),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
