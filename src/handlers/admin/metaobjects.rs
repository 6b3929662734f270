//! Metaobject endpoints used by the embedded settings page to read and edit
//! the shop's Salesforce credentials.

use axum::extract::State;
use serde::Deserialize;
use serde_json::Value;

use crate::credentials;
use crate::db::AppState;
use crate::error::{AppError, Result, msg};
use crate::extractors::{Json, Query};
use crate::shopify::{ShopifyAdminClient, is_valid_shop_domain};

#[derive(Debug, Deserialize)]
pub struct ShopQuery {
    pub shop: Option<String>,
}

/// GraphQL document forwarded verbatim to the shop's admin API.
#[derive(Debug, Deserialize)]
pub struct GraphqlRequest {
    pub query: String,
    #[serde(default)]
    pub variables: Option<Value>,
}

fn shop_client(state: &AppState, query: &ShopQuery) -> Result<ShopifyAdminClient> {
    let shop = query
        .shop
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest(msg::MISSING_SHOP_PARAM.into()))?;

    if !is_valid_shop_domain(shop) {
        return Err(AppError::BadRequest(msg::INVALID_SHOP_DOMAIN.into()));
    }

    credentials::admin_client(state, shop)
}

pub async fn list_metaobjects(
    State(state): State<AppState>,
    Query(query): Query<ShopQuery>,
) -> Result<Json<Value>> {
    let client = shop_client(&state, &query)?;
    let data = client
        .metaobjects(&state.credentials_metaobject_type)
        .await?;
    Ok(Json(data))
}

pub async fn list_metaobject_definitions(
    State(state): State<AppState>,
    Query(query): Query<ShopQuery>,
) -> Result<Json<Value>> {
    let client = shop_client(&state, &query)?;
    Ok(Json(client.metaobject_definitions().await?))
}

pub async fn create_metaobject(
    State(state): State<AppState>,
    Query(query): Query<ShopQuery>,
    Json(request): Json<GraphqlRequest>,
) -> Result<Json<Value>> {
    let client = shop_client(&state, &query)?;
    let data = client
        .graphql(&request.query, request.variables.as_ref())
        .await?;
    tracing::info!("Metaobject created via {}", client.endpoint());
    Ok(Json(data))
}

pub async fn update_metaobject(
    State(state): State<AppState>,
    Query(query): Query<ShopQuery>,
    Json(request): Json<GraphqlRequest>,
) -> Result<Json<Value>> {
    let client = shop_client(&state, &query)?;
    let data = client
        .graphql(&request.query, request.variables.as_ref())
        .await?;
    tracing::info!("Metaobject updated via {}", client.endpoint());
    Ok(Json(data))
}
