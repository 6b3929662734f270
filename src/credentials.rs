//! Per-shop credential resolution: offline session → credentials metaobject →
//! Salesforce access token.

use crate::db::{AppState, queries};
use crate::error::{AppError, Result};
use crate::salesforce::{AccessToken, SalesforceClient, SalesforceCredentials, exchange_client_credentials};
use crate::shopify::ShopifyAdminClient;

/// Admin GraphQL client authenticated with the shop's offline session token.
pub fn admin_client(state: &AppState, shop: &str) -> Result<ShopifyAdminClient> {
    // Connection is released before any await.
    let session = {
        let conn = state.db.get()?;
        queries::get_offline_session(&conn, shop)?
    }
    .ok_or_else(|| AppError::SessionNotFound(shop.to_string()))?;

    ShopifyAdminClient::new(
        state.http.clone(),
        &session.shop,
        &state.shopify_api_version,
        &session.access_token,
    )
}

pub async fn resolve_access_token(state: &AppState, shop: &str) -> Result<AccessToken> {
    let admin = admin_client(state, shop)?;

    let fields = admin
        .latest_metaobject_fields(&state.credentials_metaobject_type)
        .await?
        .ok_or_else(|| {
            AppError::MissingCredentials(format!(
                "no {} metaobject for {}",
                state.credentials_metaobject_type, shop
            ))
        })?;

    let credentials = SalesforceCredentials::from_fields(&fields)?;
    tracing::debug!("Exchanging client credentials for {} at {}", shop, credentials.instance_url);
    exchange_client_credentials(&state.http, &credentials).await
}

/// Record client for one delivery. Resolved once and reused for every call.
pub async fn salesforce_client(state: &AppState, shop: &str) -> Result<SalesforceClient> {
    let token = resolve_access_token(state, shop).await?;
    Ok(SalesforceClient::new(
        state.http.clone(),
        &token,
        &state.salesforce_api_version,
    ))
}
