use serde::{Deserialize, Serialize};

/// A stored storefront session. Webhook processing only reads offline
/// sessions, which carry the shop's long-lived admin API token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopSession {
    pub id: String,
    pub shop: String,
    pub is_online: bool,
    pub scope: Option<String>,
    #[serde(skip_serializing)]
    pub access_token: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ShopSession {
    /// Session id the storefront app framework assigns to a shop's offline session.
    pub fn offline_id(shop: &str) -> String {
        format!("offline_{}", shop)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateShopSession {
    pub shop: String,
    pub access_token: String,
    #[serde(default)]
    pub scope: Option<String>,
}
