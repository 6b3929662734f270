use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use strum::{AsRefStr, EnumString};
use subtle::ConstantTimeEq;

use crate::error::{AppError, Result, msg};

type HmacSha256 = Hmac<Sha256>;

pub const TOPIC_HEADER: &str = "x-shopify-topic";
pub const SHOP_HEADER: &str = "x-shopify-shop-domain";
pub const HMAC_HEADER: &str = "x-shopify-hmac-sha256";
pub const WEBHOOK_ID_HEADER: &str = "x-shopify-webhook-id";

/// Webhook topics the app subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Topic {
    CustomersCreate,
    OrdersCreate,
    OrderTransactionsCreate,
    CustomersDataRequest,
    CustomersRedact,
    ShopRedact,
    ProductsCreate,
}

impl Topic {
    /// Parse either the header spelling (`orders/create`) or the registry
    /// spelling (`ORDERS_CREATE`).
    pub fn parse(raw: &str) -> Option<Self> {
        raw.trim().to_ascii_uppercase().replace('/', "_").parse().ok()
    }
}

/// Verify `X-Shopify-Hmac-Sha256`: base64 HMAC-SHA256 of the raw body keyed by
/// the app secret. An empty secret never verifies.
pub fn verify_webhook_hmac(secret: &str, payload: &[u8], signature: &str) -> Result<bool> {
    if secret.is_empty() {
        return Ok(false);
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| AppError::Internal(msg::INVALID_WEBHOOK_SECRET.into()))?;
    mac.update(payload);
    let expected = BASE64.encode(mac.finalize().into_bytes());

    let expected_bytes = expected.as_bytes();
    let provided_bytes = signature.trim().as_bytes();

    // Length is not secret: always 44 base64 chars for SHA-256
    if expected_bytes.len() != provided_bytes.len() {
        return Ok(false);
    }

    Ok(expected_bytes.ct_eq(provided_bytes).into())
}
