//! Webhook payload shapes, limited to the fields the sync reads.
//!
//! Shopify sends money as decimal strings ("10.00") and some gateway receipt
//! values as either strings or numbers, so those fields go through the lenient
//! deserializers in [`de`].

use serde::Deserialize;

/// `customers/create`, and the `customer` object embedded in an order.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomerPayload {
    pub id: u64,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub address1: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub province_code: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
}

/// `orders/create`
#[derive(Debug, Clone, Deserialize)]
pub struct OrderPayload {
    pub id: u64,
    #[serde(default)]
    pub order_number: Option<u64>,
    #[serde(default)]
    pub customer: Option<CustomerPayload>,
    #[serde(default)]
    pub billing_address: Option<Address>,
    #[serde(default)]
    pub shipping_address: Option<Address>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub shipping_lines: Vec<ShippingLine>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LineItem {
    pub id: u64,
    #[serde(default)]
    pub sku: Option<String>,
    pub quantity: u32,
    #[serde(deserialize_with = "de::decimal")]
    pub price: f64,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "de::decimal")]
    pub total_discount: f64,
    #[serde(default)]
    pub tax_lines: Vec<TaxLine>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShippingLine {
    pub id: u64,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(deserialize_with = "de::decimal")]
    pub price: f64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tax_lines: Vec<TaxLine>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaxLine {
    #[serde(deserialize_with = "de::decimal")]
    pub price: f64,
    #[serde(deserialize_with = "de::decimal")]
    pub rate: f64,
    #[serde(default)]
    pub title: String,
}

/// `order_transactions/create`
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionPayload {
    pub id: u64,
    pub order_id: u64,
    pub kind: String,
    #[serde(default)]
    pub gateway: Option<String>,
    #[serde(deserialize_with = "de::decimal")]
    pub amount: f64,
    #[serde(default)]
    pub payment_details: Option<PaymentDetails>,
    #[serde(default, deserialize_with = "de::null_default")]
    pub receipt: Receipt,
}

impl TransactionPayload {
    pub fn is_authorization(&self) -> bool {
        self.kind == "authorization"
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentDetails {
    #[serde(default)]
    pub credit_card_name: Option<String>,
    /// Masked by the platform, e.g. "•••• •••• •••• 4242".
    #[serde(default)]
    pub credit_card_number: Option<String>,
    #[serde(default)]
    pub credit_card_company: Option<String>,
    #[serde(default)]
    pub credit_card_expiration_month: Option<u32>,
    #[serde(default)]
    pub credit_card_expiration_year: Option<u32>,
}

/// Gateway receipt. Keys follow the gateway's own casing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Receipt {
    #[serde(rename = "requestID", default, deserialize_with = "de::opt_text")]
    pub request_id: Option<String>,
    #[serde(rename = "authorizationCode", default, deserialize_with = "de::opt_text")]
    pub authorization_code: Option<String>,
    #[serde(rename = "reasonCode", default, deserialize_with = "de::opt_text")]
    pub reason_code: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub message: Option<String>,
    #[serde(rename = "avsCode", default, deserialize_with = "de::opt_text")]
    pub avs_code: Option<String>,
}

pub(crate) mod de {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Decimal from a JSON string or number; `null` reads as zero.
    pub fn decimal<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        match Value::deserialize(d)? {
            Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| D::Error::custom("decimal out of range")),
            Value::String(s) => s
                .trim()
                .parse()
                .map_err(|_| D::Error::custom(format!("invalid decimal: {:?}", s))),
            Value::Null => Ok(0.0),
            other => Err(D::Error::custom(format!("expected decimal, got {}", other))),
        }
    }

    /// `T::default()` for a missing or `null` value.
    pub fn null_default<'de, D, T>(d: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
    }

    /// Optional text from a JSON string, number or bool.
    pub fn opt_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        match Option::<Value>::deserialize(d)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(Value::Bool(b)) => Ok(Some(b.to_string())),
            Some(other) => Err(D::Error::custom(format!("expected text, got {}", other))),
        }
    }
}
