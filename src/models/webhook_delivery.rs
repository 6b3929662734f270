use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeliveryStatus {
    /// Claimed, sync in progress. Reclaimable once the lease has expired.
    Processing,
    Completed,
}

/// Ledger row for one webhook delivery, keyed by the platform's webhook id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookDelivery {
    pub webhook_id: String,
    pub topic: String,
    pub shop: String,
    pub status: DeliveryStatus,
    pub received_at: i64,
    pub completed_at: Option<i64>,
}
