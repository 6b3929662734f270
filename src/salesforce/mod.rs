//! Salesforce side of the sync: the sObject names we touch, the SOQL builder,
//! the record client and the client-credentials token exchange.

mod auth;
mod client;
pub mod soql;

pub use auth::*;
pub use client::*;
pub use soql::Soql;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// sObject types read or written by the sync. The string form is the API name.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
pub enum SObject {
    Account,
    RecordType,
    Pricebook2,
    PricebookEntry,
    Product2,
    Order,
    OrderItem,
    OrderItemTaxLineItem,
    OrderItemAdjustmentLineItem,
    CardPaymentMethod,
    PaymentAuthorization,
    PaymentGatewayLog,
    PaymentGroup,
}
