//! Webhook reconciliation: turn one storefront event into the matching set of
//! Salesforce records.
//!
//! Every keyed entity is looked up before it is created, so a redelivered
//! webhook converges instead of duplicating records. Child records are created
//! one at a time and the first failure aborts the rest of the delivery.

pub mod lookups;
pub mod records;
pub mod upserts;

use std::fmt;

use chrono::Utc;

use crate::error::{AppError, Result, msg};
use crate::salesforce::{RecordApi, SObject};
use crate::shopify::Topic;
use crate::shopify::payloads::{CustomerPayload, OrderPayload, TransactionPayload};

use records::OrderLine;

/// A parsed webhook that has sync work attached to it.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    CustomerCreated(CustomerPayload),
    OrderCreated(Box<OrderPayload>),
    TransactionCreated(TransactionPayload),
}

impl SyncEvent {
    /// Decode the body for a topic. Returns `None` for topics that are only
    /// acknowledged.
    pub fn parse(topic: Topic, body: &[u8]) -> Result<Option<Self>> {
        let event = match topic {
            Topic::CustomersCreate => SyncEvent::CustomerCreated(serde_json::from_slice(body)?),
            Topic::OrdersCreate => {
                let order: OrderPayload = serde_json::from_slice(body)?;
                if order.customer.is_none() {
                    return Err(AppError::BadRequest(msg::ORDER_WITHOUT_CUSTOMER.into()));
                }
                SyncEvent::OrderCreated(Box::new(order))
            }
            Topic::OrderTransactionsCreate => {
                SyncEvent::TransactionCreated(serde_json::from_slice(body)?)
            }
            Topic::CustomersDataRequest
            | Topic::CustomersRedact
            | Topic::ShopRedact
            | Topic::ProductsCreate => return Ok(None),
        };
        Ok(Some(event))
    }

    /// Reason to skip the event before any credentials are resolved.
    pub fn skip_reason(&self) -> Option<&'static str> {
        match self {
            SyncEvent::TransactionCreated(txn) if !txn.is_authorization() => {
                Some("Transaction is not an authorization")
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Created { object: SObject, id: String },
    AlreadyExists { object: SObject, id: String },
    Ignored(&'static str),
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncOutcome::Created { object, id } => write!(f, "{} created: {}", object, id),
            SyncOutcome::AlreadyExists { object, id } => {
                write!(f, "{} already exists: {}", object, id)
            }
            SyncOutcome::Ignored(reason) => write!(f, "ignored: {}", reason),
        }
    }
}

/// Runs the three webhook workflows for one shop against a record backend.
pub struct Reconciler<R> {
    api: R,
    store_name: String,
    pricebook_name: String,
}

impl<R: RecordApi> Reconciler<R> {
    pub fn new(api: R, shop: &str, pricebook_name: &str) -> Self {
        Self {
            api,
            store_name: crate::shopify::store_name(shop).to_string(),
            pricebook_name: pricebook_name.to_string(),
        }
    }

    pub fn api(&self) -> &R {
        &self.api
    }

    pub fn store_name(&self) -> &str {
        &self.store_name
    }

    pub async fn apply(&self, event: &SyncEvent) -> Result<SyncOutcome> {
        if let Some(reason) = event.skip_reason() {
            return Ok(SyncOutcome::Ignored(reason));
        }

        match event {
            SyncEvent::CustomerCreated(customer) => self.sync_customer(customer).await,
            SyncEvent::OrderCreated(order) => self.sync_order(order).await,
            SyncEvent::TransactionCreated(txn) => self.sync_order_transaction(txn).await,
        }
    }

    /// customers/create: one person account per customer id.
    pub async fn sync_customer(&self, customer: &CustomerPayload) -> Result<SyncOutcome> {
        if let Some(id) = lookups::find_account(&self.api, customer.id).await? {
            tracing::info!("Account for customer {} already exists: {}", customer.id, id);
            return Ok(SyncOutcome::AlreadyExists {
                object: SObject::Account,
                id,
            });
        }

        let id = upserts::create_account(&self.api, customer).await?;
        Ok(SyncOutcome::Created {
            object: SObject::Account,
            id,
        })
    }

    /// order_transactions/create: record the card, the authorization and the
    /// gateway interaction. The order webhook links them to the account later.
    pub async fn sync_order_transaction(&self, txn: &TransactionPayload) -> Result<SyncOutcome> {
        if !txn.is_authorization() {
            return Ok(SyncOutcome::Ignored("Transaction is not an authorization"));
        }

        if let Some(existing) =
            lookups::find_payment_authorization(&self.api, txn.order_id, &self.store_name).await?
        {
            tracing::info!(
                "Payment authorization for order {} already exists: {}",
                txn.order_id,
                existing.id
            );
            return Ok(SyncOutcome::AlreadyExists {
                object: SObject::PaymentAuthorization,
                id: existing.id,
            });
        }

        let payment_method_id = upserts::create_payment_method(&self.api, txn).await?;
        let authorization_id = upserts::create_payment_authorization(
            &self.api,
            &payment_method_id,
            txn,
            &self.store_name,
        )
        .await?;
        upserts::create_payment_gateway_log(&self.api, &authorization_id, txn).await?;

        Ok(SyncOutcome::Created {
            object: SObject::PaymentAuthorization,
            id: authorization_id,
        })
    }

    /// orders/create: account, order, line items with their tax and discount
    /// lines, shipping lines, payment group, then the payment patches.
    pub async fn sync_order(&self, order: &OrderPayload) -> Result<SyncOutcome> {
        let Some(customer) = order.customer.as_ref() else {
            return Err(AppError::BadRequest(msg::ORDER_WITHOUT_CUSTOMER.into()));
        };

        if let Some(id) = lookups::find_order(&self.api, order.id, &self.store_name).await? {
            // A redelivery after a failed sync lands here too; missing lines are not backfilled.
            tracing::warn!(
                "Order {} already exists: {}; skipping, it may be incomplete if an earlier sync failed",
                order.id,
                id
            );
            return Ok(SyncOutcome::AlreadyExists {
                object: SObject::Order,
                id,
            });
        }

        let account_id = self.ensure_account(customer).await?;

        let pricebook_id = lookups::find_pricebook(&self.api, &self.pricebook_name).await?;
        if pricebook_id.is_none() {
            tracing::warn!("Active price book {:?} not found", self.pricebook_name);
        }

        let today = Utc::now().date_naive();
        let order_id = upserts::create_order(
            &self.api,
            order,
            &account_id,
            pricebook_id.as_deref(),
            &self.store_name,
            today,
        )
        .await?;

        let lines = order
            .line_items
            .iter()
            .map(OrderLine::from)
            .chain(order.shipping_lines.iter().map(OrderLine::from));
        for line in lines {
            upserts::create_order_item(&self.api, &order_id, pricebook_id.as_deref(), &line, today)
                .await?;
        }

        let payment_group_id = upserts::create_payment_group(&self.api, &order_id).await?;
        self.complete_payment(order, &account_id, &payment_group_id)
            .await?;

        Ok(SyncOutcome::Created {
            object: SObject::Order,
            id: order_id,
        })
    }

    async fn ensure_account(&self, customer: &CustomerPayload) -> Result<String> {
        match lookups::find_account(&self.api, customer.id).await? {
            Some(id) => Ok(id),
            None => upserts::create_account(&self.api, customer).await,
        }
    }

    /// Second phase of the payment records created by the transaction webhook.
    async fn complete_payment(
        &self,
        order: &OrderPayload,
        account_id: &str,
        payment_group_id: &str,
    ) -> Result<()> {
        let Some(authorization) =
            lookups::find_payment_authorization(&self.api, order.id, &self.store_name).await?
        else {
            tracing::info!(
                "No payment authorization for order {} yet; skipping payment patches",
                order.id
            );
            return Ok(());
        };

        upserts::link_payment_authorization(
            &self.api,
            &authorization.id,
            account_id,
            payment_group_id,
        )
        .await?;

        let Some(payment_method_id) = authorization.payment_method_id.as_deref() else {
            tracing::info!(
                "Payment authorization {} has no payment method; skipping activation",
                authorization.id
            );
            return Ok(());
        };

        let Some(method) = lookups::find_payment_method(&self.api, payment_method_id).await? else {
            tracing::warn!("Card payment method {} not found", payment_method_id);
            return Ok(());
        };

        upserts::activate_payment_method(
            &self.api,
            &method.id,
            account_id,
            order.billing_address.as_ref(),
        )
        .await
    }
}
