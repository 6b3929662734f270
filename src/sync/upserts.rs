use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::salesforce::{RecordApi, SObject};
use crate::shopify::payloads::{Address, CustomerPayload, OrderPayload, TaxLine, TransactionPayload};

use super::lookups;
use super::records::*;

async fn create<R: RecordApi, T: Serialize>(api: &R, object: SObject, fields: &T) -> Result<String> {
    api.create(object, serde_json::to_value(fields)?).await
}

async fn update<R: RecordApi, T: Serialize>(
    api: &R,
    object: SObject,
    id: &str,
    fields: &T,
) -> Result<()> {
    api.update(object, id, serde_json::to_value(fields)?).await?;
    Ok(())
}

/// Create a person account for a storefront customer.
pub async fn create_account<R: RecordApi>(api: &R, customer: &CustomerPayload) -> Result<String> {
    let record_type_id = lookups::find_person_account_record_type(api).await?;
    if record_type_id.is_none() {
        tracing::warn!("PersonAccount record type not found; creating account without it");
    }
    create(api, SObject::Account, &AccountFields::new(customer, record_type_id)).await
}

pub async fn create_order<R: RecordApi>(
    api: &R,
    order: &OrderPayload,
    account_id: &str,
    pricebook_id: Option<&str>,
    store_name: &str,
    today: NaiveDate,
) -> Result<String> {
    let fields = OrderFields::new(order, account_id, pricebook_id, store_name, today);
    create(api, SObject::Order, &fields).await
}

/// Create one OrderItem, then its tax lines and discount adjustment.
/// Returns the OrderItem id.
pub async fn create_order_item<R: RecordApi>(
    api: &R,
    order_id: &str,
    pricebook_id: Option<&str>,
    line: &OrderLine<'_>,
    today: NaiveDate,
) -> Result<String> {
    let (product_id, pricebook_entry_id) = match line.sku {
        Some(sku) => {
            let product_id = lookups::find_product(api, sku).await?;
            let entry_id = match pricebook_id {
                Some(pricebook_id) => lookups::find_pricebook_entry(api, sku, pricebook_id).await?,
                None => None,
            };
            (product_id, entry_id)
        }
        None => (None, None),
    };

    if product_id.is_none() || pricebook_entry_id.is_none() {
        tracing::warn!(
            "Line {} ({:?}): product or price book entry not found for SKU {:?}",
            line.id,
            line.kind,
            line.sku
        );
    }

    let fields = OrderItemFields::new(order_id, line, product_id, pricebook_entry_id);
    let order_item_id = create(api, SObject::OrderItem, &fields).await?;

    for tax_line in line.tax_lines {
        create_tax_line_item(api, &order_item_id, tax_line, today).await?;
    }

    if line.has_discount() {
        create_adjustment_line_item(api, &order_item_id, line).await?;
    }

    Ok(order_item_id)
}

pub async fn create_tax_line_item<R: RecordApi>(
    api: &R,
    order_item_id: &str,
    tax_line: &TaxLine,
    today: NaiveDate,
) -> Result<String> {
    let fields = TaxLineItemFields::new(order_item_id, tax_line, today);
    create(api, SObject::OrderItemTaxLineItem, &fields).await
}

pub async fn create_adjustment_line_item<R: RecordApi>(
    api: &R,
    order_item_id: &str,
    line: &OrderLine<'_>,
) -> Result<String> {
    let fields = AdjustmentLineItemFields::new(order_item_id, line);
    create(api, SObject::OrderItemAdjustmentLineItem, &fields).await
}

pub async fn create_payment_method<R: RecordApi>(api: &R, txn: &TransactionPayload) -> Result<String> {
    create(api, SObject::CardPaymentMethod, &CardPaymentMethodFields::new(txn)).await
}

pub async fn create_payment_authorization<R: RecordApi>(
    api: &R,
    payment_method_id: &str,
    txn: &TransactionPayload,
    store_name: &str,
) -> Result<String> {
    let fields = PaymentAuthorizationFields::new(txn, payment_method_id, store_name, Utc::now());
    create(api, SObject::PaymentAuthorization, &fields).await
}

pub async fn create_payment_gateway_log<R: RecordApi>(
    api: &R,
    payment_authorization_id: &str,
    txn: &TransactionPayload,
) -> Result<String> {
    let fields = PaymentGatewayLogFields::new(txn, payment_authorization_id, Utc::now());
    create(api, SObject::PaymentGatewayLog, &fields).await
}

pub async fn create_payment_group<R: RecordApi>(api: &R, order_id: &str) -> Result<String> {
    let fields = PaymentGroupFields {
        source_object_id: order_id.to_string(),
    };
    create(api, SObject::PaymentGroup, &fields).await
}

/// Attach the account and payment group to an authorization created earlier
/// by the transaction webhook.
pub async fn link_payment_authorization<R: RecordApi>(
    api: &R,
    payment_authorization_id: &str,
    account_id: &str,
    payment_group_id: &str,
) -> Result<()> {
    let fields = PaymentAuthorizationLink {
        account_id: account_id.to_string(),
        payment_group_id: payment_group_id.to_string(),
    };
    update(api, SObject::PaymentAuthorization, payment_authorization_id, &fields).await
}

pub async fn activate_payment_method<R: RecordApi>(
    api: &R,
    payment_method_id: &str,
    account_id: &str,
    billing: Option<&Address>,
) -> Result<()> {
    let fields = PaymentMethodActivation::new(account_id, billing);
    update(api, SObject::CardPaymentMethod, payment_method_id, &fields).await
}
