//! Existence checks against Salesforce, one per entity type.
//!
//! Each lookup reads the first page of its query only. When more than one
//! record matches, the first is used and the duplicate is logged.

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::salesforce::{RecordApi, SObject, Soql};

const PERSON_ACCOUNT_RECORD_TYPE: &str = "PersonAccount";

#[derive(Debug, Clone, Deserialize)]
pub struct RecordRef {
    #[serde(rename = "Id")]
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PaymentAuthorizationRecord {
    pub id: String,
    #[serde(default)]
    pub payment_method_id: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub payment_group_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PaymentMethodRecord {
    pub id: String,
    #[serde(default)]
    pub account_id: Option<String>,
}

/// Run a query and decode its first record.
async fn first_match<R, T>(api: &R, soql: Soql) -> Result<Option<T>>
where
    R: RecordApi,
    T: DeserializeOwned,
{
    let Some(records) = api.query(&soql).await? else {
        return Ok(None);
    };

    if records.len() > 1 {
        tracing::warn!(
            "{} records match `{}`; using the first",
            records.len(),
            soql
        );
    }

    match records.into_iter().next() {
        Some(record) => Ok(Some(serde_json::from_value(record)?)),
        None => Ok(None),
    }
}

async fn first_id<R: RecordApi>(api: &R, soql: Soql) -> Result<Option<String>> {
    Ok(first_match::<R, RecordRef>(api, soql).await?.map(|r| r.id))
}

pub async fn find_person_account_record_type<R: RecordApi>(api: &R) -> Result<Option<String>> {
    let soql = Soql::select(SObject::RecordType, &["Id"])
        .where_eq("DeveloperName", PERSON_ACCOUNT_RECORD_TYPE)
        .limit(1);
    first_id(api, soql).await
}

pub async fn find_pricebook<R: RecordApi>(api: &R, name: &str) -> Result<Option<String>> {
    let soql = Soql::select(SObject::Pricebook2, &["Id", "Name", "IsActive"])
        .where_eq("Name", name)
        .where_eq("IsActive", true);
    first_id(api, soql).await
}

pub async fn find_account<R: RecordApi>(api: &R, customer_id: u64) -> Result<Option<String>> {
    let soql = Soql::select(SObject::Account, &["Id"])
        .where_eq("OMSQS_Shopify_Customer_Id__c", customer_id);
    first_id(api, soql).await
}

pub async fn find_product<R: RecordApi>(api: &R, sku: &str) -> Result<Option<String>> {
    let soql = Soql::select(SObject::Product2, &["Id", "Name", "StockKeepingUnit"])
        .where_eq("StockKeepingUnit", sku);
    first_id(api, soql).await
}

pub async fn find_pricebook_entry<R: RecordApi>(
    api: &R,
    sku: &str,
    pricebook_id: &str,
) -> Result<Option<String>> {
    let soql = Soql::select(
        SObject::PricebookEntry,
        &["Id", "Name", "ProductCode", "Pricebook2Id", "IsActive"],
    )
    .where_eq("ProductCode", sku)
    .where_eq("Pricebook2Id", pricebook_id)
    .where_eq("IsActive", true)
    .limit(1);
    first_id(api, soql).await
}

pub async fn find_order<R: RecordApi>(
    api: &R,
    order_id: u64,
    store_name: &str,
) -> Result<Option<String>> {
    let soql = Soql::select(
        SObject::Order,
        &["Id", "OMSQS_Shopify_Id__c", "OMSQS_Shopify_Store_Name__c"],
    )
    .where_eq("OMSQS_Shopify_Id__c", order_id)
    .where_eq("OMSQS_Shopify_Store_Name__c", store_name);
    first_id(api, soql).await
}

pub async fn find_payment_authorization<R: RecordApi>(
    api: &R,
    order_id: u64,
    store_name: &str,
) -> Result<Option<PaymentAuthorizationRecord>> {
    let soql = Soql::select(
        SObject::PaymentAuthorization,
        &[
            "Id",
            "OMSQS_Shopify_Order_Id__c",
            "OMSQS_Shopify_Store_Name__c",
            "PaymentMethodId",
            "AccountId",
            "PaymentGroupId",
        ],
    )
    .where_eq("OMSQS_Shopify_Order_Id__c", order_id)
    .where_eq("OMSQS_Shopify_Store_Name__c", store_name);
    first_match(api, soql).await
}

pub async fn find_payment_method<R: RecordApi>(
    api: &R,
    payment_method_id: &str,
) -> Result<Option<PaymentMethodRecord>> {
    let soql = Soql::select(
        SObject::CardPaymentMethod,
        &[
            "Id",
            "AccountId",
            "PaymentMethodStreet",
            "PaymentMethodCity",
            "PaymentMethodStateCode",
            "PaymentMethodPostalCode",
            "PaymentMethodCountryCode",
        ],
    )
    .where_eq("Id", payment_method_id);
    first_match(api, soql).await
}
