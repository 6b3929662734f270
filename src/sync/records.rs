//! Field maps written to Salesforce, built from webhook payloads.
//!
//! Every builder here is pure; the upsert functions pair them with the record
//! client. Optional payload values are left out of the request body.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::shopify::payloads::{
    Address, CustomerPayload, LineItem, OrderPayload, ShippingLine, TaxLine, TransactionPayload,
};

/// Legacy state code still sent by the storefront, and its replacement.
const LEGACY_STATE_CODE: &str = "TS";
const CURRENT_STATE_CODE: &str = "TG";

const MASKED_CARD_PREFIX: &str = "************";

pub fn normalize_state_code(code: Option<&str>) -> Option<String> {
    code.map(|c| {
        if c == LEGACY_STATE_CODE {
            CURRENT_STATE_CODE.to_string()
        } else {
            c.to_string()
        }
    })
}

/// Salesforce picklist value for a gateway card brand, matched exactly as the
/// gateway spells it. None for brands the org has no picklist entry for.
pub fn card_type(brand: &str) -> Option<&'static str> {
    match brand {
        "Mastercard" => Some("Master Card"),
        "Visa" => Some("Visa"),
        _ => None,
    }
}

/// Last four characters of a masked card number ("•••• •••• •••• 4242" → "4242").
pub fn last_four(card_number: &str) -> String {
    let trimmed = card_number.trim_end();
    let tail: Vec<char> = trimmed.chars().rev().take(4).collect();
    tail.into_iter().rev().collect()
}

/// Salesforce dateTime literal with millisecond precision.
pub fn format_datetime(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

// ============ Account ============

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccountFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_type_id: Option<String>,
    #[serde(rename = "OMSQS_Shopify_Customer_Id__c")]
    pub shopify_customer_id: String,
}

impl AccountFields {
    pub fn new(customer: &CustomerPayload, record_type_id: Option<String>) -> Self {
        Self {
            first_name: customer.first_name.clone(),
            last_name: customer.last_name.clone(),
            person_email: customer.email.clone(),
            phone: customer.phone.clone(),
            record_type_id,
            shopify_customer_id: customer.id.to_string(),
        }
    }
}

// ============ Order ============

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrderFields {
    pub account_id: String,
    pub effective_date: NaiveDate,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pricebook2_id: Option<String>,
    #[serde(rename = "OMSQS_Shopify_Id__c")]
    pub shopify_id: String,
    #[serde(rename = "OMSQS_Shopify_Order_Number__c", skip_serializing_if = "Option::is_none")]
    pub shopify_order_number: Option<u64>,
    #[serde(rename = "OMSQS_Shipping_Method__c", skip_serializing_if = "Option::is_none")]
    pub shipping_method: Option<String>,
    #[serde(rename = "OMSQS_Shopify_Store_Name__c")]
    pub store_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_country_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_state_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_country_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_state_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_postal_code: Option<String>,
}

impl OrderFields {
    pub fn new(
        order: &OrderPayload,
        account_id: &str,
        pricebook_id: Option<&str>,
        store_name: &str,
        today: NaiveDate,
    ) -> Self {
        let billing = order.billing_address.clone().unwrap_or_default();
        let shipping = order.shipping_address.clone().unwrap_or_default();

        Self {
            account_id: account_id.to_string(),
            effective_date: today,
            status: "Draft",
            pricebook2_id: pricebook_id.map(str::to_string),
            shopify_id: order.id.to_string(),
            shopify_order_number: order.order_number,
            shipping_method: order.shipping_lines.first().and_then(|l| l.code.clone()),
            store_name: store_name.to_string(),
            billing_country_code: billing.country_code,
            billing_state_code: normalize_state_code(billing.province_code.as_deref()),
            billing_city: billing.city,
            billing_street: billing.address1,
            billing_postal_code: billing.zip,
            shipping_country_code: shipping.country_code,
            shipping_state_code: normalize_state_code(shipping.province_code.as_deref()),
            shipping_city: shipping.city,
            shipping_street: shipping.address1,
            shipping_postal_code: shipping.zip,
        }
    }
}

// ============ Order lines ============

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Product,
    Shipping,
}

impl LineKind {
    pub fn order_item_type(self) -> &'static str {
        match self {
            LineKind::Product => "Order Product",
            LineKind::Shipping => "Delivery Charge",
        }
    }
}

/// A product or shipping line, reduced to what an OrderItem needs.
#[derive(Debug, Clone, Copy)]
pub struct OrderLine<'a> {
    pub kind: LineKind,
    pub id: u64,
    /// Product SKU, or the shipping method code for shipping lines.
    pub sku: Option<&'a str>,
    pub quantity: u32,
    pub unit_price: f64,
    pub title: &'a str,
    pub total_discount: f64,
    pub tax_lines: &'a [TaxLine],
}

impl<'a> From<&'a LineItem> for OrderLine<'a> {
    fn from(item: &'a LineItem) -> Self {
        Self {
            kind: LineKind::Product,
            id: item.id,
            sku: item.sku.as_deref(),
            quantity: item.quantity,
            unit_price: item.price,
            title: &item.title,
            total_discount: item.total_discount,
            tax_lines: &item.tax_lines,
        }
    }
}

impl<'a> From<&'a ShippingLine> for OrderLine<'a> {
    fn from(line: &'a ShippingLine) -> Self {
        Self {
            kind: LineKind::Shipping,
            id: line.id,
            sku: line.code.as_deref(),
            quantity: 1,
            unit_price: line.price,
            title: &line.title,
            total_discount: 0.0,
            tax_lines: &line.tax_lines,
        }
    }
}

impl OrderLine<'_> {
    pub fn has_discount(&self) -> bool {
        self.total_discount > 0.0
    }

    pub fn adjustment_name(&self) -> String {
        format!("{} Adjustment", self.title)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrderItemFields {
    pub order_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product2_id: Option<String>,
    pub quantity: u32,
    pub unit_price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pricebook_entry_id: Option<String>,
    #[serde(rename = "Type")]
    pub item_type: &'static str,
    pub total_line_amount: f64,
    #[serde(rename = "OMSQS_Shopify_Line_Item_Id__c")]
    pub shopify_line_item_id: String,
}

impl OrderItemFields {
    pub fn new(
        order_id: &str,
        line: &OrderLine<'_>,
        product_id: Option<String>,
        pricebook_entry_id: Option<String>,
    ) -> Self {
        Self {
            order_id: order_id.to_string(),
            product2_id: product_id,
            quantity: line.quantity,
            unit_price: line.unit_price,
            pricebook_entry_id,
            item_type: line.kind.order_item_type(),
            total_line_amount: line.unit_price,
            shopify_line_item_id: line.id.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaxLineItemFields {
    pub amount: f64,
    pub name: String,
    pub order_item_id: String,
    pub rate: f64,
    pub tax_effective_date: NaiveDate,
    #[serde(rename = "Type")]
    pub tax_type: &'static str,
}

impl TaxLineItemFields {
    pub fn new(order_item_id: &str, tax_line: &TaxLine, today: NaiveDate) -> Self {
        Self {
            amount: tax_line.price,
            name: tax_line.title.clone(),
            order_item_id: order_item_id.to_string(),
            rate: tax_line.rate,
            tax_effective_date: today,
            tax_type: "Actual",
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AdjustmentLineItemFields {
    pub amount: f64,
    pub name: String,
    pub order_item_id: String,
}

impl AdjustmentLineItemFields {
    /// The discount is written as a negative adjustment.
    pub fn new(order_item_id: &str, line: &OrderLine<'_>) -> Self {
        Self {
            amount: -line.total_discount,
            name: line.adjustment_name(),
            order_item_id: order_item_id.to_string(),
        }
    }
}

// ============ Payments ============

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CardPaymentMethodFields {
    pub card_category: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_holder_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_last_four: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_card_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_month: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_year: Option<u32>,
    #[serde(rename = "OMSQS_Payment_Gateway__c", skip_serializing_if = "Option::is_none")]
    pub payment_gateway: Option<String>,
    pub status: &'static str,
    pub processing_mode: &'static str,
}

impl CardPaymentMethodFields {
    /// Created inactive; the order webhook activates it once the account exists.
    pub fn new(txn: &TransactionPayload) -> Self {
        let details = txn.payment_details.clone().unwrap_or_default();
        let last_four = details.credit_card_number.as_deref().map(last_four);

        let brand_type = details.credit_card_company.as_deref().and_then(|brand| {
            let mapped = card_type(brand);
            if mapped.is_none() {
                tracing::warn!(
                    "Unrecognized card brand {:?} on transaction {}; CardType left unset",
                    brand,
                    txn.id
                );
            }
            mapped
        });

        Self {
            card_category: "CreditCard",
            card_holder_name: details.credit_card_name,
            input_card_number: last_four
                .as_ref()
                .map(|digits| format!("{}{}", MASKED_CARD_PREFIX, digits)),
            card_last_four: last_four,
            card_type: brand_type,
            expiry_month: details.credit_card_expiration_month,
            expiry_year: details.credit_card_expiration_year,
            payment_gateway: txn.gateway.clone(),
            status: "InActive",
            processing_mode: "External",
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PaymentAuthorizationFields {
    pub amount: f64,
    pub status: &'static str,
    pub date: String,
    pub payment_method_id: String,
    pub processing_mode: &'static str,
    pub gateway_date: String,
    pub effective_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_ref_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_auth_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_result_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_result_code_description: Option<String>,
    #[serde(rename = "OMSQS_Payment_Gateway__c", skip_serializing_if = "Option::is_none")]
    pub payment_gateway: Option<String>,
    #[serde(rename = "OMSQS_Shopify_Transaction_Id__c")]
    pub shopify_transaction_id: String,
    #[serde(rename = "OMSQS_Shopify_Order_Id__c")]
    pub shopify_order_id: String,
    #[serde(rename = "OMSQS_Shopify_Store_Name__c")]
    pub store_name: String,
}

impl PaymentAuthorizationFields {
    pub fn new(
        txn: &TransactionPayload,
        payment_method_id: &str,
        store_name: &str,
        now: DateTime<Utc>,
    ) -> Self {
        let stamp = format_datetime(now);
        Self {
            amount: txn.amount,
            status: "Processed",
            date: stamp.clone(),
            payment_method_id: payment_method_id.to_string(),
            processing_mode: "External",
            gateway_date: stamp.clone(),
            effective_date: stamp,
            gateway_ref_number: txn.receipt.request_id.clone(),
            gateway_auth_code: txn.receipt.authorization_code.clone(),
            gateway_result_code: txn.receipt.reason_code.clone(),
            gateway_result_code_description: txn.receipt.message.clone(),
            payment_gateway: txn.gateway.clone(),
            shopify_transaction_id: txn.id.to_string(),
            shopify_order_id: txn.order_id.to_string(),
            store_name: store_name.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PaymentGatewayLogFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_auth_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_avs_code: Option<String>,
    pub interaction_type: &'static str,
    pub gateway_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_ref_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_result_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_result_code_description: Option<String>,
    pub interaction_status: &'static str,
    pub referenced_entity_id: String,
}

impl PaymentGatewayLogFields {
    pub fn new(txn: &TransactionPayload, payment_authorization_id: &str, now: DateTime<Utc>) -> Self {
        let receipt = &txn.receipt;
        Self {
            gateway_auth_code: receipt.authorization_code.clone(),
            gateway_avs_code: receipt.avs_code.clone(),
            interaction_type: "Authorization",
            gateway_date: format_datetime(now),
            gateway_message: receipt.message.clone(),
            gateway_ref_number: receipt.request_id.clone(),
            gateway_result_code: receipt.reason_code.clone(),
            // Request id here, not the message.
            gateway_result_code_description: receipt.request_id.clone(),
            interaction_status: "Success",
            referenced_entity_id: payment_authorization_id.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PaymentGroupFields {
    pub source_object_id: String,
}

/// Second phase of the payment authorization: attach account and payment group.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PaymentAuthorizationLink {
    pub account_id: String,
    pub payment_group_id: String,
}

/// Second phase of the card payment method: attach account, activate, and
/// record the billing address.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PaymentMethodActivation {
    pub account_id: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method_street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method_city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method_state_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method_postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method_country_code: Option<String>,
}

impl PaymentMethodActivation {
    pub fn new(account_id: &str, billing: Option<&Address>) -> Self {
        let billing = billing.cloned().unwrap_or_default();
        Self {
            account_id: account_id.to_string(),
            status: "Active",
            payment_method_street: billing.address1,
            payment_method_city: billing.city,
            payment_method_state_code: billing.province_code,
            payment_method_postal_code: billing.zip,
            payment_method_country_code: billing.country_code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    use crate::shopify::payloads::PaymentDetails;

    fn transaction(brand: &str) -> TransactionPayload {
        serde_json::from_value(json!({
            "id": 5001,
            "order_id": 4001,
            "kind": "authorization",
            "gateway": "cybersource",
            "amount": "25.00",
            "payment_details": {
                "credit_card_name": "Ada Lovelace",
                "credit_card_number": "•••• •••• •••• 4242",
                "credit_card_company": brand,
                "credit_card_expiration_month": 12,
                "credit_card_expiration_year": 2030
            },
            "receipt": {
                "requestID": "req-77",
                "authorizationCode": "831000",
                "reasonCode": "100",
                "message": "Approved",
                "avsCode": "Y"
            }
        }))
        .unwrap()
    }

    #[test]
    fn state_code_normalization() {
        assert_eq!(normalize_state_code(Some("TS")).as_deref(), Some("TG"));
        assert_eq!(normalize_state_code(Some("KA")).as_deref(), Some("KA"));
        assert_eq!(normalize_state_code(Some("ts")).as_deref(), Some("ts"));
        assert_eq!(normalize_state_code(None), None);
    }

    #[test]
    fn card_type_mapping() {
        assert_eq!(card_type("Mastercard"), Some("Master Card"));
        assert_eq!(card_type("Visa"), Some("Visa"));
        assert_eq!(card_type("American Express"), None);
        assert_eq!(card_type("visa"), None);
        assert_eq!(card_type("MASTERCARD"), None);
    }

    #[test]
    fn last_four_of_masked_numbers() {
        assert_eq!(last_four("•••• •••• •••• 4242"), "4242");
        assert_eq!(last_four("4111111111111111"), "1111");
        assert_eq!(last_four("42"), "42");
    }

    #[test]
    fn datetime_format_has_milliseconds() {
        let at = Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 5).unwrap();
        assert_eq!(format_datetime(at), "2026-10-18T09:30:05.000Z");
    }

    #[test]
    fn payment_method_masks_card_in_both_fields() {
        let fields = serde_json::to_value(CardPaymentMethodFields::new(&transaction("Visa"))).unwrap();
        assert_eq!(fields["CardLastFour"], "4242");
        assert_eq!(fields["InputCardNumber"], "************4242");
        assert_eq!(fields["CardType"], "Visa");
        assert_eq!(fields["Status"], "InActive");
        assert_eq!(fields["ProcessingMode"], "External");
        assert_eq!(fields["OMSQS_Payment_Gateway__c"], "cybersource");
        assert_eq!(fields["ExpiryYear"], 2030);
    }

    #[test]
    fn unknown_brand_omits_card_type() {
        let fields =
            serde_json::to_value(CardPaymentMethodFields::new(&transaction("Discover"))).unwrap();
        assert!(fields.get("CardType").is_none());
    }

    #[test]
    fn payment_method_without_details() {
        let mut txn = transaction("Visa");
        txn.payment_details = None;
        let fields = serde_json::to_value(CardPaymentMethodFields::new(&txn)).unwrap();
        assert!(fields.get("CardLastFour").is_none());
        assert!(fields.get("InputCardNumber").is_none());
        assert_eq!(fields["CardCategory"], "CreditCard");

        txn.payment_details = Some(PaymentDetails::default());
        let fields = serde_json::to_value(CardPaymentMethodFields::new(&txn)).unwrap();
        assert!(fields.get("CardHolderName").is_none());
    }

    #[test]
    fn gateway_log_reuses_request_id_for_description() {
        let now = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let fields =
            serde_json::to_value(PaymentGatewayLogFields::new(&transaction("Visa"), "0Xc1", now))
                .unwrap();
        assert_eq!(fields["GatewayRefNumber"], "req-77");
        assert_eq!(fields["GatewayResultCodeDescription"], "req-77");
        assert_eq!(fields["GatewayAvsCode"], "Y");
        assert_eq!(fields["InteractionType"], "Authorization");
        assert_eq!(fields["ReferencedEntityId"], "0Xc1");
    }

    #[test]
    fn order_item_field_names() {
        let item: LineItem = serde_json::from_value(json!({
            "id": 11, "sku": "ABC", "quantity": 2, "price": "10.00", "title": "Widget"
        }))
        .unwrap();
        let line = OrderLine::from(&item);
        let fields = serde_json::to_value(OrderItemFields::new(
            "801x",
            &line,
            Some("01tx".into()),
            Some("01ux".into()),
        ))
        .unwrap();

        assert_eq!(fields["OrderId"], "801x");
        assert_eq!(fields["Product2Id"], "01tx");
        assert_eq!(fields["PricebookEntryId"], "01ux");
        assert_eq!(fields["Quantity"], 2);
        assert_eq!(fields["UnitPrice"], 10.0);
        assert_eq!(fields["TotalLineAmount"], 10.0);
        assert_eq!(fields["Type"], "Order Product");
        assert_eq!(fields["OMSQS_Shopify_Line_Item_Id__c"], "11");
    }

    #[test]
    fn shipping_lines_are_delivery_charges_of_one() {
        let shipping: ShippingLine = serde_json::from_value(json!({
            "id": 21, "code": "STANDARD", "price": "5.00", "title": "Standard"
        }))
        .unwrap();
        let line = OrderLine::from(&shipping);

        assert_eq!(line.kind, LineKind::Shipping);
        assert_eq!(line.sku, Some("STANDARD"));
        assert_eq!(line.quantity, 1);
        assert_eq!(line.kind.order_item_type(), "Delivery Charge");
        assert!(!line.has_discount());
    }

    #[test]
    fn adjustment_is_negated() {
        let item: LineItem = serde_json::from_value(json!({
            "id": 11, "quantity": 1, "price": "10.00", "title": "Widget", "total_discount": "2.50"
        }))
        .unwrap();
        let line = OrderLine::from(&item);
        let fields = AdjustmentLineItemFields::new("802x", &line);

        assert_eq!(fields.amount, -2.5);
        assert_eq!(fields.name, "Widget Adjustment");
    }
}
