//! Test utilities and fixtures for Storesync integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use axum::Router;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use serde_json::{Value, json};
use sha2::Sha256;

pub use storesync::config::Config;
pub use storesync::db::{AppState, build_http_client, init_db, queries};
pub use storesync::error::{AppError, Result};
pub use storesync::models::*;
pub use storesync::salesforce::soql::{Condition, Literal};
pub use storesync::salesforce::{RecordApi, SObject, Soql};
pub use storesync::shopify::payloads::*;
pub use storesync::sync::{Reconciler, SyncEvent, SyncOutcome};

pub const TEST_SHOP: &str = "acme-goods.myshopify.com";
pub const TEST_STORE: &str = "acme-goods";
pub const TEST_SECRET: &str = "shpss_test_secret";
pub const TEST_ADMIN_KEY: &str = "sk_admin_test";
pub const TEST_PRICEBOOK: &str = "Shopify Price Book";

/// One call made against the fake backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Query(SObject, String),
    Create(SObject, Value),
    Update(SObject, String, Value),
}

/// In-memory Salesforce stand-in. Queries evaluate the equality predicates of
/// the SOQL against stored records; creates assign sequential ids.
#[derive(Default)]
pub struct FakeBackend {
    records: Mutex<HashMap<SObject, Vec<Value>>>,
    calls: Mutex<Vec<Call>>,
    next_id: Mutex<u32>,
    failing_creates: Mutex<Vec<SObject>>,
}

fn id_prefix(object: SObject) -> &'static str {
    match object {
        SObject::Account => "001",
        SObject::RecordType => "012",
        SObject::Pricebook2 => "01s",
        SObject::PricebookEntry => "01u",
        SObject::Product2 => "01t",
        SObject::Order => "801",
        SObject::OrderItem => "802",
        SObject::OrderItemTaxLineItem => "0sT",
        SObject::OrderItemAdjustmentLineItem => "0sA",
        SObject::CardPaymentMethod => "03O",
        SObject::PaymentAuthorization => "0Xc",
        SObject::PaymentGatewayLog => "0Xl",
        SObject::PaymentGroup => "0dR",
    }
}

fn condition_holds(record: &Value, condition: &Condition) -> bool {
    let Some(actual) = record.get(condition.field) else {
        return false;
    };
    match (&condition.value, actual) {
        (Literal::Bool(expected), Value::Bool(b)) => expected == b,
        (Literal::Text(expected), Value::String(s)) => expected == s,
        (Literal::Text(expected), Value::Number(n)) => *expected == n.to_string(),
        _ => false,
    }
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self, object: SObject) -> String {
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        format!("{}{:012}", id_prefix(object), *next)
    }

    fn insert(&self, object: SObject, mut fields: Value) -> String {
        let id = self.next_id(object);
        if let Some(map) = fields.as_object_mut() {
            map.insert("Id".to_string(), Value::String(id.clone()));
        }
        self.records
            .lock()
            .unwrap()
            .entry(object)
            .or_default()
            .push(fields);
        id
    }

    /// Store a record without logging a call. Returns its id.
    pub fn seed(&self, object: SObject, fields: Value) -> String {
        self.insert(object, fields)
    }

    /// Person-account record type, active price book, and two priced products
    /// (`ABC` and the `STANDARD` shipping method).
    pub fn seed_catalog(&self) -> String {
        self.seed(
            SObject::RecordType,
            json!({ "DeveloperName": "PersonAccount", "SobjectType": "Account" }),
        );
        let pricebook_id = self.seed(
            SObject::Pricebook2,
            json!({ "Name": TEST_PRICEBOOK, "IsActive": true }),
        );
        for sku in ["ABC", "STANDARD"] {
            self.seed(SObject::Product2, json!({ "Name": sku, "StockKeepingUnit": sku }));
            self.seed(
                SObject::PricebookEntry,
                json!({ "ProductCode": sku, "Pricebook2Id": pricebook_id, "IsActive": true }),
            );
        }
        pricebook_id
    }

    /// Make every create of `object` fail with an upstream 400.
    pub fn fail_creates_of(&self, object: SObject) {
        self.failing_creates.lock().unwrap().push(object);
    }

    pub fn records(&self, object: SObject) -> Vec<Value> {
        self.records
            .lock()
            .unwrap()
            .get(&object)
            .cloned()
            .unwrap_or_default()
    }

    pub fn record(&self, object: SObject, id: &str) -> Option<Value> {
        self.records(object)
            .into_iter()
            .find(|r| r["Id"] == id)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Objects created, in call order.
    pub fn created_objects(&self) -> Vec<SObject> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Create(object, _) => Some(object),
                _ => None,
            })
            .collect()
    }

    /// Bodies sent to create `object`, in call order.
    pub fn created(&self, object: SObject) -> Vec<Value> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Create(o, body) if o == object => Some(body),
                _ => None,
            })
            .collect()
    }

    pub fn updates(&self, object: SObject) -> Vec<(String, Value)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Update(o, id, body) if o == object => Some((id, body)),
                _ => None,
            })
            .collect()
    }

    pub fn count_creates(&self) -> usize {
        self.created_objects().len()
    }
}

impl RecordApi for FakeBackend {
    async fn query(&self, soql: &Soql) -> Result<Option<Vec<Value>>> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Query(soql.object(), soql.to_string()));

        let mut found: Vec<Value> = self
            .records(soql.object())
            .into_iter()
            .filter(|r| soql.conditions().iter().all(|c| condition_holds(r, c)))
            .collect();
        if let Some(limit) = soql.limit_value() {
            found.truncate(limit as usize);
        }

        Ok(if found.is_empty() { None } else { Some(found) })
    }

    async fn create(&self, object: SObject, fields: Value) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Create(object, fields.clone()));

        if self.failing_creates.lock().unwrap().contains(&object) {
            return Err(AppError::Upstream {
                object: object.to_string(),
                status: 400,
                body: "[{\"errorCode\":\"REQUIRED_FIELD_MISSING\"}]".to_string(),
            });
        }

        Ok(self.insert(object, fields))
    }

    async fn update(&self, object: SObject, id: &str, fields: Value) -> Result<Value> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Update(object, id.to_string(), fields.clone()));

        let mut records = self.records.lock().unwrap();
        let record = records
            .get_mut(&object)
            .and_then(|list| list.iter_mut().find(|r| r["Id"] == id))
            .ok_or_else(|| AppError::Upstream {
                object: object.to_string(),
                status: 404,
                body: "[{\"errorCode\":\"NOT_FOUND\"}]".to_string(),
            })?;

        if let (Some(target), Value::Object(patch)) = (record.as_object_mut(), fields) {
            target.extend(patch);
        }
        Ok(Value::Null)
    }
}

pub fn reconciler(backend: FakeBackend) -> Reconciler<FakeBackend> {
    Reconciler::new(backend, TEST_SHOP, TEST_PRICEBOOK)
}

// ============ Payload fixtures ============

pub fn customer_json(id: u64) -> Value {
    json!({
        "id": id,
        "first_name": "Ada",
        "last_name": "Lovelace",
        "email": "ada@example.com",
        "phone": "+15555550100"
    })
}

pub fn customer(id: u64) -> CustomerPayload {
    serde_json::from_value(customer_json(id)).unwrap()
}

pub fn address(province_code: &str) -> Value {
    json!({
        "address1": "1 Analytical Way",
        "city": "Hyderabad",
        "province_code": province_code,
        "zip": "500001",
        "country_code": "IN"
    })
}

/// Order 4001 for customer 7001: SKU ABC x2 at 10.00 and STANDARD shipping at 5.00.
pub fn order_json() -> Value {
    json!({
        "id": 4001,
        "order_number": 1001,
        "customer": customer_json(7001),
        "billing_address": address("TS"),
        "shipping_address": address("KA"),
        "line_items": [{
            "id": 11,
            "sku": "ABC",
            "quantity": 2,
            "price": "10.00",
            "title": "Widget",
            "total_discount": "0.00",
            "tax_lines": []
        }],
        "shipping_lines": [{
            "id": 21,
            "code": "STANDARD",
            "price": "5.00",
            "title": "Standard",
            "tax_lines": []
        }]
    })
}

pub fn order_from(value: Value) -> OrderPayload {
    serde_json::from_value(value).unwrap()
}

pub fn transaction_json(kind: &str) -> Value {
    json!({
        "id": 5001,
        "order_id": 4001,
        "kind": kind,
        "gateway": "cybersource",
        "amount": "25.00",
        "payment_details": {
            "credit_card_name": "Ada Lovelace",
            "credit_card_number": "•••• •••• •••• 4242",
            "credit_card_company": "Mastercard",
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
    })
}

pub fn transaction(kind: &str) -> TransactionPayload {
    serde_json::from_value(transaction_json(kind)).unwrap()
}

// ============ App fixtures ============

pub const TEST_CLAIM_LEASE_SECS: i64 = 300;

pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_path: ":memory:".to_string(),
        shopify_api_secret: TEST_SECRET.to_string(),
        shopify_api_version: "2023-07".to_string(),
        salesforce_api_version: "v60.0".to_string(),
        pricebook_name: TEST_PRICEBOOK.to_string(),
        credentials_metaobject_type: "salesforce_credentials".to_string(),
        admin_api_key: Some(TEST_ADMIN_KEY.to_string()),
        http_timeout: std::time::Duration::from_secs(5),
        claim_lease: std::time::Duration::from_secs(TEST_CLAIM_LEASE_SECS as u64),
        dev_mode: true,
    }
}

/// State over a single in-memory SQLite connection, so every checkout sees
/// the same database.
pub fn create_test_app_state_with(config: &Config) -> AppState {
    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder().max_size(1).build(manager).unwrap();
    {
        let conn = pool.get().unwrap();
        init_db(&conn).unwrap();
    }
    AppState::new(config, pool).unwrap()
}

pub fn create_test_app_state() -> AppState {
    create_test_app_state_with(&test_config())
}

pub fn app(state: AppState) -> Router {
    storesync::handlers::router(state.clone()).with_state(state)
}

pub fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(body);
    BASE64.encode(mac.finalize().into_bytes())
}
