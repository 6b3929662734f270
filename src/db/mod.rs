mod from_row;
mod schema;
pub mod queries;

pub use schema::init_db;

use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::config::Config;
use crate::error::Result;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    /// Session store and webhook ledger
    pub db: DbPool,
    /// Shared HTTP client for Shopify and Salesforce calls
    pub http: reqwest::Client,
    pub shopify_api_secret: String,
    pub shopify_api_version: String,
    pub salesforce_api_version: String,
    pub pricebook_name: String,
    pub credentials_metaobject_type: String,
    pub admin_api_key: Option<String>,
    /// Ledger claim lease in seconds
    pub claim_lease_secs: i64,
}

impl AppState {
    pub fn new(config: &Config, db: DbPool) -> Result<Self> {
        Ok(Self {
            db,
            http: build_http_client(config.http_timeout)?,
            shopify_api_secret: config.shopify_api_secret.clone(),
            shopify_api_version: config.shopify_api_version.clone(),
            salesforce_api_version: config.salesforce_api_version.clone(),
            pricebook_name: config.pricebook_name.clone(),
            credentials_metaobject_type: config.credentials_metaobject_type.clone(),
            admin_api_key: config.admin_api_key.clone(),
            claim_lease_secs: i64::try_from(config.claim_lease.as_secs()).unwrap_or(i64::MAX),
        })
    }
}

pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

pub fn create_pool(database_path: &str) -> std::result::Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path);
    Pool::builder().max_size(10).build(manager)
}
