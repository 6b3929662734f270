use std::env;
use std::time::Duration;

pub const DEFAULT_SHOPIFY_API_VERSION: &str = "2023-07";
pub const DEFAULT_SALESFORCE_API_VERSION: &str = "v60.0";
pub const DEFAULT_PRICEBOOK_NAME: &str = "Shopify Price Book";
pub const DEFAULT_CREDENTIALS_METAOBJECT_TYPE: &str = "salesforce_credentials";
pub const DEFAULT_CLAIM_LEASE_SECS: u64 = 300;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    /// App secret used to sign webhook deliveries. Empty rejects every webhook.
    pub shopify_api_secret: String,
    pub shopify_api_version: String,
    pub salesforce_api_version: String,
    /// Active price book that order lines are priced from.
    pub pricebook_name: String,
    /// Metaobject type holding `instance_url`, `client_id`, `client_secret`.
    pub credentials_metaobject_type: String,
    /// Bearer key for the /api metaobject endpoints. None disables them.
    pub admin_api_key: Option<String>,
    pub http_timeout: Duration,
    /// How long a `processing` ledger claim blocks redeliveries of its webhook id.
    pub claim_lease: Duration,
    pub dev_mode: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("STORESYNC_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let shopify_api_secret = env::var("SHOPIFY_API_SECRET").unwrap_or_default();
        if shopify_api_secret.is_empty() {
            tracing::warn!("SHOPIFY_API_SECRET is not set; all webhooks will be rejected");
        }

        let http_timeout_secs: u64 = env::var("HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        let claim_lease_secs: u64 = env::var("CLAIM_LEASE_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_CLAIM_LEASE_SECS);

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "storesync.db".to_string()),
            shopify_api_secret,
            shopify_api_version: env::var("SHOPIFY_API_VERSION")
                .unwrap_or_else(|_| DEFAULT_SHOPIFY_API_VERSION.to_string()),
            salesforce_api_version: env::var("SALESFORCE_API_VERSION")
                .unwrap_or_else(|_| DEFAULT_SALESFORCE_API_VERSION.to_string()),
            pricebook_name: env::var("SALESFORCE_PRICEBOOK_NAME")
                .unwrap_or_else(|_| DEFAULT_PRICEBOOK_NAME.to_string()),
            credentials_metaobject_type: env::var("CREDENTIALS_METAOBJECT_TYPE")
                .unwrap_or_else(|_| DEFAULT_CREDENTIALS_METAOBJECT_TYPE.to_string()),
            admin_api_key: env::var("ADMIN_API_KEY").ok().filter(|k| !k.is_empty()),
            http_timeout: Duration::from_secs(http_timeout_secs),
            claim_lease: Duration::from_secs(claim_lease_secs),
            dev_mode,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
