//! Storesync - Shopify to Salesforce webhook reconciliation
//!
//! This library holds the webhook endpoint, the per-shop credential resolution,
//! the Salesforce record client and the reconciliation workflows that mirror
//! storefront customers, orders and payment authorizations into Salesforce.

pub mod config;
pub mod credentials;
pub mod db;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod salesforce;
pub mod shopify;
pub mod sync;
pub mod util;
