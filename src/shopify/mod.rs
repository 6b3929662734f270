//! Shopify side of the sync: webhook topics and signatures, typed webhook
//! payloads, and the admin GraphQL client used for credentials and metaobjects.

mod admin;
pub mod payloads;
mod webhook;

pub use admin::*;
pub use webhook::*;

const SHOP_DOMAIN_SUFFIX: &str = ".myshopify.com";

/// Store name as written to Salesforce: the shop domain without `.myshopify.com`.
pub fn store_name(shop: &str) -> &str {
    shop.strip_suffix(SHOP_DOMAIN_SUFFIX).unwrap_or(shop)
}

/// True for `<handle>.myshopify.com` where the handle is lowercase
/// alphanumerics and hyphens. Anything else is never used to build a URL.
pub fn is_valid_shop_domain(shop: &str) -> bool {
    match shop.strip_suffix(SHOP_DOMAIN_SUFFIX) {
        Some(handle) => {
            !handle.is_empty()
                && !handle.starts_with('-')
                && handle
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_name_strips_domain_suffix() {
        assert_eq!(store_name("acme-goods.myshopify.com"), "acme-goods");
        assert_eq!(store_name("acme-goods"), "acme-goods");
    }

    #[test]
    fn shop_domain_validation() {
        assert!(is_valid_shop_domain("acme-goods.myshopify.com"));
        assert!(is_valid_shop_domain("shop42.myshopify.com"));
        assert!(!is_valid_shop_domain(".myshopify.com"));
        assert!(!is_valid_shop_domain("evil.com"));
        assert!(!is_valid_shop_domain("evil.com/x.myshopify.com"));
        assert!(!is_valid_shop_domain("Acme.myshopify.com"));
        assert!(!is_valid_shop_domain("169.254.169.254"));
    }
}
