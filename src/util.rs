use axum::http::{HeaderMap, StatusCode};

use crate::error::msg;

/// Extract a Bearer token from the Authorization header.
///
/// Returns the token string without the "Bearer " prefix, or None if
/// the header is missing, malformed, or empty after the prefix.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}

/// A header that must be present and valid UTF-8. Failures map to 400 with
/// `missing` or a generic invalid-value message.
pub fn required_header<'a>(
    headers: &'a HeaderMap,
    name: &str,
    missing: &'static str,
) -> Result<&'a str, (StatusCode, &'static str)> {
    let value = headers.get(name).ok_or((StatusCode::BAD_REQUEST, missing))?;
    let value = value
        .to_str()
        .map_err(|_| (StatusCode::BAD_REQUEST, msg::INVALID_HEADER_VALUE))?
        .trim();
    if value.is_empty() {
        return Err((StatusCode::BAD_REQUEST, missing));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert("Authorization", HeaderValue::from_static("Bearer  sk_admin "));
        assert_eq!(extract_bearer_token(&headers), Some("sk_admin"));

        headers.insert("Authorization", HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert("Authorization", HeaderValue::from_static("Bearer "));
        assert_eq!(extract_bearer_token(&headers), None);
    }

    #[test]
    fn required_header_rejects_blank_values() {
        let mut headers = HeaderMap::new();
        headers.insert("x-shopify-topic", HeaderValue::from_static("  "));

        let err = required_header(&headers, "x-shopify-topic", "missing topic").unwrap_err();
        assert_eq!(err, (StatusCode::BAD_REQUEST, "missing topic"));
        assert!(required_header(&headers, "x-other", "missing other").is_err());
    }
}
