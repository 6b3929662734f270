use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};

use crate::credentials;
use crate::db::{AppState, queries};
use crate::error::{AppError, Result, msg};
use crate::shopify::{self, HMAC_HEADER, SHOP_HEADER, TOPIC_HEADER, Topic, WEBHOOK_ID_HEADER};
use crate::sync::{Reconciler, SyncEvent, SyncOutcome};
use crate::util::required_header;

/// Result type for webhook responses.
pub type WebhookResult = (StatusCode, &'static str);

struct Delivery<'a> {
    topic: &'a str,
    shop: &'a str,
    signature: &'a str,
    webhook_id: &'a str,
}

fn read_headers(headers: &HeaderMap) -> std::result::Result<Delivery<'_>, WebhookResult> {
    Ok(Delivery {
        topic: required_header(headers, TOPIC_HEADER, msg::MISSING_TOPIC_HEADER)?,
        shop: required_header(headers, SHOP_HEADER, msg::MISSING_SHOP_HEADER)?,
        signature: required_header(headers, HMAC_HEADER, msg::MISSING_HMAC_HEADER)?,
        webhook_id: required_header(headers, WEBHOOK_ID_HEADER, msg::MISSING_WEBHOOK_ID_HEADER)?,
    })
}

pub async fn handle_shopify_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let delivery = match read_headers(&headers) {
        Ok(d) => d,
        Err(response) => return response,
    };

    match shopify::verify_webhook_hmac(&state.shopify_api_secret, &body, delivery.signature) {
        Ok(true) => {}
        Ok(false) => {
            tracing::warn!("Rejected webhook {} from {}: bad HMAC", delivery.webhook_id, delivery.shop);
            return (StatusCode::UNAUTHORIZED, "Invalid signature");
        }
        Err(e) => {
            tracing::error!("HMAC verification failed: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Signature verification error");
        }
    }

    let Some(topic) = Topic::parse(delivery.topic) else {
        tracing::debug!("Ignoring webhook topic {}", delivery.topic);
        return (StatusCode::OK, "Topic ignored");
    };

    if !shopify::is_valid_shop_domain(delivery.shop) {
        return (StatusCode::BAD_REQUEST, msg::INVALID_SHOP_DOMAIN);
    }

    let event = match SyncEvent::parse(topic, &body) {
        Ok(Some(event)) => event,
        Ok(None) => {
            tracing::info!("{} webhook for {} acknowledged", topic.as_ref(), delivery.shop);
            return (StatusCode::OK, "Acknowledged");
        }
        Err(AppError::BadRequest(reason)) => {
            tracing::warn!("Rejected {} webhook {}: {}", topic.as_ref(), delivery.webhook_id, reason);
            return (StatusCode::BAD_REQUEST, "Invalid payload");
        }
        Err(e) => {
            tracing::error!("Failed to parse {} webhook: {}", topic.as_ref(), e);
            return (StatusCode::BAD_REQUEST, "Invalid JSON");
        }
    };

    if let Some(reason) = event.skip_reason() {
        tracing::info!("Webhook {} ignored: {}", delivery.webhook_id, reason);
        return (StatusCode::OK, "Event ignored");
    }

    match claim(&state, &delivery, topic) {
        Ok(true) => {}
        Ok(false) => {
            tracing::info!("Webhook {} already processed", delivery.webhook_id);
            return (StatusCode::OK, "Already processed");
        }
        Err(e) => {
            tracing::error!("Failed to claim webhook {}: {}", delivery.webhook_id, e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Database error");
        }
    }

    match process(&state, delivery.shop, &event).await {
        Ok(outcome) => {
            tracing::info!(
                "{} webhook {} for {}: {}",
                topic.as_ref(),
                delivery.webhook_id,
                delivery.shop,
                outcome
            );
            finish(&state, delivery.webhook_id);
            (StatusCode::OK, "OK")
        }
        Err(e) if e.is_configuration() => {
            // Redelivery cannot fix this; acknowledge so the platform stops retrying.
            tracing::warn!(
                "{} webhook {} for {} not synced: {}",
                topic.as_ref(),
                delivery.webhook_id,
                delivery.shop,
                e
            );
            finish(&state, delivery.webhook_id);
            (StatusCode::OK, "Shop not configured")
        }
        Err(e) => {
            tracing::error!(
                "{} webhook {} for {} failed: {}",
                topic.as_ref(),
                delivery.webhook_id,
                delivery.shop,
                e
            );
            release(&state, delivery.webhook_id);
            (StatusCode::INTERNAL_SERVER_ERROR, "Sync failed")
        }
    }
}

fn claim(state: &AppState, delivery: &Delivery<'_>, topic: Topic) -> Result<bool> {
    let conn = state.db.get()?;
    queries::try_claim_webhook(
        &conn,
        delivery.webhook_id,
        topic.as_ref(),
        delivery.shop,
        state.claim_lease_secs,
    )
}

/// Resolve credentials once, then run the workflow for the event.
async fn process(state: &AppState, shop: &str, event: &SyncEvent) -> Result<SyncOutcome> {
    let client = credentials::salesforce_client(state, shop).await?;
    let reconciler = Reconciler::new(client, shop, &state.pricebook_name);
    reconciler.apply(event).await
}

fn finish(state: &AppState, webhook_id: &str) {
    let result = state
        .db
        .get()
        .map_err(AppError::from)
        .and_then(|conn| queries::mark_webhook_completed(&conn, webhook_id));
    if let Err(e) = result {
        tracing::error!("Failed to mark webhook {} completed: {}", webhook_id, e);
    }
}

fn release(state: &AppState, webhook_id: &str) {
    let result = state
        .db
        .get()
        .map_err(AppError::from)
        .and_then(|conn| queries::release_webhook_claim(&conn, webhook_id));
    if let Err(e) = result {
        tracing::error!("Failed to release webhook claim {}: {}", webhook_id, e);
    }
}
