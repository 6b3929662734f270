use chrono::Utc;
use rusqlite::{Connection, params};

use crate::error::{AppError, Result};
use crate::models::*;

use super::from_row::{SESSION_COLS, WEBHOOK_DELIVERY_COLS, query_one};

fn now() -> i64 {
    Utc::now().timestamp()
}

// ============ Sessions ============

/// Store (or replace) the offline session for a shop.
pub fn upsert_offline_session(conn: &Connection, input: &CreateShopSession) -> Result<ShopSession> {
    let id = ShopSession::offline_id(&input.shop);
    let now = now();

    conn.execute(
        "INSERT INTO shopify_sessions (id, shop, is_online, scope, access_token, created_at, updated_at)
         VALUES (?1, ?2, 0, ?3, ?4, ?5, ?5)
         ON CONFLICT(id) DO UPDATE SET
            scope = excluded.scope,
            access_token = excluded.access_token,
            updated_at = excluded.updated_at",
        params![&id, &input.shop, &input.scope, &input.access_token, now],
    )?;

    let session = get_session_by_id(conn, &id)?;
    session.ok_or_else(|| AppError::Internal("Session vanished after upsert".into()))
}

pub fn get_session_by_id(conn: &Connection, id: &str) -> Result<Option<ShopSession>> {
    query_one(
        conn,
        &format!("SELECT {} FROM shopify_sessions WHERE id = ?1", SESSION_COLS),
        &[&id],
    )
}

pub fn get_offline_session(conn: &Connection, shop: &str) -> Result<Option<ShopSession>> {
    get_session_by_id(conn, &ShopSession::offline_id(shop))
}

// ============ Webhook ledger ============

/// Atomically claim a webhook id before processing it.
///
/// Returns false when the id is completed, or still held by a claim younger
/// than `lease_secs`. An older `processing` row belongs to a sync that never
/// finished (the process died mid-delivery) and is taken over.
pub fn try_claim_webhook(
    conn: &Connection,
    webhook_id: &str,
    topic: &str,
    shop: &str,
    lease_secs: i64,
) -> Result<bool> {
    let now = now();
    let stale_before = now.saturating_sub(lease_secs);
    let affected = conn.execute(
        "INSERT INTO webhook_deliveries (webhook_id, topic, shop, status, received_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(webhook_id) DO UPDATE SET
            topic = excluded.topic,
            shop = excluded.shop,
            received_at = excluded.received_at
         WHERE webhook_deliveries.status = ?4 AND webhook_deliveries.received_at < ?6",
        params![
            webhook_id,
            topic,
            shop,
            DeliveryStatus::Processing.as_ref(),
            now,
            stale_before
        ],
    )?;
    Ok(affected > 0)
}

pub fn mark_webhook_completed(conn: &Connection, webhook_id: &str) -> Result<()> {
    conn.execute(
        "UPDATE webhook_deliveries SET status = ?1, completed_at = ?2 WHERE webhook_id = ?3",
        params![DeliveryStatus::Completed.as_ref(), now(), webhook_id],
    )?;
    Ok(())
}

/// Drop a claim so a redelivery of the same webhook can be processed again.
pub fn release_webhook_claim(conn: &Connection, webhook_id: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM webhook_deliveries WHERE webhook_id = ?1 AND status = ?2",
        params![webhook_id, DeliveryStatus::Processing.as_ref()],
    )?;
    Ok(())
}

pub fn get_webhook_delivery(conn: &Connection, webhook_id: &str) -> Result<Option<WebhookDelivery>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM webhook_deliveries WHERE webhook_id = ?1",
            WEBHOOK_DELIVERY_COLS
        ),
        &[&webhook_id],
    )
}

/// Purge ledger rows older than the retention period.
/// Returns the number of deleted records.
pub fn purge_old_webhook_deliveries(conn: &Connection, retention_days: i64) -> Result<usize> {
    let retention_secs = retention_days
        .checked_mul(86400)
        .filter(|secs| *secs > 0)
        .ok_or_else(|| AppError::BadRequest(format!("invalid retention period: {} days", retention_days)))?;
    let cutoff = now().saturating_sub(retention_secs);
    let deleted = conn.execute(
        "DELETE FROM webhook_deliveries WHERE received_at < ?1",
        params![cutoff],
    )?;
    Ok(deleted)
}
