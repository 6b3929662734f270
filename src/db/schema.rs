use rusqlite::Connection;

/// Initialize the database schema
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Storefront sessions (offline sessions carry the admin API token)
        CREATE TABLE IF NOT EXISTS shopify_sessions (
            id TEXT PRIMARY KEY,
            shop TEXT NOT NULL,
            is_online INTEGER NOT NULL DEFAULT 0,
            scope TEXT,
            access_token TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_shopify_sessions_shop ON shopify_sessions(shop);

        -- Webhook idempotency ledger, one row per delivered webhook id
        CREATE TABLE IF NOT EXISTS webhook_deliveries (
            webhook_id TEXT PRIMARY KEY,
            topic TEXT NOT NULL,
            shop TEXT NOT NULL,
            status TEXT NOT NULL CHECK (status IN ('processing', 'completed')),
            received_at INTEGER NOT NULL,
            completed_at INTEGER
        );
        CREATE INDEX IF NOT EXISTS idx_webhook_deliveries_received ON webhook_deliveries(received_at);
        "#,
    )?;

    Ok(())
}
