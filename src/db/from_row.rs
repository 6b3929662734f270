//! Row mapping for the session store and webhook ledger.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::*;

/// Parse a string column into an enum type, converting parse errors to rusqlite errors.
fn parse_enum<T: std::str::FromStr>(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<T> {
    row.get::<_, String>(col)?.parse::<T>().map_err(|_| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

pub const SESSION_COLS: &str =
    "id, shop, is_online, scope, access_token, created_at, updated_at";

pub const WEBHOOK_DELIVERY_COLS: &str =
    "webhook_id, topic, shop, status, received_at, completed_at";

impl FromRow for ShopSession {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(ShopSession {
            id: row.get(0)?,
            shop: row.get(1)?,
            is_online: row.get::<_, i32>(2)? != 0,
            scope: row.get(3)?,
            access_token: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }
}

impl FromRow for WebhookDelivery {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(WebhookDelivery {
            webhook_id: row.get(0)?,
            topic: row.get(1)?,
            shop: row.get(2)?,
            status: parse_enum(row, 3, "status")?,
            received_at: row.get(4)?,
            completed_at: row.get(5)?,
        })
    }
}
