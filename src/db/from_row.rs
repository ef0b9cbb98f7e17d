//! Row mapping trait and helpers for reducing boilerplate in queries.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::*;

/// Parse a text column into an enum, surfacing bad values as a column type error
/// instead of panicking.
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

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ SQL SELECT Constants ============

pub const USER_COLS: &str =
    "id, name, email, password_hash, role, university, address, created_at, updated_at";

pub const DONATION_EVENT_COLS: &str = "id, title, goal_cents, details, image_url, raised_cents, status, created_by, created_at, updated_at";

pub const DONATION_COLS: &str = "id, amount_cents, currency, donation_event_id, donor_id, is_anonymous, payment_id, payment_status, created_at";

/// Donation columns (aliased `d`) followed by the joined event summary (aliased `e`).
pub const DONOR_DONATION_COLS: &str = "d.id, d.amount_cents, d.currency, d.donation_event_id, d.donor_id, d.is_anonymous, d.payment_id, d.payment_status, d.created_at, e.id, e.title, e.goal_cents, e.status";

// ============ FromRow Implementations ============

impl FromRow for User {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            role: parse_enum(row, 4, "role")?,
            university: row.get(5)?,
            address: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }
}

impl FromRow for DonationEvent {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(DonationEvent {
            id: row.get(0)?,
            title: row.get(1)?,
            goal_cents: row.get(2)?,
            details: row.get(3)?,
            image_url: row.get(4)?,
            raised_cents: row.get(5)?,
            status: parse_enum(row, 6, "status")?,
            created_by: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }
}

impl FromRow for Donation {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Donation {
            id: row.get(0)?,
            amount_cents: row.get(1)?,
            currency: row.get(2)?,
            donation_event_id: row.get(3)?,
            donor_id: row.get(4)?,
            is_anonymous: row.get::<_, i32>(5)? != 0,
            payment_id: row.get(6)?,
            payment_status: parse_enum(row, 7, "payment_status")?,
            created_at: row.get(8)?,
        })
    }
}

impl FromRow for DonorDonation {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let donation = Donation::from_row(row)?;
        // LEFT JOIN: the event columns are all NULL when the event row is gone
        let donation_event = match row.get::<_, Option<String>>(9)? {
            Some(id) => Some(DonationEventSummary {
                id,
                title: row.get(10)?,
                goal_cents: row.get(11)?,
                status: parse_enum(row, 12, "status")?,
            }),
            None => None,
        };
        Ok(DonorDonation {
            donation,
            donation_event,
        })
    }
}
