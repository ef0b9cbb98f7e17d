use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params, types::Value};

use crate::error::{AppError, Result, msg};
use crate::id::EntityType;
use crate::models::*;

use super::from_row::{
    DONATION_COLS, DONATION_EVENT_COLS, DONOR_DONATION_COLS, FromRow, USER_COLS, query_all,
    query_one,
};

fn now() -> i64 {
    Utc::now().timestamp()
}

/// Treat blank optional strings as absent.
fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// For partial updates of nullable text: absent leaves the column alone,
/// a blank string clears it to NULL.
fn clearable(value: &Option<String>) -> Option<Option<String>> {
    value.as_ref().map(|_| non_blank(value))
}

/// Builder for dynamic UPDATE statements with optional fields.
/// Combines multiple field updates into a single query.
struct UpdateBuilder {
    table: &'static str,
    id: String,
    fields: Vec<(&'static str, Value)>,
    track_updated_at: bool,
}

impl UpdateBuilder {
    fn new(table: &'static str, id: &str) -> Self {
        Self {
            table,
            id: id.to_string(),
            fields: Vec::new(),
            track_updated_at: false,
        }
    }

    fn with_updated_at(mut self) -> Self {
        self.track_updated_at = true;
        self
    }

    fn set(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.fields.push((column, value.into()));
        self
    }

    fn set_opt<V: Into<Value>>(self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    /// Execute the update and return the updated entity using RETURNING clause.
    /// With no fields to change this falls back to a plain lookup so callers can
    /// still distinguish "not found" from "nothing to do".
    fn execute_returning<T: FromRow>(mut self, conn: &Connection, returning_cols: &str) -> Result<Option<T>> {
        if self.fields.is_empty() {
            return query_one(
                conn,
                &format!("SELECT {} FROM {} WHERE id = ?1", returning_cols, self.table),
                &[&self.id],
            );
        }
        if self.track_updated_at {
            self.fields.push(("updated_at", now().into()));
        }
        let sets: Vec<String> = self
            .fields
            .iter()
            .map(|(col, _)| format!("{} = ?", col))
            .collect();
        let mut values: Vec<Value> = self.fields.into_iter().map(|(_, v)| v).collect();
        values.push(self.id.into());
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ? RETURNING {}",
            self.table,
            sets.join(", "),
            returning_cols
        );
        conn.query_row(&sql, rusqlite::params_from_iter(values), T::from_row)
            .optional()
            .map_err(Into::into)
    }
}

// ============ Users ============

/// Create a user. Emails are stored trimmed and lowercased.
pub fn create_user(
    conn: &Connection,
    input: &CreateUser,
    password_hash: &str,
    role: Role,
) -> Result<User> {
    let id = EntityType::User.gen_id();
    let now = now();
    let email = input.email.trim().to_lowercase();
    let name = input.name.trim().to_string();
    let university = non_blank(&input.university);
    let address = non_blank(&input.address);

    conn.execute(
        "INSERT INTO users (id, name, email, password_hash, role, university, address, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            &id,
            &name,
            &email,
            password_hash,
            role.as_ref(),
            &university,
            &address,
            now,
            now
        ],
    )
    .map_err(AppError::from)
    .map_err(|e| {
        if e.is_unique_violation() {
            AppError::Conflict(msg::USER_EXISTS.into())
        } else {
            e
        }
    })?;

    Ok(User {
        id,
        name,
        email,
        password_hash: password_hash.to_string(),
        role,
        university,
        address,
        created_at: now,
        updated_at: now,
    })
}

pub fn get_user_by_id(conn: &Connection, id: &str) -> Result<Option<User>> {
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLS),
        &[&id],
    )
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    let email = email.trim().to_lowercase();
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE email = ?1", USER_COLS),
        &[&email],
    )
}

pub fn list_users_paginated(
    conn: &Connection,
    role: Option<Role>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<User>, i64)> {
    match role {
        Some(role) => {
            let total: i64 = conn.query_row(
                "SELECT COUNT(*) FROM users WHERE role = ?1",
                params![role.as_ref()],
                |row| row.get(0),
            )?;
            let users = query_all(
                conn,
                &format!(
                    "SELECT {} FROM users WHERE role = ?1 ORDER BY created_at DESC, id LIMIT ?2 OFFSET ?3",
                    USER_COLS
                ),
                &[&role.as_ref(), &limit, &offset],
            )?;
            Ok((users, total))
        }
        None => {
            let total: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
            let users = query_all(
                conn,
                &format!(
                    "SELECT {} FROM users ORDER BY created_at DESC, id LIMIT ?1 OFFSET ?2",
                    USER_COLS
                ),
                &[&limit, &offset],
            )?;
            Ok((users, total))
        }
    }
}

/// Apply a self-service profile update. Returns None if the user doesn't exist.
pub fn update_profile(conn: &Connection, id: &str, input: &UpdateProfile) -> Result<Option<User>> {
    let email = input.email.as_ref().map(|e| e.trim().to_lowercase());
    let name = input.name.as_ref().map(|n| n.trim().to_string());

    UpdateBuilder::new("users", id)
        .with_updated_at()
        .set_opt("name", name)
        .set_opt("email", email)
        .set_opt("university", clearable(&input.university))
        .set_opt("address", clearable(&input.address))
        .execute_returning(conn, USER_COLS)
        .map_err(|e| {
            if e.is_unique_violation() {
                AppError::Conflict(msg::EMAIL_TAKEN.into())
            } else {
                e
            }
        })
}

pub fn update_user_role(conn: &Connection, id: &str, role: Role) -> Result<Option<User>> {
    UpdateBuilder::new("users", id)
        .with_updated_at()
        .set("role", role.as_ref().to_string())
        .execute_returning(conn, USER_COLS)
}

/// Delete a user. Their donations are kept with `donor_id` set to NULL.
pub fn delete_user(conn: &Connection, id: &str) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}

pub fn count_admins(conn: &Connection) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM users WHERE role = ?1",
        params![Role::Admin.as_ref()],
        |row| row.get(0),
    )
    .map_err(Into::into)
}

// ============ Donation Events ============

pub fn create_donation_event(
    conn: &Connection,
    input: &CreateDonationEvent,
    created_by: Option<&str>,
) -> Result<DonationEvent> {
    let id = EntityType::DonationEvent.gen_id();
    let now = now();
    let title = input.title.trim().to_string();
    let details = input.details.trim().to_string();
    let image_url = non_blank(&input.image_url);
    let status = EventStatus::Active;

    conn.execute(
        "INSERT INTO donation_events (id, title, goal_cents, details, image_url, raised_cents, status, created_by, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?7, ?8, ?9)",
        params![
            &id,
            &title,
            input.goal_cents,
            &details,
            &image_url,
            status.as_ref(),
            created_by,
            now,
            now
        ],
    )?;

    Ok(DonationEvent {
        id,
        title,
        goal_cents: input.goal_cents,
        details,
        image_url,
        raised_cents: 0,
        status,
        created_by: created_by.map(str::to_string),
        created_at: now,
        updated_at: now,
    })
}

pub fn get_donation_event_by_id(conn: &Connection, id: &str) -> Result<Option<DonationEvent>> {
    query_one(
        conn,
        &format!("SELECT {} FROM donation_events WHERE id = ?1", DONATION_EVENT_COLS),
        &[&id],
    )
}

/// List events newest first, optionally filtered by status.
pub fn list_donation_events_paginated(
    conn: &Connection,
    status: Option<EventStatus>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<DonationEvent>, i64)> {
    match status {
        Some(status) => {
            let total: i64 = conn.query_row(
                "SELECT COUNT(*) FROM donation_events WHERE status = ?1",
                params![status.as_ref()],
                |row| row.get(0),
            )?;
            let events = query_all(
                conn,
                &format!(
                    "SELECT {} FROM donation_events WHERE status = ?1
                     ORDER BY created_at DESC, id LIMIT ?2 OFFSET ?3",
                    DONATION_EVENT_COLS
                ),
                &[&status.as_ref(), &limit, &offset],
            )?;
            Ok((events, total))
        }
        None => {
            let total: i64 =
                conn.query_row("SELECT COUNT(*) FROM donation_events", [], |row| row.get(0))?;
            let events = query_all(
                conn,
                &format!(
                    "SELECT {} FROM donation_events ORDER BY created_at DESC, id LIMIT ?1 OFFSET ?2",
                    DONATION_EVENT_COLS
                ),
                &[&limit, &offset],
            )?;
            Ok((events, total))
        }
    }
}

/// Apply an admin edit. Lowering the goal to or below the raised total
/// completes the event; raising it never reactivates a completed one.
pub fn update_donation_event(
    conn: &Connection,
    id: &str,
    input: &UpdateDonationEvent,
) -> Result<Option<DonationEvent>> {
    let title = input.title.as_ref().map(|t| t.trim().to_string());
    let details = input.details.as_ref().map(|d| d.trim().to_string());

    let updated: Option<DonationEvent> = UpdateBuilder::new("donation_events", id)
        .with_updated_at()
        .set_opt("title", title)
        .set_opt("details", details)
        .set_opt("goal_cents", input.goal_cents)
        .set_opt("image_url", input.image_url.clone())
        .execute_returning(conn, DONATION_EVENT_COLS)?;

    match updated {
        Some(event) if event.status.settle(event.raised_cents, event.goal_cents) != event.status => {
            settle_event_status(conn, &event.id)
        }
        other => Ok(other),
    }
}

/// Mark an event completed if its raised total has reached the goal.
/// The status guard in the WHERE clause makes this safe against concurrent payments.
fn settle_event_status(conn: &Connection, id: &str) -> Result<Option<DonationEvent>> {
    conn.execute(
        "UPDATE donation_events SET status = 'completed', updated_at = ?1
         WHERE id = ?2 AND status = 'active' AND raised_cents >= goal_cents",
        params![now(), id],
    )?;
    get_donation_event_by_id(conn, id)
}

/// Delete an event. Events with recorded donations cannot be deleted.
pub fn delete_donation_event(conn: &Connection, id: &str) -> Result<bool> {
    if count_donations_for_event(conn, id)? > 0 {
        return Err(AppError::Conflict(msg::EVENT_HAS_DONATIONS.into()));
    }
    let deleted = conn
        .execute("DELETE FROM donation_events WHERE id = ?1", params![id])
        .map_err(AppError::from)
        .map_err(|e| {
            if e.is_foreign_key_violation() {
                AppError::Conflict(msg::EVENT_HAS_DONATIONS.into())
            } else {
                e
            }
        })?;
    Ok(deleted > 0)
}

/// Add a confirmed payment to an event's raised total in one statement,
/// completing the event when the new total reaches its goal.
///
/// The read-modify-write happens inside SQLite so concurrent callers can't
/// lose increments. Completion is never reversed.
pub fn apply_payment_to_event(conn: &Connection, event_id: &str, amount_cents: i64) -> Result<DonationEvent> {
    if amount_cents < 0 {
        return Err(AppError::BadRequest(msg::NEGATIVE_PAYMENT.into()));
    }

    let updated: Option<DonationEvent> = conn
        .query_row(
            &format!(
                "UPDATE donation_events
                 SET raised_cents = raised_cents + ?1,
                     status = CASE
                         WHEN status = 'active' AND raised_cents + ?1 >= goal_cents THEN 'completed'
                         ELSE status
                     END,
                     updated_at = ?2
                 WHERE id = ?3
                 RETURNING {}",
                DONATION_EVENT_COLS
            ),
            params![amount_cents, now(), event_id],
            DonationEvent::from_row,
        )
        .optional()?;

    updated.ok_or_else(|| AppError::NotFound(msg::EVENT_NOT_FOUND.into()))
}

// ============ Donations ============

/// Insert a donation. A second insert for the same `payment_id` is a Conflict.
pub fn create_donation(conn: &Connection, input: &CreateDonation) -> Result<Donation> {
    let id = EntityType::Donation.gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO donations (id, amount_cents, currency, donation_event_id, donor_id, is_anonymous, payment_id, payment_status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            &id,
            input.amount_cents,
            &input.currency,
            &input.donation_event_id,
            &input.donor_id,
            input.is_anonymous as i32,
            &input.payment_id,
            input.payment_status.as_ref(),
            now
        ],
    )
    .map_err(AppError::from)
    .map_err(|e| {
        if e.is_unique_violation() {
            AppError::Conflict(format!(
                "Donation already recorded for payment {}",
                input.payment_id
            ))
        } else {
            e
        }
    })?;

    Ok(Donation {
        id,
        amount_cents: input.amount_cents,
        currency: input.currency.clone(),
        donation_event_id: input.donation_event_id.clone(),
        donor_id: input.donor_id.clone(),
        is_anonymous: input.is_anonymous,
        payment_id: input.payment_id.clone(),
        payment_status: input.payment_status,
        created_at: now,
    })
}

pub fn get_donation_by_payment_id(conn: &Connection, payment_id: &str) -> Result<Option<Donation>> {
    query_one(
        conn,
        &format!("SELECT {} FROM donations WHERE payment_id = ?1", DONATION_COLS),
        &[&payment_id],
    )
}

/// A donor's donations, newest first, each with a summary of its event.
pub fn list_donations_for_donor(conn: &Connection, donor_id: &str) -> Result<Vec<DonorDonation>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM donations d
             LEFT JOIN donation_events e ON e.id = d.donation_event_id
             WHERE d.donor_id = ?1
             ORDER BY d.created_at DESC, d.id",
            DONOR_DONATION_COLS
        ),
        &[&donor_id],
    )
}

pub fn count_donations_for_event(conn: &Connection, event_id: &str) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM donations WHERE donation_event_id = ?1",
        params![event_id],
        |row| row.get(0),
    )
    .map_err(Into::into)
}

pub fn get_dashboard_stats(conn: &Connection) -> Result<DashboardStats> {
    let total_donors: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE role = ?1",
        params![Role::Donor.as_ref()],
        |row| row.get(0),
    )?;
    let (total_events, active_events, total_raised_cents): (i64, i64, i64) = conn.query_row(
        "SELECT COUNT(*),
                COALESCE(SUM(CASE WHEN status = 'active' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(raised_cents), 0)
         FROM donation_events",
        [],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;
    let total_donations: i64 = conn.query_row(
        "SELECT COUNT(*) FROM donations WHERE payment_status = ?1",
        params![PaymentStatus::Succeeded.as_ref()],
        |row| row.get(0),
    )?;

    Ok(DashboardStats {
        total_donors,
        total_events,
        active_events,
        total_raised_cents,
        total_donations,
    })
}
