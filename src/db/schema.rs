use rusqlite::Connection;

/// Initialize the database schema.
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA foreign_keys = ON;

        -- Users (donors and admins)
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'donor' CHECK (role IN ('donor', 'admin')),
            university TEXT,
            address TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_users_role ON users(role);

        -- Donation events (fundraising campaigns)
        CREATE TABLE IF NOT EXISTS donation_events (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            goal_cents INTEGER NOT NULL CHECK (goal_cents > 0),
            details TEXT NOT NULL,
            image_url TEXT,
            raised_cents INTEGER NOT NULL DEFAULT 0 CHECK (raised_cents >= 0),
            status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'completed')),
            created_by TEXT REFERENCES users(id) ON DELETE SET NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_donation_events_created ON donation_events(created_at);
        CREATE INDEX IF NOT EXISTS idx_donation_events_status ON donation_events(status);

        -- Raised totals only grow and completion is final
        CREATE TRIGGER IF NOT EXISTS donation_events_raised_monotonic
        BEFORE UPDATE OF raised_cents ON donation_events
        WHEN NEW.raised_cents < OLD.raised_cents
        BEGIN
            SELECT RAISE(ABORT, 'raised amount cannot decrease');
        END;

        CREATE TRIGGER IF NOT EXISTS donation_events_completion_final
        BEFORE UPDATE OF status ON donation_events
        WHEN OLD.status = 'completed' AND NEW.status != 'completed'
        BEGIN
            SELECT RAISE(ABORT, 'completed events cannot be reactivated');
        END;

        -- Donations (one row per confirmed gateway payment)
        -- payment_id UNIQUE is what prevents recording the same payment twice
        CREATE TABLE IF NOT EXISTS donations (
            id TEXT PRIMARY KEY,
            amount_cents INTEGER NOT NULL CHECK (amount_cents > 0),
            currency TEXT NOT NULL,
            donation_event_id TEXT NOT NULL REFERENCES donation_events(id) ON DELETE RESTRICT,
            donor_id TEXT REFERENCES users(id) ON DELETE SET NULL,
            is_anonymous INTEGER NOT NULL DEFAULT 0,
            payment_id TEXT NOT NULL UNIQUE,
            payment_status TEXT NOT NULL DEFAULT 'pending'
                CHECK (payment_status IN ('pending', 'succeeded', 'failed')),
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_donations_donor ON donations(donor_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_donations_event ON donations(donation_event_id);

        -- Succeeded donations are immutable (donor_id is excluded so user deletion can null it)
        CREATE TRIGGER IF NOT EXISTS donations_succeeded_immutable
        BEFORE UPDATE OF amount_cents, currency, donation_event_id, is_anonymous, payment_id, payment_status
        ON donations
        WHEN OLD.payment_status = 'succeeded'
        BEGIN
            SELECT RAISE(ABORT, 'succeeded donations are immutable');
        END;
        "#,
    )?;

    Ok(())
}
