// 🗄️ Database - connection setup + schema
//
// Tables:
// - users      (owned here: credentials + sector preferences)
// - company    (populated externally, read-only)
// - financials (populated externally, read-only)

use crate::error::Result;
use rusqlite::Connection;
use std::path::Path;

/// Open the SQLite file at `path`
pub fn open(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;

    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    tracing::debug!(path = %path.display(), "database opened");
    Ok(conn)
}

/// Fresh in-memory database (tests, demos)
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    Ok(conn)
}

/// Ensure the tables this crate owns exist. Never drops anything.
pub fn setup_database(conn: &Connection) -> Result<()> {
    // ==========================================================================
    // Users Table (append-only: no update/delete paths exist)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            username TEXT PRIMARY KEY,
            password_hash TEXT NOT NULL,
            sectors TEXT NOT NULL DEFAULT '',
            created_at TEXT
        )",
        [],
    )?;

    migrate_users_table(conn)?;

    Ok(())
}

/// Column names of `table`, in declaration order
pub fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;

    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(columns)
}

/// Bring an older `users(username, password, sectors)` table up to the
/// current shape. Returns the number of columns changed.
pub fn migrate_users_table(conn: &Connection) -> Result<usize> {
    let columns = table_columns(conn, "users")?;
    let has = |name: &str| columns.iter().any(|c| c == name);

    let mut changed = 0;

    if !has("password_hash") && has("password") {
        conn.execute("ALTER TABLE users RENAME COLUMN password TO password_hash", [])?;
        changed += 1;
    }

    if !has("sectors") {
        conn.execute("ALTER TABLE users ADD COLUMN sectors TEXT NOT NULL DEFAULT ''", [])?;
        changed += 1;
    }

    if !has("created_at") {
        conn.execute("ALTER TABLE users ADD COLUMN created_at TEXT", [])?;
        changed += 1;
    }

    if changed > 0 {
        tracing::info!(changed, "migrated users table");
    }
    Ok(changed)
}

/// Create empty `company` / `financials` tables if they are missing.
///
/// The reporting tables are filled by an external loader; this only gives a
/// fresh database the shape the reporting queries expect.
pub fn setup_reporting_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS company (
            cvr_number INTEGER PRIMARY KEY,
            name TEXT,
            industry_sector TEXT,
            email TEXT,
            phone_number TEXT,
            establishment_date TEXT,
            purpose TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS financials (
            cvr INTEGER NOT NULL REFERENCES company(cvr_number),
            year INTEGER NOT NULL,
            profit_loss REAL,
            gross_profit_loss REAL,
            equity REAL,
            assets REAL,
            return_on_assets REAL,
            return_on_investment REAL,
            solvency_ratio REAL,
            current_ratio REAL,
            revenue REAL,
            external_expenses REAL,
            employee_expense REAL,
            profit_loss_from_ordinary_operating_activities REAL,
            cash_and_cash_equivalents REAL,
            profit_margin REAL,
            PRIMARY KEY (cvr, year)
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_company_sector ON company(industry_sector)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_financials_year ON financials(year)",
        [],
    )?;

    Ok(())
}

/// Check whether a table exists
pub fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [name],
        |row| row.get(0),
    )?;

    Ok(count > 0)
}
