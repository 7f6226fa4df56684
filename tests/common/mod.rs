#![allow(dead_code)]

use danbiz_insight::{db, HashingConfig, PasswordService};
use rusqlite::{params, Connection};
use std::path::Path;

/// Cheap Argon2 parameters so tests stay fast
pub fn fast_passwords() -> PasswordService {
    PasswordService::new(HashingConfig {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    })
    .unwrap()
}

/// File-backed database with all three tables
pub fn open_full(path: &Path) -> Connection {
    let conn = db::open(path).unwrap();
    db::setup_database(&conn).unwrap();
    db::setup_reporting_schema(&conn).unwrap();
    conn
}

pub fn add_company(conn: &Connection, cvr: i64, name: &str, sector: &str) {
    conn.execute(
        "INSERT INTO company (cvr_number, name, industry_sector, email, phone_number, establishment_date, purpose)
         VALUES (?1, ?2, ?3, NULL, '+45 1234 5678', NULL, NULL)",
        params![cvr, name, sector],
    )
    .unwrap();
}

pub fn add_year(conn: &Connection, cvr: i64, year: i32, profit_loss: f64, equity: f64, roa: f64) {
    conn.execute(
        "INSERT INTO financials (cvr, year, profit_loss, gross_profit_loss, equity, assets, return_on_assets, solvency_ratio)
         VALUES (?1, ?2, ?3, ?3, ?4, ?5, ?6, 0.3)",
        params![cvr, year, profit_loss, equity, equity * 2.0, roa],
    )
    .unwrap();
}

/// Two manufacturing companies with 2019-2023 filings, one IT company
pub fn seed_sector_c(conn: &Connection) {
    add_company(conn, 10000002, "Bravo Produktion ApS", "C");
    add_company(conn, 10000001, "Alpha Industri A/S", "C");
    add_company(conn, 20000001, "Data Consult", "J");

    for year in 2019..=2023 {
        add_year(conn, 10000001, year, 1_000.0 * year as f64, 50_000.0, 0.04);
        add_year(conn, 10000002, year, -500.0, 20_000.0, -0.01);
    }
    add_year(conn, 20000001, 2021, 10.0, 100.0, 0.1);
}
