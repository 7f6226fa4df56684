// Shared fixtures for unit tests

use crate::db;
use rusqlite::{params, Connection};

pub struct Fin {
    pub cvr: i64,
    pub year: i32,
    pub profit_loss: Option<f64>,
    pub equity: Option<f64>,
    pub assets: Option<f64>,
    pub roa: Option<f64>,
    pub roi: Option<f64>,
    pub solvency: Option<f64>,
    pub current: Option<f64>,
    pub revenue: Option<f64>,
    pub external_expenses: Option<f64>,
    pub employee_expense: Option<f64>,
    pub operating_profit: Option<f64>,
    pub cash: Option<f64>,
    pub profit_margin: Option<f64>,
}

impl Fin {
    pub fn new(cvr: i64, year: i32) -> Self {
        Fin {
            cvr,
            year,
            profit_loss: None,
            equity: None,
            assets: None,
            roa: None,
            roi: None,
            solvency: None,
            current: None,
            revenue: None,
            external_expenses: None,
            employee_expense: None,
            operating_profit: None,
            cash: None,
            profit_margin: None,
        }
    }
}

pub fn reporting_conn() -> Connection {
    let conn = db::open_in_memory().unwrap();
    db::setup_reporting_schema(&conn).unwrap();
    conn
}

pub fn add_company(conn: &Connection, cvr: i64, name: &str, sector: &str) {
    conn.execute(
        "INSERT INTO company (cvr_number, name, industry_sector, email, phone_number, establishment_date, purpose)
         VALUES (?1, ?2, ?3, ?4, NULL, '2001-05-01', 'Making things')",
        params![cvr, name, sector, format!("info@{}.dk", cvr)],
    )
    .unwrap();
}

pub fn add_financials(conn: &Connection, f: &Fin) {
    conn.execute(
        "INSERT INTO financials (
            cvr, year, profit_loss, gross_profit_loss, equity, assets,
            return_on_assets, return_on_investment, solvency_ratio, current_ratio,
            revenue, external_expenses, employee_expense,
            profit_loss_from_ordinary_operating_activities, cash_and_cash_equivalents, profit_margin
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            f.cvr,
            f.year,
            f.profit_loss,
            f.profit_loss,
            f.equity,
            f.assets,
            f.roa,
            f.roi,
            f.solvency,
            f.current,
            f.revenue,
            f.external_expenses,
            f.employee_expense,
            f.operating_profit,
            f.cash,
            f.profit_margin,
        ],
    )
    .unwrap();
}
