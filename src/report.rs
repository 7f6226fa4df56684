// 📊 Reporting Queries
// Read-only aggregations over company ⋈ financials that feed the dashboard charts.
//
// Every query is parameterized. Empty results come back as empty Vecs;
// use `non_empty` when a page wants a "no data" message instead.

use crate::error::{DashboardError, Result};
use crate::sectors::{self, Sector};
use chrono::{Datelike, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

// ============================================================================
// YEAR RANGE / BOUNDS
// ============================================================================

/// Years present in the financials table. Both None when the table is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearRange {
    pub min: Option<i32>,
    pub max: Option<i32>,
}

impl YearRange {
    pub fn is_empty(&self) -> bool {
        self.min.is_none() || self.max.is_none()
    }

    pub fn bounds(&self) -> Option<YearBounds> {
        match (self.min, self.max) {
            (Some(start), Some(end)) => Some(YearBounds { start, end }),
            _ => None,
        }
    }

    /// Full range, or (current year, current year) when there is no data
    pub fn bounds_or_sentinel(&self) -> YearBounds {
        self.bounds().unwrap_or_else(|| {
            let year = Utc::now().year();
            YearBounds { start: year, end: year }
        })
    }
}

/// Inclusive year filter. start > end is allowed and matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearBounds {
    pub start: i32,
    pub end: i32,
}

impl YearBounds {
    pub fn new(start: i32, end: i32) -> Self {
        YearBounds { start, end }
    }

    pub fn contains(&self, year: i32) -> bool {
        self.start <= year && year <= self.end
    }

    /// Parse free-text year inputs
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        match (start.trim().parse::<i32>(), end.trim().parse::<i32>()) {
            (Ok(start), Ok(end)) => Ok(YearBounds { start, end }),
            _ => Err(DashboardError::InvalidYearInput {
                start: start.to_string(),
                end: end.to_string(),
            }),
        }
    }

    /// Parse inputs, falling back to the full available range on bad input.
    /// The parse error is handed back so the page can still show it.
    pub fn resolve(start: &str, end: &str, available: &YearRange) -> (Self, Option<DashboardError>) {
        match Self::parse(start, end) {
            Ok(bounds) => (bounds, None),
            Err(err) => {
                tracing::debug!(start, end, "invalid year input, using full range");
                (available.bounds_or_sentinel(), Some(err))
            }
        }
    }
}

// ============================================================================
// ROW TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanySummary {
    pub cvr: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPoint {
    pub year: i32,
    pub profit_loss: Option<f64>,
    pub equity: Option<f64>,
    pub return_on_assets: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonPoint {
    pub cvr: i64,
    pub year: i32,
    pub profit_loss: Option<f64>,
    pub equity: Option<f64>,
    pub return_on_assets: Option<f64>,
}

/// Most recent year of financials for one company
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialSnapshot {
    pub year: i32,
    pub profit_loss: Option<f64>,
    pub equity: Option<f64>,
    pub return_on_assets: Option<f64>,
    pub solvency_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyProfile {
    pub cvr: i64,
    pub name: Option<String>,
    pub sector_code: Option<String>,
    pub sector: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub establishment_date: Option<String>,
    pub purpose: Option<String>,
    /// None when the company has no financial rows at all
    pub latest: Option<FinancialSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorPerformance {
    pub sector_code: Option<String>,
    pub sector: String,
    pub year: i32,
    pub avg_gross_profit_loss: Option<f64>,
    pub avg_equity: Option<f64>,
    pub avg_assets: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorHealth {
    pub sector_code: Option<String>,
    pub sector: String,
    pub year: i32,
    pub avg_solvency_ratio: Option<f64>,
    pub avg_return_on_assets: Option<f64>,
    pub avg_return_on_investment: Option<f64>,
    pub avg_current_ratio: Option<f64>,
}

/// One point of a per-sector line chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorSeriesPoint {
    pub sector: String,
    pub year: i32,
    pub value: Option<f64>,
}

// ============================================================================
// HEALTH METRIC
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthMetric {
    #[serde(rename = "avg_solvency_ratio")]
    SolvencyRatio,
    #[serde(rename = "avg_return_on_assets")]
    ReturnOnAssets,
    #[serde(rename = "avg_return_on_investment")]
    ReturnOnInvestment,
    #[serde(rename = "avg_current_ratio")]
    CurrentRatio,
}

impl HealthMetric {
    pub const ALL: [HealthMetric; 4] = [
        HealthMetric::SolvencyRatio,
        HealthMetric::ReturnOnAssets,
        HealthMetric::ReturnOnInvestment,
        HealthMetric::CurrentRatio,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            HealthMetric::SolvencyRatio => "avg_solvency_ratio",
            HealthMetric::ReturnOnAssets => "avg_return_on_assets",
            HealthMetric::ReturnOnInvestment => "avg_return_on_investment",
            HealthMetric::CurrentRatio => "avg_current_ratio",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            HealthMetric::SolvencyRatio => "Average Solvency Ratio by Sector Over Time",
            HealthMetric::ReturnOnAssets => "Average ROA by Sector Over Time",
            HealthMetric::ReturnOnInvestment => "Average ROI by Sector Over Time",
            HealthMetric::CurrentRatio => "Average Current Ratio by Sector Over Time",
        }
    }

    pub fn from_key(key: &str) -> Option<HealthMetric> {
        HealthMetric::ALL.iter().copied().find(|m| m.key() == key)
    }

    pub fn value_of(&self, row: &SectorHealth) -> Option<f64> {
        match self {
            HealthMetric::SolvencyRatio => row.avg_solvency_ratio,
            HealthMetric::ReturnOnAssets => row.avg_return_on_assets,
            HealthMetric::ReturnOnInvestment => row.avg_return_on_investment,
            HealthMetric::CurrentRatio => row.avg_current_ratio,
        }
    }
}

fn sector_label(code: Option<&str>) -> String {
    match code {
        Some(code) => sectors::label_for_code(code),
        None => "Unknown Sector".to_string(),
    }
}

/// Turn an empty result into `NoDataAvailable`
pub fn non_empty<T>(rows: Vec<T>) -> Result<Vec<T>> {
    if rows.is_empty() {
        Err(DashboardError::NoDataAvailable)
    } else {
        Ok(rows)
    }
}

// ============================================================================
// QUERIES
// ============================================================================

pub struct Reporting<'a> {
    conn: &'a Connection,
}

impl<'a> Reporting<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Reporting { conn }
    }

    pub(crate) fn conn(&self) -> &Connection {
        self.conn
    }

    pub fn year_range(&self) -> Result<YearRange> {
        let range = self.conn.query_row(
            "SELECT MIN(year), MAX(year) FROM financials",
            [],
            |row| {
                Ok(YearRange {
                    min: row.get(0)?,
                    max: row.get(1)?,
                })
            },
        )?;

        Ok(range)
    }

    pub fn sector_choices(&self) -> Vec<&'static str> {
        sectors::sector_choices()
    }

    /// Companies in one sector, sorted by name
    pub fn companies_in_sector(&self, sector: Sector) -> Result<Vec<CompanySummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT cvr_number, name
             FROM company
             WHERE industry_sector = ?1
             ORDER BY name, cvr_number",
        )?;

        let companies = stmt
            .query_map([sector.code()], |row| {
                let name: Option<String> = row.get(1)?;
                Ok(CompanySummary {
                    cvr: row.get(0)?,
                    name: name.unwrap_or_default(),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        tracing::debug!(sector = sector.code(), count = companies.len(), "companies in sector");
        Ok(companies)
    }

    /// Yearly profit/loss, equity and ROA within `bounds`, ascending by year
    pub fn financial_history(&self, cvr: i64, bounds: YearBounds) -> Result<Vec<HistoryPoint>> {
        let mut stmt = self.conn.prepare(
            "SELECT year, profit_loss, equity, return_on_assets
             FROM financials
             WHERE cvr = ?1 AND year BETWEEN ?2 AND ?3
             ORDER BY year",
        )?;

        let history = stmt
            .query_map(params![cvr, bounds.start, bounds.end], |row| {
                Ok(HistoryPoint {
                    year: row.get(0)?,
                    profit_loss: row.get(1)?,
                    equity: row.get(2)?,
                    return_on_assets: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(history)
    }

    /// Side-by-side history of two companies, ordered by year then CVR
    pub fn financial_history_for_two(
        &self,
        first: i64,
        second: i64,
        bounds: YearBounds,
    ) -> Result<Vec<ComparisonPoint>> {
        let mut stmt = self.conn.prepare(
            "SELECT cvr, year, profit_loss, equity, return_on_assets
             FROM financials
             WHERE cvr IN (?1, ?2) AND year BETWEEN ?3 AND ?4
             ORDER BY year, cvr",
        )?;

        let rows = stmt
            .query_map(params![first, second, bounds.start, bounds.end], |row| {
                Ok(ComparisonPoint {
                    cvr: row.get(0)?,
                    year: row.get(1)?,
                    profit_loss: row.get(2)?,
                    equity: row.get(3)?,
                    return_on_assets: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Company attributes plus the most recent year of financials.
    /// Ok(None) for an unknown CVR.
    pub fn company_profile(&self, cvr: i64) -> Result<Option<CompanyProfile>> {
        let company = self
            .conn
            .query_row(
                "SELECT name, industry_sector, email, phone_number, establishment_date, purpose
                 FROM company
                 WHERE cvr_number = ?1",
                [cvr],
                |row| {
                    let sector_code: Option<String> = row.get(1)?;
                    Ok(CompanyProfile {
                        cvr,
                        name: row.get(0)?,
                        sector: sector_label(sector_code.as_deref()),
                        sector_code,
                        email: row.get(2)?,
                        phone_number: row.get(3)?,
                        establishment_date: row.get(4)?,
                        purpose: row.get(5)?,
                        latest: None,
                    })
                },
            )
            .optional()?;

        let Some(mut profile) = company else {
            return Ok(None);
        };

        profile.latest = self
            .conn
            .query_row(
                "SELECT year, profit_loss, equity, return_on_assets, solvency_ratio
                 FROM financials
                 WHERE cvr = ?1
                 ORDER BY year DESC
                 LIMIT 1",
                [cvr],
                |row| {
                    Ok(FinancialSnapshot {
                        year: row.get(0)?,
                        profit_loss: row.get(1)?,
                        equity: row.get(2)?,
                        return_on_assets: row.get(3)?,
                        solvency_ratio: row.get(4)?,
                    })
                },
            )
            .optional()?;

        Ok(Some(profile))
    }

    // ========================================================================
    // SECTOR AGGREGATES
    // ========================================================================

    /// Average gross profit/loss, equity and assets per sector and year
    pub fn sector_performance(&self) -> Result<Vec<SectorPerformance>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.industry_sector, f.year,
                    AVG(f.gross_profit_loss), AVG(f.equity), AVG(f.assets)
             FROM financials f
             JOIN company c ON f.cvr = c.cvr_number
             GROUP BY c.industry_sector, f.year
             ORDER BY c.industry_sector, f.year",
        )?;

        let rows = stmt
            .query_map([], |row| {
                let code: Option<String> = row.get(0)?;
                Ok(SectorPerformance {
                    sector: sector_label(code.as_deref()),
                    sector_code: code,
                    year: row.get(1)?,
                    avg_gross_profit_loss: row.get(2)?,
                    avg_equity: row.get(3)?,
                    avg_assets: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    pub fn avg_equity_by_sector_by_year(&self) -> Result<Vec<SectorSeriesPoint>> {
        Ok(self
            .sector_performance()?
            .into_iter()
            .map(|row| SectorSeriesPoint {
                sector: row.sector,
                year: row.year,
                value: row.avg_equity,
            })
            .collect())
    }

    /// Average solvency, ROA, ROI and current ratio per sector and year
    pub fn financial_health(&self) -> Result<Vec<SectorHealth>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.industry_sector, f.year,
                    AVG(f.solvency_ratio),
                    AVG(f.return_on_assets),
                    AVG(f.return_on_investment),
                    AVG(f.current_ratio)
             FROM financials f
             JOIN company c ON f.cvr = c.cvr_number
             GROUP BY c.industry_sector, f.year
             ORDER BY c.industry_sector, f.year",
        )?;

        let rows = stmt
            .query_map([], |row| {
                let code: Option<String> = row.get(0)?;
                Ok(SectorHealth {
                    sector: sector_label(code.as_deref()),
                    sector_code: code,
                    year: row.get(1)?,
                    avg_solvency_ratio: row.get(2)?,
                    avg_return_on_assets: row.get(3)?,
                    avg_return_on_investment: row.get(4)?,
                    avg_current_ratio: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// One health metric as a per-sector series
    pub fn avg_by_sector_by_year(&self, metric: HealthMetric) -> Result<Vec<SectorSeriesPoint>> {
        Ok(self
            .financial_health()?
            .into_iter()
            .map(|row| SectorSeriesPoint {
                value: metric.value_of(&row),
                sector: row.sector,
                year: row.year,
            })
            .collect())
    }
}
