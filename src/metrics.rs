// 📈 Derived Metrics - per-company views computed over consecutive years
//
// - growth: (v_t - v_{t-1}) / v_{t-1}, only when year t-1 exists for the same company
// - ratios: numerator / revenue
// Anything undefined (missing value, gap year, zero denominator) is None.

use crate::error::Result;
use crate::report::Reporting;
use crate::sectors;
use serde::Serialize;

// ============================================================================
// ARITHMETIC
// ============================================================================

/// numerator / denominator, or None when either is missing, the denominator
/// is zero, or the result is not finite
pub fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let (n, d) = (numerator?, denominator?);
    if d == 0.0 {
        return None;
    }

    let value = n / d;
    value.is_finite().then_some(value)
}

/// Period-over-period percentage change
pub fn growth_rate(previous: Option<f64>, current: Option<f64>) -> Option<f64> {
    let previous = previous?;
    ratio(current.map(|c| c - previous), Some(previous))
}

/// Walk rows grouped by company (contiguous, ascending year) and compute the
/// growth of one field against the immediately preceding year.
fn growth_series<T>(
    rows: &[T],
    key: impl Fn(&T) -> (i64, i32),
    value: impl Fn(&T) -> Option<f64>,
) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        let (cvr, year) = key(row);
        let previous = i
            .checked_sub(1)
            .map(|p| &rows[p])
            .filter(|prev| key(*prev) == (cvr, year - 1));

        out.push(previous.and_then(|prev| growth_rate(value(prev), value(row))));
    }

    out
}

// ============================================================================
// ROW TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyYear {
    pub cvr: i64,
    pub company_name: String,
    pub sector: String,
    pub year: i32,
    pub profit_margin: Option<f64>,
    pub return_on_investment: Option<f64>,
    pub equity: Option<f64>,
    pub assets: Option<f64>,
    pub equity_growth: Option<f64>,
    pub assets_growth: Option<f64>,
}

impl CompanyYear {
    /// Positive margin, ROI, equity growth and assets growth
    pub fn is_opportunity(&self) -> bool {
        [
            self.profit_margin,
            self.return_on_investment,
            self.equity_growth,
            self.assets_growth,
        ]
        .iter()
        .all(|v| matches!(v, Some(x) if *x > 0.0))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EfficiencyRow {
    pub cvr: i64,
    pub company_name: String,
    pub year: i32,
    pub revenue: Option<f64>,
    pub external_expenses: Option<f64>,
    pub employee_expense: Option<f64>,
    pub operating_profit: Option<f64>,
    pub operating_margin: Option<f64>,
    pub expense_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiquidityRow {
    pub cvr: i64,
    pub company_name: String,
    pub year: i32,
    pub current_ratio: Option<f64>,
    pub solvency_ratio: Option<f64>,
    pub cash_and_cash_equivalents: Option<f64>,
}

// ============================================================================
// QUERIES
// ============================================================================

impl<'a> Reporting<'a> {
    /// Every company-year with equity and assets growth over the prior year
    pub fn company_comparison(&self) -> Result<Vec<CompanyYear>> {
        let mut stmt = self.conn().prepare(
            "SELECT c.cvr_number, c.name, c.industry_sector, f.year,
                    f.profit_margin, f.return_on_investment, f.equity, f.assets
             FROM financials f
             JOIN company c ON f.cvr = c.cvr_number
             ORDER BY c.name, c.cvr_number, f.year",
        )?;

        let mut rows = stmt
            .query_map([], |row| {
                let name: Option<String> = row.get(1)?;
                let sector: Option<String> = row.get(2)?;
                Ok(CompanyYear {
                    cvr: row.get(0)?,
                    company_name: name.unwrap_or_default(),
                    sector: sector
                        .map(|code| sectors::label_for_code(&code))
                        .unwrap_or_else(|| "Unknown Sector".to_string()),
                    year: row.get(3)?,
                    profit_margin: row.get(4)?,
                    return_on_investment: row.get(5)?,
                    equity: row.get(6)?,
                    assets: row.get(7)?,
                    equity_growth: None,
                    assets_growth: None,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let equity_growth = growth_series(&rows, |r| (r.cvr, r.year), |r| r.equity);
        let assets_growth = growth_series(&rows, |r| (r.cvr, r.year), |r| r.assets);

        for ((row, equity), assets) in rows.iter_mut().zip(equity_growth).zip(assets_growth) {
            row.equity_growth = equity;
            row.assets_growth = assets;
        }

        Ok(rows)
    }

    /// Company-years where margin, ROI and both growth rates are positive
    pub fn investment_opportunities(&self) -> Result<Vec<CompanyYear>> {
        Ok(self
            .company_comparison()?
            .into_iter()
            .filter(CompanyYear::is_opportunity)
            .collect())
    }

    /// Operating margin and expense ratio per company-year
    pub fn operational_efficiency(&self) -> Result<Vec<EfficiencyRow>> {
        let mut stmt = self.conn().prepare(
            "SELECT c.cvr_number, c.name, f.year,
                    f.revenue, f.external_expenses, f.employee_expense,
                    f.profit_loss_from_ordinary_operating_activities
             FROM financials f
             JOIN company c ON f.cvr = c.cvr_number
             ORDER BY c.name, c.cvr_number, f.year",
        )?;

        let rows = stmt
            .query_map([], |row| {
                let name: Option<String> = row.get(1)?;
                let revenue: Option<f64> = row.get(3)?;
                let external: Option<f64> = row.get(4)?;
                let employee: Option<f64> = row.get(5)?;
                let operating: Option<f64> = row.get(6)?;

                let expenses = external.zip(employee).map(|(e, p)| e + p);

                Ok(EfficiencyRow {
                    cvr: row.get(0)?,
                    company_name: name.unwrap_or_default(),
                    year: row.get(2)?,
                    revenue,
                    external_expenses: external,
                    employee_expense: employee,
                    operating_profit: operating,
                    operating_margin: ratio(operating, revenue),
                    expense_ratio: ratio(expenses, revenue),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Current ratio, solvency ratio and cash per company-year
    pub fn liquidity_trends(&self) -> Result<Vec<LiquidityRow>> {
        let mut stmt = self.conn().prepare(
            "SELECT c.cvr_number, c.name, f.year,
                    f.current_ratio, f.solvency_ratio, f.cash_and_cash_equivalents
             FROM financials f
             JOIN company c ON f.cvr = c.cvr_number
             ORDER BY c.name, c.cvr_number, f.year",
        )?;

        let rows = stmt
            .query_map([], |row| {
                let name: Option<String> = row.get(1)?;
                Ok(LiquidityRow {
                    cvr: row.get(0)?,
                    company_name: name.unwrap_or_default(),
                    year: row.get(2)?,
                    current_ratio: row.get(3)?,
                    solvency_ratio: row.get(4)?,
                    cash_and_cash_equivalents: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{add_company, add_financials, reporting_conn, Fin};

    #[test]
    fn test_ratio_division_by_zero() {
        assert_eq!(ratio(Some(5.0), Some(0.0)), None);
        assert_eq!(ratio(Some(5.0), None), None);
        assert_eq!(ratio(None, Some(2.0)), None);
        assert_eq!(ratio(Some(5.0), Some(2.0)), Some(2.5));
    }

    #[test]
    fn test_growth_rate() {
        assert_eq!(growth_rate(Some(100.0), Some(110.0)), Some(0.1));
        assert_eq!(growth_rate(Some(0.0), Some(10.0)), None);
        assert_eq!(growth_rate(None, Some(10.0)), None);
        assert_eq!(growth_rate(Some(10.0), None), None);
        assert_eq!(growth_rate(Some(-50.0), Some(-25.0)), Some(-0.5));
    }

    fn seeded() -> rusqlite::Connection {
        let conn = reporting_conn();
        add_company(&conn, 1, "Alfa", "C");
        add_company(&conn, 2, "Beta", "G");

        // Alfa: 2019, 2020, then a gap to 2022
        for (year, equity, assets) in [(2019, 100.0, 200.0), (2020, 120.0, 210.0), (2022, 150.0, 260.0)] {
            let mut f = Fin::new(1, year);
            f.equity = Some(equity);
            f.assets = Some(assets);
            f.profit_margin = Some(0.1);
            f.roi = Some(0.2);
            f.revenue = Some(1000.0);
            f.external_expenses = Some(300.0);
            f.employee_expense = Some(400.0);
            f.operating_profit = Some(250.0);
            add_financials(&conn, &f);
        }

        // Beta: shrinking, and zero revenue in 2021
        for (year, equity, revenue) in [(2020, 80.0, 500.0), (2021, 60.0, 0.0)] {
            let mut f = Fin::new(2, year);
            f.equity = Some(equity);
            f.assets = Some(100.0);
            f.profit_margin = Some(-0.1);
            f.roi = Some(0.05);
            f.revenue = Some(revenue);
            f.external_expenses = Some(100.0);
            f.operating_profit = Some(-20.0);
            f.current = Some(1.5);
            f.cash = Some(42.0);
            add_financials(&conn, &f);
        }

        conn
    }

    #[test]
    fn test_company_comparison_growth() {
        let conn = seeded();
        let rows = Reporting::new(&conn).company_comparison().unwrap();
        assert_eq!(rows.len(), 5);

        let alfa: Vec<_> = rows.iter().filter(|r| r.cvr == 1).collect();
        assert_eq!(alfa[0].equity_growth, None, "first year has no prior year");
        assert_eq!(alfa[1].equity_growth, Some(0.2));
        assert_eq!(alfa[1].assets_growth, Some(0.05));
        assert_eq!(alfa[2].year, 2022);
        assert_eq!(alfa[2].equity_growth, None, "gap year yields undefined growth");
        assert_eq!(alfa[0].sector, "Manufacturing");

        let beta_2021 = rows.iter().find(|r| r.cvr == 2 && r.year == 2021).unwrap();
        assert_eq!(beta_2021.equity_growth, Some(-0.25));
        assert_eq!(beta_2021.assets_growth, Some(0.0));
    }

    #[test]
    fn test_investment_opportunities() {
        let conn = seeded();
        let picks = Reporting::new(&conn).investment_opportunities().unwrap();

        assert_eq!(picks.len(), 1);
        assert_eq!(picks[0].cvr, 1);
        assert_eq!(picks[0].year, 2020);
    }

    #[test]
    fn test_operational_efficiency() {
        let conn = seeded();
        let rows = Reporting::new(&conn).operational_efficiency().unwrap();

        let alfa = rows.iter().find(|r| r.cvr == 1 && r.year == 2019).unwrap();
        assert_eq!(alfa.operating_margin, Some(0.25));
        assert_eq!(alfa.expense_ratio, Some(0.7));

        let beta_2020 = rows.iter().find(|r| r.cvr == 2 && r.year == 2020).unwrap();
        assert_eq!(beta_2020.expense_ratio, None, "missing employee expense");

        let beta_2021 = rows.iter().find(|r| r.cvr == 2 && r.year == 2021).unwrap();
        assert_eq!(beta_2021.operating_margin, None, "zero revenue");
    }

    #[test]
    fn test_liquidity_trends() {
        let conn = seeded();
        let rows = Reporting::new(&conn).liquidity_trends().unwrap();

        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].company_name, "Alfa");
        let beta: Vec<_> = rows.iter().filter(|r| r.cvr == 2).collect();
        assert!(beta.iter().all(|r| r.current_ratio == Some(1.5)));
        assert_eq!(beta[0].cash_and_cash_equivalents, Some(42.0));
    }
}
