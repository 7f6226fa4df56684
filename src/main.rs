use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use danbiz_insight::{
    config::Config, db, logging, non_empty, AuthFlow, DashboardError, HealthMetric,
    PasswordService, Reporting, Sector, Session, YearBounds,
};
use rusqlite::Connection;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "danbiz", version, about = "DanBiz Insight - company financials by sector")]
struct Cli {
    /// Config file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database file, overrides the config
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Username for reporting commands
    #[arg(long, global = true, env = "DANBIZ_USER")]
    user: Option<String>,

    /// Password for reporting commands
    #[arg(long, global = true, env = "DANBIZ_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the users table (and, with --reporting-schema, empty company/financials tables)
    Init {
        #[arg(long)]
        reporting_schema: bool,
    },
    /// Register a new account; sectors are codes (C) or names (Manufacturing)
    Register {
        username: String,
        password: String,
        sectors: Vec<String>,
    },
    /// Check credentials
    Login { username: String, password: String },
    /// List the 20 sectors
    Sectors,
    /// Show the available year range
    Years,
    /// Companies in a sector, by name
    Companies { sector: String },
    /// Profit/loss, equity and ROA history for one company
    History {
        cvr: i64,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },
    /// Side-by-side history for two companies
    Compare {
        first: i64,
        second: i64,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },
    /// Company information and most recent financials
    Profile { cvr: i64 },
    /// Average gross profit/loss, equity and assets by sector and year
    SectorOverview,
    /// One financial health metric by sector and year
    Health {
        /// avg_solvency_ratio | avg_return_on_assets | avg_return_on_investment | avg_current_ratio
        metric: String,
    },
    /// Company-years with positive margin, ROI and growth
    Opportunities,
    /// All company-years with equity/assets growth
    Comparison,
    /// Operating margin and expense ratio
    Efficiency,
    /// Current ratio, solvency ratio and cash
    Liquidity,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(path) = &cli.database {
        config.database_path = path.clone();
    }
    logging::init(&config.log_filter);

    let conn = db::open(&config.database_path)
        .with_context(|| format!("Failed to open database {}", config.database_path.display()))?;
    let passwords = PasswordService::new(config.hashing).context("Invalid hashing configuration")?;

    let flow = AuthFlow::new(&conn, &passwords);
    flow.initialize()?;

    let mut session = Session::new();
    session.begin_exploration();

    match cli.command {
        Command::Init { reporting_schema } => {
            if reporting_schema {
                db::setup_reporting_schema(&conn)?;
            }
            println!("✓ Database initialized: {}", config.database_path.display());
        }
        Command::Register {
            username,
            password,
            sectors,
        } => {
            let sectors = parse_sectors(&sectors)?;
            flow.toggle_view(&mut session);
            flow.submit_register(&mut session, &username, &password, &sectors)?;
            println!("✓ Registration successful. Welcome, {}!", username);
        }
        Command::Login { username, password } => {
            flow.submit_login(&mut session, &username, &password)?;
            println!("✓ Welcome back, {}!", username);
        }
        reporting => {
            let (user, password) = match (&cli.user, &cli.password) {
                (Some(user), Some(password)) => (user.as_str(), password.as_str()),
                _ => bail!("Reporting commands need --user and --password (or DANBIZ_USER / DANBIZ_PASSWORD)"),
            };
            flow.submit_login(&mut session, user, password)?;
            run_report(&conn, reporting)?;
        }
    }

    Ok(())
}

fn run_report(conn: &Connection, command: Command) -> Result<()> {
    let reporting = Reporting::new(conn);

    match command {
        Command::Sectors => print_json(&reporting.sector_choices()),
        Command::Years => print_json(&reporting.year_range()?),
        Command::Companies { sector } => {
            let sector = Sector::parse(&sector)
                .with_context(|| format!("Unknown sector: {}", sector))?;
            print_rows(reporting.companies_in_sector(sector)?)
        }
        Command::History { cvr, start, end } => {
            let bounds = year_bounds(&reporting, start, end)?;
            print_rows(reporting.financial_history(cvr, bounds)?)
        }
        Command::Compare {
            first,
            second,
            start,
            end,
        } => {
            let bounds = year_bounds(&reporting, start, end)?;
            print_rows(reporting.financial_history_for_two(first, second, bounds)?)
        }
        Command::Profile { cvr } => match reporting.company_profile(cvr)? {
            Some(profile) => print_json(&profile),
            None => {
                eprintln!("Company information not available.");
                Ok(())
            }
        },
        Command::SectorOverview => print_rows(reporting.sector_performance()?),
        Command::Health { metric } => {
            let metric = HealthMetric::from_key(&metric)
                .with_context(|| format!("Unknown metric: {}", metric))?;
            eprintln!("{}", metric.title());
            print_rows(reporting.avg_by_sector_by_year(metric)?)
        }
        Command::Opportunities => print_rows(reporting.investment_opportunities()?),
        Command::Comparison => print_rows(reporting.company_comparison()?),
        Command::Efficiency => print_rows(reporting.operational_efficiency()?),
        Command::Liquidity => print_rows(reporting.liquidity_trends()?),
        Command::Init { .. } | Command::Register { .. } | Command::Login { .. } => Ok(()),
    }
}

/// Text year inputs; bad input falls back to the full range with a warning
fn year_bounds(reporting: &Reporting, start: Option<String>, end: Option<String>) -> Result<YearBounds> {
    let available = reporting.year_range()?;
    let full = available.bounds_or_sentinel();

    let start = start.unwrap_or_else(|| full.start.to_string());
    let end = end.unwrap_or_else(|| full.end.to_string());

    let (bounds, warning) = YearBounds::resolve(&start, &end, &available);
    if let Some(warning) = warning {
        eprintln!("⚠️  {}", warning);
    }
    Ok(bounds)
}

fn parse_sectors(raw: &[String]) -> Result<Vec<Sector>> {
    raw.iter()
        .map(|s| Sector::parse(s).with_context(|| format!("Unknown sector: {}", s)))
        .collect()
}

fn print_rows<T: Serialize>(rows: Vec<T>) -> Result<()> {
    match render_rows(rows)? {
        Some(json) => println!("{}", json),
        None => eprintln!("{}", DashboardError::NoDataAvailable),
    }
    Ok(())
}

/// Pretty JSON for the rows, or `None` when there is nothing to show
fn render_rows<T: Serialize>(rows: Vec<T>) -> Result<Option<String>> {
    match non_empty(rows) {
        Ok(rows) => Ok(Some(serde_json::to_string_pretty(&rows)?)),
        Err(DashboardError::NoDataAvailable) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
