// DanBiz Insight - Core Library
// Credential store + auth flow + reporting queries for the financial dashboard.
// Exposes all modules for use in the CLI, the API server, and tests.

pub mod auth;
pub mod config;
pub mod credentials;
pub mod db;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod password;
pub mod report;
pub mod sectors;

#[cfg(feature = "server")]
pub mod server;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use auth::{AuthFlow, AuthView, Page, Session};
pub use config::{Config, HashingConfig, ServerConfig};
pub use credentials::{CredentialStore, UserRecord};
pub use error::{DashboardError, Result};
pub use metrics::{CompanyYear, EfficiencyRow, LiquidityRow};
pub use password::{HashError, PasswordService};
pub use report::{
    non_empty, CompanyProfile, CompanySummary, ComparisonPoint, FinancialSnapshot, HealthMetric,
    HistoryPoint, Reporting, SectorHealth, SectorPerformance, SectorSeriesPoint, YearBounds,
    YearRange,
};
pub use sectors::Sector;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
