// ⚠️ Error Taxonomy
// Every failure that leaves the auth flow or the reporting layer is one of these.
// Raw storage errors are wrapped as a `source`, never shown as the message.

use thiserror::Error;

/// Errors surfaced to the presentation layer
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Bad credentials. The message is the same for unknown users and wrong passwords.
    #[error("Invalid username or password.")]
    AuthenticationFailed,

    /// Registration collided with an existing username
    #[error("Username already exists. Please try a different one.")]
    DuplicateUsername,

    /// Year bounds could not be parsed as integers
    #[error("Please enter valid years (got start={start:?}, end={end:?})")]
    InvalidYearInput { start: String, end: String },

    /// A query returned nothing. Displayable, not a failure of the system.
    #[error("No data available.")]
    NoDataAvailable,

    /// The underlying store is unreachable or corrupt
    #[error("The data store is unavailable.")]
    StoreUnavailable(#[source] rusqlite::Error),

    /// An auth transition was requested from a state that does not allow it
    #[error("Cannot {action} from the current view.")]
    InvalidTransition { action: &'static str },

    /// The password hashing primitive itself failed
    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

impl From<rusqlite::Error> for DashboardError {
    fn from(err: rusqlite::Error) -> Self {
        DashboardError::StoreUnavailable(err)
    }
}

impl DashboardError {
    /// True for states the page should render as a message rather than an error banner
    pub fn is_displayable(&self) -> bool {
        matches!(
            self,
            DashboardError::NoDataAvailable | DashboardError::InvalidYearInput { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
