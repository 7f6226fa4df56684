// 🔑 Auth Flow - login / registration state machine
//
//   view:   Login ⇄ Register            (toggle_view)
//   status: LoggedOut → LoggedIn        (submit_login / submit_register)
//           LoggedIn  → LoggedOut/Login (logout)
//
// The Session is a plain value owned by the caller and passed in by &mut.
// Transitions that fail leave it exactly as it was.

use crate::credentials::CredentialStore;
use crate::error::{DashboardError, Result};
use crate::password::PasswordService;
use crate::sectors::Sector;
use rusqlite::Connection;
use serde::Serialize;

// ============================================================================
// SESSION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Landing,
    Auth,
    Dashboard,
}

/// Which auth form is showing. Never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthView {
    Login,
    Register,
}

impl AuthView {
    pub fn toggled(&self) -> Self {
        match self {
            AuthView::Login => AuthView::Register,
            AuthView::Register => AuthView::Login,
        }
    }
}

/// Transient per-process session. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    page: Page,
    view: AuthView,
    username: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Session {
            page: Page::Landing,
            view: AuthView::Login,
            username: None,
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_logged_in(&self) -> bool {
        self.username.is_some()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn view(&self) -> AuthView {
        self.view
    }

    pub fn show_login(&self) -> bool {
        self.view == AuthView::Login
    }

    pub fn page(&self) -> Page {
        self.page
    }

    /// Landing page → auth forms
    pub fn begin_exploration(&mut self) {
        if self.page == Page::Landing {
            self.page = if self.is_logged_in() {
                Page::Dashboard
            } else {
                Page::Auth
            };
        }
    }

    /// Flip between the login and registration forms. Login state is unaffected.
    pub fn toggle_view(&mut self) {
        self.view = self.view.toggled();
    }

    pub fn logout(&mut self) {
        if self.is_logged_in() {
            tracing::info!(username = self.username.as_deref().unwrap_or_default(), "logged out");
        }
        self.username = None;
        self.view = AuthView::Login;
        if self.page == Page::Dashboard {
            self.page = Page::Auth;
        }
    }

    fn enter(&mut self, username: &str) {
        self.username = Some(username.to_string());
        self.page = Page::Dashboard;
    }
}

// ============================================================================
// AUTH FLOW
// ============================================================================

pub struct AuthFlow<'a> {
    store: CredentialStore<'a>,
    passwords: &'a PasswordService,
}

impl<'a> AuthFlow<'a> {
    pub fn new(conn: &'a Connection, passwords: &'a PasswordService) -> Self {
        AuthFlow {
            store: CredentialStore::new(conn),
            passwords,
        }
    }

    /// Ensure the credential table exists
    pub fn initialize(&self) -> Result<()> {
        self.store.initialize()
    }

    /// Log in with the login form.
    ///
    /// Unknown user and wrong password both return `AuthenticationFailed`.
    pub fn submit_login(&self, session: &mut Session, username: &str, password: &str) -> Result<()> {
        if session.is_logged_in() || session.view != AuthView::Login {
            return Err(DashboardError::InvalidTransition { action: "log in" });
        }

        let verified = match self.store.find_by_username(username)? {
            Some(user) => self.passwords.verify(&user.password_hash, password),
            None => {
                self.passwords.verify_dummy(password);
                false
            }
        };

        if !verified {
            tracing::info!(username, "login rejected");
            return Err(DashboardError::AuthenticationFailed);
        }

        session.enter(username);
        tracing::info!(username, "logged in");
        Ok(())
    }

    /// Create an account with the registration form and log straight in.
    /// On collision the session stays on the registration view.
    pub fn submit_register(
        &self,
        session: &mut Session,
        username: &str,
        password: &str,
        sectors: &[Sector],
    ) -> Result<()> {
        if session.is_logged_in() || session.view != AuthView::Register {
            return Err(DashboardError::InvalidTransition { action: "register" });
        }

        let hash = self
            .passwords
            .hash(password)
            .map_err(|e| DashboardError::Hashing(e.to_string()))?;

        match self.store.insert(username, &hash, sectors) {
            Ok(()) => {
                session.enter(username);
                tracing::info!(username, sectors = sectors.len(), "account registered");
                Ok(())
            }
            Err(DashboardError::DuplicateUsername) => {
                tracing::info!(username, "registration rejected: username taken");
                Err(DashboardError::DuplicateUsername)
            }
            Err(e) => Err(e),
        }
    }

    pub fn toggle_view(&self, session: &mut Session) {
        session.toggle_view();
    }

    pub fn logout(&self, session: &mut Session) {
        session.logout();
    }
}
