// 🌐 HTTP adapter - JSON API over the auth flow and reporting queries
//
// One process, one dashboard user: a single Session and a single SQLite
// connection shared behind mutexes. Reporting routes require a logged-in session.

use crate::auth::{AuthFlow, AuthView, Page, Session};
use crate::error::DashboardError;
use crate::password::PasswordService;
use crate::report::{HealthMetric, Reporting, YearBounds, YearRange};
use crate::sectors::Sector;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tower_http::cors::CorsLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
    session: Arc<Mutex<Session>>,
    passwords: Arc<PasswordService>,
}

impl AppState {
    pub fn new(conn: Connection, passwords: PasswordService) -> Self {
        AppState {
            db: Arc::new(Mutex::new(conn)),
            session: Arc::new(Mutex::new(Session::new())),
            passwords: Arc::new(passwords),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Responses
// ============================================================================

/// API Response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

pub enum ApiError {
    Dashboard(DashboardError),
    LoginRequired,
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl From<DashboardError> for ApiError {
    fn from(err: DashboardError) -> Self {
        ApiError::Dashboard(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Dashboard(err) => {
                let status = match &err {
                    DashboardError::AuthenticationFailed => StatusCode::UNAUTHORIZED,
                    DashboardError::DuplicateUsername => StatusCode::CONFLICT,
                    DashboardError::InvalidYearInput { .. } => StatusCode::BAD_REQUEST,
                    DashboardError::NoDataAvailable => StatusCode::NOT_FOUND,
                    DashboardError::InvalidTransition { .. } => StatusCode::CONFLICT,
                    DashboardError::StoreUnavailable(source) => {
                        tracing::error!(error = %source, "store unavailable");
                        StatusCode::SERVICE_UNAVAILABLE
                    }
                    DashboardError::Hashing(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.to_string())
            }
            ApiError::LoginRequired => (StatusCode::UNAUTHORIZED, "Please log in first.".to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "handler task failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error.".to_string())
            }
        };

        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(message),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

#[derive(Serialize)]
pub struct SessionResponse {
    pub page: Page,
    pub view: AuthView,
    pub logged_in: bool,
    pub username: Option<String>,
}

impl From<&Session> for SessionResponse {
    fn from(session: &Session) -> Self {
        SessionResponse {
            page: session.page(),
            view: session.view(),
            logged_in: session.is_logged_in(),
            username: session.username().map(str::to_string),
        }
    }
}

#[derive(Serialize)]
pub struct SectorResponse {
    pub code: &'static str,
    pub name: &'static str,
}

/// Rows plus the bounds that were actually applied
#[derive(Serialize)]
pub struct RangedResponse<T> {
    pub bounds: YearBounds,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    pub rows: Vec<T>,
}

// ============================================================================
// Requests
// ============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub sectors: Vec<String>,
}

#[derive(Deserialize, Default)]
pub struct YearQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Deserialize)]
pub struct CompareQuery {
    pub first: i64,
    pub second: i64,
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Apply text year inputs, falling back to the full range on bad input
fn resolve_years(
    available: &YearRange,
    start: Option<&str>,
    end: Option<&str>,
) -> (YearBounds, Option<String>) {
    match (start, end) {
        (None, None) => (available.bounds_or_sentinel(), None),
        (start, end) => {
            let full = available.bounds_or_sentinel();
            let start = start.map(str::to_string).unwrap_or_else(|| full.start.to_string());
            let end = end.map(str::to_string).unwrap_or_else(|| full.end.to_string());
            let (bounds, err) = YearBounds::resolve(&start, &end, available);
            (bounds, err.map(|e| e.to_string()))
        }
    }
}

/// Run password work off the async worker threads
async fn run_blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
}

fn require_login(state: &AppState) -> Result<(), ApiError> {
    if lock(&state.session).is_logged_in() {
        Ok(())
    } else {
        Err(ApiError::LoginRequired)
    }
}

// ============================================================================
// Auth handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> Json<ApiResponse<&'static str>> {
    ApiResponse::ok("OK")
}

/// GET /api/session
async fn get_session(State(state): State<AppState>) -> ApiResult<SessionResponse> {
    let session = lock(&state.session);
    Ok(ApiResponse::ok(SessionResponse::from(&*session)))
}

/// POST /api/auth/begin - landing page → auth forms
async fn begin(State(state): State<AppState>) -> ApiResult<SessionResponse> {
    let mut session = lock(&state.session);
    session.begin_exploration();
    Ok(ApiResponse::ok(SessionResponse::from(&*session)))
}

/// POST /api/auth/toggle - switch login ⇄ register
async fn toggle(State(state): State<AppState>) -> ApiResult<SessionResponse> {
    let mut session = lock(&state.session);
    session.toggle_view();
    Ok(ApiResponse::ok(SessionResponse::from(&*session)))
}

/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<SessionResponse> {
    let response = run_blocking(move || {
        let conn = lock(&state.db);
        let mut session = lock(&state.session);

        AuthFlow::new(&conn, &state.passwords).submit_login(&mut session, &req.username, &req.password)?;
        Ok(SessionResponse::from(&*session))
    })
    .await?;

    Ok(ApiResponse::ok(response))
}

/// POST /api/auth/register
async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<SessionResponse> {
    let sectors = req
        .sectors
        .iter()
        .map(|s| Sector::parse(s).ok_or_else(|| ApiError::BadRequest(format!("Unknown sector: {}", s))))
        .collect::<Result<Vec<_>, _>>()?;

    let response = run_blocking(move || {
        let conn = lock(&state.db);
        let mut session = lock(&state.session);

        AuthFlow::new(&conn, &state.passwords).submit_register(
            &mut session,
            &req.username,
            &req.password,
            &sectors,
        )?;
        Ok(SessionResponse::from(&*session))
    })
    .await?;

    Ok(ApiResponse::ok(response))
}

/// POST /api/auth/logout
async fn logout(State(state): State<AppState>) -> ApiResult<SessionResponse> {
    let mut session = lock(&state.session);
    session.logout();
    Ok(ApiResponse::ok(SessionResponse::from(&*session)))
}

// ============================================================================
// Reporting handlers
// ============================================================================

/// GET /api/years
async fn get_years(State(state): State<AppState>) -> ApiResult<YearRange> {
    require_login(&state)?;
    let conn = lock(&state.db);
    Ok(ApiResponse::ok(Reporting::new(&conn).year_range()?))
}

/// GET /api/sectors
async fn get_sectors(State(state): State<AppState>) -> ApiResult<Vec<SectorResponse>> {
    require_login(&state)?;
    let sectors: Vec<SectorResponse> = Sector::ALL
        .iter()
        .map(|s| SectorResponse {
            code: s.code(),
            name: s.display_name(),
        })
        .collect();
    Ok(ApiResponse::ok(sectors))
}

/// GET /api/sectors/:code/companies
async fn get_sector_companies(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<Vec<crate::report::CompanySummary>> {
    require_login(&state)?;
    let sector = Sector::parse(&code)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown sector: {}", code)))?;

    let conn = lock(&state.db);
    Ok(ApiResponse::ok(Reporting::new(&conn).companies_in_sector(sector)?))
}

/// GET /api/companies/:cvr
async fn get_company(
    State(state): State<AppState>,
    Path(cvr): Path<i64>,
) -> ApiResult<crate::report::CompanyProfile> {
    require_login(&state)?;
    let conn = lock(&state.db);

    match Reporting::new(&conn).company_profile(cvr)? {
        Some(profile) => Ok(ApiResponse::ok(profile)),
        None => Err(ApiError::NotFound("Company information not available.".to_string())),
    }
}

/// GET /api/companies/:cvr/history?start=&end=
async fn get_company_history(
    State(state): State<AppState>,
    Path(cvr): Path<i64>,
    Query(years): Query<YearQuery>,
) -> ApiResult<RangedResponse<crate::report::HistoryPoint>> {
    require_login(&state)?;
    let conn = lock(&state.db);
    let reporting = Reporting::new(&conn);

    let available = reporting.year_range()?;
    let (bounds, warning) = resolve_years(&available, years.start.as_deref(), years.end.as_deref());
    let rows = reporting.financial_history(cvr, bounds)?;

    Ok(ApiResponse::ok(RangedResponse { bounds, warning, rows }))
}

/// GET /api/compare?first=&second=&start=&end=
async fn get_comparison(
    State(state): State<AppState>,
    Query(query): Query<CompareQuery>,
) -> ApiResult<RangedResponse<crate::report::ComparisonPoint>> {
    require_login(&state)?;
    let conn = lock(&state.db);
    let reporting = Reporting::new(&conn);

    let available = reporting.year_range()?;
    let (bounds, warning) = resolve_years(&available, query.start.as_deref(), query.end.as_deref());
    let rows = reporting.financial_history_for_two(query.first, query.second, bounds)?;

    Ok(ApiResponse::ok(RangedResponse { bounds, warning, rows }))
}

/// GET /api/metrics/sector-performance
async fn get_sector_performance(
    State(state): State<AppState>,
) -> ApiResult<Vec<crate::report::SectorPerformance>> {
    require_login(&state)?;
    let conn = lock(&state.db);
    Ok(ApiResponse::ok(Reporting::new(&conn).sector_performance()?))
}

/// GET /api/metrics/health/:metric
async fn get_health_metric(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Vec<crate::report::SectorSeriesPoint>> {
    require_login(&state)?;
    let metric = HealthMetric::from_key(&key)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown metric: {}", key)))?;

    let conn = lock(&state.db);
    Ok(ApiResponse::ok(Reporting::new(&conn).avg_by_sector_by_year(metric)?))
}

/// GET /api/metrics/comparison
async fn get_company_comparison(
    State(state): State<AppState>,
) -> ApiResult<Vec<crate::metrics::CompanyYear>> {
    require_login(&state)?;
    let conn = lock(&state.db);
    Ok(ApiResponse::ok(Reporting::new(&conn).company_comparison()?))
}

/// GET /api/metrics/opportunities
async fn get_opportunities(
    State(state): State<AppState>,
) -> ApiResult<Vec<crate::metrics::CompanyYear>> {
    require_login(&state)?;
    let conn = lock(&state.db);
    Ok(ApiResponse::ok(Reporting::new(&conn).investment_opportunities()?))
}

/// GET /api/metrics/efficiency
async fn get_efficiency(
    State(state): State<AppState>,
) -> ApiResult<Vec<crate::metrics::EfficiencyRow>> {
    require_login(&state)?;
    let conn = lock(&state.db);
    Ok(ApiResponse::ok(Reporting::new(&conn).operational_efficiency()?))
}

/// GET /api/metrics/liquidity
async fn get_liquidity(
    State(state): State<AppState>,
) -> ApiResult<Vec<crate::metrics::LiquidityRow>> {
    require_login(&state)?;
    let conn = lock(&state.db);
    Ok(ApiResponse::ok(Reporting::new(&conn).liquidity_trends()?))
}

// ============================================================================
// Router
// ============================================================================

/// Build the `/api` router
pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/session", get(get_session))
        .route("/auth/begin", post(begin))
        .route("/auth/toggle", post(toggle))
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/logout", post(logout))
        .route("/years", get(get_years))
        .route("/sectors", get(get_sectors))
        .route("/sectors/:code/companies", get(get_sector_companies))
        .route("/companies/:cvr", get(get_company))
        .route("/companies/:cvr/history", get(get_company_history))
        .route("/compare", get(get_comparison))
        .route("/metrics/sector-performance", get(get_sector_performance))
        .route("/metrics/health/:metric", get(get_health_metric))
        .route("/metrics/comparison", get(get_company_comparison))
        .route("/metrics/opportunities", get(get_opportunities))
        .route("/metrics/efficiency", get(get_efficiency))
        .route("/metrics/liquidity", get(get_liquidity))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}
