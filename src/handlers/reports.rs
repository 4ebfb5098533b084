use axum::{
    extract::{Json, State},
    routing::get,
    Router,
};

use crate::auth::AuthenticatedUser;
use crate::services::reports::{DashboardReport, RevenueReport};
use crate::{ApiResponse, ApiResult, AppState};

async fn dashboard(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> ApiResult<DashboardReport> {
    let report = state.services.reports.dashboard().await?;
    Ok(Json(ApiResponse::success(report)))
}

async fn revenue(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> ApiResult<RevenueReport> {
    let report = state.services.reports.revenue_series().await?;
    Ok(Json(ApiResponse::success(report)))
}

pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/revenue", get(revenue))
}
