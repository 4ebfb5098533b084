use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;

use crate::auth::AuthenticatedUser;
use crate::errors::ServiceError;
use crate::services::customers::{CustomerInput, CustomerResponse};
use crate::{ApiResponse, ApiResult, AppState};

#[derive(Deserialize)]
pub struct CustomerSearchParams {
    pub search: Option<String>,
}

async fn list_customers(
    State(state): State<AppState>,
    Query(params): Query<CustomerSearchParams>,
    _user: AuthenticatedUser,
) -> ApiResult<Vec<CustomerResponse>> {
    let customers = state
        .services
        .customers
        .list_customers(params.search.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(customers)))
}

async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    _user: AuthenticatedUser,
) -> ApiResult<CustomerResponse> {
    let customer = state.services.customers.get_customer(id).await?;
    Ok(Json(ApiResponse::success(customer)))
}

async fn create_customer(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(input): Json<CustomerInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let id = state.services.customers.add_customer(input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(id))))
}

async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    _user: AuthenticatedUser,
    Json(input): Json<CustomerInput>,
) -> ApiResult<()> {
    state.services.customers.edit_customer(id, input).await?;
    Ok(Json(ApiResponse::success(())))
}

async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    _user: AuthenticatedUser,
) -> ApiResult<()> {
    state.services.customers.delete_customer(id).await?;
    Ok(Json(ApiResponse::success(())))
}

pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_customers))
        .route("/", post(create_customer))
        .route("/:id", get(get_customer))
        .route("/:id", put(update_customer))
        .route("/:id", delete(delete_customer))
}
