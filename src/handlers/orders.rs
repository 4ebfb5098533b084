use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};

use crate::auth::AuthenticatedUser;
use crate::errors::ServiceError;
use crate::services::orders::{
    CreateOrderRequest, EditOrderRequest, OrderDetail, OrderSummary, UpdateStatusRequest,
};
use crate::{ApiResponse, ApiResult, AppState};

async fn list_orders(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> ApiResult<Vec<OrderSummary>> {
    let orders = state.services.orders.list_orders().await?;
    Ok(Json(ApiResponse::success(orders)))
}

async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    _user: AuthenticatedUser,
) -> ApiResult<OrderDetail> {
    let order = state.services.orders.get_order(id).await?;
    Ok(Json(ApiResponse::success(order)))
}

async fn create_order(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(request): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let id = state.services.orders.create_order(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(id))))
}

async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    _user: AuthenticatedUser,
    Json(request): Json<EditOrderRequest>,
) -> ApiResult<()> {
    state.services.orders.edit_order(id, request).await?;
    Ok(Json(ApiResponse::success(())))
}

async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    _user: AuthenticatedUser,
    Json(request): Json<UpdateStatusRequest>,
) -> ApiResult<()> {
    state
        .services
        .orders
        .update_status(id, &request.status)
        .await?;
    Ok(Json(ApiResponse::success(())))
}

async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    _user: AuthenticatedUser,
) -> ApiResult<()> {
    state.services.orders.delete_order(id).await?;
    Ok(Json(ApiResponse::success(())))
}

pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders))
        .route("/", post(create_order))
        .route("/:id", get(get_order))
        .route("/:id", put(update_order))
        .route("/:id", delete(delete_order))
        .route("/:id/status", put(update_order_status))
}
