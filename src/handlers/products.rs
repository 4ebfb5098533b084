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
use crate::services::catalog::{ProductDetail, ProductInput, ProductSummary};
use crate::{ApiResponse, ApiResult, AppState};

#[derive(Deserialize)]
pub struct ProductSearchParams {
    pub search: Option<String>,
}

async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ProductSearchParams>,
    _user: AuthenticatedUser,
) -> ApiResult<Vec<ProductSummary>> {
    let products = state
        .services
        .catalog
        .list_products(params.search.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(products)))
}

async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    _user: AuthenticatedUser,
) -> ApiResult<ProductDetail> {
    let product = state.services.catalog.get_product(id).await?;
    Ok(Json(ApiResponse::success(product)))
}

async fn create_product(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(input): Json<ProductInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let id = state.services.catalog.add_product(input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(id))))
}

async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    _user: AuthenticatedUser,
    Json(input): Json<ProductInput>,
) -> ApiResult<()> {
    state.services.catalog.edit_product(id, input).await?;
    Ok(Json(ApiResponse::success(())))
}

async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    _user: AuthenticatedUser,
) -> ApiResult<()> {
    state.services.catalog.delete_product(id).await?;
    Ok(Json(ApiResponse::success(())))
}

async fn delete_image(
    State(state): State<AppState>,
    Path(image_id): Path<i32>,
    _user: AuthenticatedUser,
) -> ApiResult<()> {
    state.services.catalog.delete_image(image_id).await?;
    Ok(Json(ApiResponse::success(())))
}

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/", post(create_product))
        .route("/:id", get(get_product))
        .route("/:id", put(update_product))
        .route("/:id", delete(delete_product))
        .route("/images/:image_id", delete(delete_image))
}
