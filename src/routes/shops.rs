use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::Shop,
    response::ApiResponse,
    services::product_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_shops))
        .route("/{id}", get(get_shop))
}

#[utoipa::path(
    get,
    path = "/api/shops",
    responses(
        (status = 200, description = "All shops", body = ApiResponse<Vec<Shop>>)
    ),
    tag = "Catalog"
)]
pub async fn list_shops(State(state): State<AppState>) -> AppResult<Json<ApiResponse<Vec<Shop>>>> {
    let resp = product_service::list_shops(&state.pool).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/shops/{id}",
    params(
        ("id" = Uuid, Path, description = "Shop ID")
    ),
    responses(
        (status = 200, description = "Shop", body = ApiResponse<Shop>),
        (status = 404, description = "Not found")
    ),
    tag = "Catalog"
)]
pub async fn get_shop(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Shop>>> {
    let resp = product_service::get_shop(&state.pool, id).await?;
    Ok(Json(resp))
}
