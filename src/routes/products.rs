use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::catalog::{ProductFilter, ProductInfoList},
    error::AppResult,
    response::ApiResponse,
    routes::params::Pagination,
    services::product_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_products))
}

#[utoipa::path(
    get,
    path = "/api/products",
    params(
        ("shop_id" = Option<Uuid>, Query, description = "Filter by shop"),
        ("category_id" = Option<Uuid>, Query, description = "Filter by category"),
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "Product listings with parameters", body = ApiResponse<ProductInfoList>)
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<ProductInfoList>>> {
    let resp = product_service::list_product_infos(&state.pool, filter, pagination).await?;
    Ok(Json(resp))
}
