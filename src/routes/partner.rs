use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};

use crate::{
    dto::{
        orders::PartnerOrderList,
        partner::{CatalogUpload, CatalogUploadResult},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Shop,
    response::ApiResponse,
    routes::params::Pagination,
    services::partner_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/update", post(update_catalog))
        .route("/state", get(partner_state))
        .route("/orders", get(partner_orders))
}

#[utoipa::path(
    post,
    path = "/api/partner/update",
    request_body = CatalogUpload,
    responses(
        (status = 200, description = "Catalog replaced", body = ApiResponse<CatalogUploadResult>),
        (status = 400, description = "Invalid price list"),
        (status = 403, description = "Not a shop account")
    ),
    security(("bearer_auth" = [])),
    tag = "Partner"
)]
pub async fn update_catalog(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CatalogUpload>,
) -> AppResult<Json<ApiResponse<CatalogUploadResult>>> {
    let resp = partner_service::update_catalog(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/partner/state",
    responses(
        (status = 200, description = "Partner shop record", body = ApiResponse<Shop>),
        (status = 403, description = "Not a shop account"),
        (status = 404, description = "No catalog uploaded yet")
    ),
    security(("bearer_auth" = [])),
    tag = "Partner"
)]
pub async fn partner_state(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Shop>>> {
    let resp = partner_service::partner_state(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/partner/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "Orders containing this shop's goods", body = ApiResponse<PartnerOrderList>),
        (status = 403, description = "Not a shop account")
    ),
    security(("bearer_auth" = [])),
    tag = "Partner"
)]
pub async fn partner_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<PartnerOrderList>>> {
    let resp = partner_service::partner_orders(&state, &user, pagination).await?;
    Ok(Json(resp))
}
