use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get},
};
use uuid::Uuid;

use crate::{
    dto::basket::{AddToBasketRequest, BasketView},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::basket_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_basket).post(add_items))
        .route("/{item_id}", delete(remove_item))
}

#[utoipa::path(
    get,
    path = "/api/basket",
    responses(
        (status = 200, description = "Current basket with total_sum", body = ApiResponse<BasketView>)
    ),
    security(("bearer_auth" = [])),
    tag = "Basket"
)]
pub async fn get_basket(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<BasketView>>> {
    let resp = basket_service::get_basket(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/basket",
    request_body = AddToBasketRequest,
    responses(
        (status = 200, description = "Basket after the update", body = ApiResponse<BasketView>),
        (status = 400, description = "Unknown listing or bad quantity")
    ),
    security(("bearer_auth" = [])),
    tag = "Basket"
)]
pub async fn add_items(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddToBasketRequest>,
) -> AppResult<Json<ApiResponse<BasketView>>> {
    let resp = basket_service::add_items(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/basket/{item_id}",
    params(
        ("item_id" = Uuid, Path, description = "Basket line ID")
    ),
    responses(
        (status = 200, description = "Item removed", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "No such basket line")
    ),
    security(("bearer_auth" = [])),
    tag = "Basket"
)]
pub async fn remove_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = basket_service::remove_item(&state, &user, item_id).await?;
    Ok(Json(resp))
}
