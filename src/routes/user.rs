use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, post},
};
use uuid::Uuid;

use crate::{
    dto::auth::{
        AccountDetails, ConfirmRequest, LoginRequest, LoginResponse, RegisterRequest,
        RegisterResponse, UpdateAccountRequest,
    },
    dto::contacts::{ContactList, CreateContactRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Contact, User},
    response::ApiResponse,
    services::{auth_service, contact_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/register/confirm", post(confirm))
        .route("/login", post(login))
        .route("/details", get(details).post(update_details))
        .route("/contact", get(list_contacts).post(create_contact))
        .route("/contact/{id}", delete(delete_contact))
}

#[utoipa::path(
    post,
    path = "/api/user/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Inactive user created with confirmation token", body = ApiResponse<RegisterResponse>),
        (status = 400, description = "Missing email or duplicate account")
    ),
    tag = "User"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<Json<ApiResponse<RegisterResponse>>> {
    let resp = auth_service::register_user(&state.pool, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/user/register/confirm",
    request_body = ConfirmRequest,
    responses(
        (status = 200, description = "Account activated", body = ApiResponse<User>),
        (status = 400, description = "Invalid email or token")
    ),
    tag = "User"
)]
pub async fn confirm(
    State(state): State<AppState>,
    Json(payload): Json<ConfirmRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = auth_service::confirm_email(&state.pool, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/user/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login user", body = ApiResponse<LoginResponse>),
        (status = 400, description = "Invalid credentials or inactive account")
    ),
    tag = "User"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let resp = auth_service::login_user(&state.pool, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/user/details",
    responses(
        (status = 200, description = "Account details with contacts", body = ApiResponse<AccountDetails>)
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn details(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<AccountDetails>>> {
    let resp = auth_service::account_details(&state.pool, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/user/details",
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Updated account", body = ApiResponse<User>)
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn update_details(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateAccountRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = auth_service::update_account(&state.pool, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/user/contact",
    responses(
        (status = 200, description = "List own contacts", body = ApiResponse<ContactList>)
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn list_contacts(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ContactList>>> {
    let resp = contact_service::list_contacts(&state.pool, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/user/contact",
    request_body = CreateContactRequest,
    responses(
        (status = 200, description = "Contact created", body = ApiResponse<Contact>),
        (status = 400, description = "Bad request")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn create_contact(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateContactRequest>,
) -> AppResult<Json<ApiResponse<Contact>>> {
    let resp = contact_service::create_contact(&state.pool, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/user/contact/{id}",
    params(
        ("id" = Uuid, Path, description = "Contact ID")
    ),
    responses(
        (status = 200, description = "Contact deleted", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Contact not found")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn delete_contact(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = contact_service::delete_contact(&state.pool, &user, id).await?;
    Ok(Json(resp))
}
