use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Contact, User};

#[derive(Deserialize, Debug, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub position: String,
    /// "shop" or "buyer"; buyers by default.
    pub user_type: Option<String>,
}

/// The confirmation key is returned in the response instead of being mailed.
#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub user: User,
    pub confirm_token: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct ConfirmRequest {
    pub email: String,
    pub token: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct UpdateAccountRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
    pub position: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccountDetails {
    pub user: User,
    pub contacts: Vec<Contact>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub user_type: String,
    pub exp: usize,
}
