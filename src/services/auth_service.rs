use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::{OsRng, RngCore};
use sqlx::FromRow;
use std::fmt::Write as _;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::auth::{
        AccountDetails, Claims, ConfirmRequest, LoginRequest, LoginResponse, RegisterRequest,
        RegisterResponse, UpdateAccountRequest,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Contact, User, UserType},
    response::{ApiResponse, Meta},
};

#[derive(FromRow)]
struct CredentialRow {
    id: Uuid,
    password_hash: String,
    user_type: String,
    is_active: bool,
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

/// 64 hex chars from the OS RNG, matching the stored unique key format.
fn generate_confirm_key() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().fold(String::with_capacity(64), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

pub async fn register_user(
    pool: &DbPool,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<RegisterResponse>> {
    let email = payload.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::BadRequest(
            "Users must have an email address".to_string(),
        ));
    }

    let user_type = match payload.user_type.as_deref() {
        None => UserType::Buyer,
        Some(raw) => UserType::parse(raw)
            .ok_or_else(|| AppError::BadRequest("user_type must be shop or buyer".to_string()))?,
    };

    let exist: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(email.as_str())
        .fetch_optional(pool)
        .await?;
    if exist.is_some() {
        return Err(AppError::BadRequest("Email is already taken".to_string()));
    }

    let password_hash = hash_password(&payload.password)?;
    let id = Uuid::new_v4();

    let mut txn = pool.begin().await?;

    // Accounts stay inactive until the email is confirmed.
    let user: User = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, first_name, last_name, company, position, user_type, is_active)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, FALSE)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(email.as_str())
    .bind(password_hash)
    .bind(payload.first_name)
    .bind(payload.last_name)
    .bind(payload.company)
    .bind(payload.position)
    .bind(user_type.as_str())
    .fetch_one(&mut *txn)
    .await?;

    let key = generate_confirm_key();
    sqlx::query("INSERT INTO confirm_email_tokens (id, user_id, key) VALUES ($1, $2, $3)")
        .bind(Uuid::new_v4())
        .bind(user.id)
        .bind(key.as_str())
        .execute(&mut *txn)
        .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        pool,
        Some(user.id),
        "user_register",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let resp = RegisterResponse {
        user,
        confirm_token: key,
    };
    Ok(ApiResponse::success("User created", resp, None))
}

pub async fn confirm_email(
    pool: &DbPool,
    payload: ConfirmRequest,
) -> AppResult<ApiResponse<User>> {
    let email = payload.email.trim().to_lowercase();

    let mut txn = pool.begin().await?;

    let token: Option<(Uuid, Uuid)> = sqlx::query_as(
        r#"
        SELECT t.id, t.user_id
        FROM confirm_email_tokens t
        JOIN users u ON u.id = t.user_id
        WHERE u.email = $1 AND t.key = $2
        "#,
    )
    .bind(email.as_str())
    .bind(payload.token.as_str())
    .fetch_optional(&mut *txn)
    .await?;

    let (token_id, user_id) = match token {
        Some(t) => t,
        None => return Err(AppError::BadRequest("Invalid email or token".into())),
    };

    let user: User = sqlx::query_as("UPDATE users SET is_active = TRUE WHERE id = $1 RETURNING *")
        .bind(user_id)
        .fetch_one(&mut *txn)
        .await?;

    // Single use: the token is gone once consumed.
    sqlx::query("DELETE FROM confirm_email_tokens WHERE id = $1")
        .bind(token_id)
        .execute(&mut *txn)
        .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        pool,
        Some(user.id),
        "email_confirmed",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Email confirmed", user, None))
}

pub async fn login_user(
    pool: &DbPool,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let email = payload.email.trim().to_lowercase();

    let row: Option<CredentialRow> = sqlx::query_as(
        "SELECT id, password_hash, user_type, is_active FROM users WHERE email = $1",
    )
    .bind(email.as_str())
    .fetch_optional(pool)
    .await?;

    let row = match row {
        Some(r) => r,
        None => return Err(AppError::BadRequest("Invalid email or password".into())),
    };

    let parsed_hash = PasswordHash::new(&row.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    let argon2 = Argon2::default();
    if argon2
        .verify_password(payload.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::BadRequest("Invalid email or password".into()));
    }

    // Unconfirmed accounts look exactly like bad credentials to the caller.
    if !row.is_active {
        return Err(AppError::BadRequest("Invalid email or password".into()));
    }

    let secret = std::env::var("JWT_SECRET")
        .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))?;

    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: row.id.to_string(),
        user_type: row.user_type.clone(),
        exp: expiration.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;

    if let Err(err) = log_audit(
        pool,
        Some(row.id),
        "user_login",
        Some("users"),
        Some(serde_json::json!({ "user_id": row.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let resp = LoginResponse {
        token: format!("Bearer {}", token),
    };
    Ok(ApiResponse::success("Logged in", resp, Some(Meta::empty())))
}

pub async fn account_details(
    pool: &DbPool,
    auth: &AuthUser,
) -> AppResult<ApiResponse<AccountDetails>> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(auth.user_id)
        .fetch_optional(pool)
        .await?;
    let user = match user {
        Some(u) => u,
        None => return Err(AppError::NotFound),
    };

    let contacts: Vec<Contact> =
        sqlx::query_as("SELECT * FROM contacts WHERE user_id = $1 ORDER BY city, street")
            .bind(auth.user_id)
            .fetch_all(pool)
            .await?;

    let data = AccountDetails { user, contacts };
    Ok(ApiResponse::success("OK", data, None))
}

pub async fn update_account(
    pool: &DbPool,
    auth: &AuthUser,
    payload: UpdateAccountRequest,
) -> AppResult<ApiResponse<User>> {
    let existing: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(auth.user_id)
        .fetch_optional(pool)
        .await?;
    let existing = match existing {
        Some(u) => u,
        None => return Err(AppError::NotFound),
    };

    let first_name = payload.first_name.unwrap_or(existing.first_name);
    let last_name = payload.last_name.unwrap_or(existing.last_name);
    let company = payload.company.unwrap_or(existing.company);
    let position = payload.position.unwrap_or(existing.position);

    let user: User = if let Some(password) = payload.password {
        let password_hash = hash_password(&password)?;
        sqlx::query_as(
            r#"
            UPDATE users
            SET first_name = $2, last_name = $3, company = $4, position = $5, password_hash = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(auth.user_id)
        .bind(first_name)
        .bind(last_name)
        .bind(company)
        .bind(position)
        .bind(password_hash)
        .fetch_one(pool)
        .await?
    } else {
        sqlx::query_as(
            r#"
            UPDATE users
            SET first_name = $2, last_name = $3, company = $4, position = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(auth.user_id)
        .bind(first_name)
        .bind(last_name)
        .bind(company)
        .bind(position)
        .fetch_one(pool)
        .await?
    };

    if let Err(err) = log_audit(
        pool,
        Some(user.id),
        "account_update",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Updated", user, None))
}
