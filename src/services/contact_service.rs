use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::contacts::{ContactList, CreateContactRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Contact,
    response::{ApiResponse, Meta},
};

pub async fn list_contacts(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<ContactList>> {
    let items: Vec<Contact> =
        sqlx::query_as("SELECT * FROM contacts WHERE user_id = $1 ORDER BY city, street")
            .bind(user.user_id)
            .fetch_all(pool)
            .await?;

    Ok(ApiResponse::success("OK", ContactList { items }, None))
}

pub async fn create_contact(
    pool: &DbPool,
    user: &AuthUser,
    payload: CreateContactRequest,
) -> AppResult<ApiResponse<Contact>> {
    if payload.city.trim().is_empty() || payload.street.trim().is_empty() {
        return Err(AppError::BadRequest(
            "city and street must not be empty".to_string(),
        ));
    }

    let contact: Contact = sqlx::query_as(
        "INSERT INTO contacts (id, user_id, city, street, phone) VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(payload.city)
    .bind(payload.street)
    .bind(payload.phone)
    .fetch_one(pool)
    .await?;

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "contact_create",
        Some("contacts"),
        Some(serde_json::json!({ "contact_id": contact.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Contact created", contact, None))
}

pub async fn delete_contact(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM contacts WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user.user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "contact_delete",
        Some("contacts"),
        Some(serde_json::json!({ "contact_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Contact deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
