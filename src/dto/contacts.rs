use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Contact;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateContactRequest {
    pub city: String,
    pub street: String,
    pub phone: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ContactList {
    pub items: Vec<Contact>,
}
