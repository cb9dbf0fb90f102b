use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Account kind: partners (shops) may manage a catalog, buyers place orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Shop,
    Buyer,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Shop => "shop",
            UserType::Buyer => "buyer",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "shop" => Some(UserType::Shop),
            "buyer" => Some(UserType::Buyer),
            _ => None,
        }
    }
}

/// Order lifecycle. An order starts life as a basket and becomes a real
/// order at checkout; later states are driven by the partner side and are
/// only stored here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    Basket,
    New,
    Confirmed,
    Assembled,
    Sent,
    Delivered,
    Canceled,
}

impl OrderState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderState::Basket => "basket",
            OrderState::New => "new",
            OrderState::Confirmed => "confirmed",
            OrderState::Assembled => "assembled",
            OrderState::Sent => "sent",
            OrderState::Delivered => "delivered",
            OrderState::Canceled => "canceled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "basket" => Some(OrderState::Basket),
            "new" => Some(OrderState::New),
            "confirmed" => Some(OrderState::Confirmed),
            "assembled" => Some(OrderState::Assembled),
            "sent" => Some(OrderState::Sent),
            "delivered" => Some(OrderState::Delivered),
            "canceled" => Some(OrderState::Canceled),
            _ => None,
        }
    }

    /// States advance monotonically; canceled is reachable from any state
    /// that has not been delivered. Terminal states accept nothing.
    pub fn can_transition_to(&self, next: OrderState) -> bool {
        use OrderState::*;
        match (self, next) {
            (Basket, New)
            | (New, Confirmed)
            | (Confirmed, Assembled)
            | (Assembled, Sent)
            | (Sent, Delivered) => true,
            (Delivered, _) | (Canceled, _) => false,
            (_, Canceled) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    pub position: String,
    pub user_type: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Contact {
    pub id: Uuid,
    pub user_id: Uuid,
    pub city: String,
    pub street: String,
    pub phone: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Shop {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub url: String,
    pub filename: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub dt: DateTime<Utc>,
    pub state: String,
    pub contact_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub shop_id: Uuid,
    pub quantity: i32,
}
