use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Contact, Order, OrderItem};

/// Checkout: turn the basket into a new order delivered to `contact_id`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub contact_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub total_sum: i64,
    pub contact: Option<Contact>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderSummary {
    pub order: Order,
    pub total_sum: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<OrderSummary>,
}

/// Partner view: each order comes with the shop's own item rows and
/// the delivery contact, so the order can be assembled without extra
/// round trips.
#[derive(Debug, Serialize, ToSchema)]
pub struct PartnerOrderList {
    pub items: Vec<OrderWithItems>,
}
