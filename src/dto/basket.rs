use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct BasketItemRequest {
    pub product_id: Uuid,
    pub shop_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToBasketRequest {
    pub items: Vec<BasketItemRequest>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BasketItemView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product: String,
    pub shop_id: Uuid,
    pub shop: String,
    pub quantity: i32,
    pub price: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BasketView {
    pub id: Option<Uuid>,
    pub items: Vec<BasketItemView>,
    pub total_sum: i64,
}
