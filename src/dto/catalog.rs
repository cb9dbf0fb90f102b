use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Product projection used inside listings: category by name, not id.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductView {
    pub id: Uuid,
    pub name: String,
    pub category: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ParameterValue {
    pub parameter: String,
    pub value: String,
}

/// A per-shop listing with its product, shop name and attributes.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductInfoView {
    pub id: Uuid,
    pub product: ProductView,
    pub shop: String,
    pub name: String,
    pub quantity: i32,
    pub price: i64,
    pub price_rrc: i64,
    pub parameters: Vec<ParameterValue>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductInfoList {
    pub items: Vec<ProductInfoView>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProductFilter {
    pub shop_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
}
