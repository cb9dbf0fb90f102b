use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::models::Shop;

/// One good in an uploaded price list. `parameters` maps attribute
/// names (color, size, ...) to values.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CatalogGood {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub model: String,
    pub quantity: i32,
    pub price: i64,
    pub price_rrc: i64,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

/// JSON price list replacing the shop's whole catalog.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CatalogUpload {
    pub shop: String,
    pub url: String,
    pub filename: String,
    pub categories: Vec<String>,
    pub goods: Vec<CatalogGood>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CatalogUploadResult {
    pub shop: Shop,
    pub categories: usize,
    pub goods: usize,
}
