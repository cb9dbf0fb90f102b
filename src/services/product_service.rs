use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::catalog::{ParameterValue, ProductFilter, ProductInfoList, ProductInfoView, ProductView},
    error::{AppError, AppResult},
    models::{Category, Shop},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
};

#[derive(FromRow)]
struct ListingRow {
    id: Uuid,
    product_id: Uuid,
    product_name: String,
    category_name: String,
    shop_name: String,
    name: String,
    quantity: i32,
    price: i64,
    price_rrc: i64,
}

#[derive(FromRow)]
struct ParameterRow {
    product_info_id: Uuid,
    parameter: String,
    value: String,
}

/// Catalog listing: ProductInfo rows joined with product, category and shop
/// names, plus the attribute list for every returned row.
pub async fn list_product_infos(
    pool: &DbPool,
    filter: ProductFilter,
    pagination: Pagination,
) -> AppResult<ApiResponse<ProductInfoList>> {
    let (page, limit, offset) = pagination.normalize();

    let rows = sqlx::query_as::<_, ListingRow>(
        r#"
        SELECT pi.id, pi.product_id, p.name AS product_name, c.name AS category_name,
               s.name AS shop_name, pi.name, pi.quantity, pi.price, pi.price_rrc
        FROM product_infos pi
        JOIN products p ON p.id = pi.product_id
        JOIN categories c ON c.id = p.category_id
        JOIN shops s ON s.id = pi.shop_id
        WHERE ($1::uuid IS NULL OR pi.shop_id = $1)
          AND ($2::uuid IS NULL OR p.category_id = $2)
        ORDER BY p.name, s.name
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(filter.shop_id)
    .bind(filter.category_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*)
        FROM product_infos pi
        JOIN products p ON p.id = pi.product_id
        WHERE ($1::uuid IS NULL OR pi.shop_id = $1)
          AND ($2::uuid IS NULL OR p.category_id = $2)
        "#,
    )
    .bind(filter.shop_id)
    .bind(filter.category_id)
    .fetch_one(pool)
    .await?;

    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let parameter_rows = sqlx::query_as::<_, ParameterRow>(
        r#"
        SELECT pp.product_info_id, pr.name AS parameter, pp.value
        FROM product_parameters pp
        JOIN parameters pr ON pr.id = pp.parameter_id
        WHERE pp.product_info_id = ANY($1)
        ORDER BY pr.name
        "#,
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let items = rows
        .into_iter()
        .map(|row| {
            let parameters = parameter_rows
                .iter()
                .filter(|p| p.product_info_id == row.id)
                .map(|p| ParameterValue {
                    parameter: p.parameter.clone(),
                    value: p.value.clone(),
                })
                .collect();
            ProductInfoView {
                id: row.id,
                product: ProductView {
                    id: row.product_id,
                    name: row.product_name,
                    category: row.category_name,
                },
                shop: row.shop_name,
                name: row.name,
                quantity: row.quantity,
                price: row.price,
                price_rrc: row.price_rrc,
                parameters,
            }
        })
        .collect();

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success(
        "Products",
        ProductInfoList { items },
        Some(meta),
    ))
}

pub async fn list_categories(pool: &DbPool) -> AppResult<ApiResponse<Vec<Category>>> {
    let items: Vec<Category> = sqlx::query_as("SELECT * FROM categories ORDER BY name")
        .fetch_all(pool)
        .await?;
    Ok(ApiResponse::success("Categories", items, None))
}

pub async fn get_category(pool: &DbPool, id: Uuid) -> AppResult<ApiResponse<Category>> {
    let category: Option<Category> = sqlx::query_as("SELECT * FROM categories WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    match category {
        Some(c) => Ok(ApiResponse::success("Category", c, None)),
        None => Err(AppError::NotFound),
    }
}

pub async fn list_shops(pool: &DbPool) -> AppResult<ApiResponse<Vec<Shop>>> {
    let items: Vec<Shop> = sqlx::query_as("SELECT * FROM shops ORDER BY name")
        .fetch_all(pool)
        .await?;
    Ok(ApiResponse::success("Shops", items, None))
}

pub async fn get_shop(pool: &DbPool, id: Uuid) -> AppResult<ApiResponse<Shop>> {
    let shop: Option<Shop> = sqlx::query_as("SELECT * FROM shops WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    match shop {
        Some(s) => Ok(ApiResponse::success("Shop", s, None)),
        None => Err(AppError::NotFound),
    }
}
