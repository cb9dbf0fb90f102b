use std::collections::{HashMap, HashSet};

use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, Set, TransactionTrait,
};
use sea_orm::DatabaseTransaction;
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    entity::{
        categories::{ActiveModel as CategoryActive, Column as CategoryCol, Entity as Categories},
        product_infos::{ActiveModel as ListingActive, Column as ListingCol, Entity as ProductInfos},
        product_parameters::ActiveModel as ProductParameterActive,
        parameters::{ActiveModel as ParameterActive, Column as ParameterCol, Entity as Parameters},
        products::{ActiveModel as ProductActive, Column as ProductCol, Entity as Products},
        shop_categories::{
            ActiveModel as ShopCategoryActive, Column as ShopCategoryCol, Entity as ShopCategories,
        },
        shops::{ActiveModel as ShopActive, Column as ShopCol, Entity as Shops},
    },
    dto::{
        orders::{OrderWithItems, PartnerOrderList},
        partner::{CatalogUpload, CatalogUploadResult},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_shop},
    models::{Contact, Order, OrderItem, Shop},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

#[derive(FromRow)]
struct PartnerOrderRow {
    id: Uuid,
    user_id: Uuid,
    dt: chrono::DateTime<chrono::Utc>,
    state: String,
    contact_id: Option<Uuid>,
    total_sum: i64,
}

/// Replace the partner's whole catalog from an uploaded price list.
/// The shop record is upserted, categories linked, and every previous
/// listing of the shop discarded before the new goods are written.
pub async fn update_catalog(
    state: &AppState,
    user: &AuthUser,
    payload: CatalogUpload,
) -> AppResult<ApiResponse<CatalogUploadResult>> {
    ensure_shop(user)?;

    if payload.shop.trim().is_empty() {
        return Err(AppError::BadRequest("shop name must not be empty".into()));
    }
    for good in &payload.goods {
        if good.quantity < 0 || good.price < 0 || good.price_rrc < 0 {
            return Err(AppError::BadRequest(format!(
                "negative quantity or price for {}",
                good.name
            )));
        }
    }

    let txn = state.orm.begin().await?;

    // url and filename are unique across shops; reject collisions with
    // other partners up front instead of surfacing a constraint error.
    let clash = Shops::find()
        .filter(
            Condition::all()
                .add(ShopCol::UserId.ne(user.user_id))
                .add(
                    Condition::any()
                        .add(ShopCol::Url.eq(payload.url.clone()))
                        .add(ShopCol::Filename.eq(payload.filename.clone())),
                ),
        )
        .one(&txn)
        .await?;
    if clash.is_some() {
        return Err(AppError::BadRequest(
            "url or filename already used by another shop".into(),
        ));
    }

    let shop = match Shops::find()
        .filter(ShopCol::UserId.eq(user.user_id))
        .one(&txn)
        .await?
    {
        Some(existing) => {
            let mut active: ShopActive = existing.into();
            active.name = Set(payload.shop.clone());
            active.url = Set(payload.url.clone());
            active.filename = Set(payload.filename.clone());
            active.update(&txn).await?
        }
        None => {
            ShopActive {
                id: Set(Uuid::new_v4()),
                user_id: Set(user.user_id),
                name: Set(payload.shop.clone()),
                url: Set(payload.url.clone()),
                filename: Set(payload.filename.clone()),
            }
            .insert(&txn)
            .await?
        }
    };

    for name in &payload.categories {
        let category_id = find_or_create_category(&txn, name).await?;
        link_shop_category(&txn, shop.id, category_id).await?;
    }

    // Wholesale replacement: parameters go with the listings via cascade.
    ProductInfos::delete_many()
        .filter(ListingCol::ShopId.eq(shop.id))
        .exec(&txn)
        .await?;

    let mut goods = 0usize;
    let mut listed: HashSet<Uuid> = HashSet::new();
    for good in &payload.goods {
        let category_id = find_or_create_category(&txn, &good.category).await?;
        link_shop_category(&txn, shop.id, category_id).await?;

        let product = Products::find()
            .filter(
                Condition::all()
                    .add(ProductCol::CategoryId.eq(category_id))
                    .add(ProductCol::Name.eq(good.name.clone())),
            )
            .one(&txn)
            .await?;
        let product = match product {
            Some(p) => p,
            None => {
                ProductActive {
                    id: Set(Uuid::new_v4()),
                    category_id: Set(category_id),
                    name: Set(good.name.clone()),
                }
                .insert(&txn)
                .await?
            }
        };

        // One listing per (product, shop); a price list naming the same
        // good twice is malformed, not a second row.
        if !listed.insert(product.id) {
            return Err(AppError::BadRequest(format!(
                "good {} appears more than once in the price list",
                good.name
            )));
        }

        let listing_name = if good.model.is_empty() {
            good.name.clone()
        } else {
            good.model.clone()
        };
        let listing = ListingActive {
            id: Set(Uuid::new_v4()),
            product_id: Set(product.id),
            shop_id: Set(shop.id),
            name: Set(listing_name),
            quantity: Set(good.quantity),
            price: Set(good.price),
            price_rrc: Set(good.price_rrc),
        }
        .insert(&txn)
        .await?;

        for (name, value) in &good.parameters {
            let parameter = Parameters::find()
                .filter(ParameterCol::Name.eq(name.clone()))
                .one(&txn)
                .await?;
            let parameter_id = match parameter {
                Some(p) => p.id,
                None => {
                    ParameterActive {
                        id: Set(Uuid::new_v4()),
                        name: Set(name.clone()),
                    }
                    .insert(&txn)
                    .await?
                    .id
                }
            };
            ProductParameterActive {
                id: Set(Uuid::new_v4()),
                product_info_id: Set(listing.id),
                parameter_id: Set(parameter_id),
                value: Set(value.clone()),
            }
            .insert(&txn)
            .await?;
        }

        goods += 1;
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "partner_update",
        Some("shops"),
        Some(serde_json::json!({ "shop_id": shop.id, "goods": goods })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let result = CatalogUploadResult {
        shop: shop_from_entity(shop),
        categories: payload.categories.len(),
        goods,
    };
    Ok(ApiResponse::success("Catalog updated", result, None))
}

/// The partner's shop record, as last uploaded.
pub async fn partner_state(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Shop>> {
    ensure_shop(user)?;

    let shop: Option<Shop> = sqlx::query_as("SELECT * FROM shops WHERE user_id = $1")
        .bind(user.user_id)
        .fetch_optional(&state.pool)
        .await?;
    match shop {
        Some(s) => Ok(ApiResponse::success("OK", s, None)),
        None => Err(AppError::NotFound),
    }
}

/// Submitted orders containing at least one item sold by the partner's
/// shop, each with the shop's item rows, the delivery contact, and a
/// total covering only this shop's share of the order.
pub async fn partner_orders(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<PartnerOrderList>> {
    ensure_shop(user)?;

    let shop: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM shops WHERE user_id = $1")
        .bind(user.user_id)
        .fetch_optional(&state.pool)
        .await?;
    let shop_id = match shop {
        Some((id,)) => id,
        None => return Err(AppError::NotFound),
    };

    let (page, limit, offset) = pagination.normalize();

    let rows = sqlx::query_as::<_, PartnerOrderRow>(
        r#"
        SELECT o.id, o.user_id, o.dt, o.state, o.contact_id,
               COALESCE(SUM(oi.quantity * pi.price), 0)::BIGINT AS total_sum
        FROM orders o
        JOIN order_items oi ON oi.order_id = o.id AND oi.shop_id = $1
        JOIN product_infos pi
            ON pi.product_id = oi.product_id AND pi.shop_id = oi.shop_id
        WHERE o.state <> 'basket'
        GROUP BY o.id
        ORDER BY o.dt DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(shop_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let total: (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(DISTINCT o.id)
        FROM orders o
        JOIN order_items oi ON oi.order_id = o.id AND oi.shop_id = $1
        WHERE o.state <> 'basket'
        "#,
    )
    .bind(shop_id)
    .fetch_one(&state.pool)
    .await?;

    let order_ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
    let item_rows: Vec<OrderItem> = sqlx::query_as(
        "SELECT * FROM order_items WHERE shop_id = $1 AND order_id = ANY($2)",
    )
    .bind(shop_id)
    .bind(&order_ids)
    .fetch_all(&state.pool)
    .await?;
    let mut items_by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    for item in item_rows {
        items_by_order.entry(item.order_id).or_default().push(item);
    }

    let contact_ids: Vec<Uuid> = rows.iter().filter_map(|row| row.contact_id).collect();
    let contact_rows: Vec<Contact> = sqlx::query_as("SELECT * FROM contacts WHERE id = ANY($1)")
        .bind(&contact_ids)
        .fetch_all(&state.pool)
        .await?;
    let contacts: HashMap<Uuid, Contact> =
        contact_rows.into_iter().map(|c| (c.id, c)).collect();

    let items = rows
        .into_iter()
        .map(|row| OrderWithItems {
            items: items_by_order.remove(&row.id).unwrap_or_default(),
            contact: row.contact_id.and_then(|id| contacts.get(&id).cloned()),
            total_sum: row.total_sum,
            order: Order {
                id: row.id,
                user_id: row.user_id,
                dt: row.dt,
                state: row.state,
                contact_id: row.contact_id,
            },
        })
        .collect();

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success(
        "Orders",
        PartnerOrderList { items },
        Some(meta),
    ))
}

async fn find_or_create_category(txn: &DatabaseTransaction, name: &str) -> AppResult<Uuid> {
    let existing = Categories::find()
        .filter(CategoryCol::Name.eq(name.to_string()))
        .one(txn)
        .await?;
    match existing {
        Some(c) => Ok(c.id),
        None => {
            let created = CategoryActive {
                id: Set(Uuid::new_v4()),
                name: Set(name.to_string()),
            }
            .insert(txn)
            .await?;
            Ok(created.id)
        }
    }
}

async fn link_shop_category(
    txn: &DatabaseTransaction,
    shop_id: Uuid,
    category_id: Uuid,
) -> AppResult<()> {
    let existing = ShopCategories::find()
        .filter(
            Condition::all()
                .add(ShopCategoryCol::ShopId.eq(shop_id))
                .add(ShopCategoryCol::CategoryId.eq(category_id)),
        )
        .one(txn)
        .await?;
    if existing.is_none() {
        ShopCategoryActive {
            id: Set(Uuid::new_v4()),
            shop_id: Set(shop_id),
            category_id: Set(category_id),
        }
        .insert(txn)
        .await?;
    }
    Ok(())
}

fn shop_from_entity(model: crate::entity::shops::Model) -> Shop {
    Shop {
        id: model.id,
        user_id: model.user_id,
        name: model.name,
        url: model.url,
        filename: model.filename,
    }
}
