use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    entity::{
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        product_infos::{Column as ListingCol, Entity as ProductInfos},
    },
    dto::basket::{AddToBasketRequest, BasketItemView, BasketView},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::OrderState,
    response::{ApiResponse, Meta},
    state::AppState,
};

#[derive(FromRow)]
struct BasketRow {
    id: Uuid,
    product_id: Uuid,
    product: String,
    shop_id: Uuid,
    shop: String,
    quantity: i32,
    price: i64,
}

/// The user's basket with items and the derived total. An absent basket
/// order is a valid, empty basket.
pub async fn get_basket(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<BasketView>> {
    let basket = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::State.eq(OrderState::Basket.as_str())),
        )
        .one(&state.orm)
        .await?;

    let basket = match basket {
        Some(order) => order,
        None => {
            let view = BasketView {
                id: None,
                items: Vec::new(),
                total_sum: 0,
            };
            return Ok(ApiResponse::success("OK", view, None));
        }
    };

    let rows = sqlx::query_as::<_, BasketRow>(
        r#"
        SELECT oi.id, oi.product_id, p.name AS product, oi.shop_id, s.name AS shop,
               oi.quantity, pi.price
        FROM order_items oi
        JOIN products p ON p.id = oi.product_id
        JOIN shops s ON s.id = oi.shop_id
        JOIN product_infos pi ON pi.product_id = oi.product_id AND pi.shop_id = oi.shop_id
        WHERE oi.order_id = $1
        ORDER BY p.name, s.name
        "#,
    )
    .bind(basket.id)
    .fetch_all(&state.pool)
    .await?;

    let total_sum = rows
        .iter()
        .map(|r| r.price * r.quantity as i64)
        .sum::<i64>();

    let items = rows
        .into_iter()
        .map(|r| BasketItemView {
            id: r.id,
            product_id: r.product_id,
            product: r.product,
            shop_id: r.shop_id,
            shop: r.shop,
            quantity: r.quantity,
            price: r.price,
        })
        .collect();

    let view = BasketView {
        id: Some(basket.id),
        items,
        total_sum,
    };
    Ok(ApiResponse::success("OK", view, None))
}

/// Add or update basket lines. The basket order is created on first add;
/// an existing (product, shop) line gets its quantity replaced.
pub async fn add_items(
    state: &AppState,
    user: &AuthUser,
    payload: AddToBasketRequest,
) -> AppResult<ApiResponse<BasketView>> {
    if payload.items.is_empty() {
        return Err(AppError::BadRequest("items must not be empty".into()));
    }
    for item in &payload.items {
        if item.quantity <= 0 {
            return Err(AppError::BadRequest(
                "quantity must be greater than 0".into(),
            ));
        }
    }

    let txn = state.orm.begin().await?;

    let basket = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::State.eq(OrderState::Basket.as_str())),
        )
        .one(&txn)
        .await?;

    let basket = match basket {
        Some(order) => order,
        None => {
            OrderActive {
                id: Set(Uuid::new_v4()),
                user_id: Set(user.user_id),
                dt: NotSet,
                state: Set(OrderState::Basket.as_str().to_string()),
                contact_id: Set(None),
            }
            .insert(&txn)
            .await?
        }
    };

    for item in &payload.items {
        let listing = ProductInfos::find()
            .filter(
                Condition::all()
                    .add(ListingCol::ProductId.eq(item.product_id))
                    .add(ListingCol::ShopId.eq(item.shop_id)),
            )
            .one(&txn)
            .await?;
        if listing.is_none() {
            return Err(AppError::BadRequest(format!(
                "no listing for product {} in shop {}",
                item.product_id, item.shop_id
            )));
        }

        let existing = OrderItems::find()
            .filter(
                Condition::all()
                    .add(OrderItemCol::OrderId.eq(basket.id))
                    .add(OrderItemCol::ProductId.eq(item.product_id))
                    .add(OrderItemCol::ShopId.eq(item.shop_id)),
            )
            .one(&txn)
            .await?;

        match existing {
            Some(line) => {
                let mut active: OrderItemActive = line.into();
                active.quantity = Set(item.quantity);
                active.update(&txn).await?;
            }
            None => {
                OrderItemActive {
                    id: Set(Uuid::new_v4()),
                    order_id: Set(basket.id),
                    product_id: Set(item.product_id),
                    shop_id: Set(item.shop_id),
                    quantity: Set(item.quantity),
                }
                .insert(&txn)
                .await?;
            }
        }
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "basket_update",
        Some("orders"),
        Some(serde_json::json!({ "order_id": basket.id, "items": payload.items.len() })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    get_basket(state, user).await
}

pub async fn remove_item(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let basket = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::State.eq(OrderState::Basket.as_str())),
        )
        .one(&state.orm)
        .await?;
    let basket = match basket {
        Some(order) => order,
        None => return Err(AppError::NotFound),
    };

    let result = OrderItems::delete_many()
        .filter(
            Condition::all()
                .add(OrderItemCol::Id.eq(item_id))
                .add(OrderItemCol::OrderId.eq(basket.id)),
        )
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "basket_remove",
        Some("order_items"),
        Some(serde_json::json!({ "item_id": item_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Removed from basket",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
