use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QuerySelect, Set,
    TransactionTrait,
};
use sea_orm::sea_query::{Expr, LockType};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    entity::{
        contacts::{Column as ContactCol, Entity as Contacts},
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        product_infos::{Column as ListingCol, Entity as ProductInfos},
    },
    dto::orders::{CheckoutRequest, OrderList, OrderSummary, OrderWithItems},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Contact, Order, OrderItem, OrderState},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

#[derive(FromRow)]
struct OrderTotalRow {
    id: Uuid,
    user_id: Uuid,
    dt: chrono::DateTime<Utc>,
    state: String,
    contact_id: Option<Uuid>,
    total_sum: i64,
}

fn check_transition(current: &str, next: OrderState) -> AppResult<()> {
    let current = OrderState::parse(current)
        .ok_or_else(|| AppError::BadRequest(format!("unknown order state {current}")))?;
    if !current.can_transition_to(next) {
        return Err(AppError::BadRequest(format!(
            "cannot move order from {} to {}",
            current.as_str(),
            next.as_str()
        )));
    }
    Ok(())
}

/// Checkout: the basket becomes a `new` order bound to a delivery contact.
/// Listed stock is checked and decremented under row locks in one transaction.
pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let txn = state.orm.begin().await?;

    let basket = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::State.eq(OrderState::Basket.as_str())),
        )
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let basket = match basket {
        Some(order) => order,
        None => return Err(AppError::BadRequest("Basket is empty".into())),
    };
    check_transition(&basket.state, OrderState::New)?;

    let contact = Contacts::find()
        .filter(
            Condition::all()
                .add(ContactCol::Id.eq(payload.contact_id))
                .add(ContactCol::UserId.eq(user.user_id)),
        )
        .one(&txn)
        .await?;
    let contact = match contact {
        Some(c) => c,
        None => return Err(AppError::BadRequest("Unknown delivery contact".into())),
    };

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(basket.id))
        .all(&txn)
        .await?;
    if items.is_empty() {
        return Err(AppError::BadRequest("Basket is empty".into()));
    }

    for item in &items {
        let listing = ProductInfos::find()
            .filter(
                Condition::all()
                    .add(ListingCol::ProductId.eq(item.product_id))
                    .add(ListingCol::ShopId.eq(item.shop_id)),
            )
            .lock(LockType::Update)
            .one(&txn)
            .await?;
        let listing = match listing {
            Some(l) => l,
            None => {
                return Err(AppError::BadRequest(format!(
                    "product {} is no longer listed by shop {}",
                    item.product_id, item.shop_id
                )));
            }
        };
        if listing.quantity < item.quantity {
            return Err(AppError::BadRequest(format!(
                "insufficient stock for product {}",
                item.product_id
            )));
        }

        ProductInfos::update_many()
            .col_expr(
                ListingCol::Quantity,
                Expr::col(ListingCol::Quantity).sub(item.quantity),
            )
            .filter(ListingCol::Id.eq(listing.id))
            .exec(&txn)
            .await?;
    }

    let mut active: OrderActive = basket.into();
    active.state = Set(OrderState::New.as_str().to_string());
    active.dt = Set(Utc::now().into());
    active.contact_id = Set(Some(contact.id));
    let order = active.update(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "checkout",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let total_sum = order_total(state, order.id).await?;
    let items = items.into_iter().map(order_item_from_entity).collect();
    let data = OrderWithItems {
        order: order_from_entity(order),
        items,
        total_sum,
        contact: Some(contact_from_entity(contact)),
    };
    Ok(ApiResponse::success(
        "Order placed",
        data,
        Some(Meta::empty()),
    ))
}

/// The user's submitted orders (baskets excluded), newest first, with the
/// derived total per order.
pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = pagination.normalize();

    let rows = sqlx::query_as::<_, OrderTotalRow>(
        r#"
        SELECT o.id, o.user_id, o.dt, o.state, o.contact_id,
               COALESCE(SUM(oi.quantity * pi.price), 0)::BIGINT AS total_sum
        FROM orders o
        LEFT JOIN order_items oi ON oi.order_id = o.id
        LEFT JOIN product_infos pi
            ON pi.product_id = oi.product_id AND pi.shop_id = oi.shop_id
        WHERE o.user_id = $1 AND o.state <> 'basket'
        GROUP BY o.id
        ORDER BY o.dt DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user.user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let total: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM orders WHERE user_id = $1 AND state <> 'basket'")
            .bind(user.user_id)
            .fetch_one(&state.pool)
            .await?;

    let items = rows.into_iter().map(summary_from_row).collect();
    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::Id.eq(id))
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::State.ne(OrderState::Basket.as_str())),
        )
        .one(&state.orm)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();

    let contact = match order.contact_id {
        Some(contact_id) => Contacts::find_by_id(contact_id)
            .one(&state.orm)
            .await?
            .map(contact_from_entity),
        None => None,
    };

    let total_sum = order_total(state, order.id).await?;
    let data = OrderWithItems {
        order: order_from_entity(order),
        items,
        total_sum,
        contact,
    };
    Ok(ApiResponse::success("OK", data, Some(Meta::empty())))
}

pub(crate) async fn order_total(state: &AppState, order_id: Uuid) -> AppResult<i64> {
    let total: (i64,) = sqlx::query_as(
        r#"
        SELECT COALESCE(SUM(oi.quantity * pi.price), 0)::BIGINT
        FROM order_items oi
        JOIN product_infos pi
            ON pi.product_id = oi.product_id AND pi.shop_id = oi.shop_id
        WHERE oi.order_id = $1
        "#,
    )
    .bind(order_id)
    .fetch_one(&state.pool)
    .await?;
    Ok(total.0)
}

pub(crate) fn order_from_entity(model: crate::entity::orders::Model) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        dt: model.dt.with_timezone(&Utc),
        state: model.state,
        contact_id: model.contact_id,
    }
}

pub(crate) fn order_item_from_entity(model: crate::entity::order_items::Model) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        shop_id: model.shop_id,
        quantity: model.quantity,
    }
}

pub(crate) fn contact_from_entity(model: crate::entity::contacts::Model) -> Contact {
    Contact {
        id: model.id,
        user_id: model.user_id,
        city: model.city,
        street: model.street,
        phone: model.phone,
    }
}

fn summary_from_row(row: OrderTotalRow) -> OrderSummary {
    OrderSummary {
        order: Order {
            id: row.id,
            user_id: row.user_id,
            dt: row.dt,
            state: row.state,
            contact_id: row.contact_id,
        },
        total_sum: row.total_sum,
    }
}
