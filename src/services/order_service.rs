use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    domain::{
        cart::line_subtotal,
        status::{OrderStatus, PaymentReferenceStatus},
    },
    dto::orders::{
        AddPaymentReferenceRequest, CheckoutRequest, OrderList, OrderWithItems,
        PaymentReferenceInput,
    },
    entity::{
        cart_items::{Column as CartCol, Entity as CartItems},
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        payment_references::{
            ActiveModel as ReferenceActive, Column as ReferenceCol, Entity as PaymentReferences,
            Model as ReferenceModel,
        },
        product_variants::{Column as VariantCol, Entity as ProductVariants},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem, PaymentReference},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::{cart_service::load_cart, payment_service::find_active_method},
    state::AppState,
};

pub async fn list_user_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    list_orders_where(state, condition, query).await
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let data = order_details(&state.orm, order).await?;
    Ok(ApiResponse::success("OK", data, Some(Meta::empty())))
}

pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let shipping_address = required("shipping_address", &payload.shipping_address)?;
    let shipping_city = required("shipping_city", &payload.shipping_city)?;
    validate_reference(&payload.payment_reference)?;

    let txn = state.orm.begin().await?;

    find_active_method(&txn, payload.payment_method_id).await?;

    let cart = load_cart(&txn, user.user_id).await?;
    if cart.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    let variant_ids: Vec<Uuid> = cart.items().iter().map(|item| item.variant_id).collect();
    let locked: HashMap<Uuid, _> = ProductVariants::find()
        .filter(VariantCol::Id.is_in(variant_ids))
        .lock(LockType::Update)
        .all(&txn)
        .await?
        .into_iter()
        .map(|v| (v.id, v))
        .collect();

    let mut total: i64 = 0;
    let mut priced = Vec::with_capacity(cart.items().len());
    for item in cart.items() {
        let variant = locked.get(&item.variant_id).ok_or_else(|| {
            AppError::BadRequest(format!("{} is no longer available", item.product_name))
        })?;
        if variant.stock < item.quantity {
            return Err(AppError::BadRequest(format!(
                "Insufficient stock for {} ({}): {} available",
                item.product_name, item.color, variant.stock
            )));
        }
        let (running, subtotal) = add_line(total, variant.price, item.quantity)?;
        total = running;
        priced.push((variant.price, subtotal));
    }

    let now = Utc::now();
    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        status: Set(OrderStatus::Pending.as_str().to_string()),
        total: Set(total),
        payment_method_id: Set(payload.payment_method_id),
        shipping_address: Set(shipping_address),
        shipping_city: Set(shipping_city),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(cart.items().len());
    for (item, (unit_price, subtotal)) in cart.items().iter().zip(priced) {
        let line = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(item.product_id),
            variant_id: Set(item.variant_id),
            product_name: Set(item.product_name.clone()),
            color: Set(item.color.clone()),
            unit_price: Set(unit_price),
            quantity: Set(item.quantity),
            subtotal: Set(subtotal),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;
        items.push(order_item_from_entity(line));

        ProductVariants::update_many()
            .col_expr(VariantCol::Stock, Expr::col(VariantCol::Stock).sub(item.quantity))
            .filter(VariantCol::Id.eq(item.variant_id))
            .exec(&txn)
            .await?;
    }

    let reference = insert_reference(
        &txn,
        order.id,
        payload.payment_method_id,
        payload.payment_reference,
    )
    .await?;

    CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(order_id = %order.id, user_id = %user.user_id, total, "order placed");
    audit::record(
        &state.pool,
        Some(user.user_id),
        "checkout",
        "orders",
        serde_json::json!({ "order_id": order.id, "total": total }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order placed",
        OrderWithItems {
            order: order_from_entity(order)?,
            items,
            payment_reference: Some(payment_reference_from_entity(reference)?),
        },
        Some(Meta::empty()),
    ))
}

/// Attaches a new proof of payment. Only allowed while the order is open
/// and every earlier proof was rejected.
pub async fn add_payment_reference(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    payload: AddPaymentReferenceRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    validate_reference(&payload.reference)?;

    let txn = state.orm.begin().await?;
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(order_id)),
        )
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    if order.status.parse::<OrderStatus>()? == OrderStatus::Cancelled {
        return Err(AppError::BadRequest(
            "Cannot add a payment reference to a cancelled order".into(),
        ));
    }

    let existing = PaymentReferences::find()
        .filter(ReferenceCol::OrderId.eq(order.id))
        .all(&txn)
        .await?;
    for reference in &existing {
        if reference.status.parse::<PaymentReferenceStatus>()?.blocks_resubmission() {
            return Err(AppError::BadRequest(
                "Order already has a pending or verified payment reference".into(),
            ));
        }
    }

    find_active_method(&txn, payload.payment_method_id).await?;
    let reference = insert_reference(&txn, order.id, payload.payment_method_id, payload.reference)
        .await?;

    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "payment_reference_add",
        "payment_references",
        serde_json::json!({ "order_id": order.id, "reference_id": reference.id }),
    )
    .await;

    let data = order_details(&state.orm, order).await?;
    Ok(ApiResponse::success(
        "Payment reference submitted",
        data,
        Some(Meta::empty()),
    ))
}

/// Shared by the customer and admin order listings.
pub(crate) async fn list_orders_where(
    state: &AppState,
    mut condition: Condition,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = with_details(&state.orm, orders).await?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("OK", OrderList { items }, Some(meta)))
}

pub(crate) async fn order_details<C: ConnectionTrait>(
    conn: &C,
    order: OrderModel,
) -> AppResult<OrderWithItems> {
    let mut details = with_details(conn, vec![order]).await?;
    details.pop().ok_or(AppError::NotFound)
}

/// Loads lines and the latest payment reference for each order, keeping
/// the input order.
pub(crate) async fn with_details<C: ConnectionTrait>(
    conn: &C,
    orders: Vec<OrderModel>,
) -> AppResult<Vec<OrderWithItems>> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();

    let mut items_by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    for line in OrderItems::find()
        .filter(OrderItemCol::OrderId.is_in(ids.clone()))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(conn)
        .await?
    {
        items_by_order
            .entry(line.order_id)
            .or_default()
            .push(order_item_from_entity(line));
    }

    let mut latest_reference: HashMap<Uuid, ReferenceModel> = HashMap::new();
    for reference in PaymentReferences::find()
        .filter(ReferenceCol::OrderId.is_in(ids))
        .order_by_desc(ReferenceCol::CreatedAt)
        .all(conn)
        .await?
    {
        latest_reference.entry(reference.order_id).or_insert(reference);
    }

    orders
        .into_iter()
        .map(|order| {
            let items = items_by_order.remove(&order.id).unwrap_or_default();
            let payment_reference = latest_reference
                .remove(&order.id)
                .map(payment_reference_from_entity)
                .transpose()?;
            Ok(OrderWithItems {
                order: order_from_entity(order)?,
                items,
                payment_reference,
            })
        })
        .collect()
}

async fn insert_reference<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
    payment_method_id: Uuid,
    input: PaymentReferenceInput,
) -> AppResult<ReferenceModel> {
    let reference = ReferenceActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order_id),
        payment_method_id: Set(payment_method_id),
        reference_number: Set(input.reference_number.trim().to_string()),
        bank_origin: Set(input.bank_origin.trim().to_string()),
        date: Set(input.date),
        image_url: Set(input
            .image_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())),
        status: Set(PaymentReferenceStatus::Pending.as_str().to_string()),
        reviewed_by: Set(None),
        reviewed_at: Set(None),
        created_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await?;
    Ok(reference)
}

/// Adds one line to a running order total; returns the new total and the
/// line subtotal.
fn add_line(total: i64, unit_price: i64, quantity: i32) -> AppResult<(i64, i64)> {
    line_subtotal(unit_price, quantity)
        .and_then(|subtotal| Some((total.checked_add(subtotal)?, subtotal)))
        .ok_or_else(|| AppError::BadRequest("Order total is too large".into()))
}

fn validate_reference(input: &PaymentReferenceInput) -> AppResult<()> {
    required("reference_number", &input.reference_number)?;
    required("bank_origin", &input.bank_origin)?;
    Ok(())
}

fn required(field: &str, value: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(value.to_string())
}

pub(crate) fn order_from_entity(model: OrderModel) -> AppResult<Order> {
    Ok(Order {
        id: model.id,
        user_id: model.user_id,
        status: model.status.parse()?,
        total: model.total,
        payment_method_id: model.payment_method_id,
        shipping_address: model.shipping_address,
        shipping_city: model.shipping_city,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        variant_id: model.variant_id,
        product_name: model.product_name,
        color: model.color,
        unit_price: model.unit_price,
        quantity: model.quantity,
        subtotal: model.subtotal,
    }
}

pub(crate) fn payment_reference_from_entity(model: ReferenceModel) -> AppResult<PaymentReference> {
    Ok(PaymentReference {
        id: model.id,
        order_id: model.order_id,
        payment_method_id: model.payment_method_id,
        reference_number: model.reference_number,
        bank_origin: model.bank_origin,
        date: model.date,
        image_url: model.image_url,
        status: model.status.parse()?,
        created_at: model.created_at.with_timezone(&Utc),
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn reference(number: &str, bank: &str) -> PaymentReferenceInput {
        PaymentReferenceInput {
            reference_number: number.into(),
            bank_origin: bank.into(),
            date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            image_url: None,
        }
    }

    #[test]
    fn required_trims_and_rejects_blank() {
        assert_eq!(required("shipping_city", "  Caracas ").unwrap(), "Caracas");
        assert!(matches!(
            required("shipping_city", "   "),
            Err(AppError::BadRequest(msg)) if msg == "shipping_city is required"
        ));
    }

    #[test]
    fn reference_needs_number_and_bank() {
        assert!(validate_reference(&reference("000123", "Banesco")).is_ok());
        assert!(validate_reference(&reference("", "Banesco")).is_err());
        assert!(validate_reference(&reference("000123", " ")).is_err());
    }

    #[test]
    fn order_total_overflow_is_a_bad_request() {
        assert_eq!(add_line(0, 59999, 2).unwrap(), (119998, 119998));
        assert_eq!(add_line(119998, 2999, 3).unwrap(), (128995, 8997));
        assert!(matches!(
            add_line(0, i64::MAX / 2 + 1, 2),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            add_line(i64::MAX - 10, 2999, 1),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn unknown_stored_status_is_internal_error() {
        let now = Utc::now();
        let model = OrderModel {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            status: "paid".into(),
            total: 100,
            payment_method_id: Uuid::new_v4(),
            shipping_address: "Av. Principal".into(),
            shipping_city: "Caracas".into(),
            created_at: now.into(),
            updated_at: now.into(),
        };
        assert!(matches!(order_from_entity(model.clone()), Err(AppError::Internal(_))));

        let model = OrderModel {
            status: "shipped".into(),
            ..model
        };
        assert_eq!(order_from_entity(model).unwrap().status, OrderStatus::Shipped);
    }
}
