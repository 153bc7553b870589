use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    Set, TransactionTrait,
};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit,
    domain::status::{OrderStatus, PaymentReferenceStatus},
    dto::{
        admin::{
            Dashboard, RecentOrder, ReportQuery, ReviewPaymentRequest, SalesReport, TopProduct,
            UpdateOrderStatusRequest, ViewedProduct, ViewsReport,
        },
        orders::{OrderList, OrderWithItems},
    },
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        payment_references::{ActiveModel as ReferenceActive, Entity as PaymentReferences},
        product_variants::{Column as VariantCol, Entity as ProductVariants},
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    response::{ApiResponse, Meta},
    routes::params::OrderListQuery,
    services::order_service::{list_orders_where, order_details, order_from_entity},
    state::AppState,
};

const RECENT_ORDERS: u64 = 5;
const DASHBOARD_TOP_PRODUCTS: i64 = 5;
const DEFAULT_REPORT_DAYS: i64 = 30;
const DEFAULT_REPORT_LIMIT: i64 = 10;

#[derive(FromRow)]
struct TopProductRow {
    product_id: Uuid,
    product_name: String,
    quantity: i64,
    total: i64,
}

impl From<TopProductRow> for TopProduct {
    fn from(row: TopProductRow) -> Self {
        TopProduct {
            product_id: row.product_id,
            product_name: row.product_name,
            quantity: row.quantity,
            total: row.total,
        }
    }
}

pub async fn dashboard(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Dashboard>> {
    ensure_admin(user)?;

    let (total_sales,): (i64,) = sqlx::query_as(
        "SELECT COALESCE(SUM(total), 0)::BIGINT FROM orders WHERE status <> 'cancelled'",
    )
    .fetch_one(&state.pool)
    .await?;
    let (order_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
        .fetch_one(&state.pool)
        .await?;
    let (pending_orders,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM orders WHERE status = 'pending'")
            .fetch_one(&state.pool)
            .await?;
    let (customer_count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM users WHERE is_admin = FALSE")
            .fetch_one(&state.pool)
            .await?;

    let recent_orders = Orders::find()
        .find_also_related(Users)
        .order_by_desc(OrderCol::CreatedAt)
        .limit(RECENT_ORDERS)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|(order, customer)| {
            Ok(RecentOrder {
                order: order_from_entity(order)?,
                customer_name: customer.map(|c| c.name).unwrap_or_default(),
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    let popular_products = top_products(state, None, None, DASHBOARD_TOP_PRODUCTS).await?;

    Ok(ApiResponse::success(
        "Dashboard",
        Dashboard {
            total_sales,
            order_count,
            pending_orders,
            customer_count,
            recent_orders,
            popular_products,
        },
        Some(Meta::empty()),
    ))
}

pub async fn sales_report(
    state: &AppState,
    user: &AuthUser,
    query: ReportQuery,
) -> AppResult<ApiResponse<SalesReport>> {
    ensure_admin(user)?;
    let (period_start, period_end) = report_period(&query)?;
    let limit = report_limit(query.limit);

    let (total_sales,): (i64,) = sqlx::query_as(
        "SELECT COALESCE(SUM(total), 0)::BIGINT FROM orders WHERE status <> 'cancelled'",
    )
    .fetch_one(&state.pool)
    .await?;
    let (period_sales,): (i64,) = sqlx::query_as(
        r#"
        SELECT COALESCE(SUM(total), 0)::BIGINT FROM orders
        WHERE status <> 'cancelled' AND created_at >= $1 AND created_at < $2
        "#,
    )
    .bind(period_start)
    .bind(period_end)
    .fetch_one(&state.pool)
    .await?;

    let top_products = top_products(state, Some(period_start), Some(period_end), limit).await?;

    Ok(ApiResponse::success(
        "Sales report",
        SalesReport {
            total_sales,
            period_sales,
            top_products,
            period_start,
            period_end,
        },
        Some(Meta::empty()),
    ))
}

pub async fn views_report(
    state: &AppState,
    user: &AuthUser,
    query: ReportQuery,
) -> AppResult<ApiResponse<ViewsReport>> {
    ensure_admin(user)?;
    let limit = report_limit(query.limit);

    let top_viewed = sqlx::query_as::<_, (Uuid, String, i64)>(
        "SELECT id, name, views FROM products ORDER BY views DESC, name ASC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(&state.pool)
    .await?
    .into_iter()
    .map(|(product_id, product_name, views)| ViewedProduct {
        product_id,
        product_name,
        views,
    })
    .collect();

    Ok(ApiResponse::success(
        "Views report",
        ViewsReport { top_viewed },
        Some(Meta::empty()),
    ))
}

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    list_orders_where(state, Condition::all(), query).await
}

pub async fn get_order_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_admin(user)?;
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let data = order_details(&state.orm, order).await?;
    Ok(ApiResponse::success("Order found", data, Some(Meta::empty())))
}

/// Moves an order along its lifecycle. Cancelling puts every line's
/// quantity back into variant stock in the same transaction.
pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;
    let existing = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let current: OrderStatus = existing.status.parse()?;
    let next = payload.status;
    if !current.can_transition_to(next) {
        return Err(AppError::BadRequest(format!(
            "Cannot change order status from {current} to {next}"
        )));
    }

    if next == OrderStatus::Cancelled {
        let lines = OrderItems::find()
            .filter(OrderItemCol::OrderId.eq(existing.id))
            .all(&txn)
            .await?;
        for line in lines {
            ProductVariants::update_many()
                .col_expr(VariantCol::Stock, Expr::col(VariantCol::Stock).add(line.quantity))
                .filter(VariantCol::Id.eq(line.variant_id))
                .exec(&txn)
                .await?;
        }
    }

    let mut active: OrderActive = existing.into();
    active.status = Set(next.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    txn.commit().await?;

    tracing::info!(order_id = %order.id, from = %current, to = %next, "order status changed");
    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_status_update",
        "orders",
        serde_json::json!({ "order_id": order.id, "from": current.as_str(), "status": next.as_str() }),
    )
    .await;

    let data = order_details(&state.orm, order).await?;
    Ok(ApiResponse::success("Order updated", data, Some(Meta::empty())))
}

/// Marks a submitted payment reference as verified or rejected. Verifying
/// moves a pending order into processing.
pub async fn review_payment_reference(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: ReviewPaymentRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;
    let reference = PaymentReferences::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let current: PaymentReferenceStatus = reference.status.parse()?;
    let next = payload.status;
    if !current.can_transition_to(next) {
        return Err(AppError::BadRequest(format!(
            "Cannot change payment reference from {current} to {next}"
        )));
    }

    let order_id = reference.order_id;
    let mut active: ReferenceActive = reference.into();
    active.status = Set(next.as_str().to_string());
    active.reviewed_by = Set(Some(user.user_id));
    active.reviewed_at = Set(Some(Utc::now().into()));
    active.update(&txn).await?;

    let order = Orders::find_by_id(order_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    let order = if next == PaymentReferenceStatus::Verified
        && order.status.parse::<OrderStatus>()? == OrderStatus::Pending
    {
        let mut active: OrderActive = order.into();
        active.status = Set(OrderStatus::Processing.as_str().to_string());
        active.updated_at = Set(Utc::now().into());
        active.update(&txn).await?
    } else {
        order
    };

    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "payment_review",
        "payment_references",
        serde_json::json!({ "reference_id": id, "order_id": order_id, "status": next.as_str() }),
    )
    .await;

    let data = order_details(&state.orm, order).await?;
    Ok(ApiResponse::success(
        "Payment reference reviewed",
        data,
        Some(Meta::empty()),
    ))
}

/// Units sold and revenue per product over non-cancelled orders, optionally
/// bounded to `[start, end)`.
async fn top_products(
    state: &AppState,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    limit: i64,
) -> AppResult<Vec<TopProduct>> {
    let rows = sqlx::query_as::<_, TopProductRow>(
        r#"
        SELECT oi.product_id,
               MAX(oi.product_name) AS product_name,
               SUM(oi.quantity)::BIGINT AS quantity,
               SUM(oi.subtotal)::BIGINT AS total
        FROM order_items oi
        JOIN orders o ON o.id = oi.order_id
        WHERE o.status <> 'cancelled'
          AND ($1::timestamptz IS NULL OR o.created_at >= $1)
          AND ($2::timestamptz IS NULL OR o.created_at < $2)
        GROUP BY oi.product_id
        ORDER BY quantity DESC, total DESC
        LIMIT $3
        "#,
    )
    .bind(start)
    .bind(end)
    .bind(limit)
    .fetch_all(&state.pool)
    .await?;

    Ok(rows.into_iter().map(TopProduct::from).collect())
}

fn report_period(query: &ReportQuery) -> AppResult<(DateTime<Utc>, DateTime<Utc>)> {
    let end = query.period_end.unwrap_or_else(Utc::now);
    let start = query
        .period_start
        .unwrap_or(end - Duration::days(DEFAULT_REPORT_DAYS));
    if start >= end {
        return Err(AppError::BadRequest(
            "period_start must be before period_end".into(),
        ));
    }
    Ok((start, end))
}

fn report_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_REPORT_LIMIT).clamp(1, 50)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_period_defaults_to_last_thirty_days() {
        let end = Utc::now();
        let query = ReportQuery {
            period_end: Some(end),
            ..Default::default()
        };
        let (start, got_end) = report_period(&query).unwrap();
        assert_eq!(got_end, end);
        assert_eq!(end - start, Duration::days(30));
    }

    #[test]
    fn report_period_rejects_inverted_range() {
        let now = Utc::now();
        let query = ReportQuery {
            period_start: Some(now),
            period_end: Some(now - Duration::days(1)),
            limit: None,
        };
        assert!(matches!(report_period(&query), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn report_limit_is_clamped() {
        assert_eq!(report_limit(None), 10);
        assert_eq!(report_limit(Some(0)), 1);
        assert_eq!(report_limit(Some(500)), 50);
    }
}
