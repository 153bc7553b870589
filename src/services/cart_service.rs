use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    audit,
    domain::cart::{Cart, VariantSnapshot},
    dto::cart::{AddToCartRequest, UpdateCartItemRequest},
    entity::{
        cart_items::{ActiveModel as CartActive, Column as CartCol, Entity as CartItems},
        products::{Column as ProductCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models,
    response::{ApiResponse, Meta},
    services::product_service::{load_product, load_products},
    state::AppState,
};

pub async fn get_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<models::Cart>> {
    let cart = load_cart(&state.orm, user.user_id).await?;
    let view = cart.into_view();
    let meta = Meta::single_page(view.items.len());
    Ok(ApiResponse::success("OK", view, Some(meta)))
}

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<models::Cart>> {
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let product = match Products::find_by_id(payload.product_id)
        .one(&state.orm)
        .await?
    {
        Some(p) => load_product(&state.orm, p).await?,
        None => return Err(AppError::NotFound),
    };
    let variant = product.variant(payload.variant_id).ok_or(AppError::NotFound)?;
    let snapshot = VariantSnapshot::new(&product, variant);

    let mut cart = load_cart(&state.orm, user.user_id).await?;
    let quantity = cart.add(snapshot, payload.quantity)?;

    // A concurrent add of the same variant resolves to the last write.
    let line = CartActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        product_id: Set(payload.product_id),
        variant_id: Set(payload.variant_id),
        quantity: Set(quantity),
        created_at: Set(Utc::now().into()),
    };
    CartItems::insert(line)
        .on_conflict(
            OnConflict::columns([CartCol::UserId, CartCol::VariantId])
                .update_column(CartCol::Quantity)
                .to_owned(),
        )
        .exec(&state.orm)
        .await?;

    tracing::debug!(
        user_id = %user.user_id,
        variant_id = %payload.variant_id,
        quantity,
        "cart line updated"
    );
    audit::record(
        &state.pool,
        Some(user.user_id),
        "cart_update",
        "cart_items",
        serde_json::json!({ "product_id": payload.product_id, "variant_id": payload.variant_id, "quantity": quantity }),
    )
    .await;

    Ok(ApiResponse::success(
        format!("{} added to cart", product.name),
        cart.into_view(),
        None,
    ))
}

pub async fn update_quantity(
    state: &AppState,
    user: &AuthUser,
    variant_id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<models::Cart>> {
    let mut cart = load_cart(&state.orm, user.user_id).await?;
    cart.update_quantity(variant_id, payload.quantity)?;

    if payload.quantity <= 0 {
        delete_line(&state.orm, user.user_id, variant_id).await?;
    } else {
        set_line_quantity(&state.orm, user.user_id, variant_id, payload.quantity).await?;
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "cart_update",
        "cart_items",
        serde_json::json!({ "variant_id": variant_id, "quantity": payload.quantity.max(0) }),
    )
    .await;

    Ok(ApiResponse::success("OK", cart.into_view(), None))
}

pub async fn remove_from_cart(
    state: &AppState,
    user: &AuthUser,
    variant_id: Uuid,
) -> AppResult<ApiResponse<models::Cart>> {
    let mut cart = load_cart(&state.orm, user.user_id).await?;
    cart.remove(variant_id)?;
    delete_line(&state.orm, user.user_id, variant_id).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "cart_remove",
        "cart_items",
        serde_json::json!({ "variant_id": variant_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Removed from cart",
        cart.into_view(),
        Some(Meta::empty()),
    ))
}

pub async fn clear_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<models::Cart>> {
    CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "cart_clear",
        "cart_items",
        serde_json::json!({}),
    )
    .await;

    Ok(ApiResponse::success(
        "Cart cleared",
        Cart::new().into_view(),
        Some(Meta::empty()),
    ))
}

/// Rebuilds the user's cart with current prices and stock.
pub(crate) async fn load_cart<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<Cart> {
    let rows = CartItems::find()
        .filter(CartCol::UserId.eq(user_id))
        .order_by_asc(CartCol::CreatedAt)
        .all(conn)
        .await?;
    if rows.is_empty() {
        return Ok(Cart::new());
    }

    let mut product_ids: Vec<Uuid> = rows.iter().map(|r| r.product_id).collect();
    product_ids.sort();
    product_ids.dedup();
    let models = Products::find()
        .filter(ProductCol::Id.is_in(product_ids))
        .all(conn)
        .await?;
    let products = load_products(conn, models).await?;

    let mut cart = Cart::new();
    for row in rows {
        let snapshot = products.iter().find(|p| p.id == row.product_id).and_then(|product| {
            product
                .variant(row.variant_id)
                .map(|variant| VariantSnapshot::new(product, variant))
        });
        match snapshot {
            Some(snapshot) => cart.restore(snapshot, row.quantity)?,
            None => {
                tracing::warn!(cart_item_id = %row.id, "cart line points at a missing variant");
            }
        }
    }

    Ok(cart)
}

async fn set_line_quantity<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    variant_id: Uuid,
    quantity: i32,
) -> AppResult<()> {
    CartItems::update_many()
        .col_expr(CartCol::Quantity, Expr::value(quantity))
        .filter(line_condition(user_id, variant_id))
        .exec(conn)
        .await?;
    Ok(())
}

async fn delete_line<C: ConnectionTrait>(conn: &C, user_id: Uuid, variant_id: Uuid) -> AppResult<()> {
    let result = CartItems::delete_many()
        .filter(line_condition(user_id, variant_id))
        .exec(conn)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

fn line_condition(user_id: Uuid, variant_id: Uuid) -> Condition {
    Condition::all()
        .add(CartCol::UserId.eq(user_id))
        .add(CartCol::VariantId.eq(variant_id))
}
