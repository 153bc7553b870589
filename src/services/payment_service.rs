use sea_orm::{ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::{
    dto::payments::{PaymentMethodList, PaymentMethodQuery},
    entity::payment_methods::{Column, Entity as PaymentMethods, Model as PaymentMethodModel},
    error::{AppError, AppResult},
    models::PaymentMethod,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn list_payment_methods(
    state: &AppState,
    query: PaymentMethodQuery,
) -> AppResult<ApiResponse<PaymentMethodList>> {
    let mut condition = Condition::all().add(Column::IsActive.eq(true));
    if let Some(kind) = query.kind {
        condition = condition.add(Column::Kind.eq(kind.as_str()));
    }

    let items = PaymentMethods::find()
        .filter(condition)
        .order_by_asc(Column::Kind)
        .order_by_asc(Column::Bank)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(payment_method_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    let meta = Meta::single_page(items.len());
    Ok(ApiResponse::success("OK", PaymentMethodList { items }, Some(meta)))
}

pub async fn get_payment_method(
    state: &AppState,
    id: Uuid,
) -> AppResult<ApiResponse<PaymentMethod>> {
    let method = PaymentMethods::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success(
        "OK",
        payment_method_from_entity(method)?,
        Some(Meta::empty()),
    ))
}

/// Checkout and reference submission only accept active methods.
pub(crate) async fn find_active_method<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> AppResult<PaymentMethodModel> {
    PaymentMethods::find_by_id(id)
        .filter(Column::IsActive.eq(true))
        .one(conn)
        .await?
        .ok_or_else(|| AppError::BadRequest("Payment method not found".into()))
}

fn payment_method_from_entity(model: PaymentMethodModel) -> AppResult<PaymentMethod> {
    Ok(PaymentMethod {
        id: model.id,
        kind: model.kind.parse()?,
        bank: model.bank,
        account_number: model.account_number,
        phone: model.phone,
        dni: model.dni,
        holder_name: model.holder_name,
        account_type: model.account_type.map(|t| t.parse()).transpose()?,
    })
}
