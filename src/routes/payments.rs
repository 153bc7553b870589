use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::payments::{PaymentMethodList, PaymentMethodQuery},
    error::AppResult,
    models::PaymentMethod,
    response::ApiResponse,
    services::payment_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_payment_methods))
        .route("/{id}", get(get_payment_method))
}

#[utoipa::path(
    get,
    path = "/api/payment-methods",
    params(
        ("kind" = Option<String>, Query, description = "pago_movil or transferencia")
    ),
    responses(
        (status = 200, description = "Active payment methods", body = ApiResponse<PaymentMethodList>)
    ),
    tag = "Payments"
)]
pub async fn list_payment_methods(
    State(state): State<AppState>,
    Query(query): Query<PaymentMethodQuery>,
) -> AppResult<Json<ApiResponse<PaymentMethodList>>> {
    let resp = payment_service::list_payment_methods(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/payment-methods/{id}",
    params(
        ("id" = Uuid, Path, description = "Payment method ID")
    ),
    responses(
        (status = 200, description = "Payment method details", body = ApiResponse<PaymentMethod>),
        (status = 404, description = "Not Found")
    ),
    tag = "Payments"
)]
pub async fn get_payment_method(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<PaymentMethod>>> {
    let resp = payment_service::get_payment_method(&state, id).await?;
    Ok(Json(resp))
}
