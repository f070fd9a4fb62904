use axum::{
    Json,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};

use crate::{
    dto::checkout::CheckoutRequest,
    error::{AppResult, FieldErrors},
    response::ApiResponse,
    services::checkout_service,
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/api/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "PDF invoice for the created order",
         content_type = "application/pdf", body = Vec<u8>),
        (status = 400, description = "Validation failed, nothing persisted",
         body = ApiResponse<FieldErrors>),
    ),
    tag = "Checkout"
)]
pub async fn checkout(
    State(state): State<AppState>,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<Response> {
    let receipt = checkout_service::checkout(&state, payload).await?;

    let disposition = format!(
        "attachment; filename=\"invoice_{}.pdf\"",
        receipt.order.code
    );
    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (header::CONTENT_DISPOSITION, disposition),
    ];
    Ok((headers, receipt.pdf).into_response())
}
