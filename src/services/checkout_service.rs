use chrono::Utc;
use sea_orm::EntityTrait;
use validator::Validate;

use crate::{
    dto::checkout::CheckoutRequest,
    entity::Products,
    error::{AppError, AppResult, FieldErrors},
    invoice::InvoiceLine,
    models::Order,
    services::order_service::{self, CartData, CartLine},
    state::AppState,
};

/// Result of a successful checkout: the persisted order and its rendered
/// invoice document.
#[derive(Debug)]
pub struct CheckoutReceipt {
    pub order: Order,
    pub pdf: Vec<u8>,
}

/// Validate -> persist -> render. Validation failures carry field-level
/// detail and leave nothing behind; a render failure after the commit
/// surfaces as a server error with the order already durable.
pub async fn checkout(state: &AppState, payload: CheckoutRequest) -> AppResult<CheckoutReceipt> {
    let cart = validate_cart(state, payload).await?;
    let (order, items) = order_service::create_order(&state.orm, &cart).await?;

    let lines: Vec<InvoiceLine> = cart
        .lines
        .iter()
        .zip(&items)
        .map(|(line, item)| InvoiceLine {
            code: line.product.code.clone(),
            name: line.product.name.clone(),
            size: item.size.clone(),
            quantity: item.quantity,
            unit_price: line.product.price,
            image: line.product.image.clone(),
        })
        .collect();

    let pdf = state.invoices.render(&order, &lines).await?;

    // Invoice email delivery is intentionally disabled; the document is
    // returned in the response body instead.
    tracing::info!(order_code = %order.code, "checkout completed, invoice email skipped");

    Ok(CheckoutReceipt {
        order: order_from_entity(order),
        pdf,
    })
}

/// Syntactic checks (validator derive) plus product resolution, with all
/// failures accumulated into one field->messages map. No side effects.
async fn validate_cart(state: &AppState, payload: CheckoutRequest) -> AppResult<CartData> {
    let mut errors = match payload.validate() {
        Ok(()) => FieldErrors::default(),
        Err(validation_errors) => FieldErrors::from(validation_errors),
    };

    let mut lines = Vec::with_capacity(payload.items.len());
    for (index, item) in payload.items.iter().enumerate() {
        let (Some(product_id), Some(quantity)) = (item.product, item.quantity) else {
            // already reported by the `required` validators
            continue;
        };
        match Products::find_by_id(product_id).one(&state.orm).await? {
            Some(product) => lines.push(CartLine {
                product,
                quantity,
                size: item.size.clone(),
            }),
            None => errors.add(
                format!("items[{index}].product"),
                "product does not exist",
            ),
        }
    }

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }
    let Some(customer_email) = payload.customer_email else {
        return Err(AppError::BadRequest("customer_email is required".into()));
    };

    Ok(CartData {
        customer_name: payload.customer_name,
        customer_phone: payload.customer_phone,
        customer_email,
        lines,
    })
}

fn order_from_entity(model: crate::entity::orders::Model) -> Order {
    Order {
        id: model.id,
        code: model.code,
        customer_name: model.customer_name,
        customer_phone: model.customer_phone,
        customer_email: model.customer_email,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
