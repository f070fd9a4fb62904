use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::invoice::RenderError;
use crate::response::{ApiResponse, Meta};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error("Invoice rendering failed")]
    Render(#[from] RenderError),

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

/// Field path -> messages, flat even for nested list items
/// (`items[2].quantity`). This is the body of every 400 validation
/// response.
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct FieldErrors(pub BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut out = FieldErrors::default();
        collect_errors("", &errors, &mut out);
        out
    }
}

fn collect_errors(prefix: &str, errors: &ValidationErrors, out: &mut FieldErrors) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| error.code.to_string());
                    out.add(path.clone(), message);
                }
            }
            ValidationErrorsKind::Struct(nested) => {
                collect_errors(&path, nested, out);
            }
            ValidationErrorsKind::List(entries) => {
                for (index, nested) in entries {
                    collect_errors(&format!("{path}[{index}]"), nested, out);
                }
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::Render(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            AppError::DbError(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            AppError::OrmError(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        if let AppError::Validation(errors) = self {
            let body = ApiResponse {
                message,
                data: Some(errors),
                meta: Some(Meta::empty()),
            };
            return (status, axum::Json(body)).into_response();
        }

        let body = ApiResponse {
            message,
            data: Some(ErrorData {
                error: self.to_string(),
            }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::checkout::{CheckoutItem, CheckoutRequest};
    use validator::Validate;

    #[test]
    fn flattens_top_level_field_errors() {
        let payload = CheckoutRequest {
            customer_name: None,
            customer_phone: None,
            customer_email: Some("not-an-email".to_string()),
            items: vec![CheckoutItem {
                product: Some(uuid::Uuid::new_v4()),
                quantity: Some(1),
                size: None,
            }],
        };

        let errors = FieldErrors::from(payload.validate().unwrap_err());
        assert!(errors.contains("customer_email"));
    }

    #[test]
    fn flattens_nested_item_errors_with_index() {
        let payload = CheckoutRequest {
            customer_name: None,
            customer_phone: None,
            customer_email: Some("a@b.com".to_string()),
            items: vec![
                CheckoutItem {
                    product: Some(uuid::Uuid::new_v4()),
                    quantity: Some(2),
                    size: None,
                },
                CheckoutItem {
                    product: Some(uuid::Uuid::new_v4()),
                    quantity: Some(0),
                    size: None,
                },
            ],
        };

        let errors = FieldErrors::from(payload.validate().unwrap_err());
        assert!(errors.contains("items[1].quantity"));
        assert!(!errors.contains("items[0].quantity"));
    }

    #[test]
    fn manual_entries_accumulate_per_field() {
        let mut errors = FieldErrors::default();
        errors.add("items[0].product", "product does not exist");
        errors.add("items[0].product", "second message");
        assert_eq!(errors.0["items[0].product"].len(), 2);
    }
}
