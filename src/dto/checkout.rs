use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Cart submission. Required fields are `Option` + `required` so that a
/// missing field reports under its own name instead of failing body
/// deserialization wholesale.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CheckoutRequest {
    #[validate(length(max = 255, message = "ensure this field has at most 255 characters"))]
    pub customer_name: Option<String>,
    #[validate(length(max = 20, message = "ensure this field has at most 20 characters"))]
    pub customer_phone: Option<String>,
    #[validate(
        required(message = "this field is required"),
        email(message = "enter a valid email address")
    )]
    pub customer_email: Option<String>,
    #[validate(
        length(min = 1, message = "cart must contain at least one item"),
        nested
    )]
    pub items: Vec<CheckoutItem>,
}

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct CheckoutItem {
    #[validate(required(message = "this field is required"))]
    pub product: Option<Uuid>,
    #[validate(
        required(message = "this field is required"),
        range(min = 1, message = "quantity must be a positive integer")
    )]
    pub quantity: Option<i32>,
    pub size: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    fn item(quantity: i32) -> CheckoutItem {
        CheckoutItem {
            product: Some(Uuid::new_v4()),
            quantity: Some(quantity),
            size: None,
        }
    }

    #[test]
    fn accepts_minimal_valid_payload() {
        let payload = CheckoutRequest {
            customer_name: None,
            customer_phone: None,
            customer_email: Some("a@b.com".into()),
            items: vec![item(2)],
        };
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn rejects_missing_email() {
        let payload = CheckoutRequest {
            customer_name: None,
            customer_phone: None,
            customer_email: None,
            items: vec![item(1)],
        };
        let errors = payload.validate().unwrap_err();
        assert!(errors.errors().contains_key("customer_email"));
    }

    #[test]
    fn rejects_malformed_email() {
        let payload = CheckoutRequest {
            customer_name: None,
            customer_phone: None,
            customer_email: Some("not an email".into()),
            items: vec![item(1)],
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn rejects_empty_item_list() {
        let payload = CheckoutRequest {
            customer_name: None,
            customer_phone: None,
            customer_email: Some("a@b.com".into()),
            items: vec![],
        };
        let errors = payload.validate().unwrap_err();
        assert!(errors.errors().contains_key("items"));
    }

    #[test]
    fn rejects_non_positive_quantity() {
        let payload = CheckoutRequest {
            customer_name: None,
            customer_phone: None,
            customer_email: Some("a@b.com".into()),
            items: vec![item(0)],
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn rejects_overlong_customer_name() {
        let payload = CheckoutRequest {
            customer_name: Some("x".repeat(256)),
            customer_phone: None,
            customer_email: Some("a@b.com".into()),
            items: vec![item(1)],
        };
        let errors = payload.validate().unwrap_err();
        assert!(errors.errors().contains_key("customer_name"));
    }
}
