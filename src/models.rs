use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
}

/// API representation of a product. `category` stays the raw id while
/// `category_name` carries the joined display name, and `image` is always
/// the resolved absolute URL.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub category: Option<Uuid>,
    pub category_name: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = String, example = "19.99")]
    pub price: Decimal,
    pub image: Option<String>,
    pub code: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub code: String,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: String,
    pub created_at: DateTime<Utc>,
}
