use utoipa::OpenApi;
use utoipa::openapi::OpenApi as OpenApiSpec;
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        categories::CategoryList,
        checkout::{CheckoutItem, CheckoutRequest},
        products,
    },
    error::FieldErrors,
    models::{Category, Order, Product},
    response::{ApiResponse, Meta},
    routes::{categories, checkout, health, params, products as product_routes},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        product_routes::list_products,
        product_routes::create_product,
        product_routes::get_product,
        product_routes::update_product,
        product_routes::delete_product,
        categories::list_categories,
        checkout::checkout,
    ),
    components(
        schemas(
            Category,
            Product,
            Order,
            CategoryList,
            CheckoutRequest,
            CheckoutItem,
            FieldErrors,
            products::CreateProductRequest,
            products::UpdateProductRequest,
            products::ProductList,
            params::Pagination,
            params::ProductQuery,
            health::HealthData,
            Meta,
            ApiResponse<Product>,
            ApiResponse<products::ProductList>,
            ApiResponse<CategoryList>,
            ApiResponse<FieldErrors>
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Products", description = "Product catalog endpoints"),
        (name = "Categories", description = "Category endpoints"),
        (name = "Checkout", description = "Cart checkout and invoice download"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
