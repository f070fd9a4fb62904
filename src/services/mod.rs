pub mod category_service;
pub mod checkout_service;
pub mod order_service;
pub mod product_service;
