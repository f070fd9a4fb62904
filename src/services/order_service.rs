use chrono::Utc;
use rand::Rng;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    db::OrmConn,
    entity::{
        order_items::{ActiveModel as OrderItemActive, Model as OrderItemModel},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products,
    },
    error::AppResult,
};

/// Normalized output of cart validation, ready for persistence.
#[derive(Debug)]
pub struct CartData {
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: String,
    pub lines: Vec<CartLine>,
}

#[derive(Debug)]
pub struct CartLine {
    pub product: products::Model,
    pub quantity: i32,
    pub size: Option<String>,
}

/// Persist one Order plus its items in a single transaction. Either the
/// whole batch lands or none of it does.
pub async fn create_order(
    orm: &OrmConn,
    cart: &CartData,
) -> AppResult<(OrderModel, Vec<OrderItemModel>)> {
    let txn = orm.begin().await?;

    let code = generate_order_code(&txn).await?;
    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        code: Set(code),
        customer_name: Set(cart.customer_name.clone()),
        customer_phone: Set(cart.customer_phone.clone()),
        customer_email: Set(cart.customer_email.clone()),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(cart.lines.len());
    for line in &cart.lines {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product.id),
            quantity: Set(line.quantity),
            size: Set(line.size.clone()),
        }
        .insert(&txn)
        .await?;
        items.push(item);
    }

    txn.commit().await?;

    tracing::info!(order_code = %order.code, items = items.len(), "order created");

    Ok((order, items))
}

/// Retry-until-unique order code. The probe runs on the creating
/// transaction; the UNIQUE column is the backstop.
async fn generate_order_code<C: ConnectionTrait>(conn: &C) -> AppResult<String> {
    loop {
        let serial: u32 = { rand::thread_rng().gen_range(100_000..=999_999) };
        let code = format!("ORD-{}-{}", Utc::now().format("%Y%m%d"), serial);
        let taken = Orders::find()
            .filter(OrderCol::Code.eq(code.as_str()))
            .count(conn)
            .await?
            > 0;
        if !taken {
            return Ok(code);
        }
    }
}
