use crate::db::{DbPool, OrmConn};
use crate::images::ImageResolver;
use crate::invoice::InvoiceRenderer;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub images: ImageResolver,
    pub invoices: InvoiceRenderer,
}
