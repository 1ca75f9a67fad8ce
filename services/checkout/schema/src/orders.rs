use sea_orm::entity::prelude::*;

/// Placed order created by the checkout worker.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Idempotency key: at most one order per checkout job.
    #[sea_orm(unique)]
    pub checkout_job_id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub buyer_email: Option<String>,
    pub items: Json,
    pub shipping_address: Json,
    pub payment_method: String,
    pub items_price: f64,
    pub tax_price: f64,
    pub shipping_price: f64,
    pub total_price: f64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
