use anyhow::Context as _;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, SqlErr, TransactionError, TransactionTrait,
};

use storefront_checkout_schema::{orders, product_variants};
use storefront_domain::id::{CheckoutJobId, OrderId, ProductId};

use crate::domain::repository::{InventoryRepository, OrderRepository};
use crate::domain::types::{
    NewOrder, OrderInsert, OrderRecord, StockDecrement, VariantKey, VariantStock,
};
use crate::error::CheckoutServiceError;

// ── Inventory repository ─────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbInventoryRepository {
    pub db: DatabaseConnection,
}

/// Why a decrement transaction was rolled back.
#[derive(Debug, thiserror::Error)]
enum DecrementAbort {
    #[error(transparent)]
    Db(#[from] DbErr),
    #[error("stock guard matched {0} rows")]
    GuardMissed(u64),
}

impl InventoryRepository for DbInventoryRepository {
    async fn find_variants(
        &self,
        product_ids: &[ProductId],
    ) -> Result<Vec<VariantStock>, CheckoutServiceError> {
        if product_ids.is_empty() {
            return Ok(vec![]);
        }
        let models = product_variants::Entity::find()
            .filter(product_variants::Column::ProductId.is_in(product_ids.iter().map(|id| id.0)))
            .all(&self.db)
            .await
            .context("find product variants")?;
        Ok(models.into_iter().map(variant_from_model).collect())
    }

    async fn decrement_stock(
        &self,
        decrements: &[StockDecrement],
    ) -> Result<u64, CheckoutServiceError> {
        let mut decrements = decrements.to_vec();
        // Same row-lock order for every job.
        decrements.sort_by(|a, b| a.key.cmp(&b.key));
        let expected = decrements.len() as u64;
        let result = self
            .db
            .transaction::<_, u64, DecrementAbort>(|txn| {
                Box::pin(async move {
                    let mut matched = 0;
                    for d in &decrements {
                        // `stock >= quantity` in the WHERE clause is the oversell guard.
                        let res = product_variants::Entity::update_many()
                            .col_expr(
                                product_variants::Column::Stock,
                                Expr::col(product_variants::Column::Stock).sub(d.quantity),
                            )
                            .filter(product_variants::Column::ProductId.eq(d.key.product_id.0))
                            .filter(product_variants::Column::Size.eq(d.key.size.as_str()))
                            .filter(
                                product_variants::Column::ColorName.eq(d.key.color_name.as_str()),
                            )
                            .filter(product_variants::Column::Stock.gte(d.quantity))
                            .exec(txn)
                            .await?;
                        matched += res.rows_affected;
                    }
                    if matched < expected {
                        return Err(DecrementAbort::GuardMissed(matched));
                    }
                    Ok(matched)
                })
            })
            .await;

        match result {
            Ok(matched) => Ok(matched),
            Err(TransactionError::Transaction(DecrementAbort::GuardMissed(matched))) => {
                Ok(matched)
            }
            Err(e) => Err(anyhow::Error::new(e).context("decrement stock").into()),
        }
    }

    async fn restore_stock(
        &self,
        decrements: &[StockDecrement],
    ) -> Result<(), CheckoutServiceError> {
        let mut decrements = decrements.to_vec();
        decrements.sort_by(|a, b| a.key.cmp(&b.key));
        self.db
            .transaction::<_, (), DbErr>(|txn| {
                Box::pin(async move {
                    for d in &decrements {
                        product_variants::Entity::update_many()
                            .col_expr(
                                product_variants::Column::Stock,
                                Expr::col(product_variants::Column::Stock).add(d.quantity),
                            )
                            .filter(product_variants::Column::ProductId.eq(d.key.product_id.0))
                            .filter(product_variants::Column::Size.eq(d.key.size.as_str()))
                            .filter(
                                product_variants::Column::ColorName.eq(d.key.color_name.as_str()),
                            )
                            .exec(txn)
                            .await?;
                    }
                    Ok(())
                })
            })
            .await
            .context("restore stock")?;
        Ok(())
    }
}

fn variant_from_model(model: product_variants::Model) -> VariantStock {
    VariantStock {
        key: VariantKey {
            product_id: ProductId(model.product_id),
            size: model.size,
            color_name: model.color_name,
        },
        stock: model.stock,
    }
}

// ── Order repository ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbOrderRepository {
    pub db: DatabaseConnection,
}

impl OrderRepository for DbOrderRepository {
    async fn find_by_job_id(
        &self,
        job_id: CheckoutJobId,
    ) -> Result<Option<OrderRecord>, CheckoutServiceError> {
        let model = orders::Entity::find()
            .filter(orders::Column::CheckoutJobId.eq(job_id.0))
            .one(&self.db)
            .await
            .context("find order by checkout job id")?;
        Ok(model.map(order_from_model))
    }

    async fn create(&self, order: &NewOrder) -> Result<OrderInsert, CheckoutServiceError> {
        let items = serde_json::to_value(&order.items).context("serialize order items")?;
        let shipping_address =
            serde_json::to_value(&order.shipping_address).context("serialize shipping address")?;
        let result = orders::ActiveModel {
            id: Set(order.id.0),
            checkout_job_id: Set(order.checkout_job_id.0),
            order_number: Set(order.order_number.clone()),
            user_id: Set(order.user_id),
            buyer_email: Set(order.buyer_email.clone()),
            items: Set(items),
            shipping_address: Set(shipping_address),
            payment_method: Set(order.payment_method.clone()),
            items_price: Set(order.prices.items_price),
            tax_price: Set(order.prices.tax_price),
            shipping_price: Set(order.prices.shipping_price),
            total_price: Set(order.prices.total_price),
            created_at: Set(order.created_at),
        }
        .insert(&self.db)
        .await;

        match result {
            Ok(_) => Ok(OrderInsert::Created),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Ok(OrderInsert::Duplicate)
            }
            Err(e) => Err(anyhow::Error::new(e).context("create order").into()),
        }
    }
}

fn order_from_model(model: orders::Model) -> OrderRecord {
    OrderRecord {
        id: OrderId(model.id),
        checkout_job_id: CheckoutJobId(model.checkout_job_id),
        order_number: model.order_number,
    }
}
