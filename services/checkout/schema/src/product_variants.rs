use sea_orm::entity::prelude::*;

/// Sellable variant of a catalog product. `(product_id, size, color_name)` is unique.
///
/// Only `stock` is written by the checkout service; the catalog service owns the rest.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "product_variants")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub product_id: Uuid,
    pub size: String,
    pub color_name: String,
    /// Never negative (CHECK constraint + guarded decrement).
    pub stock: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
