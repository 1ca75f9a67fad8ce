use sea_orm_migration::prelude::*;

mod m20260310_000001_create_product_variants;
mod m20260310_000002_create_orders;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260310_000001_create_product_variants::Migration),
            Box::new(m20260310_000002_create_orders::Migration),
        ]
    }
}
