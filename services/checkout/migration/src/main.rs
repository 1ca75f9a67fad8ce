use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    cli::run_cli(storefront_checkout_migration::Migrator).await;
}
