use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ProductVariants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProductVariants::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ProductVariants::ProductId).uuid().not_null())
                    .col(ColumnDef::new(ProductVariants::Size).string().not_null())
                    .col(ColumnDef::new(ProductVariants::ColorName).string().not_null())
                    .col(
                        ColumnDef::new(ProductVariants::Stock)
                            .integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(ProductVariants::Stock).gte(0)),
                    )
                    .to_owned(),
            )
            .await?;

        // One row per (product, size, color); also serves the batch stock read.
        manager
            .create_index(
                Index::create()
                    .table(ProductVariants::Table)
                    .col(ProductVariants::ProductId)
                    .col(ProductVariants::Size)
                    .col(ProductVariants::ColorName)
                    .unique()
                    .name("uq_product_variants_product_size_color")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProductVariants::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ProductVariants {
    Table,
    Id,
    ProductId,
    Size,
    ColorName,
    Stock,
}
