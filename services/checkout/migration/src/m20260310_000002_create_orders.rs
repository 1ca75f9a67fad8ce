use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Orders::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Orders::CheckoutJobId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Orders::OrderNumber).string().not_null())
                    .col(ColumnDef::new(Orders::UserId).uuid().not_null())
                    .col(ColumnDef::new(Orders::BuyerEmail).string())
                    .col(ColumnDef::new(Orders::Items).json_binary().not_null())
                    .col(ColumnDef::new(Orders::ShippingAddress).json_binary().not_null())
                    .col(ColumnDef::new(Orders::PaymentMethod).string().not_null())
                    .col(ColumnDef::new(Orders::ItemsPrice).double().not_null())
                    .col(ColumnDef::new(Orders::TaxPrice).double().not_null())
                    .col(ColumnDef::new(Orders::ShippingPrice).double().not_null())
                    .col(ColumnDef::new(Orders::TotalPrice).double().not_null())
                    .col(
                        ColumnDef::new(Orders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(Orders::Table)
                    .col(Orders::UserId)
                    .col(Orders::CreatedAt)
                    .name("idx_orders_user_id_created_at")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Orders {
    Table,
    Id,
    CheckoutJobId,
    OrderNumber,
    UserId,
    BuyerEmail,
    Items,
    ShippingAddress,
    PaymentMethod,
    ItemsPrice,
    TaxPrice,
    ShippingPrice,
    TotalPrice,
    CreatedAt,
}
