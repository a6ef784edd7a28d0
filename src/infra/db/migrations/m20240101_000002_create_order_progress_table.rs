//! Migration: Create order_progress table.

use sea_orm_migration::prelude::*;

use crate::config::PRICE_SCALE;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OrderProgress::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrderProgress::OrderId)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OrderProgress::OrderName).string_len(64).not_null())
                    .col(
                        ColumnDef::new(OrderProgress::CustomerName)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(OrderProgress::TotalPrice)
                            .decimal_len(12, PRICE_SCALE)
                            .not_null()
                            .default(0),
                    )
                    .col(text_col(OrderProgress::FulfillmentStatus))
                    .col(text_col(OrderProgress::PaymentStatus))
                    .col(text_col(OrderProgress::ShippingMethod))
                    .col(
                        ColumnDef::new(OrderProgress::ItemCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(text_col(OrderProgress::Tags))
                    .col(text_col(OrderProgress::Address))
                    .col(ColumnDef::new(OrderProgress::DesignAssignee).string_len(64).null())
                    .col(ColumnDef::new(OrderProgress::DispatchDate).date().null())
                    .col(ColumnDef::new(OrderProgress::DesignImage).string().null())
                    .col(flag_col(OrderProgress::DesignDone))
                    .col(flag_col(OrderProgress::PrintingDone))
                    .col(flag_col(OrderProgress::FusingDone))
                    .col(flag_col(OrderProgress::StitchingDone))
                    .col(flag_col(OrderProgress::ShippingDone))
                    .col(
                        ColumnDef::new(OrderProgress::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrderProgress::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        for (name, column) in [
            ("idx_order_progress_order_name", OrderProgress::OrderName),
            ("idx_order_progress_updated_at", OrderProgress::UpdatedAt),
            ("idx_order_progress_created_at", OrderProgress::CreatedAt),
            ("idx_order_progress_dispatch_date", OrderProgress::DispatchDate),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(OrderProgress::Table)
                        .col(column)
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OrderProgress::Table).to_owned())
            .await
    }
}

fn text_col(column: OrderProgress) -> ColumnDef {
    ColumnDef::new(column).text().not_null().default("").to_owned()
}

fn flag_col(column: OrderProgress) -> ColumnDef {
    ColumnDef::new(column)
        .boolean()
        .not_null()
        .default(false)
        .to_owned()
}

#[derive(Iden)]
enum OrderProgress {
    Table,
    OrderId,
    OrderName,
    CustomerName,
    TotalPrice,
    FulfillmentStatus,
    PaymentStatus,
    ShippingMethod,
    ItemCount,
    Tags,
    Address,
    DesignAssignee,
    DispatchDate,
    DesignImage,
    DesignDone,
    PrintingDone,
    FusingDone,
    StitchingDone,
    ShippingDone,
    CreatedAt,
    UpdatedAt,
}
