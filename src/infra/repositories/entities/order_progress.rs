//! Order progress database entity for SeaORM.

use sea_orm::entity::prelude::*;

use crate::domain::{Order, Stage, StageFlags};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "order_progress")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub order_id: String,
    pub order_name: String,
    pub customer_name: String,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total_price: Decimal,
    pub fulfillment_status: String,
    pub payment_status: String,
    pub shipping_method: String,
    pub item_count: i32,
    pub tags: String,
    pub address: String,
    pub design_assignee: Option<String>,
    pub dispatch_date: Option<Date>,
    pub design_image: Option<String>,
    pub design_done: bool,
    pub printing_done: bool,
    pub fusing_done: bool,
    pub stitching_done: bool,
    pub shipping_done: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Completion-flag column for a stage.
///
/// Closed mapping: the column is never derived from request text.
pub fn done_column(stage: Stage) -> Column {
    match stage {
        Stage::Design => Column::DesignDone,
        Stage::Printing => Column::PrintingDone,
        Stage::Fusing => Column::FusingDone,
        Stage::Stitching => Column::StitchingDone,
        Stage::Shipping => Column::ShippingDone,
    }
}

/// Convert database model to domain entity
impl From<Model> for Order {
    fn from(model: Model) -> Self {
        Order {
            order_id: model.order_id,
            order_name: model.order_name,
            customer_name: model.customer_name,
            total_price: model.total_price,
            fulfillment_status: model.fulfillment_status,
            payment_status: model.payment_status,
            shipping_method: model.shipping_method,
            item_count: model.item_count,
            tags: model.tags,
            address: model.address,
            design_assignee: model.design_assignee,
            dispatch_date: model.dispatch_date,
            design_image: model.design_image,
            stages: StageFlags {
                design_done: model.design_done,
                printing_done: model.printing_done,
                fusing_done: model.fusing_done,
                stitching_done: model.stitching_done,
                shipping_done: model.shipping_done,
            },
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Fresh row for insertion
impl From<Order> for ActiveModel {
    fn from(order: Order) -> Self {
        use sea_orm::Set;

        ActiveModel {
            order_id: Set(order.order_id),
            order_name: Set(order.order_name),
            customer_name: Set(order.customer_name),
            total_price: Set(order.total_price),
            fulfillment_status: Set(order.fulfillment_status),
            payment_status: Set(order.payment_status),
            shipping_method: Set(order.shipping_method),
            item_count: Set(order.item_count),
            tags: Set(order.tags),
            address: Set(order.address),
            design_assignee: Set(order.design_assignee),
            dispatch_date: Set(order.dispatch_date),
            design_image: Set(order.design_image),
            design_done: Set(order.stages.design_done),
            printing_done: Set(order.stages.printing_done),
            fusing_done: Set(order.stages.fusing_done),
            stitching_done: Set(order.stages.stitching_done),
            shipping_done: Set(order.stages.shipping_done),
            created_at: Set(order.created_at),
            updated_at: Set(order.updated_at),
        }
    }
}
