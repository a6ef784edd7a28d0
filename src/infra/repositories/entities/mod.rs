//! SeaORM entity definitions
//!
//! These are database-specific entities separate from domain models.

pub mod order_progress;
pub mod user;

#[allow(unused_imports)]
pub use order_progress::{
    ActiveModel as OrderActiveModel, Entity as OrderEntity, Model as OrderModel,
};
#[allow(unused_imports)]
pub use user::{ActiveModel as UserActiveModel, Entity as UserEntity, Model as UserModel};
