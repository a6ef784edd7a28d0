//! Domain layer - Core business entities and logic
//!
//! Order progression rules, staff roles, calendar bucketing and feed
//! normalization. Nothing here talks to the database or the network.

pub mod calendar;
pub mod feed;
pub mod order;
pub mod password;
pub mod stage;
pub mod user;

pub use calendar::{Clock, FixedClock, LocalCalendar, SystemClock, WindowDirection};
pub use feed::ExternalOrder;
pub use order::{FeedFields, FeedOrder, Order, OrderKey};
pub use password::Password;
pub use stage::{Stage, StageAdvancePolicy, StageFlags};
pub use user::{StaffIdentity, User, UserRole};
