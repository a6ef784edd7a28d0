//! Application services layer - Use cases and business logic.
//!
//! Services orchestrate domain logic and infrastructure to fulfill
//! application use cases. They depend on abstractions (traits) for
//! dependency inversion and reach the store through a Unit of Work.

mod auth_service;
pub mod container;
mod order_service;
mod report_service;
mod sync_service;
mod user_service;

// Service Container
pub use container::{ServiceContainer, Services};

// Service traits and implementations
pub use auth_service::{AuthService, Authenticator};
pub use order_service::{OrderManager, OrderService};
pub use report_service::{
    DispatchDay, DispatchSchedule, PendingSummary, ReportManager, ReportService, StageCounts,
    UserPending, WeeklyDay, WeeklySummary,
};
pub use sync_service::{SyncManager, SyncMode, SyncReport, SyncService};
pub use user_service::{UserManager, UserService};
