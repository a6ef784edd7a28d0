//! HTTP request handlers.

pub mod auth_handler;
pub mod order_handler;
pub mod report_handler;
pub mod sync_handler;

pub use auth_handler::auth_routes;
pub use order_handler::order_routes;
pub use report_handler::report_routes;
pub use sync_handler::sync_routes;
