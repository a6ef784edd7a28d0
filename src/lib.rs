//! Production Tracker - order production dashboard backend
//!
//! Mirrors a Shopify order feed into a Postgres store and tracks each
//! order through design, printing, fusing, stitching and shipping.
//! Staff mark stages done, assign designers, set dispatch dates and
//! read daily, weekly and dispatch reports.
//!
//! # Architecture Layers
//!
//! - **cli**: Command-line interface
//! - **commands**: CLI command implementations
//! - **config**: Application configuration and constants
//! - **domain**: Stages, orders, roles, calendar bucketing, feed records
//! - **services**: Stage progression, reconciliation, reports, credentials
//! - **infra**: Database, order feed client, design image storage
//! - **api**: HTTP handlers, extractors and routes
//! - **types**: Response envelope
//! - **errors**: Centralized error handling
//!
//! # CLI Usage
//!
//! ```bash
//! # Start the server
//! cargo run -- serve
//!
//! # Run migrations
//! cargo run -- migrate up
//!
//! # Pull recent orders once
//! cargo run -- sync --fast
//!
//! # Provision a designer
//! cargo run -- users add meera --role design --password 's3cret-pass'
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod services;
pub mod types;

// Re-export commonly used types at crate root
pub use api::AppState;
pub use config::Config;
pub use domain::{Order, Stage, StageAdvancePolicy, StaffIdentity, User, UserRole};
pub use errors::{AppError, AppResult};
