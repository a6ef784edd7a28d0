//! Users command - Staff provisioning outside the HTTP surface.

use crate::cli::args::{UsersAction, UsersArgs};
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::Database;
use crate::services::{ServiceContainer, Services};

/// Execute the users command
pub async fn execute(args: UsersArgs, config: Config) -> AppResult<()> {
    let db = Database::connect(&config)
        .await
        .map_err(|e| AppError::internal(format!("Database connection failed: {}", e)))?;
    let users = Services::from_connection(db.get_connection(), &config)?.users();

    match args.action {
        UsersAction::Add {
            username,
            role,
            password,
        } => {
            let user = users.create_user(&username, &password, &role).await?;
            println!("created {} ({})", user.username, user.role);
        }
        UsersAction::List => {
            for user in users.list_users().await? {
                println!("{:<24} {:<10} {}", user.username, user.role, user.created_at.to_rfc3339());
            }
        }
    }

    Ok(())
}
