//! CLI handlers for `studyplan user` subcommands.
//!
//! Accounts are provisioned here; the HTTP API only verifies tokens issued
//! by `studyplan user token`.

use anyhow::{Result, bail};
use sqlx::PgPool;
use uuid::Uuid;

use studyplan_core::store::{AccessControl, PgStore, Role};
use studyplan_core::token::issue_token;
use studyplan_db::queries::profiles;

use crate::UserCommands;
use crate::config::AppConfig;

/// Look up a user id by email.
pub async fn resolve_user(pool: &PgPool, email: &str) -> Result<Uuid> {
    match profiles::get_profile_by_email(pool, email).await? {
        Some(profile) => Ok(profile.user_id),
        None => bail!("no user with email {email:?}; create one with `studyplan user add`"),
    }
}

pub async fn run_user_command(
    command: UserCommands,
    pool: &PgPool,
    config: &AppConfig,
) -> Result<()> {
    match command {
        UserCommands::Add { email, name, admin } => {
            let role = if admin { Role::Admin } else { Role::User };
            let profile = profiles::insert_profile(pool, &email, &name, role).await?;
            println!("User created: {}", profile.user_id);
            println!("  email: {}", profile.email);
            println!("  role:  {role}");
            Ok(())
        }
        UserCommands::List => cmd_list(pool).await,
        UserCommands::Promote { email } => cmd_set_role(pool, &email, Role::Admin).await,
        UserCommands::Demote { email } => cmd_set_role(pool, &email, Role::User).await,
        UserCommands::Token { email } => {
            let tokens = config.require_token_config()?;
            let user_id = resolve_user(pool, &email).await?;
            println!("{}", issue_token(tokens, user_id));
            Ok(())
        }
    }
}

async fn cmd_list(pool: &PgPool) -> Result<()> {
    let store = PgStore::new(pool.clone());
    let users = store.list_users().await?;
    if users.is_empty() {
        println!("No users.");
        return Ok(());
    }

    println!("{:<36}  {:<5}  {:<30}  NAME", "ID", "ROLE", "EMAIL");
    for user in &users {
        println!(
            "{:<36}  {:<5}  {:<30}  {}",
            user.user_id, user.role, user.email, user.full_name
        );
    }
    Ok(())
}

async fn cmd_set_role(pool: &PgPool, email: &str, role: Role) -> Result<()> {
    let user_id = resolve_user(pool, email).await?;
    let store = PgStore::new(pool.clone());
    store.set_role(user_id, role).await?;
    match role {
        Role::Admin => println!("Назначен администратором: {email}"),
        Role::User => println!("Роль администратора снята: {email}"),
    }
    Ok(())
}
