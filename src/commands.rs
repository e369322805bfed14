use anyhow::{bail, Context, Result};
use tracing::info;

use crate::auth::hash_password;
use crate::config::AppConfig;
use crate::database::{init_database, seed_database, SeedReport};
use crate::models::{NewUser, Role, User};

/// Creates the instance directory and brings the schema up to date.
pub async fn init_db(config: &AppConfig) -> Result<()> {
    std::fs::create_dir_all(&config.instance_path).with_context(|| {
        format!("create instance directory {}", config.instance_path.display())
    })?;
    let pool = init_database(config).await?;
    pool.close().await;
    info!(database = %config.database_url, "Initialized the database");
    Ok(())
}

pub async fn seed(config: &AppConfig) -> Result<SeedReport> {
    std::fs::create_dir_all(&config.instance_path)?;
    let pool = init_database(config).await?;
    let report = seed_database(&pool, config.password_hash_cost).await?;
    pool.close().await;
    info!(
        users = report.users_created,
        suppliers = report.suppliers_created,
        "Seeding finished"
    );
    Ok(report)
}

pub struct CreateUserArgs {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

pub async fn create_user(config: &AppConfig, args: CreateUserArgs) -> Result<User> {
    let username = args.username.trim();
    let email = args.email.trim();
    if username.is_empty() || email.is_empty() {
        bail!("username and email are required");
    }
    if args.password.is_empty() {
        bail!("password is required");
    }

    std::fs::create_dir_all(&config.instance_path)?;
    let pool = init_database(config).await?;
    if User::exists(&pool, username, email).await? {
        pool.close().await;
        bail!("a user named {username} or with email {email} already exists");
    }

    let password_hash = hash_password(&args.password, config.password_hash_cost)?;
    let user = User::create(
        &pool,
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            role: args.role,
        },
    )
    .await?;
    pool.close().await;

    info!(user = %user.username, role = %user.role, "Created user");
    Ok(user)
}
