use std::str::FromStr;
use std::sync::Arc;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use crate::auth::hash_password;
use crate::config::AppConfig;
use crate::models::{CreateSupplierRequest, DatabaseError, NewUser, Role, Supplier, User};

/// Opens (creating if needed) the SQLite database and brings its schema up to date.
pub async fn init_database(config: &AppConfig) -> Result<Arc<SqlitePool>, DatabaseError> {
    let options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await?;

    info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations completed successfully");

    Ok(Arc::new(pool))
}

/// Default accounts created by `seed`, as (username, email, password, role).
pub const SEED_ACCOUNTS: &[(&str, &str, &str, Role)] = &[
    ("admin", "admin@rapidxcel.local", "admin", Role::Admin),
    ("courier", "courier@rapidxcel.local", "courier123", Role::Courier),
    ("customer", "customer@rapidxcel.local", "customer123", Role::Customer),
    ("supplier", "supplier@rapidxcel.local", "supplier123", Role::Supplier),
];

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users_created: usize,
    pub suppliers_created: usize,
}

// Only seeds when the users table is empty
pub async fn seed_database(pool: &SqlitePool, hash_cost: u32) -> anyhow::Result<SeedReport> {
    let mut report = SeedReport::default();

    if User::count(pool).await? > 0 {
        info!("Users already exist, skipping seeding");
        return Ok(report);
    }

    info!("Users table is empty, starting seeding...");

    for (username, email, password, role) in SEED_ACCOUNTS {
        let password_hash = hash_password(password, hash_cost)?;
        User::create(
            pool,
            NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
                role: *role,
            },
        )
        .await?;
        report.users_created += 1;
        info!("Seeded {role} account (user: {username})");
    }

    if Supplier::find_by_name(pool, "RapidXcel Warehouse").await?.is_none() {
        Supplier::create(
            pool,
            &CreateSupplierRequest {
                name: "RapidXcel Warehouse".to_string(),
                contact_email: Some("warehouse@rapidxcel.local".to_string()),
                phone: None,
                address: None,
            },
        )
        .await?;
        report.suppliers_created += 1;
    }

    Ok(report)
}
