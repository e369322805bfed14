pub mod app;
pub mod auth;
pub mod commands;
pub mod config;
pub mod database;
pub mod logging;
pub mod models;
pub mod rbac;
pub mod rest;
pub mod server;

pub use app::{create_app, App};
pub use config::{AppConfig, ConfigOverride};
