use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_SECRET_KEY: &str = "dev";
pub const DATABASE_FILE: &str = "rapidxcel_logistics.sqlite";
pub const INSTANCE_CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum CookieSameSite {
    Strict,
    Lax,
    None,
}

impl From<CookieSameSite> for biscotti::SameSite {
    fn from(value: CookieSameSite) -> Self {
        match value {
            CookieSameSite::Strict => biscotti::SameSite::Strict,
            CookieSameSite::Lax => biscotti::SameSite::Lax,
            CookieSameSite::None => biscotti::SameSite::None,
        }
    }
}

/// Attributes of the cookie carrying the login session.
#[derive(Debug, Clone)]
pub struct SessionCookieConfig {
    pub name: String,
    pub path: String,
    pub same_site: CookieSameSite,
    pub secure: bool,
    pub http_only: bool,
    pub ttl_hours: i64,
}

impl Default for SessionCookieConfig {
    fn default() -> Self {
        Self {
            name: "session".to_string(),
            path: "/".to_string(),
            // The frontend is served from another origin.
            same_site: CookieSameSite::None,
            secure: true,
            http_only: true,
            ttl_hours: 24,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CorsResource {
    pub prefix: String,
    pub origins: Vec<String>,
}

impl CorsResource {
    pub fn allows_any_origin(&self) -> bool {
        self.origins.iter().any(|o| o == "*")
    }
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub supports_credentials: bool,
    pub resources: Vec<CorsResource>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            supports_credentials: true,
            resources: vec![
                CorsResource {
                    prefix: "/api".to_string(),
                    origins: vec!["*".to_string()],
                },
                CorsResource {
                    prefix: "/auth".to_string(),
                    origins: vec!["*".to_string()],
                },
            ],
        }
    }
}

impl CorsConfig {
    pub fn resource_for(&self, prefix: &str) -> Option<&CorsResource> {
        self.resources.iter().find(|r| r.prefix == prefix)
    }
}

/// Rates used to quote an order when the client does not supply a shipping cost.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ShippingRates {
    pub base_fee: f64,
    pub per_kg: f64,
}

impl Default for ShippingRates {
    fn default() -> Self {
        Self {
            base_fee: 5.0,
            per_kg: 1.5,
        }
    }
}

impl ShippingRates {
    pub fn quote(&self, consignment_weight: f64) -> f64 {
        let cost = self.base_fee + self.per_kg * consignment_weight;
        (cost * 100.0).round() / 100.0
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub secret_key: String,
    pub instance_path: PathBuf,
    pub database_url: String,
    pub max_connections: u32,
    pub session_cookie: SessionCookieConfig,
    pub cors: CorsConfig,
    pub shipping: ShippingRates,
    pub password_hash_cost: u32,
    pub host: String,
    pub port: u16,
    pub log_dir: PathBuf,
    database_url_explicit: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let instance_path = PathBuf::from("instance");
        Self {
            secret_key: DEFAULT_SECRET_KEY.to_string(),
            database_url: sqlite_url_for(&instance_path),
            instance_path,
            max_connections: 5,
            session_cookie: SessionCookieConfig::default(),
            cors: CorsConfig::default(),
            shipping: ShippingRates::default(),
            password_hash_cost: bcrypt::DEFAULT_COST,
            host: "0.0.0.0".to_string(),
            port: 5000,
            log_dir: PathBuf::from("logs"),
            database_url_explicit: false,
        }
    }
}

/// Partial configuration, as found in the instance file or handed in by tests.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigOverride {
    pub secret_key: Option<String>,
    pub instance_path: Option<PathBuf>,
    pub database_url: Option<String>,
    pub max_connections: Option<u32>,
    pub session_cookie: Option<SessionCookieOverride>,
    pub cors: Option<CorsOverride>,
    pub shipping: Option<ShippingRates>,
    pub password_hash_cost: Option<u32>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionCookieOverride {
    pub name: Option<String>,
    pub path: Option<String>,
    pub same_site: Option<CookieSameSite>,
    pub secure: Option<bool>,
    pub http_only: Option<bool>,
    pub ttl_hours: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsOverride {
    pub supports_credentials: Option<bool>,
    pub resources: Option<Vec<CorsResource>>,
}

impl ConfigOverride {
    pub fn from_env() -> Result<Self> {
        let port = match std::env::var("RAPIDXCEL_PORT") {
            Ok(value) => Some(value.parse().with_context(|| "parse RAPIDXCEL_PORT")?),
            Err(_) => None,
        };
        Ok(Self {
            secret_key: std::env::var("RAPIDXCEL_SECRET_KEY").ok(),
            instance_path: std::env::var("RAPIDXCEL_INSTANCE_PATH").ok().map(PathBuf::from),
            database_url: std::env::var("DATABASE_URL").ok(),
            host: std::env::var("RAPIDXCEL_HOST").ok(),
            port,
            log_dir: std::env::var("RAPIDXCEL_LOG_DIR").ok().map(PathBuf::from),
            ..Self::default()
        })
    }

    /// Reads an instance config file. A missing file is not an error.
    pub fn from_instance_file(path: &Path) -> Result<Option<Self>> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("read instance config: {}", path.display()))
            }
        };
        let parsed: Self = serde_yaml::from_str(&contents)
            .with_context(|| format!("parse instance config: {}", path.display()))?;
        Ok(Some(parsed))
    }
}

impl AppConfig {
    /// Defaults, then the environment, then either the instance config file or `test_config`.
    pub fn load(test_config: Option<ConfigOverride>) -> Result<Self> {
        let mut config = Self::default();
        config.apply(ConfigOverride::from_env()?);

        match test_config {
            None => {
                let path = config.instance_config_path();
                if let Some(instance) = ConfigOverride::from_instance_file(&path)? {
                    tracing::info!(path = %path.display(), "Loaded instance config");
                    config.apply(instance);
                }
            }
            Some(overrides) => config.apply(overrides),
        }

        Ok(config)
    }

    pub fn apply(&mut self, overrides: ConfigOverride) {
        if let Some(value) = overrides.secret_key {
            self.secret_key = value;
        }
        if let Some(value) = overrides.instance_path {
            self.instance_path = value;
        }
        if let Some(value) = overrides.database_url {
            self.database_url = value;
            self.database_url_explicit = true;
        }
        if !self.database_url_explicit {
            self.database_url = sqlite_url_for(&self.instance_path);
        }
        if let Some(value) = overrides.max_connections {
            self.max_connections = value.max(1);
        }
        if let Some(cookie) = overrides.session_cookie {
            let target = &mut self.session_cookie;
            if let Some(value) = cookie.name {
                target.name = value;
            }
            if let Some(value) = cookie.path {
                target.path = value;
            }
            if let Some(value) = cookie.same_site {
                target.same_site = value;
            }
            if let Some(value) = cookie.secure {
                target.secure = value;
            }
            if let Some(value) = cookie.http_only {
                target.http_only = value;
            }
            if let Some(value) = cookie.ttl_hours {
                target.ttl_hours = value;
            }
        }
        if let Some(cors) = overrides.cors {
            if let Some(value) = cors.supports_credentials {
                self.cors.supports_credentials = value;
            }
            if let Some(value) = cors.resources {
                self.cors.resources = value;
            }
        }
        if let Some(value) = overrides.shipping {
            self.shipping = value;
        }
        if let Some(value) = overrides.password_hash_cost {
            self.password_hash_cost = value;
        }
        if let Some(value) = overrides.host {
            self.host = value;
        }
        if let Some(value) = overrides.port {
            self.port = value;
        }
        if let Some(value) = overrides.log_dir {
            self.log_dir = value;
        }
    }

    pub fn instance_config_path(&self) -> PathBuf {
        self.instance_path.join(INSTANCE_CONFIG_FILE)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn sqlite_url_for(instance_path: &Path) -> String {
    format!("sqlite://{}", instance_path.join(DATABASE_FILE).display())
}
