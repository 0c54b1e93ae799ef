//! Application configuration management

use std::env;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// SQLite database URL (e.g. `sqlite://./data/bookery.db`)
    pub database_url: String,

    /// JWT signing secret. Optional at startup: the login mutation fails
    /// with a configuration error when it is missing, everything else works.
    pub jwt_secret: Option<String>,

    /// Deployment environment name ("development", "test", "production").
    /// The clearCollections mutation is refused in production.
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/bookery.db?mode=rwc".to_string());

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .context("Invalid PORT")?,

            database_url,

            jwt_secret: env::var("JWT_SECRET").ok(),

            environment: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        })
    }

    /// True when running in a production environment
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
