use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

use content_feed::counter::DEFAULT_MAX_ATTEMPTS;

use crate::common::pagination::DEFAULT_PAGE_SIZE;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub default_page_size: u32,
    pub view_increment_max_attempts: u32,
    /// Empty means any origin may call the API.
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("DB_MAX_CONNECTIONS must be a valid number")?,
            default_page_size: env::var("DEFAULT_PAGE_SIZE")
                .unwrap_or_else(|_| DEFAULT_PAGE_SIZE.to_string())
                .parse()
                .context("DEFAULT_PAGE_SIZE must be a valid number")?,
            view_increment_max_attempts: env::var("VIEW_INCREMENT_MAX_ATTEMPTS")
                .unwrap_or_else(|_| DEFAULT_MAX_ATTEMPTS.to_string())
                .parse()
                .context("VIEW_INCREMENT_MAX_ATTEMPTS must be a valid number")?,
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .map(|origins| parse_origins(&origins))
                .unwrap_or_default(),
        })
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

/// Settings the request handlers need at runtime.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub default_page_size: u32,
    pub view_increment_max_attempts: u32,
    pub allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            view_increment_max_attempts: DEFAULT_MAX_ATTEMPTS,
            allowed_origins: Vec::new(),
        }
    }
}

impl From<&Config> for ServerSettings {
    fn from(config: &Config) -> Self {
        Self {
            default_page_size: config.default_page_size,
            view_increment_max_attempts: config.view_increment_max_attempts,
            allowed_origins: config.allowed_origins.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_trimmed_and_blank_entries_dropped() {
        assert_eq!(
            parse_origins(" https://a.example, ,https://b.example "),
            vec!["https://a.example", "https://b.example"]
        );
        assert!(parse_origins("").is_empty());
    }
}
