//! Application configuration loaded from environment variables.

use std::env;

use yatube_core::domain::DEFAULT_PAGE_SIZE;
use yatube_infra::auth::JwtConfig;
use yatube_infra::database::DatabaseConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    pub posts_per_page: u64,
    pub login_url: String,
    pub admin_usernames: Vec<String>,
    pub jwt: JwtConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database: None,
            posts_per_page: DEFAULT_PAGE_SIZE,
            login_url: "/auth/login/".to_string(),
            admin_usernames: Vec::new(),
            jwt: JwtConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let database = env::var("DATABASE_URL").ok().map(|url| {
            let mut config = DatabaseConfig::new(url);
            if let Some(max) = parse_var("DB_MAX_CONNECTIONS") {
                config.max_connections = max;
            }
            if let Some(min) = parse_var("DB_MIN_CONNECTIONS") {
                config.min_connections = min;
            }
            config
        });

        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT").unwrap_or(defaults.port),
            database,
            posts_per_page: parse_var("POSTS_PER_PAGE")
                .filter(|n: &u64| *n > 0)
                .unwrap_or(defaults.posts_per_page),
            login_url: env::var("LOGIN_URL").unwrap_or(defaults.login_url),
            admin_usernames: env::var("ADMIN_USERNAMES")
                .map(|v| parse_list(&v))
                .unwrap_or_default(),
            jwt: JwtConfig::from_env(),
        }
    }

    pub fn is_admin(&self, username: &str) -> bool {
        self.admin_usernames.iter().any(|u| u == username)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

/// Split a comma-separated list, dropping blanks.
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
