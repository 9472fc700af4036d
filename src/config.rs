use std::collections::HashSet;

use crate::models::ContentKind;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_maxage: i64,
    pub port: u16,
    pub cors_origins: String,
    pub admin_email: String,
    pub admin_initial_password: String,
    /// Kinds whose repeated approval re-stamps `publishedAt`.
    pub reapprove_restamps: HashSet<ContentKind>,
}

const SEVEN_DAYS: i64 = 7 * 24 * 60 * 60;

impl Default for Config {
    fn default() -> Self {
        Config {
            database_url: None,
            jwt_secret: "portal-test-secret".to_string(),
            jwt_maxage: SEVEN_DAYS,
            port: 8000,
            cors_origins: "*".to_string(),
            admin_email: "admin@portal.local".to_string(),
            admin_initial_password: "ChangeMe@2025".to_string(),
            reapprove_restamps: HashSet::new(),
        }
    }
}

impl Config {
    pub fn init() -> Config {
        let jwt_secret = std::env::var("JWT_SECRET_KEY").expect("JWT_SECRET_KEY must be set");
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());
        let jwt_maxage = std::env::var("JWT_MAXAGE")
            .ok()
            .map(|v| v.parse::<i64>().expect("JWT_MAXAGE must be a number of seconds"))
            .unwrap_or(SEVEN_DAYS);
        let port = std::env::var("PORT")
            .ok()
            .map(|v| v.parse::<u16>().expect("PORT must be a valid port"))
            .unwrap_or(8000);
        let cors_origins = std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let admin_email =
            std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@portal.local".to_string());
        let admin_initial_password = std::env::var("ADMIN_INITIAL_PASSWORD")
            .unwrap_or_else(|_| "ChangeMe@2025".to_string());
        let reapprove_restamps = std::env::var("REAPPROVE_REFRESHES_TIMESTAMP")
            .map(|v| parse_kind_list(&v))
            .unwrap_or_default();

        Config {
            database_url,
            jwt_secret,
            jwt_maxage,
            port,
            cors_origins,
            admin_email: admin_email.trim().to_lowercase(),
            admin_initial_password,
            reapprove_restamps,
        }
    }
}

/// Parse `news, business` style lists. Unknown names are logged and skipped.
pub fn parse_kind_list(raw: &str) -> HashSet<ContentKind> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|name| match name.parse::<ContentKind>() {
            Ok(kind) => Some(kind),
            Err(e) => {
                tracing::warn!("Ignoring REAPPROVE_REFRESHES_TIMESTAMP entry: {}", e);
                None
            }
        })
        .collect()
}
