//! Application configuration from file and environment variables
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Environment variables (prefixed with LITEFORUM_, sections split by `__`)
//! 2. Config file (config.toml)
//! 3. Default values
//!
//! Secrets like the cookie signing key belong in environment variables, not
//! in the config file.

use config::{Config, ConfigError, Environment, File};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// Global application configuration
pub static APP_CONFIG: Lazy<RwLock<AppConfig>> = Lazy::new(|| {
    RwLock::new(AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config file, using defaults: {}", e);
        AppConfig::default()
    }))
});

/// Site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub name: String,
    pub description: String,
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "LiteForum".to_string(),
            description: "A simple discussion board".to_string(),
            base_url: "http://localhost:8080".to_string(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// sea-orm connection string. `DATABASE_URL` wins when set.
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://forum.sqlite?mode=rwc".to_string(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Registration CAPTCHA configuration
///
/// A plain question with a list of accepted answers. Answers are compared
/// case-insensitively after trimming.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptchaConfig {
    /// Empty disables the CAPTCHA.
    pub question: String,
    pub answers: Vec<String>,
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            question: "What is five plus three?".to_string(),
            answers: vec!["8".to_string(), "eight".to_string()],
        }
    }
}

/// Security configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Send the session cookie over HTTPS only.
    pub cookie_secure: bool,
    /// Users seen within this many seconds count as online.
    pub active_window_seconds: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            cookie_secure: false,
            active_window_seconds: 300,
        }
    }
}

/// Content limits configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum post body length in characters
    pub max_post_length: u32,
    /// Maximum topic and message title length in characters
    pub max_title_length: u32,
    /// Maximum number of search results
    pub search_results: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_post_length: crate::constants::MAX_POST_LENGTH as u32,
            max_title_length: crate::constants::MAX_TITLE_LENGTH as u32,
            search_results: 50,
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub site: SiteConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub captcha: CaptchaConfig,
    pub security: SecurityConfig,
    pub limits: LimitsConfig,
}

impl AppConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &str) -> Result<Self, ConfigError> {
        use config::FileFormat;

        let config = Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(File::new(path, FileFormat::Toml).required(false))
            // e.g., LITEFORUM_SITE__NAME, LITEFORUM_LIMITS__MAX_POST_LENGTH
            .add_source(
                Environment::with_prefix("LITEFORUM")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Reload configuration from file
    pub fn reload() -> Result<(), ConfigError> {
        let new_config = Self::load()?;
        if let Ok(mut config) = APP_CONFIG.write() {
            *config = new_config;
            log::info!("Configuration reloaded");
        }
        Ok(())
    }
}

/// Initialize application configuration
///
/// Triggers the lazy load and logs the result. Call early in start-up.
pub fn init() {
    let name = site().name;
    log::info!("Configuration loaded: site.name = {}", name);
}

/// Get the current application configuration
pub fn get_config() -> AppConfig {
    APP_CONFIG.read().map(|c| c.clone()).unwrap_or_default()
}

pub fn site() -> SiteConfig {
    get_config().site
}

pub fn database() -> DatabaseConfig {
    get_config().database
}

pub fn server() -> ServerConfig {
    get_config().server
}

pub fn captcha() -> CaptchaConfig {
    get_config().captcha
}

pub fn security() -> SecurityConfig {
    get_config().security
}

pub fn limits() -> LimitsConfig {
    get_config().limits
}
