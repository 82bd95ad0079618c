//! Configuration management for the loan service

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::time::Duration;

use crate::application::loan::{LoanPolicy, ScannerSettings};
use crate::domain::Fine;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmailConfig {
    /// false の場合はログ出力のみで送信しない
    pub enabled: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: String,
    pub smtp_from_name: Option<String>,
    pub smtp_use_tls: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoansConfig {
    pub fine_per_day: u64,
    pub notification_timeout_secs: u64,
    pub store_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScannerConfig {
    pub enabled: bool,
    pub period_secs: u64,
    pub horizon_hours: i64,
    pub notification_timeout_secs: u64,
    pub concurrency: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub loans: LoansConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default").required(false))
            // Layer on the environment-specific file
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add environment variables (e.g. LIBRARY_SCANNER__PERIOD_SECS)
            .add_source(
                Environment::with_prefix("LIBRARY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            // Override database URL from DATABASE_URL env var if present
            .set_override_option("database.url", env::var("DATABASE_URL").ok())?
            .build()?;

        config.try_deserialize()
    }
}

impl LoansConfig {
    pub fn policy(&self) -> LoanPolicy {
        LoanPolicy {
            fine_per_day: Fine::new(self.fine_per_day),
            notification_timeout: Duration::from_secs(self.notification_timeout_secs),
            store_timeout: Duration::from_secs(self.store_timeout_secs),
        }
    }
}

impl ScannerConfig {
    /// horizon_hours は1以上で、期間として表現できる値であること
    pub fn settings(&self) -> Result<ScannerSettings, ConfigError> {
        let horizon = chrono::Duration::try_hours(self.horizon_hours)
            .filter(|horizon| *horizon > chrono::Duration::zero())
            .ok_or_else(|| {
                ConfigError::Message(format!(
                    "scanner.horizon_hours must be a positive number of hours, got {}",
                    self.horizon_hours
                ))
            })?;

        Ok(ScannerSettings {
            period: Duration::from_secs(self.period_secs.max(1)),
            horizon,
            notification_timeout: Duration::from_secs(self.notification_timeout_secs),
            concurrency: self.concurrency.max(1),
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/library".to_string(),
            max_connections: 5,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: "localhost".to_string(),
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
            smtp_from: "noreply@library.local".to_string(),
            smtp_from_name: Some("Library".to_string()),
            smtp_use_tls: true,
        }
    }
}

impl Default for LoansConfig {
    fn default() -> Self {
        Self {
            fine_per_day: 5000,
            notification_timeout_secs: 10,
            store_timeout_secs: 5,
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            period_secs: 24 * 60 * 60,
            horizon_hours: 24,
            notification_timeout_secs: 10,
            concurrency: 4,
        }
    }
}
