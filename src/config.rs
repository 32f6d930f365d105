// src/config.rs

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::models::{OptionalField, OrgColumns};

/// Переменная окружения с мастер-ключом снимка
pub const MASTER_KEY_ENV: &str = "EMPLOYEES_MASTER_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    #[serde(default = "default_org_columns")]
    pub org_columns: OrgColumns,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            rate_limit: RateLimitConfig::default(),
            org_columns: default_org_columns(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_org_columns() -> OrgColumns {
    OrgColumns::new()
        .with_org(
            "org-1",
            [
                OptionalField::Department,
                OptionalField::Position,
                OptionalField::Location,
            ],
        )
        .with_org("org-2", [OptionalField::Department, OptionalField::Location])
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_max_request_size")]
    pub max_request_size: usize,
    /// Брать адрес клиента из X-Forwarded-For (только за доверенным прокси)
    #[serde(default)]
    pub trust_forwarded_for: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            max_request_size: default_max_request_size(),
            trust_forwarded_for: false,
        }
    }
}

fn default_address() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_max_request_size() -> usize {
    10 * 1024 * 1024 // 10 MB
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RateLimitConfig {
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    #[serde(default = "default_max_keys")]
    pub max_keys: usize,
    #[serde(default = "default_sweep_interval_seconds")]
    pub sweep_interval_seconds: u64,
    #[serde(default = "default_grace_seconds")]
    pub grace_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_seconds: default_window_seconds(),
            max_requests: default_max_requests(),
            max_keys: default_max_keys(),
            sweep_interval_seconds: default_sweep_interval_seconds(),
            grace_seconds: default_grace_seconds(),
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds)
    }

    pub fn grace(&self) -> Duration {
        Duration::from_secs(self.grace_seconds)
    }
}

fn default_window_seconds() -> u64 { 60 }
fn default_max_requests() -> u32 { 60 }
fn default_max_keys() -> usize { 10_000 }
fn default_sweep_interval_seconds() -> u64 { 60 }
fn default_grace_seconds() -> u64 { 60 }

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct StorageConfig {
    /// Путь к зашифрованному снимку; без него данные живут только в памяти
    pub snapshot_path: Option<String>,
    pub master_key_hex: Option<String>,
    #[serde(default = "default_seed_demo_data")]
    pub seed_demo_data: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            snapshot_path: None,
            master_key_hex: None,
            seed_demo_data: default_seed_demo_data(),
        }
    }
}

impl StorageConfig {
    /// Ключ из конфига, иначе из окружения
    pub fn master_key_hex(&self) -> Option<String> {
        self.master_key_hex
            .clone()
            .or_else(|| std::env::var(MASTER_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty())
    }
}

fn default_seed_demo_data() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Загрузить конфиг; без файла берём значения по умолчанию
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yaml::from_str(content)?;
        config.org_columns = config.org_columns.normalized();
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_yaml::to_string(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.rate_limit.window_seconds == 0 {
            return Err(ConfigError::Invalid(
                "rate_limit.window_seconds must be positive".to_string(),
            ));
        }
        if self.rate_limit.sweep_interval_seconds == 0 {
            return Err(ConfigError::Invalid(
                "rate_limit.sweep_interval_seconds must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
