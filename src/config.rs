use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub transfer: TransferConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// PostgreSQL connection URL; when absent the in-memory store is used
    #[serde(default)]
    pub postgres_url: Option<String>,
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_db_acquire_timeout_secs() -> u64 {
    5
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

/// Transfer engine limits (per-request bounds; the daily limit lives on the wallet)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TransferConfig {
    pub min_amount: Decimal,
    pub max_amount: Decimal,
    /// Default daily limit stamped on wallets at provisioning
    pub default_daily_limit: Decimal,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            min_amount: Decimal::new(1, 2),
            max_amount: Decimal::from(100_000),
            default_daily_limit: Decimal::from(10_000),
        }
    }
}

/// Recurring transfer worker cadence
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SchedulerConfig {
    pub enabled: bool,
    pub interval_secs: u64,
    pub batch_size: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 3600,
            batch_size: 100,
        }
    }
}

impl AppConfig {
    /// Load configuration for the given environment (`config/{env}.yaml`).
    ///
    /// Falls back to defaults when the file is missing so tests and local
    /// runs work without a config tree. `WALLETD_POSTGRES_URL` overrides
    /// the file value.
    pub fn load(env: &str) -> Self {
        let path = format!("config/{}.yaml", env);
        let mut config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Failed to parse {}: {}. Using defaults.", path, e);
                    Self::default()
                }
            },
            Err(_) => {
                eprintln!("Config file {} not found. Using defaults.", path);
                Self::default()
            }
        };

        if let Ok(url) = std::env::var("WALLETD_POSTGRES_URL") {
            config.postgres_url = Some(url);
        }

        config
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: "./logs".to_string(),
            log_file: "walletd.log".to_string(),
            use_json: false,
            rotation: "daily".to_string(),
            gateway: GatewayConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            transfer: TransferConfig::default(),
            scheduler: SchedulerConfig::default(),
            postgres_url: None,
            db_max_connections: default_db_max_connections(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_transfer_limits() {
        let config = TransferConfig::default();
        assert!(config.min_amount > Decimal::ZERO);
        assert!(config.max_amount > config.min_amount);
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
log_level: debug
log_dir: ./logs
log_file: walletd.log
use_json: true
rotation: hourly
gateway:
  host: 0.0.0.0
  port: 9090
transfer:
  min_amount: "1.00"
  max_amount: "50000"
  default_daily_limit: "5000"
scheduler:
  enabled: false
  interval_secs: 60
  batch_size: 10
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.gateway.port, 9090);
        assert_eq!(config.transfer.min_amount, Decimal::from(1));
        assert!(!config.scheduler.enabled);
        assert!(config.postgres_url.is_none());
        // Unlisted pool settings fall back to their defaults
        assert_eq!(config.db_max_connections, 10);
        assert_eq!(config.db_acquire_timeout_secs, 5);
    }
}
