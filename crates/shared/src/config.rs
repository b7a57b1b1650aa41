//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Withholding-tax rules supplied by the regulatory domain.
    #[serde(default)]
    pub tax: TaxConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

/// Which repository implementation backs the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local maps; data is lost on restart.
    #[default]
    Memory,
    /// PostgreSQL through SeaORM.
    Postgres,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Storage backend selection.
    #[serde(default)]
    pub backend: StorageBackend,
    /// Database connection URL (required for the postgres backend).
    #[serde(default)]
    pub url: Option<String>,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            url: None,
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
        }
    }
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    3600 // 1 hour
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output for development.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "kosh=debug,tower_http=debug".to_string()
}

/// Withholding-tax configuration.
///
/// Section codes, the transaction-type mapping and identifier patterns are
/// regulatory data, so they live in configuration rather than in code.
#[derive(Debug, Clone, Deserialize)]
pub struct TaxConfig {
    /// Regex a PAN must match (after upper-casing).
    #[serde(default = "default_pan_pattern")]
    pub pan_pattern: String,
    /// Regex a TAN must match (after upper-casing).
    #[serde(default = "default_tan_pattern")]
    pub tan_pattern: String,
    /// Look-ahead window for alerts, in days.
    #[serde(default = "default_alert_horizon_days")]
    pub alert_horizon_days: u32,
    /// The deducting/collecting company, printed on filings.
    #[serde(default)]
    pub deductor: DeductorConfig,
    /// Known sections.
    #[serde(default)]
    pub sections: Vec<SectionConfig>,
    /// Transaction type to section mapping.
    #[serde(default)]
    pub transaction_types: Vec<TransactionTypeConfig>,
}

impl Default for TaxConfig {
    fn default() -> Self {
        Self {
            pan_pattern: default_pan_pattern(),
            tan_pattern: default_tan_pattern(),
            alert_horizon_days: default_alert_horizon_days(),
            deductor: DeductorConfig::default(),
            sections: Vec::new(),
            transaction_types: Vec::new(),
        }
    }
}

fn default_pan_pattern() -> String {
    "^[A-Z]{5}[0-9]{4}[A-Z]$".to_string()
}

fn default_tan_pattern() -> String {
    "^[A-Z]{4}[0-9]{5}[A-Z]$".to_string()
}

fn default_alert_horizon_days() -> u32 {
    15
}

/// Deductor (or collector) identity used in filing headers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeductorConfig {
    /// Legal name.
    #[serde(default)]
    pub name: String,
    /// Tax Deduction Account Number.
    #[serde(default)]
    pub tan: String,
    /// Permanent Account Number.
    #[serde(default)]
    pub pan: String,
    /// Registered address.
    #[serde(default)]
    pub address: String,
    /// Person responsible for deduction.
    #[serde(default)]
    pub responsible_person: String,
}

/// A section known to the engine.
#[derive(Debug, Clone, Deserialize)]
pub struct SectionConfig {
    /// Section code, e.g. "194C".
    pub code: String,
    /// "tds" or "tcs".
    pub kind: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
}

/// Maps a transaction type onto a section.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionTypeConfig {
    /// Transaction type key used by clients, e.g. "contractor_payment".
    pub name: String,
    /// Section code the type resolves to.
    pub section: String,
    /// Nature of payment/sale label used for rate lookup.
    #[serde(default)]
    pub nature: Option<String>,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("KOSH").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("KOSH__JWT__SECRET", Some("env-secret")),
                ("KOSH__DATABASE__BACKEND", Some("postgres")),
                ("KOSH__DATABASE__URL", Some("postgres://localhost/kosh")),
                ("RUN_MODE", Some("kosh-config-test")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.jwt.secret, "env-secret");
                assert_eq!(config.database.backend, StorageBackend::Postgres);
                assert_eq!(
                    config.database.url.as_deref(),
                    Some("postgres://localhost/kosh")
                );
            },
        );
    }

    #[test]
    fn test_missing_secret_fails() {
        temp_env::with_vars(
            [
                ("KOSH__JWT__SECRET", None::<&str>),
                ("RUN_MODE", Some("kosh-config-test")),
            ],
            || {
                assert!(AppConfig::load().is_err());
            },
        );
    }

    #[test]
    fn test_tax_defaults() {
        let tax = TaxConfig::default();
        assert_eq!(tax.pan_pattern, "^[A-Z]{5}[0-9]{4}[A-Z]$");
        assert_eq!(tax.tan_pattern, "^[A-Z]{4}[0-9]{5}[A-Z]$");
        assert_eq!(tax.alert_horizon_days, 15);
        assert!(tax.sections.is_empty());
    }
}
