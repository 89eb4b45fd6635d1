//! # Configuration State
//!
//! Stores register configuration loaded at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`TALLY_*`)
//! 2. Config file (`TALLY_CONFIG`, or `tally.toml` in the platform config dir)
//! 3. Defaults (this file)
//!
//! The tax rate has one more layer on top: once an operator sets it, the
//! value persisted in the local store wins over all of the above
//! (see `state::settings`).
//!
//! ## Thread Safety
//! Configuration is read-only after initialization, so no mutex needed.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tally_core::{
    ScannerConfig, TaxRate, IDLE_TIMEOUT_MS, INTER_KEY_THRESHOLD_MS, MIN_CODE_LENGTH,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::upstream::BackOfficeConfig;

/// Config file name inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "tally.toml";

/// Errors while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Register configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigState {
    /// Store name (displayed on receipts)
    pub store_name: String,

    /// Currency code (ISO 4217)
    pub currency_code: String,

    /// Currency symbol (for display)
    pub currency_symbol: String,

    /// Number of decimal places for currency
    pub currency_decimals: u8,

    /// Default tax rate in basis points
    /// e.g., 750 = 7.5%
    pub default_tax_rate_bps: u32,

    /// Back office base URL
    pub back_office_url: String,

    /// Back office request timeout in seconds
    pub request_timeout_secs: u64,

    /// Local store file. `None` means the platform data directory.
    pub database_path: Option<PathBuf>,

    pub scanner: ScannerSettings,
}

/// Scanner timing and device settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScannerSettings {
    pub inter_key_threshold_ms: u64,
    pub idle_timeout_ms: u64,
    pub min_code_length: usize,
    /// Serial or HID device that streams scanner bytes.
    pub device_path: Option<PathBuf>,
}

impl Default for ScannerSettings {
    fn default() -> Self {
        ScannerSettings {
            inter_key_threshold_ms: INTER_KEY_THRESHOLD_MS,
            idle_timeout_ms: IDLE_TIMEOUT_MS,
            min_code_length: MIN_CODE_LENGTH,
            device_path: None,
        }
    }
}

impl ScannerSettings {
    /// Classifier configuration for these settings.
    pub fn classifier_config(&self) -> ScannerConfig {
        ScannerConfig {
            inter_key_threshold: Duration::from_millis(self.inter_key_threshold_ms),
            idle_timeout: Duration::from_millis(self.idle_timeout_ms),
            min_code_length: self.min_code_length,
        }
    }
}

impl Default for ConfigState {
    /// Returns default configuration suitable for development.
    ///
    /// ## Default Values
    /// - Store: "Tally POS Dev Store"
    /// - Currency: USD ($)
    /// - Tax: 7.5%
    /// - Back office: http://localhost:8080
    fn default() -> Self {
        ConfigState {
            store_name: "Tally POS Dev Store".to_string(),
            currency_code: "USD".to_string(),
            currency_symbol: "$".to_string(),
            currency_decimals: 2,
            default_tax_rate_bps: 750, // 7.5%
            back_office_url: "http://localhost:8080".to_string(),
            request_timeout_secs: 10,
            database_path: None,
            scanner: ScannerSettings::default(),
        }
    }
}

/// Shape of `tally.toml`. Every key is optional.
///
/// ```toml
/// store_name = "Corner Shop"
/// tax_rate = 7.5
/// back_office_url = "http://backoffice.lan:8080"
///
/// [scanner]
/// inter_key_threshold_ms = 40
/// device_path = "/dev/ttyACM0"
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    store_name: Option<String>,
    currency_code: Option<String>,
    currency_symbol: Option<String>,
    currency_decimals: Option<u8>,
    /// Percent, as an operator writes it.
    tax_rate: Option<f64>,
    back_office_url: Option<String>,
    request_timeout_secs: Option<u64>,
    database_path: Option<PathBuf>,
    scanner: ScannerFile,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ScannerFile {
    inter_key_threshold_ms: Option<u64>,
    idle_timeout_ms: Option<u64>,
    min_code_length: Option<usize>,
    device_path: Option<PathBuf>,
}

impl ConfigState {
    /// Loads configuration from defaults, the config file and the environment.
    ///
    /// A missing config file is fine; an unreadable or malformed one is an
    /// error so a typo does not silently fall back to defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = ConfigState::default();

        if let Some(path) = config_file_path() {
            if path.exists() {
                config.apply_file(&path)?;
                info!(path = %path.display(), "Loaded config file");
            } else {
                debug!(path = %path.display(), "No config file, using defaults");
            }
        }

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Overlays the keys present in a TOML file.
    pub fn apply_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ConfigFile = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(v) = file.store_name {
            self.store_name = v;
        }
        if let Some(v) = file.currency_code {
            self.currency_code = v;
        }
        if let Some(v) = file.currency_symbol {
            self.currency_symbol = v;
        }
        if let Some(v) = file.currency_decimals {
            self.currency_decimals = v;
        }
        if let Some(v) = file.tax_rate {
            self.default_tax_rate_bps = TaxRate::from_percentage(v).bps();
        }
        if let Some(v) = file.back_office_url {
            self.back_office_url = v;
        }
        if let Some(v) = file.request_timeout_secs {
            self.request_timeout_secs = v;
        }
        if let Some(v) = file.database_path {
            self.database_path = Some(v);
        }

        let scanner = file.scanner;
        if let Some(v) = scanner.inter_key_threshold_ms {
            self.scanner.inter_key_threshold_ms = v;
        }
        if let Some(v) = scanner.idle_timeout_ms {
            self.scanner.idle_timeout_ms = v;
        }
        if let Some(v) = scanner.min_code_length {
            self.scanner.min_code_length = v;
        }
        if let Some(v) = scanner.device_path {
            self.scanner.device_path = Some(v);
        }

        Ok(())
    }

    /// Overlays `TALLY_*` variables.
    ///
    /// ## Environment Variables
    /// - `TALLY_STORE_NAME`: Override store name
    /// - `TALLY_TAX_RATE`: Override default tax rate (e.g., "7.5")
    /// - `TALLY_BACK_OFFICE_URL`: Back office base URL
    /// - `TALLY_DB_PATH`: Local store file
    /// - `TALLY_SCANNER_DEVICE`: Scanner byte stream device
    ///
    /// Unparseable numbers are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(store_name) = lookup("TALLY_STORE_NAME") {
            self.store_name = store_name;
        }

        if let Some(tax_rate_str) = lookup("TALLY_TAX_RATE") {
            match tax_rate_str.trim().parse::<f64>() {
                Ok(rate) if rate.is_finite() && rate >= 0.0 => {
                    self.default_tax_rate_bps = TaxRate::from_percentage(rate).bps();
                }
                _ => warn!(value = %tax_rate_str, "Ignoring invalid TALLY_TAX_RATE"),
            }
        }

        if let Some(url) = lookup("TALLY_BACK_OFFICE_URL") {
            self.back_office_url = url;
        }

        if let Some(path) = lookup("TALLY_DB_PATH") {
            self.database_path = Some(PathBuf::from(path));
        }

        if let Some(path) = lookup("TALLY_SCANNER_DEVICE") {
            self.scanner.device_path = Some(PathBuf::from(path));
        }
    }

    /// Configured default tax rate.
    pub fn default_tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.default_tax_rate_bps)
    }

    /// Back office client configuration.
    pub fn back_office(&self) -> BackOfficeConfig {
        BackOfficeConfig {
            base_url: self.back_office_url.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    /// Formats a cent amount as a currency string.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let config = ConfigState::default();
    /// assert_eq!(config.format_currency(1234), "$12.34");
    /// ```
    pub fn format_currency(&self, cents: i64) -> String {
        let divisor = 10_i64.pow(self.currency_decimals as u32);
        let whole = cents / divisor;
        let frac = (cents % divisor).abs();

        format!(
            "{}{}{}",
            if cents < 0 { "-" } else { "" },
            self.currency_symbol,
            if self.currency_decimals > 0 {
                format!(
                    "{}.{:0width$}",
                    whole.abs(),
                    frac,
                    width = self.currency_decimals as usize
                )
            } else {
                whole.abs().to_string()
            }
        )
    }

    /// Parses an operator-typed amount ("12.34", "12") into minor units.
    pub fn parse_amount(&self, input: &str) -> Option<i64> {
        let value: f64 = input.trim().trim_start_matches(&self.currency_symbol).parse().ok()?;
        if !value.is_finite() {
            return None;
        }
        let scale = 10_f64.powi(self.currency_decimals as i32);
        Some((value * scale).round() as i64)
    }
}

/// Where the config file is looked up.
fn config_file_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("TALLY_CONFIG") {
        return Some(PathBuf::from(path));
    }

    ProjectDirs::from("com", "tally", "pos").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_format_currency_positive() {
        let config = ConfigState::default();
        assert_eq!(config.format_currency(1234), "$12.34");
        assert_eq!(config.format_currency(100), "$1.00");
        assert_eq!(config.format_currency(1), "$0.01");
        assert_eq!(config.format_currency(0), "$0.00");
    }

    #[test]
    fn test_format_currency_negative() {
        let config = ConfigState::default();
        assert_eq!(config.format_currency(-1234), "-$12.34");
    }

    #[test]
    fn test_format_currency_large() {
        let config = ConfigState::default();
        assert_eq!(config.format_currency(123456789), "$1234567.89");
    }

    #[test]
    fn test_parse_amount() {
        let config = ConfigState::default();
        assert_eq!(config.parse_amount("12.34"), Some(1234));
        assert_eq!(config.parse_amount("$5"), Some(500));
        assert_eq!(config.parse_amount("0.1"), Some(10));
        assert_eq!(config.parse_amount("abc"), None);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("TALLY_STORE_NAME", "Corner Shop"),
            ("TALLY_TAX_RATE", "8.25"),
            ("TALLY_DB_PATH", "/tmp/tally.db"),
        ]
        .into_iter()
        .collect();

        let mut config = ConfigState::default();
        config.apply_env(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.store_name, "Corner Shop");
        assert_eq!(config.default_tax_rate_bps, 825);
        assert_eq!(config.database_path, Some(PathBuf::from("/tmp/tally.db")));
        assert_eq!(config.back_office_url, "http://localhost:8080");
    }

    #[test]
    fn test_bad_env_tax_rate_is_ignored() {
        let mut config = ConfigState::default();
        config.apply_env(|key| (key == "TALLY_TAX_RATE").then(|| "lots".to_string()));
        assert_eq!(config.default_tax_rate_bps, 750);
    }

    #[test]
    fn test_file_overlays_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
store_name = "Tea House"
tax_rate = 5.0

[scanner]
inter_key_threshold_ms = 30
device_path = "/dev/ttyACM0"
"#
        )
        .unwrap();

        let mut config = ConfigState::default();
        config.apply_file(file.path()).unwrap();

        assert_eq!(config.store_name, "Tea House");
        assert_eq!(config.default_tax_rate_bps, 500);
        assert_eq!(config.scanner.inter_key_threshold_ms, 30);
        assert_eq!(config.scanner.idle_timeout_ms, IDLE_TIMEOUT_MS);
        assert_eq!(
            config.scanner.device_path,
            Some(PathBuf::from("/dev/ttyACM0"))
        );
        assert_eq!(config.currency_symbol, "$");
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "store_name = [unterminated").unwrap();

        let mut config = ConfigState::default();
        let err = config.apply_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_unknown_key_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "stor_name = \"typo\"").unwrap();

        let mut config = ConfigState::default();
        assert!(config.apply_file(file.path()).is_err());
    }

    #[test]
    fn test_scanner_settings_to_classifier_config() {
        let cfg = ScannerSettings::default().classifier_config();
        assert_eq!(cfg, ScannerConfig::default());
    }
}
