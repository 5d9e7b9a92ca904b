//! # Configuration
//!
//! Currency, rounding and default scalars for every document the CLI
//! computes.
//!
//! ## Load Order (later overrides earlier)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Defaults           INR, ₹, 2 decimals, half_up, no round-off        │
//! │  2. folio.toml         --config, $FOLIO_CONFIG, or platform config dir  │
//! │  3. Environment        FOLIO_CURRENCY_CODE, FOLIO_CURRENCY_SYMBOL,      │
//! │                        FOLIO_CURRENCY_DECIMALS, FOLIO_ROUNDING,         │
//! │                        FOLIO_ROUND_OFF                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example folio.toml
//! ```toml
//! [currency]
//! code = "INR"
//! symbol = "₹"
//! decimals = 2
//! rounding = "half_up"
//!
//! [settlement]
//! round_off = true
//!
//! [scalars]
//! ADDITIONAL_DISCOUNT_PERCENT = 0
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use folio_core::{ExternalScalars, Money, RoundingMode, RoundingPolicy};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ApiError, ApiResult};

/// Highest supported number of currency decimals.
const MAX_DECIMALS: u32 = 6;

// =============================================================================
// Currency Settings
// =============================================================================

/// Currency used to round and display totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencySettings {
    /// ISO 4217 code.
    #[serde(default = "default_currency_code")]
    pub code: String,

    /// Symbol prefixed to formatted amounts.
    #[serde(default = "default_currency_symbol")]
    pub symbol: String,

    /// Minor-unit decimals (2 for INR, 0 for JPY).
    #[serde(default = "default_decimals")]
    pub decimals: u32,

    /// Tie-breaking rule for rounding totals.
    #[serde(default)]
    pub rounding: RoundingMode,
}

fn default_currency_code() -> String {
    "INR".to_string()
}

fn default_currency_symbol() -> String {
    "₹".to_string()
}

fn default_decimals() -> u32 {
    2
}

impl Default for CurrencySettings {
    fn default() -> Self {
        CurrencySettings {
            code: default_currency_code(),
            symbol: default_currency_symbol(),
            decimals: default_decimals(),
            rounding: RoundingMode::default(),
        }
    }
}

// =============================================================================
// Settlement Settings
// =============================================================================

/// Grand-total settlement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettlementSettings {
    /// Round the grand total to whole units and report the round-off.
    #[serde(default)]
    pub round_off: bool,
}

// =============================================================================
// Folio Config
// =============================================================================

/// Complete CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FolioConfig {
    #[serde(default)]
    pub currency: CurrencySettings,

    #[serde(default)]
    pub settlement: SettlementSettings,

    /// Default external scalars; a document's own scalars win.
    #[serde(default)]
    pub scalars: BTreeMap<String, f64>,
}

impl FolioConfig {
    /// Loads configuration from file, environment, and defaults.
    pub fn load(config_path: Option<PathBuf>) -> ApiResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ApiResult<()> {
        let code = &self.currency.code;
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ApiError::config(format!(
                "currency.code must be a 3-letter ISO code, got: {}",
                code
            )));
        }

        if self.currency.decimals > MAX_DECIMALS {
            return Err(ApiError::config(format!(
                "currency.decimals must be at most {}",
                MAX_DECIMALS
            )));
        }

        if let Some((name, _)) = self.scalars.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ApiError::config(format!(
                "scalars.{} must be a finite number",
                name
            )));
        }

        Ok(())
    }

    /// Applies `FOLIO_*` overrides read through `lookup`.
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(code) = lookup("FOLIO_CURRENCY_CODE") {
            debug!(code = %code, "Overriding currency code from environment");
            self.currency.code = code;
        }

        if let Some(symbol) = lookup("FOLIO_CURRENCY_SYMBOL") {
            self.currency.symbol = symbol;
        }

        if let Some(decimals) = lookup("FOLIO_CURRENCY_DECIMALS") {
            match decimals.parse::<u32>() {
                Ok(d) => self.currency.decimals = d,
                Err(_) => warn!(decimals = %decimals, "Ignoring invalid FOLIO_CURRENCY_DECIMALS"),
            }
        }

        if let Some(mode) = lookup("FOLIO_ROUNDING") {
            match mode.parse::<RoundingMode>() {
                Ok(parsed) => {
                    debug!(mode = %parsed, "Overriding rounding mode from environment");
                    self.currency.rounding = parsed;
                }
                Err(e) => warn!("Ignoring FOLIO_ROUNDING: {}", e),
            }
        }

        if let Some(flag) = lookup("FOLIO_ROUND_OFF") {
            match flag.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.settlement.round_off = true,
                "0" | "false" | "no" | "off" => self.settlement.round_off = false,
                _ => warn!(value = %flag, "Ignoring invalid FOLIO_ROUND_OFF"),
            }
        }
    }

    /// `$FOLIO_CONFIG`, else `folio.toml` in the platform config directory.
    fn default_config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("FOLIO_CONFIG") {
            return Some(PathBuf::from(path));
        }
        directories::ProjectDirs::from("com", "folio", "folio")
            .map(|dirs| dirs.config_dir().join("folio.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Rounding policy handed to the engine.
    pub fn rounding_policy(&self) -> RoundingPolicy {
        RoundingPolicy {
            decimals: self.currency.decimals,
            mode: self.currency.rounding,
            round_off: self.settlement.round_off,
        }
    }

    /// Configured defaults overlaid with a document's own scalars.
    pub fn merged_scalars(&self, document: &ExternalScalars) -> ExternalScalars {
        let mut merged = self.scalars.clone();
        merged.extend(document.iter().map(|(k, v)| (k.clone(), *v)));
        merged
    }

    /// Formats an amount with the currency symbol, e.g. `₹2775360.00`.
    pub fn format_money(&self, amount: Money) -> String {
        let digits = amount.format(self.currency.decimals);
        match digits.strip_prefix('-') {
            Some(magnitude) => format!("-{}{}", self.currency.symbol, magnitude),
            None => format!("{}{}", self.currency.symbol, digits),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = FolioConfig::default();
        assert_eq!(config.currency.code, "INR");
        assert_eq!(config.rounding_policy(), RoundingPolicy::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_partial_sections() {
        let config: FolioConfig = toml::from_str(
            r#"
            [currency]
            code = "USD"
            symbol = "$"
            rounding = "half_even"

            [scalars]
            ADDITIONAL_DISCOUNT_PERCENT = 5.0
            "#,
        )
        .unwrap();
        assert_eq!(config.currency.decimals, 2);
        assert_eq!(config.currency.rounding, RoundingMode::HalfEven);
        assert!(!config.settlement.round_off);
        assert_eq!(config.scalars.get("ADDITIONAL_DISCOUNT_PERCENT"), Some(&5.0));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("FOLIO_CURRENCY_CODE", "JPY"),
            ("FOLIO_CURRENCY_DECIMALS", "0"),
            ("FOLIO_ROUNDING", "bankers"),
            ("FOLIO_ROUND_OFF", "yes"),
        ]);
        let mut config = FolioConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        let policy = config.rounding_policy();
        assert_eq!(config.currency.code, "JPY");
        assert_eq!(policy.decimals, 0);
        assert_eq!(policy.mode, RoundingMode::HalfEven);
        assert!(policy.round_off);
    }

    #[test]
    fn test_invalid_env_values_ignored() {
        let mut config = FolioConfig::default();
        config.apply_overrides(|key| match key {
            "FOLIO_CURRENCY_DECIMALS" => Some("two".to_string()),
            "FOLIO_ROUNDING" => Some("ceiling".to_string()),
            _ => None,
        });
        assert_eq!(config, FolioConfig::default());
    }

    #[test]
    fn test_validation() {
        let mut config = FolioConfig::default();
        config.currency.code = "rupees".to_string();
        assert!(config.validate().is_err());

        let mut config = FolioConfig::default();
        config.currency.decimals = 9;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_document_scalars_win() {
        let mut config = FolioConfig::default();
        config.scalars.insert("ADDITIONAL_DISCOUNT_PERCENT".to_string(), 0.0);
        config.scalars.insert("CTC".to_string(), 1.0);

        let document = ExternalScalars::from([("CTC".to_string(), 600_000.0)]);
        let merged = config.merged_scalars(&document);
        assert_eq!(merged.get("CTC"), Some(&600_000.0));
        assert_eq!(merged.get("ADDITIONAL_DISCOUNT_PERCENT"), Some(&0.0));
    }

    #[test]
    fn test_format_money() {
        let config = FolioConfig::default();
        assert_eq!(config.format_money(Money::from_minor(277_536_000)), "₹2775360.00");
        assert_eq!(config.format_money(Money::from_minor(-40)), "-₹0.40");
    }
}
