use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ReconError;
use crate::normalize::{KeyRule, DEFAULT_TOLL_FREE_PREFIXES};
use crate::reconcile::ReconcileMode;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Run configuration, usually loaded from `callbill.toml`. Every field has a
/// default, so an empty document is a valid config.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub tariff: Tariff,
    pub toll_free_prefixes: Vec<String>,
    pub success_response: String,
    pub reconcile: ReconcileConfig,
    pub output: OutputConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            tariff: Tariff::default(),
            toll_free_prefixes: DEFAULT_TOLL_FREE_PREFIXES.iter().map(|p| p.to_string()).collect(),
            success_response: "200".into(),
            reconcile: ReconcileConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tariff
// ---------------------------------------------------------------------------

/// Billing constants. Written as strings in TOML so they stay exact.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Tariff {
    /// Dollars per minute for toll-free billing.
    #[serde(with = "rust_decimal::serde::str")]
    pub unit_rate: Decimal,
    /// Multiplier for the "Amount with Interest (30%)" column.
    #[serde(with = "rust_decimal::serde::str")]
    pub surcharge_factor: Decimal,
}

impl Default for Tariff {
    fn default() -> Self {
        Self {
            unit_rate: Decimal::new(35, 3),
            surcharge_factor: Decimal::new(130, 2),
        }
    }
}

// ---------------------------------------------------------------------------
// Reconcile + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconcileConfig {
    /// Join mode for flows that reconcile against a roster. The ANI summary
    /// has no roster and always keeps every bucket.
    pub mode: Option<ReconcileMode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampStyle {
    /// `2025-10-01`
    Date,
    /// `2025-10-01T12-30-45`
    Iso,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Directory for generated reports; the CLI falls back to the cwd.
    pub directory: Option<String>,
    /// Overrides each flow's default artifact timestamp style.
    pub timestamp: Option<TimestampStyle>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl RunConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: RunConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.tariff.unit_rate < Decimal::ZERO {
            return Err(ReconError::ConfigValidation(format!(
                "tariff.unit_rate must not be negative, got {}",
                self.tariff.unit_rate
            )));
        }
        if self.tariff.surcharge_factor < Decimal::ZERO {
            return Err(ReconError::ConfigValidation(format!(
                "tariff.surcharge_factor must not be negative, got {}",
                self.tariff.surcharge_factor
            )));
        }

        if self.toll_free_prefixes.is_empty() {
            return Err(ReconError::ConfigValidation(
                "toll_free_prefixes must list at least one prefix".into(),
            ));
        }
        for prefix in &self.toll_free_prefixes {
            if prefix.len() != 3 || !prefix.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ReconError::ConfigValidation(format!(
                    "toll-free prefix '{prefix}' must be exactly 3 digits"
                )));
            }
        }

        if self.success_response.trim().is_empty() {
            return Err(ReconError::ConfigValidation(
                "success_response must not be empty".into(),
            ));
        }

        Ok(())
    }

    pub fn toll_free_rule(&self) -> KeyRule {
        KeyRule::TollFree {
            prefixes: self.toll_free_prefixes.clone(),
        }
    }
}

impl FromStr for RunConfig {
    type Err = ReconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_toml(s)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = RunConfig::from_toml("").unwrap();
        assert_eq!(config.tariff.unit_rate, Decimal::new(35, 3));
        assert_eq!(config.tariff.surcharge_factor, Decimal::new(13, 1));
        assert_eq!(config.toll_free_prefixes.len(), 10);
        assert_eq!(config.success_response, "200");
        assert!(config.reconcile.mode.is_none());
        assert!(config.output.timestamp.is_none());
    }

    #[test]
    fn parse_full() {
        let input = r#"
toll_free_prefixes = ["800", "888"]
success_response = "OK"

[tariff]
unit_rate = "0.04"
surcharge_factor = "1.25"

[reconcile]
mode = "all_reference"

[output]
directory = "reports"
timestamp = "iso"
"#;
        let config = RunConfig::from_toml(input).unwrap();
        assert_eq!(config.tariff.unit_rate, Decimal::new(4, 2));
        assert_eq!(config.tariff.surcharge_factor, Decimal::new(125, 2));
        assert_eq!(config.toll_free_prefixes, vec!["800", "888"]);
        assert_eq!(config.success_response, "OK");
        assert_eq!(config.reconcile.mode, Some(ReconcileMode::AllReference));
        assert_eq!(config.output.directory.as_deref(), Some("reports"));
        assert_eq!(config.output.timestamp, Some(TimestampStyle::Iso));
    }

    #[test]
    fn reject_bad_prefix() {
        let err = RunConfig::from_toml(r#"toll_free_prefixes = ["80"]"#).unwrap_err();
        assert!(err.to_string().contains("exactly 3 digits"));

        let err = RunConfig::from_toml("toll_free_prefixes = []").unwrap_err();
        assert!(err.to_string().contains("at least one"));
    }

    #[test]
    fn reject_negative_rate() {
        let err = RunConfig::from_toml("[tariff]\nunit_rate = \"-0.01\"").unwrap_err();
        assert!(err.to_string().contains("unit_rate"));
    }

    #[test]
    fn reject_unknown_keys_and_modes() {
        assert!(RunConfig::from_toml("unit_rate = \"0.1\"").is_err());
        let err = RunConfig::from_toml("[reconcile]\nmode = \"outer\"").unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }
}
