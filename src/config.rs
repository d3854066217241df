// Copyright 2025 Cowboy AI, LLC.

//! Configuration for telemetry and sample naming

use serde::{Deserialize, Serialize};

use crate::errors::{ProvenanceError, ProvenanceResult};

/// Environment variable holding the log filter directive
pub const LOG_FILTER_ENV: &str = "LAB_PROVENANCE_LOG";

/// Environment variable switching log output to JSON
pub const LOG_JSON_ENV: &str = "LAB_PROVENANCE_LOG_JSON";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvenanceConfig {
    /// Logging setup
    pub telemetry: TelemetryConfig,
    /// Sample name generation
    pub naming: NamingConfig,
}

/// Logging setup consumed by [`telemetry::init`](crate::telemetry::init)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// `EnvFilter` directive (e.g. "lab_provenance=debug")
    pub filter: String,

    /// Whether to print the event target
    pub with_target: bool,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            filter: "lab_provenance=info".to_string(),
            with_target: false,
            json: false,
        }
    }
}

/// Shape of generated sample names
///
/// `<lab code><experiment id>.<project id>:<timestamp digits><suffix>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// Characters taken from the lab code
    pub lab_code_len: usize,

    /// Characters taken from experiment and project ids
    pub id_prefix_len: usize,

    /// Trailing digits of the millisecond epoch timestamp
    pub timestamp_digits: usize,

    /// Trailing hex characters of a fresh versionstamp
    pub suffix_len: usize,

    /// Uppercase the whole name
    pub uppercase: bool,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            lab_code_len: 3,
            id_prefix_len: 3,
            timestamp_digits: 6,
            suffix_len: 2,
            uppercase: true,
        }
    }
}

impl ProvenanceConfig {
    /// Defaults overlaid with `LAB_PROVENANCE_LOG` and `LAB_PROVENANCE_LOG_JSON`
    pub fn from_env() -> ProvenanceResult<Self> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json_str(json: &str) -> ProvenanceResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ProvenanceError::ConfigurationError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup
    pub fn with_overrides<F>(mut self, lookup: F) -> ProvenanceResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(filter) = lookup(LOG_FILTER_ENV) {
            self.telemetry.filter = filter;
        }
        if let Some(json) = lookup(LOG_JSON_ENV) {
            self.telemetry.json = parse_flag(LOG_JSON_ENV, &json)?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Reject naming shapes that cannot produce a name
    pub fn validate(&self) -> ProvenanceResult<()> {
        let naming = &self.naming;
        if naming.lab_code_len == 0 || naming.id_prefix_len == 0 {
            return Err(ProvenanceError::ConfigurationError(
                "naming prefixes must be at least one character".to_string(),
            ));
        }
        if naming.timestamp_digits == 0 || naming.timestamp_digits > 13 {
            return Err(ProvenanceError::ConfigurationError(format!(
                "timestamp_digits must be between 1 and 13, got {}",
                naming.timestamp_digits
            )));
        }
        if naming.suffix_len > 4 {
            return Err(ProvenanceError::ConfigurationError(format!(
                "suffix_len must be at most 4, got {}",
                naming.suffix_len
            )));
        }
        Ok(())
    }
}

fn parse_flag(key: &str, value: &str) -> ProvenanceResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ProvenanceError::ConfigurationError(format!(
            "{key} must be a boolean, got {other:?}"
        ))),
    }
}
