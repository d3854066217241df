// Copyright 2025 Cowboy AI, LLC.

//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

use crate::config::TelemetryConfig;
use crate::errors::{ProvenanceError, ProvenanceResult};

/// Install a global fmt subscriber filtered by `config.filter`
///
/// `RUST_LOG` is not consulted; put the directive in the config instead.
/// Fails with `TelemetryError` when the filter does not parse or a global
/// subscriber is already installed.
pub fn init(config: &TelemetryConfig) -> ProvenanceResult<()> {
    let filter = EnvFilter::try_new(&config.filter)
        .map_err(|e| ProvenanceError::TelemetryError(format!("bad filter {:?}: {e}", config.filter)))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.with_target);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| ProvenanceError::TelemetryError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_filter_is_an_error() {
        let config = TelemetryConfig {
            filter: "lab_provenance=notalevel".to_string(),
            ..TelemetryConfig::default()
        };
        assert!(matches!(init(&config), Err(ProvenanceError::TelemetryError(_))));
    }

    #[test]
    fn test_second_init_fails_without_panicking() {
        let config = TelemetryConfig::default();
        let _ = init(&config);
        assert!(matches!(init(&config), Err(ProvenanceError::TelemetryError(_))));
    }
}
