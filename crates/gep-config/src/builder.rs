// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Builders turning configuration into live objects.
//!
//! The configuration layer does not construct gateways itself (sockets and
//! messengers are deployment-specific); the caller obtains a
//! [`RegisterCollection`] from its gateway and hands it to these builders
//! together with the matching [`CollectionConfig`].

use std::sync::Arc;
use std::time::Duration;

use gep_core::collection::RegisterCollection;
use gep_core::error::GepResult;
use gep_core::settings::ConnectionSettings;
use gep_registry::{HintSettings, Register};

use crate::schema::CollectionConfig;

// =============================================================================
// Register construction
// =============================================================================

/// Builds the registers of a collection configuration against a live
/// register collection.
///
/// The collection-level `timeout` (when positive) overrides the default
/// connection timeout of every built register.
pub fn build_registers(
    config: &CollectionConfig,
    collection: &Arc<dyn RegisterCollection>,
) -> GepResult<Vec<Arc<Register>>> {
    let settings = connection_settings(config);

    let mut registers = Vec::with_capacity(config.registers.len());
    for register_config in &config.registers {
        let id = register_config.register_id()?;
        let codec = register_config.codec.clone().unwrap_or_default().build();

        let register = Register::new(Arc::clone(collection), id, register_config.read_only, codec);
        if let Some(name) = &register_config.name {
            register.set_name(name.clone());
        }
        if let Some(description) = &register_config.description {
            register.set_description(description.clone());
        }
        if let Some(interval) = &register_config.update_interval {
            register.set_update_interval(interval.to_duration()?)?;
        }
        register.set_connection_settings(settings.clone());

        registers.push(Arc::new(register));
    }

    tracing::debug!(
        collection = %config.id,
        registers = registers.len(),
        "registers built from configuration"
    );

    Ok(registers)
}

/// Derives the connection settings of a collection configuration: the
/// defaults, with the collection timeout applied when positive.
pub fn connection_settings(config: &CollectionConfig) -> ConnectionSettings {
    let mut settings = ConnectionSettings::default();
    if let Some(timeout) = config.timeout {
        if timeout > 0 {
            settings = settings.with_timeout(Some(Duration::from_millis(timeout as u64)));
        }
    }
    settings
}

// =============================================================================
// Hint configuration
// =============================================================================

/// Derives the hint settings of a collection configuration.
///
/// Returns `None` when hint probing is not configured (no `hints` key, or a
/// non-positive interval). The collection `timeout` also bounds the hint
/// probe, and `strategy` selects the probe cadence.
pub fn hint_settings(config: &CollectionConfig) -> GepResult<Option<HintSettings>> {
    let interval = match config.hints {
        Some(interval) if interval > 0 => Duration::from_millis(interval as u64),
        _ => return Ok(None),
    };

    let mut settings = HintSettings::new(interval)?;

    if let Some(timeout) = config.timeout {
        if timeout > 0 {
            settings = settings.with_timeout(Some(Duration::from_millis(timeout as u64)));
        }
    }

    if let Some(strategy) = &config.strategy {
        settings = settings.with_strategy(strategy.parse()?);
    }

    Ok(Some(settings))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;

    use gep_core::error::TransportError;
    use gep_core::stats::RequestStatistics;
    use gep_core::types::{RegisterId, ValueType};
    use gep_registry::HintStrategy;

    #[derive(Default)]
    struct NullCollection {
        statistics: RequestStatistics,
    }

    #[async_trait]
    impl RegisterCollection for NullCollection {
        async fn read_integer(
            &self,
            _register: RegisterId,
            _timeout: Option<Duration>,
        ) -> GepResult<i32> {
            Err(TransportError::NotRunning.into())
        }

        async fn write_integer(
            &self,
            _register: RegisterId,
            _value: i32,
            _timeout: Option<Duration>,
        ) -> GepResult<()> {
            Err(TransportError::NotRunning.into())
        }

        async fn read_binary(
            &self,
            _register: RegisterId,
            _timeout: Option<Duration>,
        ) -> GepResult<Vec<u8>> {
            Err(TransportError::NotRunning.into())
        }

        async fn write_binary(
            &self,
            _register: RegisterId,
            _value: &[u8],
            _timeout: Option<Duration>,
        ) -> GepResult<()> {
            Err(TransportError::NotRunning.into())
        }

        async fn change_hint(
            &self,
            _confirmed: Option<RegisterId>,
            _timeout: Option<Duration>,
        ) -> GepResult<Option<RegisterId>> {
            Ok(None)
        }

        fn statistics(&self) -> &RequestStatistics {
            &self.statistics
        }
    }

    fn sample_collection_config() -> CollectionConfig {
        serde_yaml::from_str(
            r#"
id: boiler
gepid: 3
timeout: 1500
hints: 200
strategy: greedy
registers:
  - id: 5
    name: water-temperature
    description: Boiler outlet temperature
    update-interval: 2.5s
    codec: { type: number, scale: 0.1, decimals: 1 }
  - id: 9
    read-only: true
    codec: { type: boolean }
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_build_registers() {
        let config = sample_collection_config();
        let collection: Arc<dyn RegisterCollection> = Arc::new(NullCollection::default());

        let registers = build_registers(&config, &collection).unwrap();
        assert_eq!(registers.len(), 2);

        let temperature = &registers[0];
        assert_eq!(temperature.register_id().value(), 5);
        assert_eq!(temperature.name().as_deref(), Some("water-temperature"));
        assert_eq!(
            temperature.description().as_deref(),
            Some("Boiler outlet temperature")
        );
        assert_eq!(temperature.update_interval(), Duration::from_millis(2500));
        assert_eq!(temperature.value_type(), ValueType::Decimal);
        assert!(!temperature.is_read_only());
        assert_eq!(
            temperature.connection_settings().timeout,
            Some(Duration::from_millis(1500))
        );

        let flag = &registers[1];
        assert!(flag.is_read_only());
        assert_eq!(flag.value_type(), ValueType::Bool);
        // Defaults apply where the configuration is silent.
        assert_eq!(flag.update_interval(), Duration::from_millis(1000));
    }

    #[test]
    fn test_non_positive_timeout_keeps_default() {
        let mut config = sample_collection_config();
        config.timeout = Some(0);
        let settings = connection_settings(&config);
        assert_eq!(settings.timeout, Some(Duration::from_millis(2000)));
    }

    #[test]
    fn test_hint_settings() {
        let config = sample_collection_config();
        let settings = hint_settings(&config).unwrap().unwrap();
        assert_eq!(settings.interval(), Duration::from_millis(200));
        assert_eq!(settings.timeout(), Some(Duration::from_millis(1500)));
        assert_eq!(settings.strategy(), HintStrategy::Greedy);
    }

    #[test]
    fn test_hints_disabled() {
        let mut config = sample_collection_config();
        config.hints = None;
        assert!(hint_settings(&config).unwrap().is_none());

        config.hints = Some(0);
        assert!(hint_settings(&config).unwrap().is_none());
    }
}
