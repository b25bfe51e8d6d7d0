// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! End-to-end test of the configuration surface: load a file, build the
//! registers, and drive them with an auto-updater.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use gep_core::collection::RegisterCollection;
use gep_core::types::{Value, ValueType};
use gep_registry::{AutoUpdater, HintStrategy};
use gep_tests::common::MockRegisterCollection;

const CONFIG: &str = r#"
collections:
  - id: boiler
    gepid: 3
    timeout: 1500
    hints: 40
    strategy: greedy
    registers:
      - id: 5
        name: water-temperature
        update-interval: 50
        codec: { type: number, scale: 0.1, decimals: 1 }
      - id: 6
        name: heating
        codec: { type: boolean }
"#;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_config_to_running_updater() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(CONFIG.as_bytes()).unwrap();
    file.flush().unwrap();

    let config = gep_config::load_config(file.path()).unwrap();
    let boiler = config.collection("boiler").unwrap();
    assert_eq!(boiler.registry_id().unwrap().value(), 3);

    let collection = Arc::new(MockRegisterCollection::new());
    collection.set_int_value(5, 217);
    collection.set_int_value(6, 1);
    let dynamic: Arc<dyn RegisterCollection> = collection.clone();

    let registers = gep_config::build_registers(boiler, &dynamic).unwrap();
    assert_eq!(registers.len(), 2);

    let temperature = Arc::clone(&registers[0]);
    assert_eq!(temperature.name().as_deref(), Some("water-temperature"));
    assert_eq!(temperature.value_type(), ValueType::Decimal);
    assert_eq!(
        temperature.connection_settings().timeout,
        Some(Duration::from_millis(1500))
    );

    let updater = AutoUpdater::new();
    updater.add_registers(registers.iter().cloned());

    let hints = gep_config::hint_settings(boiler).unwrap().unwrap();
    assert_eq!(hints.strategy(), HintStrategy::Greedy);
    updater.use_registry_hints(&dynamic, hints);

    // Both registers are polled and hint probes run at the configured
    // cadence. Waiting for a third read guarantees the initial poll of both
    // registers has fully committed.
    assert!(collection.wait_for_reads(3, Duration::from_secs(2)).await);
    assert!(collection.wait_for_hint_requests(2, Duration::from_secs(2)).await);

    assert_eq!(temperature.value(), Some(Value::Decimal(21.7)));
    assert_eq!(registers[1].value(), Some(Value::Bool(true)));

    updater.remove_all_registers();
}
