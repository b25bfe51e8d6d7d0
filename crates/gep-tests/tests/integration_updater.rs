// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Integration tests of the auto-updater: scheduling, membership, and hint
//! probing against a scripted register collection.

use std::sync::Arc;
use std::time::Duration;

use gep_core::codec::{NumberCodec, RegisterCodec};
use gep_core::collection::RegisterCollection;
use gep_core::types::{RegisterId, Value};
use gep_registry::{AutoUpdater, HintSettings, HintStrategy, Register};
use gep_tests::common::MockRegisterCollection;

fn make_register(collection: &Arc<dyn RegisterCollection>, id: u16, interval: Duration) -> Arc<Register> {
    let register = Register::new(
        Arc::clone(collection),
        RegisterId::new(id).unwrap(),
        false,
        RegisterCodec::integer(NumberCodec::identity()),
    );
    register.set_update_interval(interval).unwrap();
    Arc::new(register)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_updater_polls_due_registers() {
    let collection = Arc::new(MockRegisterCollection::new());
    collection.set_int_value(1, 11);
    let dynamic: Arc<dyn RegisterCollection> = collection.clone();

    let register = make_register(&dynamic, 1, Duration::from_millis(25));
    let updater = AutoUpdater::new();
    updater.add_register(Arc::clone(&register));

    assert!(collection.wait_for_reads(3, Duration::from_secs(2)).await);
    assert_eq!(register.value(), Some(Value::Integer(11)));

    updater.remove_all_registers();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_remove_all_stops_updates() {
    let collection = Arc::new(MockRegisterCollection::new());
    collection.set_int_value(1, 1);
    let dynamic: Arc<dyn RegisterCollection> = collection.clone();

    let register = make_register(&dynamic, 1, Duration::from_millis(20));
    let updater = AutoUpdater::new();
    updater.add_register(Arc::clone(&register));

    assert!(collection.wait_for_reads(2, Duration::from_secs(2)).await);
    updater.remove_all_registers();

    // Let a possibly in-flight update drain, then expect silence.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let settled = collection.read_history().len();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(collection.read_history().len(), settled);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_removed_register_is_not_updated() {
    let collection = Arc::new(MockRegisterCollection::new());
    collection.set_int_value(1, 1);
    collection.set_int_value(2, 2);
    let dynamic: Arc<dyn RegisterCollection> = collection.clone();

    let kept = make_register(&dynamic, 1, Duration::from_millis(20));
    let removed = make_register(&dynamic, 2, Duration::from_millis(20));

    let updater = AutoUpdater::new();
    updater.add_registers([Arc::clone(&kept), Arc::clone(&removed)]);

    assert!(collection.wait_for_reads(4, Duration::from_secs(2)).await);
    updater.remove_register(&removed);
    tokio::time::sleep(Duration::from_millis(100)).await;

    let removed_reads = collection.reads_of(2);
    let kept_reads = collection.reads_of(1);
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(collection.reads_of(2), removed_reads);
    assert!(collection.reads_of(1) > kept_reads);

    updater.remove_all_registers();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_semi_greedy_hint_sequencing() {
    let collection = Arc::new(MockRegisterCollection::new());
    collection.set_int_value(5, 50);
    collection.set_int_value(7, 70);
    let dynamic: Arc<dyn RegisterCollection> = collection.clone();

    // Long poll intervals: after the initial poll, only hints trigger reads.
    let a = make_register(&dynamic, 5, Duration::from_secs(60));
    let b = make_register(&dynamic, 7, Duration::from_secs(60));

    // First probe names managed register 5, the second names unmanaged 9,
    // every later probe reports nothing.
    collection.push_hint(Some(5));
    collection.push_hint(Some(9));

    let updater = AutoUpdater::new();
    updater.add_registers([Arc::clone(&a), Arc::clone(&b)]);
    updater.use_registry_hints(
        &dynamic,
        HintSettings::new(Duration::from_millis(40))
            .unwrap()
            .with_strategy(HintStrategy::SemiGreedy),
    );

    assert!(collection.wait_for_hint_requests(3, Duration::from_secs(2)).await);

    let probes = collection.hint_requests();
    // Probe 1 carries no confirmation and names register 5 (managed, so the
    // probe time does not advance and probe 2 follows immediately). Probe 2
    // names register 9, which is unmanaged: it is confirmed by probe 3.
    assert_eq!(probes[0], None);
    assert_eq!(probes[1], None);
    assert_eq!(probes[2], Some(9));

    // The hint for register 5 triggered an extra read beyond the initial
    // poll; register 7 was read only once.
    assert!(collection.reads_of(5) >= 2);
    assert_eq!(collection.reads_of(7), 1);

    updater.remove_all_registers();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_hint_probe_failure_is_ignored() {
    let collection = Arc::new(MockRegisterCollection::new());
    collection.set_int_value(1, 1);
    let dynamic: Arc<dyn RegisterCollection> = collection.clone();

    let register = make_register(&dynamic, 1, Duration::from_secs(60));
    let updater = AutoUpdater::new();
    updater.add_register(Arc::clone(&register));
    updater.use_registry_hints(
        &dynamic,
        HintSettings::new(Duration::from_millis(30)).unwrap(),
    );

    // Probes keep running even though they report nothing; the loop stays
    // healthy.
    assert!(collection.wait_for_hint_requests(3, Duration::from_secs(2)).await);

    updater.remove_all_registers();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_disable_hints_stops_probing() {
    let collection = Arc::new(MockRegisterCollection::new());
    collection.set_int_value(1, 1);
    let dynamic: Arc<dyn RegisterCollection> = collection.clone();

    let register = make_register(&dynamic, 1, Duration::from_secs(60));
    let updater = AutoUpdater::new();
    updater.add_register(Arc::clone(&register));
    updater.use_registry_hints(
        &dynamic,
        HintSettings::new(Duration::from_millis(30)).unwrap(),
    );

    assert!(collection.wait_for_hint_requests(2, Duration::from_secs(2)).await);
    updater.disable_registry_hints(&dynamic);
    tokio::time::sleep(Duration::from_millis(100)).await;

    let settled = collection.hint_requests().len();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(collection.hint_requests().len(), settled);

    updater.remove_all_registers();
}
