// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The register update scheduler.
//!
//! One [`AutoUpdater`] drives any number of registers across any number of
//! register collections with a single background task. The task polls
//! registers when their update interval elapses and, where configured,
//! probes collections for change hints so that a changed register is
//! refreshed without waiting for its next poll slot.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::sync::Notify;

use gep_core::clock::{Clock, MonotonicClock};
use gep_core::collection::RegisterCollection;
use gep_core::types::RegisterId;

use crate::hints::{HintSettings, HintStrategy};
use crate::register::Register;

/// Upper bound of one scheduler sleep. Bounds the reaction time to
/// bookkeeping changes (membership, hint configuration, dropped
/// collections).
const MAX_TASK_SLEEP: Duration = Duration::from_millis(100);

// =============================================================================
// AutoUpdater
// =============================================================================

/// Scheduler that keeps managed registers up to date.
///
/// The update task starts when the first register is added and stops when
/// the managed set empties (or the updater is dropped). Calls that may start
/// the task must run within a tokio runtime.
///
/// Collections are referenced weakly: an updater entry never keeps a
/// [`RegisterCollection`] alive, so a collection abandoned by its owner is
/// detected and its state pruned by the update task.
pub struct AutoUpdater {
    shared: Arc<Shared>,
}

struct Shared {
    state: Mutex<UpdaterState>,
    /// Signalled on every bookkeeping change.
    notify: Notify,
    clock: Arc<dyn Clock>,
}

#[derive(Default)]
struct UpdaterState {
    /// All managed registers.
    registers: Vec<Arc<Register>>,
    /// Per-collection bookkeeping.
    collections: Vec<CollectionState>,
    /// Ownership token of the update task: a task exits once the generation
    /// moves past the one it was spawned with.
    generation: u64,
    /// Whether an update task is currently commissioned.
    task_alive: bool,
}

/// Scheduler bookkeeping for one register collection.
struct CollectionState {
    collection: Weak<dyn RegisterCollection>,
    /// Identity of the collection while any reference to it exists.
    key: usize,
    /// Managed registers belonging to this collection.
    registers: Vec<Arc<Register>>,
    /// Hint probing configuration; `None` disables probing.
    hints: Option<HintSettings>,
    /// Time of the last accounted hint probe.
    last_hint_time: u64,
    /// A hinted register id that matched no managed register; confirmed to
    /// the device on the next probe so it can surface the next hint.
    unconfirmed: Option<RegisterId>,
}

/// Snapshot of one due hint probe, taken under the lock and executed outside
/// of it.
struct HintProbe {
    key: usize,
    collection: Arc<dyn RegisterCollection>,
    timeout: Option<Duration>,
    strategy: HintStrategy,
    confirmed: Option<RegisterId>,
}

fn collection_key(collection: &Arc<dyn RegisterCollection>) -> usize {
    Arc::as_ptr(collection) as *const () as usize
}

impl AutoUpdater {
    /// Creates an updater using the process-wide monotonic clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(MonotonicClock))
    }

    /// Creates an updater with an explicit time source.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(UpdaterState::default()),
                notify: Notify::new(),
                clock,
            }),
        }
    }

    // =========================================================================
    // Membership
    // =========================================================================

    /// Adds a register to the managed set.
    pub fn add_register(&self, register: Arc<Register>) {
        self.add_registers([register]);
    }

    /// Adds registers to the managed set; registers already managed are
    /// skipped.
    pub fn add_registers(&self, registers: impl IntoIterator<Item = Arc<Register>>) {
        let mut state = self.lock_state();
        let mut changed = false;

        for register in registers {
            if state
                .registers
                .iter()
                .any(|managed| Arc::ptr_eq(managed, &register))
            {
                continue;
            }
            state.registers.push(Arc::clone(&register));

            let key = collection_key(register.collection());
            let index = match state.collections.iter().position(|cs| cs.key == key) {
                Some(index) => index,
                None => {
                    let now = self.shared.clock.now_millis();
                    state.collections.push(CollectionState {
                        collection: Arc::downgrade(register.collection()),
                        key,
                        registers: Vec::new(),
                        hints: None,
                        last_hint_time: now,
                        unconfirmed: None,
                    });
                    state.collections.len() - 1
                }
            };
            state.collections[index].registers.push(register);
            changed = true;
        }

        if changed {
            self.ensure_task(&mut state);
            self.shared.notify.notify_waiters();
        }
    }

    /// Removes a register from the managed set.
    pub fn remove_register(&self, register: &Arc<Register>) {
        self.remove_registers(std::slice::from_ref(register));
    }

    /// Removes registers from the managed set; unknown registers are skipped.
    pub fn remove_registers(&self, registers: &[Arc<Register>]) {
        let mut state = self.lock_state();
        let mut changed = false;

        for register in registers {
            let Some(position) = state
                .registers
                .iter()
                .position(|managed| Arc::ptr_eq(managed, register))
            else {
                continue;
            };
            state.registers.swap_remove(position);

            let key = collection_key(register.collection());
            if let Some(cs) = state.collections.iter_mut().find(|cs| cs.key == key) {
                cs.registers.retain(|managed| !Arc::ptr_eq(managed, register));
            }
            changed = true;
        }

        if changed {
            self.shared.notify.notify_waiters();
            self.stop_task_when_idle(&mut state);
        }
    }

    /// Removes every register from the managed set.
    pub fn remove_all_registers(&self) {
        let mut state = self.lock_state();
        if state.registers.is_empty() {
            return;
        }

        state.registers.clear();
        for cs in &mut state.collections {
            cs.registers.clear();
        }

        self.shared.notify.notify_waiters();
        self.stop_task_when_idle(&mut state);
    }

    /// Returns the managed registers.
    pub fn registers(&self) -> Vec<Arc<Register>> {
        self.lock_state().registers.clone()
    }

    // =========================================================================
    // Hint configuration
    // =========================================================================

    /// Enables change-hint probing for a register collection.
    pub fn use_registry_hints(
        &self,
        collection: &Arc<dyn RegisterCollection>,
        settings: HintSettings,
    ) {
        let key = collection_key(collection);
        let mut state = self.lock_state();
        let now = self.shared.clock.now_millis();

        match state.collections.iter_mut().find(|cs| cs.key == key) {
            Some(cs) => {
                cs.hints = Some(settings);
                cs.unconfirmed = None;
            }
            None => {
                state.collections.push(CollectionState {
                    collection: Arc::downgrade(collection),
                    key,
                    registers: Vec::new(),
                    hints: Some(settings),
                    last_hint_time: now,
                    unconfirmed: None,
                });
            }
        }

        self.shared.notify.notify_waiters();
    }

    /// Disables change-hint probing for a register collection.
    pub fn disable_registry_hints(&self, collection: &Arc<dyn RegisterCollection>) {
        let key = collection_key(collection);
        let mut state = self.lock_state();

        if let Some(position) = state.collections.iter().position(|cs| cs.key == key) {
            state.collections[position].hints = None;
            state.collections[position].unconfirmed = None;
            if state.collections[position].registers.is_empty() {
                state.collections.remove(position);
            }
        }

        self.shared.notify.notify_waiters();
    }

    // =========================================================================
    // Task lifecycle
    // =========================================================================

    fn ensure_task(&self, state: &mut UpdaterState) {
        if state.registers.is_empty() || state.task_alive {
            return;
        }

        state.generation += 1;
        state.task_alive = true;

        let shared = Arc::clone(&self.shared);
        let generation = state.generation;
        tokio::spawn(async move {
            run_update_loop(shared, generation).await;
        });
    }

    fn stop_task_when_idle(&self, state: &mut UpdaterState) {
        if state.registers.is_empty() && state.task_alive {
            // The running task observes the stale generation and exits.
            state.generation += 1;
            state.task_alive = false;
            self.shared.notify.notify_waiters();
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, UpdaterState> {
        self.shared.state.lock().expect("updater state lock poisoned")
    }
}

impl Default for AutoUpdater {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for AutoUpdater {
    fn drop(&mut self) {
        if let Ok(mut state) = self.shared.state.lock() {
            state.generation += 1;
            state.task_alive = false;
        }
        self.shared.notify.notify_waiters();
    }
}

impl std::fmt::Debug for AutoUpdater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock_state();
        f.debug_struct("AutoUpdater")
            .field("registers", &state.registers.len())
            .field("collections", &state.collections.len())
            .field("task_alive", &state.task_alive)
            .finish()
    }
}

// =============================================================================
// Update loop
// =============================================================================

/// Outcome of one pass over the locked updater state.
enum UpdatePass {
    /// The task's generation is stale; stop the loop.
    Stop,
    /// Nothing is due; sleep for at most this long (or until notified).
    Sleep(Duration),
    /// Work to do outside the lock.
    Work {
        expired: Vec<Arc<Register>>,
        probes: Vec<HintProbe>,
    },
}

/// Locks the updater state, computes this pass's work, and returns after the
/// guard has been dropped so the result can be awaited on safely.
fn poll_update_state(shared: &Shared, generation: u64) -> UpdatePass {
    let mut expired: Vec<Arc<Register>> = Vec::new();
    let mut probes: Vec<HintProbe> = Vec::new();
    let mut next_update = u64::MAX;

    let mut state = shared.state.lock().expect("updater state lock poisoned");
    if state.generation != generation {
        return UpdatePass::Stop;
    }

    // Prune states whose collection is gone. A managed register keeps
    // its collection alive, so a dead entry has no registers either.
    state
        .collections
        .retain(|cs| cs.collection.strong_count() > 0);

    for register in &state.registers {
        let millis = register.millis_to_next_update();
        if millis == 0 {
            expired.push(Arc::clone(register));
        } else {
            next_update = next_update.min(millis);
        }
    }

    let now = shared.clock.now_millis();
    for cs in &mut state.collections {
        let Some(hints) = cs.hints.clone() else {
            continue;
        };
        if cs.registers.is_empty() {
            continue;
        }

        let interval = hints.interval().as_millis() as u64;
        let elapsed = now.saturating_sub(cs.last_hint_time);
        if elapsed >= interval {
            match cs.collection.upgrade() {
                Some(collection) => probes.push(HintProbe {
                    key: cs.key,
                    collection,
                    timeout: hints.timeout(),
                    strategy: hints.strategy(),
                    confirmed: cs.unconfirmed.take(),
                }),
                None => cs.hints = None,
            }
        } else {
            next_update = next_update.min(interval - elapsed);
        }
    }

    if expired.is_empty() && probes.is_empty() {
        drop(state);
        let sleep = Duration::from_millis(next_update).min(MAX_TASK_SLEEP);
        return UpdatePass::Sleep(sleep);
    }

    UpdatePass::Work { expired, probes }
}

async fn run_update_loop(shared: Arc<Shared>, generation: u64) {
    tracing::debug!("register update task started");

    loop {
        let (mut expired, probes) = match poll_update_state(&shared, generation) {
            UpdatePass::Stop => break,
            UpdatePass::Sleep(sleep) => {
                tokio::select! {
                    _ = shared.notify.notified() => {}
                    _ = tokio::time::sleep(sleep) => {}
                }
                continue;
            }
            UpdatePass::Work { expired, probes } => (expired, probes),
        };

        // Probe collections with expired hints, outside the lock.
        for probe in probes {
            let hint = match probe
                .collection
                .change_hint(probe.confirmed, probe.timeout)
                .await
            {
                Ok(hint) => hint,
                Err(error) => {
                    tracing::debug!(error = %error, "change hint probe failed");
                    None
                }
            };

            let mut state = shared.state.lock().expect("updater state lock poisoned");
            let now = shared.clock.now_millis();
            let Some(cs) = state.collections.iter_mut().find(|cs| cs.key == probe.key) else {
                continue;
            };

            let mut hint_for_managed = false;
            if let Some(hinted) = hint {
                for register in &cs.registers {
                    if register.register_id() == hinted {
                        hint_for_managed = true;
                        if !expired.iter().any(|due| Arc::ptr_eq(due, register)) {
                            expired.push(Arc::clone(register));
                        }
                    }
                }
                if !hint_for_managed {
                    cs.unconfirmed = Some(hinted);
                }
            }

            if probe
                .strategy
                .advances_probe_time(hint.is_some(), hint_for_managed)
            {
                cs.last_hint_time = now;
            }
        }

        // Update due registers, one after another.
        for register in &expired {
            register.update_value().await;
        }
    }

    tracing::debug!("register update task stopped");
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use async_trait::async_trait;

    use gep_core::codec::{NumberCodec, RegisterCodec};
    use gep_core::error::GepResult;
    use gep_core::stats::RequestStatistics;

    #[derive(Default)]
    struct IdleCollection {
        statistics: RequestStatistics,
    }

    #[async_trait]
    impl RegisterCollection for IdleCollection {
        async fn read_integer(
            &self,
            _register: RegisterId,
            _timeout: Option<Duration>,
        ) -> GepResult<i32> {
            Ok(0)
        }

        async fn write_integer(
            &self,
            _register: RegisterId,
            _value: i32,
            _timeout: Option<Duration>,
        ) -> GepResult<()> {
            Ok(())
        }

        async fn read_binary(
            &self,
            _register: RegisterId,
            _timeout: Option<Duration>,
        ) -> GepResult<Vec<u8>> {
            Ok(Vec::new())
        }

        async fn write_binary(
            &self,
            _register: RegisterId,
            _value: &[u8],
            _timeout: Option<Duration>,
        ) -> GepResult<()> {
            Ok(())
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

    fn register(collection: &Arc<dyn RegisterCollection>, id: u16) -> Arc<Register> {
        Arc::new(Register::new(
            Arc::clone(collection),
            RegisterId::new(id).unwrap(),
            false,
            RegisterCodec::integer(NumberCodec::identity()),
        ))
    }

    #[tokio::test]
    async fn test_membership() {
        let collection: Arc<dyn RegisterCollection> = Arc::new(IdleCollection::default());
        let updater = AutoUpdater::new();

        let a = register(&collection, 1);
        let b = register(&collection, 2);

        updater.add_register(Arc::clone(&a));
        updater.add_registers([Arc::clone(&a), Arc::clone(&b)]);
        assert_eq!(updater.registers().len(), 2);

        updater.remove_register(&a);
        assert_eq!(updater.registers().len(), 1);

        updater.remove_all_registers();
        assert!(updater.registers().is_empty());
    }

    #[tokio::test]
    async fn test_hint_state_lifecycle() {
        let collection: Arc<dyn RegisterCollection> = Arc::new(IdleCollection::default());
        let updater = AutoUpdater::new();

        let settings = HintSettings::new(Duration::from_millis(100)).unwrap();
        updater.use_registry_hints(&collection, settings);
        assert_eq!(updater.lock_state().collections.len(), 1);

        // Disabling hints on a state without managed registers removes it.
        updater.disable_registry_hints(&collection);
        assert!(updater.lock_state().collections.is_empty());

        // With a managed register the state survives a hint disable.
        let a = register(&collection, 1);
        updater.add_register(Arc::clone(&a));
        updater.use_registry_hints(
            &collection,
            HintSettings::new(Duration::from_millis(100)).unwrap(),
        );
        updater.disable_registry_hints(&collection);
        assert_eq!(updater.lock_state().collections.len(), 1);
    }

    #[tokio::test]
    async fn test_dead_collection_state_is_pruned() {
        let keeper: Arc<dyn RegisterCollection> = Arc::new(IdleCollection::default());
        let doomed: Arc<dyn RegisterCollection> = Arc::new(IdleCollection::default());
        let updater = AutoUpdater::new();

        // The keeper's register keeps the update task alive; the doomed
        // collection only carries hint state.
        let a = register(&keeper, 1);
        updater.add_register(Arc::clone(&a));
        updater.use_registry_hints(
            &doomed,
            HintSettings::new(Duration::from_millis(50)).unwrap(),
        );
        assert_eq!(updater.lock_state().collections.len(), 2);

        drop(doomed);
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(updater.lock_state().collections.len(), 1);
    }

    #[tokio::test]
    async fn test_task_lifecycle_flags() {
        let collection: Arc<dyn RegisterCollection> = Arc::new(IdleCollection::default());
        let updater = AutoUpdater::new();
        assert!(!updater.lock_state().task_alive);

        let a = register(&collection, 1);
        updater.add_register(Arc::clone(&a));
        assert!(updater.lock_state().task_alive);

        updater.remove_all_registers();
        assert!(!updater.lock_state().task_alive);
    }
}
